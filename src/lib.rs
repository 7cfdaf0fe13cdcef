//! A rule-driven syntax highlighting engine.
//!
//! A declarative [`Grammar`] is compiled once into an immutable
//! [`CompiledGrammar`]; the scanner then classifies arbitrary source text
//! into a tree of tagged [`Token`] spans plus a relevance score used for
//! automatic language detection. See [`Highlighter`] for the registry-based
//! public surface.

mod api;
mod engine;
mod error;
mod grammar;
pub mod grammars;

pub use api::{AutoDetection, HighlightVerbose, Highlighter};
pub use engine::{CompiledGrammar, ScanMetrics, scan, scan_with_metrics};
pub use error::{GrammarError, UnknownLanguageError};
pub use grammar::{DEFAULT_RELEVANCE, Grammar, GrammarFlags, RuleDef, Variant};

// --- Core output types ------------------------------------------------------

/// Tag carried by tokens covering text no rule matched.
pub const PLAIN_TAG: &str = "plain";

/// A classified span of source text.
///
/// `start`/`end` are byte offsets into the scanned source. Tokens emitted by
/// region rules own the tokens matched while the region was open as
/// `children`; a child's span is always contained in its parent's span, and
/// siblings never overlap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Classification label from the matching rule (e.g. `"string"`,
    /// `"comment"`, `"keyword"`), or [`PLAIN_TAG`].
    pub tag: String,
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
    /// Tokens nested inside this one (region rules only; empty otherwise).
    pub children: Vec<Token>,
}

impl Token {
    pub(crate) fn plain(start: usize, end: usize) -> Self {
        Token { tag: PLAIN_TAG.to_string(), start, end, children: Vec::new() }
    }

    /// Slice of the original source covered by this token.
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        source.get(self.start..self.end).unwrap_or("")
    }

    /// True for tokens covering uncategorized text.
    pub fn is_plain(&self) -> bool {
        self.tag == PLAIN_TAG
    }
}

/// Output of one scan: the token tree plus the accumulated relevance score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    /// Top-level tokens in strictly increasing offset order. Together with
    /// their nested children they cover every byte of the input.
    pub tokens: Vec<Token>,
    /// Sum of the relevance weights of all emitted tokens. Plain-text runs
    /// and non-keyword identifiers contribute zero.
    pub relevance: u32,
}
