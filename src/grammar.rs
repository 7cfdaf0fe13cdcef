//! Grammar definition model.
//!
//! A [`Grammar`] is pure declarative data: named rules with classification
//! tags, patterns, and relevance weights, plus a keyword table and an ordered
//! top-level rule list. Rules reference each other (and themselves) by name,
//! which keeps recursive containment free of ownership cycles; the compiler
//! resolves names to arena indices once.
//!
//! Definitions are built with the fluent constructors below and handed to
//! [`Grammar::compile`] or [`crate::Highlighter::register`]. Nothing here
//! performs matching; patterns stay as strings until compilation.

use crate::engine;
use crate::error::GrammarError;

/// Relevance weight a rule gets when the definition does not set one.
pub const DEFAULT_RELEVANCE: u32 = 1;

bitflags::bitflags! {
    /// Grammar-level option bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct GrammarFlags: u32 {
        /// Compile patterns case-insensitively and fold keyword lookups.
        const CASE_INSENSITIVE = 1 << 0;
        /// Exclude this grammar from auto-detection candidate pools.
        const NO_AUTODETECT    = 1 << 1;
    }
}

/// A declarative lexical grammar for one language.
#[derive(Debug, Clone)]
pub struct Grammar {
    pub(crate) name: String,
    pub(crate) aliases: Vec<String>,
    pub(crate) flags: GrammarFlags,
    /// `(word, category)` pairs in declaration order. A word may carry an
    /// `hljs`-style `word|N` suffix overriding its relevance weight.
    pub(crate) keywords: Vec<(String, String)>,
    /// Every declared rule, addressable by name.
    pub(crate) rules: Vec<RuleDef>,
    /// Rule names tried, in order, at positions outside any region.
    pub(crate) contains: Vec<String>,
}

impl Grammar {
    pub fn new(name: impl Into<String>) -> Self {
        Grammar {
            name: name.into(),
            aliases: Vec::new(),
            flags: GrammarFlags::empty(),
            keywords: Vec::new(),
            rules: Vec::new(),
            contains: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases.extend(aliases.iter().map(|a| a.to_string()));
        self
    }

    pub fn case_insensitive(mut self) -> Self {
        self.flags |= GrammarFlags::CASE_INSENSITIVE;
        self
    }

    pub fn no_autodetect(mut self) -> Self {
        self.flags |= GrammarFlags::NO_AUTODETECT;
        self
    }

    /// Add keywords under the implicit `"keyword"` category.
    pub fn keywords(self, words: &[&str]) -> Self {
        self.keywords_in("keyword", words)
    }

    /// Add keywords under an explicit category (e.g. `"literal"`, `"type"`).
    pub fn keywords_in(mut self, category: &str, words: &[&str]) -> Self {
        self.keywords.extend(words.iter().map(|w| (w.to_string(), category.to_string())));
        self
    }

    /// Declare a rule. Declaration order is the priority order wherever the
    /// rule appears in a containment list.
    pub fn rule(mut self, rule: RuleDef) -> Self {
        self.rules.push(rule);
        self
    }

    /// Set the ordered top-level rule list (by rule name).
    pub fn contains(mut self, refs: &[&str]) -> Self {
        self.contains.extend(refs.iter().map(|r| r.to_string()));
        self
    }

    /// Compile this grammar into an immutable, shareable rule set.
    pub fn compile(&self) -> Result<engine::CompiledGrammar, GrammarError> {
        engine::compile(self)
    }
}

/// One named, taggable matching unit of a grammar.
#[derive(Debug, Clone)]
pub struct RuleDef {
    pub(crate) name: String,
    pub(crate) tag: String,
    pub(crate) relevance: u32,
    /// Rule names eligible while this rule's region is open.
    pub(crate) contains: Vec<String>,
    pub(crate) shape: ShapeDef,
}

#[derive(Debug, Clone)]
pub(crate) enum ShapeDef {
    Single { pattern: String, followed_by: Option<String> },
    Region { begin: String, end: Option<String> },
    Variants(Vec<Variant>),
}

impl RuleDef {
    /// A rule matched atomically by one pattern, emitting one token per match.
    pub fn single(name: &str, tag: &str, pattern: &str) -> Self {
        Self::with_shape(name, tag, ShapeDef::Single { pattern: pattern.to_string(), followed_by: None })
    }

    /// A region bounded by a `begin`/`end` pattern pair; text between them is
    /// tokenized by the rule's `contains` list and attached as children.
    pub fn region(name: &str, tag: &str, begin: &str, end: &str) -> Self {
        Self::with_shape(
            name,
            tag,
            ShapeDef::Region { begin: begin.to_string(), end: Some(end.to_string()) },
        )
    }

    /// A region with no `end` pattern. It closes on its own `begin` match and
    /// therefore behaves as a single-match rule.
    pub fn begin_only(name: &str, tag: &str, begin: &str) -> Self {
        Self::with_shape(name, tag, ShapeDef::Region { begin: begin.to_string(), end: None })
    }

    /// An ordered list of alternative shapes sharing one tag; the first
    /// variant matching at a position wins.
    pub fn variants(name: &str, tag: &str, variants: Vec<Variant>) -> Self {
        Self::with_shape(name, tag, ShapeDef::Variants(variants))
    }

    fn with_shape(name: &str, tag: &str, shape: ShapeDef) -> Self {
        RuleDef {
            name: name.to_string(),
            tag: tag.to_string(),
            relevance: DEFAULT_RELEVANCE,
            contains: Vec::new(),
            shape,
        }
    }

    pub fn relevance(mut self, relevance: u32) -> Self {
        self.relevance = relevance;
        self
    }

    /// Trailing context for a single-match rule: the rule matches only when
    /// `pattern` matches immediately after the main pattern, and the emitted
    /// token covers the main pattern alone.
    pub fn followed_by(mut self, pattern: &str) -> Self {
        match &mut self.shape {
            ShapeDef::Single { followed_by, .. } => *followed_by = Some(pattern.to_string()),
            _ => debug_assert!(false, "followed_by applies to single-match rules"),
        }
        self
    }

    /// Rule names eligible while this rule's region is open. Applies to every
    /// region-shaped alternative of the rule.
    pub fn contains(mut self, refs: &[&str]) -> Self {
        self.contains.extend(refs.iter().map(|r| r.to_string()));
        self
    }
}

/// One alternative of a [`RuleDef::variants`] rule.
#[derive(Debug, Clone)]
pub struct Variant {
    /// Overrides the rule's relevance when set.
    pub(crate) relevance: Option<u32>,
    pub(crate) shape: VariantShape,
}

#[derive(Debug, Clone)]
pub(crate) enum VariantShape {
    Single { pattern: String, followed_by: Option<String> },
    Region { begin: String, end: Option<String> },
}

impl Variant {
    pub fn single(pattern: &str) -> Self {
        Variant {
            relevance: None,
            shape: VariantShape::Single { pattern: pattern.to_string(), followed_by: None },
        }
    }

    pub fn region(begin: &str, end: &str) -> Self {
        Variant {
            relevance: None,
            shape: VariantShape::Region { begin: begin.to_string(), end: Some(end.to_string()) },
        }
    }

    pub fn relevance(mut self, relevance: u32) -> Self {
        self.relevance = Some(relevance);
        self
    }

    /// Trailing context; see [`RuleDef::followed_by`].
    pub fn followed_by(mut self, pattern: &str) -> Self {
        match &mut self.shape {
            VariantShape::Single { followed_by, .. } => *followed_by = Some(pattern.to_string()),
            VariantShape::Region { .. } => {
                debug_assert!(false, "followed_by applies to single-match variants")
            }
        }
        self
    }
}
