//! Error taxonomy.
//!
//! Two classes of failure exist, both surfaced to callers:
//!
//! - [`GrammarError`]: raised at compile time by the rule compiler. The
//!   grammar author must fix the definition; nothing is retried. Registration
//!   is atomic, so a failing grammar never disturbs already-registered ones.
//! - [`UnknownLanguageError`]: raised at call time when a requested language
//!   name was never registered (or auto-detection has no candidates).
//!
//! There is deliberately no error for malformed *input text*: the scanner is
//! total over any string, and unterminated constructs degrade gracefully
//! instead of failing. Highlighting must never abort on a half-typed snippet.

use thiserror::Error;

/// A grammar definition that cannot be compiled.
#[derive(Debug, Clone, Error)]
pub enum GrammarError {
    /// Two rules share one name; `contains` references are by name, so names
    /// must be unique within a grammar.
    #[error("grammar `{grammar}`: rule `{rule}` is declared more than once")]
    DuplicateRule { grammar: String, rule: String },

    /// A rule's `contains` list references a name no rule declares.
    #[error("grammar `{grammar}`: rule `{rule}` contains undefined rule `{reference}`")]
    UndefinedReference { grammar: String, rule: String, reference: String },

    /// The grammar's top-level rule list references a name no rule declares.
    #[error("grammar `{grammar}`: top-level contains undefined rule `{reference}`")]
    UndefinedTopLevel { grammar: String, reference: String },

    /// A pattern failed to parse as a regular expression.
    #[error("grammar `{grammar}`: rule `{rule}` has invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        grammar: String,
        rule: String,
        pattern: String,
        #[source]
        source: Box<regex::Error>,
    },

    /// A single-match or `begin` pattern can match the empty string, which
    /// would stall the scanner's cursor.
    #[error("grammar `{grammar}`: rule `{rule}` pattern `{pattern}` can match the empty string")]
    EmptyMatch { grammar: String, rule: String, pattern: String },
}

/// A language lookup that cannot be satisfied by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnknownLanguageError {
    /// The requested name matches no registered language or alias.
    #[error("language `{0}` is not registered")]
    NotRegistered(String),

    /// Auto-detection was asked to choose between zero candidates.
    #[error("no languages registered for auto-detection")]
    NoCandidates,
}
