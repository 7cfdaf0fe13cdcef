//! Rule compilation.
//!
//! This module holds the *static* side of the engine: turning a declarative
//! [`Grammar`] into a [`CompiledGrammar`] the scanner can evaluate without
//! further allocation or validation.
//!
//! Compilation does four things:
//!
//! 1. Assigns every declared rule an arena index ([`RuleId`]) and resolves all
//!    name references (`contains` lists, the top-level list) to indices.
//!    Self- and ancestor-references resolve like any other, which is what
//!    permits unbounded runtime nesting without ownership cycles.
//! 2. Flattens variant groups into one ordered alternative list per rule,
//!    preserving declaration order as the tie-break.
//! 3. Precompiles every pattern into a `regex::Regex`, exactly once. Patterns
//!    are wrapped in `(?m:…)` so `$` means end-of-line, matching the flags
//!    the reference implementation compiles with; a case-insensitive grammar
//!    adds `i`.
//! 4. Builds the keyword table and, when the grammar has keywords, appends a
//!    synthesized identifier rule after all declared top-level rules so that
//!    every declared rule shadows it.
//!
//! ## Invariants
//!
//! - `RuleId` is an index into `CompiledGrammar::rules`; the vector is never
//!   reordered after compilation.
//! - Every `contains` entry and `top_level` entry is a valid index.
//! - No single-match or `begin` pattern can match the empty string.

use std::collections::HashMap;

use regex::Regex;
use tracing::debug;

use super::keywords::KeywordTable;
use crate::error::GrammarError;
use crate::grammar::{Grammar, GrammarFlags, RuleDef, ShapeDef, VariantShape};

/// Rule identifier (index into the compiled rule arena).
pub(crate) type RuleId = usize;

pub(crate) const IDENTIFIER_TAG: &str = "identifier";
const IDENTIFIER_PATTERN: &str = r"[A-Za-z_]\w*";

/// Immutable, pre-compiled rule set derived once from a [`Grammar`].
///
/// Safe to share read-only across concurrent scans; nothing in here is
/// mutated after compilation.
#[derive(Debug)]
pub struct CompiledGrammar {
    pub(crate) name: String,
    pub(crate) aliases: Vec<String>,
    pub(crate) flags: GrammarFlags,
    /// Rule arena; `contains` lists and `top_level` index into it.
    pub(crate) rules: Vec<CompiledRule>,
    /// Rules eligible at positions outside any region, in priority order.
    pub(crate) top_level: Vec<RuleId>,
    pub(crate) keywords: KeywordTable,
    /// The synthesized identifier rule consulting the keyword table, if the
    /// grammar declares keywords.
    pub(crate) identifier_rule: Option<RuleId>,
}

impl CompiledGrammar {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub(crate) fn excluded_from_autodetect(&self) -> bool {
        self.flags.contains(GrammarFlags::NO_AUTODETECT)
    }
}

#[derive(Debug)]
pub(crate) struct CompiledRule {
    pub(crate) name: String,
    pub(crate) tag: String,
    /// Flattened alternatives in declaration order; the first one matching at
    /// a position decides the rule's behavior there.
    pub(crate) alternatives: Vec<Alternative>,
}

#[derive(Debug)]
pub(crate) struct Alternative {
    pub(crate) relevance: u32,
    pub(crate) matcher: Matcher,
}

#[derive(Debug)]
pub(crate) enum Matcher {
    Single { pattern: Regex, followed_by: Option<Regex> },
    Region { begin: Regex, end: Regex, contains: Vec<RuleId> },
}

/// Compile `grammar` into an immutable rule set.
pub(crate) fn compile(grammar: &Grammar) -> Result<CompiledGrammar, GrammarError> {
    let mut ids: HashMap<&str, RuleId> = HashMap::with_capacity(grammar.rules.len());
    for (id, rule) in grammar.rules.iter().enumerate() {
        if ids.insert(rule.name.as_str(), id).is_some() {
            return Err(GrammarError::DuplicateRule {
                grammar: grammar.name.clone(),
                rule: rule.name.clone(),
            });
        }
    }

    let mut rules = Vec::with_capacity(grammar.rules.len() + 1);
    for def in &grammar.rules {
        rules.push(compile_rule(grammar, &ids, def)?);
    }

    let mut top_level = resolve_refs(&ids, &grammar.contains).map_err(|reference| {
        GrammarError::UndefinedTopLevel { grammar: grammar.name.clone(), reference }
    })?;

    let keywords = KeywordTable::new(
        &grammar.keywords,
        grammar.flags.contains(GrammarFlags::CASE_INSENSITIVE),
    );

    // Keyword classification needs an identifier-shaped rule to hang off.
    // It goes last so every declared rule shadows it.
    let identifier_rule = if keywords.is_empty() {
        None
    } else {
        let id = rules.len();
        let pattern = compile_pattern(grammar, IDENTIFIER_TAG, IDENTIFIER_PATTERN, PatternRole::Event)?;
        rules.push(CompiledRule {
            name: IDENTIFIER_TAG.to_string(),
            tag: IDENTIFIER_TAG.to_string(),
            alternatives: vec![Alternative {
                relevance: 0,
                matcher: Matcher::Single { pattern, followed_by: None },
            }],
        });
        top_level.push(id);
        Some(id)
    };

    debug!(
        grammar = %grammar.name,
        rules = rules.len(),
        keywords = keywords.len(),
        "grammar compiled"
    );

    Ok(CompiledGrammar {
        name: grammar.name.clone(),
        aliases: grammar.aliases.clone(),
        flags: grammar.flags,
        rules,
        top_level,
        keywords,
        identifier_rule,
    })
}

fn compile_rule(
    grammar: &Grammar,
    ids: &HashMap<&str, RuleId>,
    def: &RuleDef,
) -> Result<CompiledRule, GrammarError> {
    let contains = resolve_refs(ids, &def.contains).map_err(|reference| {
        GrammarError::UndefinedReference {
            grammar: grammar.name.clone(),
            rule: def.name.clone(),
            reference,
        }
    })?;

    let mut alternatives = Vec::new();
    match &def.shape {
        ShapeDef::Single { pattern, followed_by } => {
            alternatives.push(single_alt(grammar, &def.name, def.relevance, pattern, followed_by.as_deref())?);
        }
        ShapeDef::Region { begin, end } => {
            alternatives.push(region_alt(grammar, &def.name, def.relevance, begin, end.as_deref(), &contains)?);
        }
        ShapeDef::Variants(variants) => {
            for variant in variants {
                let relevance = variant.relevance.unwrap_or(def.relevance);
                let alt = match &variant.shape {
                    VariantShape::Single { pattern, followed_by } => {
                        single_alt(grammar, &def.name, relevance, pattern, followed_by.as_deref())?
                    }
                    VariantShape::Region { begin, end } => {
                        region_alt(grammar, &def.name, relevance, begin, end.as_deref(), &contains)?
                    }
                };
                alternatives.push(alt);
            }
        }
    }

    Ok(CompiledRule { name: def.name.clone(), tag: def.tag.clone(), alternatives })
}

fn single_alt(
    grammar: &Grammar,
    rule: &str,
    relevance: u32,
    pattern: &str,
    followed_by: Option<&str>,
) -> Result<Alternative, GrammarError> {
    let pattern = compile_pattern(grammar, rule, pattern, PatternRole::Event)?;
    let followed_by = followed_by
        .map(|p| compile_pattern(grammar, rule, p, PatternRole::Ahead))
        .transpose()?;
    Ok(Alternative { relevance, matcher: Matcher::Single { pattern, followed_by } })
}

fn region_alt(
    grammar: &Grammar,
    rule: &str,
    relevance: u32,
    begin: &str,
    end: Option<&str>,
    contains: &[RuleId],
) -> Result<Alternative, GrammarError> {
    // A region without an `end` opens and closes on its own `begin` match,
    // so it degenerates to a single-match alternative.
    let Some(end) = end else {
        return single_alt(grammar, rule, relevance, begin, None);
    };
    let begin = compile_pattern(grammar, rule, begin, PatternRole::Event)?;
    let end = compile_pattern(grammar, rule, end, PatternRole::End)?;
    Ok(Alternative {
        relevance,
        matcher: Matcher::Region { begin, end, contains: contains.to_vec() },
    })
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum PatternRole {
    /// Single-match or `begin`: produces a token / opens a region, must
    /// consume input.
    Event,
    /// Region `end`: may be zero-width (e.g. `$`); closing a frame is
    /// progress on its own.
    End,
    /// Trailing context: constrains a match without consuming input.
    Ahead,
}

fn compile_pattern(
    grammar: &Grammar,
    rule: &str,
    pattern: &str,
    role: PatternRole,
) -> Result<Regex, GrammarError> {
    let wrapped = if grammar.flags.contains(GrammarFlags::CASE_INSENSITIVE) {
        format!("(?im:{pattern})")
    } else {
        format!("(?m:{pattern})")
    };
    let re = Regex::new(&wrapped).map_err(|source| GrammarError::InvalidPattern {
        grammar: grammar.name.clone(),
        rule: rule.to_string(),
        pattern: pattern.to_string(),
        source: Box::new(source),
    })?;
    if role == PatternRole::Event && re.find("").is_some() {
        return Err(GrammarError::EmptyMatch {
            grammar: grammar.name.clone(),
            rule: rule.to_string(),
            pattern: pattern.to_string(),
        });
    }
    Ok(re)
}

fn resolve_refs(ids: &HashMap<&str, RuleId>, refs: &[String]) -> Result<Vec<RuleId>, String> {
    refs.iter()
        .map(|name| ids.get(name.as_str()).copied().ok_or_else(|| name.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{Grammar, RuleDef, Variant};
    use crate::scan;

    #[test]
    fn invalid_pattern_is_rejected() {
        let grammar = Grammar::new("bad")
            .rule(RuleDef::single("broken", "x", "(unclosed"))
            .contains(&["broken"]);
        assert!(matches!(
            grammar.compile(),
            Err(GrammarError::InvalidPattern { rule, .. }) if rule == "broken"
        ));
    }

    #[test]
    fn undefined_contains_reference_is_rejected() {
        let grammar = Grammar::new("bad")
            .rule(RuleDef::region("comment", "comment", "//", "$").contains(&["ghost"]))
            .contains(&["comment"]);
        assert!(matches!(
            grammar.compile(),
            Err(GrammarError::UndefinedReference { reference, .. }) if reference == "ghost"
        ));
    }

    #[test]
    fn undefined_top_level_reference_is_rejected() {
        let grammar = Grammar::new("bad").contains(&["ghost"]);
        assert!(matches!(
            grammar.compile(),
            Err(GrammarError::UndefinedTopLevel { reference, .. }) if reference == "ghost"
        ));
    }

    #[test]
    fn duplicate_rule_names_are_rejected() {
        let grammar = Grammar::new("bad")
            .rule(RuleDef::single("number", "numbers", r"\d+"))
            .rule(RuleDef::single("number", "numbers", r"[0-9]+"));
        assert!(matches!(
            grammar.compile(),
            Err(GrammarError::DuplicateRule { rule, .. }) if rule == "number"
        ));
    }

    #[test]
    fn empty_capable_event_pattern_is_rejected() {
        let grammar = Grammar::new("bad").rule(RuleDef::single("star", "x", "a*")).contains(&["star"]);
        assert!(matches!(grammar.compile(), Err(GrammarError::EmptyMatch { rule, .. }) if rule == "star"));
    }

    #[test]
    fn zero_width_end_pattern_is_allowed() {
        let grammar = Grammar::new("ok")
            .rule(RuleDef::region("comment", "comment", "//", "$"))
            .contains(&["comment"]);
        assert!(grammar.compile().is_ok());
    }

    #[test]
    fn begin_only_region_compiles_to_single_match() {
        let grammar = Grammar::new("ok")
            .rule(RuleDef::begin_only("marker", "built_in", "@import").relevance(10))
            .contains(&["marker"]);
        let compiled = grammar.compile().unwrap();

        let result = scan(&compiled, "@import");
        assert_eq!(result.tokens.len(), 1);
        assert_eq!(result.tokens[0].tag, "built_in");
        assert_eq!((result.tokens[0].start, result.tokens[0].end), (0, 7));
        assert!(result.tokens[0].children.is_empty());
        assert_eq!(result.relevance, 10);
    }

    #[test]
    fn variant_relevance_overrides_rule_relevance() {
        let grammar = Grammar::new("ok")
            .rule(RuleDef::variants(
                "types",
                "type",
                vec![Variant::single(r"\bu32\b").relevance(2), Variant::single(r"\bbool\b")],
            )
            .relevance(0))
            .contains(&["types"]);
        let compiled = grammar.compile().unwrap();

        assert_eq!(scan(&compiled, "u32").relevance, 2);
        assert_eq!(scan(&compiled, "bool").relevance, 0);
    }

    #[test]
    fn identifier_rule_is_appended_only_with_keywords() {
        let without = Grammar::new("a")
            .rule(RuleDef::single("number", "numbers", r"\d+"))
            .contains(&["number"])
            .compile()
            .unwrap();
        assert!(without.identifier_rule.is_none());

        let with = Grammar::new("b").keywords(&["fn"]).compile().unwrap();
        let id = with.identifier_rule.unwrap();
        assert_eq!(with.top_level.last().copied(), Some(id));
    }

    #[test]
    fn compilation_is_idempotent() {
        let grammar = Grammar::new("demo")
            .keywords(&["if", "else"])
            .rule(RuleDef::single("number", "numbers", r"\b\d+\b"))
            .rule(RuleDef::region("comment", "comment", "//", "$"))
            .contains(&["comment", "number"]);

        let first = grammar.compile().unwrap();
        let second = grammar.compile().unwrap();
        for input in ["if x else 42", "// note\n17", ""] {
            assert_eq!(scan(&first, input), scan(&second, input));
        }
    }

    #[test]
    fn case_insensitive_grammars_fold_patterns() {
        let grammar = Grammar::new("ci")
            .case_insensitive()
            .rule(RuleDef::single("word", "keyword", r"\bselect\b"))
            .contains(&["word"]);
        let compiled = grammar.compile().unwrap();
        assert_eq!(scan(&compiled, "SELECT").tokens[0].tag, "keyword");
    }
}
