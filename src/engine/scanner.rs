//! The matching loop.
//!
//! A scan is a single deterministic left-to-right pass over the source. At
//! every cursor position:
//!
//! ```text
//! 1. innermost open region's `end` matches here?  -> close it (beats all
//!    other matches at the same offset)
//! 2. otherwise, try eligible rules in declaration order — the open region's
//!    `contains` list, or the grammar's top-level list outside any region:
//!      - region `begin` matches   -> push a frame, descend
//!      - single-match matches     -> emit a token (keyword re-tagging for
//!                                    the identifier rule), advance
//! 3. nothing matches             -> extend the pending plain-text run by
//!                                    one character
//! ```
//!
//! At end of input, open frames are force-closed innermost-first so an
//! unterminated string or comment is still highlighted as that category
//! through end of input. The scan is total: it always terminates (every
//! event consumes input; closing a frame pops the stack) and always covers
//! the whole input (plain-text runs fill the gaps at top level, and a region
//! token is the innermost cover for unmatched text inside it).
//!
//! Matching is anchored with `Regex::find_at(source, cursor)` filtered to
//! matches starting exactly at the cursor. Searching the full source instead
//! of a slice keeps word-boundary and line-anchor semantics intact.

use std::time::Instant;

use regex::Regex;
use tracing::trace;

use super::compiler::{Alternative, CompiledGrammar, Matcher, RuleId};
use super::metrics::ScanMetrics;
use super::relevance::RelevanceScorer;
use super::scope::{ScopeFrame, ScopeStack};
use crate::{ScanResult, Token};

/// Scan `source` with a compiled grammar, producing the token tree and the
/// accumulated relevance score.
pub fn scan(grammar: &CompiledGrammar, source: &str) -> ScanResult {
    scan_with_metrics(grammar, source).0
}

/// Like [`scan`], additionally returning timing and shape data.
pub fn scan_with_metrics(grammar: &CompiledGrammar, source: &str) -> (ScanResult, ScanMetrics) {
    let started = Instant::now();
    let (result, mut metrics) = Scanner::new(grammar, source).run();
    metrics.total = started.elapsed();
    (result, metrics)
}

/// What the eligible-rule probe decided to do at the cursor.
enum Step {
    Single { rule: RuleId, relevance: u32, end: usize },
    Open { rule: RuleId, alt: usize, end: usize },
}

/// Per-scan state. Owned exclusively by one scan; the compiled grammar is
/// the only shared piece and is never mutated.
struct Scanner<'a> {
    grammar: &'a CompiledGrammar,
    source: &'a str,
    cursor: usize,
    scopes: ScopeStack,
    /// Completed top-level tokens.
    root: Vec<Token>,
    /// Start of the pending plain-text run, if one is open. Only ever set at
    /// top level; inside a region the region token itself covers unmatched
    /// text.
    plain_start: Option<usize>,
    scorer: RelevanceScorer,
    metrics: ScanMetrics,
}

impl<'a> Scanner<'a> {
    fn new(grammar: &'a CompiledGrammar, source: &'a str) -> Self {
        Scanner {
            grammar,
            source,
            cursor: 0,
            scopes: ScopeStack::new(),
            root: Vec::new(),
            plain_start: None,
            scorer: RelevanceScorer::new(),
            metrics: ScanMetrics::default(),
        }
    }

    fn run(mut self) -> (ScanResult, ScanMetrics) {
        let len = self.source.len();

        while self.cursor < len {
            // Closing the innermost region beats any match at the same offset.
            if let Some((rule, alt)) = self.scopes.top().map(|f| (f.rule, f.alt)) {
                let (end_re, _) = region_parts(self.grammar, rule, alt);
                if let Some(m) = match_at(end_re, self.source, self.cursor) {
                    let end = m.end();
                    self.close_top(end);
                    self.cursor = self.cursor.max(end);
                    continue;
                }
            }

            match self.probe() {
                Some(Step::Single { rule, relevance, end }) => {
                    self.emit_single(rule, relevance, end);
                }
                Some(Step::Open { rule, alt, end }) => {
                    self.flush_plain();
                    trace!(rule = %self.grammar.rules[rule].name, start = self.cursor, "region opened");
                    self.scopes.push(ScopeFrame { rule, alt, start: self.cursor, children: Vec::new() });
                    self.metrics.max_depth = self.metrics.max_depth.max(self.scopes.depth());
                    self.cursor = end;
                }
                None => {
                    if self.scopes.is_empty() && self.plain_start.is_none() {
                        self.plain_start = Some(self.cursor);
                    }
                    match self.source[self.cursor..].chars().next() {
                        Some(ch) => self.cursor += ch.len_utf8(),
                        None => break,
                    }
                }
            }
        }

        // End of input: flush the pending plain run, then force-close open
        // regions innermost-first so unterminated constructs keep their tag.
        self.flush_plain();
        while !self.scopes.is_empty() {
            self.close_top(len);
        }

        let relevance = self.scorer.total();
        (ScanResult { tokens: self.root, relevance }, self.metrics)
    }

    /// Try every eligible rule's alternatives, in declaration order, at the
    /// cursor. The first hit wins.
    fn probe(&self) -> Option<Step> {
        let eligible: &[RuleId] = match self.scopes.top() {
            Some(frame) => region_parts(self.grammar, frame.rule, frame.alt).1,
            None => &self.grammar.top_level,
        };

        for &id in eligible {
            for (alt_idx, alt) in self.grammar.rules[id].alternatives.iter().enumerate() {
                match &alt.matcher {
                    Matcher::Single { pattern, followed_by } => {
                        let Some(m) = match_at(pattern, self.source, self.cursor) else { continue };
                        // A zero-width hit cannot advance the cursor; treat
                        // it as no match.
                        if m.end() == self.cursor {
                            continue;
                        }
                        if let Some(ahead) = followed_by {
                            if match_at(ahead, self.source, m.end()).is_none() {
                                continue;
                            }
                        }
                        return Some(Step::Single { rule: id, relevance: alt.relevance, end: m.end() });
                    }
                    Matcher::Region { begin, .. } => {
                        let Some(m) = match_at(begin, self.source, self.cursor) else { continue };
                        if m.end() == self.cursor {
                            continue;
                        }
                        return Some(Step::Open { rule: id, alt: alt_idx, end: m.end() });
                    }
                }
            }
        }
        None
    }

    /// Emit a token for a single-match hit spanning `cursor..end`.
    ///
    /// The synthesized identifier rule consults the keyword table here:
    /// classification happens after pattern matching, re-tagging the token
    /// with the keyword's category and weight on an exact hit.
    fn emit_single(&mut self, rule: RuleId, relevance: u32, end: usize) {
        self.flush_plain();
        let def = &self.grammar.rules[rule];
        let (tag, weight) = if self.grammar.identifier_rule == Some(rule) {
            let text = &self.source[self.cursor..end];
            match self.grammar.keywords.classify(text) {
                Some(keyword) => (keyword.category.clone(), keyword.relevance),
                None => (def.tag.clone(), 0),
            }
        } else {
            (def.tag.clone(), relevance)
        };
        trace!(tag = %tag, start = self.cursor, end, "token");
        self.scorer.add(weight);
        self.push_token(Token { tag, start: self.cursor, end, children: Vec::new() });
        self.cursor = end;
    }

    /// Pop the innermost frame and emit its region token ending at `end`,
    /// with everything matched while it was open attached as children.
    fn close_top(&mut self, end: usize) {
        let Some(frame) = self.scopes.pop() else { return };
        let def = &self.grammar.rules[frame.rule];
        trace!(rule = %def.name, start = frame.start, end, "region closed");
        self.scorer.add(def.alternatives[frame.alt].relevance);
        self.push_token(Token {
            tag: def.tag.clone(),
            start: frame.start,
            end,
            children: frame.children,
        });
    }

    /// Close the pending plain-text run, if any, at the cursor.
    fn flush_plain(&mut self) {
        let Some(start) = self.plain_start.take() else { return };
        if start < self.cursor {
            self.metrics.plain_runs += 1;
            self.push_token(Token::plain(start, self.cursor));
        }
    }

    fn push_token(&mut self, token: Token) {
        self.metrics.tokens += 1;
        match self.scopes.top_mut() {
            Some(frame) => frame.children.push(token),
            None => self.root.push(token),
        }
    }
}

/// Match `re` starting exactly at `at`.
fn match_at<'t>(re: &Regex, text: &'t str, at: usize) -> Option<regex::Match<'t>> {
    re.find_at(text, at).filter(|m| m.start() == at)
}

/// The `end` pattern and `contains` list of a region alternative. Frames are
/// only ever pushed for region alternatives, so the match cannot fail.
fn region_parts(grammar: &CompiledGrammar, rule: RuleId, alt: usize) -> (&Regex, &[RuleId]) {
    match &grammar.rules[rule].alternatives[alt] {
        Alternative { matcher: Matcher::Region { end, contains, .. }, .. } => (end, contains),
        _ => unreachable!("scope frame on a single-match alternative"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{Grammar, RuleDef, Variant};
    use crate::{CompiledGrammar, PLAIN_TAG};

    fn numbers_grammar() -> CompiledGrammar {
        Grammar::new("numbers")
            .rule(RuleDef::single("number", "numbers", r"\b\d+\b"))
            .contains(&["number"])
            .compile()
            .unwrap()
    }

    fn tags(result: &ScanResult, source: &str) -> Vec<(String, String)> {
        result.tokens.iter().map(|t| (t.tag.clone(), t.text(source).to_string())).collect()
    }

    /// Concatenating innermost spans in order must rebuild the source.
    fn innermost_coverage(tokens: &[Token], source: &str) -> String {
        let mut out = String::new();
        for token in tokens {
            cover(token, source, &mut out);
        }
        out
    }

    fn cover(token: &Token, source: &str, out: &mut String) {
        let mut pos = token.start;
        for child in &token.children {
            assert!(child.start >= pos && child.end <= token.end, "child escapes parent span");
            out.push_str(&source[pos..child.start]);
            cover(child, source, out);
            pos = child.end;
        }
        out.push_str(&source[pos..token.end]);
    }

    #[test]
    fn plain_runs_fill_the_gaps() {
        let grammar = numbers_grammar();
        let source = "a 12 b 7";
        let result = scan(&grammar, source);
        assert_eq!(
            tags(&result, source),
            vec![
                (PLAIN_TAG.to_string(), "a ".to_string()),
                ("numbers".to_string(), "12".to_string()),
                (PLAIN_TAG.to_string(), " b ".to_string()),
                ("numbers".to_string(), "7".to_string()),
            ]
        );
        assert_eq!(innermost_coverage(&result.tokens, source), source);
    }

    #[test]
    fn input_without_matches_is_one_plain_token() {
        let grammar = numbers_grammar();
        let source = "héllo wörld →";
        let result = scan(&grammar, source);
        assert_eq!(result.tokens.len(), 1);
        assert!(result.tokens[0].is_plain());
        assert_eq!(result.tokens[0].text(source), source);
        assert_eq!(result.relevance, 0);
    }

    #[test]
    fn empty_input_yields_empty_result() {
        let result = scan(&numbers_grammar(), "");
        assert!(result.tokens.is_empty());
        assert_eq!(result.relevance, 0);
    }

    #[test]
    fn self_referential_regions_nest() {
        let grammar = Grammar::new("parens")
            .rule(RuleDef::region("group", "group", r"\(", r"\)").contains(&["group"]))
            .contains(&["group"])
            .compile()
            .unwrap();

        let source = "((x))";
        let result = scan(&grammar, source);
        assert_eq!(result.tokens.len(), 1);

        let outer = &result.tokens[0];
        assert_eq!((outer.start, outer.end), (0, 5));
        assert_eq!(outer.children.len(), 1);

        let inner = &outer.children[0];
        assert_eq!((inner.start, inner.end), (1, 4));
        assert!(inner.children.is_empty());
        assert_eq!(innermost_coverage(&result.tokens, source), source);
    }

    #[test]
    fn closing_beats_opening_at_the_same_offset() {
        // With `]` also a valid begin, the open frame's end must win.
        let grammar = Grammar::new("brackets")
            .rule(RuleDef::region("block", "block", r"[\[\]]", r"\]").contains(&["block"]))
            .contains(&["block"])
            .compile()
            .unwrap();

        let source = "[]";
        let result = scan(&grammar, source);
        assert_eq!(result.tokens.len(), 1);
        assert_eq!((result.tokens[0].start, result.tokens[0].end), (0, 2));
        assert!(result.tokens[0].children.is_empty());
    }

    #[test]
    fn zero_width_end_closes_at_line_end() {
        let grammar = Grammar::new("comments")
            .rule(RuleDef::region("comment", "comment", "//", "$"))
            .contains(&["comment"])
            .compile()
            .unwrap();

        let source = "//x\ny";
        let result = scan(&grammar, source);
        assert_eq!(
            tags(&result, source),
            vec![("comment".to_string(), "//x".to_string()), (PLAIN_TAG.to_string(), "\ny".to_string())]
        );
    }

    #[test]
    fn unterminated_region_is_closed_at_eof() {
        let grammar = Grammar::new("strings")
            .rule(RuleDef::region("string", "string", "\"", "\""))
            .contains(&["string"])
            .compile()
            .unwrap();

        let source = "\"abc";
        let result = scan(&grammar, source);
        assert_eq!(result.tokens.len(), 1);
        assert_eq!(result.tokens[0].tag, "string");
        assert_eq!((result.tokens[0].start, result.tokens[0].end), (0, 4));
    }

    #[test]
    fn keywords_retag_identifier_matches() {
        let grammar = Grammar::new("kw")
            .keywords(&["fn", "return", "if"])
            .compile()
            .unwrap();

        let source = "fn add";
        let result = scan(&grammar, source);
        assert_eq!(
            tags(&result, source),
            vec![
                ("keyword".to_string(), "fn".to_string()),
                (PLAIN_TAG.to_string(), " ".to_string()),
                ("identifier".to_string(), "add".to_string()),
            ]
        );
        // Keywords weigh 1, identifiers 0.
        assert_eq!(result.relevance, 1);
    }

    #[test]
    fn near_miss_identifiers_stay_generic() {
        let grammar = Grammar::new("kw").keywords(&["fn"]).compile().unwrap();
        let source = "fns";
        let result = scan(&grammar, source);
        assert_eq!(tags(&result, source), vec![("identifier".to_string(), "fns".to_string())]);
        assert_eq!(result.relevance, 0);
    }

    #[test]
    fn earlier_declared_rule_shadows_later_one() {
        let grammar = Grammar::new("order")
            .rule(RuleDef::single("first", "first", "aa"))
            .rule(RuleDef::single("second", "second", "a+"))
            .contains(&["first", "second"])
            .compile()
            .unwrap();

        let source = "aa";
        let result = scan(&grammar, source);
        assert_eq!(tags(&result, source), vec![("first".to_string(), "aa".to_string())]);
    }

    #[test]
    fn first_matching_variant_wins() {
        let grammar = Grammar::new("variants")
            .rule(RuleDef::variants(
                "pair",
                "pair",
                vec![Variant::single("ab"), Variant::single("a")],
            ))
            .contains(&["pair"])
            .compile()
            .unwrap();
        let result = scan(&grammar, "ab");
        assert_eq!((result.tokens[0].start, result.tokens[0].end), (0, 2));

        let flipped = Grammar::new("variants")
            .rule(RuleDef::variants(
                "pair",
                "pair",
                vec![Variant::single("a"), Variant::single("ab")],
            ))
            .contains(&["pair"])
            .compile()
            .unwrap();
        let result = scan(&flipped, "ab");
        assert_eq!((result.tokens[0].start, result.tokens[0].end), (0, 1));
    }

    #[test]
    fn trailing_context_constrains_without_consuming() {
        let grammar = Grammar::new("decl")
            .rule(RuleDef::single("declaration", "variable", r"\b[a-z_]\w*").followed_by(r"\s*:"))
            .contains(&["declaration"])
            .compile()
            .unwrap();

        let source = "foo: bar";
        let result = scan(&grammar, source);
        assert_eq!(
            tags(&result, source),
            vec![
                ("variable".to_string(), "foo".to_string()),
                // `bar` has no colon after it, so the rule does not fire
                // and the plain run swallows it.
                (PLAIN_TAG.to_string(), ": bar".to_string()),
            ]
        );
    }

    #[test]
    fn nested_tags_inside_a_region_become_children() {
        let grammar = Grammar::new("comments")
            .rule(RuleDef::single("tag", "title", r"\bTODO\b"))
            .rule(RuleDef::region("comment", "comment", "//", "$").contains(&["tag"]))
            .contains(&["comment"])
            .compile()
            .unwrap();

        let source = "// TODO later";
        let result = scan(&grammar, source);
        assert_eq!(result.tokens.len(), 1);
        let comment = &result.tokens[0];
        assert_eq!(comment.tag, "comment");
        assert_eq!((comment.start, comment.end), (0, source.len()));
        assert_eq!(comment.children.len(), 1);
        assert_eq!(comment.children[0].tag, "title");
        assert_eq!(comment.children[0].text(source), "TODO");
        assert_eq!(innermost_coverage(&result.tokens, source), source);
    }

    #[test]
    fn scanning_is_deterministic() {
        let grammar = Grammar::new("mix")
            .keywords(&["let"])
            .rule(RuleDef::single("number", "numbers", r"\b\d+\b"))
            .rule(RuleDef::region("comment", "comment", "//", "$"))
            .contains(&["comment", "number"])
            .compile()
            .unwrap();

        let source = "let x = 42 // answer\nlet y = 7";
        let first = scan(&grammar, source);
        let second = scan(&grammar, source);
        assert_eq!(first, second);
    }

    #[test]
    fn metrics_reflect_scan_shape() {
        let grammar = Grammar::new("parens")
            .rule(RuleDef::region("group", "group", r"\(", r"\)").contains(&["group"]))
            .contains(&["group"])
            .compile()
            .unwrap();

        let (result, metrics) = scan_with_metrics(&grammar, "x ((y))");
        assert_eq!(metrics.max_depth, 2);
        assert_eq!(metrics.plain_runs, 1);
        assert!(metrics.tokens >= result.tokens.len());
    }
}
