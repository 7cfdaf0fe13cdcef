//! Verdi language grammar.

use crate::grammar::{Grammar, RuleDef, Variant};

const KEYWORDS: &[&str] = &[
    "and",
    "break",
    "catch",
    "defer",
    "distinct",
    "else",
    "error",
    "errordefer",
    "export",
    "fn",
    "for",
    "if",
    "nil",
    "or",
    "packed",
    "not",
    "return",
    "struct",
    "match",
    "try",
    "union",
    "unreachable",
    "while",
    "until",
    "repeat",
    "with",
    "only",
    "mut",
    "as",
    "in",
    "is",
];

pub fn grammar() -> Grammar {
    Grammar::new("Verdi")
        .aliases(&["verdi"])
        .keywords(KEYWORDS)
        .rule(RuleDef::single("literal", "literal", "(unreachable)"))
        .rule(RuleDef::variants(
            "types",
            "type",
            vec![
                // Integer and float types
                Variant::single(r"\b(f16|f32|f64|f128|u\d+(x\d+)?|s\d+(x\d+)?|ssize|usize)\b")
                    .relevance(2),
                // Other types
                Variant::single(r"\b(bool|cmp|any|mut)\b").relevance(0),
            ],
        ))
        .rule(
            RuleDef::single("declaration", "variable", r#"\b([a-zA-Z_][a-zA-Z_<>0-9]*|@"[^"]")"#)
                .followed_by(r"\s*:")
                .relevance(0),
        )
        .rule(RuleDef::single("built-in", "built_in", "@[_a-zA-Z][_a-zA-Z0-9]*"))
        .rule(RuleDef::begin_only("import", "built_in", "@import").relevance(10))
        .rule(RuleDef::single("comment-tag", "title", r"\b(TODO|NOTE)\b:?").relevance(0))
        .rule(
            RuleDef::variants("comment", "comment", vec![Variant::region("//", "$")])
                .relevance(0)
                .contains(&["comment-tag"]),
        )
        .rule(RuleDef::variants(
            "string-escape",
            "string",
            vec![
                // escape
                Variant::single(r#"\\([nrt'"\\]|(x[0-9a-fA-F]{2})|(u\{[0-9a-fA-F]+\}))"#),
                // invalid string escape
                Variant::single(r"\\."),
            ],
        )
        .relevance(0))
        .rule(
            RuleDef::variants(
                "string",
                "string",
                vec![
                    // Double quotes
                    Variant::region("\"", "\""),
                    // Multi-line
                    Variant::region(r"\\\\", "$"),
                ],
            )
            .relevance(0)
            .contains(&["string-escape"]),
        )
        .rule(RuleDef::variants(
            "operator",
            "operator",
            vec![
                // Comparison
                Variant::single("(==|<>)"),
                // Arithmetic
                Variant::single(r"(-|\+|\*|/)=?"),
                // Bitwise
                Variant::single(r"(&|\|)=?"),
                // Special
                Variant::single(r"(\+\+|\*\*|->|=>)"),
            ],
        )
        .relevance(0))
        .rule(RuleDef::variants(
            "function",
            "title.function",
            vec![
                Variant::single(r"\b'[a-zA-Z_][a-zA-Z0-9_<>]*'?\b"),
                Variant::single(r"\b[a-zA-Z_][a-zA-Z0-9_<>]*'\b"),
            ],
        )
        .relevance(0))
        .rule(RuleDef::variants(
            "number",
            "numbers",
            vec![
                // Decimal
                Variant::single(r"\b[0-9]([0-9._]*[0-9_])?\b"),
                // Decimal (explicit base)
                Variant::single(r"\b0_*[dD][0-9._]*[0-9_]\b"),
                // Hexadecimal
                Variant::single(r"\b0_*[xX][a-fA-F0-9._]*[a-fA-F0-9_]\b"),
                // Octal
                Variant::single(r"\b0_*[oO][0-7._]*[0-7_]\b"),
                // Quaternary
                Variant::single(r"\b0_*[qQ][0123._]*[0123_]\b"),
                // Binary
                Variant::single(r"\b0_*[bB][01._]*[01_]\b"),
            ],
        )
        .relevance(0))
        .contains(&[
            "literal",
            "string",
            "comment",
            "types",
            "function",
            "built-in",
            "import",
            "operator",
            "number",
            "declaration",
        ])
}
