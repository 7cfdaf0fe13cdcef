//! Keyword classification.
//!
//! A grammar's keyword table maps literal words to categories (`"keyword"`,
//! `"literal"`, `"type"`, …). Classification runs *after* pattern matching:
//! when the synthesized identifier rule matches, the scanner asks the table
//! whether the exact matched text is a keyword and re-tags the token with the
//! keyword's category if so. Lookup is whole-word and case-sensitive unless
//! the grammar is flagged case-insensitive.
//!
//! A word may carry a `word|N` suffix overriding its relevance weight; plain
//! words weigh [`DEFAULT_KEYWORD_RELEVANCE`].

use std::collections::HashMap;

use tracing::warn;

const DEFAULT_KEYWORD_RELEVANCE: u32 = 1;

#[derive(Debug, Clone)]
pub(crate) struct Keyword {
    pub(crate) category: String,
    pub(crate) relevance: u32,
}

/// Exact-match keyword lookup for one compiled grammar.
#[derive(Debug, Default)]
pub(crate) struct KeywordTable {
    entries: HashMap<String, Keyword>,
    case_insensitive: bool,
}

impl KeywordTable {
    pub(crate) fn new(declared: &[(String, String)], case_insensitive: bool) -> Self {
        let mut entries = HashMap::with_capacity(declared.len());
        for (word, category) in declared {
            let (word, relevance) = match word.split_once('|') {
                Some((word, weight)) => {
                    let relevance = weight.parse().unwrap_or_else(|_| {
                        warn!(word, weight, "unparsable keyword relevance weight");
                        DEFAULT_KEYWORD_RELEVANCE
                    });
                    (word, relevance)
                }
                None => (word.as_str(), DEFAULT_KEYWORD_RELEVANCE),
            };
            let key = if case_insensitive { word.to_lowercase() } else { word.to_string() };
            // First declaration wins; later duplicates are ignored.
            entries
                .entry(key)
                .or_insert_with(|| Keyword { category: category.clone(), relevance });
        }
        KeywordTable { entries, case_insensitive }
    }

    /// Classify `word`, returning its keyword entry on an exact match.
    pub(crate) fn classify(&self, word: &str) -> Option<&Keyword> {
        if self.case_insensitive {
            self.entries.get(word.to_lowercase().as_str())
        } else {
            self.entries.get(word)
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
