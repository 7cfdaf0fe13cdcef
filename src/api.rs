//! Public API surface.
//!
//! The engine is exposed through an explicit, owned registry object,
//! [`Highlighter`]: languages are registered into it, looked up by name or
//! alias, and scanned with [`Highlighter::highlight`] or picked automatically
//! with [`Highlighter::highlight_auto`]. There is no hidden module-level
//! registry; drop the `Highlighter` and everything it compiled goes with it.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::engine::{self, CompiledGrammar, ScanMetrics};
use crate::error::{GrammarError, UnknownLanguageError};
use crate::grammar::Grammar;
use crate::{ScanResult, grammars};

static BUILTIN_GRAMMARS: Lazy<Vec<Grammar>> = Lazy::new(grammars::all);

/// Result of automatic language detection.
#[derive(Debug, Clone)]
pub struct AutoDetection {
    /// Name of the winning grammar.
    pub language: String,
    /// The winning grammar's relevance score for this input.
    pub relevance: u32,
    /// The scan produced by the winning grammar.
    pub result: ScanResult,
}

/// Result of [`Highlighter::highlight_verbose`].
#[derive(Debug, Clone)]
pub struct HighlightVerbose {
    /// Resolved grammar name (lookups are by name or alias).
    pub language: String,
    pub result: ScanResult,
    pub metrics: ScanMetrics,
}

/// Language registry and highlighting entry point.
///
/// Grammars are compiled on registration; the compiled form is immutable, so
/// a `&Highlighter` can be shared across threads and scanned concurrently.
#[derive(Debug)]
pub struct Highlighter {
    /// Compiled grammars in registration order (the auto-detect tie-break).
    grammars: Vec<CompiledGrammar>,
    /// Lowercased name/alias -> index into `grammars`.
    index: HashMap<String, usize>,
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl Highlighter {
    /// An empty registry.
    pub fn new() -> Self {
        Highlighter { grammars: Vec::new(), index: HashMap::new() }
    }

    /// A registry preloaded with the bundled grammars.
    pub fn with_builtins() -> Self {
        let mut highlighter = Self::new();
        for grammar in BUILTIN_GRAMMARS.iter() {
            highlighter.register(grammar.clone()).expect("built-in grammar failed to compile");
        }
        highlighter
    }

    /// Compile and register a grammar under its name and aliases.
    ///
    /// Registration is atomic: on a compile error the registry is untouched.
    /// Registering an already-known name replaces the prior entry in place,
    /// keeping its registration-order slot.
    pub fn register(&mut self, grammar: Grammar) -> Result<(), GrammarError> {
        let compiled = engine::compile(&grammar)?;
        let key = compiled.name().to_lowercase();
        let id = match self.index.get(&key).copied() {
            Some(id) => {
                // Drop stale alias entries from the replaced grammar.
                self.index.retain(|_, slot| *slot != id);
                self.grammars[id] = compiled;
                id
            }
            None => {
                self.grammars.push(compiled);
                self.grammars.len() - 1
            }
        };
        self.index.insert(key, id);
        let aliases: Vec<String> =
            self.grammars[id].aliases().iter().map(|a| a.to_lowercase()).collect();
        for alias in aliases {
            self.index.insert(alias, id);
        }
        Ok(())
    }

    /// Look up a compiled grammar by name or alias (case-insensitive).
    pub fn lookup(&self, name: &str) -> Option<&CompiledGrammar> {
        self.index.get(&name.to_lowercase()).map(|&id| &self.grammars[id])
    }

    /// Registered language names, in registration order.
    pub fn languages(&self) -> Vec<&str> {
        self.grammars.iter().map(|g| g.name()).collect()
    }

    /// Forget every registered language.
    pub fn clear(&mut self) {
        self.grammars.clear();
        self.index.clear();
    }

    /// Scan `source` with the named language.
    pub fn highlight(&self, source: &str, language: &str) -> Result<ScanResult, UnknownLanguageError> {
        let grammar = self
            .lookup(language)
            .ok_or_else(|| UnknownLanguageError::NotRegistered(language.to_string()))?;
        Ok(engine::scan(grammar, source))
    }

    /// Scan `source` with the named language, also returning scan metrics.
    pub fn highlight_verbose(
        &self,
        source: &str,
        language: &str,
    ) -> Result<HighlightVerbose, UnknownLanguageError> {
        let grammar = self
            .lookup(language)
            .ok_or_else(|| UnknownLanguageError::NotRegistered(language.to_string()))?;
        let (result, metrics) = engine::scan_with_metrics(grammar, source);
        Ok(HighlightVerbose { language: grammar.name().to_string(), result, metrics })
    }

    /// Scan `source` with every candidate grammar and return the best scorer.
    ///
    /// With `candidates` omitted, all registered grammars are considered
    /// except those flagged [`crate::GrammarFlags::NO_AUTODETECT`]. Ties go
    /// to the earliest-registered candidate. The score is a heuristic
    /// confidence signal, not a correctness guarantee.
    pub fn highlight_auto(
        &self,
        source: &str,
        candidates: Option<&[&str]>,
    ) -> Result<AutoDetection, UnknownLanguageError> {
        let mut ids: Vec<usize> = match candidates {
            Some(names) => names
                .iter()
                .map(|name| {
                    self.index
                        .get(&name.to_lowercase())
                        .copied()
                        .ok_or_else(|| UnknownLanguageError::NotRegistered(name.to_string()))
                })
                .collect::<Result<_, _>>()?,
            None => (0..self.grammars.len())
                .filter(|&id| !self.grammars[id].excluded_from_autodetect())
                .collect(),
        };
        // Registration order decides ties regardless of how candidates were
        // listed.
        ids.sort_unstable();
        ids.dedup();

        let mut best: Option<(usize, ScanResult)> = None;
        for id in ids {
            let result = engine::scan(&self.grammars[id], source);
            let better = match &best {
                Some((_, current)) => result.relevance > current.relevance,
                None => true,
            };
            if better {
                best = Some((id, result));
            }
        }

        let (id, result) = best.ok_or(UnknownLanguageError::NoCandidates)?;
        Ok(AutoDetection {
            language: self.grammars[id].name().to_string(),
            relevance: result.relevance,
            result,
        })
    }
}
