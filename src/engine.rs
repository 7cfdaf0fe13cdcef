//! Compilation and scanning engine.
//!
//! This module is the operational core of the crate, split into focused
//! submodules under `src/engine/` while keeping stable paths (for example
//! `crate::engine::CompiledGrammar` and `crate::engine::scan`).
//!
//! ## How the parts work together
//!
//! Highlighting a piece of source text is a two-phase pipeline:
//!
//! ```text
//! Grammar (declarative rules)
//!        │
//!        │  compile                        (compiler.rs)
//!        ▼
//! CompiledGrammar ── immutable, cached, shared across scans
//!        │
//! source ┼─ scan                           (scanner.rs)
//!        │    - anchored pattern matching at the cursor
//!        │    - region tracking via ScopeStack (scope.rs)
//!        │    - keyword re-tagging (keywords.rs)
//!        │    - relevance accumulation (relevance.rs)
//!        ▼
//! ScanResult: token tree + relevance score
//! ```
//!
//! Compilation happens once per grammar; a `CompiledGrammar` never changes
//! afterwards and may be scanned from any number of threads concurrently.
//! Each scan owns its cursor, scope stack, and output buffers exclusively.
//!
//! ## Responsibilities by module
//!
//! - `compiler.rs`: resolves rule-name references into arena indices,
//!   flattens variant groups, precompiles every pattern, builds the keyword
//!   table, and validates the grammar (see `GrammarError`).
//! - `scanner.rs`: the single-pass matching loop producing the token tree.
//! - `scope.rs`: the stack of currently open regions.
//! - `keywords.rs`: exact-match keyword classification of identifier tokens.
//! - `relevance.rs`: the per-scan confidence score for language detection.
//! - `metrics.rs`: optional timing/shape data for a scan.
//!
//! ## Debugging
//!
//! The engine emits `tracing` events: `debug` on compilation, `trace` on
//! token emission and region transitions.

#[path = "engine/compiler.rs"]
mod compiler;
#[path = "engine/keywords.rs"]
mod keywords;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/relevance.rs"]
mod relevance;
#[path = "engine/scanner.rs"]
mod scanner;
#[path = "engine/scope.rs"]
mod scope;

pub use compiler::CompiledGrammar;
pub(crate) use compiler::compile;
pub use metrics::ScanMetrics;
pub use scanner::{scan, scan_with_metrics};
