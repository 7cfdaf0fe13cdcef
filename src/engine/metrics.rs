//! Scan metrics.
//!
//! Optional observability for a scan, returned by
//! [`scan_with_metrics`](super::scan_with_metrics) and surfaced through the
//! verbose API path. The plain [`scan`](super::scan) path collects the same
//! counters (they are cheap integers) but callers never see them, and no
//! extra allocation happens either way.

use std::time::Duration;

/// Shape and timing data for one completed scan.
#[derive(Debug, Default, Clone)]
pub struct ScanMetrics {
    /// Total elapsed wall-clock time for the scan.
    pub total: Duration,
    /// Tokens emitted, including nested children and plain-text runs.
    pub tokens: usize,
    /// Plain-text runs emitted for uncategorized input.
    pub plain_runs: usize,
    /// Deepest region nesting reached.
    pub max_depth: usize,
}
