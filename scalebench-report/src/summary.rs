//! Sweep Summary
//!
//! One row per worker count, derived purely from run-document metadata,
//! plus the derived-metric helpers shared by both modes.

use serde::{Deserialize, Serialize};

/// Throughput in units per second, as a truncated integer.
///
/// Elapsed time is clamped to 1 ms worth of seconds so a 0 ms run does not
/// divide by zero.
pub fn per_second(units: u64, elapsed_ms: u64) -> u64 {
    (units as f64 / (elapsed_ms as f64 / 1000.0).max(0.001)) as u64
}

/// Speedup of this run relative to the sweep's base run.
///
/// `None` when either elapsed time is zero — a ratio against a 0 ms
/// measurement is noise, not data.
pub fn speedup_vs_base(base_elapsed_ms: u64, elapsed_ms: u64) -> Option<f64> {
    if base_elapsed_ms == 0 || elapsed_ms == 0 {
        None
    } else {
        Some(base_elapsed_ms as f64 / elapsed_ms as f64)
    }
}

/// One CPU-mode comparison row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpuBenchRow {
    /// Worker-process count of this run
    pub workers: usize,
    /// Wall-clock time reported by the run
    pub elapsed_ms: u64,
    /// Files processed
    pub files: usize,
    /// Total tokens counted
    pub total_tokens: u64,
    /// Distinct tokens
    pub unique_tokens: u64,
    /// Derived throughput, tokens per second
    pub tok_per_s: u64,
    /// Speedup vs. the sweep base run (exactly 1.0 at the base)
    pub speedup_vs_1: Option<f64>,
}

/// One crawl-mode comparison row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlBenchRow {
    /// Worker-thread count of this run
    pub workers: usize,
    /// Wall-clock time reported by the run
    pub elapsed_ms: u64,
    /// URLs processed
    pub urls: usize,
    /// Successful units
    pub ok: usize,
    /// Failed units
    pub failed: usize,
    /// Mean per-unit latency
    pub avg_per_url_ms: u64,
    /// Derived throughput, URLs per second (`None` for a 0 ms run)
    pub urls_per_s: Option<u64>,
    /// Speedup vs. the sweep base run (exactly 1.0 at the base)
    pub speedup_vs_1: Option<f64>,
}

/// Sweep configuration echoed into the CPU summary document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpuSummaryMeta {
    /// Always `"cpu"`
    pub mode: String,
    /// Input listing as given by the operator
    pub input: String,
    /// First worker count of the sweep
    pub workers_min: usize,
    /// Last worker count of the sweep
    pub workers_max: usize,
    /// Top-K size passed to every run
    pub top: usize,
    /// Directory holding the per-run documents
    pub out_dir: String,
}

/// CPU-mode BenchmarkSummary document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpuSummary {
    /// Sweep configuration
    pub meta: CpuSummaryMeta,
    /// One row per worker count, ascending
    pub rows: Vec<CpuBenchRow>,
}

/// Sweep configuration echoed into the crawl summary document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlSummaryMeta {
    /// Always `"crawler"`
    pub mode: String,
    /// Input listing as given by the operator
    pub input: String,
    /// Per-fetch timeout passed to every run
    pub timeout_s: f64,
    /// First worker count of the sweep
    pub workers_min: usize,
    /// Last worker count of the sweep
    pub workers_max: usize,
    /// Directory holding the per-run documents
    pub out_dir: String,
}

/// Crawl-mode BenchmarkSummary document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlSummary {
    /// Sweep configuration
    pub meta: CrawlSummaryMeta,
    /// One row per worker count, ascending
    pub rows: Vec<CrawlBenchRow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speedup_at_base_is_exactly_one() {
        assert_eq!(speedup_vs_base(1234, 1234), Some(1.0));
    }

    #[test]
    fn test_speedup_is_ratio_of_elapsed_times() {
        assert_eq!(speedup_vs_base(1000, 250), Some(4.0));
        // Slowdowns are reported as-is; no monotonicity is implied
        assert_eq!(speedup_vs_base(1000, 2000), Some(0.5));
    }

    #[test]
    fn test_speedup_zero_elapsed_is_none() {
        assert_eq!(speedup_vs_base(0, 100), None);
        assert_eq!(speedup_vs_base(100, 0), None);
    }

    #[test]
    fn test_per_second() {
        assert_eq!(per_second(8_000, 2_000), 4_000);
        // 0 ms clamps to 1 ms worth of seconds
        assert_eq!(per_second(5, 0), 5_000);
    }

    #[test]
    fn test_row_serializes_null_speedup() {
        let row = CpuBenchRow {
            workers: 1,
            elapsed_ms: 0,
            files: 0,
            total_tokens: 0,
            unique_tokens: 0,
            tok_per_s: 0,
            speedup_vs_1: None,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert!(json["speedup_vs_1"].is_null());
    }
}
