#![warn(missing_docs)]
//! Scalebench Report
//!
//! The data contracts between runners and the orchestrator: RunResult
//! documents written by workload runners, the sweep summary written by the
//! orchestrator, and the aligned console table. Documents are written once
//! and never mutated; the orchestrator reads only their `meta` section.

mod document;
mod summary;
mod table;

pub use document::{
    CPU_MODE, CpuMetaView, CpuRunDocument, CpuRunMeta, CrawlMetaView, CrawlRunDocument,
    CrawlRunMeta, DocumentError, FileTokens, WordCount, read_document, write_document,
};
pub use summary::{
    CpuBenchRow, CpuSummary, CpuSummaryMeta, CrawlBenchRow, CrawlSummary, CrawlSummaryMeta,
    per_second, speedup_vs_base,
};
pub use table::render_table;
