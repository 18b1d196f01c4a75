#![warn(missing_docs)]
//! Scalebench Core - Workload Analyzers and Worker Runtime
//!
//! This crate provides the per-unit analysis code shared by both workload
//! modes, plus the execution environment for CPU pool worker processes:
//! - Word tokenization and the frequency-table accumulator (CPU mode)
//! - Input listing (text-file discovery, URL-list parsing)
//! - HTTP fetch + page analysis (I/O mode)
//! - `WorkerMain`, the command loop run inside each worker process

mod fetch;
mod input;
mod tokenize;
mod worker;

pub use fetch::{FetchErrorKind, FetchRecord, extract_text, fetch_and_analyze};
pub use input::{list_text_files, read_url_list};
pub use tokenize::{FileStats, FrequencyTable, analyze_file, tokenize_counts};
pub use worker::WorkerMain;
