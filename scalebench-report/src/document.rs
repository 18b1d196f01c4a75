//! RunResult Documents
//!
//! One self-contained JSON document per workload-runner invocation. The
//! schema is part of the runner↔orchestrator contract: a child that exits
//! zero without leaving a well-formed document has violated it.

use scalebench_core::FetchRecord;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Mode tag recorded in CPU run documents
pub const CPU_MODE: &str = "cpu-process-pool";

/// Errors reading or writing result documents
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("result document not found: {path}")]
    Missing { path: String },

    #[error("failed to access result document {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("malformed result document {path}: {source}")]
    Malformed {
        path: String,
        source: serde_json::Error,
    },
}

/// Metadata of one CPU run at a fixed worker count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpuRunMeta {
    /// Execution model tag, always [`CPU_MODE`]
    pub mode: String,
    /// Worker-process count used for this run
    pub workers: usize,
    /// Number of files processed
    pub files: usize,
    /// Sum of all per-file token counts
    pub total_tokens: u64,
    /// Distinct tokens in the merged table
    pub unique_tokens: u64,
    /// Wall-clock time of the pool invocation
    pub total_elapsed_ms: u64,
}

/// One entry of the top-K word list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordCount {
    /// The token
    pub word: String,
    /// Merged count
    pub count: u64,
}

/// Per-file token count, sorted by path in the emitted document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileTokens {
    /// File path as submitted to the pool
    pub path: String,
    /// Token count of that file
    pub tokens: u64,
}

/// CPU-mode RunResult document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpuRunDocument {
    /// Run metadata (all the orchestrator reads)
    pub meta: CpuRunMeta,
    /// Most frequent words, descending by count
    pub top_words: Vec<WordCount>,
    /// Per-file counts, sorted by path
    pub per_file: Vec<FileTokens>,
}

/// Metadata of one crawl run at a fixed worker count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlRunMeta {
    /// Worker-thread count used for this run
    pub workers: usize,
    /// Per-fetch timeout in seconds
    pub timeout_s: f64,
    /// Number of URLs processed
    pub total_urls: usize,
    /// Units that succeeded
    pub ok: usize,
    /// Units that failed (still one record each)
    pub failed: usize,
    /// Wall-clock time of the pool invocation
    pub total_elapsed_ms: u64,
    /// Mean per-unit latency
    pub avg_elapsed_ms: u64,
}

/// Crawl-mode RunResult document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlRunDocument {
    /// Run metadata (all the orchestrator reads)
    pub meta: CrawlRunMeta,
    /// One record per URL, sorted by URL
    pub results: Vec<FetchRecord>,
}

/// Meta-only view of a CPU document; the orchestrator deserializes this
/// instead of the full payload.
#[derive(Debug, Clone, Deserialize)]
pub struct CpuMetaView {
    /// The document's `meta` section
    pub meta: CpuRunMeta,
}

/// Meta-only view of a crawl document
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlMetaView {
    /// The document's `meta` section
    pub meta: CrawlRunMeta,
}

/// Write a document as pretty JSON, creating parent directories.
pub fn write_document<T: Serialize>(path: &Path, doc: &T) -> Result<(), DocumentError> {
    let wrap_io = |source| DocumentError::Io {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(wrap_io)?;
        }
    }

    let json = serde_json::to_string_pretty(doc).map_err(|source| DocumentError::Malformed {
        path: path.display().to_string(),
        source,
    })?;
    fs::write(path, json).map_err(wrap_io)
}

/// Read a document back, distinguishing a missing file from a malformed one.
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T, DocumentError> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(DocumentError::Missing {
                path: path.display().to_string(),
            });
        }
        Err(e) => {
            return Err(DocumentError::Io {
                path: path.display().to_string(),
                source: e,
            });
        }
    };

    serde_json::from_str(&content).map_err(|source| DocumentError::Malformed {
        path: path.display().to_string(),
        source,
    })
}
