//! Workload Runners
//!
//! One runner per mode. A runner resolves the input listing, drives its
//! pool once at a fixed worker count, and leaves a RunResult document
//! behind. An empty listing exits with code 2 so the orchestrator can tell
//! misconfiguration apart from a workload failure; I/O-mode per-unit
//! failures are data, not process failures.

use crate::cpu_pool::run_cpu_pool;
use crate::io_pool::run_crawl_pool;
use anyhow::Context;
use scalebench_core::{list_text_files, read_url_list};
use scalebench_report::{
    CPU_MODE, CpuRunDocument, CpuRunMeta, CrawlRunDocument, CrawlRunMeta, FileTokens, WordCount,
    write_document,
};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;

/// Exit code signalling an empty input listing
pub const EXIT_EMPTY_INPUT: i32 = 2;

/// Resolved arguments of one CPU run
pub struct CpuRunArgs {
    /// File or directory holding the corpus
    pub input: PathBuf,
    /// Worker-process count
    pub workers: usize,
    /// Top-K size to record
    pub top: usize,
    /// Result document path
    pub out: PathBuf,
}

/// Resolved arguments of one crawl run
pub struct CrawlRunArgs {
    /// URL-list file
    pub input: PathBuf,
    /// Worker-thread count
    pub workers: usize,
    /// Per-fetch timeout in seconds
    pub timeout_s: f64,
    /// Result document path
    pub out: PathBuf,
}

/// Run the CPU workload once and emit its document.
pub fn run_cpu(args: &CpuRunArgs) -> anyhow::Result<()> {
    let paths = list_text_files(&args.input)
        .with_context(|| format!("listing input {}", args.input.display()))?;
    if paths.is_empty() {
        eprintln!(
            "scalebench: no .txt files found under {}",
            args.input.display()
        );
        std::process::exit(EXIT_EMPTY_INPUT);
    }

    let workers = args.workers.max(1);
    info!(files = paths.len(), workers, "starting cpu run");

    let start = Instant::now();
    let output = run_cpu_pool(&paths, workers)?;
    let total_elapsed_ms = start.elapsed().as_millis() as u64;

    let total_tokens: u64 = output.per_file.iter().map(|f| f.tokens).sum();
    let unique_tokens = output.table.unique() as u64;
    let top_words: Vec<WordCount> = output
        .table
        .top_k(args.top.max(1))
        .into_iter()
        .map(|(word, count)| WordCount { word, count })
        .collect();
    let per_file: Vec<FileTokens> = output
        .per_file
        .iter()
        .map(|f| FileTokens {
            path: f.path.clone(),
            tokens: f.tokens,
        })
        .collect();

    let doc = CpuRunDocument {
        meta: CpuRunMeta {
            mode: CPU_MODE.to_string(),
            workers,
            files: per_file.len(),
            total_tokens,
            unique_tokens,
            total_elapsed_ms,
        },
        top_words,
        per_file,
    };
    write_document(&args.out, &doc)?;

    println!(
        "Files: {} | Tokens: {} | Unique: {}",
        doc.meta.files, total_tokens, unique_tokens
    );
    println!("Total time: {} ms | workers={}", total_elapsed_ms, workers);
    println!("Result: {}", args.out.display());

    Ok(())
}

/// Run the crawl workload once and emit its document.
pub fn run_crawl(args: &CrawlRunArgs) -> anyhow::Result<()> {
    let urls = read_url_list(&args.input)
        .with_context(|| format!("reading URL list {}", args.input.display()))?;
    if urls.is_empty() {
        eprintln!("scalebench: no URLs to process in {}", args.input.display());
        std::process::exit(EXIT_EMPTY_INPUT);
    }

    let workers = args.workers.max(1);
    info!(urls = urls.len(), workers, "starting crawl run");

    let start = Instant::now();
    let results = run_crawl_pool(&urls, workers, Duration::from_secs_f64(args.timeout_s))?;
    let total_elapsed_ms = start.elapsed().as_millis() as u64;

    let ok = results.iter().filter(|r| r.ok).count();
    let failed = results.len() - ok;
    let avg_elapsed_ms =
        results.iter().map(|r| r.elapsed_ms).sum::<u64>() / results.len().max(1) as u64;

    let doc = CrawlRunDocument {
        meta: CrawlRunMeta {
            workers,
            timeout_s: args.timeout_s,
            total_urls: results.len(),
            ok,
            failed,
            total_elapsed_ms,
            avg_elapsed_ms,
        },
        results,
    };
    write_document(&args.out, &doc)?;

    println!("URLs: {} | OK: {} | Errors: {}", doc.meta.total_urls, ok, failed);
    println!(
        "Total time: {} ms | Avg/URL: {} ms | workers={}",
        total_elapsed_ms, avg_elapsed_ms, workers
    );
    println!("Result: {}", args.out.display());

    Ok(())
}
