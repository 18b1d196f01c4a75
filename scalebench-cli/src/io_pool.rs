//! I/O Worker Pool
//!
//! Shared-memory concurrency for the crawl workload: a dedicated rayon pool
//! of exactly N threads, one blocking fetch per unit. Workers spend their
//! time waiting on the network, so thread isolation is all that is needed —
//! process isolation would buy nothing here.
//!
//! Unlike the CPU pool, a failed unit never aborts the run: network input
//! is untrusted, and failures are data the benchmark reports.

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use scalebench_core::{FetchRecord, fetch_and_analyze};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// The crawl pool can only fail before any unit runs
#[derive(Debug, Error)]
#[error("failed to build crawl pool: {0}")]
pub struct CrawlPoolError(#[from] rayon::ThreadPoolBuildError);

/// Fetch every URL with `workers` concurrent threads and a per-fetch
/// timeout. Returns exactly one record per URL, sorted by URL.
pub fn run_crawl_pool(
    urls: &[String],
    workers: usize,
    timeout: Duration,
) -> Result<Vec<FetchRecord>, CrawlPoolError> {
    let workers = workers.max(1);
    let pool = ThreadPoolBuilder::new().num_threads(workers).build()?;

    // Timeout lives in the agent so it applies per fetch, not per pool run
    let agent = ureq::AgentBuilder::new().timeout(timeout).build();

    debug!(workers, urls = urls.len(), "starting crawl pool");
    let mut records: Vec<FetchRecord> = pool.install(|| {
        urls.par_iter()
            .map(|url| fetch_and_analyze(&agent, url))
            .collect()
    });

    // Completion order depends on the network; the emitted order must not
    records.sort_by(|a, b| a.url.cmp(&b.url));
    Ok(records)
}
