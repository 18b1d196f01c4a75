//! Benchmark Orchestrator
//!
//! Runs a workload once per worker count in `[min, max]`, strictly
//! sequentially — concurrent runs would contend for the very resource
//! being measured. Each run is a supervised child process walked through
//! an explicit state machine:
//!
//! ```text
//! PENDING → LAUNCHED → RUNNING → {COMPLETED | FAILED}
//! ```
//!
//! While a child runs, the orchestrator polls its liveness every
//! [`POLL_INTERVAL`] and prints a heartbeat at the (much coarser)
//! progress interval. A non-zero child exit aborts the whole sweep; a
//! child that exits zero without leaving a well-formed result document is
//! a contract violation, reported as a distinct error.

use crate::runner::EXIT_EMPTY_INPUT;
use scalebench_report::{
    CpuBenchRow, CpuMetaView, CpuSummary, CpuSummaryMeta, CrawlBenchRow, CrawlMetaView,
    CrawlSummary, CrawlSummaryMeta, DocumentError, per_second, read_document, render_table,
    speedup_vs_base, write_document,
};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

/// Liveness poll cadence; deliberately much faster than the heartbeat
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Supervision state of one run in the sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Not yet started
    Pending,
    /// Child process spawned, not yet polled
    Launched,
    /// Child process observed alive
    Running,
    /// Child exited zero
    Completed,
    /// Child exited non-zero, timed out, or could not be spawned
    Failed,
}

/// Errors that abort a sweep
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("failed to launch run '{label}': {source}")]
    Launch {
        label: String,
        source: std::io::Error,
    },

    #[error("run '{label}' failed ({status})")]
    ChildFailed { label: String, status: ExitStatus },

    #[error("run '{label}' reported an empty input listing")]
    EmptyInput { label: String },

    #[error("run '{label}' exceeded the {timeout_s:.0}s supervision timeout")]
    ChildTimedOut { label: String, timeout_s: f64 },

    #[error("run '{label}' reported success but its result document is unusable: {source}")]
    BrokenContract {
        label: String,
        source: DocumentError,
    },

    #[error("failed to write sweep summary: {0}")]
    Summary(#[from] DocumentError),

    #[error("failed to prepare output directory {path}: {source}")]
    OutDir {
        path: String,
        source: std::io::Error,
    },
}

/// Which workload the sweep drives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepMode {
    /// CPU-bound histogram workload
    Cpu,
    /// I/O-bound crawl workload
    Crawler,
}

impl SweepMode {
    fn as_str(self) -> &'static str {
        match self {
            SweepMode::Cpu => "cpu",
            SweepMode::Crawler => "crawler",
        }
    }
}

/// Fully resolved sweep configuration
pub struct SweepConfig {
    /// Workload to sweep
    pub mode: SweepMode,
    /// Input listing, passed through to every run
    pub input: PathBuf,
    /// First worker count
    pub workers_min: usize,
    /// Last worker count
    pub workers_max: usize,
    /// Per-fetch timeout in seconds (crawler mode)
    pub timeout_s: f64,
    /// Top-K size (cpu mode)
    pub top: usize,
    /// Directory for per-run documents
    pub out_dir: PathBuf,
    /// Summary document path; default `<out_dir>/summary_<mode>.json`
    pub summary_out: Option<PathBuf>,
    /// Whether to print heartbeats and progress lines
    pub progress: bool,
    /// Heartbeat interval (clamped to ≥ 0.5 s)
    pub progress_interval: Duration,
    /// Optional supervision timeout per run; `None` waits indefinitely
    pub run_timeout: Option<Duration>,
}

impl SweepConfig {
    fn summary_path(&self) -> PathBuf {
        self.summary_out.clone().unwrap_or_else(|| {
            self.out_dir
                .join(format!("summary_{}.json", self.mode.as_str()))
        })
    }
}

/// Supervisor for a single child run.
///
/// Owns the state transitions; the child handle itself stays local to
/// [`supervise`] so a failed spawn cannot leak a half-built supervisor.
struct RunSupervisor {
    label: String,
    state: RunState,
    progress: bool,
    progress_interval: Duration,
    run_timeout: Option<Duration>,
}

impl RunSupervisor {
    fn new(label: String, config: &SweepConfig) -> Self {
        Self {
            label,
            state: RunState::Pending,
            progress: config.progress,
            progress_interval: config.progress_interval.max(Duration::from_millis(500)),
            run_timeout: config.run_timeout,
        }
    }

    /// Drive one child from PENDING to COMPLETED or FAILED.
    fn supervise(&mut self, command: &mut Command) -> Result<(), SweepError> {
        assert_eq!(self.state, RunState::Pending);

        if self.progress {
            println!("[bench] start: {}", self.label);
        }

        let started = Instant::now();
        let mut child = command.spawn().map_err(|source| {
            self.state = RunState::Failed;
            SweepError::Launch {
                label: self.label.clone(),
                source,
            }
        })?;
        self.state = RunState::Launched;

        let mut next_heartbeat = started + self.progress_interval;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    self.state = RunState::Running;
                }
                Err(source) => {
                    self.state = RunState::Failed;
                    self.kill_quietly(&mut child);
                    return Err(SweepError::Launch {
                        label: self.label.clone(),
                        source,
                    });
                }
            }

            if let Some(timeout) = self.run_timeout {
                if started.elapsed() >= timeout {
                    self.state = RunState::Failed;
                    self.kill_quietly(&mut child);
                    return Err(SweepError::ChildTimedOut {
                        label: self.label.clone(),
                        timeout_s: timeout.as_secs_f64(),
                    });
                }
            }

            let now = Instant::now();
            if self.progress && now >= next_heartbeat {
                println!(
                    "[bench] running: {} ({}s)",
                    self.label,
                    started.elapsed().as_secs()
                );
                next_heartbeat = now + self.progress_interval;
            }

            // Sleep between liveness checks; never busy-spin
            std::thread::sleep(POLL_INTERVAL);
        };

        if status.success() {
            self.state = RunState::Completed;
            debug!(label = %self.label, "run completed");
            if self.progress {
                println!(
                    "[bench] done: {} ({}s)",
                    self.label,
                    started.elapsed().as_secs()
                );
            }
            Ok(())
        } else {
            self.state = RunState::Failed;
            if status.code() == Some(EXIT_EMPTY_INPUT) {
                return Err(SweepError::EmptyInput {
                    label: self.label.clone(),
                });
            }
            Err(SweepError::ChildFailed {
                label: self.label.clone(),
                status,
            })
        }
    }

    fn kill_quietly(&self, child: &mut Child) {
        let _ = child.kill();
        let _ = child.wait();
    }
}

/// Run the whole sweep: one supervised child per worker count, summary
/// document, and comparison table.
pub fn run_sweep(config: &SweepConfig) -> Result<(), SweepError> {
    std::fs::create_dir_all(&config.out_dir).map_err(|source| SweepError::OutDir {
        path: config.out_dir.display().to_string(),
        source,
    })?;

    let exe = std::env::current_exe().map_err(|source| SweepError::Launch {
        label: "sweep".to_string(),
        source,
    })?;

    match config.mode {
        SweepMode::Cpu => sweep_cpu(config, &exe),
        SweepMode::Crawler => sweep_crawler(config, &exe),
    }
}

fn sweep_cpu(config: &SweepConfig, exe: &Path) -> Result<(), SweepError> {
    let total_runs = config.workers_max - config.workers_min + 1;
    let mut rows: Vec<CpuBenchRow> = Vec::with_capacity(total_runs);

    for (index, workers) in (config.workers_min..=config.workers_max).enumerate() {
        if config.progress {
            println!("[{}/{}] workers={}: start...", index + 1, total_runs, workers);
        }

        let out_path = config.out_dir.join(format!("hist_w{workers}.json"));
        let label = format!("cpu workers={workers}");

        let mut command = Command::new(exe);
        command
            .arg("cpu")
            .arg("--input")
            .arg(&config.input)
            .arg("--workers")
            .arg(workers.to_string())
            .arg("--top")
            .arg(config.top.max(1).to_string())
            .arg("--out")
            .arg(&out_path);

        RunSupervisor::new(label.clone(), config).supervise(&mut command)?;

        // The child reported success; its document is now a contract
        let view: CpuMetaView =
            read_document(&out_path).map_err(|source| SweepError::BrokenContract {
                label: label.clone(),
                source,
            })?;
        let meta = view.meta;

        let tok_per_s = per_second(meta.total_tokens, meta.total_elapsed_ms);
        if config.progress {
            println!(
                "[{}/{}] workers={}: done ({} ms, tok/s={})",
                index + 1,
                total_runs,
                workers,
                meta.total_elapsed_ms,
                tok_per_s
            );
        }

        rows.push(CpuBenchRow {
            workers,
            elapsed_ms: meta.total_elapsed_ms,
            files: meta.files,
            total_tokens: meta.total_tokens,
            unique_tokens: meta.unique_tokens,
            tok_per_s,
            speedup_vs_1: None,
        });
    }

    let base_ms = rows.first().map(|r| r.elapsed_ms).unwrap_or(0);
    for row in &mut rows {
        row.speedup_vs_1 = speedup_vs_base(base_ms, row.elapsed_ms);
    }

    let summary = CpuSummary {
        meta: CpuSummaryMeta {
            mode: config.mode.as_str().to_string(),
            input: config.input.display().to_string(),
            workers_min: config.workers_min,
            workers_max: config.workers_max,
            top: config.top,
            out_dir: config.out_dir.display().to_string(),
        },
        rows,
    };
    let summary_path = config.summary_path();
    write_document(&summary_path, &summary)?;
    if config.progress {
        println!("Summary JSON: {}", summary_path.display());
    }

    let table_rows: Vec<Vec<String>> = summary
        .rows
        .iter()
        .map(|r| {
            vec![
                r.workers.to_string(),
                r.elapsed_ms.to_string(),
                r.files.to_string(),
                r.total_tokens.to_string(),
                r.unique_tokens.to_string(),
                r.tok_per_s.to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        render_table(
            &["workers", "elapsed_ms", "files", "tokens", "unique", "tok/s"],
            &table_rows,
        )
    );

    Ok(())
}

fn sweep_crawler(config: &SweepConfig, exe: &Path) -> Result<(), SweepError> {
    let total_runs = config.workers_max - config.workers_min + 1;
    let mut rows: Vec<CrawlBenchRow> = Vec::with_capacity(total_runs);

    for (index, workers) in (config.workers_min..=config.workers_max).enumerate() {
        if config.progress {
            println!("[{}/{}] workers={}: start...", index + 1, total_runs, workers);
        }

        let out_path = config.out_dir.join(format!("crawl_w{workers}.json"));
        let label = format!("crawler workers={workers}");

        let mut command = Command::new(exe);
        command
            .arg("crawl")
            .arg("--input")
            .arg(&config.input)
            .arg("--workers")
            .arg(workers.to_string())
            .arg("--timeout")
            .arg(config.timeout_s.to_string())
            .arg("--out")
            .arg(&out_path);

        RunSupervisor::new(label.clone(), config).supervise(&mut command)?;

        let view: CrawlMetaView =
            read_document(&out_path).map_err(|source| SweepError::BrokenContract {
                label: label.clone(),
                source,
            })?;
        let meta = view.meta;

        let urls_per_s = if meta.total_elapsed_ms > 0 {
            Some(per_second(meta.total_urls as u64, meta.total_elapsed_ms))
        } else {
            None
        };
        if config.progress {
            println!(
                "[{}/{}] workers={}: done ({} ms, ok={}, failed={}, urls/s={})",
                index + 1,
                total_runs,
                workers,
                meta.total_elapsed_ms,
                meta.ok,
                meta.failed,
                urls_per_s.unwrap_or(0)
            );
        }

        rows.push(CrawlBenchRow {
            workers,
            elapsed_ms: meta.total_elapsed_ms,
            urls: meta.total_urls,
            ok: meta.ok,
            failed: meta.failed,
            avg_per_url_ms: meta.avg_elapsed_ms,
            urls_per_s,
            speedup_vs_1: None,
        });
    }

    let base_ms = rows.first().map(|r| r.elapsed_ms).unwrap_or(0);
    for row in &mut rows {
        row.speedup_vs_1 = speedup_vs_base(base_ms, row.elapsed_ms);
    }

    let summary = CrawlSummary {
        meta: CrawlSummaryMeta {
            mode: config.mode.as_str().to_string(),
            input: config.input.display().to_string(),
            timeout_s: config.timeout_s,
            workers_min: config.workers_min,
            workers_max: config.workers_max,
            out_dir: config.out_dir.display().to_string(),
        },
        rows,
    };
    let summary_path = config.summary_path();
    write_document(&summary_path, &summary)?;
    if config.progress {
        println!("Summary JSON: {}", summary_path.display());
    }

    let table_rows: Vec<Vec<String>> = summary
        .rows
        .iter()
        .map(|r| {
            vec![
                r.workers.to_string(),
                r.elapsed_ms.to_string(),
                r.urls.to_string(),
                r.ok.to_string(),
                r.failed.to_string(),
                r.avg_per_url_ms.to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        render_table(
            &[
                "workers",
                "elapsed_ms",
                "urls",
                "ok",
                "failed",
                "avg_per_url_ms",
            ],
            &table_rows,
        )
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> SweepConfig {
        SweepConfig {
            mode: SweepMode::Cpu,
            input: PathBuf::from("unused"),
            workers_min: 1,
            workers_max: 1,
            timeout_s: 10.0,
            top: 30,
            out_dir: PathBuf::from("unused"),
            summary_out: None,
            progress: false,
            progress_interval: Duration::from_secs(5),
            run_timeout: None,
        }
    }

    #[test]
    fn test_zero_exit_reaches_completed() {
        let config = test_config();
        let mut supervisor = RunSupervisor::new("exit-0".to_string(), &config);
        let mut command = Command::new("sh");
        command.args(["-c", "exit 0"]);

        supervisor.supervise(&mut command).unwrap();
        assert_eq!(supervisor.state, RunState::Completed);
    }

    #[test]
    fn test_nonzero_exit_fails_the_run() {
        let config = test_config();
        let mut supervisor = RunSupervisor::new("exit-3".to_string(), &config);
        let mut command = Command::new("sh");
        command.args(["-c", "exit 3"]);

        let err = supervisor.supervise(&mut command).unwrap_err();
        assert_eq!(supervisor.state, RunState::Failed);
        assert!(matches!(err, SweepError::ChildFailed { .. }));
    }

    #[test]
    fn test_empty_input_exit_code_is_distinguished() {
        let config = test_config();
        let mut supervisor = RunSupervisor::new("exit-2".to_string(), &config);
        let mut command = Command::new("sh");
        command.args(["-c", "exit 2"]);

        let err = supervisor.supervise(&mut command).unwrap_err();
        assert!(matches!(err, SweepError::EmptyInput { .. }));
    }

    #[test]
    fn test_spawn_failure_is_a_launch_error() {
        let config = test_config();
        let mut supervisor = RunSupervisor::new("no-such".to_string(), &config);
        let mut command = Command::new("/nonexistent/scalebench-child");

        let err = supervisor.supervise(&mut command).unwrap_err();
        assert_eq!(supervisor.state, RunState::Failed);
        assert!(matches!(err, SweepError::Launch { .. }));
    }

    #[test]
    fn test_run_timeout_kills_the_child() {
        let mut config = test_config();
        config.run_timeout = Some(Duration::from_millis(300));
        let mut supervisor = RunSupervisor::new("hung".to_string(), &config);
        let mut command = Command::new("sh");
        command.args(["-c", "sleep 30"]);

        let started = Instant::now();
        let err = supervisor.supervise(&mut command).unwrap_err();
        assert!(matches!(err, SweepError::ChildTimedOut { .. }));
        assert_eq!(supervisor.state, RunState::Failed);
        // The supervisor gave up long before the child would have finished
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_summary_path_defaults_per_mode() {
        let mut config = test_config();
        config.out_dir = PathBuf::from("out");
        assert_eq!(config.summary_path(), PathBuf::from("out/summary_cpu.json"));

        config.mode = SweepMode::Crawler;
        assert_eq!(
            config.summary_path(),
            PathBuf::from("out/summary_crawler.json")
        );

        config.summary_out = Some(PathBuf::from("elsewhere.json"));
        assert_eq!(config.summary_path(), PathBuf::from("elsewhere.json"));
    }
}
