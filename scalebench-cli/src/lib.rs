#![warn(missing_docs)]
//! Scalebench CLI
//!
//! Entry point for the `scalebench` binary: argument parsing, config
//! discovery, and dispatch to the workload runners, the sweep
//! orchestrator, and the corpus generator. Also hosts the two worker
//! pools, since they spawn (and are spawned by) this same binary.

pub mod config;
pub mod cpu_pool;
pub mod generate;
pub mod io_pool;
pub mod orchestrator;
pub mod runner;

use clap::{Args, Parser, Subcommand, ValueEnum};
use config::{
    DEFAULT_OUT_DIR, DEFAULT_PROGRESS_INTERVAL_S, DEFAULT_TIMEOUT_S, DEFAULT_TOP,
    DEFAULT_WORKERS_MAX, DEFAULT_WORKERS_MIN, ScaleConfig,
};
use orchestrator::{SweepConfig, SweepMode};
use runner::{CpuRunArgs, CrawlRunArgs};
use scalebench_core::WorkerMain;
use std::path::PathBuf;
use std::time::Duration;

/// Scalebench CLI arguments
#[derive(Parser, Debug)]
#[command(name = "scalebench")]
#[command(author, version, about = "Measure how parallel workloads scale across worker counts")]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Internal: run as a CPU pool worker (used by the process pool)
    #[arg(long, hide = true)]
    pub pool_worker: bool,

    /// Verbose diagnostics
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the CPU-bound histogram workload once at a fixed worker count
    Cpu(CpuCommand),
    /// Run the I/O-bound crawl workload once at a fixed worker count
    Crawl(CrawlCommand),
    /// Sweep a workload across worker counts and print a comparison table
    Bench(BenchCommand),
    /// Generate a synthetic text corpus for the CPU workload
    Gen(GenCommand),
}

/// Arguments of the `cpu` subcommand
#[derive(Args, Debug)]
pub struct CpuCommand {
    /// A .txt file, or a directory scanned recursively for .txt files
    #[arg(long)]
    pub input: PathBuf,

    /// Worker processes (default: logical CPU count)
    #[arg(long)]
    pub workers: Option<usize>,

    /// How many of the most frequent words to record
    #[arg(long)]
    pub top: Option<usize>,

    /// Result document path
    #[arg(long, default_value = "output/histogram.json")]
    pub out: PathBuf,
}

/// Arguments of the `crawl` subcommand
#[derive(Args, Debug)]
pub struct CrawlCommand {
    /// File with one URL per line (# comments and blank lines ignored)
    #[arg(long)]
    pub input: PathBuf,

    /// Worker threads
    #[arg(long, default_value_t = 8)]
    pub workers: usize,

    /// Per-fetch timeout in seconds
    #[arg(long)]
    pub timeout: Option<f64>,

    /// Result document path
    #[arg(long, default_value = "output/results.json")]
    pub out: PathBuf,
}

/// Workload selector for `bench`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BenchMode {
    /// CPU-bound histogram workload
    Cpu,
    /// I/O-bound crawl workload
    Crawler,
}

/// Arguments of the `bench` subcommand
#[derive(Args, Debug)]
pub struct BenchCommand {
    /// Which workload to benchmark
    #[arg(long, value_enum, default_value_t = BenchMode::Cpu)]
    pub mode: BenchMode,

    /// Input listing: .txt file/directory (cpu) or URL-list file (crawler)
    #[arg(long)]
    pub input: PathBuf,

    /// Minimum worker count
    #[arg(long = "min")]
    pub workers_min: Option<usize>,

    /// Maximum worker count
    #[arg(long = "max")]
    pub workers_max: Option<usize>,

    /// Per-fetch timeout in seconds (crawler mode only)
    #[arg(long)]
    pub timeout: Option<f64>,

    /// How many of the most frequent words to record (cpu mode only)
    #[arg(long)]
    pub top: Option<usize>,

    /// Directory for per-run documents and the summary
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Summary document path (default: <out-dir>/summary_<mode>.json)
    #[arg(long)]
    pub summary_out: Option<PathBuf>,

    /// Suppress progress output; only the final table is printed
    #[arg(long)]
    pub quiet: bool,

    /// Heartbeat interval in seconds while a run is in flight
    #[arg(long)]
    pub progress_interval: Option<f64>,

    /// Kill a run exceeding this many seconds and abort the sweep
    /// (0 or absent: wait indefinitely)
    #[arg(long)]
    pub run_timeout: Option<f64>,
}

/// Arguments of the `gen` subcommand
#[derive(Args, Debug)]
pub struct GenCommand {
    /// Target directory for the generated .txt files
    #[arg(long, default_value = "data/texts")]
    pub out_dir: PathBuf,

    /// Number of files to generate
    #[arg(long, default_value_t = 80)]
    pub files: usize,

    /// Words per file
    #[arg(long, default_value_t = 300_000)]
    pub words_per_file: usize,

    /// Vocabulary size (distinct words)
    #[arg(long, default_value_t = 8000)]
    pub vocab: usize,

    /// RNG seed for reproducible corpora
    #[arg(long, default_value_t = 123)]
    pub seed: u64,
}

/// Parse arguments and run the CLI.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Run the CLI with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    // Worker mode first, before logging or config touch anything
    if cli.pool_worker {
        return run_worker_mode();
    }

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("scalebench_cli=debug,scalebench_core=debug")
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("scalebench_cli=info,scalebench_core=info")
            .init();
    }

    // scalebench.toml defaults; CLI flags override
    let config = ScaleConfig::discover().unwrap_or_default();

    match cli.command {
        Some(Commands::Cpu(args)) => runner::run_cpu(&resolve_cpu(args, &config)),
        Some(Commands::Crawl(args)) => runner::run_crawl(&resolve_crawl(args, &config)),
        Some(Commands::Bench(args)) => {
            orchestrator::run_sweep(&resolve_bench(args, &config)).map_err(Into::into)
        }
        Some(Commands::Gen(args)) => generate::run(&generate::GenerateArgs {
            out_dir: args.out_dir,
            files: args.files,
            words_per_file: args.words_per_file,
            vocab: args.vocab,
            seed: args.seed,
        }),
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            Ok(())
        }
    }
}

/// Run as a CPU pool worker process (IPC mode)
fn run_worker_mode() -> anyhow::Result<()> {
    let mut worker = WorkerMain::new();
    worker
        .run()
        .map_err(|e| anyhow::anyhow!("worker error: {}", e))
}

fn default_cpu_workers() -> usize {
    std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(2)
}

fn resolve_cpu(args: CpuCommand, config: &ScaleConfig) -> CpuRunArgs {
    CpuRunArgs {
        input: args.input,
        workers: args.workers.unwrap_or_else(default_cpu_workers),
        top: args.top.or(config.cpu.top).unwrap_or(DEFAULT_TOP).max(1),
        out: args.out,
    }
}

fn resolve_crawl(args: CrawlCommand, config: &ScaleConfig) -> CrawlRunArgs {
    CrawlRunArgs {
        input: args.input,
        workers: args.workers,
        timeout_s: args
            .timeout
            .or(config.crawl.timeout_s)
            .unwrap_or(DEFAULT_TIMEOUT_S),
        out: args.out,
    }
}

fn resolve_bench(args: BenchCommand, config: &ScaleConfig) -> SweepConfig {
    let workers_min = args
        .workers_min
        .or(config.bench.workers_min)
        .unwrap_or(DEFAULT_WORKERS_MIN)
        .max(1);
    let workers_max = args
        .workers_max
        .or(config.bench.workers_max)
        .unwrap_or(DEFAULT_WORKERS_MAX)
        .max(workers_min);

    SweepConfig {
        mode: match args.mode {
            BenchMode::Cpu => SweepMode::Cpu,
            BenchMode::Crawler => SweepMode::Crawler,
        },
        input: args.input,
        workers_min,
        workers_max,
        timeout_s: args
            .timeout
            .or(config.crawl.timeout_s)
            .unwrap_or(DEFAULT_TIMEOUT_S),
        top: args.top.or(config.cpu.top).unwrap_or(DEFAULT_TOP).max(1),
        out_dir: args
            .out_dir
            .or_else(|| config.bench.out_dir.clone().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR)),
        summary_out: args.summary_out,
        progress: !args.quiet,
        progress_interval: Duration::from_secs_f64(
            args.progress_interval
                .or(config.bench.progress_interval_s)
                .unwrap_or(DEFAULT_PROGRESS_INTERVAL_S)
                .max(0.5),
        ),
        run_timeout: args
            .run_timeout
            .filter(|secs| *secs > 0.0)
            .map(Duration::from_secs_f64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_bench_defaults_resolve() {
        let cli = parse(&["scalebench", "bench", "--input", "urls.txt"]);
        let Some(Commands::Bench(args)) = cli.command else {
            panic!("expected bench");
        };
        let sweep = resolve_bench(args, &ScaleConfig::default());

        assert_eq!(sweep.workers_min, 1);
        assert_eq!(sweep.workers_max, 8);
        assert_eq!(sweep.top, 30);
        assert_eq!(sweep.timeout_s, 10.0);
        assert_eq!(sweep.out_dir, PathBuf::from("output/bench"));
        assert!(sweep.progress);
        assert!(sweep.run_timeout.is_none());
    }

    #[test]
    fn test_bench_cli_overrides_config() {
        let cli = parse(&[
            "scalebench",
            "bench",
            "--mode",
            "crawler",
            "--input",
            "urls.txt",
            "--min",
            "2",
            "--max",
            "4",
            "--timeout",
            "3",
            "--quiet",
        ]);
        let Some(Commands::Bench(args)) = cli.command else {
            panic!("expected bench");
        };

        let config: ScaleConfig = toml::from_str(
            "[bench]\nworkers_min = 1\nworkers_max = 16\n[crawl]\ntimeout_s = 30.0\n",
        )
        .unwrap();
        let sweep = resolve_bench(args, &config);

        assert_eq!(sweep.mode, SweepMode::Crawler);
        assert_eq!(sweep.workers_min, 2);
        assert_eq!(sweep.workers_max, 4);
        assert_eq!(sweep.timeout_s, 3.0);
        assert!(!sweep.progress);
    }

    #[test]
    fn test_bench_config_fills_cli_gaps() {
        let cli = parse(&["scalebench", "bench", "--input", "texts/"]);
        let Some(Commands::Bench(args)) = cli.command else {
            panic!("expected bench");
        };

        let config: ScaleConfig =
            toml::from_str("[bench]\nworkers_max = 12\nout_dir = \"runs\"\n[cpu]\ntop = 5\n")
                .unwrap();
        let sweep = resolve_bench(args, &config);

        assert_eq!(sweep.workers_max, 12);
        assert_eq!(sweep.top, 5);
        assert_eq!(sweep.out_dir, PathBuf::from("runs"));
    }

    #[test]
    fn test_max_clamped_to_min() {
        let cli = parse(&[
            "scalebench", "bench", "--input", "x", "--min", "6", "--max", "2",
        ]);
        let Some(Commands::Bench(args)) = cli.command else {
            panic!("expected bench");
        };
        let sweep = resolve_bench(args, &ScaleConfig::default());
        assert_eq!(sweep.workers_min, 6);
        assert_eq!(sweep.workers_max, 6);
    }

    #[test]
    fn test_run_timeout_zero_means_disabled() {
        let cli = parse(&[
            "scalebench",
            "bench",
            "--input",
            "x",
            "--run-timeout",
            "0",
        ]);
        let Some(Commands::Bench(args)) = cli.command else {
            panic!("expected bench");
        };
        let sweep = resolve_bench(args, &ScaleConfig::default());
        assert!(sweep.run_timeout.is_none());
    }

    #[test]
    fn test_progress_interval_floor() {
        let cli = parse(&[
            "scalebench",
            "bench",
            "--input",
            "x",
            "--progress-interval",
            "0.01",
        ]);
        let Some(Commands::Bench(args)) = cli.command else {
            panic!("expected bench");
        };
        let sweep = resolve_bench(args, &ScaleConfig::default());
        assert_eq!(sweep.progress_interval, Duration::from_millis(500));
    }

    #[test]
    fn test_hidden_worker_flag_parses() {
        let cli = parse(&["scalebench", "--pool-worker"]);
        assert!(cli.pool_worker);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cpu_top_floor_is_one() {
        let cli = parse(&[
            "scalebench", "cpu", "--input", "x", "--top", "0",
        ]);
        let Some(Commands::Cpu(args)) = cli.command else {
            panic!("expected cpu");
        };
        let resolved = resolve_cpu(args, &ScaleConfig::default());
        assert_eq!(resolved.top, 1);
    }
}
