//! Configuration loading from scalebench.toml
//!
//! Defaults can be kept in a `scalebench.toml` next to the project (or any
//! ancestor directory). CLI flags always win over file values; file values
//! win over built-in defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Built-in default for the first worker count of a sweep
pub const DEFAULT_WORKERS_MIN: usize = 1;
/// Built-in default for the last worker count of a sweep
pub const DEFAULT_WORKERS_MAX: usize = 8;
/// Built-in default top-K size for the CPU workload
pub const DEFAULT_TOP: usize = 30;
/// Built-in default per-fetch timeout in seconds
pub const DEFAULT_TIMEOUT_S: f64 = 10.0;
/// Built-in default heartbeat interval in seconds
pub const DEFAULT_PROGRESS_INTERVAL_S: f64 = 5.0;
/// Built-in default directory for sweep artifacts
pub const DEFAULT_OUT_DIR: &str = "output/bench";

/// Scalebench configuration file contents
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScaleConfig {
    /// Sweep defaults
    #[serde(default)]
    pub bench: BenchSection,
    /// CPU-workload defaults
    #[serde(default)]
    pub cpu: CpuSection,
    /// Crawl-workload defaults
    #[serde(default)]
    pub crawl: CrawlSection,
}

/// `[bench]` section
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BenchSection {
    /// First worker count of the sweep
    pub workers_min: Option<usize>,
    /// Last worker count of the sweep
    pub workers_max: Option<usize>,
    /// Directory for per-run documents and the summary
    pub out_dir: Option<String>,
    /// Heartbeat interval in seconds
    pub progress_interval_s: Option<f64>,
}

/// `[cpu]` section
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CpuSection {
    /// Top-K size recorded in CPU run documents
    pub top: Option<usize>,
}

/// `[crawl]` section
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CrawlSection {
    /// Per-fetch timeout in seconds
    pub timeout_s: Option<f64>,
}

impl ScaleConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Try to discover and load configuration by walking up from the
    /// current directory
    pub fn discover() -> Option<Self> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            let config_path = dir.join("scalebench.toml");
            if config_path.exists() {
                return Self::load(&config_path).ok();
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }
}
