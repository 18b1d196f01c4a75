//! IPC Message Types
//!
//! One command per work unit: the coordinator sends `Analyze` with a file
//! path, the worker answers with exactly one `FileDone` or `Failure`.

use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};

/// Commands sent from the pool coordinator to a worker process
#[derive(Debug, Clone, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub enum PoolCommand {
    /// Tokenize one file and report its frequency map
    Analyze {
        /// Path of the file to analyze
        path: String,
    },

    /// Health check
    Ping,

    /// Request graceful shutdown
    Shutdown,
}

/// Replies sent from a worker process to the pool coordinator
#[derive(Debug, Clone, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub enum WorkerReply {
    /// Initial handshake, sent once before any command is processed
    Hello {
        /// Protocol version for compatibility checking
        protocol_version: u32,
    },

    /// One file analyzed successfully
    FileDone {
        /// Path of the analyzed file (echoed back for bookkeeping)
        path: String,
        /// Total token count of the file
        tokens: u64,
        /// Per-token frequency pairs
        counts: Vec<(String, u64)>,
    },

    /// Analysis of the current unit failed; the run is expected to abort
    Failure {
        /// Human-readable error message
        message: String,
    },

    /// Answer to `Ping`
    Pong,
}
