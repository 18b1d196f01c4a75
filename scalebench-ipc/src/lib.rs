#![warn(missing_docs)]
//! Scalebench IPC Protocol
//!
//! Binary protocol for the CPU pool's coordinator-worker communication.
//! Messages are rkyv-serialized and framed with a length prefix so that
//! both sides get reliable message boundaries over plain pipes.

mod framing;
mod messages;

pub use framing::{FrameError, FrameReader, FrameWriter, MAX_FRAME_SIZE, read_frame, write_frame};
pub use messages::{PoolCommand, WorkerReply};

/// Protocol version for compatibility checking during the handshake
pub const PROTOCOL_VERSION: u32 = 1;

/// Environment variable advertising the worker's inherited IPC fds ("<read>,<write>")
pub const IPC_FD_ENV: &str = "SCALEBENCH_IPC_FD";
