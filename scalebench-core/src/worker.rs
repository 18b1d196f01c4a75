//! Worker Process Entry Point
//!
//! The worker side of the CPU pool's coordinator-worker architecture.
//!
//! On Unix, uses fd 3/4 for IPC (set via `SCALEBENCH_IPC_FD`). On non-Unix,
//! falls back to stdin/stdout.

use crate::tokenize::analyze_file;
use scalebench_ipc::{FrameError, FrameReader, FrameWriter, PoolCommand, WorkerReply};
use std::path::Path;

#[cfg(unix)]
use std::os::unix::io::FromRawFd;

/// IPC transport: either inherited fd pair or stdin/stdout fallback.
enum IpcTransport {
    #[cfg(unix)]
    Fds {
        read_fd: i32,
        write_fd: i32,
    },
    Stdio,
}

fn detect_transport() -> IpcTransport {
    #[cfg(unix)]
    if let Ok(val) = std::env::var(scalebench_ipc::IPC_FD_ENV) {
        let parts: Vec<&str> = val.split(',').collect();
        if parts.len() == 2 {
            if let (Ok(r), Ok(w)) = (parts[0].parse::<i32>(), parts[1].parse::<i32>()) {
                return IpcTransport::Fds {
                    read_fd: r,
                    write_fd: w,
                };
            }
        }
        eprintln!(
            "scalebench: warning: invalid {}={val:?} (expected <read_fd>,<write_fd>), falling back to stdio",
            scalebench_ipc::IPC_FD_ENV
        );
    }
    IpcTransport::Stdio
}

/// Worker main loop: handshake, then one reply per command.
pub struct WorkerMain {
    reader: FrameReader<Box<dyn std::io::Read>>,
    writer: FrameWriter<Box<dyn std::io::Write>>,
}

impl WorkerMain {
    /// Create a worker on fd 3/4 if `SCALEBENCH_IPC_FD` is set, else stdio.
    pub fn new() -> Self {
        match detect_transport() {
            #[cfg(unix)]
            IpcTransport::Fds { read_fd, write_fd } => {
                let read_file = unsafe { std::fs::File::from_raw_fd(read_fd) };
                let write_file = unsafe { std::fs::File::from_raw_fd(write_fd) };
                Self {
                    reader: FrameReader::new(Box::new(read_file) as Box<dyn std::io::Read>),
                    writer: FrameWriter::new(Box::new(write_file) as Box<dyn std::io::Write>),
                }
            }
            IpcTransport::Stdio => Self {
                reader: FrameReader::new(Box::new(std::io::stdin()) as Box<dyn std::io::Read>),
                writer: FrameWriter::new(Box::new(std::io::stdout()) as Box<dyn std::io::Write>),
            },
        }
    }

    /// Run the worker command loop until `Shutdown` or the pipe closes.
    pub fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.writer.write(&WorkerReply::Hello {
            protocol_version: scalebench_ipc::PROTOCOL_VERSION,
        })?;

        loop {
            let command: PoolCommand = match self.reader.read() {
                Ok(cmd) => cmd,
                // Coordinator went away; nothing left to do
                Err(FrameError::EndOfStream) => break,
                Err(e) => return Err(e.into()),
            };

            match command {
                PoolCommand::Analyze { path } => {
                    let reply = match analyze_file(Path::new(&path)) {
                        Ok(stats) => WorkerReply::FileDone {
                            path: stats.path,
                            tokens: stats.tokens,
                            counts: stats.counts,
                        },
                        Err(e) => WorkerReply::Failure {
                            message: format!("{}: {}", path, e),
                        },
                    };
                    self.writer.write(&reply)?;
                }
                PoolCommand::Ping => {
                    self.writer.write(&WorkerReply::Pong)?;
                }
                PoolCommand::Shutdown => break,
            }
        }

        Ok(())
    }
}

impl Default for WorkerMain {
    fn default() -> Self {
        Self::new()
    }
}
