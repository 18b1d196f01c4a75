//! CPU Worker Pool
//!
//! Process-isolated parallelism for the histogram workload. The coordinator
//! spawns N worker processes (this same binary with a hidden flag), hands
//! each one file at a time over pipe IPC, and merges the replies in arrival
//! order. Assignment is dynamic: a driver thread claims the next unclaimed
//! file index only once its worker is free, so uneven file sizes cannot
//! strand one worker with all the large inputs.
//!
//! Failure policy: the first unreadable file, worker crash, or protocol
//! error fails the whole run. The workload assumes a well-formed local
//! corpus; partial histograms would not be comparable across worker counts.

use scalebench_core::{FileStats, FrequencyTable};
use scalebench_ipc::{FrameError, FrameReader, FrameWriter, PoolCommand, WorkerReply};
use std::os::unix::io::{FromRawFd, RawFd};
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors from the CPU pool. Any of these aborts the run.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("failed to spawn worker: {0}")]
    SpawnFailed(#[from] std::io::Error),

    #[error("IPC error: {0}")]
    Ipc(String),

    #[error("worker crashed: {0}")]
    WorkerCrashed(String),

    #[error("worker protocol error: expected {expected}, got {got}")]
    Protocol { expected: String, got: String },

    #[error("file analysis failed: {0}")]
    UnitFailed(String),
}

impl From<FrameError> for PoolError {
    fn from(e: FrameError) -> Self {
        PoolError::Ipc(e.to_string())
    }
}

/// Create a pipe pair, returning (read_fd, write_fd), both close-on-exec.
fn create_pipe() -> Result<(RawFd, RawFd), std::io::Error> {
    let mut fds = [0 as RawFd; 2];
    let ret = unsafe { libc::pipe(fds.as_mut_ptr()) };
    if ret != 0 {
        return Err(std::io::Error::last_os_error());
    }
    // Close-on-exec by default; the child ends are re-opened at fd 3/4 in
    // pre_exec with the flag cleared.
    for &fd in &fds {
        unsafe {
            let flags = libc::fcntl(fd, libc::F_GETFD);
            libc::fcntl(fd, libc::F_SETFD, flags | libc::FD_CLOEXEC);
        }
    }
    Ok((fds[0], fds[1]))
}

fn close_fd(fd: RawFd) {
    unsafe {
        libc::close(fd);
    }
}

fn send_sigterm(pid: u32) -> Result<(), std::io::Error> {
    let ret = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
    if ret == -1 {
        Err(std::io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Handle to one spawned worker process
#[derive(Debug)]
pub struct WorkerHandle {
    child: Child,
    reader: FrameReader<std::fs::File>,
    writer: FrameWriter<std::fs::File>,
}

impl WorkerHandle {
    /// Spawn a worker from the current executable, using fd 3/4 for IPC.
    pub fn spawn() -> Result<Self, PoolError> {
        let binary = std::env::current_exe().map_err(PoolError::SpawnFailed)?;
        Self::spawn_binary(&binary)
    }

    /// Spawn a worker from a specific binary (for testing)
    pub fn spawn_binary(binary: &Path) -> Result<Self, PoolError> {
        // cmd pipe: coordinator writes commands → worker reads from fd 3
        let (cmd_read, cmd_write) = create_pipe()?;
        // reply pipe: worker writes replies to fd 4 → coordinator reads
        let (reply_read, reply_write) = match create_pipe() {
            Ok(fds) => fds,
            Err(e) => {
                close_fd(cmd_read);
                close_fd(cmd_write);
                return Err(PoolError::SpawnFailed(e));
            }
        };

        let mut command = Command::new(binary);
        command
            .arg("--pool-worker")
            .env(scalebench_ipc::IPC_FD_ENV, "3,4")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit());

        // In the child: dup cmd_read→3 and reply_write→4 with close-on-exec
        // cleared, and drop the parent-side ends that leaked across fork.
        unsafe {
            command.pre_exec(move || {
                if cmd_read != 3 {
                    libc::dup2(cmd_read, 3);
                    libc::close(cmd_read);
                }
                let flags = libc::fcntl(3, libc::F_GETFD);
                libc::fcntl(3, libc::F_SETFD, flags & !libc::FD_CLOEXEC);

                if reply_write != 4 {
                    libc::dup2(reply_write, 4);
                    libc::close(reply_write);
                }
                let flags = libc::fcntl(4, libc::F_GETFD);
                libc::fcntl(4, libc::F_SETFD, flags & !libc::FD_CLOEXEC);

                libc::close(cmd_write);
                libc::close(reply_read);

                Ok(())
            });
        }

        let child = match command.spawn() {
            Ok(c) => c,
            Err(e) => {
                close_fd(cmd_read);
                close_fd(cmd_write);
                close_fd(reply_read);
                close_fd(reply_write);
                return Err(PoolError::SpawnFailed(e));
            }
        };

        // Parent keeps only its own ends
        close_fd(cmd_read);
        close_fd(reply_write);

        let writer_file = unsafe { std::fs::File::from_raw_fd(cmd_write) };
        let reader_file = unsafe { std::fs::File::from_raw_fd(reply_read) };

        let mut handle = Self {
            child,
            reader: FrameReader::new(reader_file),
            writer: FrameWriter::new(writer_file),
        };

        handle.wait_for_hello()?;
        Ok(handle)
    }

    /// Wait for the Hello reply and validate the protocol version
    fn wait_for_hello(&mut self) -> Result<(), PoolError> {
        match self.read_reply()? {
            WorkerReply::Hello { protocol_version } => {
                if protocol_version != scalebench_ipc::PROTOCOL_VERSION {
                    return Err(PoolError::Protocol {
                        expected: format!("protocol version {}", scalebench_ipc::PROTOCOL_VERSION),
                        got: format!("protocol version {}", protocol_version),
                    });
                }
                debug!(pid = self.child.id(), "worker ready");
                Ok(())
            }
            other => Err(PoolError::Protocol {
                expected: "Hello".to_string(),
                got: format!("{:?}", other),
            }),
        }
    }

    fn read_reply(&mut self) -> Result<WorkerReply, PoolError> {
        match self.reader.read::<WorkerReply>() {
            Ok(reply) => Ok(reply),
            Err(FrameError::EndOfStream) => Err(PoolError::WorkerCrashed(
                "worker closed connection unexpectedly".to_string(),
            )),
            Err(e) => {
                if !self.is_alive() {
                    return Err(PoolError::WorkerCrashed(
                        "worker exited mid-reply".to_string(),
                    ));
                }
                Err(PoolError::Ipc(e.to_string()))
            }
        }
    }

    /// Have the worker analyze one file and block for its reply
    pub fn analyze(&mut self, path: &Path) -> Result<FileStats, PoolError> {
        self.writer.write(&PoolCommand::Analyze {
            path: path.to_string_lossy().into_owned(),
        })?;

        match self.read_reply()? {
            WorkerReply::FileDone {
                path,
                tokens,
                counts,
            } => Ok(FileStats {
                path,
                tokens,
                counts,
            }),
            WorkerReply::Failure { message } => Err(PoolError::UnitFailed(message)),
            other => Err(PoolError::Protocol {
                expected: "FileDone or Failure".to_string(),
                got: format!("{:?}", other),
            }),
        }
    }

    /// Shut the worker down gracefully
    pub fn shutdown(mut self) -> Result<(), PoolError> {
        self.writer.write(&PoolCommand::Shutdown)?;
        let _ = self.child.wait();
        Ok(())
    }

    /// Check whether the worker process is still running
    pub fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        if self.is_alive() {
            // SIGTERM first, brief grace, then SIGKILL
            let _ = send_sigterm(self.child.id());
            thread::sleep(Duration::from_millis(50));
            if self.is_alive() {
                let _ = self.child.kill();
            }
            let _ = self.child.wait();
        }
    }
}

/// Merged output of one CPU pool invocation
pub struct CpuPoolOutput {
    /// Per-file stats, sorted by path
    pub per_file: Vec<FileStats>,
    /// Global frequency table, merged in arrival order
    pub table: FrequencyTable,
}

/// Run the CPU workload over `paths` with `workers` isolated processes.
pub fn run_cpu_pool(paths: &[PathBuf], workers: usize) -> Result<CpuPoolOutput, PoolError> {
    let workers = workers.clamp(1, paths.len().max(1));
    let cursor = AtomicUsize::new(0);
    let abort = AtomicBool::new(false);
    let (tx, rx) = mpsc::channel::<Result<FileStats, PoolError>>();

    let mut output = thread::scope(|scope| {
        for _ in 0..workers {
            let tx = tx.clone();
            let cursor = &cursor;
            let abort = &abort;
            scope.spawn(move || drive_worker(paths, cursor, abort, tx));
        }
        // The coordinator holds no sender; the loop below ends when every
        // driver thread is done.
        drop(tx);

        let mut per_file = Vec::with_capacity(paths.len());
        let mut table = FrequencyTable::new();
        for outcome in rx {
            match outcome {
                Ok(stats) => {
                    table.absorb(&stats.counts);
                    per_file.push(stats);
                }
                Err(e) => {
                    // Fail fast: stop handing out work, discard partials
                    abort.store(true, Ordering::SeqCst);
                    return Err(e);
                }
            }
        }
        Ok(CpuPoolOutput { per_file, table })
    })?;

    // Arrival order is nondeterministic; the emitted order is not
    output.per_file.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(output)
}

/// One driver thread: owns one worker process, pulls unclaimed file
/// indices, and forwards replies to the coordinator.
fn drive_worker(
    paths: &[PathBuf],
    cursor: &AtomicUsize,
    abort: &AtomicBool,
    tx: mpsc::Sender<Result<FileStats, PoolError>>,
) {
    let mut worker = match WorkerHandle::spawn() {
        Ok(w) => w,
        Err(e) => {
            let _ = tx.send(Err(e));
            return;
        }
    };

    loop {
        if abort.load(Ordering::SeqCst) {
            break;
        }
        let index = cursor.fetch_add(1, Ordering::SeqCst);
        if index >= paths.len() {
            break;
        }

        match worker.analyze(&paths[index]) {
            Ok(stats) => {
                if tx.send(Ok(stats)).is_err() {
                    break;
                }
            }
            Err(e) => {
                let _ = tx.send(Err(e));
                break;
            }
        }
    }

    let _ = worker.shutdown();
}
