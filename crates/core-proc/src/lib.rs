//! core-proc: asynchronous subprocess plumbing for the event loop.
//!
//! Each process gets a dedicated pipe-reader thread that moves stdout bytes
//! into a bounded channel in fixed-size chunks; the small capacity applies
//! backpressure toward the producing child. The main loop selects over these
//! channels (together with the TTY) and drains at most one chunk per process
//! per turn. A process is finalized on EOF, read error, its owner's done
//! flag, or its deadline; finalization kills and reaps the child.

use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, bounded};
use tracing::{debug, warn};

/// Read size per chunk; one chunk is also the most a process may deliver in
/// a single multiplexer turn.
pub const READ_CHUNK: usize = 1024;

const CHUNK_CHANNEL_CAP: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcId(pub u64);

#[derive(Debug, thiserror::Error)]
pub enum ProcError {
    #[error("failed to spawn `{cmdline}`: {source}")]
    Spawn {
        cmdline: String,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcChunk {
    Data(Vec<u8>),
    Eof,
    ReadError(String),
}

#[derive(Debug)]
pub struct AsyncProc {
    pub id: ProcId,
    pub cmdline: String,
    child: Child,
    rx: Receiver<ProcChunk>,
    deadline: Option<Instant>,
    /// Set by the owner to request finalization on the next drain turn.
    pub is_done: bool,
    eof: bool,
    errored: bool,
}

impl AsyncProc {
    /// Spawn `cmdline` under `shell -c` with stdout piped back to the loop.
    pub fn spawn(
        id: ProcId,
        shell: &str,
        cmdline: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, ProcError> {
        let child = Command::new(shell)
            .arg("-c")
            .arg(cmdline)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| ProcError::Spawn {
                cmdline: cmdline.to_string(),
                source,
            })?;
        debug!(target: "proc", id = id.0, cmdline, "spawned");

        let (tx, rx) = bounded(CHUNK_CHANNEL_CAP);
        let mut proc = Self {
            id,
            cmdline: cmdline.to_string(),
            child,
            rx,
            deadline: timeout.map(|t| Instant::now() + t),
            is_done: false,
            eof: false,
            errored: false,
        };

        if let Some(mut pipe) = proc.child.stdout.take() {
            thread::Builder::new()
                .name(format!("proc-pipe-{}", id.0))
                .spawn(move || {
                    let mut buf = [0u8; READ_CHUNK];
                    loop {
                        match pipe.read(&mut buf) {
                            Ok(0) => {
                                let _ = tx.send(ProcChunk::Eof);
                                break;
                            }
                            Ok(n) => {
                                if tx.send(ProcChunk::Data(buf[..n].to_vec())).is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                let _ = tx.send(ProcChunk::ReadError(e.to_string()));
                                break;
                            }
                        }
                    }
                })
                .map_err(|source| ProcError::Spawn {
                    cmdline: cmdline.to_string(),
                    source,
                })?;
        }
        Ok(proc)
    }

    pub fn receiver(&self) -> &Receiver<ProcChunk> {
        &self.rx
    }

    /// Take at most one ready chunk, recording EOF/error state.
    pub fn poll_chunk(&mut self) -> Option<ProcChunk> {
        let chunk = self.rx.try_recv().ok()?;
        match &chunk {
            ProcChunk::Eof => self.eof = true,
            ProcChunk::ReadError(e) => {
                warn!(target: "proc", id = self.id.0, error = %e, "pipe_read_error");
                self.errored = true;
            }
            ProcChunk::Data(_) => {}
        }
        Some(chunk)
    }

    pub fn saw_eof(&self) -> bool {
        self.eof
    }

    pub fn saw_error(&self) -> bool {
        self.errored
    }

    pub fn expired(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|d| now >= d)
    }

    /// True when the process must be finalized this turn.
    pub fn finished(&self, now: Instant) -> bool {
        self.eof || self.errored || self.is_done || self.expired(now)
    }

    /// Kill and reap the child. Idempotent; expiry kills a process that
    /// never produced data.
    pub fn destroy(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        debug!(target: "proc", id = self.id.0, "destroyed");
    }
}

impl Drop for AsyncProc {
    fn drop(&mut self) {
        self.destroy();
    }
}
