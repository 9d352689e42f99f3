//! The async multiplexer: one bounded select per loop turn over the TTY and
//! every process pipe.
//!
//! TTY priority is absolute: when terminal input is ready the turn returns
//! immediately and no process is drained. Otherwise each ready pipe
//! delivers at most one chunk to its callback, and any process that has
//! seen EOF, a read error, its owner's done flag, or its deadline receives
//! one final `done` callback before being destroyed — a process that never
//! produced data is still terminated deterministically at its deadline.
//! Callbacks whose bound view has been closed are dropped silently.

use std::time::{Duration, Instant};

use core_model::ViewId;
use core_proc::{AsyncProc, ProcChunk, ProcId};
use crossbeam_channel::Select;
use tracing::{debug, trace, warn};

use crate::{CoreError, Editor};

/// Bounded wait per multiplexer turn.
pub const MUX_WAIT: Duration = Duration::from_secs(1);

/// Delivered to a process callback; mirrors one drain step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcUpdate {
    pub id: ProcId,
    pub bytes: Vec<u8>,
    pub errored: bool,
    pub eof: bool,
    pub done: bool,
}

pub type ProcCallback = Box<dyn FnMut(&mut Editor, &ProcUpdate) -> Result<(), CoreError>>;

pub struct ProcEntry {
    pub proc: AsyncProc,
    /// View this process feeds; callbacks stop once it is closed.
    pub view: Option<ViewId>,
    pub callback: ProcCallback,
}

#[derive(Default)]
pub struct ProcTable {
    entries: Vec<ProcEntry>,
}

impl std::fmt::Debug for ProcTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcTable")
            .field("procs", &self.entries.len())
            .finish()
    }
}

impl ProcTable {
    pub fn add(&mut self, entry: ProcEntry) {
        self.entries.push(entry);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn mark_done(&mut self, id: ProcId) {
        if let Some(e) = self.entries.iter_mut().find(|e| e.proc.id == id) {
            e.proc.is_done = true;
        }
    }

    pub fn mark_view_done(&mut self, view: ViewId) {
        for e in self.entries.iter_mut() {
            if e.view == Some(view) {
                e.proc.is_done = true;
            }
        }
    }

    pub(crate) fn take_entries(&mut self) -> Vec<ProcEntry> {
        std::mem::take(&mut self.entries)
    }

    pub(crate) fn restore_entries(&mut self, mut kept: Vec<ProcEntry>) {
        // Callbacks may have spawned new processes meanwhile; keep both.
        kept.append(&mut self.entries);
        self.entries = kept;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuxOutcome {
    /// Terminal input is ready; acquire it without draining processes.
    InputReady,
    /// At least one process was serviced this turn.
    Drained,
    /// Timeout with nothing ready; call again.
    Idle,
}

impl Editor {
    /// One multiplexer turn. Called by the loop only while processes exist.
    pub(crate) fn drain_procs(&mut self) -> MuxOutcome {
        if self.input.is_ready() {
            return MuxOutcome::InputReady;
        }

        let ready = {
            let mut sel = Select::new();
            for entry in self.procs.entries.iter() {
                sel.recv(entry.proc.receiver());
            }
            let tty_index = self.input.receiver().map(|rx| sel.recv(rx));
            match sel.ready_timeout(MUX_WAIT) {
                Ok(i) if Some(i) == tty_index => return MuxOutcome::InputReady,
                Ok(_) => true,
                Err(_) => false,
            }
        };

        self.deliver_ready();
        if ready {
            MuxOutcome::Drained
        } else {
            // Timeout still enforces deadlines for silent processes.
            MuxOutcome::Idle
        }
    }

    /// Drain pass: at most one chunk per process, then finalize finished
    /// processes with a `done` callback and destroy them.
    fn deliver_ready(&mut self) {
        let now = Instant::now();
        let mut entries = self.procs.take_entries();
        let mut kept = Vec::with_capacity(entries.len());

        for mut entry in entries.drain(..) {
            let chunk = entry.proc.poll_chunk();
            let view_alive = entry.view.is_none_or(|v| self.views.contains(v));

            if let Some(chunk) = chunk {
                let update = match chunk {
                    ProcChunk::Data(bytes) => ProcUpdate {
                        id: entry.proc.id,
                        bytes,
                        errored: false,
                        eof: false,
                        done: false,
                    },
                    ProcChunk::Eof => ProcUpdate {
                        id: entry.proc.id,
                        bytes: Vec::new(),
                        errored: false,
                        eof: true,
                        done: false,
                    },
                    ProcChunk::ReadError(_) => ProcUpdate {
                        id: entry.proc.id,
                        bytes: Vec::new(),
                        errored: true,
                        eof: false,
                        done: false,
                    },
                };
                trace!(target: "proc", id = entry.proc.id.0, bytes = update.bytes.len(), "chunk");
                if view_alive {
                    if let Err(e) = (entry.callback)(self, &update) {
                        warn!(target: "proc", id = entry.proc.id.0, error = %e, "callback_error");
                        entry.proc.is_done = true;
                    }
                } else {
                    trace!(target: "proc", id = entry.proc.id.0, "callback_dropped_view_closed");
                }
            }

            if entry.proc.finished(now) {
                let update = ProcUpdate {
                    id: entry.proc.id,
                    bytes: Vec::new(),
                    errored: entry.proc.saw_error(),
                    eof: entry.proc.saw_eof(),
                    done: true,
                };
                if entry.view.is_none_or(|v| self.views.contains(v)) {
                    if let Err(e) = (entry.callback)(self, &update) {
                        warn!(target: "proc", id = entry.proc.id.0, error = %e, "done_callback_error");
                    }
                }
                if let Some(v) = entry.view.and_then(|v| self.views.get_mut(v)) {
                    v.proc = None;
                }
                debug!(target: "proc", id = entry.proc.id.0, "finalized");
                entry.proc.destroy();
            } else {
                kept.push(entry);
            }
        }

        self.procs.restore_entries(kept);
    }
}
