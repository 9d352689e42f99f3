//! The event loop. One turn: draw, drain async work, acquire input (macro
//! replay first), handle the macro toggle, dispatch. Prompts and menus
//! re-enter the same loop body with a fresh [`LoopCtx`], so dispatch,
//! drawing, and async drain all work at any nesting depth.
//!
//! Turn ordering is fixed: draw → async-drain → input → macro-toggle →
//! dispatch. Async callbacks complete before input is read; command
//! execution is atomic with respect to async progress.

use core_input::{InputError, InputEvent};
use core_keymap::{Resolution, resolve};
use core_keys::Keystroke;
use core_render::Frame;
use tracing::{debug, trace, warn};

use crate::command::CmdContext;
use crate::commands::CMD_INSERT_DATA;
use crate::macros::Macro;
use crate::mux::MuxOutcome;
use crate::prompt::PromptParams;
use crate::{CoreError, Editor, LoopCtx};

/// Why a loop run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The loop context's exit flag was set by a command.
    Normal,
    /// The input source closed underneath the loop.
    InputClosed,
    /// A fatal signal was observed; the caller runs the crash path.
    Shutdown,
}

impl Editor {
    /// Run the main loop to completion.
    pub fn run(&mut self) -> Result<LoopExit, CoreError> {
        let mut ctx = LoopCtx::new(self.views.active());
        self.run_loop(&mut ctx)
    }

    /// Run one (possibly nested) event loop over `ctx`.
    pub(crate) fn run_loop(&mut self, ctx: &mut LoopCtx) -> Result<LoopExit, CoreError> {
        self.loop_depth += 1;
        let out = self.loop_turns(ctx);
        self.loop_depth -= 1;
        out
    }

    fn loop_turns(&mut self, ctx: &mut LoopCtx) -> Result<LoopExit, CoreError> {
        loop {
            if self.shutdown_requested() {
                return Ok(LoopExit::Shutdown);
            }

            if !self.draw_suppressed() {
                self.draw();
            }

            if !self.procs.is_empty() {
                match self.drain_procs() {
                    MuxOutcome::InputReady => {}
                    MuxOutcome::Drained | MuxOutcome::Idle => continue,
                }
            }

            let (event, from_replay) = match self.acquire_input() {
                Some(pair) => pair,
                None => return Ok(LoopExit::InputClosed),
            };
            let key = match event {
                InputEvent::Resize(w, h) => {
                    self.resize(w, h);
                    continue;
                }
                InputEvent::Key(key) => key,
            };

            if !from_replay && let Some(rec) = &mut self.recording {
                rec.keys.push(key);
            }

            if key == self.config.macro_toggle_key {
                self.toggle_macro_recording()?;
                continue;
            }

            self.dispatch(ctx, key, !from_replay)?;

            if ctx.should_exit {
                return Ok(LoopExit::Normal);
            }
        }
    }

    /// Replay stream first; the terminal otherwise. `None` means the source
    /// closed and the loop should unwind.
    fn acquire_input(&mut self) -> Option<(InputEvent, bool)> {
        if let Some(replay) = &mut self.replay {
            if let Some(key) = replay.next_key() {
                return Some((InputEvent::Key(key), true));
            }
            trace!(target: "loop.macro", "replay_exhausted");
            self.replay = None;
        }
        match self.input.next() {
            Ok(event) => Some((event, false)),
            Err(InputError::Closed) => None,
        }
    }

    fn draw_suppressed(&self) -> bool {
        // Intermediate replay turns skip drawing; the turn after exhaustion
        // repaints.
        self.replay.is_some()
    }

    fn draw(&mut self) {
        let (status_left, status_right) = self.status_line();
        let frame = Frame {
            views: &self.views,
            status_left,
            status_right,
        };
        if let Err(e) = self.renderer.draw(&frame) {
            warn!(target: "loop", error = %e, "draw_failed");
        }
    }

    /// Toggle recording. Start prompts for a macro name; stop trims the
    /// toggle keystroke from the tail and registers the result (recordings
    /// with no keys are discarded).
    pub(crate) fn toggle_macro_recording(&mut self) -> Result<(), CoreError> {
        if let Some(mut rec) = self.recording.take() {
            rec.keys.pop();
            if rec.keys.is_empty() {
                debug!(target: "loop.macro", name = %rec.name, "empty_recording_discarded");
                self.set_status("macro discarded (empty)");
            } else {
                self.set_status(format!("recorded macro {}", rec.name));
                if let Err(e) = self.register_macro(rec) {
                    warn!(target: "loop.macro", error = %e, "macro_register_failed");
                    self.set_status(e.to_string());
                }
            }
        } else {
            // Toggling inside a prompt cannot open the name prompt; report
            // instead of unwinding the loop.
            match self.prompt("record_macro:", PromptParams::input()) {
                Ok(Some(name)) if !name.trim().is_empty() => {
                    debug!(target: "loop.macro", name = %name, "recording_started");
                    self.recording = Some(Macro::new(name.trim()));
                }
                Ok(_) => self.set_status("macro recording cancelled"),
                Err(e) => {
                    warn!(target: "loop.macro", error = %e, "record_prompt_failed");
                    self.set_status(e.to_string());
                }
            }
        }
        Ok(())
    }

    /// Feed one keystroke through the resolver and execute the outcome.
    pub(crate) fn dispatch(
        &mut self,
        ctx: &mut LoopCtx,
        key: Keystroke,
        is_user_input: bool,
    ) -> Result<(), CoreError> {
        let Some(active) = self.views.active() else {
            return Err(CoreError::Precondition("no active view"));
        };
        let stack = self
            .views
            .get(active)
            .map(|v| v.kmap_stack.clone())
            .unwrap_or_default();

        match resolve(&self.keymaps, &stack, &mut ctx.resolve, key, false) {
            Resolution::NeedMore => {
                trace!(target: "loop", key = %key, "need_more_input");
            }
            Resolution::Unbound => {
                trace!(target: "loop", key = %key, "unbound");
            }
            Resolution::Command(rc) => {
                let (func, init) = match self.commands.resolve(&rc.command) {
                    Ok(pair) => pair,
                    Err(e) => {
                        warn!(target: "loop", command = %rc.command, error = %e, "unresolvable_command");
                        self.set_status(e.to_string());
                        ctx.resolve.clear_after_command();
                        return Ok(());
                    }
                };

                let paste = if rc.command == CMD_INSERT_DATA && is_user_input && self.replay.is_none()
                {
                    self.collect_paste_burst(ctx)
                } else {
                    None
                };

                let mut cctx = CmdContext {
                    view: active,
                    input: key,
                    static_param: rc.param.clone(),
                    loop_ctx: &mut *ctx,
                    paste,
                    is_user_input,
                };

                let mut observers = std::mem::take(&mut self.observers);
                for obs in observers.iter_mut() {
                    obs.on_command(&rc.command, &cctx);
                }
                self.observers = observers;

                if let Some(init) = init {
                    trace!(target: "loop", command = %rc.command, "command_init");
                    if let Err(e) = init(self, &mut cctx) {
                        warn!(target: "loop", command = %rc.command, error = %e, "command_init_failed");
                    }
                }

                debug!(target: "loop", command = %rc.command, key = %key, "execute");
                if let Err(e) = func(self, &mut cctx) {
                    warn!(target: "loop", command = %rc.command, error = %e, "command_failed");
                    self.set_status(e.to_string());
                }

                ctx.resolve.clear_after_command();
                ctx.last_cmd = Some(rc.command.clone());
                self.fire_change_listener(ctx, &rc.command, key)?;
            }
        }
        Ok(())
    }

    /// Paste ingestion: after a user keystroke resolved to the insert
    /// command, classify the immediately-ready keystrokes with peek
    /// resolution and collect the ones that also insert. At most one
    /// leftover event is pushed back and is acquired on the very next turn.
    fn collect_paste_burst(&mut self, ctx: &mut LoopCtx) -> Option<String> {
        let active = self.views.active()?;
        let stack = self.views.get(active)?.kmap_stack.clone();
        let mut batch = String::new();
        loop {
            match self.input.try_next() {
                Some(InputEvent::Key(key)) => {
                    let peeked = resolve(&self.keymaps, &stack, &mut ctx.resolve, key, true);
                    let inserts = matches!(
                        &peeked,
                        Resolution::Command(rc)
                            if rc.command == CMD_INSERT_DATA && key.codepoint() != '\0'
                    );
                    if inserts {
                        batch.push(key.codepoint());
                        // Burst keys are user input; a recording still
                        // captures them.
                        if let Some(rec) = &mut self.recording {
                            rec.keys.push(key);
                        }
                    } else {
                        self.input.push_back(InputEvent::Key(key));
                        break;
                    }
                }
                Some(resize @ InputEvent::Resize(..)) => {
                    self.input.push_back(resize);
                    break;
                }
                None => break,
            }
        }
        if batch.is_empty() {
            None
        } else {
            debug!(target: "loop", chars = batch.chars().count(), "paste_burst");
            Some(batch)
        }
    }

    /// Prompt views may register a change listener (isearch); it runs after
    /// every other command executed while the view is active.
    fn fire_change_listener(
        &mut self,
        ctx: &mut LoopCtx,
        executed: &str,
        key: Keystroke,
    ) -> Result<(), CoreError> {
        let Some(active) = self.views.active() else {
            return Ok(());
        };
        let Some(listener) = self
            .views
            .get(active)
            .and_then(|v| v.change_listener.clone())
        else {
            return Ok(());
        };
        if executed == listener {
            return Ok(());
        }
        let (func, _) = match self.commands.resolve(&listener) {
            Ok(pair) => pair,
            Err(e) => {
                warn!(target: "loop", listener = %listener, error = %e, "listener_unresolvable");
                return Ok(());
            }
        };
        let mut cctx = CmdContext {
            view: active,
            input: key,
            static_param: None,
            loop_ctx: &mut *ctx,
            paste: None,
            is_user_input: false,
        };
        if let Err(e) = func(self, &mut cctx) {
            warn!(target: "loop", listener = %listener, error = %e, "listener_failed");
        }
        Ok(())
    }
}
