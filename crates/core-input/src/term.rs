//! Terminal-backed input source.
//!
//! A dedicated thread blocks on `crossterm::event::read` and forwards
//! translated events over a bounded channel; backpressure parks the reader
//! rather than dropping keystrokes. The main-loop side layers a pushback
//! queue on top of the channel for peek-and-return semantics.

use std::collections::VecDeque;
use std::thread;

use core_keys::{KeyCode, Keystroke, Mods, SpecialKey};
use crossbeam_channel::{Receiver, bounded};
use crossterm::event::{
    Event as CEvent, KeyCode as CKeyCode, KeyEvent as CKeyEvent, KeyEventKind as CKind,
    KeyModifiers as CMods,
};
use tracing::{debug, trace};

use crate::{InputError, InputEvent, InputSource};

const CHANNEL_CAP: usize = 1024;

pub struct TerminalSource {
    rx: Receiver<InputEvent>,
    pushback: VecDeque<InputEvent>,
    reader: Option<thread::JoinHandle<()>>,
}

impl TerminalSource {
    /// Spawn the reader thread over the controlling terminal.
    pub fn spawn() -> Self {
        let (tx, rx) = bounded(CHANNEL_CAP);
        let reader = thread::Builder::new()
            .name("tty-input".into())
            .spawn(move || {
                loop {
                    let event = match crossterm::event::read() {
                        Ok(ev) => ev,
                        Err(e) => {
                            debug!(target: "input.src", error = %e, "tty_read_error");
                            break;
                        }
                    };
                    let Some(mapped) = map_event(event) else {
                        continue;
                    };
                    if tx.send(mapped).is_err() {
                        break;
                    }
                }
                debug!(target: "input.src", "tty_reader_stopped");
            })
            .ok();
        Self {
            rx,
            pushback: VecDeque::new(),
            reader,
        }
    }
}

impl Drop for TerminalSource {
    fn drop(&mut self) {
        // The reader exits on its own once the channel closes; do not join,
        // it may still be parked inside a blocking read.
        drop(self.reader.take());
    }
}

impl InputSource for TerminalSource {
    fn next(&mut self) -> Result<InputEvent, InputError> {
        if let Some(ev) = self.pushback.pop_front() {
            return Ok(ev);
        }
        self.rx.recv().map_err(|_| InputError::Closed)
    }

    fn try_next(&mut self) -> Option<InputEvent> {
        if let Some(ev) = self.pushback.pop_front() {
            return Some(ev);
        }
        self.rx.try_recv().ok()
    }

    fn push_back(&mut self, event: InputEvent) {
        self.pushback.push_front(event);
    }

    fn is_ready(&self) -> bool {
        !self.pushback.is_empty() || !self.rx.is_empty()
    }

    fn receiver(&self) -> Option<&Receiver<InputEvent>> {
        self.pushback.is_empty().then_some(&self.rx)
    }
}

fn map_event(event: CEvent) -> Option<InputEvent> {
    match event {
        CEvent::Key(key) => map_key(key).map(InputEvent::Key),
        CEvent::Resize(w, h) => {
            trace!(target: "input.src", w, h, "resize");
            Some(InputEvent::Resize(w, h))
        }
        _ => None,
    }
}

fn map_key(key: CKeyEvent) -> Option<Keystroke> {
    if !matches!(key.kind, CKind::Press | CKind::Repeat) {
        return None;
    }
    let code = match key.code {
        CKeyCode::Char(' ') => KeyCode::Special(SpecialKey::Space),
        CKeyCode::Char(c) => KeyCode::Char(c),
        CKeyCode::Enter => KeyCode::Special(SpecialKey::Enter),
        CKeyCode::Tab | CKeyCode::BackTab => KeyCode::Special(SpecialKey::Tab),
        CKeyCode::Backspace => KeyCode::Special(SpecialKey::Backspace),
        CKeyCode::Esc => KeyCode::Special(SpecialKey::Esc),
        CKeyCode::Insert => KeyCode::Special(SpecialKey::Insert),
        CKeyCode::Delete => KeyCode::Special(SpecialKey::Delete),
        CKeyCode::Home => KeyCode::Special(SpecialKey::Home),
        CKeyCode::End => KeyCode::Special(SpecialKey::End),
        CKeyCode::PageUp => KeyCode::Special(SpecialKey::PageUp),
        CKeyCode::PageDown => KeyCode::Special(SpecialKey::PageDown),
        CKeyCode::Up => KeyCode::Special(SpecialKey::Up),
        CKeyCode::Down => KeyCode::Special(SpecialKey::Down),
        CKeyCode::Left => KeyCode::Special(SpecialKey::Left),
        CKeyCode::Right => KeyCode::Special(SpecialKey::Right),
        CKeyCode::F(n) if (1..=12).contains(&n) => KeyCode::Special(SpecialKey::F(n)),
        _ => return None,
    };
    Some(Keystroke {
        mods: map_mods(key.modifiers, &code),
        code,
    })
}

fn map_mods(mods: CMods, code: &KeyCode) -> Mods {
    let mut out = Mods::empty();
    if mods.contains(CMods::CONTROL) {
        out |= Mods::CTRL;
    }
    if mods.contains(CMods::ALT) {
        out |= Mods::ALT;
    }
    // Shift is already folded into the character for printable keys.
    if mods.contains(CMods::SHIFT) && !matches!(code, KeyCode::Char(_)) {
        out |= Mods::SHIFT;
    }
    out
}
