//! core-input: keystroke acquisition for the event loop.
//!
//! The loop consumes [`InputEvent`]s through the [`InputSource`] trait. The
//! real source is [`TerminalSource`]: a blocking reader thread translating
//! crossterm events into [`Keystroke`]s and pushing them over a bounded
//! channel, so the main loop stays single-threaded and the thread only moves
//! events. A one-slot-deep pushback queue supports paste-ingestion peeking,
//! where at most one classified-but-unwanted keystroke must be returned for
//! the very next acquisition.
//!
//! [`ScriptedSource`] drives the same loop from a fixed event list in tests
//! and macro tooling.

use std::collections::VecDeque;

use core_keys::Keystroke;
use crossbeam_channel::Receiver;

mod term;

pub use term::TerminalSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Key(Keystroke),
    Resize(u16, u16),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    /// The producing side is gone (terminal closed, script exhausted).
    #[error("input source closed")]
    Closed,
}

/// One keystroke stream feeding the event loop.
///
/// `try_next` only yields events that are ready right now; it never blocks.
/// `push_back` prepends, so a pushed-back event is acquired next.
pub trait InputSource {
    fn next(&mut self) -> Result<InputEvent, InputError>;
    fn try_next(&mut self) -> Option<InputEvent>;
    fn push_back(&mut self, event: InputEvent);
    fn is_ready(&self) -> bool;
    /// The raw channel, when the source is channel-backed; lets the async
    /// multiplexer include the TTY in its select set.
    fn receiver(&self) -> Option<&Receiver<InputEvent>> {
        None
    }
}

/// Fixed event list; used by tests to drive the loop deterministically.
///
/// Step mode (the default) models one-keystroke-at-a-time typing: `next`
/// pops but nothing is ever "immediately ready", so paste ingestion stays
/// quiet. [`ScriptedSource::burst`] models a paste burst where every queued
/// event is ready at once.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    queue: VecDeque<InputEvent>,
    immediate: bool,
}

impl ScriptedSource {
    pub fn new(events: impl IntoIterator<Item = InputEvent>) -> Self {
        Self {
            queue: events.into_iter().collect(),
            immediate: false,
        }
    }

    pub fn keys(keys: impl IntoIterator<Item = Keystroke>) -> Self {
        Self::new(keys.into_iter().map(InputEvent::Key))
    }

    pub fn burst(keys: impl IntoIterator<Item = Keystroke>) -> Self {
        let mut src = Self::keys(keys);
        src.immediate = true;
        src
    }

    pub fn push(&mut self, event: InputEvent) {
        self.queue.push_back(event);
    }
}

impl InputSource for ScriptedSource {
    fn next(&mut self) -> Result<InputEvent, InputError> {
        self.queue.pop_front().ok_or(InputError::Closed)
    }

    fn try_next(&mut self) -> Option<InputEvent> {
        if self.immediate {
            self.queue.pop_front()
        } else {
            None
        }
    }

    fn push_back(&mut self, event: InputEvent) {
        self.queue.push_front(event);
    }

    fn is_ready(&self) -> bool {
        !self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn scripted_source_preserves_order() {
        let mut src = ScriptedSource::keys([Keystroke::ch('a'), Keystroke::ch('b')]);
        assert!(src.is_ready());
        assert_eq!(src.next().unwrap(), InputEvent::Key(Keystroke::ch('a')));
        // Step mode: queued keys are not "immediately ready".
        assert_eq!(src.try_next(), None);
        assert_eq!(src.next().unwrap(), InputEvent::Key(Keystroke::ch('b')));
        assert_eq!(src.next(), Err(InputError::Closed));
    }

    #[test]
    fn burst_source_is_immediately_ready() {
        let mut src = ScriptedSource::burst([Keystroke::ch('a'), Keystroke::ch('b')]);
        assert_eq!(src.try_next(), Some(InputEvent::Key(Keystroke::ch('a'))));
        assert_eq!(src.try_next(), Some(InputEvent::Key(Keystroke::ch('b'))));
        assert_eq!(src.try_next(), None);
    }

    #[test]
    fn pushback_is_acquired_next() {
        let mut src = ScriptedSource::keys([Keystroke::ch('b')]);
        src.push_back(InputEvent::Key(Keystroke::ch('a')));
        assert_eq!(src.next().unwrap(), InputEvent::Key(Keystroke::ch('a')));
        assert_eq!(src.next().unwrap(), InputEvent::Key(Keystroke::ch('b')));
    }
}
