#![allow(dead_code)] // Shared across test binaries; each uses a subset.

use std::cell::RefCell;
use std::rc::Rc;

use core_editor::{CmdContext, CommandObserver, Editor, EditorConfig};
use core_input::{InputSource, ScriptedSource};
use core_keys::Keystroke;

/// Records executed command names for sequence assertions.
pub struct Recorder(pub Rc<RefCell<Vec<String>>>);

impl CommandObserver for Recorder {
    fn on_command(&mut self, name: &str, _ctx: &CmdContext<'_>) {
        self.0.borrow_mut().push(name.to_string());
    }
}

pub fn editor_with(source: ScriptedSource) -> Editor {
    Editor::headless(EditorConfig::default(), Box::new(source))
}

pub fn editor_with_keys(keys: impl IntoIterator<Item = Keystroke>) -> Editor {
    editor_with(ScriptedSource::keys(keys))
}

pub fn observed(ed: &mut Editor) -> Rc<RefCell<Vec<String>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    ed.add_observer(Box::new(Recorder(log.clone())));
    log
}

pub fn active_text(ed: &Editor) -> String {
    ed.active_view().map(|v| v.buffer.text()).unwrap_or_default()
}

pub fn feed_source(events: Vec<core_input::InputEvent>) -> Box<dyn InputSource> {
    Box::new(ScriptedSource::new(events))
}
