//! Paste ingestion: bursts of ready keystrokes collapse into one insert.

mod common;

use common::{active_text, editor_with, observed};
use core_input::ScriptedSource;
use core_keys::Keystroke;
use pretty_assertions::assert_eq;

#[test]
fn burst_collapses_to_single_insert() {
    let src = ScriptedSource::burst([Keystroke::ch('a'), Keystroke::ch('b'), Keystroke::ch('c')]);
    let mut ed = editor_with(src);
    let log = observed(&mut ed);
    ed.run().unwrap();
    assert_eq!(active_text(&ed), "abc");
    assert_eq!(*log.borrow(), vec!["insert-data"]);
}

#[test]
fn burst_stops_at_non_insert_and_leftover_is_next_input() {
    // `C-x` is classified mid-burst, pushed back, and consumed as the very
    // next acquisition, where it opens the quit prompt.
    let src = ScriptedSource::burst([
        Keystroke::ch('a'),
        Keystroke::ch('b'),
        Keystroke::ctrl('x'),
        Keystroke::ch('y'),
    ]);
    let mut ed = editor_with(src);
    let log = observed(&mut ed);
    let exit = ed.run().unwrap();
    assert_eq!(exit, core_editor::LoopExit::Normal);
    assert_eq!(active_text(&ed), "ab");
    assert_eq!(*log.borrow(), vec!["insert-data", "quit", "prompt-yes"]);
}

#[test]
fn trim_paste_strips_trailing_whitespace() {
    use core_editor::EditorConfig;
    use core_editor::Editor;

    let src = ScriptedSource::burst([
        Keystroke::ch('a'),
        Keystroke::ch('b'),
        Keystroke::special(core_keys::SpecialKey::Space),
        Keystroke::special(core_keys::SpecialKey::Space),
    ]);
    let mut config = EditorConfig::default();
    config.trim_paste = true;
    let mut ed = Editor::headless(config, Box::new(src));
    ed.run().unwrap();
    assert_eq!(active_text(&ed), "ab");
}
