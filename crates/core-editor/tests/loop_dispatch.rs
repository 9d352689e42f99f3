//! Event-loop dispatch scenarios driven through a scripted input source.

mod common;

use common::{active_text, editor_with_keys, observed};
use core_editor::LoopExit;
use core_keys::{Keystroke, SpecialKey};
use core_text::Position;
use pretty_assertions::assert_eq;

#[test]
fn unbound_printables_insert_via_default_command() {
    let mut ed = editor_with_keys([Keystroke::ch('h'), Keystroke::ch('i')]);
    let log = observed(&mut ed);
    let exit = ed.run().unwrap();
    assert_eq!(exit, LoopExit::InputClosed);
    assert_eq!(active_text(&ed), "hi");
    assert_eq!(*log.borrow(), vec!["insert-data", "insert-data"]);
}

#[test]
fn quit_on_dirty_buffer_runs_nested_yes_no_prompt() {
    let mut ed = editor_with_keys([
        Keystroke::ch('h'),
        Keystroke::ch('i'),
        Keystroke::ctrl('x'),
        Keystroke::ch('y'),
    ]);
    let exit = ed.run().unwrap();
    assert_eq!(exit, LoopExit::Normal);
    assert_eq!(active_text(&ed), "hi");
    // The nested prompt view is gone again.
    assert!(ed.views.prompt_view().is_none());
}

#[test]
fn quit_declined_keeps_looping() {
    let mut ed = editor_with_keys([
        Keystroke::ch('h'),
        Keystroke::ctrl('x'),
        Keystroke::ch('n'),
        Keystroke::ch('o'),
    ]);
    let exit = ed.run().unwrap();
    // Declining quit resumes the loop; the trailing 'o' still inserts.
    assert_eq!(exit, LoopExit::InputClosed);
    assert_eq!(active_text(&ed), "ho");
}

#[test]
fn multi_key_chord_dispatches_once_with_static_param() {
    let mut ed = editor_with_keys([Keystroke::ctrl('c'), Keystroke::ch('d')]);
    if let Some(view) = ed.active_view_mut() {
        view.buffer.set_text("(ab)");
        view.buffer.mark_clean();
        view.move_cursor_to(Position::new(0, 2));
    }
    let log = observed(&mut ed);
    ed.run().unwrap();
    assert_eq!(*log.borrow(), vec!["copy-by"]);
    assert_eq!(ed.paste_register, "(ab)");
}

#[test]
fn numeric_prefix_chord_moves_by_captured_count() {
    let lines = (0..40).map(|i| i.to_string()).collect::<Vec<_>>().join("\n");
    let mut ed = editor_with_keys([
        Keystroke::alt('g'),
        Keystroke::ch('1'),
        Keystroke::ch('2'),
        Keystroke::ch('g'),
    ]);
    if let Some(view) = ed.active_view_mut() {
        view.buffer.set_text(&lines);
        view.buffer.mark_clean();
    }
    ed.run().unwrap();
    let pos = ed.active_view().unwrap().cursor().pos;
    // `M-g 12 g` jumps to 1-based line 12.
    assert_eq!(pos, Position::new(11, 0));
}

#[test]
fn multiple_numeric_params_multiply_into_the_repeat() {
    use core_editor::{CMD_MOVE_RELATIVE, DEFAULT_KMAP};

    let lines = (0..20).map(|i| i.to_string()).collect::<Vec<_>>().join("\n");
    let mut ed = editor_with_keys([
        Keystroke::alt('y'),
        Keystroke::ch('2'),
        Keystroke::ch('x'),
        Keystroke::ch('3'),
        Keystroke::ch('d'),
    ]);
    ed.keymaps.get_mut(DEFAULT_KMAP).unwrap().bind_keys(
        CMD_MOVE_RELATIVE,
        &[
            Keystroke::alt('y'),
            Keystroke::NUMERIC,
            Keystroke::ch('x'),
            Keystroke::NUMERIC,
            Keystroke::ch('d'),
        ],
        Some("down"),
    );
    if let Some(view) = ed.active_view_mut() {
        view.buffer.set_text(&lines);
        view.buffer.mark_clean();
    }
    ed.run().unwrap();
    // `M-y 2 x 3 d` captures [2, 3]; the relative motion repeats 6 times.
    assert_eq!(ed.active_view().unwrap().cursor().pos, Position::new(6, 0));
}

#[test]
fn chord_miss_discards_partial_path() {
    let mut ed = editor_with_keys([
        Keystroke::ctrl('c'),
        Keystroke::ch('z'),
        Keystroke::ch('x'),
    ]);
    let log = observed(&mut ed);
    ed.run().unwrap();
    // `C-c z` is unbound; the pending chord aborts and `x` inserts fresh.
    assert_eq!(active_text(&ed), "x");
    assert_eq!(*log.borrow(), vec!["insert-data"]);
}

#[test]
fn arrow_keys_move_with_static_directions() {
    let mut ed = editor_with_keys([
        Keystroke::special(SpecialKey::Down),
        Keystroke::special(SpecialKey::Right),
        Keystroke::special(SpecialKey::Right),
        Keystroke::special(SpecialKey::Up),
    ]);
    if let Some(view) = ed.active_view_mut() {
        view.buffer.set_text("abc\ndef");
        view.buffer.mark_clean();
    }
    ed.run().unwrap();
    assert_eq!(ed.active_view().unwrap().cursor().pos, Position::new(0, 2));
}

#[test]
fn view_split_and_close_restore_parent() {
    let mut ed = editor_with_keys([Keystroke::alt('v'), Keystroke::alt('w')]);
    let original = ed.views.active().unwrap();
    let before = ed.views.len();
    ed.run().unwrap();
    assert_eq!(ed.views.len(), before);
    assert_eq!(ed.views.active(), Some(original));
}

#[test]
fn shutdown_flag_unwinds_the_loop() {
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;

    use core_editor::{Editor, EditorConfig};
    use core_input::ScriptedSource;
    use core_render::NoopRenderer;

    let flag = Arc::new(AtomicBool::new(true));
    let mut ed = Editor::new(
        EditorConfig::default(),
        Box::new(ScriptedSource::keys([Keystroke::ch('a')])),
        Box::new(NoopRenderer),
        flag,
    );
    let exit = ed.run().unwrap();
    assert_eq!(exit, LoopExit::Shutdown);
    // Nothing was dispatched on the way out.
    assert_eq!(active_text(&ed), "");
}
