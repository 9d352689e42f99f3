//! Macro record/replay through the loop: toggle key, name prompt, trimmed
//! toggle keystroke, replay as a synthetic input source.

mod common;

use common::{active_text, editor_with_keys};
use core_keys::{Keystroke, SpecialKey};
use pretty_assertions::assert_eq;

fn enter() -> Keystroke {
    Keystroke::special(SpecialKey::Enter)
}

#[test]
fn record_then_replay_repeats_the_commands() {
    let toggle = Keystroke::alt('r');
    let mut ed = editor_with_keys([
        toggle,
        Keystroke::ch('m'),
        Keystroke::ch('1'),
        enter(),
        Keystroke::ch('h'),
        Keystroke::ch('i'),
        toggle,
        Keystroke::alt('p'),
        enter(),
    ]);
    ed.run().unwrap();

    // The toggle keystroke was trimmed from the recording.
    let m1 = ed.macros.get("m1").expect("macro registered");
    assert_eq!(m1.keys, vec![Keystroke::ch('h'), Keystroke::ch('i')]);
    // Recording inserted "hi"; the replay inserted it again.
    assert_eq!(active_text(&ed), "hihi");
    assert!(ed.replay.is_none());
}

#[test]
fn empty_recording_is_discarded() {
    let toggle = Keystroke::alt('r');
    let mut ed = editor_with_keys([toggle, Keystroke::ch('m'), Keystroke::ch('2'), enter(), toggle]);
    ed.run().unwrap();
    assert!(ed.macros.is_empty());
}

#[test]
fn cancelled_name_prompt_does_not_start_recording() {
    let toggle = Keystroke::alt('r');
    let mut ed = editor_with_keys([toggle, Keystroke::ctrl('c'), Keystroke::ch('x')]);
    ed.run().unwrap();
    assert!(ed.recording.is_none());
    assert_eq!(active_text(&ed), "x");
}

#[test]
fn replayed_input_is_not_rerecorded() {
    let toggle = Keystroke::alt('r');
    let mut ed = editor_with_keys([
        // Record m1 = [h].
        toggle,
        Keystroke::ch('m'),
        Keystroke::ch('1'),
        enter(),
        Keystroke::ch('h'),
        toggle,
        // Record m2 while replaying m1 in the middle.
        toggle,
        Keystroke::ch('m'),
        Keystroke::ch('2'),
        enter(),
        Keystroke::alt('p'),
        enter(),
        Keystroke::ch('x'),
        toggle,
    ]);
    ed.run().unwrap();

    let m2 = ed.macros.get("m2").expect("macro registered");
    // m2 holds the user's keystrokes (replay trigger + menu enter + x) but
    // never the replayed `h`.
    assert_eq!(
        m2.keys,
        vec![Keystroke::alt('p'), enter(), Keystroke::ch('x')]
    );
    assert_eq!(active_text(&ed), "hhx");
}

#[test]
fn registered_macro_lines_replay_like_recordings() {
    use core_editor::Macro;
    use core_keys::parse_macro_line;

    let (name, keys) = parse_macro_line("greet,h,i,enter,h,o").unwrap();
    let mut ed = editor_with_keys([Keystroke::alt('p'), enter()]);
    ed.register_macro(Macro::with_keys(name, keys)).unwrap();
    ed.run().unwrap();
    assert_eq!(active_text(&ed), "hi\nho");
}
