//! Tab completion: stem snapshot on the first press of a streak, candidate
//! cycling modulo the list size, empty results as no-ops.

mod common;

use common::editor_with_keys;
use core_editor::{EditorConfig, PromptParams};
use core_input::ScriptedSource;
use core_keys::{Keystroke, SpecialKey};
use pretty_assertions::assert_eq;

fn tab() -> Keystroke {
    Keystroke::special(SpecialKey::Tab)
}

fn enter() -> Keystroke {
    Keystroke::special(SpecialKey::Enter)
}

fn editor_with_completer(candidates: &str, keys: Vec<Keystroke>) -> core_editor::Editor {
    let mut config = EditorConfig::default();
    // The trailing `#` comments out the appended stem argument.
    config.tab_complete_cmd = format!("printf '{candidates}' #");
    core_editor::Editor::headless(config, Box::new(ScriptedSource::keys(keys)))
}

#[test]
fn candidates_cycle_modulo_their_count() {
    // Three candidates: presses 1..=4 show one, two, three, one again.
    let mut keys = vec![Keystroke::ch('x')];
    keys.extend([tab(), tab(), tab(), tab(), enter()]);
    let mut ed = editor_with_completer("one\\ntwo\\nthree\\n", keys);
    let answer = ed.prompt("open:", PromptParams::input()).unwrap();
    assert_eq!(answer.as_deref(), Some("one"));
}

#[test]
fn first_press_takes_first_candidate() {
    let mut ed = editor_with_completer(
        "alpha\\nbeta\\n",
        vec![Keystroke::ch('a'), tab(), enter()],
    );
    let answer = ed.prompt("open:", PromptParams::input()).unwrap();
    assert_eq!(answer.as_deref(), Some("alpha"));
}

#[test]
fn empty_candidate_list_is_a_noop() {
    let mut config = EditorConfig::default();
    config.tab_complete_cmd = "true".to_string();
    let mut ed = core_editor::Editor::headless(
        config,
        Box::new(ScriptedSource::keys(vec![Keystroke::ch('a'), tab(), enter()])),
    );
    let answer = ed.prompt("open:", PromptParams::input()).unwrap();
    assert_eq!(answer.as_deref(), Some("a"));
}

#[test]
fn typing_after_a_streak_resnapshots_the_stem() {
    // tab, tab shows candidate 2; typing breaks the streak, so the next tab
    // snapshots a fresh stem and starts at candidate 1 again.
    let mut ed = editor_with_completer(
        "one\\ntwo\\n",
        vec![
            Keystroke::ch('x'),
            tab(),
            tab(),
            Keystroke::ch('!'),
            tab(),
            enter(),
        ],
    );
    let answer = ed.prompt("open:", PromptParams::input()).unwrap();
    assert_eq!(answer.as_deref(), Some("one"));
}

#[test]
fn overlong_stem_bails_out() {
    use core_editor::MAX_COMPLETION_STEM;
    let long: Vec<Keystroke> = std::iter::repeat_n(Keystroke::ch('a'), MAX_COMPLETION_STEM + 1)
        .chain([tab(), enter()])
        .collect();
    let mut ed = editor_with_completer("one\\n", long);
    let answer = ed.prompt("open:", PromptParams::input()).unwrap();
    let answer = answer.unwrap();
    // The buffer was left untouched.
    assert_eq!(answer.chars().count(), MAX_COMPLETION_STEM + 1);
    assert!(answer.chars().all(|c| c == 'a'));
}

#[test]
fn completion_command_sees_quoted_stem() {
    // Echo the stem back as the only candidate.
    let mut config = EditorConfig::default();
    config.tab_complete_cmd = "echo".to_string();
    let mut ed = core_editor::Editor::headless(
        config,
        Box::new(ScriptedSource::keys(vec![
            Keystroke::ch('a'),
            Keystroke::ch('b'),
            tab(),
            enter(),
        ])),
    );
    let answer = ed.prompt("open:", PromptParams::input()).unwrap();
    assert_eq!(answer.as_deref(), Some("ab"));
}

#[test]
fn editor_with_keys_smoke() {
    // Keep the shared helper exercised from this binary too.
    let ed = editor_with_keys([]);
    assert!(ed.macros.is_empty());
}
