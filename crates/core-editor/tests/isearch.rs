//! Isearch prompt: live match stepping through the change listener, arrow
//! navigation, multi-cursor drop, and cancel restoring the origin.

mod common;

use common::editor_with_keys;
use core_keys::{Keystroke, SpecialKey};
use core_text::Position;
use pretty_assertions::assert_eq;

fn seeded(keys: Vec<Keystroke>) -> core_editor::Editor {
    let mut ed = editor_with_keys(keys);
    if let Some(view) = ed.active_view_mut() {
        view.buffer.set_text("abc abc\nxx\nabc");
        view.buffer.mark_clean();
    }
    ed
}

fn enter() -> Keystroke {
    Keystroke::special(SpecialKey::Enter)
}

#[test]
fn typing_a_pattern_jumps_to_the_first_match() {
    // C-s opens the search prompt; each typed char re-runs the match.
    let mut ed = seeded(vec![
        Keystroke::ctrl('s'),
        Keystroke::ch('a'),
        Keystroke::ch('b'),
        Keystroke::ch('c'),
        enter(),
    ]);
    ed.run().unwrap();
    assert_eq!(ed.active_view().unwrap().cursor().pos, Position::new(0, 0));
}

#[test]
fn arrows_step_between_matches() {
    let mut ed = seeded(vec![
        Keystroke::ctrl('s'),
        Keystroke::ch('a'),
        Keystroke::ch('b'),
        Keystroke::ch('c'),
        Keystroke::special(SpecialKey::Down),
        Keystroke::special(SpecialKey::Down),
        enter(),
    ]);
    ed.run().unwrap();
    assert_eq!(ed.active_view().unwrap().cursor().pos, Position::new(2, 0));
}

#[test]
fn cancel_restores_the_origin_cursor() {
    let mut ed = seeded(vec![
        Keystroke::ctrl('s'),
        Keystroke::ch('x'),
        Keystroke::ctrl('c'),
    ]);
    if let Some(view) = ed.active_view_mut() {
        view.move_cursor_to(Position::new(0, 2));
    }
    ed.run().unwrap();
    assert_eq!(ed.active_view().unwrap().cursor().pos, Position::new(0, 2));
}

#[test]
fn drop_cursors_marks_every_match() {
    let mut ed = seeded(vec![
        Keystroke::ctrl('s'),
        Keystroke::ch('a'),
        Keystroke::ch('b'),
        Keystroke::ch('c'),
        Keystroke::alt('a'),
    ]);
    ed.run().unwrap();
    let view = ed.active_view().unwrap();
    let positions: Vec<Position> = view.cursors.iter().map(|c| c.pos).collect();
    assert_eq!(
        positions,
        vec![
            Position::new(0, 0),
            Position::new(0, 4),
            Position::new(2, 0)
        ]
    );
    assert!(ed.views.prompt_view().is_none());
}

#[test]
fn invalid_pattern_surfaces_on_the_status_bar() {
    let mut ed = seeded(vec![
        Keystroke::ctrl('s'),
        Keystroke::ch('('),
        Keystroke::ctrl('c'),
    ]);
    ed.run().unwrap();
    assert!(ed.status_msg.as_deref().unwrap_or("").contains("bad pattern"));
}
