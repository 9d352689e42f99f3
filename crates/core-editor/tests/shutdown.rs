//! Crash-path backups: every unsaved EDIT buffer lands in
//! `mle.bak.<pid>.<n>`; prompt/status/menu views are skipped.

mod common;

use common::editor_with_keys;
use core_model::{OpenOpts, ViewKind};
use core_text::Buffer;
use pretty_assertions::assert_eq;

#[test]
fn backups_cover_dirty_edit_buffers_only() {
    let mut ed = editor_with_keys([]);
    if let Some(view) = ed.active_view_mut() {
        view.buffer.set_text("unsaved text");
    }
    // A clean edit view, a dirty prompt view, and a dirty menu view must
    // all be skipped.
    ed.views.open(
        ViewKind::Edit,
        Buffer::from_str("clean", "saved"),
        OpenOpts::default(),
    );
    let mut prompt_buf = Buffer::new("prompt");
    prompt_buf.set_text("half-typed answer");
    ed.views
        .open(ViewKind::Prompt, prompt_buf, OpenOpts::default());
    let mut menu_buf = Buffer::new("menu");
    menu_buf.set_text("listing");
    ed.views.open(ViewKind::Menu, menu_buf, OpenOpts::default());

    let dir = tempfile::tempdir().unwrap();
    let written = ed.write_crash_backups(dir.path());
    assert_eq!(written.len(), 1);
    let pid = std::process::id();
    assert_eq!(
        written[0].file_name().unwrap().to_str().unwrap(),
        format!("mle.bak.{pid}.0")
    );
    assert_eq!(
        std::fs::read_to_string(&written[0]).unwrap(),
        "unsaved text"
    );
}

#[test]
fn every_dirty_buffer_gets_its_own_numbered_backup() {
    let mut ed = editor_with_keys([]);
    if let Some(view) = ed.active_view_mut() {
        view.buffer.set_text("one");
    }
    let mut second = Buffer::new("second");
    second.set_text("two");
    ed.views.open(ViewKind::Edit, second, OpenOpts::default());

    let dir = tempfile::tempdir().unwrap();
    let written = ed.write_crash_backups(dir.path());
    assert_eq!(written.len(), 2);
    let names: Vec<String> = written
        .iter()
        .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
        .collect();
    let pid = std::process::id();
    assert!(names.contains(&format!("mle.bak.{pid}.0")));
    assert!(names.contains(&format!("mle.bak.{pid}.1")));
}
