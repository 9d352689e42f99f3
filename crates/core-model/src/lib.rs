//! core-model: views and the editor's view collections.
//!
//! A [`View`] is an on-screen window over a buffer with its own cursors and
//! keymap stack. The editor tracks three relationships between views: the
//! all-views ring (ordered, wraps around for neighbor lookup), the top-level
//! list, and one optional split child per parent. Instead of intrusive
//! linked lists, views live in a slot arena keyed by stable [`ViewId`]s and
//! the orderings are explicit vectors with cheap splices.
//!
//! Core invariants (must hold after every public call):
//! * The active view is always a member of the all-views ring.
//! * Every `ViewId` in an ordering vector names a live slot.
//! * A split child appears in the all-views ring but never in the top-level
//!   list; its parent's `split_child` names it and its `split_parent` names
//!   the parent.
//! * At most one PROMPT view exists at any time (enforced by the opener).
//! * Closing the last EDIT view opens a fresh blank one before returning.

use core_text::{Buffer, Cursor, Position};
use tracing::debug;

mod layout;

pub use layout::{Rect, ScreenLayout, screen_layout};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Edit,
    Prompt,
    Status,
    Menu,
}

#[derive(Debug)]
pub struct View {
    pub id: ViewId,
    pub kind: ViewKind,
    pub buffer: Buffer,
    pub cursors: Vec<Cursor>,
    pub active_cursor: usize,
    /// Keymap names, tail consulted first during resolution.
    pub kmap_stack: Vec<String>,
    /// Prompt title shown before the input line.
    pub prompt_str: Option<String>,
    /// Command invoked when a menu line is submitted.
    pub menu_callback: Option<String>,
    /// Command invoked after every command that ran while this view was
    /// active (isearch uses this to re-run the match).
    pub change_listener: Option<String>,
    /// Async process feeding this view, if any.
    pub proc: Option<u64>,
    pub rect: Rect,
    pub scroll_top: usize,
    pub split_parent: Option<ViewId>,
    pub split_child: Option<ViewId>,
    split_vertical: bool,
}

impl View {
    pub fn cursor(&self) -> &Cursor {
        &self.cursors[self.active_cursor.min(self.cursors.len() - 1)]
    }

    pub fn cursor_mut(&mut self) -> &mut Cursor {
        let idx = self.active_cursor.min(self.cursors.len() - 1);
        &mut self.cursors[idx]
    }

    pub fn move_cursor_to(&mut self, pos: Position) {
        let pos = self.buffer.clamp(pos);
        self.cursor_mut().pos = pos;
    }

    pub fn is_menu(&self) -> bool {
        self.kind == ViewKind::Menu
    }

    /// Edit-like views host user text (menus included); prompts and the
    /// status bar do not.
    pub fn is_editish(&self) -> bool {
        matches!(self.kind, ViewKind::Edit | ViewKind::Menu)
    }
}

#[derive(Debug, Clone, Default)]
pub struct OpenOpts {
    /// Attach as a split child of this parent instead of the top-level list.
    pub split_of: Option<ViewId>,
    pub split_vertical: bool,
    pub set_active: bool,
    pub line: Option<usize>,
}

#[derive(Debug)]
pub struct Views {
    slots: Vec<Option<View>>,
    /// All-views ring; new views are prepended.
    all: Vec<ViewId>,
    /// Top-level views; new views are appended. Split children excluded.
    top: Vec<ViewId>,
    active: Option<ViewId>,
    default_kmap: String,
    size: (u16, u16),
}

impl Views {
    pub fn new(default_kmap: impl Into<String>) -> Self {
        Self {
            slots: Vec::new(),
            all: Vec::new(),
            top: Vec::new(),
            active: None,
            default_kmap: default_kmap.into(),
            size: (80, 24),
        }
    }

    pub fn get(&self, id: ViewId) -> Option<&View> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: ViewId) -> Option<&mut View> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: ViewId) -> bool {
        self.get(id).is_some()
    }

    pub fn active(&self) -> Option<ViewId> {
        self.active
    }

    /// Precondition failure (unknown view) is reported to the caller.
    pub fn set_active(&mut self, id: ViewId) -> Result<(), ViewId> {
        if self.contains(id) {
            self.active = Some(id);
            Ok(())
        } else {
            Err(id)
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &View> {
        self.all.iter().filter_map(|id| self.get(*id))
    }

    pub fn iter_ids(&self) -> impl Iterator<Item = ViewId> + '_ {
        self.all.iter().copied()
    }

    pub fn prompt_view(&self) -> Option<ViewId> {
        self.iter()
            .find(|v| v.kind == ViewKind::Prompt)
            .map(|v| v.id)
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    /// Open a view over `buffer`. Prepends to the all-views ring and either
    /// appends to the top-level list or attaches as a split child.
    pub fn open(&mut self, kind: ViewKind, buffer: Buffer, opts: OpenOpts) -> ViewId {
        let id = ViewId(self.slots.len());
        let mut view = View {
            id,
            kind,
            buffer,
            cursors: vec![Cursor::default()],
            active_cursor: 0,
            kmap_stack: vec![self.default_kmap.clone()],
            prompt_str: None,
            menu_callback: None,
            change_listener: None,
            proc: None,
            rect: Rect::default(),
            scroll_top: 0,
            split_parent: None,
            split_child: None,
            split_vertical: false,
        };
        if let Some(line) = opts.line {
            view.move_cursor_to(Position::new(line, 0));
        }

        if let Some(parent_id) = opts.split_of.filter(|p| self.contains(*p)) {
            view.split_parent = Some(parent_id);
            view.split_vertical = opts.split_vertical;
            self.slots.push(Some(view));
            self.all.insert(0, id);
            if let Some(parent) = self.get_mut(parent_id) {
                parent.split_child = Some(id);
            }
        } else {
            self.slots.push(Some(view));
            self.all.insert(0, id);
            self.top.push(id);
        }

        if opts.set_active || self.active.is_none() {
            self.active = Some(id);
        }
        debug!(target: "model.view", id = id.0, ?kind, "view_open");
        self.resize(self.size.0, self.size.1);
        id
    }

    /// Close a view per the replacement rules: split children close first,
    /// a split parent inherits focus, otherwise a neighboring EDIT view in
    /// the ring does, otherwise a fresh blank EDIT view is opened. Always
    /// ends with a full resize.
    pub fn close(&mut self, id: ViewId) {
        if !self.contains(id) {
            return;
        }
        if let Some(child) = self.get(id).and_then(|v| v.split_child) {
            self.close(child);
        }

        let split_parent = self.get(id).and_then(|v| v.split_parent);
        let replacement = split_parent.or_else(|| self.neighbor_edit(id));

        self.all.retain(|v| *v != id);
        self.top.retain(|v| *v != id);
        if let Some(parent) = split_parent.and_then(|p| self.get_mut(p)) {
            parent.split_child = None;
        }
        self.slots[id.0] = None;
        debug!(target: "model.view", id = id.0, "view_close");

        self.active = replacement;
        if self.active.is_none() || !self.iter().any(|v| v.kind == ViewKind::Edit) {
            let fresh = self.open(
                ViewKind::Edit,
                Buffer::new("untitled"),
                OpenOpts {
                    set_active: self.active.is_none(),
                    ..OpenOpts::default()
                },
            );
            if self.active.is_none() {
                self.active = Some(fresh);
            }
        }
        self.resize(self.size.0, self.size.1);
    }

    /// The previous EDIT view in the all-views ring, else the next one.
    fn neighbor_edit(&self, from: ViewId) -> Option<ViewId> {
        let at = self.all.iter().position(|v| *v == from)?;
        let n = self.all.len();
        for back in 1..n {
            let id = self.all[(at + n - back) % n];
            if id != from && self.get(id).is_some_and(|v| v.kind == ViewKind::Edit) {
                return Some(id);
            }
        }
        None
    }

    /// The next/previous EDIT view after the given one, for view cycling.
    pub fn cycle_edit(&self, from: ViewId, forward: bool) -> Option<ViewId> {
        let at = self.all.iter().position(|v| *v == from)?;
        let n = self.all.len();
        for step in 1..n {
            let idx = if forward {
                (at + step) % n
            } else {
                (at + n - step) % n
            };
            let id = self.all[idx];
            if self.get(id).is_some_and(|v| v.kind == ViewKind::Edit) {
                return Some(id);
            }
        }
        None
    }

    pub fn size(&self) -> (u16, u16) {
        self.size
    }

    /// Recompute every rectangle. Deterministic in `(w, h)` and the split
    /// structure, so calling it twice with identical dimensions yields
    /// identical rectangles.
    pub fn resize(&mut self, w: u16, h: u16) {
        self.size = (w, h);
        let prompt_open = self.prompt_view().is_some();
        let screen = screen_layout(w, h, prompt_open);

        let top: Vec<ViewId> = self.top.clone();
        for id in top {
            let Some(view) = self.get(id) else { continue };
            match view.kind {
                ViewKind::Status => {
                    if let Some(v) = self.get_mut(id) {
                        v.rect = screen.status;
                    }
                }
                ViewKind::Prompt => {
                    if let Some(v) = self.get_mut(id) {
                        v.rect = screen.prompt.unwrap_or(screen.status);
                    }
                }
                ViewKind::Edit | ViewKind::Menu => {
                    self.resize_split_chain(id, screen.text);
                }
            }
        }
    }

    fn resize_split_chain(&mut self, id: ViewId, mut rect: Rect) {
        let child = self.get(id).and_then(|v| v.split_child);
        if let Some(child_id) = child {
            let vertical = self
                .get(child_id)
                .map(|c| c.split_vertical)
                .unwrap_or(false);
            let child_rect = rect.carve_child(vertical);
            if let Some(v) = self.get_mut(id) {
                v.rect = rect;
            }
            self.resize_split_chain(child_id, child_rect);
        } else if let Some(v) = self.get_mut(id) {
            v.rect = rect;
        }
    }
}
