//! core-render: one-pass screen drawing for the event loop.
//!
//! The loop draws once per turn: clear, active edit-view subtree, status
//! line, prompt line (when open), cursors, present. Only cursors rooted in
//! the active split chain are drawn. [`NoopRenderer`] keeps headless runs
//! and tests away from the terminal entirely.

use std::io::{Stdout, Write, stdout};

use anyhow::Result;
use core_model::{ViewId, ViewKind, Views};
use crossterm::{
    cursor::{MoveTo, Show},
    queue,
    style::Print,
    terminal::{Clear, ClearType},
};

/// Everything a turn's draw needs, borrowed from the editor.
pub struct Frame<'a> {
    pub views: &'a Views,
    pub status_left: String,
    pub status_right: String,
}

pub trait Renderer {
    fn draw(&mut self, frame: &Frame<'_>) -> Result<()>;
}

/// Discards every frame; used by tests and by macro replay turns.
#[derive(Debug, Default)]
pub struct NoopRenderer;

impl Renderer for NoopRenderer {
    fn draw(&mut self, _frame: &Frame<'_>) -> Result<()> {
        Ok(())
    }
}

pub struct CrosstermRenderer {
    out: Stdout,
}

impl CrosstermRenderer {
    pub fn new() -> Self {
        Self { out: stdout() }
    }

    fn draw_view(&mut self, frame: &Frame<'_>, id: ViewId) -> Result<()> {
        let Some(view) = frame.views.get(id) else {
            return Ok(());
        };
        let rect = view.rect;
        let top = view.scroll_top;
        for row in 0..rect.h {
            let line = view
                .buffer
                .line(top + row as usize)
                .unwrap_or_default();
            let clipped: String = line.chars().take(rect.w as usize).collect();
            queue!(self.out, MoveTo(rect.x, rect.y + row), Print(clipped))?;
        }
        if let Some(child) = view.split_child {
            self.draw_view(frame, child)?;
        }
        Ok(())
    }

    fn draw_cursors(&mut self, frame: &Frame<'_>, id: ViewId) -> Result<()> {
        let Some(view) = frame.views.get(id) else {
            return Ok(());
        };
        for cursor in &view.cursors {
            let line = cursor.pos.line.saturating_sub(view.scroll_top);
            if line < view.rect.h as usize && cursor.pos.col < view.rect.w as usize {
                queue!(
                    self.out,
                    MoveTo(
                        view.rect.x + cursor.pos.col as u16,
                        view.rect.y + line as u16
                    ),
                    Show
                )?;
            }
        }
        if let Some(child) = view.split_child {
            self.draw_cursors(frame, child)?;
        }
        Ok(())
    }
}

impl Default for CrosstermRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for CrosstermRenderer {
    fn draw(&mut self, frame: &Frame<'_>) -> Result<()> {
        queue!(self.out, Clear(ClearType::All))?;

        // Root of the active split chain.
        let mut root = frame.views.active();
        while let Some(id) = root {
            match frame.views.get(id).and_then(|v| v.split_parent) {
                Some(parent) => root = Some(parent),
                None => break,
            }
        }
        if let Some(root) = root.filter(|id| {
            frame
                .views
                .get(*id)
                .is_some_and(|v| v.is_editish())
        }) {
            self.draw_view(frame, root)?;
        }

        for view in frame.views.iter() {
            match view.kind {
                ViewKind::Status => {
                    let rect = view.rect;
                    let mut line = frame.status_left.clone();
                    let right = &frame.status_right;
                    let w = rect.w as usize;
                    if line.chars().count() + right.chars().count() < w {
                        let pad = w - line.chars().count() - right.chars().count();
                        line.extend(std::iter::repeat_n(' ', pad));
                        line.push_str(right);
                    }
                    let clipped: String = line.chars().take(w).collect();
                    queue!(self.out, MoveTo(rect.x, rect.y), Print(clipped))?;
                }
                ViewKind::Prompt => {
                    let rect = view.rect;
                    let title = view.prompt_str.as_deref().unwrap_or("");
                    let text = format!("{title} {}", view.buffer.text());
                    let clipped: String = text.chars().take(rect.w as usize).collect();
                    queue!(self.out, MoveTo(rect.x, rect.y), Print(clipped))?;
                }
                _ => {}
            }
        }

        // Prompt cursor wins over edit cursors when a prompt is open.
        if let Some(prompt) = frame.views.prompt_view() {
            self.draw_cursors(frame, prompt)?;
        } else if let Some(root) = root {
            self.draw_cursors(frame, root)?;
        }

        self.out.flush()?;
        Ok(())
    }
}
