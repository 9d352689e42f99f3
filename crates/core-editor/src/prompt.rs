//! The prompt/menu controller: ephemeral views bound to the fixed prompt
//! keymaps, each running a nested event loop that shares the main dispatch
//! pipeline and returning a typed answer.
//!
//! At most one prompt view exists at a time; opening a second is a state
//! precondition failure. Yes/no style prompts answer with the distinguished
//! [`PROMPT_YES`]/[`PROMPT_NO`]/[`PROMPT_ALL`] sentinels; cancel answers
//! with `None`.

use core_model::{OpenOpts, ViewId, ViewKind};
use core_text::{Buffer, Position};
use regex::Regex;
use tracing::debug;

use crate::editor::{
    KMAP_PROMPT_INPUT, KMAP_PROMPT_ISEARCH, KMAP_PROMPT_OK, KMAP_PROMPT_PMENU, KMAP_PROMPT_YN,
    KMAP_PROMPT_YNA,
};
use crate::{CoreError, Editor, LoopCtx, commands};

pub const PROMPT_YES: &str = "yes";
pub const PROMPT_NO: &str = "no";
pub const PROMPT_ALL: &str = "all";

/// Bail-out bound for the tab-completion stem snapshot.
pub const MAX_COMPLETION_STEM: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Input,
    YesNo,
    YesNoAll,
    Ok,
    Isearch,
}

#[derive(Debug, Clone)]
pub struct PromptParams {
    pub kind: PromptKind,
    pub initial: Option<String>,
    /// Override for the prompt keymap; defaults per kind.
    pub keymap: Option<String>,
}

impl PromptParams {
    pub fn input() -> Self {
        Self {
            kind: PromptKind::Input,
            initial: None,
            keymap: None,
        }
    }

    pub fn yes_no() -> Self {
        Self {
            kind: PromptKind::YesNo,
            ..Self::input()
        }
    }

    pub fn yes_no_all() -> Self {
        Self {
            kind: PromptKind::YesNoAll,
            ..Self::input()
        }
    }

    pub fn ok() -> Self {
        Self {
            kind: PromptKind::Ok,
            ..Self::input()
        }
    }

    pub fn isearch() -> Self {
        Self {
            kind: PromptKind::Isearch,
            ..Self::input()
        }
    }

    pub fn with_initial(mut self, text: &str) -> Self {
        self.initial = Some(text.to_string());
        self
    }
}

fn default_keymap(kind: PromptKind) -> &'static str {
    match kind {
        PromptKind::Input => KMAP_PROMPT_INPUT,
        PromptKind::YesNo => KMAP_PROMPT_YN,
        PromptKind::YesNoAll => KMAP_PROMPT_YNA,
        PromptKind::Ok => KMAP_PROMPT_OK,
        PromptKind::Isearch => KMAP_PROMPT_ISEARCH,
    }
}

/// Search state shared between the isearch prompt commands and its change
/// listener.
#[derive(Debug)]
pub struct IsearchState {
    pub invoker: ViewId,
    pub origin: Position,
    pub regex: Option<Regex>,
    /// Last pattern seen by the listener; stepping commands leave it
    /// untouched so they are not re-anchored to the origin.
    pub last_pattern: String,
}

impl Editor {
    /// Open a modal prompt and run a nested loop until it answers.
    pub fn prompt(
        &mut self,
        title: &str,
        params: PromptParams,
    ) -> Result<Option<String>, CoreError> {
        if self.views.prompt_view().is_some() {
            return Err(CoreError::Precondition("a prompt is already open"));
        }
        let invoker = self.views.active();
        let keymap = params
            .keymap
            .clone()
            .unwrap_or_else(|| default_keymap(params.kind).to_string());

        let mut buffer = Buffer::new("prompt");
        if let Some(initial) = &params.initial {
            buffer.set_text(initial);
            buffer.mark_clean();
        }
        let end = Position::new(
            buffer.line_count().saturating_sub(1),
            buffer.line_len(buffer.line_count().saturating_sub(1)),
        );
        let id = self.views.open(
            ViewKind::Prompt,
            buffer,
            OpenOpts {
                set_active: true,
                ..OpenOpts::default()
            },
        );
        if let Some(view) = self.views.get_mut(id) {
            view.prompt_str = Some(title.to_string());
            view.kmap_stack = vec![self.config.initial_kmap.clone(), keymap];
            view.move_cursor_to(end);
            if params.kind == PromptKind::Isearch {
                view.change_listener = Some(commands::CMD_ISEARCH_REFRESH.to_string());
            }
        }
        if params.kind == PromptKind::Isearch
            && let Some(inv) = invoker
            && let Some(view) = self.views.get(inv)
        {
            self.isearch = Some(IsearchState {
                invoker: inv,
                origin: view.cursor().pos,
                regex: None,
                last_pattern: String::new(),
            });
        }
        let (w, h) = self.views.size();
        self.views.resize(w, h);
        debug!(target: "loop.prompt", title, kind = ?params.kind, "prompt_open");

        let mut ctx = LoopCtx::new(invoker);
        let exit = self.run_loop(&mut ctx)?;
        let answer = ctx.prompt_answer.take();

        if params.kind == PromptKind::Isearch {
            // Cancelled search restores the invoking cursor.
            if answer.is_none()
                && let Some(st) = self.isearch.take()
                && let Some(view) = self.views.get_mut(st.invoker)
            {
                view.move_cursor_to(st.origin);
            }
            self.isearch = None;
        }

        self.views.close(id);
        if let Some(inv) = invoker {
            let _ = self.views.set_active(inv);
        }
        debug!(target: "loop.prompt", title, answer = answer.is_some(), exit = ?exit, "prompt_close");
        Ok(answer)
    }

    /// Prompt-menu: a full menu view driven by a nested loop; `enter`
    /// answers with the menu's current line, cancel answers `None`.
    pub fn prompt_menu(&mut self, title: &str, content: &str) -> Result<Option<String>, CoreError> {
        let invoker = self.views.active();
        let id = self.views.open(
            ViewKind::Menu,
            Buffer::from_str(title, content),
            OpenOpts {
                set_active: true,
                ..OpenOpts::default()
            },
        );
        if let Some(view) = self.views.get_mut(id) {
            view.kmap_stack = vec![
                self.config.initial_kmap.clone(),
                KMAP_PROMPT_PMENU.to_string(),
            ];
            view.buffer.mark_clean();
        }

        let mut ctx = LoopCtx::new(invoker);
        let _ = self.run_loop(&mut ctx)?;
        let answer = ctx.prompt_answer.take();

        self.views.close(id);
        if let Some(inv) = invoker {
            let _ = self.views.set_active(inv);
        }
        Ok(answer)
    }
}

// -------------------------------------------------------------------------------------------------
// Regex match stepping (isearch collaborator surface)
// -------------------------------------------------------------------------------------------------

fn col_of_byte(line: &str, byte: usize) -> usize {
    line[..byte].chars().count()
}

/// First match at or after `from`, scanning forward line by line.
pub(crate) fn match_at_or_after(buffer: &Buffer, re: &Regex, from: Position) -> Option<Position> {
    for line_idx in from.line..buffer.line_count() {
        let line = buffer.line(line_idx)?;
        for m in re.find_iter(line) {
            let col = col_of_byte(line, m.start());
            if line_idx > from.line || col >= from.col {
                return Some(Position::new(line_idx, col));
            }
        }
    }
    None
}

/// Last match strictly before `from`.
pub(crate) fn match_before(buffer: &Buffer, re: &Regex, from: Position) -> Option<Position> {
    for line_idx in (0..=from.line.min(buffer.line_count() - 1)).rev() {
        let line = buffer.line(line_idx)?;
        let mut best = None;
        for m in re.find_iter(line) {
            let col = col_of_byte(line, m.start());
            if line_idx < from.line || col < from.col {
                best = Some(Position::new(line_idx, col));
            }
        }
        if best.is_some() {
            return best;
        }
    }
    None
}

/// Every match position in the buffer, in document order.
pub(crate) fn all_matches(buffer: &Buffer, re: &Regex) -> Vec<Position> {
    let mut out = Vec::new();
    for line_idx in 0..buffer.line_count() {
        if let Some(line) = buffer.line(line_idx) {
            for m in re.find_iter(line) {
                out.push(Position::new(line_idx, col_of_byte(line, m.start())));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn match_stepping() {
        let buf = Buffer::from_str("t", "abc abc\nxx\nabc");
        let re = Regex::new("abc").unwrap();
        assert_eq!(
            match_at_or_after(&buf, &re, Position::origin()),
            Some(Position::new(0, 0))
        );
        assert_eq!(
            match_at_or_after(&buf, &re, Position::new(0, 1)),
            Some(Position::new(0, 4))
        );
        assert_eq!(
            match_at_or_after(&buf, &re, Position::new(1, 0)),
            Some(Position::new(2, 0))
        );
        assert_eq!(
            match_before(&buf, &re, Position::new(2, 0)),
            Some(Position::new(0, 4))
        );
        assert_eq!(match_before(&buf, &re, Position::origin()), None);
        assert_eq!(all_matches(&buf, &re).len(), 3);
    }
}
