//! The fixed prompt/menu/isearch command contract. These are bound only in
//! the prompt keymaps installed at startup (or caller-provided overrides
//! honoring the same names).

use core_text::{Cursor, Position};
use regex::Regex;
use tracing::debug;

use crate::command::CmdContext;
use crate::loop_ctx::Completion;
use crate::prompt::{
    MAX_COMPLETION_STEM, PROMPT_ALL, PROMPT_NO, PROMPT_YES, match_at_or_after, match_before,
    all_matches,
};
use crate::commands::{CMD_PROMPT_TAB_COMPLETE, proc::shell_quote};
use crate::{CoreError, Editor, PromptParams};

fn answer_and_exit(cctx: &mut CmdContext<'_>, answer: Option<String>) {
    cctx.loop_ctx.prompt_answer = answer;
    cctx.loop_ctx.should_exit = true;
}

pub(crate) fn submit(ed: &mut Editor, cctx: &mut CmdContext<'_>) -> Result<(), CoreError> {
    let text = ed
        .views
        .get(cctx.view)
        .map(|v| v.buffer.text())
        .unwrap_or_default();
    answer_and_exit(cctx, Some(text));
    Ok(())
}

pub(crate) fn cancel(_ed: &mut Editor, cctx: &mut CmdContext<'_>) -> Result<(), CoreError> {
    answer_and_exit(cctx, None);
    Ok(())
}

pub(crate) fn yes(_ed: &mut Editor, cctx: &mut CmdContext<'_>) -> Result<(), CoreError> {
    answer_and_exit(cctx, Some(PROMPT_YES.to_string()));
    Ok(())
}

pub(crate) fn no(_ed: &mut Editor, cctx: &mut CmdContext<'_>) -> Result<(), CoreError> {
    answer_and_exit(cctx, Some(PROMPT_NO.to_string()));
    Ok(())
}

pub(crate) fn all(_ed: &mut Editor, cctx: &mut CmdContext<'_>) -> Result<(), CoreError> {
    answer_and_exit(cctx, Some(PROMPT_ALL.to_string()));
    Ok(())
}

/// The ok prompt's default command: any keystroke dismisses it.
pub(crate) fn ok(_ed: &mut Editor, cctx: &mut CmdContext<'_>) -> Result<(), CoreError> {
    answer_and_exit(cctx, None);
    Ok(())
}

/// Tab completion. The first press of a streak snapshots the prompt line as
/// the stem and shells out to the filename-completion command; subsequent
/// presses cycle through the candidates modulo their count.
pub(crate) fn tab_complete(ed: &mut Editor, cctx: &mut CmdContext<'_>) -> Result<(), CoreError> {
    let streak = cctx.loop_ctx.last_cmd.as_deref() == Some(CMD_PROMPT_TAB_COMPLETE);
    if !streak || cctx.loop_ctx.completion.is_none() {
        let Some(view) = ed.views.get(cctx.view) else {
            return Err(CoreError::Precondition("prompt view closed"));
        };
        let stem = view.buffer.text();
        if stem.chars().count() > MAX_COMPLETION_STEM {
            debug!(target: "loop.prompt", "completion_stem_too_long");
            return Ok(());
        }
        let cmdline = format!("{} {}", ed.config.tab_complete_cmd, shell_quote(&stem));
        let output = ed.shell_capture(&cmdline)?;
        let candidates: Vec<String> = output
            .split('\n')
            .map(|l| l.trim_end().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        debug!(target: "loop.prompt", stem = %stem, candidates = candidates.len(), "completion_snapshot");
        cctx.loop_ctx.completion = Some(Completion {
            term: stem,
            candidates,
            index: 0,
        });
    } else if let Some(c) = cctx.loop_ctx.completion.as_mut() {
        c.index += 1;
    }

    let Some(c) = &cctx.loop_ctx.completion else {
        return Ok(());
    };
    if c.candidates.is_empty() {
        return Ok(());
    }
    let pick = c.candidates[c.index % c.candidates.len()].clone();
    if let Some(view) = ed.views.get_mut(cctx.view) {
        view.buffer.set_text(&pick);
        view.buffer.mark_clean();
        let end = Position::new(0, view.buffer.line_len(0));
        view.move_cursor_to(end);
    }
    Ok(())
}

/// Fire the menu's callback command with the current line as its static
/// parameter. The callback decides whether anything exits.
pub(crate) fn menu_submit(ed: &mut Editor, cctx: &mut CmdContext<'_>) -> Result<(), CoreError> {
    let Some(view) = ed.views.get(cctx.view) else {
        return Ok(());
    };
    let Some(callback) = view.menu_callback.clone() else {
        return Ok(());
    };
    let line = view
        .buffer
        .line(view.cursor().pos.line)
        .unwrap_or_default()
        .to_string();
    let (func, _) = ed.commands.resolve(&callback)?;
    let mut sub = CmdContext {
        view: cctx.view,
        input: cctx.input,
        static_param: Some(line),
        loop_ctx: &mut *cctx.loop_ctx,
        paste: None,
        is_user_input: cctx.is_user_input,
    };
    func(ed, &mut sub)
}

/// Cancel any async process bound to the menu.
pub(crate) fn menu_cancel(ed: &mut Editor, cctx: &mut CmdContext<'_>) -> Result<(), CoreError> {
    ed.procs.mark_view_done(cctx.view);
    ed.set_status("menu process cancelled");
    Ok(())
}

/// Prompt-menu submission: answer with the menu's current line.
pub(crate) fn pmenu_submit(ed: &mut Editor, cctx: &mut CmdContext<'_>) -> Result<(), CoreError> {
    let line = ed.views.get(cctx.view).and_then(|v| {
        v.buffer
            .line(v.cursor().pos.line)
            .map(str::to_string)
    });
    answer_and_exit(cctx, line);
    Ok(())
}

// -------------------------------------------------------------------------------------------------
// Isearch
// -------------------------------------------------------------------------------------------------

pub(crate) fn search(ed: &mut Editor, _cctx: &mut CmdContext<'_>) -> Result<(), CoreError> {
    let _ = ed.prompt("search:", PromptParams::isearch())?;
    Ok(())
}

/// Change listener for the isearch prompt: recompile the pattern and jump
/// the invoking view to the first match at or after the original position.
pub(crate) fn isearch_refresh(ed: &mut Editor, cctx: &mut CmdContext<'_>) -> Result<(), CoreError> {
    let pattern = ed
        .views
        .get(cctx.view)
        .map(|v| v.buffer.text())
        .unwrap_or_default();
    let Some(st) = ed.isearch.as_mut() else {
        return Ok(());
    };
    if pattern == st.last_pattern {
        return Ok(());
    }
    st.last_pattern = pattern.clone();
    let (invoker, origin) = (st.invoker, st.origin);

    if pattern.is_empty() {
        if let Some(st) = ed.isearch.as_mut() {
            st.regex = None;
        }
        if let Some(view) = ed.views.get_mut(invoker) {
            view.move_cursor_to(origin);
        }
        return Ok(());
    }
    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(_) => {
            ed.set_status(format!("bad pattern: {pattern}"));
            if let Some(st) = ed.isearch.as_mut() {
                st.regex = None;
            }
            return Ok(());
        }
    };
    if let Some(view) = ed.views.get_mut(invoker) {
        let target = match_at_or_after(&view.buffer, &re, origin);
        if let Some(pos) = target {
            view.move_cursor_to(pos);
        }
    }
    if let Some(st) = ed.isearch.as_mut() {
        st.regex = Some(re);
    }
    Ok(())
}

fn isearch_step(ed: &mut Editor, forward: bool) -> Result<(), CoreError> {
    let Some(st) = ed.isearch.as_ref() else {
        return Ok(());
    };
    let invoker = st.invoker;
    let Some(re) = st.regex.clone() else {
        return Ok(());
    };
    if let Some(view) = ed.views.get_mut(invoker) {
        let cur = view.cursor().pos;
        let target = if forward {
            match_at_or_after(&view.buffer, &re, Position::new(cur.line, cur.col + 1))
        } else {
            match_before(&view.buffer, &re, cur)
        };
        if let Some(pos) = target {
            view.move_cursor_to(pos);
        }
    }
    Ok(())
}

pub(crate) fn isearch_next(ed: &mut Editor, _cctx: &mut CmdContext<'_>) -> Result<(), CoreError> {
    isearch_step(ed, true)
}

pub(crate) fn isearch_prev(ed: &mut Editor, _cctx: &mut CmdContext<'_>) -> Result<(), CoreError> {
    isearch_step(ed, false)
}

/// Drop a cursor at every match in the invoking buffer, then exit the
/// prompt. Answers with the pattern so the exit is not treated as a cancel.
pub(crate) fn isearch_drop_cursors(
    ed: &mut Editor,
    cctx: &mut CmdContext<'_>,
) -> Result<(), CoreError> {
    if let Some(st) = ed.isearch.as_ref()
        && let Some(re) = st.regex.clone()
    {
        let invoker = st.invoker;
        if let Some(view) = ed.views.get_mut(invoker) {
            let matches = all_matches(&view.buffer, &re);
            if !matches.is_empty() {
                view.cursors = matches.into_iter().map(Cursor::at).collect();
                view.active_cursor = 0;
            }
        }
    }
    let pattern = ed
        .views
        .get(cctx.view)
        .map(|v| v.buffer.text())
        .unwrap_or_default();
    answer_and_exit(cctx, Some(pattern));
    Ok(())
}
