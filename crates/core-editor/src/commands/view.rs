//! View lifecycle commands: splits, close, cycling, and quit.

use core_model::{OpenOpts, ViewKind};

use crate::command::CmdContext;
use crate::prompt::{PROMPT_YES, PromptParams};
use crate::{CoreError, Editor};

fn split(ed: &mut Editor, cctx: &mut CmdContext<'_>, vertical: bool) -> Result<(), CoreError> {
    let Some(view) = ed.views.get(cctx.view) else {
        return Err(CoreError::Precondition("view closed during split"));
    };
    if view.split_child.is_some() {
        return Err(CoreError::Precondition("view already has a split child"));
    }
    let buffer = view.buffer.clone();
    let cursor = view.cursor().pos;
    let id = ed.views.open(
        ViewKind::Edit,
        buffer,
        OpenOpts {
            split_of: Some(cctx.view),
            split_vertical: vertical,
            set_active: true,
            line: None,
        },
    );
    ed.move_active_cursor(id, cursor);
    Ok(())
}

pub(crate) fn split_horizontal(ed: &mut Editor, cctx: &mut CmdContext<'_>) -> Result<(), CoreError> {
    split(ed, cctx, false)
}

pub(crate) fn split_vertical(ed: &mut Editor, cctx: &mut CmdContext<'_>) -> Result<(), CoreError> {
    split(ed, cctx, true)
}

pub(crate) fn close(ed: &mut Editor, cctx: &mut CmdContext<'_>) -> Result<(), CoreError> {
    ed.procs.mark_view_done(cctx.view);
    ed.views.close(cctx.view);
    Ok(())
}

fn cycle(ed: &mut Editor, forward: bool) -> Result<(), CoreError> {
    let Some(active) = ed.views.active() else {
        return Ok(());
    };
    if let Some(next) = ed.views.cycle_edit(active, forward) {
        ed.views
            .set_active(next)
            .map_err(|_| CoreError::Precondition("cycle target vanished"))?;
    }
    Ok(())
}

pub(crate) fn next(ed: &mut Editor, _cctx: &mut CmdContext<'_>) -> Result<(), CoreError> {
    cycle(ed, true)
}

pub(crate) fn prev(ed: &mut Editor, _cctx: &mut CmdContext<'_>) -> Result<(), CoreError> {
    cycle(ed, false)
}

/// Request loop exit; unsaved buffers demand a yes/no confirmation first.
pub(crate) fn quit(ed: &mut Editor, cctx: &mut CmdContext<'_>) -> Result<(), CoreError> {
    let any_dirty = ed
        .views
        .iter()
        .any(|v| v.kind == ViewKind::Edit && v.buffer.is_dirty());
    if any_dirty {
        let answer = ed.prompt("Unsaved changes exist. Quit anyway?", PromptParams::yes_no())?;
        if answer.as_deref() != Some(PROMPT_YES) {
            return Ok(());
        }
    }
    cctx.loop_ctx.should_exit = true;
    Ok(())
}
