//! Cursor movement commands. Repeat counts come from the captured numeric
//! parameters; `move-relative` takes its direction from the binding's
//! static parameter, falling back to a captured wildcard keystroke
//! (`u`/`d`/`l`/`r`).

use core_text::Position;

use crate::command::CmdContext;
use crate::{CoreError, Editor};

#[derive(Debug, Clone, Copy)]
enum Dir {
    Up,
    Down,
    Left,
    Right,
}

fn direction(cctx: &CmdContext<'_>) -> Result<Dir, CoreError> {
    let from_param = cctx.static_param.as_deref().and_then(|p| match p {
        "up" => Some(Dir::Up),
        "down" => Some(Dir::Down),
        "left" => Some(Dir::Left),
        "right" => Some(Dir::Right),
        _ => None,
    });
    let from_wildcard = cctx
        .loop_ctx
        .resolve
        .wildcard_params
        .first()
        .and_then(|c| match c {
            'u' => Some(Dir::Up),
            'd' => Some(Dir::Down),
            'l' => Some(Dir::Left),
            'r' => Some(Dir::Right),
            _ => None,
        });
    from_param
        .or(from_wildcard)
        .ok_or(CoreError::Precondition("move-relative needs a direction"))
}

pub(crate) fn move_relative(ed: &mut Editor, cctx: &mut CmdContext<'_>) -> Result<(), CoreError> {
    let dir = direction(cctx)?;
    let count = cctx.repeat_count() as usize;
    let Some(view) = ed.views.get_mut(cctx.view) else {
        return Err(CoreError::Precondition("view closed during motion"));
    };
    let pos = view.cursor().pos;
    let target = match dir {
        Dir::Up => Position::new(pos.line.saturating_sub(count), pos.col),
        Dir::Down => Position::new(pos.line + count, pos.col),
        Dir::Left => Position::new(pos.line, pos.col.saturating_sub(count)),
        Dir::Right => Position::new(pos.line, pos.col + count),
    };
    view.move_cursor_to(target);
    Ok(())
}

pub(crate) fn move_bol(ed: &mut Editor, cctx: &mut CmdContext<'_>) -> Result<(), CoreError> {
    if let Some(view) = ed.views.get_mut(cctx.view) {
        let line = view.cursor().pos.line;
        view.move_cursor_to(Position::new(line, 0));
    }
    Ok(())
}

pub(crate) fn move_eol(ed: &mut Editor, cctx: &mut CmdContext<'_>) -> Result<(), CoreError> {
    if let Some(view) = ed.views.get_mut(cctx.view) {
        let line = view.cursor().pos.line;
        let eol = view.buffer.line_len(line);
        view.move_cursor_to(Position::new(line, eol));
    }
    Ok(())
}

fn move_page(ed: &mut Editor, cctx: &mut CmdContext<'_>, down: bool) -> Result<(), CoreError> {
    if let Some(view) = ed.views.get_mut(cctx.view) {
        let page = view.rect.h.max(1) as usize;
        let pos = view.cursor().pos;
        let line = if down {
            pos.line + page
        } else {
            pos.line.saturating_sub(page)
        };
        view.move_cursor_to(Position::new(line, pos.col));
        view.scroll_top = view
            .cursor()
            .pos
            .line
            .saturating_sub(view.rect.h.saturating_sub(1) as usize / 2);
    }
    Ok(())
}

pub(crate) fn move_page_up(ed: &mut Editor, cctx: &mut CmdContext<'_>) -> Result<(), CoreError> {
    move_page(ed, cctx, false)
}

pub(crate) fn move_page_down(ed: &mut Editor, cctx: &mut CmdContext<'_>) -> Result<(), CoreError> {
    move_page(ed, cctx, true)
}

/// Jump to the 1-based line named by the first numeric parameter.
pub(crate) fn move_to_line(ed: &mut Editor, cctx: &mut CmdContext<'_>) -> Result<(), CoreError> {
    let line = cctx.count().saturating_sub(1) as usize;
    if let Some(view) = ed.views.get_mut(cctx.view) {
        view.move_cursor_to(Position::new(line, 0));
    }
    Ok(())
}
