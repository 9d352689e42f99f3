//! Text mutation commands.

use crate::command::CmdContext;
use crate::{CoreError, Editor};

pub(crate) fn insert_data(ed: &mut Editor, cctx: &mut CmdContext<'_>) -> Result<(), CoreError> {
    let mut text = String::new();
    let c = cctx.input.codepoint();
    if c != '\0' {
        text.push(c);
    }
    if let Some(paste) = &cctx.paste {
        text.push_str(paste);
    }
    if text.is_empty() {
        return Ok(());
    }
    if cctx.paste.is_some() && ed.config.trim_paste {
        text = text
            .split('\n')
            .map(str::trim_end)
            .collect::<Vec<_>>()
            .join("\n");
    }
    if ed.config.tab_to_space && text.contains('\t') {
        text = text.replace('\t', &" ".repeat(ed.config.tab_width as usize));
    }
    let Some(view) = ed.views.get_mut(cctx.view) else {
        return Err(CoreError::Precondition("view closed during insert"));
    };
    let pos = view.cursor().pos;
    let after = view.buffer.insert(pos, &text);
    view.cursor_mut().pos = after;
    Ok(())
}

pub(crate) fn insert_newline(ed: &mut Editor, cctx: &mut CmdContext<'_>) -> Result<(), CoreError> {
    let Some(view) = ed.views.get_mut(cctx.view) else {
        return Err(CoreError::Precondition("view closed during insert"));
    };
    let pos = view.cursor().pos;
    let after = view.buffer.split_line(pos);
    view.cursor_mut().pos = after;
    Ok(())
}

pub(crate) fn delete_before(ed: &mut Editor, cctx: &mut CmdContext<'_>) -> Result<(), CoreError> {
    let Some(view) = ed.views.get_mut(cctx.view) else {
        return Err(CoreError::Precondition("view closed during delete"));
    };
    let pos = view.cursor().pos;
    let after = view.buffer.delete_before(pos);
    view.cursor_mut().pos = after;
    Ok(())
}

pub(crate) fn delete_after(ed: &mut Editor, cctx: &mut CmdContext<'_>) -> Result<(), CoreError> {
    let Some(view) = ed.views.get_mut(cctx.view) else {
        return Err(CoreError::Precondition("view closed during delete"));
    };
    let pos = view.cursor().pos;
    view.buffer.delete_at(pos);
    Ok(())
}

/// Copy the addressed span into the paste register. The unit comes from the
/// binding's static parameter: `word`, `line`, or `bracket`.
pub(crate) fn copy_by(ed: &mut Editor, cctx: &mut CmdContext<'_>) -> Result<(), CoreError> {
    let unit = cctx.static_param.clone().unwrap_or_default();
    let Some(view) = ed.views.get(cctx.view) else {
        return Err(CoreError::Precondition("view closed during copy"));
    };
    let pos = view.cursor().pos;
    let copied = match unit.as_str() {
        "word" => view.buffer.word_at(pos),
        "line" => view.buffer.line(pos.line).map(str::to_string),
        "bracket" => view
            .buffer
            .line(pos.line)
            .and_then(|line| bracket_span(line, pos.col)),
        other => {
            return Err(CoreError::Config(format!("copy-by: unknown unit `{other}`")));
        }
    };
    if let Some(text) = copied {
        let chars = text.chars().count();
        ed.paste_register = text;
        ed.set_status(format!("copied {chars} chars"));
    }
    Ok(())
}

/// Innermost bracket pair on the line enclosing `col`, contents included.
fn bracket_span(line: &str, col: usize) -> Option<String> {
    let chars: Vec<char> = line.chars().collect();
    let mut stack: Vec<(usize, char)> = Vec::new();
    let mut best: Option<(usize, usize)> = None;
    for (i, &c) in chars.iter().enumerate() {
        match c {
            '(' | '[' | '{' => stack.push((i, c)),
            ')' | ']' | '}' => {
                let open = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                if let Some((start, _)) = stack.pop_if(|(_, o)| *o == open)
                    && start <= col
                    && col <= i
                {
                    // Innermost pair wins: later qualifying pairs start later.
                    if best.is_none_or(|(s, _)| start >= s) {
                        best = Some((start, i));
                    }
                }
            }
            _ => {}
        }
    }
    best.map(|(s, e)| chars[s..=e].iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bracket_span_picks_innermost() {
        let line = "fn f(a, (b, c), d)";
        assert_eq!(bracket_span(line, 10).as_deref(), Some("(b, c)"));
        assert_eq!(bracket_span(line, 5).as_deref(), Some("(a, (b, c), d)"));
        assert_eq!(bracket_span(line, 1), None);
    }
}
