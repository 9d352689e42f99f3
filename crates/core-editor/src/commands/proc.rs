//! Async-process commands: the browse menu and shell output capture.

use std::path::{Path, PathBuf};

use crate::command::CmdContext;
use crate::commands::CMD_BROWSE_OPEN;
use crate::prompt::PromptParams;
use crate::{CoreError, Editor};

impl Editor {
    /// Open a MENU view listing `dir`, populated asynchronously by the
    /// configured listing command.
    pub fn browse_dir(&mut self, dir: &Path) -> Result<(), CoreError> {
        let cmdline = format!(
            "cd {} && {}",
            shell_quote(&dir.display().to_string()),
            self.config.browse_cmd
        );
        let title = format!("browse:{}", dir.display());
        let id = self.open_menu(&title, CMD_BROWSE_OPEN, Some(&cmdline))?;
        if let Some(view) = self.views.get_mut(id) {
            view.buffer.path = Some(dir.to_path_buf());
        }
        Ok(())
    }
}

pub(crate) fn browse(ed: &mut Editor, _cctx: &mut CmdContext<'_>) -> Result<(), CoreError> {
    ed.browse_dir(Path::new("."))
}

/// Menu callback for browse: open the selected entry, descending into
/// directories by reopening the menu.
pub(crate) fn browse_open(ed: &mut Editor, cctx: &mut CmdContext<'_>) -> Result<(), CoreError> {
    let Some(line) = cctx.static_param.as_deref().map(str::trim) else {
        return Ok(());
    };
    if line.is_empty() {
        return Ok(());
    }
    let base = ed
        .views
        .get(cctx.view)
        .and_then(|v| v.buffer.path.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    let target = base.join(line);

    ed.procs.mark_view_done(cctx.view);
    ed.views.close(cctx.view);

    if target.is_dir() {
        ed.browse_dir(&target)
    } else {
        ed.open_file(&target, None);
        Ok(())
    }
}

/// Prompt for a command line and stream its output into the invoking view.
pub(crate) fn shell(ed: &mut Editor, cctx: &mut CmdContext<'_>) -> Result<(), CoreError> {
    let Some(cmdline) = ed.prompt("shell:", PromptParams::input())? else {
        return Ok(());
    };
    if cmdline.trim().is_empty() {
        return Ok(());
    }
    ed.spawn_view_proc(cctx.view, &cmdline, None)?;
    Ok(())
}

pub(crate) fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_escapes_single_quotes() {
        assert_eq!(shell_quote("a b"), "'a b'");
        assert_eq!(shell_quote("o'brien"), "'o'\\''brien'");
    }
}
