//! Macro commands: replay selection and the record toggle.

use crate::command::CmdContext;
use crate::{CoreError, Editor};

/// Pick a registered macro from a prompt-menu and replay it.
pub(crate) fn replay(ed: &mut Editor, _cctx: &mut CmdContext<'_>) -> Result<(), CoreError> {
    if ed.macros.is_empty() {
        ed.set_status("no macros recorded");
        return Ok(());
    }
    let mut names: Vec<&str> = ed.macros.keys().map(String::as_str).collect();
    names.sort_unstable();
    let listing = names.join("\n");
    let Some(choice) = ed.prompt_menu("macros", &listing)? else {
        return Ok(());
    };
    let name = choice.trim().to_string();
    if name.is_empty() {
        return Ok(());
    }
    ed.start_replay(&name)
}

/// Same behavior as the configured toggle keystroke, reachable as a command.
pub(crate) fn record_toggle(ed: &mut Editor, _cctx: &mut CmdContext<'_>) -> Result<(), CoreError> {
    ed.toggle_macro_recording()
}
