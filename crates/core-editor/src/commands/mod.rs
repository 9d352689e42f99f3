//! Builtin commands, decomposed by concern:
//! * `edit`   - text insertion/deletion and copy-by
//! * `motion` - cursor movement
//! * `view`   - splits, close/cycle, quit
//! * `proc`   - shell/browse async commands
//! * `macros` - macro replay and the record toggle
//! * `prompt` - the fixed prompt/menu/isearch command contract
//!
//! Dispatch resolves names through [`builtin`]; the registry memoizes the
//! function pointer on first use, so keymaps may name any of these before
//! startup wiring completes.

use crate::command::CommandFn;

mod edit;
mod macros;
mod motion;
mod proc;
mod prompt;
mod view;

pub const CMD_INSERT_DATA: &str = "insert-data";
pub const CMD_INSERT_NEWLINE: &str = "insert-newline";
pub const CMD_DELETE_BEFORE: &str = "delete-before";
pub const CMD_DELETE_AFTER: &str = "delete-after";
pub const CMD_COPY_BY: &str = "copy-by";

pub const CMD_MOVE_RELATIVE: &str = "move-relative";
pub const CMD_MOVE_BOL: &str = "move-bol";
pub const CMD_MOVE_EOL: &str = "move-eol";
pub const CMD_MOVE_PAGE_UP: &str = "move-page-up";
pub const CMD_MOVE_PAGE_DOWN: &str = "move-page-down";
pub const CMD_MOVE_TO_LINE: &str = "move-to-line";

pub const CMD_VIEW_SPLIT_HORIZONTAL: &str = "view-split-horizontal";
pub const CMD_VIEW_SPLIT_VERTICAL: &str = "view-split-vertical";
pub const CMD_VIEW_CLOSE: &str = "view-close";
pub const CMD_VIEW_NEXT: &str = "view-next";
pub const CMD_VIEW_PREV: &str = "view-prev";
pub const CMD_QUIT: &str = "quit";

pub const CMD_BROWSE: &str = "browse";
pub const CMD_BROWSE_OPEN: &str = "browse-open";
pub const CMD_SHELL: &str = "shell";

pub const CMD_MACRO_REPLAY: &str = "macro-replay";
pub const CMD_MACRO_RECORD_TOGGLE: &str = "macro-record-toggle";

pub const CMD_SEARCH: &str = "search";
pub const CMD_PROMPT_SUBMIT: &str = "prompt-submit";
pub const CMD_PROMPT_CANCEL: &str = "prompt-cancel";
pub const CMD_PROMPT_YES: &str = "prompt-yes";
pub const CMD_PROMPT_NO: &str = "prompt-no";
pub const CMD_PROMPT_ALL: &str = "prompt-all";
pub const CMD_PROMPT_OK: &str = "prompt-ok";
pub const CMD_PROMPT_TAB_COMPLETE: &str = "prompt-tab-complete";
pub const CMD_MENU_SUBMIT: &str = "menu-submit";
pub const CMD_MENU_CANCEL: &str = "menu-cancel";
pub const CMD_PMENU_SUBMIT: &str = "pmenu-submit";
pub const CMD_ISEARCH_REFRESH: &str = "isearch-refresh";
pub const CMD_ISEARCH_NEXT: &str = "isearch-next";
pub const CMD_ISEARCH_PREV: &str = "isearch-prev";
pub const CMD_ISEARCH_DROP_CURSORS: &str = "isearch-drop-cursors";

/// Builtin lookup backing the registry's late binding.
pub(crate) fn builtin(name: &str) -> Option<CommandFn> {
    let func: CommandFn = match name {
        CMD_INSERT_DATA => edit::insert_data,
        CMD_INSERT_NEWLINE => edit::insert_newline,
        CMD_DELETE_BEFORE => edit::delete_before,
        CMD_DELETE_AFTER => edit::delete_after,
        CMD_COPY_BY => edit::copy_by,
        CMD_MOVE_RELATIVE => motion::move_relative,
        CMD_MOVE_BOL => motion::move_bol,
        CMD_MOVE_EOL => motion::move_eol,
        CMD_MOVE_PAGE_UP => motion::move_page_up,
        CMD_MOVE_PAGE_DOWN => motion::move_page_down,
        CMD_MOVE_TO_LINE => motion::move_to_line,
        CMD_VIEW_SPLIT_HORIZONTAL => view::split_horizontal,
        CMD_VIEW_SPLIT_VERTICAL => view::split_vertical,
        CMD_VIEW_CLOSE => view::close,
        CMD_VIEW_NEXT => view::next,
        CMD_VIEW_PREV => view::prev,
        CMD_QUIT => view::quit,
        CMD_BROWSE => proc::browse,
        CMD_BROWSE_OPEN => proc::browse_open,
        CMD_SHELL => proc::shell,
        CMD_MACRO_REPLAY => macros::replay,
        CMD_MACRO_RECORD_TOGGLE => macros::record_toggle,
        CMD_SEARCH => prompt::search,
        CMD_PROMPT_SUBMIT => prompt::submit,
        CMD_PROMPT_CANCEL => prompt::cancel,
        CMD_PROMPT_YES => prompt::yes,
        CMD_PROMPT_NO => prompt::no,
        CMD_PROMPT_ALL => prompt::all,
        CMD_PROMPT_OK => prompt::ok,
        CMD_PROMPT_TAB_COMPLETE => prompt::tab_complete,
        CMD_MENU_SUBMIT => prompt::menu_submit,
        CMD_MENU_CANCEL => prompt::menu_cancel,
        CMD_PMENU_SUBMIT => prompt::pmenu_submit,
        CMD_ISEARCH_REFRESH => prompt::isearch_refresh,
        CMD_ISEARCH_NEXT => prompt::isearch_next,
        CMD_ISEARCH_PREV => prompt::isearch_prev,
        CMD_ISEARCH_DROP_CURSORS => prompt::isearch_drop_cursors,
        _ => return None,
    };
    Some(func)
}
