//! core-editor: the input dispatch and session orchestration engine.
//!
//! This crate hosts the editor's single-threaded cooperative core: the
//! reentrant event loop, the command registry with late-bound references,
//! macro recording/replay, the prompt/menu controller, and the async
//! multiplexer funneling subprocess output between loop turns. Keymap
//! storage and resolution live in `core-keymap`; views and geometry in
//! `core-model`; input acquisition in `core-input`.
//!
//! Concurrency model: all mutation happens on the main loop. The only
//! suspension points are the blocking input receive and the bounded select
//! inside the multiplexer. Worker threads (terminal reader, one pipe reader
//! per process) move bytes into channels and nothing else.

mod command;
mod commands;
mod config;
mod editor;
mod error;
mod loop_ctx;
mod macros;
mod mux;
mod prompt;
mod run;

pub use command::{CmdContext, CommandFn, CommandObserver, CommandRegistry};
pub use commands::*;
pub use config::{DEFAULT_KMAP, EditorConfig, LinenumType, SyntaxDef, SyntaxRule};
pub use editor::{
    Editor, KMAP_PROMPT_INPUT, KMAP_PROMPT_ISEARCH, KMAP_PROMPT_MENU, KMAP_PROMPT_OK,
    KMAP_PROMPT_PMENU, KMAP_PROMPT_YN, KMAP_PROMPT_YNA,
};
pub use error::CoreError;
pub use loop_ctx::{Completion, LoopCtx};
pub use macros::{Macro, MacroReplay};
pub use mux::{MUX_WAIT, MuxOutcome, ProcCallback, ProcEntry, ProcTable, ProcUpdate};
pub use prompt::{
    IsearchState, MAX_COMPLETION_STEM, PROMPT_ALL, PROMPT_NO, PROMPT_YES, PromptKind, PromptParams,
};
pub use run::LoopExit;
