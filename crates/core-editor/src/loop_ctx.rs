//! Per-loop state. Every run of the event loop — the main one and each
//! nested prompt/menu loop — owns one of these; commands reach it through
//! their [`CmdContext`](crate::CmdContext).

use core_keymap::ResolveState;
use core_model::ViewId;

/// Tab-completion streak state: the snapshot stem, its candidates, and the
/// cycling index. Reset whenever `last_cmd` leaves the completion command.
#[derive(Debug, Clone, Default)]
pub struct Completion {
    pub term: String,
    pub candidates: Vec<String>,
    pub index: usize,
}

#[derive(Debug, Default)]
pub struct LoopCtx {
    /// View that was active when this loop started; restored on exit.
    pub invoker: Option<ViewId>,
    pub should_exit: bool,
    pub prompt_answer: Option<String>,
    /// Mid-chord resolver state: binding node, numeric buffer and parameters,
    /// wildcard parameters, need-more flag.
    pub resolve: ResolveState,
    /// Most recently executed command; drives repeat detection such as
    /// completion cycling.
    pub last_cmd: Option<String>,
    pub completion: Option<Completion>,
}

impl LoopCtx {
    pub fn new(invoker: Option<ViewId>) -> Self {
        Self {
            invoker,
            ..Self::default()
        }
    }
}
