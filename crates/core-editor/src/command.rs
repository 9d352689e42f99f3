//! Late-bound command references and the editor-wide command registry.
//!
//! Keymaps may name commands before any function is registered (CLI keymap
//! definitions parse before startup wiring completes), so a command
//! reference is `(name, fn?, init?)` and the function pointer is memoized on
//! first dispatch: an unset slot is filled from the builtin table, and a
//! name that is still unresolvable reports a configuration error. The init
//! hook, when present, runs once before the command's first execution.

use std::collections::HashMap;

use core_keys::Keystroke;
use core_model::ViewId;

use crate::{CoreError, Editor, LoopCtx, commands};

pub type CommandFn = fn(&mut Editor, &mut CmdContext<'_>) -> Result<(), CoreError>;

/// Ephemeral per-dispatch bundle handed to the command function together
/// with the editor itself.
pub struct CmdContext<'a> {
    pub view: ViewId,
    pub input: Keystroke,
    pub static_param: Option<String>,
    pub loop_ctx: &'a mut LoopCtx,
    /// Collected burst of keystrokes from paste ingestion.
    pub paste: Option<String>,
    pub is_user_input: bool,
}

impl CmdContext<'_> {
    /// First captured numeric parameter, defaulting to 1. Used where the
    /// parameter is an absolute value (goto-line).
    pub fn count(&self) -> u32 {
        self.loop_ctx
            .resolve
            .numeric_params
            .first()
            .copied()
            .unwrap_or(1)
    }

    /// Product of every captured numeric parameter, defaulting to 1. Used
    /// where the parameters compose into a repeat count (relative motion).
    pub fn repeat_count(&self) -> u32 {
        self.loop_ctx
            .resolve
            .numeric_params
            .iter()
            .fold(1u32, |acc, n| acc.saturating_mul(*n))
    }
}

/// Observes every executed command; used by tests and tooling.
pub trait CommandObserver {
    fn on_command(&mut self, name: &str, ctx: &CmdContext<'_>);
}

#[derive(Debug, Default)]
pub struct CommandDef {
    pub name: String,
    func: Option<CommandFn>,
    init: Option<CommandFn>,
    init_pending: bool,
}

impl CommandDef {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            func: None,
            init: None,
            init_pending: false,
        }
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.map.len())
            .finish()
    }
}

#[derive(Default)]
pub struct CommandRegistry {
    map: HashMap<String, CommandDef>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function for `name`, creating or completing the entry.
    pub fn register(&mut self, name: &str, func: CommandFn) {
        let def = self
            .map
            .entry(name.to_string())
            .or_insert_with(|| CommandDef::named(name));
        def.func = Some(func);
    }

    /// Accept a name with no function yet; dispatch resolves it later.
    pub fn register_late(&mut self, name: &str) {
        self.map
            .entry(name.to_string())
            .or_insert_with(|| CommandDef::named(name));
    }

    pub fn set_init(&mut self, name: &str, init: CommandFn) {
        let def = self
            .map
            .entry(name.to_string())
            .or_insert_with(|| CommandDef::named(name));
        def.init = Some(init);
        def.init_pending = true;
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    /// Fetch the function for `name`, memoizing from the builtin table on
    /// first use. Also returns the init hook exactly once.
    pub fn resolve(
        &mut self,
        name: &str,
    ) -> Result<(CommandFn, Option<CommandFn>), CoreError> {
        let def = self
            .map
            .entry(name.to_string())
            .or_insert_with(|| CommandDef::named(name));
        if def.func.is_none() {
            def.func = commands::builtin(name);
        }
        let func = def
            .func
            .ok_or_else(|| CoreError::Config(format!("unknown command `{name}`")))?;
        let init = if def.init_pending {
            def.init_pending = false;
            def.init
        } else {
            None
        };
        Ok((func, init))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nop(_: &mut Editor, _: &mut CmdContext<'_>) -> Result<(), CoreError> {
        Ok(())
    }

    #[test]
    fn late_bound_name_memoizes_builtin() {
        let mut reg = CommandRegistry::new();
        reg.register_late("insert-data");
        let (f1, _) = reg.resolve("insert-data").unwrap();
        let (f2, _) = reg.resolve("insert-data").unwrap();
        assert!(std::ptr::fn_addr_eq(f1, f2));
    }

    #[test]
    fn unknown_name_is_config_error() {
        let mut reg = CommandRegistry::new();
        assert!(matches!(
            reg.resolve("no-such-command"),
            Err(CoreError::Config(_))
        ));
    }

    #[test]
    fn init_hook_fires_exactly_once() {
        let mut reg = CommandRegistry::new();
        reg.register("custom", nop);
        reg.set_init("custom", nop);
        let (_, init) = reg.resolve("custom").unwrap();
        assert!(init.is_some());
        let (_, init) = reg.resolve("custom").unwrap();
        assert!(init.is_none());
    }
}
