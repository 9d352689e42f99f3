//! Editor configuration. Everything here arrives through CLI/RC argv; the
//! core reads it, the binary fills it.

use std::path::PathBuf;

use core_keys::Keystroke;

/// Default keymap installed on fresh views.
pub const DEFAULT_KMAP: &str = "mle_normal";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinenumType {
    #[default]
    Absolute,
    Relative,
    Both,
}

/// One `-s` rule attached to the syntax definition being built. The rules
/// are stored for the highlight collaborator; the core does not evaluate
/// them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxRule {
    Range {
        start: String,
        end: String,
        fg: String,
        bg: String,
    },
    Single {
        regex: String,
        fg: String,
        bg: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxDef {
    pub name: String,
    pub path_pattern: String,
    pub rules: Vec<SyntaxRule>,
}

#[derive(Debug, Clone)]
pub struct EditorConfig {
    pub macro_toggle_key: Keystroke,
    pub initial_kmap: String,
    pub tab_width: u8,
    pub tab_to_space: bool,
    pub highlight_brackets: bool,
    pub color_column: Option<u16>,
    pub linenum_type: LinenumType,
    pub trim_paste: bool,
    /// Shell used for tab completion and async commands.
    pub shell: String,
    /// Filename-completion command; the quoted stem is appended.
    pub tab_complete_cmd: String,
    /// Directory-listing command backing the browse menu.
    pub browse_cmd: String,
    pub syntaxes: Vec<SyntaxDef>,
    pub syntax_override: Option<String>,
    /// User scripts named by `-x`; recorded for the scripting collaborator.
    pub scripts: Vec<PathBuf>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            macro_toggle_key: Keystroke::alt('r'),
            initial_kmap: DEFAULT_KMAP.to_string(),
            tab_width: 4,
            tab_to_space: true,
            highlight_brackets: false,
            color_column: None,
            linenum_type: LinenumType::default(),
            trim_paste: false,
            shell: "sh".to_string(),
            tab_complete_cmd: "compgen -f --".to_string(),
            browse_cmd: "ls -a1".to_string(),
            syntaxes: Vec::new(),
            syntax_override: None,
            scripts: Vec::new(),
        }
    }
}
