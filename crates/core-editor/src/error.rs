//! Core error taxonomy. Every failure is one of: configuration (malformed
//! definitions, unknown names), state precondition (caller error), or
//! resource (subprocess / IO trouble). The loop never aborts on a
//! per-command failure; errors are logged and surfaced on the status bar.

use core_keymap::KeymapError;
use core_keys::KeyParseError;
use core_proc::ProcError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("config: {0}")]
    Config(String),
    #[error("{0}")]
    Precondition(&'static str),
    #[error("resource: {0}")]
    Resource(String),
}

impl From<KeymapError> for CoreError {
    fn from(e: KeymapError) -> Self {
        CoreError::Config(e.to_string())
    }
}

impl From<KeyParseError> for CoreError {
    fn from(e: KeyParseError) -> Self {
        CoreError::Config(e.to_string())
    }
}

impl From<ProcError> for CoreError {
    fn from(e: ProcError) -> Self {
        CoreError::Resource(e.to_string())
    }
}

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::Resource(e.to_string())
    }
}
