//! Configuration error types

use thiserror::Error;

use crate::selection::SelectionMode;

/// Errors raised while building a controller from its configuration
///
/// Runtime misuse (unknown ids, `open_all` in single mode, navigating an
/// empty registry) is never an error; those calls are silent no-ops.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A default or controlled value does not match the selection mode
    #[error("selection value shape `{found:?}` does not match mode `{mode:?}`")]
    ValueShape {
        mode: SelectionMode,
        found: SelectionMode,
    },

    /// An easing name could not be parsed
    #[error("unknown easing `{0}`")]
    Easing(String),
}

/// Result type for configuration
pub type Result<T> = std::result::Result<T, ConfigError>;
