#![forbid(unsafe_code)]

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RelayError>;

/// Errors surfaced by the library itself.
///
/// Pulse-level failures produced by [`Channel::try_map`](crate::Channel::try_map)
/// carry the caller's own error type and never appear here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("cannot register a receiver while the queue is dispatching (depth={depth})")]
    AddDuringDispatch { depth: usize },

    #[error("value {value} cannot be represented as {target}")]
    NumericCoercion { value: String, target: &'static str },

    #[error("invalid queue configuration: {message}")]
    InvalidConfig { message: String },
}

impl RelayError {
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Whether this error reports API misuse rather than a data problem.
    #[must_use]
    pub fn is_misuse(&self) -> bool {
        matches!(self, Self::AddDuringDispatch { .. })
    }
}
