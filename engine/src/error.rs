use thiserror::Error;

use crate::UiCallKind;

/// Failure reported by an identify UI implementation.
///
/// The buffering layer never produces these itself; it hands back whatever
/// the underlying UI returned, unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UiError {
    #[error("UI rejected {operation}: {message}")]
    Rejected {
        operation: UiCallKind,
        message: String,
    },
    #[error("UI prompt canceled during {operation}")]
    Canceled { operation: UiCallKind },
    #[error("UI transport failed: {0}")]
    Transport(String),
}

impl UiError {
    pub fn rejected(operation: UiCallKind, message: impl Into<String>) -> Self {
        Self::Rejected {
            operation,
            message: message.into(),
        }
    }
}
