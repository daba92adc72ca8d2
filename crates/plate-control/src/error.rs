//! Error types for the control layer.

use thiserror::Error;

/// A result type using `ControlError`.
pub type Result<T> = std::result::Result<T, ControlError>;

/// Errors that can occur while dispatching events.
#[derive(Debug, Error)]
pub enum ControlError {
    /// An intent or completion referred to an index with no record.
    #[error("no service at index {index} (have {len})")]
    NoSuchService {
        /// The index that was requested.
        index: usize,
        /// Number of records the dispatcher owns.
        len: usize,
    },

    /// The shutdown driver went away before reporting.
    #[error("shutdown coordinator exited without a report")]
    ShutdownInterrupted,
}

impl ControlError {
    /// Returns true if the error is caused by the caller rather than by the
    /// coordinator itself.
    #[must_use]
    pub const fn is_caller_error(&self) -> bool {
        matches!(self, Self::NoSuchService { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let err = ControlError::NoSuchService { index: 4, len: 2 };
        assert_eq!(err.to_string(), "no service at index 4 (have 2)");
        assert!(err.is_caller_error());
        assert!(!ControlError::ShutdownInterrupted.is_caller_error());
    }
}
