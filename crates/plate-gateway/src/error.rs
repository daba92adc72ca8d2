//! Error types for the gateway crate.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while running an external command.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The command ran but returned a non-zero exit status.
    ///
    /// Displays the captured output verbatim so it can be shown to the user.
    #[error("{message}")]
    CommandFailed {
        /// The command line that failed.
        command: String,
        /// Captured output, or the exit status if there was none.
        message: String,
    },

    /// The command did not finish before its deadline.
    #[error("`{command}` timed out after {}s", timeout.as_secs())]
    Timeout {
        /// The command line that timed out.
        command: String,
        /// The deadline that expired.
        timeout: Duration,
    },

    /// The binary could not be executed (not in PATH, permission denied).
    #[error("failed to run `{command}`: {source}")]
    Exec {
        /// The command line that could not be spawned.
        command: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

impl GatewayError {
    /// Check if this error might go away by retrying the same command.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// The command line this error refers to.
    #[must_use]
    pub fn command(&self) -> &str {
        match self {
            Self::CommandFailed { command, .. }
            | Self::Timeout { command, .. }
            | Self::Exec { command, .. } => command,
        }
    }
}

/// A specialized Result type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;
