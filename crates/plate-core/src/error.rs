//! Common error types for plate.
//!
//! Configuration problems are fatal at startup, so every variant here is
//! reported before any service record is created.

use std::path::PathBuf;

use thiserror::Error;

/// A result type using `ConfigError`.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors raised while loading or validating the service list.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("could not read '{path}': {source}")]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for the expected shape.
    #[error("could not parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A service references a kind with no known endpoint or argument mapping.
    #[error("unknown service type: {0}")]
    UnknownKind(String),

    /// A service descriptor has an invalid field.
    #[error("service #{index} ('{name}') is invalid: {reason}")]
    InvalidService {
        /// Position of the service in the configured list.
        index: usize,
        /// Configured service name.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Two services would share the same container name.
    #[error("duplicate service: '{0}' is configured more than once")]
    DuplicateResource(String),

    /// Two services bind the same host port.
    #[error("host port {port} is used by both '{first}' and '{second}'")]
    DuplicatePort {
        /// The contested host port.
        port: u16,
        /// Resource name of the first service using the port.
        first: String,
        /// Resource name of the second service using the port.
        second: String,
    },
}

impl ConfigError {
    /// Returns true if the error comes from the file itself rather than its content.
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Read { .. })
    }
}
