//! Declarative service list.
//!
//! The file is a JSON object with a `services` array:
//!
//! ```json
//! {
//!   "services": [
//!     { "type": "postgres", "name": "main", "version": "16-alpine", "port": 5433 }
//!   ]
//! }
//! ```
//!
//! Parsing and validation are separate steps so that an unknown `type` is
//! reported as [`ConfigError::UnknownKind`] rather than as a JSON error.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{ConfigError, Result};
use crate::service::{ServiceConfig, ServiceKind};

/// File read when no path is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "plate.config.json";

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    services: Vec<RawService>,
}

#[derive(Debug, Deserialize)]
struct RawService {
    #[serde(rename = "type")]
    kind: String,
    name: String,
    version: String,
    port: u16,
}

/// The validated, ordered list of services.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlateConfig {
    /// Services in configured order. The position is the service's identity.
    pub services: Vec<ServiceConfig>,
}

impl PlateConfig {
    /// Read and validate a configuration file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Read` if the file cannot be read, and any parse
    /// or validation error from [`PlateConfig::from_json`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Parse and validate a configuration document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed JSON, `ConfigError::UnknownKind`
    /// for an unsupported service type, and the remaining variants for
    /// invalid or conflicting service descriptors.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawConfig = serde_json::from_str(json)?;
        Self::validate(raw)
    }

    fn validate(raw: RawConfig) -> Result<Self> {
        let mut services = Vec::with_capacity(raw.services.len());
        let mut names: HashMap<String, usize> = HashMap::new();
        let mut ports: HashMap<u16, String> = HashMap::new();

        for (index, entry) in raw.services.into_iter().enumerate() {
            let kind: ServiceKind = entry.kind.parse()?;
            let invalid = |reason: &str| ConfigError::InvalidService {
                index,
                name: entry.name.clone(),
                reason: reason.to_string(),
            };

            if !is_valid_name(&entry.name) {
                return Err(invalid(
                    "name must start with a letter or digit and contain only [a-zA-Z0-9_.-]",
                ));
            }
            if entry.version.trim().is_empty() {
                return Err(invalid("version must not be empty"));
            }
            if entry.port == 0 {
                return Err(invalid("port must be between 1 and 65535"));
            }

            let service = ServiceConfig::new(kind, entry.name, entry.version, entry.port);
            let resource = service.resource_name();

            if names.insert(resource.clone(), index).is_some() {
                return Err(ConfigError::DuplicateResource(resource));
            }
            if let Some(first) = ports.insert(service.port, resource.clone()) {
                return Err(ConfigError::DuplicatePort {
                    port: service.port,
                    first,
                    second: resource,
                });
            }

            services.push(service);
        }

        Ok(Self { services })
    }

    /// Number of configured services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Returns true if no services are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

/// Container names accept `[a-zA-Z0-9][a-zA-Z0-9_.-]*`.
fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphanumeric() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        }
        _ => false,
    }
}
