//! Types for the gateway crate.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Observed state of an existing container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerState {
    /// The container is up.
    Running,
    /// The container exists but is not running.
    Stopped,
}

impl ContainerState {
    /// Parse a container state from the docker `{{.State}}` column.
    ///
    /// Returns `None` for states plate does not know how to resume from.
    #[must_use]
    pub fn from_docker_state(state: &str) -> Option<Self> {
        match state {
            "running" => Some(Self::Running),
            "exited" | "created" | "dead" | "paused" => Some(Self::Stopped),
            _ => None,
        }
    }
}

/// Result of looking for an existing container by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inspection {
    /// A container with the resource name exists.
    Found {
        /// Container id.
        handle: String,
        /// Whether it is running.
        state: ContainerState,
    },
    /// No container exists, or the tool's answer could not be parsed.
    NotFound,
}

/// One external operation the lifecycle can ask for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Look for an existing container named after the service.
    Inspect,
    /// Check whether the service image is available locally.
    CheckImage,
    /// Pull the service image.
    Pull,
    /// Create and start a new container.
    Provision,
    /// Start an existing, stopped container.
    Resume {
        /// Container id.
        handle: String,
    },
    /// Stop a running container.
    Stop {
        /// Container id.
        handle: String,
    },
    /// Stop and remove a container.
    Remove {
        /// Container id.
        handle: String,
        /// Whether provisioning restarts once the container is gone.
        is_reset: bool,
    },
}

impl Command {
    /// Short label used in logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Inspect => "inspect",
            Self::CheckImage => "check-image",
            Self::Pull => "pull",
            Self::Provision => "provision",
            Self::Resume { .. } => "resume",
            Self::Stop { .. } => "stop",
            Self::Remove { is_reset: true, .. } => "remove(reset)",
            Self::Remove { is_reset: false, .. } => "remove(delete)",
        }
    }

    /// Returns true if the command mutates external resources.
    #[must_use]
    pub const fn is_mutating(&self) -> bool {
        !matches!(self, Self::Inspect | Self::CheckImage)
    }
}

/// Typed result of a [`Command`].
///
/// Failures carry the human-readable message that ends up in the record's
/// `last_error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Result of [`Command::Inspect`].
    Inspected(Inspection),
    /// Result of [`Command::CheckImage`].
    ImageChecked {
        /// Whether the image is available locally.
        present: bool,
    },
    /// Result of [`Command::Pull`].
    Pulled(Result<(), String>),
    /// Result of [`Command::Provision`]; carries the new container id.
    Provisioned(Result<String, String>),
    /// Result of [`Command::Resume`].
    Resumed(Result<(), String>),
    /// Result of [`Command::Stop`].
    Stopped(Result<(), String>),
    /// Result of [`Command::Remove`].
    Removed {
        /// Whether removal succeeded.
        result: Result<(), String>,
        /// Echoes the command's `is_reset` flag.
        is_reset: bool,
    },
}

impl CommandOutcome {
    /// The failure message, if this outcome is a failure.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Inspected(_) | Self::ImageChecked { .. } => None,
            Self::Provisioned(result) => result.as_ref().err().map(String::as_str),
            Self::Pulled(result) | Self::Resumed(result) | Self::Stopped(result) => {
                result.as_ref().err().map(String::as_str)
            }
            Self::Removed { result, .. } => result.as_ref().err().map(String::as_str),
        }
    }
}

/// Configuration for the docker gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Binary invoked for every command.
    #[serde(default = "GatewayConfig::default_docker_bin")]
    pub docker_bin: String,

    /// Deadline for every command except pulls, in seconds.
    #[serde(default = "GatewayConfig::default_command_timeout")]
    pub command_timeout_seconds: u64,

    /// Deadline for image pulls, in seconds.
    #[serde(default = "GatewayConfig::default_pull_timeout")]
    pub pull_timeout_seconds: u64,
}

impl GatewayConfig {
    fn default_docker_bin() -> String {
        "docker".to_string()
    }

    const fn default_command_timeout() -> u64 {
        120
    }

    const fn default_pull_timeout() -> u64 {
        600 // 10 minutes
    }

    /// Get the command timeout as a `Duration`.
    #[must_use]
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_seconds)
    }

    /// Get the pull timeout as a `Duration`.
    #[must_use]
    pub fn pull_timeout(&self) -> Duration {
        Duration::from_secs(self.pull_timeout_seconds)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            docker_bin: Self::default_docker_bin(),
            command_timeout_seconds: Self::default_command_timeout(),
            pull_timeout_seconds: Self::default_pull_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn docker_state_mapping() {
        assert_eq!(
            ContainerState::from_docker_state("running"),
            Some(ContainerState::Running)
        );
        assert_eq!(
            ContainerState::from_docker_state("exited"),
            Some(ContainerState::Stopped)
        );
        assert_eq!(
            ContainerState::from_docker_state("created"),
            Some(ContainerState::Stopped)
        );
        assert_eq!(ContainerState::from_docker_state("removing"), None);
        assert_eq!(ContainerState::from_docker_state(""), None);
    }

    #[test]
    fn mutating_commands() {
        assert!(!Command::Inspect.is_mutating());
        assert!(!Command::CheckImage.is_mutating());
        assert!(Command::Pull.is_mutating());
        assert!(Command::Stop {
            handle: "abc".to_string()
        }
        .is_mutating());
    }

    #[test]
    fn outcome_error_extraction() {
        assert_eq!(CommandOutcome::Pulled(Err("boom".to_string())).error(), Some("boom"));
        assert_eq!(CommandOutcome::Provisioned(Ok("id".to_string())).error(), None);
        assert_eq!(CommandOutcome::ImageChecked { present: false }.error(), None);
        assert_eq!(
            CommandOutcome::Removed {
                result: Err("in use".to_string()),
                is_reset: true
            }
            .error(),
            Some("in use")
        );
    }

    #[test]
    fn default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.docker_bin, "docker");
        assert_eq!(config.command_timeout(), Duration::from_secs(120));
        assert_eq!(config.pull_timeout(), Duration::from_secs(600));
    }
}
