//! Per-service state and the events that drive it.

use std::fmt;

use chrono::{DateTime, Utc};
use plate_core::ServiceConfig;
use plate_gateway::CommandOutcome;

/// Lifecycle state of a service record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LifecycleState {
    /// Nothing known yet, or the container was deleted.
    #[default]
    Pending,
    /// Looking for an existing container or a local image.
    Checking,
    /// Pulling the image.
    Downloading,
    /// Creating a new container.
    Starting,
    /// The container is up and the endpoint is usable.
    Running,
    /// The container exists but is not running.
    Stopped,
    /// Starting an existing container.
    Restarting,
    /// Removing the container before provisioning a fresh one.
    Resetting,
    /// Removing the container for good.
    Deleting,
    /// The last operation failed. Recoverable by boot or reset.
    Error,
}

impl LifecycleState {
    /// Returns true while the state is waiting on an external operation.
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(
            self,
            Self::Checking
                | Self::Downloading
                | Self::Starting
                | Self::Restarting
                | Self::Resetting
                | Self::Deleting
        )
    }

    /// Returns true if reset and delete may be requested from this state.
    #[must_use]
    pub const fn accepts_destructive(self) -> bool {
        matches!(self, Self::Running | Self::Stopped | Self::Error)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Checking => "checking",
            Self::Downloading => "downloading",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Restarting => "restarting",
            Self::Resetting => "resetting",
            Self::Deleting => "deleting",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// A destructive action that needs explicit approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PendingAction {
    /// Remove the container, then provision a fresh one.
    Reset,
    /// Remove the container and go back to `Pending`.
    Delete,
}

/// A destructive action awaiting y/n.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation {
    /// What will happen on confirm.
    pub action: PendingAction,
    /// State to go back to on cancel.
    pub restore: LifecycleState,
}

/// Authoritative state for one configured service.
///
/// Records are only mutated by [`crate::lifecycle::apply`], which keeps
/// the following invariants:
///
/// - `endpoint` is non-empty only while `state` is [`LifecycleState::Running`].
/// - `confirmation` is only set while `handle` is non-empty.
/// - `in_flight` is set from the moment a command is emitted until its
///   outcome has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRecord {
    /// The immutable service descriptor.
    pub config: ServiceConfig,
    /// Current lifecycle state.
    pub state: LifecycleState,
    /// Container id, empty when no container is known.
    pub handle: String,
    /// Connection string, empty unless running.
    pub endpoint: String,
    /// Failure detail from the last failed operation.
    pub last_error: Option<String>,
    /// Destructive action awaiting approval.
    pub confirmation: Option<Confirmation>,
    /// Whether a command has been issued and its outcome not yet applied.
    pub in_flight: bool,
    /// When `state` last changed.
    pub updated_at: DateTime<Utc>,
}

impl ServiceRecord {
    /// Create a new record in [`LifecycleState::Pending`].
    #[must_use]
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            config,
            state: LifecycleState::Pending,
            handle: String::new(),
            endpoint: String::new(),
            last_error: None,
            confirmation: None,
            in_flight: false,
            updated_at: Utc::now(),
        }
    }

    /// Returns true if a container id is known.
    #[must_use]
    pub fn has_handle(&self) -> bool {
        !self.handle.is_empty()
    }

    /// Returns true if the endpoint can be copied.
    #[must_use]
    pub fn can_copy(&self) -> bool {
        self.state == LifecycleState::Running && !self.endpoint.is_empty()
    }

    /// Returns true if the record should show progress.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.in_flight || self.state.is_transient()
    }
}

/// A user request targeting one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    /// Begin the startup sequence of a pending record.
    StartInspection,
    /// Stop a running container.
    Stop,
    /// Start (or re-provision) the service.
    Boot,
    /// Ask to reset the service.
    RequestReset,
    /// Ask to delete the service's container.
    RequestDelete,
    /// Approve the pending destructive action.
    Confirm,
    /// Reject the pending destructive action.
    Cancel,
}

impl Intent {
    /// Short label used in logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::StartInspection => "start-inspection",
            Self::Stop => "stop",
            Self::Boot => "boot",
            Self::RequestReset => "request-reset",
            Self::RequestDelete => "request-delete",
            Self::Confirm => "confirm",
            Self::Cancel => "cancel",
        }
    }

    /// Returns true for the two answers to a confirmation prompt.
    #[must_use]
    pub const fn is_answer(self) -> bool {
        matches!(self, Self::Confirm | Self::Cancel)
    }
}

/// Anything that can move a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A user request.
    Intent(Intent),
    /// The result of a previously emitted command.
    Outcome(CommandOutcome),
}

impl From<Intent> for Event {
    fn from(intent: Intent) -> Self {
        Self::Intent(intent)
    }
}

impl From<CommandOutcome> for Event {
    fn from(outcome: CommandOutcome) -> Self {
        Self::Outcome(outcome)
    }
}

#[cfg(test)]
mod tests {
    use plate_core::ServiceKind;

    use super::*;

    #[test]
    fn new_record_is_pending() {
        let record = ServiceRecord::new(ServiceConfig::new(ServiceKind::Redis, "cache", "7", 6379));
        assert_eq!(record.state, LifecycleState::Pending);
        assert!(!record.has_handle());
        assert!(!record.can_copy());
        assert!(!record.is_busy());
        assert!(record.confirmation.is_none());
    }

    #[test]
    fn transient_states() {
        assert!(LifecycleState::Checking.is_transient());
        assert!(LifecycleState::Deleting.is_transient());
        assert!(!LifecycleState::Running.is_transient());
        assert!(!LifecycleState::Error.is_transient());
        assert!(!LifecycleState::Pending.is_transient());
    }

    #[test]
    fn destructive_states() {
        assert!(LifecycleState::Running.accepts_destructive());
        assert!(LifecycleState::Stopped.accepts_destructive());
        assert!(LifecycleState::Error.accepts_destructive());
        assert!(!LifecycleState::Pending.accepts_destructive());
        assert!(!LifecycleState::Starting.accepts_destructive());
    }

    #[test]
    fn answers() {
        assert!(Intent::Confirm.is_answer());
        assert!(Intent::Cancel.is_answer());
        assert!(!Intent::Boot.is_answer());
    }
}
