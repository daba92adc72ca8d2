//! Service lifecycle state machine.
//!
//! [`apply`] is the only function that changes a [`ServiceRecord`]. It takes
//! one event, updates the record in place, and returns at most one follow-up
//! command for the caller to issue. It performs no I/O.
//!
//! # State Machine
//!
//! ```text
//!   ┌─────────┐ start/boot ┌──────────┐ not found ┌──────────┐
//!   │ Pending │──────────▶│ Checking │──────────▶│ Checking │
//!   └─────────┘            └────┬─────┘           └────┬─────┘
//!        ▲              found   │          image absent │ image present
//!        │          ┌───────────┴───┐        ┌─────────┴──┐
//!        │          ▼               ▼        ▼            ▼
//!        │   ┌─────────┐     ┌──────────┐ ┌───────────┐ ┌──────────┐
//!        │   │ Stopped │     │ Running  │ │Downloading│─▶│ Starting │
//!        │   └────┬────┘     └────┬─────┘ └───────────┘ └────┬─────┘
//!        │        │ boot     ▲    │ stop (optimistic)        │
//!        │        ▼          │    ▼                          │
//!        │  ┌────────────┐   │ ┌─────────┐                   │
//!        │  │ Restarting │───┘ │ Stopped │◀──────────────────┘ provisioned
//!        │  └────────────┘     └─────────┘          (→ Running)
//!        │
//!        │   reset/delete from Running, Stopped or Error (after y/n):
//!        │   ┌───────────┐ removed  ┌──────────┐
//!        │   │ Resetting │────────▶│ Checking │
//!        │   └───────────┘          └──────────┘
//!        │   ┌───────────┐ removed
//!        └───│ Deleting  │
//!            └───────────┘
//!
//!   Any failed operation moves the record to Error.
//! ```

use chrono::Utc;
use plate_gateway::{Command, CommandOutcome, ContainerState, Inspection};
use tracing::debug;

use crate::record::{
    Confirmation, Event, Intent, LifecycleState, PendingAction, ServiceRecord,
};

/// Why an intent had no effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// A command for the record is still in flight.
    Busy,
    /// A confirmation is pending; only confirm/cancel are accepted.
    AwaitingConfirmation,
    /// Confirm or cancel without a pending confirmation.
    NoConfirmation,
    /// The intent needs a container and none is known.
    MissingHandle,
    /// The intent does nothing in the current state.
    NotApplicable,
    /// The dispatcher is shutting down.
    Draining,
}

/// The effect of applying one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The record changed state (possibly to the same state).
    Moved {
        /// State before the event.
        from: LifecycleState,
        /// State after the event.
        to: LifecycleState,
        /// Follow-up command to issue.
        command: Option<Command>,
    },
    /// A destructive action now awaits approval.
    Confirming(PendingAction),
    /// A pending confirmation was rejected.
    Cancelled {
        /// The state the record is back in.
        restored: LifecycleState,
    },
    /// The intent was not applicable.
    Ignored(IgnoreReason),
    /// The outcome did not match the record's state and was dropped.
    Stale,
}

impl Transition {
    /// The follow-up command, if any.
    #[must_use]
    pub const fn command(&self) -> Option<&Command> {
        match self {
            Self::Moved { command, .. } => command.as_ref(),
            _ => None,
        }
    }

    /// Take the follow-up command, if any.
    #[must_use]
    pub fn into_command(self) -> Option<Command> {
        match self {
            Self::Moved { command, .. } => command,
            _ => None,
        }
    }

    /// The state the record ended up in, if it moved.
    #[must_use]
    pub const fn target(&self) -> Option<LifecycleState> {
        match self {
            Self::Moved { to, .. } => Some(*to),
            Self::Cancelled { restored } => Some(*restored),
            _ => None,
        }
    }
}

/// Apply one event to a record.
pub fn apply(record: &mut ServiceRecord, event: Event) -> Transition {
    match event {
        Event::Intent(intent) => apply_intent(record, intent),
        Event::Outcome(outcome) => apply_outcome(record, outcome),
    }
}

fn apply_intent(record: &mut ServiceRecord, intent: Intent) -> Transition {
    use LifecycleState::{Checking, Error, Pending, Restarting, Running, Stopped};

    if record.in_flight {
        return Transition::Ignored(IgnoreReason::Busy);
    }

    if let Some(confirmation) = record.confirmation {
        return match intent {
            Intent::Confirm => confirm(record, confirmation),
            Intent::Cancel => {
                record.confirmation = None;
                record.state = confirmation.restore;
                Transition::Cancelled {
                    restored: confirmation.restore,
                }
            }
            _ => Transition::Ignored(IgnoreReason::AwaitingConfirmation),
        };
    }

    let has_handle = record.has_handle();
    match (record.state, intent) {
        (_, Intent::Confirm | Intent::Cancel) => Transition::Ignored(IgnoreReason::NoConfirmation),

        (Pending, Intent::StartInspection | Intent::Boot) => {
            move_to(record, Checking, Some(Command::Inspect))
        }

        (Running, Intent::Stop) if has_handle => {
            let handle = record.handle.clone();
            move_to(record, Stopped, Some(Command::Stop { handle }))
        }

        (Stopped | Error, Intent::Boot) if has_handle => {
            let handle = record.handle.clone();
            move_to(record, Restarting, Some(Command::Resume { handle }))
        }
        (Stopped | Error, Intent::Boot) => move_to(record, Checking, Some(Command::Inspect)),

        (state, Intent::RequestReset | Intent::RequestDelete)
            if has_handle && state.accepts_destructive() =>
        {
            let action = if intent == Intent::RequestReset {
                PendingAction::Reset
            } else {
                PendingAction::Delete
            };
            record.confirmation = Some(Confirmation {
                action,
                restore: state,
            });
            Transition::Confirming(action)
        }

        (_, Intent::Stop | Intent::RequestReset | Intent::RequestDelete) if !has_handle => {
            Transition::Ignored(IgnoreReason::MissingHandle)
        }

        _ => Transition::Ignored(IgnoreReason::NotApplicable),
    }
}

fn confirm(record: &mut ServiceRecord, confirmation: Confirmation) -> Transition {
    record.confirmation = None;
    let handle = record.handle.clone();
    match confirmation.action {
        PendingAction::Reset => move_to(
            record,
            LifecycleState::Resetting,
            Some(Command::Remove {
                handle,
                is_reset: true,
            }),
        ),
        PendingAction::Delete => move_to(
            record,
            LifecycleState::Deleting,
            Some(Command::Remove {
                handle,
                is_reset: false,
            }),
        ),
    }
}

fn apply_outcome(record: &mut ServiceRecord, outcome: CommandOutcome) -> Transition {
    use CommandOutcome as O;
    use LifecycleState::{
        Checking, Deleting, Downloading, Pending, Resetting, Restarting, Running, Starting,
        Stopped,
    };

    record.in_flight = false;

    match (record.state, outcome) {
        (Checking, O::Inspected(Inspection::Found { handle, state })) => {
            record.handle = handle;
            let to = match state {
                ContainerState::Running => Running,
                ContainerState::Stopped => Stopped,
            };
            move_to(record, to, None)
        }
        (Checking, O::Inspected(Inspection::NotFound)) => {
            move_to(record, Checking, Some(Command::CheckImage))
        }
        (Checking, O::ImageChecked { present: true }) | (Downloading, O::Pulled(Ok(()))) => {
            move_to(record, Starting, Some(Command::Provision))
        }
        (Checking, O::ImageChecked { present: false }) => {
            move_to(record, Downloading, Some(Command::Pull))
        }
        (Starting, O::Provisioned(Ok(handle))) => {
            record.handle = handle;
            move_to(record, Running, None)
        }
        (Restarting, O::Resumed(Ok(()))) => move_to(record, Running, None),
        (Stopped, O::Stopped(Ok(()))) => move_to(record, Stopped, None),
        (
            Resetting,
            O::Removed {
                result: Ok(()),
                is_reset: true,
            },
        ) => {
            record.handle.clear();
            move_to(record, Checking, Some(Command::CheckImage))
        }
        (
            Deleting,
            O::Removed {
                result: Ok(()),
                is_reset: false,
            },
        ) => {
            record.handle.clear();
            move_to(record, Pending, None)
        }

        (Downloading, O::Pulled(Err(message)))
        | (Starting, O::Provisioned(Err(message)))
        | (Restarting, O::Resumed(Err(message)))
        | (Stopped, O::Stopped(Err(message)))
        | (
            Resetting,
            O::Removed {
                result: Err(message),
                is_reset: true,
            },
        )
        | (
            Deleting,
            O::Removed {
                result: Err(message),
                is_reset: false,
            },
        ) => {
            let transition = move_to(record, LifecycleState::Error, None);
            record.last_error = Some(message);
            transition
        }

        (state, outcome) => {
            debug!(
                resource = %record.config.resource_name(),
                %state,
                ?outcome,
                "Dropping stale outcome"
            );
            Transition::Stale
        }
    }
}

/// Enter `to`, keeping the endpoint and error invariants.
fn move_to(
    record: &mut ServiceRecord,
    to: LifecycleState,
    command: Option<Command>,
) -> Transition {
    let from = record.state;
    record.state = to;
    record.updated_at = Utc::now();
    record.in_flight = command.is_some();

    if to == LifecycleState::Running {
        record.endpoint = record.config.endpoint();
    } else {
        record.endpoint.clear();
    }
    if to != LifecycleState::Error {
        record.last_error = None;
    }

    debug!(
        resource = %record.config.resource_name(),
        %from,
        %to,
        command = command.as_ref().map(Command::label),
        "Transition"
    );

    Transition::Moved { from, to, command }
}
