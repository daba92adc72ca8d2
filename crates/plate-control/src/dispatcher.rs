//! The dispatcher owns every [`ServiceRecord`] and drives the lifecycle.
//!
//! Events reach the dispatcher from two places: user intents, delivered by
//! the UI through [`Dispatcher::handle_intent`], and command completions,
//! received with [`Dispatcher::next_completion`] and applied with
//! [`Dispatcher::apply`]. Every follow-up command runs on its own tokio task
//! and reports back through an unbounded channel, tagged with the index of
//! the record that issued it. Tasks never touch records.

use std::sync::Arc;

use plate_core::ServiceConfig;
use plate_gateway::{run_command, Command, CommandGateway, CommandOutcome};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::{ControlError, Result};
use crate::lifecycle::{self, IgnoreReason, Transition};
use crate::record::{Event, Intent, LifecycleState, ServiceRecord};
use crate::shutdown::{self, ShutdownHandle, ShutdownTarget};

/// The result of one command, routed back to the record that issued it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Index of the issuing record.
    pub index: usize,
    /// What the command produced.
    pub outcome: CommandOutcome,
}

/// Owner of all service records.
pub struct Dispatcher<G: CommandGateway + 'static> {
    records: Vec<ServiceRecord>,
    gateway: Arc<G>,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
    draining: bool,
}

impl<G: CommandGateway + 'static> Dispatcher<G> {
    /// Create a dispatcher with one `Pending` record per service.
    #[must_use]
    pub fn new(services: Vec<ServiceConfig>, gateway: Arc<G>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            records: services.into_iter().map(ServiceRecord::new).collect(),
            gateway,
            tx,
            rx,
            draining: false,
        }
    }

    /// All records, in configured order.
    #[must_use]
    pub fn records(&self) -> &[ServiceRecord] {
        &self.records
    }

    /// The record at `index`.
    #[must_use]
    pub fn record(&self, index: usize) -> Option<&ServiceRecord> {
        self.records.get(index)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no services are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns true once [`Dispatcher::begin_shutdown`] has been called.
    #[must_use]
    pub const fn is_draining(&self) -> bool {
        self.draining
    }

    /// Number of records with a command in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.records.iter().filter(|r| r.in_flight).count()
    }

    /// Kick off inspection of every pending record.
    ///
    /// Returns the number of inspections issued.
    pub fn start(&mut self) -> usize {
        let mut issued = 0;
        for index in 0..self.records.len() {
            if self.records[index].state != LifecycleState::Pending {
                continue;
            }
            if let Ok(transition) = self.handle_intent(index, Intent::StartInspection) {
                if transition.command().is_some() {
                    issued += 1;
                }
            }
        }
        info!(services = self.records.len(), issued, "Started service inspection");
        issued
    }

    /// Apply a user intent to the record at `index`.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::NoSuchService` if `index` is out of range.
    pub fn handle_intent(&mut self, index: usize, intent: Intent) -> Result<Transition> {
        let draining = self.draining;
        let record = self.record_mut(index)?;

        if draining {
            debug!(index, intent = intent.label(), "Ignoring intent while draining");
            return Ok(Transition::Ignored(IgnoreReason::Draining));
        }

        let transition = lifecycle::apply(record, Event::Intent(intent));
        if let Transition::Ignored(reason) = transition {
            debug!(index, intent = intent.label(), ?reason, "Intent ignored");
        }

        self.follow_up(index, &transition);
        Ok(transition)
    }

    /// Apply a command completion to the record that issued it.
    ///
    /// While draining, the record is still updated but no follow-up command
    /// is issued.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::NoSuchService` if the completion's index is
    /// out of range.
    pub fn apply(&mut self, completion: Completion) -> Result<Transition> {
        let Completion { index, outcome } = completion;
        let record = self.record_mut(index)?;
        let transition = lifecycle::apply(record, Event::Outcome(outcome));

        if self.draining {
            if let Some(command) = transition.command() {
                debug!(index, command = command.label(), "Dropping follow-up while draining");
                self.records[index].in_flight = false;
            }
        } else {
            self.follow_up(index, &transition);
        }
        Ok(transition)
    }

    /// Wait for the next command completion.
    ///
    /// Cancel safe: a completion is never lost if the future is dropped.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        self.rx.recv().await
    }

    /// Take a completion if one is ready.
    pub fn try_next_completion(&mut self) -> Option<Completion> {
        self.rx.try_recv().ok()
    }

    /// Stop accepting intents and stop every running container.
    ///
    /// Calling this twice starts a second, independent coordinator.
    pub fn begin_shutdown(&mut self) -> ShutdownHandle {
        self.draining = true;

        let targets: Vec<ShutdownTarget> = self
            .records
            .iter()
            .filter(|r| r.state == LifecycleState::Running && r.has_handle())
            .map(|r| ShutdownTarget {
                resource: r.config.resource_name(),
                handle: r.handle.clone(),
            })
            .collect();

        let pending = self.in_flight();
        if pending > 0 {
            warn!(pending, "Shutting down with commands still in flight");
        }

        shutdown::stop_all(Arc::clone(&self.gateway), targets)
    }

    fn record_mut(&mut self, index: usize) -> Result<&mut ServiceRecord> {
        let len = self.records.len();
        self.records.get_mut(index).ok_or_else(|| {
            warn!(index, len, "Event for unknown service");
            ControlError::NoSuchService { index, len }
        })
    }

    fn follow_up(&self, index: usize, transition: &Transition) {
        if let Some(command) = transition.command() {
            self.issue(index, command.clone());
        }
    }

    fn issue(&self, index: usize, command: Command) {
        let service = self.records[index].config.clone();
        let gateway = Arc::clone(&self.gateway);
        let tx = self.tx.clone();

        info!(
            index,
            resource = %service.resource_name(),
            command = command.label(),
            "Issuing command"
        );

        tokio::spawn(async move {
            let outcome = run_command(gateway.as_ref(), &service, &command).await;
            // The dispatcher owns the receiver; a send error means it is gone.
            let _ = tx.send(Completion { index, outcome });
        });
    }
}
