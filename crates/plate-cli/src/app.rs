//! Application state.
//!
//! The `App` wraps the [`Dispatcher`] with everything that only matters to
//! the terminal: the selected row, the spinner frame, the "Copied!" flag, and
//! the quit sequence.

use std::io::Write;
use std::time::Duration;

use plate_control::{
    Completion, Dispatcher, Intent, RecordView, ServiceRecord, ShutdownHandle, ShutdownReport,
};
use plate_gateway::CommandGateway;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::clipboard;

/// How often the spinner advances.
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// How long the "Copied!" flag stays visible.
pub const COPIED_FLASH: Duration = Duration::from_secs(2);

/// Spinner frames.
const SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Where the application is in its life.
#[derive(Debug)]
pub enum Phase {
    /// Normal operation.
    Active,
    /// Waiting for running containers to stop.
    Quitting(ShutdownHandle),
    /// Stops have returned; waiting for in-flight commands to settle.
    Settling(Option<ShutdownReport>),
    /// Safe to exit.
    Finished(Option<ShutdownReport>),
}

/// Application state.
pub struct App<G: CommandGateway + 'static> {
    /// Owner of all service records.
    pub dispatcher: Dispatcher<G>,
    /// Index of the selected record.
    pub selected: usize,
    /// Animation frame counter for the spinner.
    pub animation_frame: usize,
    /// Current phase.
    pub phase: Phase,
    /// Config file the services were loaded from, for the header.
    pub config_path: String,
    copied_until: Option<Instant>,
}

impl<G: CommandGateway + 'static> App<G> {
    /// Create a new application.
    #[must_use]
    pub fn new(dispatcher: Dispatcher<G>, config_path: impl Into<String>) -> Self {
        Self {
            dispatcher,
            selected: 0,
            animation_frame: 0,
            phase: Phase::Active,
            config_path: config_path.into(),
            copied_until: None,
        }
    }

    /// Kick off inspection of every service.
    pub fn start(&mut self) {
        self.dispatcher.start();
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// All records, in configured order.
    #[must_use]
    pub fn records(&self) -> &[ServiceRecord] {
        self.dispatcher.records()
    }

    /// Display projection of every record.
    #[must_use]
    pub fn views(&self) -> Vec<RecordView> {
        self.records().iter().map(RecordView::project).collect()
    }

    /// The selected record.
    #[must_use]
    pub fn selected_record(&self) -> Option<&ServiceRecord> {
        self.dispatcher.record(self.selected)
    }

    /// Move selection up, wrapping around.
    pub fn select_prev(&mut self) {
        let len = self.dispatcher.len();
        if len == 0 {
            return;
        }
        self.selected = if self.selected == 0 {
            len - 1
        } else {
            self.selected - 1
        };
    }

    /// Move selection down, wrapping around.
    pub fn select_next(&mut self) {
        let len = self.dispatcher.len();
        if len == 0 {
            return;
        }
        self.selected = (self.selected + 1) % len;
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Send an intent to the selected record.
    pub fn send(&mut self, intent: Intent) {
        if self.dispatcher.is_empty() {
            return;
        }
        if let Err(e) = self.dispatcher.handle_intent(self.selected, intent) {
            warn!(error = %e, "Intent rejected");
        }
    }

    /// Apply a command completion.
    pub fn apply(&mut self, completion: Completion) {
        if let Err(e) = self.dispatcher.apply(completion) {
            warn!(error = %e, "Completion rejected");
        }
    }

    /// Copy the selected record's endpoint to the clipboard.
    ///
    /// Only running records can be copied. Returns true if something was
    /// written.
    pub fn copy_selected<W: Write>(&mut self, out: &mut W) -> bool {
        let Some(record) = self.selected_record().filter(|r| r.can_copy()) else {
            return false;
        };
        let endpoint = record.endpoint.clone();

        match clipboard::copy_to(out, &endpoint) {
            Ok(()) => {
                debug!(resource = %record.config.resource_name(), "Copied endpoint");
                self.copied_until = Some(Instant::now() + COPIED_FLASH);
                true
            }
            Err(e) => {
                warn!(error = %e, "Failed to write clipboard sequence");
                false
            }
        }
    }

    /// Whether the "Copied!" flag should be shown.
    #[must_use]
    pub fn show_copied(&self) -> bool {
        self.copied_until
            .is_some_and(|until| Instant::now() < until)
    }

    /// Advance timers and check for shutdown completion.
    pub fn tick(&mut self) {
        self.animation_frame = self.animation_frame.wrapping_add(1);

        if !self.show_copied() {
            self.copied_until = None;
        }

        if let Phase::Quitting(handle) = &mut self.phase {
            match handle.try_complete() {
                Ok(None) => {}
                Ok(Some(report)) => {
                    info!(
                        stopped = report.stopped.len(),
                        failed = report.failed.len(),
                        "Running containers stopped"
                    );
                    self.phase = Phase::Settling(Some(report));
                }
                Err(e) => {
                    warn!(error = %e, "Shutdown did not report");
                    self.phase = Phase::Settling(None);
                }
            }
        }

        // Completions are still applied while draining, so in-flight
        // commands drain to zero.
        if let Phase::Settling(report) = &mut self.phase {
            let pending = self.dispatcher.in_flight();
            if pending == 0 {
                info!("All commands settled");
                self.phase = Phase::Finished(report.take());
            } else {
                debug!(pending, "Waiting for in-flight commands");
            }
        }
    }

    /// Current spinner frame.
    #[must_use]
    pub fn spinner_char(&self) -> &'static str {
        SPINNER[self.animation_frame % SPINNER.len()]
    }

    // =========================================================================
    // Quit
    // =========================================================================

    /// Begin the quit sequence. Calling it again has no effect.
    pub fn quit(&mut self) {
        if matches!(self.phase, Phase::Active) {
            info!("Quit requested");
            self.phase = Phase::Quitting(self.dispatcher.begin_shutdown());
        }
    }

    /// Returns true while waiting for containers and commands to settle.
    #[must_use]
    pub const fn is_quitting(&self) -> bool {
        matches!(self.phase, Phase::Quitting(_) | Phase::Settling(_))
    }

    /// Returns true once it is safe to exit.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Finished(_))
    }
}
