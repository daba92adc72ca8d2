//! Shutdown coordination.
//!
//! On quit every running container is stopped concurrently. The caller gets a
//! [`ShutdownHandle`] that completes exactly once, after every stop has
//! returned, successfully or not.

use std::sync::Arc;

use plate_gateway::CommandGateway;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::error::{ControlError, Result};

/// A container to stop on shutdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownTarget {
    /// Resource name, used for reporting.
    pub resource: String,
    /// Container id.
    pub handle: String,
}

/// What happened to each target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Resources that stopped cleanly.
    pub stopped: Vec<String>,
    /// Resources whose stop failed, with the failure message.
    pub failed: Vec<(String, String)>,
}

impl ShutdownReport {
    /// Total number of stop operations that returned.
    #[must_use]
    pub fn total(&self) -> usize {
        self.stopped.len() + self.failed.len()
    }
}

/// Completion signal for a shutdown in progress.
#[derive(Debug)]
pub struct ShutdownHandle {
    rx: oneshot::Receiver<ShutdownReport>,
}

impl ShutdownHandle {
    /// Wait until every stop has returned.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::ShutdownInterrupted` if the coordinator task
    /// died before reporting.
    pub async fn wait(self) -> Result<ShutdownReport> {
        self.rx.await.map_err(|_| ControlError::ShutdownInterrupted)
    }

    /// Check for completion without blocking.
    ///
    /// Returns `Ok(None)` while stops are still running. The report is
    /// delivered once; later calls return an error.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::ShutdownInterrupted` if the coordinator task
    /// died before reporting, or the report was already taken.
    pub fn try_complete(&mut self) -> Result<Option<ShutdownReport>> {
        match self.rx.try_recv() {
            Ok(report) => Ok(Some(report)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Closed) => Err(ControlError::ShutdownInterrupted),
        }
    }
}

/// Stop every target concurrently and signal once all have returned.
///
/// Must be called from within a tokio runtime.
pub fn stop_all<G>(gateway: Arc<G>, targets: Vec<ShutdownTarget>) -> ShutdownHandle
where
    G: CommandGateway + ?Sized + 'static,
{
    let (tx, rx) = oneshot::channel();

    info!(count = targets.len(), "Stopping running containers");

    tokio::spawn(async move {
        let mut stops = JoinSet::new();
        for target in targets {
            let gateway = Arc::clone(&gateway);
            stops.spawn(async move {
                let result = gateway.stop(&target.handle).await;
                (target.resource, result.map_err(|e| e.to_string()))
            });
        }

        let mut report = ShutdownReport::default();
        while let Some(joined) = stops.join_next().await {
            match joined {
                Ok((resource, Ok(()))) => report.stopped.push(resource),
                Ok((resource, Err(message))) => {
                    warn!(resource = %resource, error = %message, "Failed to stop container");
                    report.failed.push((resource, message));
                }
                Err(e) => {
                    warn!(error = %e, "Stop task panicked");
                    report.failed.push((String::new(), e.to_string()));
                }
            }
        }

        info!(
            stopped = report.stopped.len(),
            failed = report.failed.len(),
            "Shutdown complete"
        );

        // The receiver may already be gone if the caller gave up waiting.
        let _ = tx.send(report);
    });

    ShutdownHandle { rx }
}

#[cfg(test)]
mod tests {
    use plate_gateway::{MockGateway, MockOp};

    use super::*;

    fn target(resource: &str, handle: &str) -> ShutdownTarget {
        ShutdownTarget {
            resource: resource.to_string(),
            handle: handle.to_string(),
        }
    }

    #[tokio::test]
    async fn no_targets_completes_immediately() {
        let gateway = Arc::new(MockGateway::new());
        let report = stop_all(gateway, Vec::new()).wait().await.unwrap();
        assert_eq!(report, ShutdownReport::default());
    }

    #[tokio::test]
    async fn stops_every_target() {
        let gateway = Arc::new(
            MockGateway::new()
                .with_container("plate-redis-a", "a1", true)
                .with_container("plate-redis-b", "b1", true),
        );

        let report = stop_all(
            Arc::clone(&gateway),
            vec![target("plate-redis-a", "a1"), target("plate-redis-b", "b1")],
        )
        .wait()
        .await
        .unwrap();

        assert_eq!(report.total(), 2);
        assert!(report.failed.is_empty());
        assert_eq!(gateway.container("plate-redis-a"), Some(("a1".to_string(), false)));
        assert_eq!(gateway.container("plate-redis-b"), Some(("b1".to_string(), false)));
    }

    #[tokio::test]
    async fn failures_are_reported_not_fatal() {
        let gateway = Arc::new(MockGateway::new().with_container("plate-redis-a", "a1", true));
        gateway.fail(MockOp::Stop, "daemon unavailable");

        let report = stop_all(gateway, vec![target("plate-redis-a", "a1")])
            .wait()
            .await
            .unwrap();

        assert!(report.stopped.is_empty());
        assert_eq!(
            report.failed,
            vec![("plate-redis-a".to_string(), "daemon unavailable".to_string())]
        );
    }

    #[tokio::test]
    async fn completes_only_after_all_stops_return() {
        let gateway = Arc::new(
            MockGateway::held()
                .with_container("plate-redis-a", "a1", true)
                .with_container("plate-redis-b", "b1", true),
        );

        let mut handle = stop_all(
            Arc::clone(&gateway),
            vec![target("plate-redis-a", "a1"), target("plate-redis-b", "b1")],
        );

        while gateway.call_count(MockOp::Stop) < 2 {
            tokio::task::yield_now().await;
        }
        assert_eq!(handle.try_complete().unwrap(), None);

        gateway.release(1);
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(handle.try_complete().unwrap(), None);

        gateway.release(1);
        let report = loop {
            if let Some(report) = handle.try_complete().unwrap() {
                break report;
            }
            tokio::task::yield_now().await;
        };
        assert_eq!(report.total(), 2);

        // Delivered exactly once.
        assert!(handle.try_complete().is_err());
    }
}
