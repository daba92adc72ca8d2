//! Docker CLI gateway implementation.
//!
//! This module provides the `DockerGateway` which runs every external
//! operation as a `docker` subprocess with a deadline.

use std::process::Output;
use std::time::Duration;

use async_trait::async_trait;
use plate_core::ServiceConfig;
use tracing::{debug, info, warn};

use crate::args::{inspect_args, run_args};
use crate::types::{ContainerState, GatewayConfig, Inspection};
use crate::{GatewayError, Result};

/// The `CommandGateway` trait defines one method per external operation.
///
/// Implementations must be safe to call concurrently for different services.
#[async_trait]
pub trait CommandGateway: Send + Sync {
    /// Look up a container by its exact resource name.
    ///
    /// Errors and unparsable answers are reported as [`Inspection::NotFound`].
    async fn inspect(&self, resource_name: &str) -> Inspection;

    /// Check whether an image is available locally.
    async fn image_present(&self, image: &str) -> bool;

    /// Pull an image.
    ///
    /// # Errors
    ///
    /// Returns an error if the pull fails or times out.
    async fn pull(&self, image: &str) -> Result<()>;

    /// Create and start a container for the service.
    ///
    /// Returns the new container id.
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be created.
    async fn provision(&self, service: &ServiceConfig) -> Result<String>;

    /// Start an existing container.
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be started.
    async fn resume(&self, handle: &str) -> Result<()>;

    /// Stop a running container.
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be stopped.
    async fn stop(&self, handle: &str) -> Result<()>;

    /// Stop (best effort) and remove a container.
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be removed.
    async fn remove(&self, handle: &str) -> Result<()>;
}

/// Gateway backed by the docker CLI.
#[derive(Debug, Clone)]
pub struct DockerGateway {
    config: GatewayConfig,
}

impl DockerGateway {
    /// Create a new docker gateway.
    #[must_use]
    pub const fn new(config: GatewayConfig) -> Self {
        Self { config }
    }

    /// Get a reference to the gateway config.
    #[must_use]
    pub const fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn command_line(&self, args: &[String]) -> String {
        format!("{} {}", self.config.docker_bin, args.join(" "))
    }

    /// Run a docker command with a deadline, returning raw output.
    async fn run(&self, args: &[String], timeout: Duration) -> Result<Output> {
        let command = self.command_line(args);
        debug!(command = %command, "Spawning docker");

        let result = tokio::time::timeout(
            timeout,
            tokio::process::Command::new(&self.config.docker_bin)
                .args(args)
                .kill_on_drop(true)
                .output(),
        )
        .await;

        match result {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(source)) => Err(GatewayError::Exec { command, source }),
            Err(_) => Err(GatewayError::Timeout { command, timeout }),
        }
    }

    /// Run a docker command with a deadline, returning output only on exit 0.
    async fn run_success(&self, args: &[String], timeout: Duration) -> Result<Output> {
        let output = self.run(args, timeout).await?;
        if output.status.success() {
            Ok(output)
        } else {
            Err(GatewayError::CommandFailed {
                command: self.command_line(args),
                message: failure_message(&output),
            })
        }
    }

    async fn run_simple(&self, args: &[&str]) -> Result<()> {
        let args: Vec<String> = args.iter().map(ToString::to_string).collect();
        self.run_success(&args, self.config.command_timeout())
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl CommandGateway for DockerGateway {
    async fn inspect(&self, resource_name: &str) -> Inspection {
        match self
            .run(&inspect_args(resource_name), self.config.command_timeout())
            .await
        {
            Ok(output) => parse_inspection(&String::from_utf8_lossy(&output.stdout)),
            Err(e) => {
                warn!(resource = resource_name, error = %e, "Inspection failed, assuming not found");
                Inspection::NotFound
            }
        }
    }

    async fn image_present(&self, image: &str) -> bool {
        let args = vec!["images".to_string(), "-q".to_string(), image.to_string()];
        match self.run(&args, self.config.command_timeout()).await {
            Ok(output) => !String::from_utf8_lossy(&output.stdout).trim().is_empty(),
            Err(e) => {
                warn!(image, error = %e, "Image check failed, assuming absent");
                false
            }
        }
    }

    async fn pull(&self, image: &str) -> Result<()> {
        info!(image, "Pulling image");
        let args = vec!["pull".to_string(), image.to_string()];
        self.run_success(&args, self.config.pull_timeout())
            .await
            .map(|_| ())
    }

    async fn provision(&self, service: &ServiceConfig) -> Result<String> {
        let args = run_args(service);
        info!(resource = %service.resource_name(), image = %service.image(), "Provisioning container");
        let output = self.run_success(&args, self.config.command_timeout()).await?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn resume(&self, handle: &str) -> Result<()> {
        self.run_simple(&["start", handle]).await
    }

    async fn stop(&self, handle: &str) -> Result<()> {
        self.run_simple(&["stop", handle]).await
    }

    async fn remove(&self, handle: &str) -> Result<()> {
        if let Err(e) = self.run_simple(&["stop", handle]).await {
            debug!(handle, error = %e, "Stop before remove failed");
        }
        self.run_simple(&["rm", handle]).await
    }
}

/// Parse the `{{.ID}}\t{{.State}}` output of `docker ps`.
///
/// Only the first line is considered; anything that does not split into
/// exactly two known fields is treated as not found.
#[must_use]
pub fn parse_inspection(stdout: &str) -> Inspection {
    let Some(line) = stdout.lines().map(str::trim).find(|l| !l.is_empty()) else {
        return Inspection::NotFound;
    };

    let parts: Vec<&str> = line.split('\t').collect();
    let [handle, state] = parts.as_slice() else {
        return Inspection::NotFound;
    };

    match ContainerState::from_docker_state(state.trim()) {
        Some(state) if !handle.trim().is_empty() => Inspection::Found {
            handle: handle.trim().to_string(),
            state,
        },
        _ => Inspection::NotFound,
    }
}

/// Combined, trimmed output of a failed command.
fn failure_message(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let message = [stderr.trim(), stdout.trim()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    if message.is_empty() {
        format!("command {}", output.status)
    } else {
        message
    }
}

/// Mock gateway for testing.
#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::{HashMap, HashSet};
    use std::sync::Arc;
    use tokio::sync::Semaphore;

    /// Gateway operations, as recorded by [`MockGateway`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum MockOp {
        /// [`CommandGateway::inspect`].
        Inspect,
        /// [`CommandGateway::image_present`].
        ImageCheck,
        /// [`CommandGateway::pull`].
        Pull,
        /// [`CommandGateway::provision`].
        Provision,
        /// [`CommandGateway::resume`].
        Resume,
        /// [`CommandGateway::stop`].
        Stop,
        /// [`CommandGateway::remove`].
        Remove,
    }

    #[derive(Debug, Clone)]
    struct MockContainer {
        id: String,
        running: bool,
    }

    #[derive(Default)]
    struct MockState {
        containers: HashMap<String, MockContainer>,
        images: HashSet<String>,
        failures: HashMap<MockOp, String>,
        calls: Vec<MockOp>,
        next_id: u64,
    }

    impl MockState {
        fn name_of(&self, handle: &str) -> Option<String> {
            self.containers
                .iter()
                .find(|(_, c)| c.id == handle)
                .map(|(name, _)| name.clone())
        }

        fn failure(&self, op: MockOp, command: &str) -> Result<()> {
            match self.failures.get(&op) {
                Some(message) => Err(GatewayError::CommandFailed {
                    command: command.to_string(),
                    message: message.clone(),
                }),
                None => Ok(()),
            }
        }
    }

    /// A mock gateway that keeps containers and images in memory.
    ///
    /// A held mock (see [`MockGateway::held`]) records each call and then
    /// waits for [`MockGateway::release`] before returning, so tests can
    /// observe commands that are still in flight.
    #[derive(Default)]
    pub struct MockGateway {
        state: Mutex<MockState>,
        gate: Option<Arc<Semaphore>>,
    }

    impl MockGateway {
        /// Create a new mock gateway with no containers or images.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Create a mock whose calls block until released.
        #[must_use]
        pub fn held() -> Self {
            Self {
                state: Mutex::new(MockState::default()),
                gate: Some(Arc::new(Semaphore::new(0))),
            }
        }

        /// Add a locally available image.
        #[must_use]
        pub fn with_image(self, image: &str) -> Self {
            self.state.lock().images.insert(image.to_string());
            self
        }

        /// Add an existing container.
        #[must_use]
        pub fn with_container(self, name: &str, id: &str, running: bool) -> Self {
            self.state.lock().containers.insert(
                name.to_string(),
                MockContainer {
                    id: id.to_string(),
                    running,
                },
            );
            self
        }

        /// Make every future call of `op` fail with `message`.
        pub fn fail(&self, op: MockOp, message: &str) {
            self.state.lock().failures.insert(op, message.to_string());
        }

        /// Remove all injected failures.
        pub fn clear_failures(&self) {
            self.state.lock().failures.clear();
        }

        /// Let `count` held calls return.
        pub fn release(&self, count: usize) {
            if let Some(gate) = &self.gate {
                gate.add_permits(count);
            }
        }

        /// All calls made so far, in order.
        #[must_use]
        pub fn calls(&self) -> Vec<MockOp> {
            self.state.lock().calls.clone()
        }

        /// Number of calls made for `op`.
        #[must_use]
        pub fn call_count(&self, op: MockOp) -> usize {
            self.state.lock().calls.iter().filter(|c| **c == op).count()
        }

        /// Look up a container by name: `(id, running)`.
        #[must_use]
        pub fn container(&self, name: &str) -> Option<(String, bool)> {
            self.state
                .lock()
                .containers
                .get(name)
                .map(|c| (c.id.clone(), c.running))
        }

        /// Number of containers that exist.
        #[must_use]
        pub fn container_count(&self) -> usize {
            self.state.lock().containers.len()
        }

        async fn enter(&self, op: MockOp) {
            self.state.lock().calls.push(op);
            if let Some(gate) = &self.gate {
                if let Ok(permit) = gate.acquire().await {
                    permit.forget();
                }
            }
        }
    }

    #[async_trait]
    impl CommandGateway for MockGateway {
        async fn inspect(&self, resource_name: &str) -> Inspection {
            self.enter(MockOp::Inspect).await;
            self.state
                .lock()
                .containers
                .get(resource_name)
                .map_or(Inspection::NotFound, |c| Inspection::Found {
                    handle: c.id.clone(),
                    state: if c.running {
                        ContainerState::Running
                    } else {
                        ContainerState::Stopped
                    },
                })
        }

        async fn image_present(&self, image: &str) -> bool {
            self.enter(MockOp::ImageCheck).await;
            self.state.lock().images.contains(image)
        }

        async fn pull(&self, image: &str) -> Result<()> {
            self.enter(MockOp::Pull).await;
            let mut state = self.state.lock();
            state.failure(MockOp::Pull, "docker pull")?;
            state.images.insert(image.to_string());
            Ok(())
        }

        async fn provision(&self, service: &ServiceConfig) -> Result<String> {
            self.enter(MockOp::Provision).await;
            let mut state = self.state.lock();
            state.failure(MockOp::Provision, "docker run")?;

            let name = service.resource_name();
            if state.containers.contains_key(&name) {
                return Err(GatewayError::CommandFailed {
                    command: "docker run".to_string(),
                    message: format!("Conflict. The container name \"/{name}\" is already in use"),
                });
            }

            state.next_id += 1;
            let id = format!("{:064x}", state.next_id);
            state.containers.insert(
                name,
                MockContainer {
                    id: id.clone(),
                    running: true,
                },
            );
            Ok(id)
        }

        async fn resume(&self, handle: &str) -> Result<()> {
            self.enter(MockOp::Resume).await;
            let mut state = self.state.lock();
            state.failure(MockOp::Resume, "docker start")?;
            let name = state.name_of(handle).ok_or_else(|| no_such(handle))?;
            if let Some(c) = state.containers.get_mut(&name) {
                c.running = true;
            }
            Ok(())
        }

        async fn stop(&self, handle: &str) -> Result<()> {
            self.enter(MockOp::Stop).await;
            let mut state = self.state.lock();
            state.failure(MockOp::Stop, "docker stop")?;
            let name = state.name_of(handle).ok_or_else(|| no_such(handle))?;
            if let Some(c) = state.containers.get_mut(&name) {
                c.running = false;
            }
            Ok(())
        }

        async fn remove(&self, handle: &str) -> Result<()> {
            self.enter(MockOp::Remove).await;
            let mut state = self.state.lock();
            state.failure(MockOp::Remove, "docker rm")?;
            let name = state.name_of(handle).ok_or_else(|| no_such(handle))?;
            state.containers.remove(&name);
            Ok(())
        }
    }

    fn no_such(handle: &str) -> GatewayError {
        GatewayError::CommandFailed {
            command: "docker".to_string(),
            message: format!("Error response from daemon: No such container: {handle}"),
        }
    }
}
