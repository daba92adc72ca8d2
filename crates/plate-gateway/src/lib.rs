//! External command gateway for plate.
//!
//! This crate provides the [`CommandGateway`] trait and the [`DockerGateway`]
//! implementation that drives the `docker` CLI. It handles:
//!
//! - Inspecting existing containers and local images
//! - Pulling images and provisioning new containers
//! - Resuming, stopping, and removing containers
//! - Folding every failure into a typed [`CommandOutcome`] payload
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   Dispatcher (plate-control)                     │
//! └─────────────────────────────────────────────────────────────────┘
//!                 │ Command                  ▲ CommandOutcome
//!                 ▼                          │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         run_command                              │
//! │                              │                                   │
//! │                    ┌─────────┴─────────┐                        │
//! │                    ▼                   ▼                        │
//! │             ┌─────────────┐     ┌─────────────┐                 │
//! │             │DockerGateway│     │ MockGateway │                 │
//! │             └─────────────┘     └─────────────┘                 │
//! └─────────────────────────────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     docker CLI (subprocess)                      │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use plate_core::{ServiceConfig, ServiceKind};
//! use plate_gateway::{run_command, Command, DockerGateway, GatewayConfig};
//!
//! # async fn example() {
//! let gateway = DockerGateway::new(GatewayConfig::default());
//! let service = ServiceConfig::new(ServiceKind::Redis, "cache", "7", 6379);
//!
//! let outcome = run_command(&gateway, &service, &Command::Inspect).await;
//! println!("{outcome:?}");
//! # }
//! ```
//!
//! # Testing
//!
//! For testing without a Docker daemon, enable the `test-utils` feature and
//! use the mock gateway:
//!
//! ```ignore
//! use plate_gateway::{CommandGateway, MockGateway};
//!
//! # async fn example() {
//! let gateway = MockGateway::new().with_image("redis:7");
//! assert!(gateway.image_present("redis:7").await);
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod args;
pub mod command;
pub mod docker;
pub mod error;
pub mod types;

pub use command::run_command;
pub use docker::{CommandGateway, DockerGateway};
pub use error::{GatewayError, Result};
pub use types::{Command, CommandOutcome, ContainerState, GatewayConfig, Inspection};

#[cfg(any(test, feature = "test-utils"))]
pub use docker::mock::{MockGateway, MockOp};
