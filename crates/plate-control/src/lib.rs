//! Lifecycle control for plate services.
//!
//! This crate owns the per-service state and everything that changes it:
//!
//! - [`record`]: the [`ServiceRecord`] data entity, intents and events
//! - [`lifecycle`]: the pure transition function
//! - [`dispatcher`]: the event loop owner that issues commands
//! - [`shutdown`]: stopping every running container on quit
//! - [`view`]: display strings for the UI
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     UI (plate-cli)                          │
//! └─────────────────────────────────────────────────────────────┘
//!           │ Intent                          ▲ RecordView
//!           ▼                                 │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Dispatcher                            │
//! │  ┌─────────────┐ ┌─────────────────┐ ┌─────────────────┐    │
//! │  │  Records    │ │   Lifecycle     │ │    Shutdown     │    │
//! │  │  (owned)    │ │  State Machine  │ │   Coordinator   │    │
//! │  └─────────────┘ └─────────────────┘ └─────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//!           │ Command (tokio task)            ▲ Completion (mpsc)
//!           ▼                                 │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 CommandGateway (plate-gateway)               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use plate_control::{Dispatcher, Intent};
//! use plate_core::PlateConfig;
//! use plate_gateway::{DockerGateway, GatewayConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PlateConfig::load("plate.config.json")?;
//! let gateway = Arc::new(DockerGateway::new(GatewayConfig::default()));
//! let mut dispatcher = Dispatcher::new(config.services, gateway);
//!
//! dispatcher.start();
//! while let Some(completion) = dispatcher.next_completion().await {
//!     dispatcher.apply(completion)?;
//!     if dispatcher.in_flight() == 0 {
//!         break;
//!     }
//! }
//!
//! dispatcher.handle_intent(0, Intent::Stop)?;
//! dispatcher.begin_shutdown().wait().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod dispatcher;
pub mod error;
pub mod lifecycle;
pub mod record;
pub mod shutdown;
pub mod view;

pub use dispatcher::{Completion, Dispatcher};
pub use error::{ControlError, Result};
pub use lifecycle::{IgnoreReason, Transition};
pub use record::{Confirmation, Event, Intent, LifecycleState, PendingAction, ServiceRecord};
pub use shutdown::{ShutdownHandle, ShutdownReport, ShutdownTarget};
pub use view::{RecordView, StatusTone};
