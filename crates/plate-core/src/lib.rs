//! Core types and utilities for plate.
//!
//! This crate provides the foundational types used throughout the plate workspace:
//!
//! - **Service descriptors**: [`ServiceKind`] and [`ServiceConfig`], plus the
//!   values derived from them (resource name, image, endpoint)
//! - **Configuration**: loading and validating the declarative service list
//! - **Error types**: configuration errors shared across crates
//!
//! # Example
//!
//! ```
//! use plate_core::{PlateConfig, ServiceKind};
//!
//! let config = PlateConfig::from_json(
//!     r#"{"services": [{"type": "redis", "name": "cache", "version": "7", "port": 6380}]}"#,
//! ).unwrap();
//!
//! let cache = &config.services[0];
//! assert_eq!(cache.kind, ServiceKind::Redis);
//! assert_eq!(cache.resource_name(), "plate-redis-cache");
//! assert_eq!(cache.endpoint(), "redis://localhost:6380");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod service;

pub use config::{PlateConfig, DEFAULT_CONFIG_PATH};
pub use error::{ConfigError, Result};
pub use service::{ServiceConfig, ServiceKind, FIXED_PASSWORD};
