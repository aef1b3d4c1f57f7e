//! ip-locator Library
//!
//! IP geolocation through an ordered chain of location drivers. The first
//! driver that produces location data wins; the rest are never contacted.
//!
//! This module exposes the components for use in integration tests and as
//! a library.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used types
pub use adapters::outbound::compose_chain;
pub use application::LocationService;
pub use config::{load_config, Config};
pub use domain::entities::{LocationRequest, Position};
pub use domain::errors::ChainError;
pub use domain::ports::{LocationDriver, Requestable, ResolutionMetrics};
pub use domain::services::{ChainBuilder, Resolution, ResolutionChain};
pub use domain::value_objects::{DriverKind, RawLocation};
