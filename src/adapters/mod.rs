//! Adapters Layer
//!
//! Inbound adapters drive the application (HTTP API); outbound adapters
//! implement domain ports (location drivers, metrics).

pub mod inbound;
pub mod outbound;
