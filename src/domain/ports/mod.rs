mod location_driver;
mod metrics_store;
mod requestable;

pub use location_driver::LocationDriver;
pub use metrics_store::{DriverOutcome, DriverStats, MetricsSnapshot, ResolutionMetrics};
pub use requestable::Requestable;
