//! Resolution Metrics Port
//!
//! Defines the interface for recording per-driver resolution outcomes.

use serde::Serialize;

/// What happened when the chain tried one driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverOutcome {
    /// The fetch failed
    Absent,
    /// The provider answered with nothing but empty values
    RawEmpty,
    /// The answer hydrated to a position without location data
    PositionEmpty,
    /// The driver produced the final position
    Located,
}

impl std::fmt::Display for DriverOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DriverOutcome::Absent => write!(f, "absent"),
            DriverOutcome::RawEmpty => write!(f, "raw-empty"),
            DriverOutcome::PositionEmpty => write!(f, "position-empty"),
            DriverOutcome::Located => write!(f, "located"),
        }
    }
}

/// Counters for a single driver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DriverStats {
    pub driver: String,
    pub attempts: u64,
    pub located: u64,
    pub absent: u64,
    pub raw_empty: u64,
    pub position_empty: u64,
}

/// Point-in-time view of all counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub drivers: Vec<DriverStats>,
    pub unresolved: u64,
}

/// Store for resolution outcomes.
///
/// Recording happens on the lookup path, so implementations must be cheap
/// and safe for concurrent use.
pub trait ResolutionMetrics: Send + Sync {
    /// Record the outcome of one driver attempt.
    fn record(&self, driver: &str, outcome: DriverOutcome);

    /// Record a lookup that exhausted the chain.
    fn record_unresolved(&self);

    /// Current counters, drivers sorted by name.
    fn snapshot(&self) -> MetricsSnapshot;
}
