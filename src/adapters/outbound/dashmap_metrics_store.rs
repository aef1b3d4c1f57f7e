//! DashMap Metrics Store
//!
//! Implements ResolutionMetrics using DashMap for lock-free concurrent access.

use crate::domain::ports::{DriverOutcome, DriverStats, MetricsSnapshot, ResolutionMetrics};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for a single driver.
#[derive(Debug, Default)]
pub struct DriverCounters {
    pub attempts: AtomicU64,
    pub located: AtomicU64,
    pub absent: AtomicU64,
    pub raw_empty: AtomicU64,
    pub position_empty: AtomicU64,
}

impl DriverCounters {
    fn outcome(&self, outcome: DriverOutcome) -> &AtomicU64 {
        match outcome {
            DriverOutcome::Absent => &self.absent,
            DriverOutcome::RawEmpty => &self.raw_empty,
            DriverOutcome::PositionEmpty => &self.position_empty,
            DriverOutcome::Located => &self.located,
        }
    }

    fn stats(&self, driver: &str) -> DriverStats {
        DriverStats {
            driver: driver.to_string(),
            attempts: self.attempts.load(Ordering::Relaxed),
            located: self.located.load(Ordering::Relaxed),
            absent: self.absent.load(Ordering::Relaxed),
            raw_empty: self.raw_empty.load(Ordering::Relaxed),
            position_empty: self.position_empty.load(Ordering::Relaxed),
        }
    }
}

/// DashMap-backed metrics store.
///
/// Each driver has its own counters entry, created on first record.
pub struct DashMapMetricsStore {
    drivers: DashMap<String, DriverCounters>,
    unresolved: AtomicU64,
}

impl DashMapMetricsStore {
    /// Create a new metrics store.
    pub fn new() -> Self {
        Self {
            drivers: DashMap::new(),
            unresolved: AtomicU64::new(0),
        }
    }

    /// Get counters for a specific driver.
    pub fn get_stats(&self, driver: &str) -> Option<DriverStats> {
        self.drivers.get(driver).map(|c| c.stats(driver))
    }
}

impl Default for DashMapMetricsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolutionMetrics for DashMapMetricsStore {
    fn record(&self, driver: &str, outcome: DriverOutcome) {
        let counters = self.drivers.entry(driver.to_string()).or_default();
        counters.attempts.fetch_add(1, Ordering::Relaxed);
        counters.outcome(outcome).fetch_add(1, Ordering::Relaxed);
    }

    fn record_unresolved(&self) {
        self.unresolved.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> MetricsSnapshot {
        let mut drivers: Vec<DriverStats> = self
            .drivers
            .iter()
            .map(|entry| entry.value().stats(entry.key()))
            .collect();
        drivers.sort_by(|a, b| a.driver.cmp(&b.driver));

        MetricsSnapshot {
            drivers,
            unresolved: self.unresolved.load(Ordering::Relaxed),
        }
    }
}
