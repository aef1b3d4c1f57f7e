//! Resolution Chain Service
//!
//! Pure domain logic for walking an ordered list of location drivers until
//! one yields a usable position. The chain itself performs no I/O; all
//! fetching happens inside the drivers.

use crate::domain::entities::Position;
use crate::domain::errors::ChainError;
use crate::domain::ports::{DriverOutcome, LocationDriver, Requestable, ResolutionMetrics};
use std::collections::HashSet;
use std::sync::Arc;

/// Constructor for the blank position handed to each hydration.
pub type PositionFactory = Arc<dyn Fn() -> Position + Send + Sync>;

/// Final outcome of a lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// A driver produced a non-empty position
    Located(Position),
    /// Every driver failed, or the chain is empty
    Unresolved,
}

impl Resolution {
    pub fn is_located(&self) -> bool {
        matches!(self, Resolution::Located(_))
    }

    pub fn position(&self) -> Option<&Position> {
        match self {
            Resolution::Located(position) => Some(position),
            Resolution::Unresolved => None,
        }
    }

    pub fn into_position(self) -> Option<Position> {
        match self {
            Resolution::Located(position) => Some(position),
            Resolution::Unresolved => None,
        }
    }
}

/// Ordered, immutable list of drivers tried first-to-last.
///
/// Built once via [`ChainBuilder`] and shared behind an `Arc`. Each call to
/// [`resolve`](ResolutionChain::resolve) owns its positions, so lookups for
/// different requests can run concurrently.
pub struct ResolutionChain {
    drivers: Vec<Arc<dyn LocationDriver>>,
    factory: PositionFactory,
    metrics: Option<Arc<dyn ResolutionMetrics>>,
}

impl ResolutionChain {
    pub fn builder() -> ChainBuilder {
        ChainBuilder::new()
    }

    /// Resolve a request to a position.
    ///
    /// Drivers are awaited strictly one at a time. The first driver whose
    /// raw answer is non-empty and whose hydrated position carries location
    /// data wins; no later driver is contacted.
    pub async fn resolve(&self, request: &dyn Requestable) -> Resolution {
        for driver in &self.drivers {
            let (outcome, position) = self.attempt(driver.as_ref(), request).await;
            self.record(driver.name(), outcome);

            if let Some(position) = position {
                tracing::debug!("{} located {}", driver.name(), request.ip());
                return Resolution::Located(position);
            }

            tracing::debug!("{} failed for {} ({})", driver.name(), request.ip(), outcome);
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_unresolved();
        }
        tracing::debug!(
            "no driver located {} ({} tried)",
            request.ip(),
            self.drivers.len()
        );
        Resolution::Unresolved
    }

    /// Run one driver: fetch, raw-emptiness check, hydrate, position check.
    async fn attempt(
        &self,
        driver: &dyn LocationDriver,
        request: &dyn Requestable,
    ) -> (DriverOutcome, Option<Position>) {
        let Some(raw) = driver.process(request).await else {
            return (DriverOutcome::Absent, None);
        };

        if raw.is_empty() {
            return (DriverOutcome::RawEmpty, None);
        }

        let mut position = driver.hydrate((self.factory)(), &raw);
        position.ip = Some(request.ip().to_string());
        position.driver = Some(driver.name().to_string());

        if position.is_empty() {
            return (DriverOutcome::PositionEmpty, None);
        }

        (DriverOutcome::Located, Some(position))
    }

    fn record(&self, driver: &str, outcome: DriverOutcome) {
        if let Some(metrics) = &self.metrics {
            metrics.record(driver, outcome);
        }
    }

    /// Number of drivers in the chain.
    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }

    /// Driver identities in chain order.
    pub fn driver_names(&self) -> Vec<String> {
        self.drivers.iter().map(|d| d.name().to_string()).collect()
    }

    /// Attached metrics store, if any.
    pub fn metrics(&self) -> Option<&Arc<dyn ResolutionMetrics>> {
        self.metrics.as_ref()
    }
}

impl std::fmt::Debug for ResolutionChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionChain")
            .field("drivers", &self.driver_names())
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

/// Builder for [`ResolutionChain`].
///
/// Drivers are only ever appended, so the chain order is the order of the
/// builder calls.
pub struct ChainBuilder {
    drivers: Vec<Arc<dyn LocationDriver>>,
    factory: Option<PositionFactory>,
    metrics: Option<Arc<dyn ResolutionMetrics>>,
}

impl ChainBuilder {
    pub fn new() -> Self {
        Self {
            drivers: Vec::new(),
            factory: None,
            metrics: None,
        }
    }

    /// Append a driver. Used for the primary driver; identical to `fallback`.
    pub fn driver(self, driver: Arc<dyn LocationDriver>) -> Self {
        self.fallback(driver)
    }

    /// Append a fallback driver to the tail of the chain.
    pub fn fallback(mut self, driver: Arc<dyn LocationDriver>) -> Self {
        self.drivers.push(driver);
        self
    }

    /// Append several drivers in order.
    pub fn drivers<I>(mut self, drivers: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn LocationDriver>>,
    {
        self.drivers.extend(drivers);
        self
    }

    /// Substitute the blank position constructor.
    pub fn position_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Position + Send + Sync + 'static,
    {
        self.factory = Some(Arc::new(factory));
        self
    }

    /// Record per-driver outcomes into the given store.
    pub fn metrics(mut self, metrics: Arc<dyn ResolutionMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Number of drivers appended so far.
    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }

    /// Validate and freeze the chain.
    ///
    /// Fails if the position factory produces a position that already
    /// carries location data. Repeated driver identities are kept, with a
    /// warning, so differently configured instances of one provider can be
    /// chained.
    pub fn build(self) -> Result<ResolutionChain, ChainError> {
        let mut seen = HashSet::new();
        for driver in &self.drivers {
            if !seen.insert(driver.name()) {
                tracing::warn!(
                    "driver {} appears more than once in the resolution chain",
                    driver.name()
                );
            }
        }

        let factory = self
            .factory
            .unwrap_or_else(|| Arc::new(Position::default) as PositionFactory);
        if !factory().is_empty() {
            return Err(ChainError::PositionFactory);
        }

        if self.drivers.is_empty() {
            tracing::warn!("resolution chain has no drivers; every lookup will be unresolved");
        }

        Ok(ResolutionChain {
            drivers: self.drivers,
            factory,
            metrics: self.metrics,
        })
    }
}

impl Default for ChainBuilder {
    fn default() -> Self {
        Self::new()
    }
}
