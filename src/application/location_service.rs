//! Location Service - Main application use case
//!
//! Wraps the resolution chain with the deployment-level policy the chain
//! itself knows nothing about: testing-mode address substitution and
//! driver statistics. This is the primary interface for inbound adapters.

use crate::domain::entities::LocationRequest;
use crate::domain::ports::MetricsSnapshot;
use crate::domain::services::{Resolution, ResolutionChain};
use std::net::IpAddr;
use std::sync::Arc;

/// Location service - main application use case.
pub struct LocationService {
    chain: Arc<ResolutionChain>,
    testing_ip: Option<IpAddr>,
}

impl LocationService {
    /// Create a new location service.
    pub fn new(chain: Arc<ResolutionChain>) -> Self {
        Self {
            chain,
            testing_ip: None,
        }
    }

    /// Resolve every request as if it came from `ip`.
    ///
    /// Local development traffic comes from loopback or private addresses
    /// that no provider can locate.
    pub fn with_testing_ip(mut self, ip: IpAddr) -> Self {
        self.testing_ip = Some(ip);
        self
    }

    /// Locate a request.
    ///
    /// When the testing address replaces the caller's, the caller's headers
    /// are dropped: they describe the caller, not the testing address.
    pub async fn locate(&self, request: LocationRequest) -> Resolution {
        let request = match self.testing_ip {
            Some(ip) => {
                tracing::debug!("testing mode: locating {} instead of {}", ip, request.ip);
                LocationRequest::new(ip)
            }
            None => request,
        };

        self.chain.resolve(&request).await
    }

    /// Locate a bare address.
    pub async fn locate_ip(&self, ip: IpAddr) -> Resolution {
        self.locate(LocationRequest::new(ip)).await
    }

    /// Driver identities in chain order.
    pub fn driver_names(&self) -> Vec<String> {
        self.chain.driver_names()
    }

    /// Driver statistics, if the chain records any.
    pub fn driver_stats(&self) -> Option<MetricsSnapshot> {
        self.chain.metrics().map(|m| m.snapshot())
    }

    pub fn testing_ip(&self) -> Option<IpAddr> {
        self.testing_ip
    }
}
