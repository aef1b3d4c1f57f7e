//! Requestable Port
//!
//! Defines the incoming-request abstraction consumed by the resolution chain.

use std::net::IpAddr;

/// Anything that carries a caller address to locate.
///
/// The chain only ever reads `ip()`. Drivers may also consult request
/// headers (e.g. CDN-provided geolocation headers) to refine their lookup.
pub trait Requestable: Send + Sync {
    /// Source address to resolve.
    fn ip(&self) -> IpAddr;

    /// Look up a request header by name (case-insensitive).
    ///
    /// The default implementation carries no headers.
    fn header(&self, _name: &str) -> Option<&str> {
        None
    }
}

impl Requestable for IpAddr {
    fn ip(&self) -> IpAddr {
        *self
    }
}
