//! Location Driver Port
//!
//! Defines the contract every geolocation provider adapter satisfies.

use crate::domain::entities::Position;
use crate::domain::ports::Requestable;
use crate::domain::value_objects::RawLocation;
use async_trait::async_trait;

/// A single geolocation source.
///
/// This is an outbound port. Implementations wrap one provider: a web API,
/// a local database, or request metadata set by a CDN.
#[async_trait]
pub trait LocationDriver: Send + Sync {
    /// Identity stamped into `Position::driver` on success.
    fn name(&self) -> &str;

    /// Fetch the provider's raw answer for this request.
    ///
    /// Returns None when the fetch failed for any ordinary reason
    /// (network error, timeout, non-2xx status, malformed body).
    /// Implementations must not panic on provider failures.
    async fn process(&self, request: &dyn Requestable) -> Option<RawLocation>;

    /// Map the provider's field names onto a position.
    ///
    /// Pure: no I/O happens here.
    fn hydrate(&self, position: Position, raw: &RawLocation) -> Position;
}
