//! Domain Errors
//!
//! Configuration faults raised while composing a resolution chain. Provider
//! failures are not errors: they advance the chain.

/// Chain composition errors.
///
/// These are integration bugs and must surface at startup rather than be
/// swallowed during lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    #[error("position factory must produce an empty position")]
    PositionFactory,
    #[error("driver {0} is registered more than once")]
    DuplicateDriver(String),
    #[error("unknown driver: {0}")]
    UnknownDriver(String),
    #[error("driver {driver} requires {setting}")]
    MissingCredential { driver: String, setting: String },
    #[error("driver {driver} failed to initialize: {reason}")]
    DriverInit { driver: String, reason: String },
}
