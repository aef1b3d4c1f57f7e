//! Domain Layer
//!
//! Entities, value objects, ports and the resolution chain. Nothing here
//! knows about HTTP clients, databases or the API server.

pub mod entities;
pub mod errors;
pub mod ports;
pub mod services;
pub mod value_objects;
