mod api_server;

pub use api_server::{router, ApiServer, ApiState, DriversResponse, HealthResponse, DRAIN_TIMEOUT};
