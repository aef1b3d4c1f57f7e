//! Location API Server
//!
//! HTTP API that locates callers or explicit addresses through the
//! resolution chain and exposes per-driver statistics.

use crate::application::LocationService;
use crate::domain::entities::LocationRequest;
use crate::domain::ports::MetricsSnapshot;
use crate::domain::services::Resolution;
use crate::infrastructure::ShutdownController;
use axum::{
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// How long shutdown waits for in-flight lookups.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Health response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub drivers: Vec<String>,
}

/// Driver listing with statistics.
#[derive(Debug, Serialize)]
pub struct DriversResponse {
    /// Driver identities in chain order
    pub drivers: Vec<String>,
    /// Absent when the chain records no statistics
    pub stats: Option<MetricsSnapshot>,
}

/// API Server state.
#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<LocationService>,
    /// Running behind a trusted proxy: use the first X-Forwarded-For entry
    /// as the caller address and pass the caller's headers to drivers
    pub trust_forwarded: bool,
    pub shutdown: ShutdownController,
}

impl ApiState {
    pub fn new(service: Arc<LocationService>, trust_forwarded: bool) -> Self {
        Self {
            service,
            trust_forwarded,
            shutdown: ShutdownController::new(),
        }
    }

    /// Caller address: first X-Forwarded-For entry when trusted, else the peer.
    fn caller_ip(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<IpAddr> {
        if self.trust_forwarded {
            let forwarded = headers
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .and_then(|v| v.trim().parse().ok());
            if forwarded.is_some() {
                return forwarded;
            }
        }
        peer.map(|addr| addr.ip())
    }

    /// Run one lookup while tracking it for shutdown drain.
    async fn locate(&self, request: LocationRequest) -> Response {
        let _guard = self.shutdown.lookup_guard();
        let ip = request.ip;

        match self.service.locate(request).await {
            Resolution::Located(position) => (StatusCode::OK, Json(position)).into_response(),
            Resolution::Unresolved => (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({
                    "ip": ip.to_string(),
                    "error": "location unresolved"
                })),
            )
                .into_response(),
        }
    }
}

/// API Server for location lookups.
pub struct ApiServer {
    listen_addr: String,
    state: ApiState,
}

impl ApiServer {
    pub fn new(listen_addr: String, service: Arc<LocationService>, trust_forwarded: bool) -> Self {
        Self {
            listen_addr,
            state: ApiState::new(service, trust_forwarded),
        }
    }

    /// Shutdown controller shared with the handlers.
    pub fn shutdown_controller(&self) -> ShutdownController {
        self.state.shutdown.clone()
    }

    pub fn state(&self) -> ApiState {
        self.state.clone()
    }

    pub fn router(&self) -> Router {
        router(self.state.clone())
    }

    /// Run the API server until shutdown is initiated, then drain lookups.
    #[cfg_attr(coverage_nightly, coverage(off))]
    pub async fn run(&self) -> anyhow::Result<()> {
        let listener = TcpListener::bind(&self.listen_addr).await?;
        tracing::info!("location API listening on {}", self.listen_addr);

        let shutdown = self.state.shutdown.clone();
        axum::serve(
            listener,
            self.router()
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move { shutdown.wait_for_shutdown().await })
        .await?;

        if self.state.shutdown.wait_for_drain(DRAIN_TIMEOUT).await {
            tracing::info!("all lookups drained");
        }
        Ok(())
    }
}

/// Build the router for the given state.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/v1/locate", get(locate_caller_handler))
        .route("/api/v1/locate/:ip", get(locate_ip_handler))
        .route("/api/v1/drivers", get(drivers_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Copy request headers into a lookup request.
fn request_with_headers(ip: IpAddr, headers: &HeaderMap) -> LocationRequest {
    headers
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v)))
        .fold(LocationRequest::new(ip), |request, (name, value)| {
            request.with_header(name, value)
        })
}

// Handler functions

async fn health_handler(State(state): State<ApiState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        drivers: state.service.driver_names(),
    })
}

async fn locate_caller_handler(
    State(state): State<ApiState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Response {
    let Some(ip) = state.caller_ip(&headers, peer.map(|ConnectInfo(addr)| addr)) else {
        tracing::debug!("caller address unavailable");
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "caller address unavailable" })),
        )
            .into_response();
    };

    // Visitor headers (CF-IPCountry, ...) describe the caller and are only
    // trusted when a proxy sets them.
    let request = if state.trust_forwarded {
        request_with_headers(ip, &headers)
    } else {
        LocationRequest::new(ip)
    };

    state.locate(request).await
}

async fn locate_ip_handler(State(state): State<ApiState>, Path(ip): Path<String>) -> Response {
    let ip: IpAddr = match ip.trim().parse() {
        Ok(ip) => ip,
        Err(_) => {
            tracing::debug!("rejected lookup for invalid address {:?}", ip);
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": "invalid ip address" })),
            )
                .into_response();
        }
    };

    // The caller's headers say nothing about an arbitrary address.
    state.locate(LocationRequest::new(ip)).await
}

async fn drivers_handler(State(state): State<ApiState>) -> impl IntoResponse {
    Json(DriversResponse {
        drivers: state.service.driver_names(),
        stats: state.service.driver_stats(),
    })
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::adapters::outbound::{CloudflareDriver, DashMapMetricsStore};
    use crate::domain::services::ResolutionChain;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn create_state(trust_forwarded: bool) -> ApiState {
        let chain = ResolutionChain::builder()
            .driver(Arc::new(CloudflareDriver::new()))
            .metrics(Arc::new(DashMapMetricsStore::new()))
            .build()
            .unwrap();
        let service = Arc::new(LocationService::new(Arc::new(chain)));
        ApiState::new(service, trust_forwarded)
    }

    fn create_test_app() -> Router {
        router(create_state(false))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_caller_ip_prefers_peer_when_untrusted() {
        let state = create_state(false);
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.9".parse().unwrap());
        let peer: SocketAddr = "198.51.100.1:4000".parse().unwrap();

        assert_eq!(
            state.caller_ip(&headers, Some(peer)),
            Some("198.51.100.1".parse().unwrap())
        );
    }

    #[test]
    fn test_caller_ip_uses_first_forwarded_entry() {
        let state = create_state(true);
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            "203.0.113.9, 10.0.0.1".parse().unwrap(),
        );

        assert_eq!(
            state.caller_ip(&headers, None),
            Some("203.0.113.9".parse().unwrap())
        );
    }

    #[test]
    fn test_caller_ip_falls_back_to_peer_on_garbage() {
        let state = create_state(true);
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "unknown".parse().unwrap());
        let peer: SocketAddr = "198.51.100.1:4000".parse().unwrap();

        assert_eq!(
            state.caller_ip(&headers, Some(peer)),
            Some("198.51.100.1".parse().unwrap())
        );
        assert_eq!(state.caller_ip(&headers, None), None);
    }

    #[test]
    fn test_request_with_headers_lowercases() {
        let mut headers = HeaderMap::new();
        headers.insert("CF-IPCountry", "DE".parse().unwrap());

        let request = request_with_headers("1.2.3.4".parse().unwrap(), &headers);
        assert_eq!(request.headers().get("cf-ipcountry").map(String::as_str), Some("DE"));
    }

    #[tokio::test]
    async fn test_health_handler() {
        let app = create_test_app();

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["drivers"], serde_json::json!(["Cloudflare"]));
    }

    #[tokio::test]
    async fn test_locate_ip_ignores_caller_headers() {
        let app = router(create_state(true));

        let request = Request::builder()
            .uri("/api/v1/locate/8.8.8.8")
            .header("cf-ipcountry", "DE")
            .header("cf-ipcity", "Berlin")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["ip"], "8.8.8.8");
        assert!(body.get("city_name").is_none());
    }

    #[tokio::test]
    async fn test_locate_ip_unresolved() {
        let app = create_test_app();

        let request = Request::builder()
            .uri("/api/v1/locate/203.0.113.9")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["ip"], "203.0.113.9");
        assert_eq!(body["error"], "location unresolved");
    }

    #[tokio::test]
    async fn test_locate_ip_invalid() {
        let app = create_test_app();

        let request = Request::builder()
            .uri("/api/v1/locate/not-an-ip")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"], "invalid ip address");
    }

    #[tokio::test]
    async fn test_locate_caller_without_address() {
        // oneshot carries no ConnectInfo
        let app = create_test_app();

        let request = Request::builder()
            .uri("/api/v1/locate")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_locate_caller_forwarded() {
        let app = router(create_state(true));

        let request = Request::builder()
            .uri("/api/v1/locate")
            .header("x-forwarded-for", "198.51.100.7")
            .header("cf-ipcountry", "BR")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["ip"], "198.51.100.7");
        assert_eq!(body["country_code"], "BR");
    }

    #[tokio::test]
    async fn test_locate_caller_untrusted_ignores_headers() {
        let app = create_test_app();

        let mut request = Request::builder()
            .uri("/api/v1/locate")
            .header("cf-ipcountry", "JP")
            .body(Body::empty())
            .unwrap();
        let peer: SocketAddr = "192.0.2.44:55000".parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(peer));

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["ip"], "192.0.2.44");
    }

    #[tokio::test]
    async fn test_locate_caller_trusted_peer_address() {
        let app = router(create_state(true));

        let mut request = Request::builder()
            .uri("/api/v1/locate")
            .header("cf-ipcountry", "JP")
            .body(Body::empty())
            .unwrap();
        let peer: SocketAddr = "192.0.2.44:55000".parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(peer));

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["ip"], "192.0.2.44");
        assert_eq!(body["country_code"], "JP");
    }

    #[tokio::test]
    async fn test_drivers_handler_reports_stats() {
        let state = create_state(false);
        let app = router(state.clone());

        let request = Request::builder()
            .uri("/api/v1/locate/203.0.113.9")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let request = Request::builder()
            .uri("/api/v1/drivers")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["drivers"], serde_json::json!(["Cloudflare"]));
        assert_eq!(body["stats"]["unresolved"], 1);
        assert_eq!(body["stats"]["drivers"][0]["absent"], 1);
    }

    #[tokio::test]
    async fn test_lookup_guard_released_after_request() {
        let state = create_state(false);
        let app = router(state.clone());

        let request = Request::builder()
            .uri("/api/v1/locate/203.0.113.9")
            .body(Body::empty())
            .unwrap();
        app.oneshot(request).await.unwrap();

        assert_eq!(state.shutdown.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_api_server_run_and_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let chain = ResolutionChain::builder()
            .driver(Arc::new(CloudflareDriver::new()))
            .build()
            .unwrap();
        let service = Arc::new(LocationService::new(Arc::new(chain)));
        let server = ApiServer::new(addr.to_string(), service, true);
        let shutdown = server.shutdown_controller();

        let server_handle = tokio::spawn(async move { server.run().await });
        tokio::time::sleep(Duration::from_millis(100)).await;

        let client = reqwest::Client::new();
        let response = client
            .get(format!("http://{}/api/v1/locate", addr))
            .header("cf-ipcountry", "CA")
            .timeout(Duration::from_secs(2))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["ip"], "127.0.0.1");

        shutdown.shutdown();
        let result = tokio::time::timeout(Duration::from_secs(2), server_handle).await;
        assert!(result.unwrap().unwrap().is_ok());
    }
}
