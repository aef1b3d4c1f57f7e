//! ip-locator - IP geolocation service with ordered driver fallback
//!
//! This is the composition root that wires together all the components.

use ip_locator::adapters::inbound::ApiServer;
use ip_locator::adapters::outbound::{compose_chain, DashMapMetricsStore};
use ip_locator::application::LocationService;
use ip_locator::config::load_config;
use ip_locator::domain::ports::ResolutionMetrics;
use ip_locator::infrastructure::shutdown_signal;
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment
    let cfg = load_config()?;

    // Setup logging
    let log_level = if cfg.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_span_events(FmtSpan::CLOSE)
        .init();

    tracing::info!(
        "starting ip-locator listen={} chain={}",
        cfg.listen_addr,
        cfg.driver_names().join(" -> ")
    );

    // ===== COMPOSITION ROOT =====

    // 1. Outbound adapters: metrics store and driver chain
    let metrics: Arc<dyn ResolutionMetrics> = Arc::new(DashMapMetricsStore::new());
    let chain = compose_chain(&cfg, Some(metrics))?;

    // 2. Application service
    let mut service = LocationService::new(Arc::new(chain));
    if cfg.testing_enabled {
        tracing::warn!("testing mode enabled: every lookup uses {}", cfg.testing_ip);
        service = service.with_testing_ip(cfg.testing_ip);
    }

    // 3. Inbound adapter
    let server = ApiServer::new(cfg.listen_addr.clone(), Arc::new(service), cfg.trust_forwarded);
    tokio::spawn(shutdown_signal(server.shutdown_controller()));

    server.run().await?;
    tracing::info!("ip-locator stopped");
    Ok(())
}
