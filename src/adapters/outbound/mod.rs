mod cloudflare_driver;
mod dashmap_metrics_store;
mod geoplugin_driver;
mod http_fetch;
mod ip_api_driver;
mod ipdata_driver;
mod ipinfo_driver;
mod maxmind_driver;

pub use cloudflare_driver::{CloudflareDriver, CLOUDFLARE_HEADERS};
pub use dashmap_metrics_store::DashMapMetricsStore;
pub use geoplugin_driver::GeoPluginDriver;
pub use http_fetch::HttpSettings;
pub use ip_api_driver::IpApiDriver;
pub use ipdata_driver::IpDataDriver;
pub use ipinfo_driver::IpInfoDriver;
pub use maxmind_driver::MaxMindDriver;

use crate::config::Config;
use crate::domain::errors::ChainError;
use crate::domain::ports::{LocationDriver, ResolutionMetrics};
use crate::domain::services::ResolutionChain;
use crate::domain::value_objects::DriverKind;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Construct one driver from configuration.
pub fn build_driver(
    kind: DriverKind,
    cfg: &Config,
    client: &reqwest::Client,
) -> Result<Arc<dyn LocationDriver>, ChainError> {
    let driver: Arc<dyn LocationDriver> = match kind {
        DriverKind::IpApi => Arc::new(IpApiDriver::new(client.clone(), cfg.ipapi_token.clone())),
        DriverKind::IpInfo => Arc::new(IpInfoDriver::new(client.clone(), cfg.ipinfo_token.clone())),
        DriverKind::IpData => {
            let key = cfg
                .ipdata_token
                .clone()
                .ok_or_else(|| ChainError::MissingCredential {
                    driver: kind.as_str().to_string(),
                    setting: "LOCATOR_IPDATA_TOKEN".to_string(),
                })?;
            Arc::new(IpDataDriver::new(client.clone(), key))
        }
        DriverKind::GeoPlugin => Arc::new(GeoPluginDriver::new(client.clone())),
        DriverKind::MaxMind => {
            let path = cfg
                .maxmind_db_path
                .as_deref()
                .ok_or_else(|| ChainError::MissingCredential {
                    driver: kind.as_str().to_string(),
                    setting: "LOCATOR_MAXMIND_DB_PATH".to_string(),
                })?;
            let driver = MaxMindDriver::from_file(path)?;
            tracing::info!("maxmind database {} loaded from {}", driver.database_type(), path);
            Arc::new(driver)
        }
        DriverKind::Cloudflare => Arc::new(CloudflareDriver::new()),
    };
    Ok(driver)
}

/// Compose the configured chain: primary driver first, then fallbacks.
///
/// An unknown or repeated name, a missing credential or an unloadable
/// database aborts composition.
pub fn compose_chain(
    cfg: &Config,
    metrics: Option<Arc<dyn ResolutionMetrics>>,
) -> Result<ResolutionChain, ChainError> {
    let client = HttpSettings {
        timeout: Duration::from_secs(cfg.http_timeout_secs),
        connect_timeout: Duration::from_secs(cfg.http_connect_timeout_secs),
    }
    .client()?;

    let mut builder = ResolutionChain::builder();
    let mut seen = HashSet::new();
    for name in cfg.driver_names() {
        let kind = DriverKind::parse(&name).ok_or_else(|| ChainError::UnknownDriver(name.clone()))?;
        // Drivers built from config are identical per kind.
        if !seen.insert(kind) {
            return Err(ChainError::DuplicateDriver(kind.identity().to_string()));
        }
        builder = builder.fallback(build_driver(kind, cfg, &client)?);
    }

    if let Some(metrics) = metrics {
        builder = builder.metrics(metrics);
    }

    builder.build()
}
