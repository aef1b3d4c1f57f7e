//! ip-api.com Driver
//!
//! Implements LocationDriver using the ip-api.com JSON endpoint. With a key
//! configured, the pro endpoint is used instead.
//!
//! See: https://ip-api.com/docs/api:json

use crate::adapters::outbound::http_fetch::{fetch_object, normalize_base};
use crate::domain::entities::Position;
use crate::domain::ports::{LocationDriver, Requestable};
use crate::domain::value_objects::{DriverKind, RawLocation};
use async_trait::async_trait;

/// Free endpoint (HTTP only, rate limited).
pub const IP_API_URL: &str = "http://ip-api.com";
/// Paid endpoint, used when a key is configured.
pub const IP_API_PRO_URL: &str = "https://pro.ip-api.com";
/// Fields requested on every lookup. `currency` is not in the default set.
pub const IP_API_FIELDS: &str =
    "status,message,country,countryCode,region,regionName,city,zip,lat,lon,timezone,currency,isp,query";

pub struct IpApiDriver {
    client: reqwest::Client,
    base_url: String,
    key: Option<String>,
}

impl IpApiDriver {
    /// Free endpoint, or the pro endpoint when a key is given.
    pub fn new(client: reqwest::Client, key: Option<String>) -> Self {
        let base_url = if key.is_some() { IP_API_PRO_URL } else { IP_API_URL };
        Self {
            client,
            base_url: base_url.to_string(),
            key,
        }
    }

    /// Point the driver at a different host (mirrors, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = normalize_base(base_url);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl LocationDriver for IpApiDriver {
    fn name(&self) -> &str {
        DriverKind::IpApi.identity()
    }

    async fn process(&self, request: &dyn Requestable) -> Option<RawLocation> {
        let url = format!("{}/json/{}", self.base_url, request.ip());
        let mut query = vec![("fields", IP_API_FIELDS)];
        if let Some(key) = &self.key {
            query.push(("key", key.as_str()));
        }

        match fetch_object(&self.client, &url, &query).await {
            Ok(raw) => Some(raw),
            Err(e) => {
                tracing::warn!("ip-api lookup for {} failed: {}", request.ip(), e);
                None
            }
        }
    }

    fn hydrate(&self, mut position: Position, raw: &RawLocation) -> Position {
        // Failure answers ({"status":"fail","message":...}) carry no location
        // fields and hydrate to an empty position.
        position.country_name = raw.text("country");
        position.country_code = raw.text("countryCode");
        position.region_code = raw.text("region");
        position.region_name = raw.text("regionName");
        position.city_name = raw.text("city");
        position.zip_code = raw.text("zip");
        position.latitude = raw.coordinate("lat");
        position.longitude = raw.coordinate("lon");
        position.area_code = raw.text("region");
        position.timezone = raw.text("timezone");
        position.currency_code = raw.text("currency");
        position.isp = raw.text("isp");
        position
    }
}
