//! ipdata.co Driver
//!
//! Implements LocationDriver using the ipdata.co API. An API key is required.

use crate::adapters::outbound::http_fetch::{fetch_object, normalize_base};
use crate::domain::entities::Position;
use crate::domain::ports::{LocationDriver, Requestable};
use crate::domain::value_objects::{DriverKind, RawLocation};
use async_trait::async_trait;

pub const IPDATA_URL: &str = "https://api.ipdata.co";

pub struct IpDataDriver {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl IpDataDriver {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: IPDATA_URL.to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = normalize_base(base_url);
        self
    }
}

#[async_trait]
impl LocationDriver for IpDataDriver {
    fn name(&self) -> &str {
        DriverKind::IpData.identity()
    }

    async fn process(&self, request: &dyn Requestable) -> Option<RawLocation> {
        let url = format!("{}/{}", self.base_url, request.ip());

        match fetch_object(&self.client, &url, &[("api-key", self.api_key.as_str())]).await {
            Ok(raw) => Some(raw),
            Err(e) => {
                tracing::warn!("ipdata lookup for {} failed: {}", request.ip(), e);
                None
            }
        }
    }

    fn hydrate(&self, mut position: Position, raw: &RawLocation) -> Position {
        position.country_name = raw.text("country_name");
        position.country_code = raw.text("country_code");
        position.region_name = raw.text("region");
        position.region_code = raw.text("region_code");
        position.city_name = raw.text("city");
        position.postal_code = raw.text("postal");
        position.latitude = raw.coordinate("latitude");
        position.longitude = raw.coordinate("longitude");
        position.timezone = raw.text("time_zone.name");
        position.currency_code = raw.text("currency.code");
        position.isp = raw.text("asn.name");

        if let Some(asn) = raw.text("asn.asn") {
            position.extra.insert("asn".to_string(), asn.into());
        }

        position
    }
}
