//! geoPlugin Driver
//!
//! Implements LocationDriver using the geoplugin.net JSON web service.

use crate::adapters::outbound::http_fetch::{fetch_object, normalize_base};
use crate::domain::entities::Position;
use crate::domain::ports::{LocationDriver, Requestable};
use crate::domain::value_objects::{DriverKind, RawLocation};
use async_trait::async_trait;

pub const GEOPLUGIN_URL: &str = "http://www.geoplugin.net";

pub struct GeoPluginDriver {
    client: reqwest::Client,
    base_url: String,
}

impl GeoPluginDriver {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: GEOPLUGIN_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = normalize_base(base_url);
        self
    }
}

#[async_trait]
impl LocationDriver for GeoPluginDriver {
    fn name(&self) -> &str {
        DriverKind::GeoPlugin.identity()
    }

    async fn process(&self, request: &dyn Requestable) -> Option<RawLocation> {
        let url = format!("{}/json.gp", self.base_url);
        let ip = request.ip().to_string();

        match fetch_object(&self.client, &url, &[("ip", ip.as_str())]).await {
            Ok(raw) => Some(raw),
            Err(e) => {
                tracing::warn!("geoplugin lookup for {} failed: {}", ip, e);
                None
            }
        }
    }

    fn hydrate(&self, mut position: Position, raw: &RawLocation) -> Position {
        // geoPlugin echoes request metadata (geoplugin_request, _status,
        // _credit, ...) on every answer, so an unknown address is never
        // raw-empty; it simply maps to an empty position.
        position.country_name = raw.text("geoplugin_countryName");
        position.country_code = raw.text("geoplugin_countryCode");
        position.currency_code = raw.text("geoplugin_currencyCode");
        position.region_code = raw.text("geoplugin_regionCode");
        position.region_name = raw.text("geoplugin_regionName");
        position.city_name = raw.text("geoplugin_city");
        position.latitude = raw.coordinate("geoplugin_latitude");
        position.longitude = raw.coordinate("geoplugin_longitude");
        position.metro_code = raw.text("geoplugin_dmaCode");
        position.area_code = raw.text("geoplugin_areaCode");
        position.timezone = raw.text("geoplugin_timezone");
        position
    }
}
