//! Cloudflare Driver
//!
//! Implements LocationDriver from the visitor-location headers Cloudflare
//! adds to proxied requests. No network I/O is performed.

use crate::domain::entities::Position;
use crate::domain::ports::{LocationDriver, Requestable};
use crate::domain::value_objects::{DriverKind, RawLocation};
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Headers read from the request, in the order they are copied.
pub const CLOUDFLARE_HEADERS: [&str; 9] = [
    "cf-ipcountry",
    "cf-ipcity",
    "cf-region",
    "cf-region-code",
    "cf-postal-code",
    "cf-iplatitude",
    "cf-iplongitude",
    "cf-timezone",
    "cf-metro-code",
];

/// Country values meaning "unknown" (XX) and "Tor exit node" (T1).
const UNKNOWN_COUNTRIES: [&str; 2] = ["XX", "T1"];

#[derive(Debug, Default, Clone, Copy)]
pub struct CloudflareDriver;

impl CloudflareDriver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LocationDriver for CloudflareDriver {
    fn name(&self) -> &str {
        DriverKind::Cloudflare.identity()
    }

    async fn process(&self, request: &dyn Requestable) -> Option<RawLocation> {
        let country = request.header("cf-ipcountry")?.trim();
        if country.is_empty() || UNKNOWN_COUNTRIES.contains(&country.to_ascii_uppercase().as_str()) {
            tracing::debug!("cloudflare country unknown for {}", request.ip());
            return None;
        }

        let fields: Map<String, Value> = CLOUDFLARE_HEADERS
            .iter()
            .filter_map(|name| {
                request
                    .header(name)
                    .map(|value| (name.to_string(), Value::String(value.trim().to_string())))
            })
            .collect();

        Some(RawLocation::new(fields))
    }

    fn hydrate(&self, mut position: Position, raw: &RawLocation) -> Position {
        position.country_code = raw.text("cf-ipcountry").map(|c| c.to_ascii_uppercase());
        position.city_name = raw.text("cf-ipcity");
        position.region_name = raw.text("cf-region");
        position.region_code = raw.text("cf-region-code");
        position.postal_code = raw.text("cf-postal-code");
        position.latitude = raw.coordinate("cf-iplatitude");
        position.longitude = raw.coordinate("cf-iplongitude");
        position.timezone = raw.text("cf-timezone");
        position.metro_code = raw.text("cf-metro-code");
        position
    }
}
