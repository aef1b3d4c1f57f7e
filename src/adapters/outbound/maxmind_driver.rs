//! MaxMind Driver
//!
//! Implements LocationDriver using a local MaxMind GeoIP2 / GeoLite2
//! database. City databases yield full records; Country databases yield
//! only the country fields.

use crate::domain::entities::Position;
use crate::domain::errors::ChainError;
use crate::domain::ports::{LocationDriver, Requestable};
use crate::domain::value_objects::{DriverKind, RawLocation};
use async_trait::async_trait;
use maxminddb::Reader;
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
struct Named {
    iso_code: Option<String>,
    names: Option<BTreeMap<String, String>>,
}

impl Named {
    fn english(&self) -> Option<String> {
        self.names.as_ref()?.get("en").cloned()
    }
}

#[derive(Debug, Default, Deserialize)]
struct Location {
    latitude: Option<f64>,
    longitude: Option<f64>,
    metro_code: Option<u16>,
    time_zone: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Postal {
    code: Option<String>,
}

/// Subset of the GeoIP2 City record this driver reads.
#[derive(Debug, Default, Deserialize)]
struct CityRecord {
    country: Option<Named>,
    city: Option<Named>,
    subdivisions: Option<Vec<Named>>,
    location: Option<Location>,
    postal: Option<Postal>,
}

impl CityRecord {
    fn into_raw(self) -> RawLocation {
        let country = self.country.unwrap_or_default();
        let city = self.city.unwrap_or_default();
        let region = self
            .subdivisions
            .and_then(|s| s.into_iter().next())
            .unwrap_or_default();
        let location = self.location.unwrap_or_default();

        let value = json!({
            "country_name": country.english(),
            "country_code": country.iso_code,
            "city_name": city.english(),
            "region_name": region.english(),
            "region_code": region.iso_code,
            "postal_code": self.postal.and_then(|p| p.code),
            "latitude": location.latitude,
            "longitude": location.longitude,
            "metro_code": location.metro_code,
            "time_zone": location.time_zone,
        });

        RawLocation::from_value(value).unwrap_or_default()
    }
}

/// MaxMind database driver.
///
/// The reader is memory-resident and shared; lookups never block on I/O.
pub struct MaxMindDriver {
    reader: Arc<Reader<Vec<u8>>>,
}

impl MaxMindDriver {
    /// Load a database from a file path.
    pub fn from_file(path: &str) -> Result<Self, ChainError> {
        let reader = Reader::open_readfile(path).map_err(|e| ChainError::DriverInit {
            driver: DriverKind::MaxMind.as_str().to_string(),
            reason: format!("{}: {}", path, e),
        })?;
        Ok(Self {
            reader: Arc::new(reader),
        })
    }

    /// Load a database from raw bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ChainError> {
        let reader = Reader::from_source(bytes).map_err(|e| ChainError::DriverInit {
            driver: DriverKind::MaxMind.as_str().to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            reader: Arc::new(reader),
        })
    }

    /// Database type from the metadata, e.g. `GeoLite2-City`.
    pub fn database_type(&self) -> &str {
        &self.reader.metadata.database_type
    }
}

#[async_trait]
impl LocationDriver for MaxMindDriver {
    fn name(&self) -> &str {
        DriverKind::MaxMind.identity()
    }

    async fn process(&self, request: &dyn Requestable) -> Option<RawLocation> {
        match self.reader.lookup::<CityRecord>(request.ip()) {
            Ok(record) => Some(record.into_raw()),
            Err(e) => {
                tracing::debug!("maxmind lookup for {} failed: {}", request.ip(), e);
                None
            }
        }
    }

    fn hydrate(&self, position: Position, raw: &RawLocation) -> Position {
        hydrate_record(position, raw)
    }
}

/// Field mapping for payloads built by `CityRecord::into_raw`.
fn hydrate_record(mut position: Position, raw: &RawLocation) -> Position {
    position.country_name = raw.text("country_name");
    position.country_code = raw.text("country_code");
    position.city_name = raw.text("city_name");
    position.region_name = raw.text("region_name");
    position.region_code = raw.text("region_code");
    position.postal_code = raw.text("postal_code");
    position.latitude = raw.coordinate("latitude");
    position.longitude = raw.coordinate("longitude");
    position.metro_code = raw.text("metro_code");
    position.timezone = raw.text("time_zone");
    position
}
