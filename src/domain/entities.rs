//! Domain Entities - Core business objects
//!
//! These entities represent the core concepts of the location domain.
//! They have no external dependencies beyond serde and contain only
//! business logic.

use crate::domain::ports::Requestable;
use crate::domain::value_objects::is_empty_value;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::net::IpAddr;

/// Normalized location record produced by a driver.
///
/// Every field is optional. Drivers fill in what their provider knows;
/// the chain stamps `ip` and `driver` after hydration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Source address of the resolved request
    pub ip: Option<String>,
    /// Identity of the driver that produced this record
    pub driver: Option<String>,
    pub country_name: Option<String>,
    /// Country code (ISO 3166-1 alpha-2)
    pub country_code: Option<String>,
    /// Currency code (ISO 4217)
    pub currency_code: Option<String>,
    pub region_code: Option<String>,
    pub region_name: Option<String>,
    pub city_name: Option<String>,
    pub zip_code: Option<String>,
    pub postal_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub metro_code: Option<String>,
    pub area_code: Option<String>,
    /// IANA time zone name
    pub timezone: Option<String>,
    pub isp: Option<String>,
    /// Provider-specific scalars with no dedicated field
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Position {
    /// Whether this position carries no location data.
    ///
    /// `ip` and `driver` are ignored: a record holding only those two
    /// fields is still empty.
    pub fn is_empty(&self) -> bool {
        let texts = [
            &self.country_name,
            &self.country_code,
            &self.currency_code,
            &self.region_code,
            &self.region_name,
            &self.city_name,
            &self.zip_code,
            &self.postal_code,
            &self.metro_code,
            &self.area_code,
            &self.timezone,
            &self.isp,
        ];

        texts
            .iter()
            .all(|field| field.as_deref().map_or(true, str::is_empty))
            && self.latitude.is_none()
            && self.longitude.is_none()
            && self.extra.values().all(is_empty_value)
    }
}

/// A lookup request: the caller's address plus any request headers.
///
/// Header names are stored lowercased so lookups are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationRequest {
    pub ip: IpAddr,
    headers: HashMap<String, String>,
}

impl LocationRequest {
    pub fn new(ip: IpAddr) -> Self {
        Self {
            ip,
            headers: HashMap::new(),
        }
    }

    /// Attach a request header.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }
}

impl Requestable for LocationRequest {
    fn ip(&self) -> IpAddr {
        self.ip
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}
