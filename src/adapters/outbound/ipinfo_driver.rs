//! ipinfo.io Driver
//!
//! Implements LocationDriver using the ipinfo.io JSON API.

use crate::adapters::outbound::http_fetch::{fetch_object, normalize_base};
use crate::domain::entities::Position;
use crate::domain::ports::{LocationDriver, Requestable};
use crate::domain::value_objects::{DriverKind, RawLocation};
use async_trait::async_trait;

pub const IPINFO_URL: &str = "https://ipinfo.io";

/// ipinfo.io driver. The token is optional; anonymous use is rate limited.
pub struct IpInfoDriver {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl IpInfoDriver {
    pub fn new(client: reqwest::Client, token: Option<String>) -> Self {
        Self {
            client,
            base_url: IPINFO_URL.to_string(),
            token,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = normalize_base(base_url);
        self
    }
}

/// Split ipinfo's `"lat,lon"` string.
fn split_loc(loc: &str) -> Option<(f64, f64)> {
    let (lat, lon) = loc.split_once(',')?;
    let lat: f64 = lat.trim().parse().ok()?;
    let lon: f64 = lon.trim().parse().ok()?;
    (lat.is_finite() && lon.is_finite()).then_some((lat, lon))
}

#[async_trait]
impl LocationDriver for IpInfoDriver {
    fn name(&self) -> &str {
        DriverKind::IpInfo.identity()
    }

    async fn process(&self, request: &dyn Requestable) -> Option<RawLocation> {
        let url = format!("{}/{}", self.base_url, request.ip());
        let query: Vec<(&str, &str)> = self.token.iter().map(|t| ("token", t.as_str())).collect();

        match fetch_object(&self.client, &url, &query).await {
            Ok(raw) => Some(raw),
            Err(e) => {
                tracing::warn!("ipinfo lookup for {} failed: {}", request.ip(), e);
                None
            }
        }
    }

    fn hydrate(&self, mut position: Position, raw: &RawLocation) -> Position {
        // Bogon answers ({"ip":..., "bogon":true}) map to nothing.
        position.country_code = raw.text("country");
        position.region_name = raw.text("region");
        position.city_name = raw.text("city");
        position.postal_code = raw.text("postal");
        position.timezone = raw.text("timezone");
        position.isp = raw.text("org");

        if let Some((lat, lon)) = raw.text("loc").as_deref().and_then(split_loc) {
            position.latitude = Some(lat);
            position.longitude = Some(lon);
        }

        position
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;
    use std::net::{IpAddr, Ipv4Addr};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_split_loc() {
        assert_eq!(split_loc("38.9687,-77.3411"), Some((38.9687, -77.3411)));
        assert_eq!(split_loc(" 0.0 , 0.0 "), Some((0.0, 0.0)));
        assert_eq!(split_loc("38.9687"), None);
        assert_eq!(split_loc("north,west"), None);
        assert_eq!(split_loc(""), None);
    }

    #[test]
    fn test_hydrate_maps_fields() {
        let driver = IpInfoDriver::new(reqwest::Client::new(), None);
        let raw = RawLocation::from_value(json!({
            "ip": "1.2.3.4",
            "city": "Reston",
            "region": "Virginia",
            "country": "US",
            "loc": "38.9687,-77.3411",
            "org": "AS701 Verizon Business",
            "postal": "20190",
            "timezone": "America/New_York"
        }))
        .unwrap();

        let position = driver.hydrate(Position::default(), &raw);

        assert_eq!(position.country_code.as_deref(), Some("US"));
        assert_eq!(position.region_name.as_deref(), Some("Virginia"));
        assert_eq!(position.city_name.as_deref(), Some("Reston"));
        assert_eq!(position.postal_code.as_deref(), Some("20190"));
        assert_eq!(position.latitude, Some(38.9687));
        assert_eq!(position.longitude, Some(-77.3411));
        assert_eq!(position.timezone.as_deref(), Some("America/New_York"));
        assert_eq!(position.isp.as_deref(), Some("AS701 Verizon Business"));
    }

    #[test]
    fn test_hydrate_bogon_is_empty() {
        let driver = IpInfoDriver::new(reqwest::Client::new(), None);
        let raw = RawLocation::from_value(json!({"ip": "127.0.0.1", "bogon": true})).unwrap();

        assert!(!raw.is_empty());
        assert!(driver.hydrate(Position::default(), &raw).is_empty());
    }

    #[tokio::test]
    async fn test_process_sends_token() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/1.2.3.4"))
            .and(query_param("token", "abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"country": "US"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let driver = IpInfoDriver::new(reqwest::Client::new(), Some("abc123".to_string()))
            .with_base_url(mock_server.uri());

        let ip = IpAddr::V4(Ipv4Addr::new(1, 2, 3, 4));
        let raw = driver.process(&ip).await.unwrap();
        assert_eq!(raw.text("country"), Some("US".to_string()));
    }

    #[tokio::test]
    async fn test_process_unauthorized_is_absent() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": {"title": "Wrong token"}
            })))
            .mount(&mock_server)
            .await;

        let driver = IpInfoDriver::new(reqwest::Client::new(), Some("bad".to_string()))
            .with_base_url(mock_server.uri());

        let ip = IpAddr::V4(Ipv4Addr::new(1, 2, 3, 4));
        assert!(driver.process(&ip).await.is_none());
    }

    #[test]
    fn test_name() {
        assert_eq!(IpInfoDriver::new(reqwest::Client::new(), None).name(), "IpInfo");
    }
}
