//! Shared HTTP plumbing for web-API drivers.

use crate::domain::errors::ChainError;
use crate::domain::value_objects::RawLocation;
use std::time::Duration;

/// Timeouts applied to every outbound provider request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpSettings {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(3),
            connect_timeout: Duration::from_secs(3),
        }
    }
}

impl HttpSettings {
    /// Build a client honoring these timeouts.
    ///
    /// One client is shared by all HTTP drivers so they share its pool.
    pub fn client(&self) -> Result<reqwest::Client, ChainError> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(concat!("ip-locator/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ChainError::DriverInit {
                driver: "http".to_string(),
                reason: e.to_string(),
            })
    }
}

/// GET a URL and parse the body as a JSON object.
///
/// Non-2xx statuses, non-JSON bodies and non-object JSON are errors.
pub(crate) async fn fetch_object(
    client: &reqwest::Client,
    url: &str,
    query: &[(&str, &str)],
) -> anyhow::Result<RawLocation> {
    let response = client.get(url).query(query).send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("provider returned {} - {}", status, body);
    }

    let body: serde_json::Value = response.json().await?;
    RawLocation::from_value(body).ok_or_else(|| anyhow::anyhow!("provider returned non-object JSON"))
}

/// Trim a trailing slash so paths can be appended with `/`.
pub(crate) fn normalize_base(url: impl Into<String>) -> String {
    let url = url.into();
    url.trim_end_matches('/').to_string()
}
