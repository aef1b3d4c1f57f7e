use serde::Deserialize;
use std::net::IpAddr;

/// Default testing address (a Google range that every provider knows).
pub const DEFAULT_TESTING_IP: &str = "66.102.0.0";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    // Core settings
    pub listen_addr: String,
    pub debug: bool,

    // Chain composition
    pub driver: String,
    pub fallbacks: Vec<String>,

    // HTTP drivers
    pub http_timeout_secs: u64,
    pub http_connect_timeout_secs: u64,

    // Provider credentials
    pub ipapi_token: Option<String>,
    pub ipinfo_token: Option<String>,
    pub ipdata_token: Option<String>,
    pub maxmind_db_path: Option<String>,

    // Testing mode
    pub testing_enabled: bool,
    pub testing_ip: IpAddr,

    // Caller address
    pub trust_forwarded: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            debug: false,
            driver: "ipapi".to_string(),
            fallbacks: vec!["ipinfo".to_string(), "geoplugin".to_string()],
            http_timeout_secs: 3,
            http_connect_timeout_secs: 3,
            ipapi_token: None,
            ipinfo_token: None,
            ipdata_token: None,
            maxmind_db_path: None,
            testing_enabled: false,
            testing_ip: default_testing_ip(),
            trust_forwarded: false,
        }
    }
}

impl Config {
    /// Driver names in chain order: primary first, then fallbacks.
    pub fn driver_names(&self) -> Vec<String> {
        std::iter::once(self.driver.clone())
            .chain(self.fallbacks.iter().cloned())
            .collect()
    }
}

fn default_testing_ip() -> IpAddr {
    IpAddr::from([66, 102, 0, 0])
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(false)
}

/// Non-empty secret from the environment.
fn env_secret(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn load_config() -> anyhow::Result<Config> {
    let listen_addr = std::env::var("LOCATOR_LISTEN_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let debug = std::env::var("DEBUG").is_ok();

    let driver = std::env::var("LOCATOR_DRIVER")
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|_| "ipapi".to_string());

    let fallbacks = std::env::var("LOCATOR_FALLBACKS")
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_else(|_| vec!["ipinfo".to_string(), "geoplugin".to_string()]);

    let http_timeout_secs = std::env::var("LOCATOR_HTTP_TIMEOUT_SECS")
        .unwrap_or_else(|_| "3".to_string())
        .parse()
        .unwrap_or(3);

    let http_connect_timeout_secs = std::env::var("LOCATOR_HTTP_CONNECT_TIMEOUT_SECS")
        .unwrap_or_else(|_| "3".to_string())
        .parse()
        .unwrap_or(3);

    let ipapi_token = env_secret("LOCATOR_IPAPI_TOKEN");
    let ipinfo_token = env_secret("LOCATOR_IPINFO_TOKEN");
    let ipdata_token = env_secret("LOCATOR_IPDATA_TOKEN");
    let maxmind_db_path = env_secret("LOCATOR_MAXMIND_DB_PATH");

    // Testing mode
    let testing_enabled = env_flag("LOCATOR_TESTING_ENABLED");

    let testing_ip = match std::env::var("LOCATOR_TESTING_IP") {
        Ok(v) => v
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid LOCATOR_TESTING_IP {:?}: {}", v, e))?,
        Err(_) => default_testing_ip(),
    };

    let trust_forwarded = env_flag("LOCATOR_TRUST_FORWARDED");

    Ok(Config {
        listen_addr,
        debug,
        driver,
        fallbacks,
        http_timeout_secs,
        http_connect_timeout_secs,
        ipapi_token,
        ipinfo_token,
        ipdata_token,
        maxmind_db_path,
        testing_enabled,
        testing_ip,
        trust_forwarded,
    })
}
