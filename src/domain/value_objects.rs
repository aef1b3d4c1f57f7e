//! Value Objects - Immutable domain primitives
//!
//! Value objects are defined by their attributes, not identity.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Raw, provider-shaped location payload returned by a driver's fetch step.
///
/// This is the untranslated JSON object exactly as the provider sent it
/// (or, for local sources, as the driver assembled it). Field names are
/// provider-specific; drivers translate them during hydration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawLocation(Map<String, Value>);

impl RawLocation {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Build a raw payload from any JSON value.
    ///
    /// Returns None unless the value is a JSON object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// True if every top-level value is empty.
    ///
    /// `null`, `false`, `""`, `[]` and `{}` are empty. Numbers always count
    /// as present, so a latitude of `0.0` is data.
    pub fn is_empty(&self) -> bool {
        self.0.values().all(is_empty_value)
    }

    /// Get a raw value by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Get a value by dotted path (e.g. `time_zone.name`).
    pub fn path(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.0.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    /// Get a non-empty string at the given path.
    ///
    /// Numbers are rendered as strings, since some providers send codes
    /// (postal, metro, area) as integers.
    pub fn text(&self, path: &str) -> Option<String> {
        match self.path(path)? {
            Value::String(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Get a finite coordinate at the given path.
    ///
    /// Accepts JSON numbers and numeric strings.
    pub fn coordinate(&self, path: &str) -> Option<f64> {
        let value = match self.path(path)? {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        value.is_finite().then_some(value)
    }

    pub fn field_count(&self) -> usize {
        self.0.len()
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for RawLocation {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Whether a single JSON value is empty for emptiness checks.
pub(crate) fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Number(_) => false,
    }
}

/// Known location drivers.
///
/// Used by configuration to name the drivers composing the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverKind {
    IpApi,
    IpInfo,
    IpData,
    GeoPlugin,
    MaxMind,
    Cloudflare,
}

impl DriverKind {
    /// All known drivers, in documentation order.
    pub const ALL: [DriverKind; 6] = [
        DriverKind::IpApi,
        DriverKind::IpInfo,
        DriverKind::IpData,
        DriverKind::GeoPlugin,
        DriverKind::MaxMind,
        DriverKind::Cloudflare,
    ];

    /// Parse a configuration name (case-insensitive).
    ///
    /// Returns None for unknown names; callers decide whether that is fatal.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "ipapi" | "ip-api" => Some(DriverKind::IpApi),
            "ipinfo" => Some(DriverKind::IpInfo),
            "ipdata" => Some(DriverKind::IpData),
            "geoplugin" => Some(DriverKind::GeoPlugin),
            "maxmind" => Some(DriverKind::MaxMind),
            "cloudflare" => Some(DriverKind::Cloudflare),
            _ => None,
        }
    }

    /// Configuration name.
    pub fn as_str(&self) -> &'static str {
        match self {
            DriverKind::IpApi => "ipapi",
            DriverKind::IpInfo => "ipinfo",
            DriverKind::IpData => "ipdata",
            DriverKind::GeoPlugin => "geoplugin",
            DriverKind::MaxMind => "maxmind",
            DriverKind::Cloudflare => "cloudflare",
        }
    }

    /// Identity written into `Position::driver`.
    pub fn identity(&self) -> &'static str {
        match self {
            DriverKind::IpApi => "IpApi",
            DriverKind::IpInfo => "IpInfo",
            DriverKind::IpData => "IpData",
            DriverKind::GeoPlugin => "GeoPlugin",
            DriverKind::MaxMind => "MaxMind",
            DriverKind::Cloudflare => "Cloudflare",
        }
    }
}

impl std::fmt::Display for DriverKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
