use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_IMSI: &str = "000000000000000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidNumber { key: &'static str, value: String },
    #[error("unknown timezone {0:?}")]
    UnknownTimezone(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("inventory is empty")]
    EmptyInventory,
}

// ─── Node side ───────────────────────────────────────────────────────────────

/// Site and panel parameters of one node. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeConfig {
    pub imsi: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: Tz,
    pub tilt_deg: f64,
    pub azimuth_deg: f64,
    /// Rated DC power (W)
    pub rated_power_w: f64,
    /// Power temperature coefficient (1/°C)
    pub temp_coefficient: f64,
}

impl NodeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys take the documented defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let number = |key: &'static str, default: &str| -> Result<f64, ConfigError> {
            let raw = lookup(key).unwrap_or_else(|| default.to_string());
            match raw.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(v),
                _ => Err(ConfigError::InvalidNumber { key, value: raw }),
            }
        };

        let tz_name = lookup("SOLAR_TZ").unwrap_or_else(|| "Europe/Madrid".to_string());
        let timezone = tz_name
            .parse::<Tz>()
            .map_err(|_| ConfigError::UnknownTimezone(tz_name.clone()))?;

        Ok(Self {
            imsi: imsi_from(&lookup),
            latitude: number("SOLAR_LAT", "40.4168")?,
            longitude: number("SOLAR_LON", "-3.7038")?,
            timezone,
            tilt_deg: number("SOLAR_TILT", "30")?,
            azimuth_deg: number("SOLAR_AZIMUTH", "180")?,
            rated_power_w: number("SOLAR_POWER", "400")?,
            temp_coefficient: number("SOLAR_COEFF", "-0.004")?,
        })
    }
}

/// The subscriber id is readable even when the rest of the config is not, so
/// an unconfigured node still identifies itself.
pub fn imsi_from<F>(lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup("SOLAR_IMSI").unwrap_or_else(|| DEFAULT_IMSI.to_string())
}

/// Process settings of the node binary (not part of the site model).
#[derive(Debug, Clone)]
pub struct NodeSettings {
    pub port: u16,
    pub metrics_file: PathBuf,
    pub poll_interval: Duration,
    pub weather_base_url: String,
    pub weather_timeout: Duration,
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            port: 5000,
            metrics_file: PathBuf::from("/tmp/solar_metrics.json"),
            poll_interval: Duration::from_secs(60),
            weather_base_url: "https://api.open-meteo.com".to_string(),
            weather_timeout: Duration::from_secs(5),
        }
    }
}

impl NodeSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Unparseable values keep their default. The poll interval is at least
    /// one second.
    pub fn from_lookup<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        Self {
            port: var("PORT").and_then(|v| v.parse().ok()).unwrap_or(d.port),
            metrics_file: var("SOLAR_METRICS_FILE").map(PathBuf::from).unwrap_or(d.metrics_file),
            poll_interval: var("SOLAR_POLL_INTERVAL_S")
                .and_then(|v| v.parse::<u64>().ok())
                .map(|s| Duration::from_secs(s.max(1)))
                .unwrap_or(d.poll_interval),
            weather_base_url: var("SOLAR_WEATHER_URL").unwrap_or(d.weather_base_url),
            weather_timeout: d.weather_timeout,
        }
    }
}

// ─── Gateway side ────────────────────────────────────────────────────────────

fn default_sweep_interval_s() -> u64 { 60 }
fn default_poll_timeout_ms() -> u64 { 2000 }

const MIN_POLL_TIMEOUT_MS: u64 = 100;
fn default_origin_host() -> String { "gateway.pyrphoros.net".to_string() }
fn default_service_context() -> String { "solar-metering@pyrphoros.net".to_string() }
fn default_hss_host() -> String { "127.0.0.1".to_string() }
fn default_node_port() -> u16 { 5000 }
fn default_realm() -> String { "pyrphoros.net".to_string() }

#[derive(Debug, Deserialize, Clone)]
pub struct GatewayConfig {
    #[serde(default = "default_sweep_interval_s")]
    pub sweep_interval_s: u64,
    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,
    #[serde(default = "default_origin_host")]
    pub origin_host: String,
    #[serde(default = "default_service_context")]
    pub service_context_id: String,
    #[serde(default = "default_hss_host")]
    pub hss_host: String,
    pub nodes: Vec<InventoryEntry>,
}

/// One solar node the gateway polls.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct InventoryEntry {
    pub hostname: String,
    pub ip: String,
    #[serde(default = "default_node_port")]
    pub port: u16,
    #[serde(default = "default_realm")]
    pub realm: String,
}

impl InventoryEntry {
    pub fn snapshot_url(&self) -> String {
        format!("http://{}:{}/api/solar", self.ip, self.port)
    }
}

impl GatewayConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if config.nodes.is_empty() {
            return Err(ConfigError::EmptyInventory);
        }
        Ok(config)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_s.max(1))
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms.max(MIN_POLL_TIMEOUT_MS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn unset_environment_uses_defaults() {
        let cfg = NodeConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.imsi, DEFAULT_IMSI);
        assert_eq!(cfg.latitude, 40.4168);
        assert_eq!(cfg.longitude, -3.7038);
        assert_eq!(cfg.timezone, chrono_tz::Europe::Madrid);
        assert_eq!(cfg.tilt_deg, 30.0);
        assert_eq!(cfg.azimuth_deg, 180.0);
        assert_eq!(cfg.rated_power_w, 400.0);
        assert_eq!(cfg.temp_coefficient, -0.004);
    }

    #[test]
    fn bad_number_is_a_config_error() {
        let err = NodeConfig::from_lookup(lookup(&[("SOLAR_POWER", "four hundred")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { key: "SOLAR_POWER", .. }));
    }

    #[test]
    fn unknown_timezone_is_a_config_error() {
        let err = NodeConfig::from_lookup(lookup(&[("SOLAR_TZ", "Mars/Olympus")])).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownTimezone(_)));
    }

    #[test]
    fn node_settings_from_lookup() {
        let s = NodeSettings::from_lookup(lookup(&[
            ("PORT", "8081"),
            ("SOLAR_METRICS_FILE", "/var/lib/solar/metrics.json"),
            ("SOLAR_POLL_INTERVAL_S", "15"),
        ]));
        assert_eq!(s.port, 8081);
        assert_eq!(s.metrics_file, PathBuf::from("/var/lib/solar/metrics.json"));
        assert_eq!(s.poll_interval, Duration::from_secs(15));

        let s = NodeSettings::from_lookup(lookup(&[("PORT", "http"), ("SOLAR_POLL_INTERVAL_S", "soon")]));
        assert_eq!(s.port, 5000);
        assert_eq!(s.poll_interval, Duration::from_secs(60));
    }

    #[test]
    fn zero_poll_interval_is_floored() {
        let s = NodeSettings::from_lookup(lookup(&[("SOLAR_POLL_INTERVAL_S", "0")]));
        assert_eq!(s.poll_interval, Duration::from_secs(1));
    }

    #[test]
    fn zero_gateway_timings_are_floored() {
        let cfg: GatewayConfig = serde_json::from_str(
            r#"{"sweep_interval_s": 0, "poll_timeout_ms": 0, "nodes": [{"hostname": "casa1", "ip": "10.0.0.11"}]}"#,
        )
        .unwrap();
        assert_eq!(cfg.sweep_interval(), Duration::from_secs(1));
        assert_eq!(cfg.poll_timeout(), Duration::from_millis(100));
    }

    #[test]
    fn gateway_inventory_loads_with_defaults() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(
            f,
            r#"{{"nodes": [{{"hostname": "casa1", "ip": "10.0.0.11"}}, {{"hostname": "casa2", "ip": "10.0.0.12", "port": 8080, "realm": "example.net"}}]}}"#
        )
        .unwrap();

        let cfg = GatewayConfig::load(f.path()).unwrap();
        assert_eq!(cfg.nodes.len(), 2);
        assert_eq!(cfg.nodes[0].port, 5000);
        assert_eq!(cfg.nodes[0].realm, "pyrphoros.net");
        assert_eq!(cfg.nodes[1].snapshot_url(), "http://10.0.0.12:8080/api/solar");
        assert_eq!(cfg.sweep_interval(), Duration::from_secs(60));
        assert_eq!(cfg.poll_timeout(), Duration::from_secs(2));
        assert_eq!(cfg.origin_host, "gateway.pyrphoros.net");
    }

    #[test]
    fn empty_inventory_is_rejected() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{"nodes": []}}"#).unwrap();
        assert!(matches!(GatewayConfig::load(f.path()), Err(ConfigError::EmptyInventory)));
    }
}
