use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ─── Node status ─────────────────────────────────────────────────────────────

/// Lifecycle of a node snapshot. Only `Operational` carries irradiance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeStatus {
    /// No estimation cycle has completed yet
    Initializing,
    Operational,
    /// Startup configuration could not be parsed; permanent until restart
    ConfigError,
    /// Weather fetch or model evaluation failed; retried next cycle
    ComputeError,
}

impl NodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeStatus::Initializing => "INITIALIZING",
            NodeStatus::Operational => "OPERATIONAL",
            NodeStatus::ConfigError => "CONFIG_ERROR",
            NodeStatus::ComputeError => "COMPUTE_ERROR",
        }
    }
}

// ─── Published snapshot ──────────────────────────────────────────────────────

/// Latest telemetry of one node, as served on `GET /api/solar` and written to
/// the snapshot file.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct TelemetrySnapshot {
    /// Subscriber identity of the node (IMSI-like)
    pub imsi: String,
    pub status: NodeStatus,
    /// Cycle time in the node's configured timezone
    pub timestamp: Option<DateTime<FixedOffset>>,
    /// DC power output (W), never negative
    pub power_w: f64,
    /// Cell temperature (°C)
    pub temp_c: f64,
    /// Plane-of-array irradiance (W/m²)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub irradiance: Option<f64>,
    /// Local network throughput (Mbps)
    pub bandwidth_mbps: f64,
}

impl TelemetrySnapshot {
    /// Snapshot served before the first cycle completes.
    pub fn initializing(imsi: impl Into<String>) -> Self {
        Self {
            imsi: imsi.into(),
            status: NodeStatus::Initializing,
            timestamp: None,
            power_w: 0.0,
            temp_c: 0.0,
            irradiance: None,
            bandwidth_mbps: 0.0,
        }
    }

    pub fn config_error(imsi: impl Into<String>) -> Self {
        Self {
            status: NodeStatus::ConfigError,
            ..Self::initializing(imsi)
        }
    }

    pub fn compute_error(
        imsi: impl Into<String>,
        timestamp: DateTime<FixedOffset>,
        bandwidth_mbps: f64,
    ) -> Self {
        Self {
            status: NodeStatus::ComputeError,
            timestamp: Some(timestamp),
            bandwidth_mbps,
            ..Self::initializing(imsi)
        }
    }
}

// ─── Open-Meteo wire types ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CurrentWeatherResponse {
    pub current: CurrentData,
}

#[derive(Debug, Deserialize)]
pub struct CurrentData {
    pub temperature_2m: Option<f64>,
    pub wind_speed_10m: Option<f64>,
    pub direct_radiation: Option<f64>,
    pub diffuse_radiation: Option<f64>,
}

/// Provider observation with missing fields already defaulted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherObservation {
    pub temperature_c: f64,
    pub wind_speed_m_s: f64,
    pub direct_radiation_w_m2: f64,
    pub diffuse_radiation_w_m2: f64,
}

impl From<CurrentData> for WeatherObservation {
    fn from(c: CurrentData) -> Self {
        Self {
            temperature_c: c.temperature_2m.unwrap_or(20.0),
            wind_speed_m_s: c.wind_speed_10m.unwrap_or(0.0),
            direct_radiation_w_m2: c.direct_radiation.unwrap_or(0.0),
            diffuse_radiation_w_m2: c.diffuse_radiation.unwrap_or(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initializing_snapshot_has_null_timestamp() {
        let s = TelemetrySnapshot::initializing("214070000000001");
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["status"], "INITIALIZING");
        assert!(json["timestamp"].is_null());
        assert!(json.get("irradiance").is_none());
        assert_eq!(json["power_w"], 0.0);
    }

    #[test]
    fn missing_weather_fields_default_to_neutral_values() {
        let c: CurrentData = serde_json::from_str(r#"{"direct_radiation": 512.0}"#).unwrap();
        let obs = WeatherObservation::from(c);
        assert_eq!(obs.direct_radiation_w_m2, 512.0);
        assert_eq!(obs.diffuse_radiation_w_m2, 0.0);
        assert_eq!(obs.temperature_c, 20.0);
        assert_eq!(obs.wind_speed_m_s, 0.0);
    }
}
