use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::config::NodeConfig;
use crate::models::telemetry::{NodeStatus, TelemetrySnapshot};
use crate::services::round_to;
use crate::services::snapshot_store;
use crate::services::solar_algorithm::{self, ModelInputs};
use crate::services::throughput::{ByteCounter, ThroughputSampler};
use crate::services::weather_service::WeatherClient;
use crate::shared_state::AppState;

/// Runs one estimation cycle per call. Owns the throughput sampler, so it must
/// only be driven from a single task.
pub struct NodeEstimator<C> {
    config: Option<NodeConfig>,
    imsi: String,
    weather: WeatherClient,
    sampler: ThroughputSampler<C>,
}

impl<C: ByteCounter> NodeEstimator<C> {
    /// `config` is `None` when startup configuration failed to parse; the
    /// estimator then reports CONFIG_ERROR forever under `imsi`.
    pub fn new(
        config: Option<NodeConfig>,
        imsi: impl Into<String>,
        weather: WeatherClient,
        sampler: ThroughputSampler<C>,
    ) -> Self {
        let imsi = match &config {
            Some(cfg) => cfg.imsi.clone(),
            None => imsi.into(),
        };
        Self { config, imsi, weather, sampler }
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    pub async fn run_cycle(&mut self) -> TelemetrySnapshot {
        self.run_cycle_at(Utc::now()).await
    }

    /// Never fails: every error is folded into the snapshot status.
    pub async fn run_cycle_at(&mut self, now: DateTime<Utc>) -> TelemetrySnapshot {
        let Some(cfg) = &self.config else {
            return TelemetrySnapshot::config_error(self.imsi.clone());
        };

        // Sampled first so it survives a failed computation.
        let bandwidth_mbps = self.sampler.sample();
        let timestamp = now.with_timezone(&cfg.timezone).fixed_offset();

        let weather = match self.weather.current(cfg.latitude, cfg.longitude).await {
            Ok(w) => w,
            Err(e) => {
                warn!(error = %e, "weather fetch failed");
                return TelemetrySnapshot::compute_error(self.imsi.clone(), timestamp, bandwidth_mbps);
            }
        };

        let inputs = ModelInputs {
            latitude: cfg.latitude,
            longitude: cfg.longitude,
            tilt_deg: cfg.tilt_deg,
            azimuth_deg: cfg.azimuth_deg,
            direct_radiation_w_m2: weather.direct_radiation_w_m2,
            diffuse_radiation_w_m2: weather.diffuse_radiation_w_m2,
            ambient_temp_c: weather.temperature_c,
            wind_speed_m_s: weather.wind_speed_m_s,
            rated_power_w: cfg.rated_power_w,
            temp_coefficient: cfg.temp_coefficient,
        };

        match solar_algorithm::evaluate(&inputs, now) {
            Ok(out) => {
                let snapshot = TelemetrySnapshot {
                    imsi: self.imsi.clone(),
                    status: NodeStatus::Operational,
                    timestamp: Some(timestamp),
                    power_w: round_to(out.power_w.max(0.0), 2),
                    temp_c: round_to(out.cell_temp_c, 2),
                    irradiance: Some(round_to(out.poa_global_w_m2, 2)),
                    bandwidth_mbps,
                };
                info!(
                    power_w = snapshot.power_w,
                    temp_c = snapshot.temp_c,
                    poa_w_m2 = out.poa_global_w_m2,
                    zenith_deg = out.solar_zenith_deg,
                    azimuth_deg = out.solar_azimuth_deg,
                    bandwidth_mbps,
                    "estimation cycle complete"
                );
                snapshot
            }
            Err(e) => {
                error!(error = %e, "model evaluation failed");
                TelemetrySnapshot::compute_error(self.imsi.clone(), timestamp, bandwidth_mbps)
            }
        }
    }

    /// One scheduler step: estimate, publish to `state`, then write
    /// `snapshot_file`. A failed write is logged and the published snapshot
    /// stays served.
    pub async fn tick(&mut self, state: &AppState, snapshot_file: &Path) -> TelemetrySnapshot {
        let snapshot = self.run_cycle().await;
        info!(status = snapshot.status.as_str(), "snapshot updated");
        state.publish(snapshot.clone());
        if let Err(e) = snapshot_store::persist(snapshot_file, &snapshot).await {
            warn!(error = %e, "failed to persist snapshot");
        }
        snapshot
    }

    /// Ticks forever, sleeping `interval` after each cycle.
    pub async fn run_loop(mut self, state: AppState, snapshot_file: PathBuf, interval: Duration) {
        loop {
            self.tick(&state, &snapshot_file).await;
            tokio::time::sleep(interval).await;
        }
    }
}
