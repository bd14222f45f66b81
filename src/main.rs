use std::net::SocketAddr;

use anyhow::Context;
use axum::{response::Html, routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use utoipa::OpenApi;
use utoipa_scalar::Scalar;

use solar_telemetry_gateway::api_docs::ApiDoc;
use solar_telemetry_gateway::config::{imsi_from, NodeConfig, NodeSettings};
use solar_telemetry_gateway::routes::solar_routes::api_routes;
use solar_telemetry_gateway::services::estimator::NodeEstimator;
use solar_telemetry_gateway::services::throughput::{NetworkCounters, ThroughputSampler};
use solar_telemetry_gateway::services::weather_service::WeatherClient;
use solar_telemetry_gateway::shared_state::AppState;
use solar_telemetry_gateway::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    // 1. Load configuration. A bad config keeps the node up, reporting
    //    CONFIG_ERROR on every cycle until it is restarted.
    let settings = NodeSettings::from_env();
    let imsi = imsi_from(&|k: &str| std::env::var(k).ok());
    let config = match NodeConfig::from_env() {
        Ok(c) => {
            info!(
                imsi = %c.imsi,
                lat = c.latitude,
                lon = c.longitude,
                tz = %c.timezone,
                tilt = c.tilt_deg,
                azimuth = c.azimuth_deg,
                rated_w = c.rated_power_w,
                "configuration loaded"
            );
            Some(c)
        }
        Err(e) => {
            error!(error = %e, "CONFIG_ERROR: node will run degraded until restarted");
            None
        }
    };

    // 2. Initialize shared state
    let state = AppState::new(imsi.clone());

    // 3. Start the estimation loop
    let weather = WeatherClient::new(settings.weather_base_url.clone(), settings.weather_timeout);
    let sampler = ThroughputSampler::new(NetworkCounters::new());
    let estimator = NodeEstimator::new(config, imsi, weather, sampler);
    tokio::spawn(estimator.run_loop(
        state.clone(),
        settings.metrics_file.clone(),
        settings.poll_interval,
    ));

    // 4. Start Axum HTTP server
    let app = Router::new()
        .nest("/api", api_routes(state))
        .route("/scalar", get(|| async {
            Html(Scalar::new(ApiDoc::openapi()).to_html())
        }))
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    info!("API Server listening on http://{}", addr);
    info!("Scalar UI: http://{}/scalar", addr);
    info!("Snapshot file: {}", settings.metrics_file.display());

    tokio::select! {
        served = axum_server::bind(addr).serve(app.into_make_service()) => {
            served.context("HTTP server failed")?;
        }
        _ = telemetry::shutdown_signal() => {}
    }
    Ok(())
}
