use std::path::PathBuf;

use anyhow::Context;
use tracing::info;

use solar_telemetry_gateway::config::GatewayConfig;
use solar_telemetry_gateway::services::gateway::Gateway;
use solar_telemetry_gateway::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("GATEWAY_CONFIG").ok())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("gateway.json"));

    let config = GatewayConfig::load(&path)
        .with_context(|| format!("loading inventory from {}", path.display()))?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        nodes = config.nodes.len(),
        interval_s = config.sweep_interval().as_secs(),
        timeout_ms = config.poll_timeout_ms,
        hss = %config.hss_host,
        "starting Diameter gateway agent"
    );
    for node in &config.nodes {
        info!(node = %node.hostname, url = %node.snapshot_url(), realm = %node.realm, "inventory entry");
    }

    let gateway = Gateway::new(&config);
    tokio::select! {
        _ = gateway.run() => {}
        _ = telemetry::shutdown_signal() => {}
    }
    Ok(())
}
