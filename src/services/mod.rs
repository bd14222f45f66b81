pub mod charging;
pub mod estimator;
pub mod gateway;
pub mod node_poller;
pub mod snapshot_store;
pub mod solar_algorithm;
pub mod throughput;
pub mod weather_service;

/// Round half away from zero to `decimals` places.
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
