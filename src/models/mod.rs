pub mod charging;
pub mod telemetry;
