pub mod api_docs;
pub mod config;
pub mod controllers;
pub mod models;
pub mod routes;
pub mod services;
pub mod shared_state;
pub mod telemetry;
