use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

use crate::models::telemetry::{CurrentWeatherResponse, WeatherObservation};

const CURRENT_FIELDS: &str = "temperature_2m,wind_speed_10m,direct_radiation,diffuse_radiation";

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("weather provider timed out")]
    Timeout,
    #[error("weather provider returned HTTP {0}")]
    Status(StatusCode),
    #[error("malformed weather response: {0}")]
    Malformed(String),
    #[error("weather request failed: {0}")]
    Transport(#[source] reqwest::Error),
}

impl From<reqwest::Error> for WeatherError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            WeatherError::Timeout
        } else if e.is_decode() {
            WeatherError::Malformed(e.to_string())
        } else {
            WeatherError::Transport(e)
        }
    }
}

/// Open-Meteo "current conditions" client.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl WeatherClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    /// Current conditions at a position, missing fields defaulted.
    pub async fn current(&self, lat: f64, lon: f64) -> Result<WeatherObservation, WeatherError> {
        let url = format!(
            "{}/v1/forecast?latitude={}&longitude={}&current={}",
            self.base_url, lat, lon, CURRENT_FIELDS
        );

        let response = self.client.get(&url).timeout(self.timeout).send().await?;
        if !response.status().is_success() {
            return Err(WeatherError::Status(response.status()));
        }
        let body = response.json::<CurrentWeatherResponse>().await?;
        Ok(body.current.into())
    }
}
