use std::time::{Duration, Instant};

use reqwest::StatusCode;
use thiserror::Error;

use crate::config::InventoryEntry;
use crate::models::charging::NodeReading;

#[derive(Debug, Error)]
pub enum PollError {
    #[error("timed out, node possibly powered off")]
    Timeout,
    #[error("connection refused, service possibly down")]
    Refused,
    #[error("HTTP {0}")]
    BadStatus(StatusCode),
    #[error("{0}")]
    Other(#[source] reqwest::Error),
}

impl From<reqwest::Error> for PollError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            PollError::Timeout
        } else if e.is_connect() {
            PollError::Refused
        } else {
            PollError::Other(e)
        }
    }
}

/// A successful poll.
#[derive(Debug, Clone)]
pub struct Polled {
    pub reading: NodeReading,
    pub latency: Duration,
}

/// Reads node snapshots; one shared HTTP connection pool.
#[derive(Debug, Clone)]
pub struct NodePoller {
    client: reqwest::Client,
    timeout: Duration,
}

impl NodePoller {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }

    pub async fn poll(&self, node: &InventoryEntry) -> Result<Polled, PollError> {
        let started = Instant::now();
        let response = self
            .client
            .get(node.snapshot_url())
            .timeout(self.timeout)
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(PollError::BadStatus(response.status()));
        }
        let reading = response.json::<NodeReading>().await?;

        Ok(Polled {
            reading,
            latency: started.elapsed(),
        })
    }
}
