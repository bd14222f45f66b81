//! Collector side: sweeps the inventory and turns node readings into
//! charging records.

use std::future::Future;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::config::{GatewayConfig, InventoryEntry};
use crate::models::charging::ChargingRecord;
use crate::services::charging::{self, ChargingIdentity};
use crate::services::node_poller::{NodePoller, PollError};

#[derive(Debug)]
pub struct NodeFailure {
    pub hostname: String,
    pub error: PollError,
}

/// Outcome of one pass over the inventory, in inventory order.
#[derive(Debug, Default)]
pub struct SweepReport {
    pub records: Vec<ChargingRecord>,
    pub failures: Vec<NodeFailure>,
}

pub struct Gateway {
    nodes: Vec<InventoryEntry>,
    poller: NodePoller,
    identity: ChargingIdentity,
    hss_host: String,
    interval: Duration,
}

impl Gateway {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            nodes: config.nodes.clone(),
            poller: NodePoller::new(config.poll_timeout()),
            identity: ChargingIdentity {
                origin_host: config.origin_host.clone(),
                service_context_id: config.service_context_id.clone(),
            },
            hss_host: config.hss_host.clone(),
            interval: config.sweep_interval(),
        }
    }

    /// Poll every node concurrently; each poll has its own timeout so a dead
    /// node costs at most one timeout and never blocks the others.
    pub async fn sweep(&self) -> SweepReport {
        info!(nodes = self.nodes.len(), "starting collection sweep");

        let polls = self
            .nodes
            .iter()
            .map(|node| async move { (node, self.poller.poll(node).await) });

        let mut report = SweepReport::default();
        for (node, outcome) in join_all(polls).await {
            match outcome {
                Ok(polled) => {
                    let r = &polled.reading;
                    info!(
                        node = %node.hostname,
                        power_w = r.power_w(),
                        bandwidth_mbps = r.bandwidth_mbps(),
                        status = r.status(),
                        latency_ms = polled.latency.as_secs_f64() * 1000.0,
                        "RX"
                    );
                    let record = charging::translate(
                        &self.identity,
                        &node.hostname,
                        r.power_w(),
                        r.bandwidth_mbps(),
                        chrono::Utc::now(),
                    );
                    self.forward(&record);
                    report.records.push(record);
                }
                Err(e) => {
                    log_failure(node, &e);
                    report.failures.push(NodeFailure {
                        hostname: node.hostname.clone(),
                        error: e,
                    });
                }
            }
        }

        info!(
            translated = report.records.len(),
            failed = report.failures.len(),
            "sweep complete"
        );
        report
    }

    /// Stands in for sending the CCR to the HSS.
    fn forward(&self, record: &ChargingRecord) {
        let payload = serde_json::to_string(record).unwrap_or_default();
        info!(
            hss = %self.hss_host,
            session = %record.session_id,
            units = record.requested_service_unit.cc_output_octets,
            %payload,
            "TX[DIAMETER]->HSS"
        );
    }

    /// Sweeps forever on the configured interval.
    pub async fn run(&self) {
        run_every(self.interval, move || async move {
            self.sweep().await;
        })
        .await
    }
}

/// Runs `job` on every tick of `period`, starting immediately. Runs never
/// overlap: one that outlasts the period delays the next and missed ticks
/// are skipped.
pub async fn run_every<F, Fut>(period: Duration, mut job: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        job().await;
    }
}

fn log_failure(node: &InventoryEntry, e: &PollError) {
    match e {
        PollError::BadStatus(status) => {
            warn!(node = %node.hostname, ip = %node.ip, %status, "node returned non-OK status, skipped")
        }
        PollError::Timeout => {
            error!(node = %node.hostname, ip = %node.ip, "TIMEOUT: node unreachable, possibly powered off")
        }
        PollError::Refused => {
            error!(node = %node.hostname, ip = %node.ip, "REFUSED: connection refused, service possibly down")
        }
        PollError::Other(err) => {
            error!(node = %node.hostname, ip = %node.ip, error = %err, "poll failed")
        }
    }
}
