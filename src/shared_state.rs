use std::sync::{Arc, RwLock};

use crate::models::telemetry::TelemetrySnapshot;

/// Latest snapshot of this node, shared between the polling loop (writer) and
/// the HTTP handlers (readers).
#[derive(Clone, Debug)]
pub struct AppState {
    /// Swapped wholesale on every cycle; readers hold their own `Arc`.
    latest: Arc<RwLock<Arc<TelemetrySnapshot>>>,
}

impl AppState {
    pub fn new(imsi: impl Into<String>) -> Self {
        Self {
            latest: Arc::new(RwLock::new(Arc::new(TelemetrySnapshot::initializing(imsi)))),
        }
    }

    pub fn publish(&self, snapshot: TelemetrySnapshot) {
        let snapshot = Arc::new(snapshot);
        match self.latest.write() {
            Ok(mut slot) => *slot = snapshot,
            // A panicked writer cannot have left a half-swapped Arc behind.
            Err(poisoned) => *poisoned.into_inner() = snapshot,
        }
    }

    pub fn latest(&self) -> Arc<TelemetrySnapshot> {
        match self.latest.read() {
            Ok(slot) => Arc::clone(&slot),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::telemetry::NodeStatus;

    #[test]
    fn starts_initializing() {
        let state = AppState::new("214070000000001");
        let snap = state.latest();
        assert_eq!(snap.status, NodeStatus::Initializing);
        assert_eq!(snap.timestamp, None);
        assert_eq!(snap.imsi, "214070000000001");
    }

    #[test]
    fn readers_keep_their_snapshot_across_a_swap() {
        let state = AppState::new("1");
        let before = state.latest();
        state.publish(TelemetrySnapshot::config_error("1"));
        assert_eq!(before.status, NodeStatus::Initializing);
        assert_eq!(state.latest().status, NodeStatus::ConfigError);
    }

    #[test]
    fn concurrent_readers_never_see_a_mixed_snapshot() {
        let state = AppState::new("1");
        let writer = {
            let state = state.clone();
            std::thread::spawn(move || {
                for i in 0..500 {
                    let mut s = TelemetrySnapshot::initializing("1");
                    s.power_w = i as f64;
                    s.temp_c = i as f64;
                    state.publish(s);
                }
            })
        };
        for _ in 0..500 {
            let s = state.latest();
            assert_eq!(s.power_w, s.temp_c);
        }
        writer.join().unwrap();
    }
}
