//! Local network throughput from cumulative interface counters.
//!
//! The sampler keeps the previous counter reading and instant; each call
//! reports the average rate since the previous call and advances both.

use std::time::Instant;

use sysinfo::Networks;

use super::round_to;

const BITS_PER_MEGABIT: f64 = 1024.0 * 1024.0;

/// Source of a cumulative byte counter (sent + received).
pub trait ByteCounter {
    fn total_bytes(&mut self) -> u64;
}

/// All interfaces of the host, via `sysinfo`.
pub struct NetworkCounters {
    networks: Networks,
}

impl NetworkCounters {
    pub fn new() -> Self {
        Self {
            networks: Networks::new_with_refreshed_list(),
        }
    }
}

impl Default for NetworkCounters {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteCounter for NetworkCounters {
    fn total_bytes(&mut self) -> u64 {
        self.networks.refresh();
        (&self.networks)
            .into_iter()
            .map(|(_, data)| data.total_received() + data.total_transmitted())
            .sum()
    }
}

pub struct ThroughputSampler<C> {
    counters: C,
    last_bytes: u64,
    last_instant: Instant,
}

impl<C: ByteCounter> ThroughputSampler<C> {
    pub fn new(counters: C) -> Self {
        Self::starting_at(counters, Instant::now())
    }

    pub fn starting_at(mut counters: C, start: Instant) -> Self {
        let last_bytes = counters.total_bytes();
        Self {
            counters,
            last_bytes,
            last_instant: start,
        }
    }

    /// Mbps since the previous sample.
    pub fn sample(&mut self) -> f64 {
        self.sample_at(Instant::now())
    }

    pub fn sample_at(&mut self, now: Instant) -> f64 {
        let bytes = self.counters.total_bytes();
        // Counters can go backwards when an interface is reset.
        let delta = bytes.saturating_sub(self.last_bytes);
        let elapsed_s = now.saturating_duration_since(self.last_instant).as_secs_f64();

        self.last_bytes = bytes;
        self.last_instant = now;

        if elapsed_s <= 0.0 {
            return 0.0;
        }
        round_to((delta as f64 * 8.0) / BITS_PER_MEGABIT / elapsed_s, 4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::time::Duration;

    struct Scripted(VecDeque<u64>);

    impl ByteCounter for Scripted {
        fn total_bytes(&mut self) -> u64 {
            self.0.pop_front().expect("counter script exhausted")
        }
    }

    fn scripted(values: &[u64]) -> Scripted {
        Scripted(values.iter().copied().collect())
    }

    #[test]
    fn rate_over_elapsed_time() {
        let t0 = Instant::now();
        // 1.25 MiB in 2 s = 10 Mbit / 2 s
        let mut s = ThroughputSampler::starting_at(scripted(&[0, 1_310_720]), t0);
        assert_eq!(s.sample_at(t0 + Duration::from_secs(2)), 5.0);
    }

    #[test]
    fn no_elapsed_time_returns_zero() {
        let t0 = Instant::now();
        let mut s = ThroughputSampler::starting_at(scripted(&[0, 500, 900]), t0);
        assert_eq!(s.sample_at(t0), 0.0);
        assert_eq!(s.sample_at(t0), 0.0);
    }

    #[test]
    fn state_advances_even_when_returning_zero() {
        let t0 = Instant::now();
        let mut s = ThroughputSampler::starting_at(scripted(&[0, 1_000, 1_000 + 1_310_720]), t0);
        assert_eq!(s.sample_at(t0), 0.0);
        // Only the bytes after the previous call are counted
        assert_eq!(s.sample_at(t0 + Duration::from_secs(2)), 5.0);
    }

    #[test]
    fn counter_reset_is_not_negative() {
        let t0 = Instant::now();
        let mut s = ThroughputSampler::starting_at(scripted(&[10_000, 10]), t0);
        assert_eq!(s.sample_at(t0 + Duration::from_secs(1)), 0.0);
    }

    #[test]
    fn rounds_to_four_decimals() {
        let t0 = Instant::now();
        let mut s = ThroughputSampler::starting_at(scripted(&[0, 1_000]), t0);
        let mbps = s.sample_at(t0 + Duration::from_secs(3));
        assert_eq!(mbps, 0.0025);
    }
}
