//! Connection-quality tracking: a rolling latency window plus the retry
//! counter derive one of three health states.

use std::collections::VecDeque;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    Healthy,
    Degraded,
    Disconnected,
}

/// Rolling window of recent query latencies.
#[derive(Debug)]
pub(crate) struct LatencyWindow {
    samples: VecDeque<Duration>,
    capacity: usize,
}

impl LatencyWindow {
    pub(crate) fn new(capacity: usize) -> LatencyWindow {
        LatencyWindow {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub(crate) fn push(&mut self, latency: Duration) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(latency);
    }

    pub(crate) fn p95(&self) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }
        let mut sorted: Vec<Duration> = self.samples.iter().copied().collect();
        sorted.sort();
        let index = (sorted.len() * 95 / 100).min(sorted.len() - 1);
        sorted[index]
    }
}

/// Healthy until queries start failing or the rolling p95 exceeds the poll
/// interval; disconnected once the retry budget is spent.
pub(crate) fn derive(
    latencies: &LatencyWindow,
    retries: u32,
    max_retries: u32,
    poll_interval: Duration,
) -> Health {
    if retries >= max_retries {
        Health::Disconnected
    } else if retries > 0 || latencies.p95() > poll_interval {
        Health::Degraded
    } else {
        Health::Healthy
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn p95_tracks_the_tail_of_the_window() {
        let mut window = LatencyWindow::new(20);
        for _ in 0..19 {
            window.push(Duration::from_millis(10));
        }
        window.push(Duration::from_millis(900));
        assert_eq!(Duration::from_millis(900), window.p95());
    }

    #[test]
    fn the_window_evicts_its_oldest_sample() {
        let mut window = LatencyWindow::new(2);
        window.push(Duration::from_millis(900));
        window.push(Duration::from_millis(10));
        window.push(Duration::from_millis(10));
        assert_eq!(Duration::from_millis(10), window.p95());
    }

    #[test]
    fn health_derivation_orders_its_checks() {
        let mut slow = LatencyWindow::new(4);
        slow.push(Duration::from_secs(5));
        let fast = LatencyWindow::new(4);

        let poll = Duration::from_secs(1);
        assert_eq!(Health::Healthy, derive(&fast, 0, 5, poll));
        assert_eq!(Health::Degraded, derive(&slow, 0, 5, poll));
        assert_eq!(Health::Degraded, derive(&fast, 2, 5, poll));
        assert_eq!(Health::Disconnected, derive(&fast, 5, 5, poll));
    }
}
