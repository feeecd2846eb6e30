//! Subscription configuration. Values arrive from hosts as loosely validated
//! JSON, so every accessor clamps to its documented range rather than
//! trusting the raw field.

use serde::{Deserialize, Serialize};
use std::time::Duration;

const MIN_POLL_MS: u64 = 100;
const MAX_POLL_MS: u64 = 300_000;
const MAX_THROTTLE_MS: u64 = 60_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubscribeConfig {
    /// Poll cadence in milliseconds, clamped to [100, 300000].
    pub poll_interval_ms: u64,
    /// Minimum interval between emissions, clamped to [0, 60000]. Defaults to
    /// the poll interval.
    pub throttle_ms: Option<u64>,
    /// Consecutive failures before the subscription degrades.
    pub max_retries: u32,
    /// Exponential backoff base applied to the poll interval per retry.
    pub backoff_base: u32,
}

impl Default for SubscribeConfig {
    fn default() -> SubscribeConfig {
        SubscribeConfig {
            poll_interval_ms: 1000,
            throttle_ms: None,
            max_retries: 5,
            backoff_base: 2,
        }
    }
}

impl SubscribeConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.clamp(MIN_POLL_MS, MAX_POLL_MS))
    }

    pub fn throttle(&self) -> Duration {
        let ms = self
            .throttle_ms
            .unwrap_or(self.poll_interval_ms.clamp(MIN_POLL_MS, MAX_POLL_MS));
        Duration::from_millis(ms.min(MAX_THROTTLE_MS))
    }

    /// Delay before the next attempt after `retries` consecutive failures:
    /// `poll * base^retries`, capped at sixty poll intervals.
    pub fn backoff(&self, retries: u32) -> Duration {
        let poll_ms = self.poll_interval().as_millis() as u64;
        let factor = u64::from(self.backoff_base.max(1)).saturating_pow(retries.min(16));
        Duration::from_millis(poll_ms.saturating_mul(factor).min(poll_ms * 60))
    }

    /// A query running longer than this is treated as a failure.
    pub fn query_deadline(&self) -> Duration {
        self.poll_interval() * 10
    }
}
