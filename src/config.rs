//! Harness configuration

use std::time::Duration;

const DEFAULT_REPLY_TIMEOUT_MS: u64 = 3000;
const DEFAULT_POLL_INTERVAL_MS: u64 = 10;

/// Timing knobs for reply assertions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarnessConfig {
    /// How long an assertion waits for a reply before timing out
    pub reply_timeout: Duration,
    /// Pause between empty checks of the reply queue
    pub poll_interval: Duration,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            reply_timeout: Duration::from_millis(DEFAULT_REPLY_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl HarnessConfig {
    /// Read overrides from `TURN_HARNESS_REPLY_TIMEOUT_MS` and
    /// `TURN_HARNESS_POLL_INTERVAL_MS`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let millis = |key: &str, default: u64| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map_or(Duration::from_millis(default), Duration::from_millis)
        };

        Self {
            reply_timeout: millis("TURN_HARNESS_REPLY_TIMEOUT_MS", DEFAULT_REPLY_TIMEOUT_MS),
            poll_interval: millis("TURN_HARNESS_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS),
        }
    }

    #[must_use]
    pub fn with_reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}
