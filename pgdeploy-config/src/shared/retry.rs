use serde::{Deserialize, Serialize};

/// Retry policy for cluster writes that can fail with a version conflict.
///
/// The delay grows by `backoff_factor` after every attempt and is capped at
/// `max_delay_ms`, so a contended object is never polled in a tight loop.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts before giving up.
    pub max_attempts: u32,

    /// Initial delay, in milliseconds, before the first retry.
    pub initial_delay_ms: u64,

    /// Maximum delay between retries.
    pub max_delay_ms: u64,

    /// Exponential backoff multiplier applied to the delay after each attempt.
    pub backoff_factor: f32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay_ms: 10,
            max_delay_ms: 1_000,
            backoff_factor: 2.0,
        }
    }
}
