//! Booking and enrollment concurrency configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for the booking lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfig {
    /// Upper bound on waiting for a batch lock, in milliseconds.
    #[serde(default = "default_lock_timeout")]
    pub lock_timeout_ms: u64,
    /// How many times a commit is re-run after a batch version conflict.
    #[serde(default = "default_max_commit_retries")]
    pub max_commit_retries: u32,
    /// Move a pending booking to confirmed when its payment completes.
    #[serde(default = "default_true")]
    pub confirm_on_payment: bool,
    /// Run the enrollment reconciler when the server starts.
    #[serde(default = "default_true")]
    pub reconcile_on_startup: bool,
}

impl BookingConfig {
    /// Lock acquisition bound as a [`Duration`].
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: default_lock_timeout(),
            max_commit_retries: default_max_commit_retries(),
            confirm_on_payment: default_true(),
            reconcile_on_startup: default_true(),
        }
    }
}

fn default_lock_timeout() -> u64 {
    2000
}

fn default_max_commit_retries() -> u32 {
    3
}

fn default_true() -> bool {
    true
}
