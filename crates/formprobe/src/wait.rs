//! Bounded polling waits.
//!
//! Every wait in a probe run is "poll a condition until it holds or the
//! deadline passes". Conditions are async because answering them means a
//! round-trip to the browser.

use std::future::Future;
use std::time::{Duration, Instant};

use crate::result::{ProbeError, ProbeResult};

/// Default timeout for wait operations (20 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 20_000;

/// Default polling interval (250ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Result of a successful wait
#[derive(Debug, Clone)]
pub struct WaitResult<T> {
    /// Value produced by the condition
    pub value: T,
    /// Time spent waiting
    pub elapsed: Duration,
    /// Number of times the condition was evaluated
    pub polls: u32,
}

/// Poll `condition` until it yields `Some`, or fail with [`ProbeError::Timeout`].
///
/// The condition is always evaluated at least once, even with a zero
/// timeout. A condition that returns an error counts as "not yet".
pub async fn wait_for<T, F, Fut>(
    options: &WaitOptions,
    waited_for: &str,
    mut condition: F,
) -> ProbeResult<WaitResult<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProbeResult<Option<T>>>,
{
    let start = Instant::now();
    let mut polls = 0;

    loop {
        polls += 1;
        match condition().await {
            Ok(Some(value)) => {
                return Ok(WaitResult {
                    value,
                    elapsed: start.elapsed(),
                    polls,
                })
            }
            Ok(None) => {}
            Err(e) => tracing::trace!(waited_for, error = %e, "wait condition errored"),
        }

        if start.elapsed() >= options.timeout() {
            return Err(ProbeError::Timeout {
                ms: options.timeout_ms,
                waited_for: waited_for.to_string(),
            });
        }
        tokio::time::sleep(options.poll_interval()).await;
    }
}

/// Fixed pause that lets client-side rendering catch up
pub async fn settle(duration_ms: u64) {
    if duration_ms > 0 {
        tokio::time::sleep(Duration::from_millis(duration_ms)).await;
    }
}
