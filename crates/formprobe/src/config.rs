//! Probe run configuration

use serde::{Deserialize, Serialize};

use crate::wait::{WaitOptions, DEFAULT_POLL_INTERVAL_MS};

/// Public practice form the probe targets by default
pub const DEFAULT_TARGET_URL: &str = "https://app.cloudqa.io/home/AutomationPracticeForm";

/// Settle delays, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettleDelays {
    /// After the page body appears
    pub page_ms: u64,
    /// After scrolling a field into view
    pub scroll_ms: u64,
    /// After clicking or clearing a field
    pub click_ms: u64,
    /// After typing, before reading back
    pub type_ms: u64,
    /// After selecting a dropdown option
    pub select_ms: u64,
    /// After a scripted shadow DOM write
    pub shadow_write_ms: u64,
}

impl Default for SettleDelays {
    fn default() -> Self {
        Self {
            page_ms: 3000,
            scroll_ms: 1000,
            click_ms: 500,
            type_ms: 1000,
            select_ms: 1000,
            shadow_write_ms: 500,
        }
    }
}

impl SettleDelays {
    /// No settling at all (tests)
    #[must_use]
    pub const fn none() -> Self {
        Self {
            page_ms: 0,
            scroll_ms: 0,
            click_ms: 0,
            type_ms: 0,
            select_ms: 0,
            shadow_write_ms: 0,
        }
    }
}

/// Configuration for a probe run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Page to open
    pub target_url: String,
    /// Value typed into the first name field
    pub first_name: String,
    /// Value typed into the email field
    pub email: String,
    /// Visible text selected in the country dropdown
    pub country: String,
    /// Bound on waiting for a visible `<body>`
    pub page_ready_timeout_ms: u64,
    /// Bound on waiting for each locator to match
    pub locator_timeout_ms: u64,
    /// Bound on waiting for a field to become clickable
    pub clickable_timeout_ms: u64,
    /// Polling interval for every wait
    pub poll_interval_ms: u64,
    /// Settle delays
    pub settle: SettleDelays,
    /// Inputs tried per iframe
    pub frame_input_limit: usize,
    /// Shadow DOM controls tried per host
    pub shadow_element_limit: usize,
    /// Elements scanned per iframe for nested shadow roots
    pub nested_scan_limit: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            target_url: DEFAULT_TARGET_URL.to_string(),
            first_name: "CloudQA".to_string(),
            email: "cloudqa.advanced@test.com".to_string(),
            country: "India".to_string(),
            page_ready_timeout_ms: 20_000,
            locator_timeout_ms: 10_000,
            clickable_timeout_ms: 20_000,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            settle: SettleDelays::default(),
            frame_input_limit: 2,
            shadow_element_limit: 3,
            nested_scan_limit: 10,
        }
    }
}

impl ProbeConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target URL
    #[must_use]
    pub fn with_target_url(mut self, url: impl Into<String>) -> Self {
        self.target_url = url.into();
        self
    }

    /// Set the first name test value
    #[must_use]
    pub fn with_first_name(mut self, value: impl Into<String>) -> Self {
        self.first_name = value.into();
        self
    }

    /// Set the email test value
    #[must_use]
    pub fn with_email(mut self, value: impl Into<String>) -> Self {
        self.email = value.into();
        self
    }

    /// Set the dropdown option text
    #[must_use]
    pub fn with_country(mut self, value: impl Into<String>) -> Self {
        self.country = value.into();
        self
    }

    /// Use the same timeout for every bounded wait
    #[must_use]
    pub const fn with_timeouts(mut self, timeout_ms: u64) -> Self {
        self.page_ready_timeout_ms = timeout_ms;
        self.locator_timeout_ms = timeout_ms;
        self.clickable_timeout_ms = timeout_ms;
        self
    }

    /// Set the polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Set settle delays
    #[must_use]
    pub const fn with_settle(mut self, settle: SettleDelays) -> Self {
        self.settle = settle;
        self
    }

    /// Fast configuration for tests: short waits, no settling
    #[must_use]
    pub fn fast() -> Self {
        Self::default()
            .with_timeouts(40)
            .with_poll_interval(5)
            .with_settle(SettleDelays::none())
    }

    /// Wait options for page readiness
    #[must_use]
    pub const fn page_ready_wait(&self) -> WaitOptions {
        self.wait(self.page_ready_timeout_ms)
    }

    /// Wait options for each locator
    #[must_use]
    pub const fn locator_wait(&self) -> WaitOptions {
        self.wait(self.locator_timeout_ms)
    }

    /// Wait options for clickability
    #[must_use]
    pub const fn clickable_wait(&self) -> WaitOptions {
        self.wait(self.clickable_timeout_ms)
    }

    const fn wait(&self, timeout_ms: u64) -> WaitOptions {
        WaitOptions {
            timeout_ms,
            poll_interval_ms: self.poll_interval_ms,
        }
    }
}
