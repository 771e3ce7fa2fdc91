//! formprobe: fallback-driven form probing against a live page
//!
//! Drives a browser through a fixed sequence of form checks: fill text
//! inputs found through ordered selector chains, pick a dropdown option,
//! then look inside iframes and shadow roots. Each native action falls back
//! to a script when the browser rejects it, and every check reports its own
//! failure instead of ending the run.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  FormProbe                                                   │
//! │    ├─ LocatorChain ──► find_with_fallback ──► ElementHandle  │
//! │    ├─ with_fallback(native, scripted)                        │
//! │    ├─ within_frame(frame, body)   (focus always restored)    │
//! │    └─ ProbeObserver ◄── ReportEntry                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ProbeDriver:  ChromiumDriver (CDP)  │  MockDriver (tests)   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use formprobe::{FormProbe, MockDriver, MockElement, ProbeConfig, ReportEntry};
//!
//! # async fn demo() {
//! let driver = MockDriver::with_page(vec![MockElement::input("fname")]);
//! let mut probe = FormProbe::new(driver, ProbeConfig::fast(), Vec::<ReportEntry>::new());
//! let summary = probe.run().await;
//! println!("{} passed, {} failed", summary.passed, summary.failed);
//! # }
//! ```

#![warn(missing_docs)]

mod browser;
mod config;
mod driver;
mod email;
mod fallback;
mod locator;
mod probe;
mod report;
mod result;
mod script;
mod wait;

/// In-memory driver for tests without a browser
pub mod mock;

#[cfg(feature = "browser")]
pub use browser::ChromiumDriver;
pub use browser::{ChromiumConfig, BASE_LAUNCH_ARGS};
pub use config::{ProbeConfig, SettleDelays, DEFAULT_TARGET_URL};
pub use driver::{is_truthy, ElementHandle, FrameContext, ProbeDriver};
pub use email::email_looks_valid;
pub use fallback::{with_fallback, Attempt};
pub use locator::{find_with_fallback, Located, LocatorChain, Selector};
pub use mock::{MockDriver, MockElement};
pub use probe::{
    country_locators, email_locators, first_name_locators, FormProbe, SHADOW_HOST_HEURISTIC,
};
pub use report::{
    timestamp, CheckStatus, FieldProbeResult, ProbeObserver, ReportEntry, RunSummary,
    COMPLETION_BANNER,
};
pub use result::{ProbeError, ProbeResult};
pub use script::{attribute_script, DomScript, INTERACTIVE_SELECTOR};
pub use wait::{
    settle, wait_for, WaitOptions, WaitResult, DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS,
};
