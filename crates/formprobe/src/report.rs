//! Report model: the lines a run emits and the summary it ends with.
//!
//! The probe never prints. It hands [`ReportEntry`] values to a
//! [`ProbeObserver`]; the CLI renders them to the console, tests collect
//! them into a `Vec`.

use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Kind of report line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    /// Top-level section title
    Section,
    /// One check within a section
    Heading,
    /// A check passed
    Pass,
    /// A check failed
    Fail,
    /// Neutral observation
    Info,
    /// Contained failure that did not stop the run
    Warn,
    /// Which element is being examined
    Detail,
    /// Sub-step within a check
    Item,
    /// Script-driven page scan
    Scan,
    /// Unadorned text
    Plain,
}

impl CheckStatus {
    /// Leading icon, if the line has one
    #[must_use]
    pub const fn icon(self) -> Option<&'static str> {
        match self {
            Self::Section | Self::Item => Some("🔸"),
            Self::Heading => Some("➤"),
            Self::Pass => Some("✅"),
            Self::Fail => Some("❌"),
            Self::Info => Some("ℹ️"),
            Self::Warn => Some("⚠️"),
            Self::Detail => Some("📍"),
            Self::Scan => Some("🔍"),
            Self::Plain => None,
        }
    }

    /// Whether a blank line precedes this kind of line
    #[must_use]
    pub const fn opens_block(self) -> bool {
        matches!(self, Self::Section | Self::Heading)
    }
}

/// One line of the human-readable report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    /// Line kind
    pub status: CheckStatus,
    /// Indent level, two spaces each
    pub depth: u8,
    /// Text after the icon
    pub message: String,
}

impl ReportEntry {
    /// Create an entry at depth zero
    #[must_use]
    pub fn new(status: CheckStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            depth: 0,
            message: message.into(),
        }
    }

    /// Set the indent level
    #[must_use]
    pub const fn at_depth(mut self, depth: u8) -> Self {
        self.depth = depth;
        self
    }

    /// Indentation prefix
    #[must_use]
    pub fn indent(&self) -> String {
        "  ".repeat(usize::from(self.depth))
    }

    /// Render without color
    #[must_use]
    pub fn render_plain(&self) -> String {
        match self.status.icon() {
            Some(icon) => format!("{}{icon} {}", self.indent(), self.message),
            None => format!("{}{}", self.indent(), self.message),
        }
    }
}

impl fmt::Display for ReportEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_plain())
    }
}

/// Sink for report lines
pub trait ProbeObserver: Send {
    /// Receive one line
    fn record(&mut self, entry: ReportEntry);
}

impl ProbeObserver for Vec<ReportEntry> {
    fn record(&mut self, entry: ReportEntry) {
        self.push(entry);
    }
}

/// Outcome of one field check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldProbeResult {
    /// Field name as reported
    pub field: String,
    /// Value written
    pub expected: String,
    /// Value read back, `None` if it could not be read
    pub actual: Option<String>,
    /// Exact, case-sensitive, non-empty match
    pub passed: bool,
    /// Steps the native path could not complete
    pub scripted_steps: Vec<String>,
}

impl FieldProbeResult {
    /// Build a result, deciding pass/fail from the values
    #[must_use]
    pub fn new(field: impl Into<String>, expected: impl Into<String>, actual: Option<String>) -> Self {
        let expected = expected.into();
        let passed = actual
            .as_deref()
            .is_some_and(|a| !a.is_empty() && a == expected);
        Self {
            field: field.into(),
            expected,
            actual,
            passed,
            scripted_steps: Vec::new(),
        }
    }

    /// A check that never got a value to compare
    #[must_use]
    pub fn failed(field: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::new(field, expected, None)
    }

    /// Record the steps that needed the scripted path
    #[must_use]
    pub fn with_scripted_steps(mut self, steps: Vec<String>) -> Self {
        self.scripted_steps = steps;
        self
    }

    /// Read-back value, `null` when absent
    #[must_use]
    pub fn actual_display(&self) -> &str {
        self.actual.as_deref().unwrap_or("null")
    }
}

/// Fixed closing banner lines
pub const COMPLETION_BANNER: [&str; 7] = [
    "Basic Form Fields Testing - COMPLETED",
    "iFrame Element Testing - COMPLETED",
    "Shadow DOM Testing - COMPLETED",
    "Nested Scenarios Testing - COMPLETED",
    "Multiple Locator Strategies - IMPLEMENTED",
    "JavaScript Fallbacks - IMPLEMENTED",
    "Advanced Error Handling - IMPLEMENTED",
];

/// Counters and results of a whole run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// When the run started
    pub started_at: DateTime<Local>,
    /// When the run finished, once it has
    pub finished_at: Option<DateTime<Local>>,
    /// Pass lines emitted
    pub passed: usize,
    /// Fail lines emitted
    pub failed: usize,
    /// Field checks, in run order
    pub fields: Vec<FieldProbeResult>,
    /// Error that ended the run early
    pub aborted: Option<String>,
}

impl Default for RunSummary {
    fn default() -> Self {
        Self::new()
    }
}

impl RunSummary {
    /// Start a summary now
    #[must_use]
    pub fn new() -> Self {
        Self {
            started_at: Local::now(),
            finished_at: None,
            passed: 0,
            failed: 0,
            fields: Vec::new(),
            aborted: None,
        }
    }

    /// Count a report line
    pub fn count(&mut self, status: CheckStatus) {
        match status {
            CheckStatus::Pass => self.passed += 1,
            CheckStatus::Fail => self.failed += 1,
            _ => {}
        }
    }

    /// Keep a field result
    pub fn push_field(&mut self, result: FieldProbeResult) {
        self.fields.push(result);
    }

    /// Stamp the finish time
    pub fn finish(&mut self) {
        self.finished_at = Some(Local::now());
    }

    /// No failures and not aborted
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.aborted.is_none()
    }

    /// Run time so far, or total once finished
    #[must_use]
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at.unwrap_or_else(Local::now) - self.started_at
    }
}

/// Human-readable timestamp used in the banner and footer
#[must_use]
pub fn timestamp(at: &DateTime<Local>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    mod entry_tests {
        use super::*;

        #[test]
        fn test_render_plain_indents_and_prefixes() {
            let entry = ReportEntry::new(CheckStatus::Pass, "Page loaded successfully").at_depth(1);
            assert_eq!(entry.render_plain(), "  ✅ Page loaded successfully");
        }

        #[test]
        fn test_plain_has_no_icon() {
            let entry = ReportEntry::new(CheckStatus::Plain, "Found 0 iframe(s) on the page");
            assert_eq!(entry.to_string(), "Found 0 iframe(s) on the page");
        }

        #[test]
        fn test_block_openers() {
            assert!(CheckStatus::Section.opens_block());
            assert!(CheckStatus::Heading.opens_block());
            assert!(!CheckStatus::Pass.opens_block());
        }

        #[test]
        fn test_vec_observer_collects() {
            let mut lines: Vec<ReportEntry> = Vec::new();
            lines.record(ReportEntry::new(CheckStatus::Info, "a"));
            lines.record(ReportEntry::new(CheckStatus::Warn, "b"));
            assert_eq!(lines.len(), 2);
            assert_eq!(lines[1].status, CheckStatus::Warn);
        }
    }

    mod field_tests {
        use super::*;

        #[test]
        fn test_exact_match_passes() {
            let result = FieldProbeResult::new("First Name", "CloudQA", Some("CloudQA".into()));
            assert!(result.passed);
        }

        #[test]
        fn test_match_is_case_sensitive() {
            let result = FieldProbeResult::new("First Name", "CloudQA", Some("cloudqa".into()));
            assert!(!result.passed);
        }

        #[test]
        fn test_empty_never_passes() {
            assert!(!FieldProbeResult::new("x", "", Some(String::new())).passed);
        }

        #[test]
        fn test_missing_value_renders_null() {
            let result = FieldProbeResult::failed("Email", "a@b");
            assert!(!result.passed);
            assert_eq!(result.actual_display(), "null");
        }
    }

    mod summary_tests {
        use super::*;

        #[test]
        fn test_counts_only_pass_and_fail() {
            let mut summary = RunSummary::new();
            summary.count(CheckStatus::Pass);
            summary.count(CheckStatus::Pass);
            summary.count(CheckStatus::Fail);
            summary.count(CheckStatus::Info);
            summary.count(CheckStatus::Warn);
            assert_eq!(summary.passed, 2);
            assert_eq!(summary.failed, 1);
            assert!(!summary.is_clean());
        }

        #[test]
        fn test_finish_stamps_time() {
            let mut summary = RunSummary::new();
            assert!(summary.finished_at.is_none());
            summary.finish();
            assert!(summary.finished_at.is_some());
            assert!(summary.elapsed() >= chrono::Duration::zero());
        }

        #[test]
        fn test_timestamp_format() {
            let stamp = timestamp(&Local::now());
            assert_eq!(stamp.len(), "2024-01-01 00:00:00".len());
        }
    }
}
