//! Console rendering of report lines

use console::{style, StyledObject, Term};
use formprobe::{CheckStatus, ProbeObserver, ReportEntry};

/// Writes report lines to stdout as they arrive
#[derive(Debug)]
pub struct ConsoleReporter {
    term: Term,
    use_color: bool,
    quiet: bool,
}

impl ConsoleReporter {
    /// Create a new reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stdout(),
            use_color,
            quiet,
        }
    }

    /// Whether `status` is shown at the current quietness
    #[must_use]
    pub const fn shows(&self, status: CheckStatus) -> bool {
        !self.quiet || matches!(status, CheckStatus::Fail | CheckStatus::Warn)
    }

    /// Render one entry, colored if enabled
    #[must_use]
    pub fn render(&self, entry: &ReportEntry) -> String {
        if !self.use_color {
            return entry.render_plain();
        }
        let Some(icon) = entry.status.icon() else {
            return entry.render_plain();
        };
        let message = paint(entry.status, &entry.message);
        format!("{}{icon} {message}", entry.indent())
    }

    /// Write a free-standing line
    pub fn line(&self, text: &str) {
        let _ = self.term.write_line(text);
    }

    /// Footer printed once the probe has returned
    pub fn finished(&self, at: &str) {
        if self.quiet {
            return;
        }
        self.line("");
        self.line(&format!("Complete test execution finished at: {at}"));
    }

    /// Prompt shown before waiting for a key
    pub fn prompt(&self) {
        self.line("");
        self.line("Press any key to close the browser...");
    }
}

fn paint(status: CheckStatus, message: &str) -> StyledObject<&str> {
    let styled = style(message);
    match status {
        CheckStatus::Pass => styled.green(),
        CheckStatus::Fail => styled.red().bold(),
        CheckStatus::Warn => styled.yellow(),
        CheckStatus::Info | CheckStatus::Scan => styled.cyan(),
        CheckStatus::Section | CheckStatus::Heading => styled.bold(),
        CheckStatus::Detail => styled.dim(),
        CheckStatus::Item | CheckStatus::Plain => styled,
    }
}

impl ProbeObserver for ConsoleReporter {
    fn record(&mut self, entry: ReportEntry) {
        if !self.shows(entry.status) {
            return;
        }
        if entry.status.opens_block() {
            self.line("");
        }
        self.line(&self.render(&entry));
    }
}
