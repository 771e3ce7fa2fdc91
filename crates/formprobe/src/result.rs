//! Result and error types for formprobe.

use thiserror::Error;

/// Result type for probe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors that can occur while probing a page
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Every locator in a chain was exhausted without a visible match
    #[error("Element not found after {attempts} locator(s)")]
    ElementNotFound {
        /// Number of locators tried
        attempts: usize,
    },

    /// Operation timed out
    #[error("Timed out after {ms}ms waiting for {waited_for}")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
        /// What was being waited for
        waited_for: String,
    },

    /// A native interaction (click, clear, keystrokes) was rejected
    #[error("Interaction failed: {message}")]
    Interaction {
        /// Error message
        message: String,
    },

    /// Script evaluation failed
    #[error("Script execution failed: {message}")]
    ScriptExecution {
        /// Error message
        message: String,
    },

    /// Native action and its scripted replacement both failed
    #[error("Native action failed ({native}); scripted fallback failed ({scripted})")]
    FallbackExhausted {
        /// Error from the native action
        native: String,
        /// Error from the scripted action
        scripted: String,
    },

    /// Frame focus could not be changed
    #[error("Frame switch failed: {message}")]
    Frame {
        /// Error message
        message: String,
    },

    /// Element was expected to be a `<select>`
    #[error("Element is <{tag}>, not <select>")]
    NotASelect {
        /// Actual tag name
        tag: String,
    },

    /// Dropdown has no option with the requested text
    #[error("Cannot locate option with text: {text}")]
    OptionNotFound {
        /// Requested visible text
        text: String,
    },

    /// Handle does not refer to a live element
    #[error("Stale element reference: {id}")]
    StaleElement {
        /// Handle id
        id: String,
    },

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProbeError {
    /// Create an interaction error
    #[must_use]
    pub fn interaction(message: impl Into<String>) -> Self {
        Self::Interaction {
            message: message.into(),
        }
    }

    /// Create a script execution error
    #[must_use]
    pub fn script(message: impl Into<String>) -> Self {
        Self::ScriptExecution {
            message: message.into(),
        }
    }

    /// Create a frame error
    #[must_use]
    pub fn frame(message: impl Into<String>) -> Self {
        Self::Frame {
            message: message.into(),
        }
    }
}
