//! ProbeDriver - the browser automation capability a probe run needs.
//!
//! The probe never talks to a browser directly. It goes through this trait,
//! which covers exactly what a form check uses: navigation, element lookup
//! by selector, native element actions, script execution and frame focus.
//!
//! # Implementations
//!
//! - `ChromiumDriver` - real Chromium over CDP (feature `browser`)
//! - `MockDriver` - in-memory DOM for unit tests

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::locator::Selector;
use crate::result::ProbeResult;
use crate::script::DomScript;

/// Opaque reference to one DOM element
///
/// Valid only inside the frame it was found in and until the next navigation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Driver-issued identifier
    pub id: String,
    /// Lower-cased tag name
    pub tag_name: String,
}

impl ElementHandle {
    /// Create a new element handle
    #[must_use]
    pub fn new(id: impl Into<String>, tag_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag_name: tag_name.into().to_ascii_lowercase(),
        }
    }

    /// Check the tag name, ignoring case
    #[must_use]
    pub fn is_tag(&self, tag: &str) -> bool {
        self.tag_name.eq_ignore_ascii_case(tag)
    }
}

/// Which document the driver is currently focused on
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FrameContext {
    /// Top-level document
    #[default]
    MainDocument,
    /// Content document of the iframe with this element id
    InsideFrame(String),
}

impl FrameContext {
    /// Whether focus is on the top-level document
    #[must_use]
    pub const fn is_main(&self) -> bool {
        matches!(self, Self::MainDocument)
    }
}

/// Abstract driver trait for browser automation
///
/// Element-level methods take `&self` so a native action and its scripted
/// replacement can both be prepared up front. Methods that move focus or
/// change the page take `&mut self`.
#[async_trait]
pub trait ProbeDriver: Send + Sync {
    /// Navigate to URL; focus returns to the main document
    async fn navigate(&mut self, url: &str) -> ProbeResult<()>;

    /// All elements matching `selector` in the focused document
    async fn find_elements(&self, selector: &Selector) -> ProbeResult<Vec<ElementHandle>>;

    /// Native click
    async fn click(&self, element: &ElementHandle) -> ProbeResult<()>;

    /// Native clear of a text control
    async fn clear(&self, element: &ElementHandle) -> ProbeResult<()>;

    /// Keystroke simulation into the element
    async fn send_keys(&self, element: &ElementHandle, text: &str) -> ProbeResult<()>;

    /// Read an attribute (`value` reads the live property)
    async fn attribute(&self, element: &ElementHandle, name: &str)
        -> ProbeResult<Option<String>>;

    /// Whether the element is rendered and takes up space
    async fn is_displayed(&self, element: &ElementHandle) -> ProbeResult<bool>;

    /// Whether the element is not disabled
    async fn is_enabled(&self, element: &ElementHandle) -> ProbeResult<bool>;

    /// Displayed and enabled
    async fn is_clickable(&self, element: &ElementHandle) -> ProbeResult<bool> {
        Ok(self.is_displayed(element).await? && self.is_enabled(element).await?)
    }

    /// Run a script and return its JSON result
    async fn execute_script(
        &self,
        script: &DomScript,
        target: Option<&ElementHandle>,
    ) -> ProbeResult<serde_json::Value>;

    /// Run an element-returning script
    async fn execute_script_elements(
        &self,
        script: &DomScript,
        target: Option<&ElementHandle>,
    ) -> ProbeResult<Vec<ElementHandle>>;

    /// Move focus into an iframe's document
    async fn switch_to_frame(&mut self, frame: &ElementHandle) -> ProbeResult<()>;

    /// Move focus back to the top-level document
    async fn switch_to_main(&mut self) -> ProbeResult<()>;

    /// Current focus
    fn frame_context(&self) -> FrameContext;

    /// Close the browser
    async fn close(&mut self) -> ProbeResult<()>;
}

/// Truthiness of a script result, JavaScript style
#[must_use]
pub fn is_truthy(value: &serde_json::Value) -> bool {
    use serde_json::Value;
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_element_handle_lowercases_tag() {
        let elem = ElementHandle::new("e1", "SELECT");
        assert_eq!(elem.tag_name, "select");
        assert!(elem.is_tag("Select"));
        assert!(!elem.is_tag("input"));
    }

    #[test]
    fn test_frame_context_default_is_main() {
        assert!(FrameContext::default().is_main());
        assert!(!FrameContext::InsideFrame("f1".into()).is_main());
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!({})));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!("x")));
    }
}
