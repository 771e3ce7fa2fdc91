//! Scripted DOM operations.
//!
//! Everything the probe does through "execute script" is one of these
//! variants. Each renders to a JavaScript function taking `(el, root)`:
//! the target element (or `null`) and the document currently in focus.

use serde::{Deserialize, Serialize};

use crate::locator::js_string;

/// Tags treated as interactive form controls
pub const INTERACTIVE_SELECTOR: &str = "input, select, textarea";

/// A script the probe can run against the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DomScript {
    /// Smooth-scroll the element to the middle of the viewport
    ScrollIntoView,
    /// `el.click()`
    Click,
    /// Set `value` to the empty string
    ClearValue,
    /// Set `value` and fire a bubbling `input` event
    SetValue(String),
    /// Read `value`
    ReadValue,
    /// Select the `<option>` whose visible text matches; yields `true` on success
    SelectByText(String),
    /// Visible text of the selected `<option>`, or `null`
    SelectedText,
    /// Whether the element has an attached shadow root
    HasShadowRoot,
    /// Form controls inside the element's shadow root
    ShadowInteractives,
    /// Every element in the focused document that hosts a shadow root
    ScanShadowHosts,
}

impl DomScript {
    /// Whether the script yields a collection of elements
    #[must_use]
    pub const fn returns_elements(&self) -> bool {
        matches!(self, Self::ShadowInteractives | Self::ScanShadowHosts)
    }

    /// Whether the script needs a target element
    #[must_use]
    pub const fn needs_target(&self) -> bool {
        !matches!(self, Self::ScanShadowHosts)
    }

    /// Render as a JavaScript function expression `function (el, root) { ... }`
    #[must_use]
    pub fn to_function(&self) -> String {
        let body = match self {
            Self::ScrollIntoView => {
                "el.scrollIntoView({behavior: 'smooth', block: 'center'}); return true;".to_string()
            }
            Self::Click => "el.click(); return true;".to_string(),
            Self::ClearValue => "el.value = ''; return true;".to_string(),
            Self::SetValue(value) => format!(
                "el.value = {}; el.dispatchEvent(new Event('input', {{ bubbles: true }})); return true;",
                js_string(value)
            ),
            Self::ReadValue => {
                "return el.value === undefined || el.value === null ? null : String(el.value);"
                    .to_string()
            }
            Self::SelectByText(text) => format!(
                "const wanted = {}; \
                 const norm = (s) => s.replace(/\\s+/g, ' ').trim(); \
                 const idx = Array.from(el.options || []).findIndex(o => norm(o.text) === norm(wanted)); \
                 if (idx < 0) return false; \
                 el.selectedIndex = idx; \
                 el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
                 return true;",
                js_string(text)
            ),
            Self::SelectedText => {
                "const o = el.options ? el.options[el.selectedIndex] : null; return o ? o.text : null;"
                    .to_string()
            }
            Self::HasShadowRoot => "return !!el.shadowRoot;".to_string(),
            Self::ShadowInteractives => format!(
                "return el.shadowRoot ? Array.from(el.shadowRoot.querySelectorAll({})) : [];",
                js_string(INTERACTIVE_SELECTOR)
            ),
            Self::ScanShadowHosts => {
                "return Array.from(root.querySelectorAll('*')).filter(e => !!e.shadowRoot);"
                    .to_string()
            }
        };
        format!("function (el, root) {{ {body} }}")
    }
}

/// Script body reading `name` from `el` the way WebDriver's getAttribute does.
///
/// A live property wins when it holds a scalar, so an `<input>` without a
/// `type` attribute reads as `"text"`. `false` booleans and empty strings
/// read as absent unless the attribute itself is set. Anything else falls
/// back to the markup attribute.
#[must_use]
pub fn attribute_script(name: &str) -> String {
    format!(
        "const name = {}; \
         if (name === 'value') {{ const v = el.value; return v === undefined || v === null ? null : String(v); }} \
         const prop = el[name]; \
         if (prop === true) return 'true'; \
         if (typeof prop === 'number' || (typeof prop === 'string' && prop !== '')) return String(prop); \
         return el.getAttribute(name);",
        js_string(name)
    )
}
