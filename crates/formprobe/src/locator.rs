//! Selectors and ordered fallback chains for locating form fields.
//!
//! Real-world forms disagree on how they label a field (`name` vs `id` vs
//! placeholder text), so a field is described by a [`LocatorChain`]: an
//! ordered list of [`Selector`]s, most specific first. Resolution walks the
//! chain and stops at the first selector that yields a visible element.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::driver::{ElementHandle, ProbeDriver};
use crate::result::ProbeError;
use crate::wait::{wait_for, WaitOptions, WaitResult};

/// Selector kind + value, evaluated against the current document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Selector {
    /// `name` attribute
    Name(String),
    /// `id` attribute
    Id(String),
    /// XPath expression
    XPath(String),
    /// CSS selector (may be a selector list)
    Css(String),
    /// Tag name
    Tag(String),
}

impl Selector {
    /// Create a `name` attribute selector
    #[must_use]
    pub fn name(value: impl Into<String>) -> Self {
        Self::Name(value.into())
    }

    /// Create an `id` selector
    #[must_use]
    pub fn id(value: impl Into<String>) -> Self {
        Self::Id(value.into())
    }

    /// Create an XPath selector
    #[must_use]
    pub fn xpath(value: impl Into<String>) -> Self {
        Self::XPath(value.into())
    }

    /// Create a CSS selector
    #[must_use]
    pub fn css(value: impl Into<String>) -> Self {
        Self::Css(value.into())
    }

    /// Create a tag name selector
    #[must_use]
    pub fn tag(value: impl Into<String>) -> Self {
        Self::Tag(value.into())
    }

    /// Short kind label used in reports
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Name(_) => "Name",
            Self::Id(_) => "Id",
            Self::XPath(_) => "XPath",
            Self::Css(_) => "CssSelector",
            Self::Tag(_) => "TagName",
        }
    }

    /// Raw selector value
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Name(v) | Self::Id(v) | Self::XPath(v) | Self::Css(v) | Self::Tag(v) => v,
        }
    }

    /// JavaScript expression yielding an array of all matches under `root`.
    ///
    /// `root` must be bound to a `Document` in the evaluating scope.
    #[must_use]
    pub fn to_js_query(&self) -> String {
        let v = js_string(self.value());
        match self {
            Self::Name(_) => {
                format!("Array.from(root.querySelectorAll('[name=\"' + CSS.escape({v}) + '\"]'))")
            }
            Self::Id(_) => format!("(() => {{ const el = root.getElementById({v}); return el ? [el] : []; }})()"),
            Self::XPath(_) => format!(
                "(() => {{ const snap = root.evaluate({v}, root, null, 7, null); const out = []; \
                 for (let i = 0; i < snap.snapshotLength; i++) {{ const n = snap.snapshotItem(i); \
                 if (n.nodeType === 1) out.push(n); }} return out; }})()"
            ),
            Self::Css(_) => format!("Array.from(root.querySelectorAll({v}))"),
            Self::Tag(_) => format!("Array.from(root.getElementsByTagName({v}))"),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "By.{}: {}", self.kind(), self.value())
    }
}

/// Quote a Rust string as a JavaScript string literal
pub(crate) fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_owned()).to_string()
}

/// Ordered list of selectors, tried first to last
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorChain {
    selectors: Vec<Selector>,
}

impl LocatorChain {
    /// Create an empty chain
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a selector to the end of the chain
    #[must_use]
    pub fn or(mut self, selector: Selector) -> Self {
        self.selectors.push(selector);
        self
    }

    /// Selectors in evaluation order
    #[must_use]
    pub fn selectors(&self) -> &[Selector] {
        &self.selectors
    }

    /// Number of selectors
    #[must_use]
    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    /// Whether the chain has no selectors
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }
}

/// An element together with the selector that found it
#[derive(Debug, Clone)]
pub struct Located {
    /// The element
    pub element: ElementHandle,
    /// Selector that resolved it
    pub selector: Selector,
}

/// Resolve a chain to the first present *and* visible element.
///
/// Each selector gets up to `options.timeout` to produce at least one match.
/// The first match is then checked for visibility; a hidden match moves on to
/// the next selector. A selector the driver rejects (malformed XPath, an
/// unreadable frame) is a miss at once, without waiting out the timeout.
/// Exhausting the chain yields `None`.
pub async fn find_with_fallback<D>(
    driver: &D,
    chain: &LocatorChain,
    options: &WaitOptions,
) -> Option<Located>
where
    D: ProbeDriver + ?Sized,
{
    for selector in chain.selectors() {
        let found = wait_for(options, &selector.to_string(), move || async move {
            Ok::<_, ProbeError>(match driver.find_elements(selector).await {
                Ok(matches) => matches.into_iter().next().map(Ok),
                Err(e) => Some(Err(e)),
            })
        })
        .await;

        let element = match found {
            Ok(WaitResult { value: Ok(element), .. }) => element,
            Ok(WaitResult { value: Err(e), .. }) => {
                debug!(%selector, error = %e, "locator rejected");
                continue;
            }
            Err(e) => {
                debug!(%selector, error = %e, "locator missed");
                continue;
            }
        };

        match driver.is_displayed(&element).await {
            Ok(true) => {
                return Some(Located {
                    element,
                    selector: selector.clone(),
                })
            }
            Ok(false) => debug!(%selector, "locator matched a hidden element"),
            Err(e) => debug!(%selector, error = %e, "visibility check failed"),
        }
    }
    None
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::{MockDriver, MockElement};

    fn fast() -> WaitOptions {
        WaitOptions::new().with_timeout(30).with_poll_interval(5)
    }

    mod selector_tests {
        use super::*;

        #[test]
        fn test_display_mirrors_by_notation() {
            assert_eq!(Selector::name("fname").to_string(), "By.Name: fname");
            assert_eq!(
                Selector::css("input[type='email']").to_string(),
                "By.CssSelector: input[type='email']"
            );
        }

        #[test]
        fn test_js_query_quotes_values() {
            let query = Selector::xpath("//input[@placeholder='First Name']").to_js_query();
            assert!(query.contains(r#""//input[@placeholder='First Name']""#));
            assert!(query.contains("snapshotLength"));

            let query = Selector::name("a\"b").to_js_query();
            assert!(query.contains(r#"CSS.escape("a\"b")"#));
        }

        #[test]
        fn test_id_query_wraps_single_element() {
            let query = Selector::id("fname").to_js_query();
            assert!(query.contains("getElementById(\"fname\")"));
            assert!(query.contains("el ? [el] : []"));
        }

        #[test]
        fn test_serde_shape() {
            let json = serde_json::to_value(Selector::tag("iframe")).unwrap();
            assert_eq!(json, serde_json::json!({"kind": "tag", "value": "iframe"}));
        }
    }

    mod chain_tests {
        use super::*;

        #[test]
        fn test_chain_preserves_order() {
            let chain = LocatorChain::new()
                .or(Selector::name("email"))
                .or(Selector::name("emailid"));
            assert_eq!(chain.len(), 2);
            assert_eq!(chain.selectors()[0], Selector::name("email"));
            assert_eq!(chain.selectors()[1], Selector::name("emailid"));
        }

        #[test]
        fn test_empty_chain() {
            assert!(LocatorChain::new().is_empty());
        }
    }

    mod resolution_tests {
        use super::*;

        #[tokio::test]
        async fn test_first_visible_match_wins() {
            let driver = MockDriver::with_page(vec![
                MockElement::input("hidden").hidden(),
                MockElement::input("second"),
                MockElement::input("third"),
            ]);
            let chain = LocatorChain::new()
                .or(Selector::name("missing"))
                .or(Selector::name("hidden"))
                .or(Selector::name("second"))
                .or(Selector::name("third"));

            let located = find_with_fallback(&driver, &chain, &fast()).await.unwrap();
            assert_eq!(located.selector, Selector::name("second"));
            assert_eq!(driver.attribute_of(&located.element, "name").as_deref(), Some("second"));
        }

        #[tokio::test]
        async fn test_later_entries_do_not_matter() {
            let driver = MockDriver::with_page(vec![MockElement::input("fname")]);
            let chain = LocatorChain::new()
                .or(Selector::name("fname"))
                .or(Selector::xpath("this is not xpath"));

            let located = find_with_fallback(&driver, &chain, &fast()).await.unwrap();
            assert_eq!(located.selector, Selector::name("fname"));
        }

        #[tokio::test]
        async fn test_exhausted_chain_is_none() {
            let driver = MockDriver::with_page(vec![MockElement::input("other")]);
            let chain = LocatorChain::new()
                .or(Selector::name("fname"))
                .or(Selector::id("fname"));

            assert!(find_with_fallback(&driver, &chain, &fast()).await.is_none());
        }

        #[tokio::test]
        async fn test_rejected_selector_is_skipped_without_waiting() {
            let driver = MockDriver::with_page(vec![MockElement::input("fname")]);
            let chain = LocatorChain::new()
                .or(Selector::xpath("input[@name='fname'"))
                .or(Selector::name("fname"));
            let patient = WaitOptions::new().with_timeout(5_000).with_poll_interval(5);

            let start = std::time::Instant::now();
            let located = find_with_fallback(&driver, &chain, &patient).await.unwrap();
            assert!(start.elapsed() < std::time::Duration::from_secs(2));
            assert_eq!(located.selector, Selector::name("fname"));
            assert_eq!(driver.count_calls("find:By.XPath: input[@name='fname'"), 1);
        }

        #[tokio::test]
        async fn test_empty_chain_is_none() {
            let driver = MockDriver::with_page(vec![MockElement::input("fname")]);
            assert!(find_with_fallback(&driver, &LocatorChain::new(), &fast())
                .await
                .is_none());
        }
    }

    mod ordering_properties {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        enum Entry {
            Missing,
            Hidden,
            Visible,
            Malformed,
        }

        fn entry() -> impl Strategy<Value = Entry> {
            prop_oneof![
                Just(Entry::Missing),
                Just(Entry::Hidden),
                Just(Entry::Visible),
                Just(Entry::Malformed),
            ]
        }

        fn resolve(entries: &[Entry]) -> Option<Selector> {
            let mut elements = Vec::new();
            let mut chain = LocatorChain::new();
            for (i, entry) in entries.iter().enumerate() {
                let name = format!("field{i}");
                match entry {
                    Entry::Missing => chain = chain.or(Selector::name(name)),
                    Entry::Hidden => {
                        elements.push(MockElement::input(name.clone()).hidden());
                        chain = chain.or(Selector::name(name));
                    }
                    Entry::Visible => {
                        elements.push(MockElement::input(name.clone()));
                        chain = chain.or(Selector::name(name));
                    }
                    Entry::Malformed => chain = chain.or(Selector::xpath(format!("{name}[@"))),
                }
            }
            let driver = MockDriver::with_page(elements);
            let options = WaitOptions::new().with_timeout(0).with_poll_interval(1);
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .unwrap();
            runtime
                .block_on(find_with_fallback(&driver, &chain, &options))
                .map(|located| located.selector)
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn prop_first_present_visible_entry_wins(
                entries in prop::collection::vec(entry(), 0..8)
            ) {
                let expected = entries
                    .iter()
                    .position(|e| *e == Entry::Visible)
                    .map(|i| Selector::name(format!("field{i}")));
                prop_assert_eq!(resolve(&entries), expected);
            }
        }
    }
}
