//! In-memory driver for unit testing.
//!
//! `MockDriver` holds a tiny DOM: a main document, iframe documents and
//! shadow roots, each a flat list of [`MockElement`]s. Native actions and
//! scripts mutate that model, and every call is recorded so tests can check
//! what the probe did (for example that each frame switch was undone).

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use crate::driver::{ElementHandle, FrameContext, ProbeDriver};
use crate::locator::Selector;
use crate::result::{ProbeError, ProbeResult};
use crate::script::DomScript;

const HANDLE_PREFIX: &str = "mock-";

/// A scripted element for [`MockDriver`]
#[derive(Debug, Clone)]
pub struct MockElement {
    tag: String,
    attributes: BTreeMap<String, String>,
    value: String,
    displayed: bool,
    enabled: bool,
    options: Vec<String>,
    selected: Option<usize>,
    aliases: Vec<Selector>,
    shadow_root: Option<Vec<MockElement>>,
    frame_document: Option<Vec<MockElement>>,
    unreadable_document: bool,
    rejects_native_input: bool,
    rejects_script_writes: bool,
}

impl MockElement {
    /// Visible, enabled element with the given tag
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            value: String::new(),
            displayed: true,
            enabled: true,
            options: Vec::new(),
            selected: None,
            aliases: Vec::new(),
            shadow_root: None,
            frame_document: None,
            unreadable_document: false,
            rejects_native_input: false,
            rejects_script_writes: false,
        }
    }

    /// `<input type="text" name=...>`
    #[must_use]
    pub fn input(name: impl Into<String>) -> Self {
        Self::new("input")
            .with_attr("name", name)
            .with_attr("type", "text")
    }

    /// `<select name=...>` with the given option texts, first selected
    #[must_use]
    pub fn select<I, S>(name: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut el = Self::new("select").with_attr("name", name);
        el.options = options.into_iter().map(Into::into).collect();
        el.selected = (!el.options.is_empty()).then_some(0);
        el
    }

    /// `<iframe id=...>` whose document contains `children`
    #[must_use]
    pub fn iframe(id: impl Into<String>, children: Vec<MockElement>) -> Self {
        let mut el = Self::new("iframe").with_attr("id", id);
        el.frame_document = Some(children);
        el
    }

    /// Set an attribute
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Remove an attribute
    #[must_use]
    pub fn without_attr(mut self, name: &str) -> Self {
        self.attributes.remove(name);
        self
    }

    /// Set the current value
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Make the element answer to an XPath/CSS selector
    #[must_use]
    pub fn matching(mut self, selector: Selector) -> Self {
        self.aliases.push(selector);
        self
    }

    /// Attach a shadow root holding `children`
    #[must_use]
    pub fn with_shadow_root(mut self, children: Vec<MockElement>) -> Self {
        self.shadow_root = Some(children);
        self
    }

    /// Not rendered
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    /// `disabled`
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Native click/clear/keys fail on this element
    #[must_use]
    pub fn rejecting_native_input(mut self) -> Self {
        self.rejects_native_input = true;
        self
    }

    /// Scripted click/clear/set-value fail on this element
    #[must_use]
    pub fn rejecting_script_writes(mut self) -> Self {
        self.rejects_script_writes = true;
        self
    }

    /// Lookups inside this iframe's document fail
    #[must_use]
    pub fn with_unreadable_document(mut self) -> Self {
        self.unreadable_document = true;
        self
    }

    fn is_form_control(&self) -> bool {
        matches!(self.tag.as_str(), "input" | "select" | "textarea")
    }

    fn matches(&self, selector: &Selector) -> bool {
        match selector {
            Selector::Name(v) => self.attributes.get("name") == Some(v),
            Selector::Id(v) => self.attributes.get("id") == Some(v),
            Selector::Tag(v) => self.tag.eq_ignore_ascii_case(v),
            Selector::XPath(v) if v == "//*" => true,
            Selector::Css(v) if v == "*" => true,
            other => self.aliases.contains(other),
        }
    }
}

/// Rough syntax check: rooted path with balanced brackets and parentheses
fn is_well_formed_xpath(expr: &str) -> bool {
    if !(expr.starts_with('/') || expr.starts_with('(')) {
        return false;
    }
    let mut depth = 0i32;
    let mut quote = None;
    for c in expr.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '[' | '(') => depth += 1,
            (None, ']' | ')') => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0 && quote.is_none()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Main,
    Frame(usize),
    Shadow(usize),
}

#[derive(Debug)]
struct Node {
    element: MockElement,
    scope: Scope,
    has_shadow_root: bool,
}

#[derive(Debug, Default)]
struct MockDom {
    nodes: Vec<Node>,
}

impl MockDom {
    fn insert(&mut self, mut element: MockElement, scope: Scope) -> usize {
        let shadow = element.shadow_root.take();
        let frame = element.frame_document.take();
        let idx = self.nodes.len();
        self.nodes.push(Node {
            element,
            scope,
            has_shadow_root: shadow.is_some(),
        });
        for child in shadow.into_iter().flatten() {
            self.insert(child, Scope::Shadow(idx));
        }
        for child in frame.into_iter().flatten() {
            self.insert(child, Scope::Frame(idx));
        }
        idx
    }

    fn node(&self, handle: &ElementHandle) -> ProbeResult<&Node> {
        parse_handle(handle)
            .and_then(|idx| self.nodes.get(idx))
            .ok_or_else(|| ProbeError::StaleElement {
                id: handle.id.clone(),
            })
    }

    fn node_mut(&mut self, handle: &ElementHandle) -> ProbeResult<&mut Node> {
        parse_handle(handle)
            .and_then(|idx| self.nodes.get_mut(idx))
            .ok_or_else(|| ProbeError::StaleElement {
                id: handle.id.clone(),
            })
    }

    fn handles_where(&self, keep: impl Fn(&Node) -> bool) -> Vec<ElementHandle> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| keep(node))
            .map(|(idx, node)| handle_for(idx, &node.element))
            .collect()
    }
}

fn handle_for(idx: usize, element: &MockElement) -> ElementHandle {
    ElementHandle::new(format!("{HANDLE_PREFIX}{idx}"), element.tag.clone())
}

fn parse_handle(handle: &ElementHandle) -> Option<usize> {
    handle.id.strip_prefix(HANDLE_PREFIX)?.parse().ok()
}

/// Mock driver for unit testing
#[derive(Debug, Default)]
pub struct MockDriver {
    dom: Mutex<MockDom>,
    frame: FrameContext,
    current_url: String,
    closed: bool,
    call_history: Mutex<Vec<String>>,
}

impl MockDriver {
    /// Create a driver with an empty main document
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a driver whose main document has a `<body>` plus `elements`
    #[must_use]
    pub fn with_page(elements: Vec<MockElement>) -> Self {
        let driver = Self::new();
        {
            let mut dom = driver.dom();
            dom.insert(MockElement::new("body"), Scope::Main);
            for element in elements {
                dom.insert(element, Scope::Main);
            }
        }
        driver
    }

    /// Current value of an element
    #[must_use]
    pub fn value_of(&self, handle: &ElementHandle) -> Option<String> {
        self.dom().node(handle).ok().map(|n| n.element.value.clone())
    }

    /// Attribute of an element, read directly from the model
    #[must_use]
    pub fn attribute_of(&self, handle: &ElementHandle, name: &str) -> Option<String> {
        self.dom()
            .node(handle)
            .ok()
            .and_then(|n| n.element.attributes.get(name).cloned())
    }

    /// Handles of every element with `name`, in any document
    #[must_use]
    pub fn elements_named(&self, name: &str) -> Vec<ElementHandle> {
        self.dom()
            .handles_where(|n| n.element.attributes.get("name").map(String::as_str) == Some(name))
    }

    /// Check if a call with this prefix was recorded
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        self.calls().iter().any(|c| c.starts_with(prefix))
    }

    /// Count recorded calls with this prefix
    #[must_use]
    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    /// Last navigated URL
    #[must_use]
    pub fn current_url(&self) -> &str {
        &self.current_url
    }

    /// Whether `close` was called
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    fn dom(&self) -> MutexGuard<'_, MockDom> {
        self.dom.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn calls(&self) -> MutexGuard<'_, Vec<String>> {
        self.call_history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: impl Into<String>) {
        self.calls().push(call.into());
    }

    /// Scope of the focused document, failing if its frame is unreadable
    fn document_scope(&self, dom: &MockDom) -> ProbeResult<Scope> {
        match &self.frame {
            FrameContext::MainDocument => Ok(Scope::Main),
            FrameContext::InsideFrame(id) => {
                let handle = ElementHandle::new(id.clone(), "iframe");
                let idx = parse_handle(&handle).ok_or_else(|| ProbeError::frame(id.clone()))?;
                let node = dom.node(&handle)?;
                if node.element.unreadable_document {
                    return Err(ProbeError::script(format!(
                        "frame document not accessible: {id}"
                    )));
                }
                Ok(Scope::Frame(idx))
            }
        }
    }

    fn run_script(
        &self,
        script: &DomScript,
        target: Option<&ElementHandle>,
    ) -> ProbeResult<ScriptOutput> {
        let mut dom = self.dom();
        let scope = self.document_scope(&dom)?;

        if let DomScript::ScanShadowHosts = script {
            return Ok(ScriptOutput::Elements(
                dom.handles_where(|n| n.scope == scope && n.has_shadow_root),
            ));
        }

        let target = target.ok_or_else(|| ProbeError::script("script needs a target element"))?;
        let target_idx = parse_handle(target);
        let node = dom.node_mut(target)?;
        let writes = matches!(
            script,
            DomScript::Click | DomScript::ClearValue | DomScript::SetValue(_)
        );
        if writes && node.element.rejects_script_writes {
            return Err(ProbeError::script(format!(
                "script rejected by <{}>",
                node.element.tag
            )));
        }

        let output = match script {
            DomScript::ScrollIntoView | DomScript::Click => Value::Bool(true),
            DomScript::ClearValue => {
                node.element.value.clear();
                Value::Bool(true)
            }
            DomScript::SetValue(v) => {
                node.element.value = v.clone();
                Value::Bool(true)
            }
            DomScript::ReadValue => Value::String(node.element.value.clone()),
            DomScript::SelectByText(text) => {
                let wanted = text.trim();
                match node.element.options.iter().position(|o| o.trim() == wanted) {
                    Some(idx) if node.element.tag == "select" => {
                        node.element.selected = Some(idx);
                        node.element.value = node.element.options[idx].clone();
                        Value::Bool(true)
                    }
                    _ => Value::Bool(false),
                }
            }
            DomScript::SelectedText => node
                .element
                .selected
                .and_then(|i| node.element.options.get(i))
                .map_or(Value::Null, |t| Value::String(t.clone())),
            DomScript::HasShadowRoot => Value::Bool(node.has_shadow_root),
            DomScript::ShadowInteractives => {
                let host = target_idx.ok_or_else(|| ProbeError::StaleElement {
                    id: target.id.clone(),
                })?;
                return Ok(ScriptOutput::Elements(dom.handles_where(|n| {
                    n.scope == Scope::Shadow(host) && n.element.is_form_control()
                })));
            }
            DomScript::ScanShadowHosts => Value::Null,
        };
        Ok(ScriptOutput::Value(output))
    }
}

enum ScriptOutput {
    Value(Value),
    Elements(Vec<ElementHandle>),
}

#[async_trait]
impl ProbeDriver for MockDriver {
    async fn navigate(&mut self, url: &str) -> ProbeResult<()> {
        self.record(format!("navigate:{url}"));
        self.current_url = url.to_string();
        self.frame = FrameContext::MainDocument;
        Ok(())
    }

    async fn find_elements(&self, selector: &Selector) -> ProbeResult<Vec<ElementHandle>> {
        self.record(format!("find:{selector}"));
        if let Selector::XPath(expr) = selector {
            if !is_well_formed_xpath(expr) {
                return Err(ProbeError::script(format!(
                    "Failed to execute 'evaluate' on 'Document': '{expr}' is not a valid XPath expression."
                )));
            }
        }
        let dom = self.dom();
        let scope = self.document_scope(&dom)?;
        let mut found = dom.handles_where(|n| n.scope == scope && n.element.matches(selector));
        if matches!(selector, Selector::Id(_)) {
            found.truncate(1);
        }
        Ok(found)
    }

    async fn click(&self, element: &ElementHandle) -> ProbeResult<()> {
        self.record(format!("click:{}", element.id));
        let dom = self.dom();
        let node = dom.node(element)?;
        if node.element.rejects_native_input {
            return Err(ProbeError::interaction("element click intercepted"));
        }
        if !node.element.displayed {
            return Err(ProbeError::interaction("element not interactable"));
        }
        Ok(())
    }

    async fn clear(&self, element: &ElementHandle) -> ProbeResult<()> {
        self.record(format!("clear:{}", element.id));
        let mut dom = self.dom();
        let node = dom.node_mut(element)?;
        if node.element.rejects_native_input {
            return Err(ProbeError::interaction("invalid element state"));
        }
        node.element.value.clear();
        Ok(())
    }

    async fn send_keys(&self, element: &ElementHandle, text: &str) -> ProbeResult<()> {
        self.record(format!("send_keys:{}", element.id));
        let mut dom = self.dom();
        let node = dom.node_mut(element)?;
        if node.element.rejects_native_input {
            return Err(ProbeError::interaction("element not reachable by keyboard"));
        }
        node.element.value.push_str(text);
        Ok(())
    }

    async fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> ProbeResult<Option<String>> {
        let dom = self.dom();
        let el = &dom.node(element)?.element;
        Ok(match name {
            "value" if el.is_form_control() => Some(el.value.clone()),
            "type" if el.tag == "input" => Some(
                el.attributes
                    .get("type")
                    .cloned()
                    .unwrap_or_else(|| "text".to_string()),
            ),
            _ => el.attributes.get(name).cloned(),
        })
    }

    async fn is_displayed(&self, element: &ElementHandle) -> ProbeResult<bool> {
        Ok(self.dom().node(element)?.element.displayed)
    }

    async fn is_enabled(&self, element: &ElementHandle) -> ProbeResult<bool> {
        Ok(self.dom().node(element)?.element.enabled)
    }

    async fn execute_script(
        &self,
        script: &DomScript,
        target: Option<&ElementHandle>,
    ) -> ProbeResult<Value> {
        self.record(format!("script:{script:?}"));
        match self.run_script(script, target)? {
            ScriptOutput::Value(v) => Ok(v),
            ScriptOutput::Elements(handles) => Ok(serde_json::to_value(handles)?),
        }
    }

    async fn execute_script_elements(
        &self,
        script: &DomScript,
        target: Option<&ElementHandle>,
    ) -> ProbeResult<Vec<ElementHandle>> {
        self.record(format!("script:{script:?}"));
        match self.run_script(script, target)? {
            ScriptOutput::Elements(handles) => Ok(handles),
            ScriptOutput::Value(_) => Err(ProbeError::script(format!(
                "{script:?} does not return elements"
            ))),
        }
    }

    async fn switch_to_frame(&mut self, frame: &ElementHandle) -> ProbeResult<()> {
        self.record(format!("enter-frame:{}", frame.id));
        let is_frame = {
            let dom = self.dom();
            let node = dom.node(frame)?;
            matches!(node.element.tag.as_str(), "iframe" | "frame")
        };
        if !is_frame {
            return Err(ProbeError::frame(format!("<{}> is not a frame", frame.tag_name)));
        }
        self.frame = FrameContext::InsideFrame(frame.id.clone());
        Ok(())
    }

    async fn switch_to_main(&mut self) -> ProbeResult<()> {
        self.record("exit-frame");
        self.frame = FrameContext::MainDocument;
        Ok(())
    }

    fn frame_context(&self) -> FrameContext {
        self.frame.clone()
    }

    async fn close(&mut self) -> ProbeResult<()> {
        self.record("close");
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_page_has_body() {
        let driver = MockDriver::with_page(vec![]);
        let bodies = driver.find_elements(&Selector::tag("body")).await.unwrap();
        assert_eq!(bodies.len(), 1);
    }

    #[tokio::test]
    async fn test_native_typing_appends() {
        let driver = MockDriver::with_page(vec![MockElement::input("fname").with_value("old")]);
        let el = driver.elements_named("fname").remove(0);
        driver.clear(&el).await.unwrap();
        driver.send_keys(&el, "Cloud").await.unwrap();
        driver.send_keys(&el, "QA").await.unwrap();
        assert_eq!(driver.value_of(&el).as_deref(), Some("CloudQA"));
    }

    #[tokio::test]
    async fn test_frame_documents_are_isolated() {
        let mut driver = MockDriver::with_page(vec![
            MockElement::input("outer"),
            MockElement::iframe("f", vec![MockElement::input("inner")]),
        ]);
        let outer = driver.find_elements(&Selector::name("inner")).await.unwrap();
        assert!(outer.is_empty());

        let frame = driver.find_elements(&Selector::tag("iframe")).await.unwrap().remove(0);
        driver.switch_to_frame(&frame).await.unwrap();
        assert_eq!(driver.frame_context(), FrameContext::InsideFrame(frame.id.clone()));
        let inner = driver.find_elements(&Selector::name("inner")).await.unwrap();
        assert_eq!(inner.len(), 1);
        assert!(driver.find_elements(&Selector::name("outer")).await.unwrap().is_empty());

        driver.switch_to_main().await.unwrap();
        assert!(driver.frame_context().is_main());
    }

    #[tokio::test]
    async fn test_switching_into_non_frame_fails() {
        let mut driver = MockDriver::with_page(vec![MockElement::input("fname")]);
        let el = driver.elements_named("fname").remove(0);
        assert!(driver.switch_to_frame(&el).await.is_err());
        assert!(driver.frame_context().is_main());
    }

    #[tokio::test]
    async fn test_shadow_children_only_reachable_by_script() {
        let driver = MockDriver::with_page(vec![MockElement::new("div")
            .with_attr("id", "host")
            .with_shadow_root(vec![MockElement::input("shadowed")])]);
        assert!(driver
            .find_elements(&Selector::name("shadowed"))
            .await
            .unwrap()
            .is_empty());

        let host = driver.find_elements(&Selector::id("host")).await.unwrap().remove(0);
        let inner = driver
            .execute_script_elements(&DomScript::ShadowInteractives, Some(&host))
            .await
            .unwrap();
        assert_eq!(inner.len(), 1);
        assert_eq!(inner[0].tag_name, "input");
    }

    #[tokio::test]
    async fn test_select_by_text() {
        let driver = MockDriver::with_page(vec![MockElement::select(
            "country",
            ["Select", "India", "Japan"],
        )]);
        let el = driver.elements_named("country").remove(0);
        let ok = driver
            .execute_script(&DomScript::SelectByText("Japan".into()), Some(&el))
            .await
            .unwrap();
        assert_eq!(ok, Value::Bool(true));
        let text = driver
            .execute_script(&DomScript::SelectedText, Some(&el))
            .await
            .unwrap();
        assert_eq!(text, Value::String("Japan".into()));

        let missing = driver
            .execute_script(&DomScript::SelectByText("Atlantis".into()), Some(&el))
            .await
            .unwrap();
        assert_eq!(missing, Value::Bool(false));
    }

    #[tokio::test]
    async fn test_malformed_xpath_is_rejected() {
        let driver = MockDriver::with_page(vec![MockElement::input("fname")]);
        assert!(driver
            .find_elements(&Selector::xpath("//input[@name='fname'"))
            .await
            .is_err());
        assert!(driver
            .find_elements(&Selector::xpath("//input[@name='x]y']"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_history_records_calls() {
        let mut driver = MockDriver::new();
        driver.navigate("https://example.com").await.unwrap();
        driver.close().await.unwrap();
        assert!(driver.was_called("navigate:https://example.com"));
        assert!(driver.is_closed());
        assert_eq!(driver.current_url(), "https://example.com");
    }
}
