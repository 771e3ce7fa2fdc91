//! Chromium control over the Chrome DevTools Protocol.
//!
//! # Feature Flag
//!
//! The CDP driver requires the `browser` feature:
//! ```toml
//! formprobe = { version = "0.1", features = ["browser"] }
//! ```
//!
//! Without it only [`ChromiumConfig`] is available.
//!
//! # Frames
//!
//! CDP has no notion of "current frame". The driver keeps the focus itself
//! and runs every lookup and script from the top page against either
//! `document` or the focused iframe's `contentDocument`. Element handles are
//! ids into a registry installed on the top window, so they stay valid across
//! frame switches until the next navigation. Cross-origin iframes have no
//! readable `contentDocument`; entering one fails for that iframe only.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Flags passed to Chromium on every launch
pub const BASE_LAUNCH_ARGS: [&str; 6] = [
    "--disable-blink-features=AutomationControlled",
    "--disable-extensions",
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--disable-web-security",
    "--allow-running-insecure-content",
];

/// Browser launch configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChromiumConfig {
    /// Run without a window
    pub headless: bool,
    /// Window width
    pub window_width: u32,
    /// Window height
    pub window_height: u32,
    /// Chromium executable, found automatically when unset
    pub chromium_path: Option<PathBuf>,
    /// Keep the Chromium sandbox
    pub sandbox: bool,
    /// Additional command-line flags
    pub extra_args: Vec<String>,
}

impl Default for ChromiumConfig {
    fn default() -> Self {
        Self {
            headless: false,
            window_width: 1920,
            window_height: 1080,
            chromium_path: None,
            sandbox: false,
            extra_args: Vec::new(),
        }
    }
}

impl ChromiumConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set window size
    #[must_use]
    pub const fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_width = width;
        self.window_height = height;
        self
    }

    /// Set the Chromium executable
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Enable or disable the sandbox
    #[must_use]
    pub const fn with_sandbox(mut self, enabled: bool) -> Self {
        self.sandbox = enabled;
        self
    }

    /// Append a command-line flag
    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    /// Full list of command-line flags for this configuration
    #[must_use]
    pub fn launch_args(&self) -> Vec<String> {
        let mut args: Vec<String> = BASE_LAUNCH_ARGS.iter().map(|s| (*s).to_string()).collect();
        if !self.sandbox {
            args.push("--no-sandbox".to_string());
        }
        args.push(format!(
            "--window-size={},{}",
            self.window_width, self.window_height
        ));
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

#[cfg(feature = "browser")]
mod cdp {
    use super::ChromiumConfig;
    use crate::driver::{ElementHandle, FrameContext, ProbeDriver};
    use crate::locator::{js_string, Selector};
    use crate::result::{ProbeError, ProbeResult};
    use crate::script::{attribute_script, DomScript};
    use async_trait::async_trait;
    use chromiumoxide::browser::{Browser, BrowserConfig};
    use chromiumoxide::cdp::browser_protocol::input::{
        DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams,
        DispatchMouseEventType, MouseButton,
    };
    use chromiumoxide::page::Page;
    use futures::StreamExt;
    use serde::Deserialize;
    use serde_json::Value;
    use tokio::sync::Mutex;
    use tokio::task::JoinHandle;
    use tracing::{debug, info};

    /// Installs the element registry on the top window once per document
    const PRELUDE: &str = r"
        if (!window.__formprobe) {
            const refs = new Map();
            let next = 0;
            window.__formprobe = {
                put(el) {
                    for (const [id, known] of refs) { if (known === el) return id; }
                    const id = 'fp-' + (++next);
                    refs.set(id, el);
                    return id;
                },
                get(id) {
                    const el = refs.get(id);
                    if (!el || !el.isConnected) throw new Error('stale element reference: ' + id);
                    return el;
                },
                describe(el) {
                    return { id: this.put(el), tag_name: el.tagName.toLowerCase() };
                },
                frameDocument(id) {
                    const frame = this.get(id);
                    if (!/^i?frame$/i.test(frame.tagName)) throw new Error('<' + frame.tagName.toLowerCase() + '> is not a frame');
                    const doc = frame.contentDocument;
                    if (!doc) throw new Error('frame document not accessible: ' + id);
                    return doc;
                },
            };
        }
        const fp = window.__formprobe;
    ";

    const CLICK_POINT: &str = r"
        el.focus({ preventScroll: true });
        const rect = el.getBoundingClientRect();
        if (rect.width === 0 || rect.height === 0) throw new Error('element not interactable');
        let x = rect.left + rect.width / 2;
        let y = rect.top + rect.height / 2;
        const hit = el.ownerDocument.elementFromPoint(x, y);
        if (!hit || !(hit === el || el.contains(hit))) throw new Error('element click intercepted');
        let win = el.ownerDocument.defaultView;
        while (win && win.frameElement) {
            const outer = win.frameElement.getBoundingClientRect();
            x += outer.left;
            y += outer.top;
            win = win.parent;
        }
        return { x, y };
    ";

    const FOCUS_FOR_KEYS: &str = r"
        el.focus();
        if (el.ownerDocument.activeElement !== el) throw new Error('element not reachable by keyboard');
        if (typeof el.select === 'function') el.select();
        return el.value === undefined || el.value === null ? 0 : String(el.value).length;
    ";

    const IS_DISPLAYED: &str = r"
        const style = el.ownerDocument.defaultView.getComputedStyle(el);
        if (style.display === 'none' || style.visibility === 'hidden' || style.opacity === '0') return false;
        const rect = el.getBoundingClientRect();
        return rect.width > 0 && rect.height > 0;
    ";

    const VK_BACK: i64 = 8;

    #[derive(Debug, Deserialize)]
    struct Point {
        x: f64,
        y: f64,
    }

    /// Chromium session driving one page
    #[derive(Debug)]
    pub struct ChromiumDriver {
        browser: Mutex<Browser>,
        page: Page,
        handler: JoinHandle<()>,
        frame: FrameContext,
    }

    fn launch_error(e: impl std::fmt::Display) -> ProbeError {
        ProbeError::BrowserLaunch {
            message: e.to_string(),
        }
    }

    fn interaction_error(e: impl std::fmt::Display) -> ProbeError {
        ProbeError::interaction(e.to_string())
    }

    impl ChromiumDriver {
        /// Launch Chromium and open a blank page
        ///
        /// # Errors
        ///
        /// Returns [`ProbeError::BrowserLaunch`] if Chromium cannot be started
        pub async fn launch(config: &ChromiumConfig) -> ProbeResult<Self> {
            let mut builder = BrowserConfig::builder()
                .window_size(config.window_width, config.window_height)
                .viewport(None)
                .args(config.launch_args());

            if !config.headless {
                builder = builder.with_head();
            }

            if let Some(ref path) = config.chromium_path {
                builder = builder.chrome_executable(path);
            }

            let cdp_config = builder.build().map_err(launch_error)?;
            let (browser, mut handler) = Browser::launch(cdp_config).await.map_err(launch_error)?;

            let handler = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });

            let page = browser.new_page("about:blank").await.map_err(launch_error)?;
            info!(headless = config.headless, "chromium launched");

            Ok(Self {
                browser: Mutex::new(browser),
                page,
                handler,
                frame: FrameContext::MainDocument,
            })
        }

        fn root_expr(&self) -> String {
            match &self.frame {
                FrameContext::MainDocument => "document".to_string(),
                FrameContext::InsideFrame(id) => format!("fp.frameDocument({})", js_string(id)),
            }
        }

        /// Evaluate `body` with `fp` and `root` bound
        async fn eval(&self, body: &str) -> ProbeResult<Value> {
            let expression = format!(
                "(() => {{ {PRELUDE} const root = {}; {body} }})()",
                self.root_expr()
            );
            let result = self
                .page
                .evaluate(expression)
                .await
                .map_err(|e| ProbeError::script(e.to_string()))?;
            Ok(result.value().cloned().unwrap_or(Value::Null))
        }

        /// Evaluate `body` with `el` bound to `element`
        async fn eval_on(&self, element: &ElementHandle, body: &str) -> ProbeResult<Value> {
            self.eval(&format!("const el = fp.get({}); {body}", js_string(&element.id)))
                .await
        }

        async fn dispatch_key(&self, kind: DispatchKeyEventType) -> ProbeResult<()> {
            let params = DispatchKeyEventParams::builder()
                .r#type(kind)
                .key("Backspace")
                .code("Backspace")
                .windows_virtual_key_code(VK_BACK)
                .build()
                .map_err(ProbeError::interaction)?;
            self.page.execute(params).await.map_err(interaction_error)?;
            Ok(())
        }
    }

    #[async_trait]
    impl ProbeDriver for ChromiumDriver {
        async fn navigate(&mut self, url: &str) -> ProbeResult<()> {
            self.frame = FrameContext::MainDocument;
            self.page
                .goto(url)
                .await
                .map_err(|e| ProbeError::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
            debug!(url, "navigated");
            Ok(())
        }

        async fn find_elements(&self, selector: &Selector) -> ProbeResult<Vec<ElementHandle>> {
            let found = self
                .eval(&format!(
                    "return {}.map(e => fp.describe(e));",
                    selector.to_js_query()
                ))
                .await?;
            Ok(serde_json::from_value(found)?)
        }

        async fn click(&self, element: &ElementHandle) -> ProbeResult<()> {
            let point: Point = serde_json::from_value(
                self.eval_on(element, CLICK_POINT)
                    .await
                    .map_err(interaction_error)?,
            )?;

            for kind in [
                DispatchMouseEventType::MouseMoved,
                DispatchMouseEventType::MousePressed,
                DispatchMouseEventType::MouseReleased,
            ] {
                let mut builder = DispatchMouseEventParams::builder()
                    .r#type(kind.clone())
                    .x(point.x)
                    .y(point.y);
                if kind != DispatchMouseEventType::MouseMoved {
                    builder = builder.button(MouseButton::Left).click_count(1);
                }
                let params = builder.build().map_err(ProbeError::interaction)?;
                self.page.execute(params).await.map_err(interaction_error)?;
            }
            Ok(())
        }

        async fn clear(&self, element: &ElementHandle) -> ProbeResult<()> {
            self.eval_on(element, FOCUS_FOR_KEYS)
                .await
                .map_err(interaction_error)?;
            self.dispatch_key(DispatchKeyEventType::RawKeyDown).await?;
            self.dispatch_key(DispatchKeyEventType::KeyUp).await?;

            let left = self
                .eval_on(element, "return el.value ? String(el.value).length : 0;")
                .await?;
            if left.as_u64().unwrap_or(0) > 0 {
                return Err(ProbeError::interaction("invalid element state: value not cleared"));
            }
            Ok(())
        }

        async fn send_keys(&self, element: &ElementHandle, text: &str) -> ProbeResult<()> {
            self.eval_on(
                element,
                "el.focus(); if (el.ownerDocument.activeElement !== el) \
                 throw new Error('element not reachable by keyboard'); return true;",
            )
            .await
            .map_err(interaction_error)?;

            for ch in text.chars() {
                let params = DispatchKeyEventParams::builder()
                    .r#type(DispatchKeyEventType::Char)
                    .text(ch.to_string())
                    .build()
                    .map_err(ProbeError::interaction)?;
                self.page.execute(params).await.map_err(interaction_error)?;
            }
            Ok(())
        }

        async fn attribute(
            &self,
            element: &ElementHandle,
            name: &str,
        ) -> ProbeResult<Option<String>> {
            let value = self.eval_on(element, &attribute_script(name)).await?;
            Ok(value.as_str().map(str::to_string))
        }

        async fn is_displayed(&self, element: &ElementHandle) -> ProbeResult<bool> {
            Ok(self.eval_on(element, IS_DISPLAYED).await?.as_bool().unwrap_or(false))
        }

        async fn is_enabled(&self, element: &ElementHandle) -> ProbeResult<bool> {
            Ok(self
                .eval_on(element, "return !el.disabled;")
                .await?
                .as_bool()
                .unwrap_or(false))
        }

        async fn execute_script(
            &self,
            script: &DomScript,
            target: Option<&ElementHandle>,
        ) -> ProbeResult<Value> {
            let call = format!("({})(el, root)", script.to_function());
            let call = if script.returns_elements() {
                format!("{call}.map(e => fp.describe(e))")
            } else {
                call
            };
            match target {
                Some(el) => self.eval_on(el, &format!("return {call};")).await,
                None if script.needs_target() => Err(ProbeError::script(format!(
                    "{script:?} needs a target element"
                ))),
                None => self.eval(&format!("const el = null; return {call};")).await,
            }
        }

        async fn execute_script_elements(
            &self,
            script: &DomScript,
            target: Option<&ElementHandle>,
        ) -> ProbeResult<Vec<ElementHandle>> {
            if !script.returns_elements() {
                return Err(ProbeError::script(format!(
                    "{script:?} does not return elements"
                )));
            }
            let found = self.execute_script(script, target).await?;
            Ok(serde_json::from_value(found)?)
        }

        async fn switch_to_frame(&mut self, frame: &ElementHandle) -> ProbeResult<()> {
            self.eval(&format!(
                "fp.frameDocument({}); return true;",
                js_string(&frame.id)
            ))
            .await
            .map_err(|e| ProbeError::frame(e.to_string()))?;
            self.frame = FrameContext::InsideFrame(frame.id.clone());
            Ok(())
        }

        async fn switch_to_main(&mut self) -> ProbeResult<()> {
            self.frame = FrameContext::MainDocument;
            Ok(())
        }

        fn frame_context(&self) -> FrameContext {
            self.frame.clone()
        }

        async fn close(&mut self) -> ProbeResult<()> {
            let mut browser = self.browser.lock().await;
            let closed = browser.close().await.map_err(launch_error);
            self.handler.abort();
            info!("chromium closed");
            closed.map(drop)
        }
    }
}

#[cfg(feature = "browser")]
pub use cdp::ChromiumDriver;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_headed_full_hd() {
        let config = ChromiumConfig::default();
        assert!(!config.headless);
        assert_eq!((config.window_width, config.window_height), (1920, 1080));
        assert!(config.chromium_path.is_none());
    }

    #[test]
    fn test_default_launch_args() {
        let args = ChromiumConfig::default().launch_args();
        for expected in [
            "--disable-blink-features=AutomationControlled",
            "--disable-extensions",
            "--no-sandbox",
            "--disable-dev-shm-usage",
            "--disable-gpu",
            "--window-size=1920,1080",
            "--disable-web-security",
            "--allow-running-insecure-content",
        ] {
            assert!(args.iter().any(|a| a == expected), "missing {expected}");
        }
    }

    #[test]
    fn test_sandbox_and_extra_args() {
        let args = ChromiumConfig::new()
            .with_sandbox(true)
            .with_window_size(1280, 720)
            .with_arg("--lang=en-US")
            .launch_args();
        assert!(!args.iter().any(|a| a == "--no-sandbox"));
        assert!(args.iter().any(|a| a == "--window-size=1280,720"));
        assert_eq!(args.last().map(String::as_str), Some("--lang=en-US"));
    }

    #[test]
    fn test_builder_sets_path_and_headless() {
        let config = ChromiumConfig::new()
            .with_headless(true)
            .with_chromium_path("/usr/bin/chromium");
        assert!(config.headless);
        assert_eq!(
            config.chromium_path.as_deref(),
            Some(std::path::Path::new("/usr/bin/chromium"))
        );
    }
}
