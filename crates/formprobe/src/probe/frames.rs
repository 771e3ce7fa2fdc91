//! Iframe probing.
//!
//! All work inside an iframe goes through [`FormProbe::within_frame`], which
//! switches focus back to the main document on every exit path.

use futures::future::LocalBoxFuture;
use tracing::{debug, warn};

use super::FormProbe;
use crate::driver::{is_truthy, ElementHandle, ProbeDriver};
use crate::locator::Selector;
use crate::report::{CheckStatus, ProbeObserver};
use crate::result::{ProbeError, ProbeResult};
use crate::script::DomScript;

/// Label used for form controls inside iframes
const FRAME_LABEL: &str = "iframe";

impl<D: ProbeDriver, O: ProbeObserver> FormProbe<D, O> {
    /// Run `body` with focus inside `frame`.
    ///
    /// Focus is returned to the main document afterwards whether entering
    /// the frame, the body or neither failed. The body's error wins over a
    /// failure to switch back.
    pub async fn within_frame<T, F>(&mut self, frame: &ElementHandle, body: F) -> ProbeResult<T>
    where
        F: for<'p> FnOnce(&'p mut Self) -> LocalBoxFuture<'p, ProbeResult<T>>,
    {
        let outcome = match self.driver.switch_to_frame(frame).await {
            Ok(()) => {
                debug!(frame = %frame.id, "entered frame");
                body(self).await
            }
            Err(e) => Err(e),
        };

        let restored = self.driver.switch_to_main().await;
        debug!(frame = %frame.id, "returned to main document");

        match (outcome, restored) {
            (Err(e), _) => Err(e),
            (Ok(_), Err(e)) => Err(e),
            (Ok(value), Ok(())) => Ok(value),
        }
    }

    async fn iframes(&self) -> ProbeResult<Vec<ElementHandle>> {
        self.driver.find_elements(&Selector::tag("iframe")).await
    }

    /// Enter every iframe on the page and probe its form controls
    pub async fn probe_frames(&mut self) {
        self.emit(CheckStatus::Heading, 0, "Testing iFrame Elements:");

        let frames = match self.iframes().await {
            Ok(frames) => frames,
            Err(e) => {
                self.check(false, 0, format!("iFrame test failed: {e}"));
                return;
            }
        };
        self.emit(
            CheckStatus::Plain,
            0,
            format!("Found {} iframe(s) on the page", frames.len()),
        );

        for frame in &frames {
            let id = self.attribute_or(frame, "id", "No id").await;
            let src = self.attribute_or(frame, "src", "No src attribute").await;
            self.emit(
                CheckStatus::Detail,
                0,
                format!("Processing iframe: ID='{id}', Src='{src}'"),
            );

            let outcome = self
                .within_frame(frame, |probe| {
                    Box::pin(async move {
                        probe.emit(CheckStatus::Pass, 0, "Successfully switched to iframe");
                        probe.probe_context(FRAME_LABEL).await;
                        Ok::<(), ProbeError>(())
                    })
                })
                .await;

            match outcome {
                Ok(()) => self.emit(CheckStatus::Pass, 0, "Switched back to main content"),
                Err(e) => {
                    warn!(frame = %frame.id, error = %e, "iframe probe failed");
                    self.emit(CheckStatus::Warn, 0, format!("iFrame processing error: {e}"));
                }
            }
        }

        if frames.is_empty() {
            self.emit(CheckStatus::Info, 0, "No iframes found on this page");
        }
    }

    /// Count the form controls in the focused document and fill the first
    /// few text inputs.
    pub async fn probe_context(&mut self, label: &str) {
        let counted = self.count_controls().await;
        let inputs = match counted {
            Ok((total, inputs)) => {
                self.emit(
                    CheckStatus::Plain,
                    1,
                    format!("Found {total} interactive element(s) in {label}"),
                );
                inputs
            }
            Err(e) => {
                self.emit(
                    CheckStatus::Warn,
                    1,
                    format!("{label} element testing failed: {e}"),
                );
                return;
            }
        };

        let limit = self.config.frame_input_limit;
        for (i, input) in inputs.iter().take(limit).enumerate() {
            let n = i + 1;
            let kind = match self.driver.attribute(input, "type").await {
                Ok(kind) => kind.unwrap_or_else(|| "text".to_string()),
                Err(e) => {
                    self.emit(
                        CheckStatus::Warn,
                        1,
                        format!("{label} input {n} test failed: {e}"),
                    );
                    continue;
                }
            };
            if kind == "text" || kind == "email" {
                self.emit(
                    CheckStatus::Item,
                    1,
                    format!("Testing {label} input[{kind}] #{n}"),
                );
                self.interact(input, &format!("{label}Test{n}"), &format!("{label} Input {n}"))
                    .await;
            }
        }
    }

    async fn count_controls(&self) -> ProbeResult<(usize, Vec<ElementHandle>)> {
        let inputs = self.driver.find_elements(&Selector::tag("input")).await?;
        let selects = self.driver.find_elements(&Selector::tag("select")).await?;
        let textareas = self.driver.find_elements(&Selector::tag("textarea")).await?;
        Ok((inputs.len() + selects.len() + textareas.len(), inputs))
    }

    /// Look for shadow roots inside each iframe
    pub async fn probe_nested(&mut self) {
        self.emit(
            CheckStatus::Heading,
            0,
            "Testing Nested Scenarios (iFrame + Shadow DOM):",
        );

        let frames = match self.iframes().await {
            Ok(frames) => frames,
            Err(e) => {
                self.check(false, 0, format!("Nested scenarios test failed: {e}"));
                return;
            }
        };

        for frame in &frames {
            let found = self
                .within_frame(frame, |probe| Box::pin(probe.frame_has_shadow_root()))
                .await;
            match found {
                Ok(true) => self.check(true, 0, "Found nested Shadow DOM inside iframe!"),
                Ok(false) => self.emit(CheckStatus::Info, 0, "No Shadow DOM found inside this iframe"),
                Err(e) => {
                    warn!(frame = %frame.id, error = %e, "nested scan failed");
                    self.emit(CheckStatus::Warn, 0, format!("Nested scenario test error: {e}"));
                }
            }
        }
    }

    /// Whether any of the first elements of the focused document hosts a
    /// shadow root
    async fn frame_has_shadow_root(&mut self) -> ProbeResult<bool> {
        let elements = self.driver.find_elements(&Selector::xpath("//*")).await?;
        for element in elements.iter().take(self.config.nested_scan_limit) {
            let attached = self
                .driver
                .execute_script(&DomScript::HasShadowRoot, Some(element))
                .await?;
            if is_truthy(&attached) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
