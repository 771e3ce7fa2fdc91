//! Shadow DOM probing. Shadow content is only reachable through scripts.

use tracing::{debug, warn};

use super::fields::script_on;
use super::FormProbe;
use crate::driver::{is_truthy, ElementHandle, ProbeDriver};
use crate::locator::Selector;
use crate::report::{CheckStatus, FieldProbeResult, ProbeObserver};
use crate::result::ProbeResult;
use crate::script::DomScript;
use crate::wait::settle;

/// Attribute-based guess at which elements host a shadow root
pub const SHADOW_HOST_HEURISTIC: &str =
    "//*[@shadow-root or contains(@class, 'shadow') or contains(@id, 'shadow')]";

impl<D: ProbeDriver, O: ProbeObserver> FormProbe<D, O> {
    /// Check likely shadow hosts and fill the text inputs inside them.
    ///
    /// When the heuristic matches nothing, the whole document is scanned
    /// for attached shadow roots instead.
    pub async fn probe_shadow_hosts(&mut self) {
        self.emit(CheckStatus::Heading, 0, "Testing Shadow DOM Elements:");

        let hosts = match self
            .driver
            .find_elements(&Selector::xpath(SHADOW_HOST_HEURISTIC))
            .await
        {
            Ok(hosts) => hosts,
            Err(e) => {
                self.check(false, 0, format!("Shadow DOM test failed: {e}"));
                return;
            }
        };
        self.emit(
            CheckStatus::Plain,
            0,
            format!("Found {} potential shadow DOM host(s)", hosts.len()),
        );

        for host in &hosts {
            self.emit(
                CheckStatus::Detail,
                0,
                format!("Checking element: {} for Shadow DOM", host.tag_name),
            );
            if let Err(e) = self.probe_shadow_host(host).await {
                warn!(host = %host.id, error = %e, "shadow host check failed");
                self.emit(CheckStatus::Warn, 1, format!("Shadow DOM check failed: {e}"));
            }
        }

        if hosts.is_empty() {
            self.emit(CheckStatus::Info, 0, "No potential Shadow DOM hosts found");
            self.scan_shadow_hosts().await;
        }
    }

    async fn probe_shadow_host(&mut self, host: &ElementHandle) -> ProbeResult<()> {
        let attached = script_on(&self.driver, DomScript::HasShadowRoot, host).await?;
        if !is_truthy(&attached) {
            self.emit(CheckStatus::Info, 1, "No Shadow DOM attached to this element");
            return Ok(());
        }
        self.emit(
            CheckStatus::Pass,
            0,
            "Shadow DOM found! Attempting to interact with shadow elements",
        );

        let controls = self
            .driver
            .execute_script_elements(&DomScript::ShadowInteractives, Some(host))
            .await?;
        if controls.is_empty() {
            self.emit(CheckStatus::Info, 1, "No interactive elements found in Shadow DOM");
            return Ok(());
        }
        self.emit(
            CheckStatus::Plain,
            0,
            format!("Found {} input element(s) in Shadow DOM", controls.len()),
        );

        let limit = self.config.shadow_element_limit;
        for (i, control) in controls.iter().take(limit).enumerate() {
            let n = i + 1;
            let kind = match self.driver.attribute(control, "type").await {
                Ok(kind) => kind.unwrap_or_else(|| "unknown".to_string()),
                Err(e) => {
                    self.emit(
                        CheckStatus::Warn,
                        1,
                        format!("Shadow element {n} interaction failed: {e}"),
                    );
                    continue;
                }
            };
            self.emit(
                CheckStatus::Item,
                1,
                format!("Testing Shadow DOM {}[{kind}]", control.tag_name),
            );
            if control.is_tag("input") && kind.eq_ignore_ascii_case("text") {
                self.interact_shadow_control(control, n).await;
            }
        }
        Ok(())
    }

    /// Set a value through script, then read it back through script
    async fn interact_shadow_control(&mut self, control: &ElementHandle, n: usize) {
        let field = format!("Shadow DOM element {n}");
        let value = format!("ShadowTest{n}");
        match self.write_shadow_value(control, &value).await {
            Ok(actual) => {
                let result = FieldProbeResult::new(field, value, actual);
                self.record_field(result, 2, "Shadow DOM element");
            }
            Err(e) => {
                warn!(element = %control.id, error = %e, "shadow element interaction failed");
                self.check(
                    false,
                    2,
                    format!("Shadow DOM element interaction failed: {e}"),
                );
                self.summary
                    .push_field(FieldProbeResult::failed(field, value));
            }
        }
    }

    async fn write_shadow_value(
        &self,
        control: &ElementHandle,
        value: &str,
    ) -> ProbeResult<Option<String>> {
        script_on(&self.driver, DomScript::SetValue(value.to_string()), control).await?;
        settle(self.config.settle.shadow_write_ms).await;
        let read = script_on(&self.driver, DomScript::ReadValue, control).await?;
        Ok(read.as_str().map(str::to_string))
    }

    /// Walk every element of the focused document for attached shadow roots
    pub async fn scan_shadow_hosts(&mut self) {
        self.emit(
            CheckStatus::Scan,
            0,
            "Scanning page for Shadow DOM using JavaScript...",
        );
        match self
            .driver
            .execute_script_elements(&DomScript::ScanShadowHosts, None)
            .await
        {
            Ok(hosts) if !hosts.is_empty() => {
                debug!(count = hosts.len(), "shadow hosts found by scan");
                self.check(
                    true,
                    0,
                    format!("Found {} Shadow DOM host(s) via JavaScript scan", hosts.len()),
                );
            }
            Ok(_) => self.emit(CheckStatus::Info, 0, "No Shadow DOM elements found on this page"),
            Err(e) => {
                warn!(error = %e, "shadow scan failed");
                self.emit(
                    CheckStatus::Warn,
                    0,
                    format!("JavaScript Shadow DOM scan failed: {e}"),
                );
            }
        }
    }
}
