//! Basic form fields: text inputs and the country dropdown.

use serde_json::Value;
use tracing::{debug, warn};

use super::FormProbe;
use crate::driver::{is_truthy, ElementHandle, ProbeDriver};
use crate::email::email_looks_valid;
use crate::fallback::with_fallback;
use crate::locator::{self, LocatorChain, Selector};
use crate::report::{CheckStatus, FieldProbeResult, ProbeObserver};
use crate::result::{ProbeError, ProbeResult};
use crate::script::DomScript;
use crate::wait::{settle, wait_for};

/// Where the first name input may be
#[must_use]
pub fn first_name_locators() -> LocatorChain {
    LocatorChain::new()
        .or(Selector::name("fname"))
        .or(Selector::id("fname"))
        .or(Selector::xpath(
            "//input[@placeholder='First Name' or @name='fname']",
        ))
        .or(Selector::css(
            "input[name='fname'], input[placeholder*='First']",
        ))
}

/// Where the email input may be
#[must_use]
pub fn email_locators() -> LocatorChain {
    LocatorChain::new()
        .or(Selector::name("email"))
        .or(Selector::name("emailid"))
        .or(Selector::xpath(
            "//input[@type='email' or contains(@placeholder, 'Email')]",
        ))
        .or(Selector::css("input[type='email'], input[name*='email']"))
}

/// Where the country dropdown may be
#[must_use]
pub fn country_locators() -> LocatorChain {
    LocatorChain::new()
        .or(Selector::name("country"))
        .or(Selector::id("country"))
        .or(Selector::xpath("//select[contains(@name, 'country')]"))
        .or(Selector::css(
            "select[name*='country'], select[id*='country']",
        ))
}

pub(super) async fn script_on<D: ProbeDriver + ?Sized>(
    driver: &D,
    script: DomScript,
    target: &ElementHandle,
) -> ProbeResult<Value> {
    driver.execute_script(&script, Some(target)).await
}

impl<D: ProbeDriver, O: ProbeObserver> FormProbe<D, O> {
    /// Fill and verify the first name input
    pub async fn check_first_name(&mut self) {
        let value = self.config.first_name.clone();
        self.check_text_field("First Name", &first_name_locators(), &value)
            .await;
    }

    /// Fill and verify the email input
    pub async fn check_email(&mut self) {
        let value = self.config.email.clone();
        self.check_text_field("Email", &email_locators(), &value)
            .await;
    }

    /// Select and verify the country option
    pub async fn check_country(&mut self) {
        self.emit(CheckStatus::Heading, 0, "Testing Country Dropdown:");
        let text = self.config.country.clone();
        match self.find_with_fallback(&country_locators()).await {
            Some(element) => {
                self.select_dropdown_option(&element, &text, "Country")
                    .await;
            }
            None => {
                self.check(false, 0, "Country dropdown not found");
                self.summary
                    .push_field(FieldProbeResult::failed("Country", text));
            }
        }
    }

    async fn check_text_field(&mut self, field: &str, chain: &LocatorChain, value: &str) {
        self.emit(CheckStatus::Heading, 0, format!("Testing {field} Field:"));
        match self.find_with_fallback(chain).await {
            Some(element) => {
                self.interact(&element, value, field).await;
            }
            None => {
                self.check(false, 0, format!("{field} field not found"));
                self.summary
                    .push_field(FieldProbeResult::failed(field, value));
            }
        }
    }

    /// First visible element from `chain`, reporting which selector won
    pub async fn find_with_fallback(&mut self, chain: &LocatorChain) -> Option<ElementHandle> {
        let Some(located) =
            locator::find_with_fallback(&self.driver, chain, &self.config.locator_wait()).await
        else {
            let err = ProbeError::ElementNotFound {
                attempts: chain.len(),
            };
            warn!(error = %err, "field not located");
            return None;
        };
        self.emit(
            CheckStatus::Pass,
            1,
            format!("Element found using: {}", located.selector),
        );
        Some(located.element)
    }

    /// Write `value` into a text control and read it back.
    ///
    /// Click, clear and typing each fall back to a script when the native
    /// action fails. Any failure ends as a failed result, never an error.
    pub async fn interact(
        &mut self,
        element: &ElementHandle,
        value: &str,
        field: &str,
    ) -> FieldProbeResult {
        let result = match self.write_and_read(element, value).await {
            Ok((actual, scripted)) => {
                FieldProbeResult::new(field, value, actual).with_scripted_steps(scripted)
            }
            Err(e) => {
                warn!(field, error = %e, "field interaction failed");
                self.check(false, 1, format!("{field} field interaction failed: {e}"));
                let result = FieldProbeResult::failed(field, value);
                self.summary.push_field(result.clone());
                return result;
            }
        };

        let passed = result.passed;
        let email = field.contains("Email").then(|| result.actual.clone()).flatten();
        self.record_field(result.clone(), 1, &format!("{field} field"));

        if let Some(address) = email.filter(|_| passed) {
            if email_looks_valid(&address) {
                self.emit(CheckStatus::Pass, 1, "Email format validation PASSED");
            } else {
                self.emit(CheckStatus::Warn, 1, "Email format validation FAILED");
            }
        }
        result
    }

    async fn write_and_read(
        &self,
        element: &ElementHandle,
        value: &str,
    ) -> ProbeResult<(Option<String>, Vec<String>)> {
        let driver = &self.driver;
        let delays = self.config.settle;

        script_on(driver, DomScript::ScrollIntoView, element).await?;
        settle(delays.scroll_ms).await;

        wait_for(
            &self.config.clickable_wait(),
            "clickable element",
            move || async move { Ok::<_, ProbeError>(driver.is_clickable(element).await?.then_some(())) },
        )
        .await?;

        let click = with_fallback("click", driver.click(element), async {
            script_on(driver, DomScript::Click, element).await.map(drop)
        })
        .await?;
        settle(delays.click_ms).await;

        let clear = with_fallback("clear", driver.clear(element), async {
            script_on(driver, DomScript::ClearValue, element)
                .await
                .map(drop)
        })
        .await?;
        settle(delays.click_ms).await;

        let typed = with_fallback("type", driver.send_keys(element, value), async {
            script_on(driver, DomScript::SetValue(value.to_string()), element)
                .await
                .map(drop)
        })
        .await?;
        settle(delays.type_ms).await;

        let actual = with_fallback("read", driver.attribute(element, "value"), async {
            script_on(driver, DomScript::ReadValue, element)
                .await
                .map(|v| v.as_str().map(str::to_string))
        })
        .await?
        .into_inner();

        let scripted: Vec<String> = [
            ("click", click.is_scripted()),
            ("clear", clear.is_scripted()),
            ("type", typed.is_scripted()),
        ]
        .into_iter()
        .filter(|(_, scripted)| *scripted)
        .map(|(step, _)| step.to_string())
        .collect();
        if !scripted.is_empty() {
            debug!(element = %element.id, ?scripted, "steps completed by script");
        }
        Ok((actual, scripted))
    }

    /// Pick the option whose visible text is `text` and verify the selection
    pub async fn select_dropdown_option(
        &mut self,
        element: &ElementHandle,
        text: &str,
        field: &str,
    ) -> FieldProbeResult {
        let outcome = if element.is_tag("select") {
            self.select_and_read(element, text).await
        } else {
            Err(ProbeError::NotASelect {
                tag: element.tag_name.clone(),
            })
        };

        match outcome {
            Ok(selected) => {
                let result = FieldProbeResult::new(field, text, selected);
                self.record_field(result.clone(), 0, &format!("{field} dropdown"));
                result
            }
            Err(e) => {
                warn!(field, error = %e, "dropdown check failed");
                self.check(false, 0, format!("{field} dropdown test failed: {e}"));
                let result = FieldProbeResult::failed(field, text);
                self.summary.push_field(result.clone());
                result
            }
        }
    }

    async fn select_and_read(&self, element: &ElementHandle, text: &str) -> ProbeResult<Option<String>> {
        let chosen = script_on(
            &self.driver,
            DomScript::SelectByText(text.to_string()),
            element,
        )
        .await?;
        if !is_truthy(&chosen) {
            return Err(ProbeError::OptionNotFound {
                text: text.to_string(),
            });
        }
        settle(self.config.settle.select_ms).await;

        let shown = script_on(&self.driver, DomScript::SelectedText, element).await?;
        Ok(shown.as_str().map(str::to_string))
    }
}
