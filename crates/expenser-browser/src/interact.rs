//! Keyboard-first interaction primitives.
//!
//! The expense application's widgets ignore synthetic clicks on their
//! buttons: activation only registers on a focused control receiving a
//! held Space, confirmed with Enter. The primitives here encode that
//! ritual once, behind small capability traits so the sequencing logic
//! is testable without a browser.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};

use crate::cdp::{CdpError, PageSession};

/// Maximum focus steps away from the anchor before giving up.
pub const MAX_TAB_WALK: usize = 20;
/// How long Space stays down during an activation.
pub const SPACE_HOLD: Duration = Duration::from_millis(200);
/// Total activation attempts: the first try plus two retries.
pub const ACTIVATION_ATTEMPTS: usize = 3;

#[derive(Debug, Error)]
pub enum InteractError {
    /// The labeled control never came under focus.
    #[error("Control '{label}' not found within {MAX_TAB_WALK} focus steps")]
    ControlNotFound { label: String },

    /// The control was focused and activated but the page never showed
    /// the expected effect.
    #[error("Activating '{label}' had no effect after {ACTIVATION_ATTEMPTS} attempts")]
    ActivationFailed { label: String },

    #[error("No option matching '{label}' in dropdown '{field}'")]
    SelectionFailed { field: String, label: String },

    #[error("Timed out waiting for {what}")]
    Timeout { what: String },

    #[error("Page error: {0}")]
    Page(String),
}

impl From<CdpError> for InteractError {
    fn from(e: CdpError) -> Self {
        InteractError::Page(e.to_string())
    }
}

/// Focus movement and activation on a page.
#[async_trait]
pub trait FocusDriver {
    /// Put focus on the element whose visible text matches `anchor`.
    async fn focus_anchor(&self, anchor: &str) -> Result<(), InteractError>;

    /// Move focus one step forward.
    async fn tab_forward(&self) -> Result<(), InteractError>;

    /// Accessible label of the currently focused element.
    async fn focused_label(&self) -> Result<String, InteractError>;

    /// Activate the focused control: Space held down, then Enter.
    async fn activate_focused(&self, hold: Duration) -> Result<(), InteractError>;
}

/// Option selection on a dropdown field.
#[async_trait]
pub trait DropdownDriver {
    async fn option_labels(&self, field: &str) -> Result<Vec<String>, InteractError>;
    async fn select_label(&self, field: &str, label: &str) -> Result<bool, InteractError>;
    async fn select_value(&self, field: &str, value: &str) -> Result<bool, InteractError>;
    async fn select_index(&self, field: &str, index: usize) -> Result<bool, InteractError>;

    /// Label and value of the option the control actually committed.
    async fn committed_option(&self, field: &str)
        -> Result<Option<(String, String)>, InteractError>;
}

/// Walk focus from the anchor to the control with the given label,
/// activate it, and verify the page reacted. The anchor itself counts
/// as a walk position, so a control can anchor on its own label. A
/// walk that exhausts the tab budget fails right away; only the
/// activation is retried, because its verification races the page
/// settling.
pub async fn activate_by_label<D, V, Fut>(
    driver: &D,
    anchor: &str,
    label: &str,
    verify: V,
) -> Result<(), InteractError>
where
    D: FocusDriver + ?Sized + Sync,
    V: Fn() -> Fut,
    Fut: Future<Output = Result<bool, InteractError>>,
{
    let wanted = label.to_lowercase();

    for attempt in 1..=ACTIVATION_ATTEMPTS {
        driver.focus_anchor(anchor).await?;

        let mut focused = driver.focused_label().await?.to_lowercase().contains(&wanted);
        if !focused {
            for _ in 0..MAX_TAB_WALK {
                driver.tab_forward().await?;
                let current = driver.focused_label().await?;
                if current.to_lowercase().contains(&wanted) {
                    focused = true;
                    break;
                }
            }
        }

        if !focused {
            warn!(label = %label, attempt, "control not reached by tab walk");
            return Err(InteractError::ControlNotFound {
                label: label.to_string(),
            });
        }

        driver.activate_focused(SPACE_HOLD).await?;
        if verify().await? {
            debug!(label = %label, attempt, "control activated");
            return Ok(());
        }
        warn!(label = %label, attempt, "activation had no visible effect");
    }

    Err(InteractError::ActivationFailed {
        label: label.to_string(),
    })
}

/// Select a dropdown option, degrading from exact label to underlying
/// value to a positional match on partial label text. After each step
/// the committed option is read back; a step that reports success but
/// committed a different option counts as a miss.
pub async fn select_dropdown_by_label<D>(
    driver: &D,
    field: &str,
    label: &str,
) -> Result<(), InteractError>
where
    D: DropdownDriver + ?Sized + Sync,
{
    if driver.select_label(field, label).await? && committed_label_is(driver, field, label).await?
    {
        return Ok(());
    }
    if driver.select_value(field, label).await? && committed_value_is(driver, field, label).await?
    {
        debug!(field = %field, label = %label, "selected by value");
        return Ok(());
    }

    let wanted = label.to_lowercase();
    let labels = driver.option_labels(field).await?;
    if let Some(index) = labels
        .iter()
        .position(|l| l.to_lowercase().contains(&wanted))
    {
        if driver.select_index(field, index).await?
            && committed_label_is(driver, field, &labels[index]).await?
        {
            debug!(field = %field, label = %label, index, "selected by partial match");
            return Ok(());
        }
    }

    Err(InteractError::SelectionFailed {
        field: field.to_string(),
        label: label.to_string(),
    })
}

async fn committed_label_is<D>(
    driver: &D,
    field: &str,
    label: &str,
) -> Result<bool, InteractError>
where
    D: DropdownDriver + ?Sized + Sync,
{
    Ok(driver
        .committed_option(field)
        .await?
        .is_some_and(|(committed, _)| committed == label))
}

async fn committed_value_is<D>(
    driver: &D,
    field: &str,
    value: &str,
) -> Result<bool, InteractError>
where
    D: DropdownDriver + ?Sized + Sync,
{
    Ok(driver
        .committed_option(field)
        .await?
        .is_some_and(|(_, committed)| committed == value))
}

/// Poll until the probe yields a value.
pub async fn wait_for<T, F, Fut>(
    what: &str,
    timeout: Duration,
    interval: Duration,
    mut probe: F,
) -> Result<T, InteractError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, InteractError>>,
{
    let start = std::time::Instant::now();
    loop {
        if let Some(value) = probe().await? {
            return Ok(value);
        }
        if start.elapsed() > timeout {
            return Err(InteractError::Timeout {
                what: what.to_string(),
            });
        }
        tokio::time::sleep(interval).await;
    }
}

#[async_trait]
impl FocusDriver for PageSession {
    async fn focus_anchor(&self, anchor: &str) -> Result<(), InteractError> {
        let text = json!(anchor);
        let script = format!(
            r#"(() => {{
                const wanted = {text}.trim().toLowerCase();
                const els = document.querySelectorAll('a, button, span, div, td, label, h1, h2, h3');
                for (const el of els) {{
                    const own = (el.childElementCount === 0 ? el.textContent : el.innerText) || '';
                    if (own.trim().toLowerCase() === wanted) {{
                        if (el.tabIndex < 0) el.tabIndex = -1;
                        el.focus();
                        return true;
                    }}
                }}
                return false;
            }})()"#
        );
        let found = self.evaluate(&script).await?;
        if found.as_bool() != Some(true) {
            return Err(InteractError::ControlNotFound {
                label: anchor.to_string(),
            });
        }
        Ok(())
    }

    async fn tab_forward(&self) -> Result<(), InteractError> {
        self.press_key("Tab").await?;
        Ok(())
    }

    async fn focused_label(&self) -> Result<String, InteractError> {
        let script = r#"(() => {
            const el = document.activeElement;
            if (!el) return '';
            return (el.innerText || el.value || el.getAttribute('aria-label')
                || el.title || '').trim();
        })()"#;
        let label = self.evaluate(script).await?;
        Ok(label.as_str().unwrap_or("").to_string())
    }

    async fn activate_focused(&self, hold: Duration) -> Result<(), InteractError> {
        self.hold_key(" ", hold).await?;
        self.press_key("Enter").await?;
        Ok(())
    }
}

#[async_trait]
impl DropdownDriver for PageSession {
    async fn option_labels(&self, field: &str) -> Result<Vec<String>, InteractError> {
        let selector = json!(field);
        let script = format!(
            r#"(() => {{
                const el = document.querySelector({selector});
                if (!el || !el.options) return [];
                return Array.from(el.options).map(o => o.label || o.text || '');
            }})()"#
        );
        let labels = self.evaluate(&script).await?;
        Ok(serde_json::from_value(labels).unwrap_or_default())
    }

    async fn select_label(&self, field: &str, label: &str) -> Result<bool, InteractError> {
        self.select_where(field, &format!("o.label === {} || o.text === {0}", json!(label)))
            .await
    }

    async fn select_value(&self, field: &str, value: &str) -> Result<bool, InteractError> {
        self.select_where(field, &format!("o.value === {}", json!(value)))
            .await
    }

    async fn select_index(&self, field: &str, index: usize) -> Result<bool, InteractError> {
        self.select_where(field, &format!("o.index === {index}")).await
    }

    async fn committed_option(
        &self,
        field: &str,
    ) -> Result<Option<(String, String)>, InteractError> {
        let selector = json!(field);
        let script = format!(
            r#"(() => {{
                const el = document.querySelector({selector});
                if (!el || !el.options || el.selectedIndex < 0) return null;
                const o = el.options[el.selectedIndex];
                return [o.label || o.text || '', o.value || ''];
            }})()"#
        );
        let committed = self.evaluate(&script).await?;
        Ok(serde_json::from_value(committed).unwrap_or_default())
    }
}

impl PageSession {
    /// Select the first option matching a predicate and fire the
    /// change event the application listens on.
    async fn select_where(&self, field: &str, predicate: &str) -> Result<bool, InteractError> {
        let selector = json!(field);
        let script = format!(
            r#"(() => {{
                const el = document.querySelector({selector});
                if (!el || !el.options) return false;
                const hit = Array.from(el.options).find(o => {predicate});
                if (!hit) return false;
                el.selectedIndex = hit.index;
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()"#
        );
        let selected = self.evaluate(&script).await?;
        Ok(selected.as_bool() == Some(true))
    }
}

#[cfg(test)]
#[path = "interact_tests.rs"]
mod tests;
