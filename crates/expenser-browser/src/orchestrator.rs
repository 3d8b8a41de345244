//! Report entry state machine.
//!
//! Start -> SessionReady -> ReportSelected -> ItemLoop -> SaveAndClose
//! -> Done. Bootstrap and report selection failures are fatal and the
//! browser is intentionally left open so the operator can see where it
//! stopped. Inside the item loop a failure only skips that record.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde_json::json;
use tracing::{debug, info, warn};

use expenser_config::Config;
use expenser_core::{mark_duplicates, ExistingItem, ExpenseRecord, RecordStatus, RunContext};

use crate::cdp::{CdpClient, PageSession};
use crate::error::BrowserError;
use crate::interact::{activate_by_label, select_dropdown_by_label, wait_for, InteractError};
use crate::strategy::{strategy_for, FieldAction};

const LOGIN_POLL: Duration = Duration::from_secs(2);
const FORM_TIMEOUT: Duration = Duration::from_secs(10);
const FIELD_TIMEOUT: Duration = Duration::from_secs(5);
const DIALOG_WATCH: Duration = Duration::from_secs(3);

/// Where the run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Start,
    SessionReady,
    ReportSelected,
    ItemLoop,
    SaveAndClose,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Start => "start",
            Phase::SessionReady => "session-ready",
            Phase::ReportSelected => "report-selected",
            Phase::ItemLoop => "item-loop",
            Phase::SaveAndClose => "save-and-close",
            Phase::Done => "done",
        };
        f.write_str(name)
    }
}

pub struct Orchestrator {
    page: PageSession,
    config: Config,
    // Owns the connection for the lifetime of the run.
    _client: CdpClient,
}

impl Orchestrator {
    /// Connect to the running browser and land on the application tab,
    /// reusing one when it is already open.
    pub async fn connect(config: &Config) -> Result<Self, BrowserError> {
        let client = CdpClient::connect(&config.browser.cdp_endpoint)
            .await
            .map_err(|e| BrowserError::Bootstrap(e.to_string()))?;

        let pages = client
            .list_pages()
            .await
            .map_err(|e| BrowserError::Bootstrap(e.to_string()))?;
        let existing = pages
            .iter()
            .find(|p| p.page_type == "page" && p.url.starts_with(&config.browser.app_url));

        let page = match existing {
            Some(info) => {
                info!(url = %info.url, "reusing open application tab");
                client.attach_page(&info.id).await
            }
            None => {
                info!(url = %config.browser.app_url, "opening application tab");
                client.new_page(&config.browser.app_url).await
            }
        }
        .map_err(|e| BrowserError::Bootstrap(e.to_string()))?;

        Ok(Self {
            page,
            config: config.clone(),
            _client: client,
        })
    }

    /// Run the whole state machine over the resolved records.
    pub async fn run(&self, ctx: &mut RunContext) -> Result<(), BrowserError> {
        let mut phase = Phase::Start;
        info!(phase = %phase, "entering state machine");

        self.wait_for_login().await?;
        phase = Phase::SessionReady;
        info!(phase = %phase, "operator is logged in");

        let report_open = self.select_report(ctx).await?;
        phase = Phase::ReportSelected;
        info!(phase = %phase, report_open, "report phase complete");

        if report_open {
            let existing = self.scrape_existing_items().await?;
            info!(count = existing.len(), "existing items on report");
            mark_duplicates(
                &mut ctx.records,
                &existing,
                self.config.dedupe.amount_tolerance_cents,
            );
        }

        if ctx.test_mode {
            self.log_test_plan(ctx);
            info!(phase = %Phase::Done, "test mode stops before any entry");
            return Ok(());
        }

        phase = Phase::ItemLoop;
        info!(phase = %phase, "entering item loop");
        let entered = self.item_loop(ctx).await?;

        if entered > 0 {
            phase = Phase::SaveAndClose;
            info!(phase = %phase, "saving the report");
            self.save_and_close().await?;
        } else {
            info!("nothing to enter, leaving the report untouched");
        }

        info!(phase = %Phase::Done, "state machine complete");
        Ok(())
    }

    /// Block until the application shell is visible. The operator may
    /// need to complete SSO by hand, so there is no upper bound here.
    async fn wait_for_login(&self) -> Result<(), BrowserError> {
        let mut sso_clicked = false;
        let mut polls: u32 = 0;
        loop {
            for selector in &self.config.browser.login_indicators {
                if self.page.query_selector(selector).await?.is_some() {
                    return Ok(());
                }
            }

            if !sso_clicked {
                if let Some(sso) = &self.config.browser.sso_button {
                    if self.page.query_selector(sso).await?.is_some() {
                        info!("clicking the SSO sign-in button");
                        self.page.click_selector(sso).await?;
                        sso_clicked = true;
                    }
                }
            }

            polls += 1;
            if polls % 8 == 0 {
                info!("waiting for login, finish signing in in the browser");
            }
            tokio::time::sleep(LOGIN_POLL).await;
        }
    }

    /// Open the in-progress report, or create one. Returns whether an
    /// existing report (with possible duplicates) is open. In test
    /// mode a missing report is only announced, never created.
    async fn select_report(&self, ctx: &RunContext) -> Result<bool, BrowserError> {
        let status = &self.config.report.in_progress_status;
        let found = self.click_report_with_status(status).await?;
        if found {
            info!(status = %status, "reusing in-progress report");
            self.page
                .wait_for_load()
                .await
                .map_err(|e| BrowserError::Report(e.to_string()))?;
            return Ok(true);
        }

        if ctx.test_mode {
            info!(purpose = %ctx.report_purpose(), "test mode: would create report");
            return Ok(false);
        }

        let purpose = ctx.report_purpose();
        info!(purpose = %purpose, "creating a new report");
        self.page
            .click_selector(&self.config.selectors.create_report)
            .await
            .map_err(|e| BrowserError::Report(format!("create control: {e}")))?;
        self.page
            .wait_for_selector(&self.config.selectors.purpose_field, FORM_TIMEOUT)
            .await
            .map_err(|e| BrowserError::Report(format!("purpose field: {e}")))?;
        self.fill_field(&self.config.selectors.purpose_field, &purpose)
            .await
            .map_err(|e| BrowserError::Report(format!("purpose: {e}")))?;
        Ok(false)
    }

    /// Click the report card whose status text matches.
    async fn click_report_with_status(&self, status: &str) -> Result<bool, BrowserError> {
        let selector = json!(self.config.selectors.report_status.as_str());
        let wanted = json!(status);
        let script = format!(
            r#"(() => {{
                const spans = document.querySelectorAll({selector});
                for (const span of spans) {{
                    if (span.textContent.trim() === {wanted}) {{
                        span.closest('a, div, td, tr').click();
                        return true;
                    }}
                }}
                return false;
            }})()"#
        );
        let clicked = self.page.evaluate(&script).await?;
        Ok(clicked.as_bool() == Some(true))
    }

    /// Read the items already on the open report, as rendered.
    async fn scrape_existing_items(&self) -> Result<Vec<ExistingItem>, BrowserError> {
        let sel = &self.config.selectors;
        let cards = json!(sel.existing_item_cards.as_str());
        let merchant = json!(sel.existing_item_merchant.as_str());
        let amount = json!(sel.existing_item_amount.as_str());
        let date = json!(sel.existing_item_date.as_str());
        let script = format!(
            r#"(() => {{
                const take = (el, s) => {{
                    const hit = el.querySelector(s);
                    return hit ? hit.textContent.trim() : '';
                }};
                return Array.from(document.querySelectorAll({cards})).map(card => ({{
                    merchant: take(card, {merchant}),
                    amount: take(card, {amount}),
                    date: take(card, {date}),
                }}));
            }})()"#
        );
        let value = self.page.evaluate(&script).await?;
        Ok(parse_existing_items(&value))
    }

    fn log_test_plan(&self, ctx: &RunContext) {
        for record in &ctx.records {
            match record.status {
                RecordStatus::Pending => {
                    let strategy = strategy_for(record.details.category());
                    info!(
                        file = %record.file_name(),
                        expense_type = %record.expense_type,
                        amount = record.total_amount,
                        strategy = strategy.name(),
                        "test mode: would create item"
                    );
                }
                RecordStatus::SkippedDuplicate => {
                    info!(file = %record.file_name(), "test mode: duplicate, would skip");
                }
                _ => {}
            }
        }
    }

    /// Enter every pending record. Returns how many items were filled.
    async fn item_loop(&self, ctx: &mut RunContext) -> Result<usize, BrowserError> {
        let sel = self.config.selectors.clone();
        let mut entered = 0usize;

        for record in ctx
            .records
            .iter_mut()
            .filter(|r| r.status == RecordStatus::Pending)
        {
            // "Create Item" opens the first form and anchors on its
            // own label; a reused report keeps the purpose it was
            // created with, so the heading text is not dependable.
            // "Create Another" commits the previous item and opens a
            // fresh one.
            let (anchor, label) = if entered == 0 {
                (sel.create_item_label.as_str(), sel.create_item_label.as_str())
            } else {
                (sel.item_form_anchor.as_str(), sel.create_another_label.as_str())
            };

            let result = self.enter_item(record, anchor, label).await;
            match result {
                Ok(()) => {
                    record.status = RecordStatus::Created;
                    entered += 1;
                    info!(file = %record.file_name(), "item entered");
                }
                Err(e) => {
                    warn!(file = %record.file_name(), error = %e, "item failed, continuing");
                    record.mark_failed(e.to_string());
                }
            }
        }
        Ok(entered)
    }

    async fn enter_item(
        &self,
        record: &ExpenseRecord,
        anchor: &str,
        label: &str,
    ) -> Result<(), BrowserError> {
        let form_anchor = self.config.selectors.item_form_anchor.clone();
        activate_by_label(&self.page, anchor, label, || {
            let page = &self.page;
            let form_anchor = form_anchor.clone();
            async move { page_has_text(page, &form_anchor).await }
        })
        .await?;

        let strategy = strategy_for(record.details.category());
        debug!(file = %record.file_name(), strategy = strategy.name(), "filling item form");
        for action in strategy.plan(record, &self.config) {
            self.apply_action(&action).await?;
        }
        Ok(())
    }

    async fn apply_action(&self, action: &FieldAction) -> Result<(), BrowserError> {
        match action {
            FieldAction::Select { field, label } => {
                self.page
                    .wait_for_selector(field, FIELD_TIMEOUT)
                    .await
                    .map_err(InteractError::from)?;
                select_dropdown_by_label(&self.page, field, label).await?;
            }
            FieldAction::Fill { field, value } => {
                self.fill_field(field, value).await?;
            }
            FieldAction::Click { selector } => {
                self.page.click_selector(selector).await.map_err(InteractError::from)?;
            }
            FieldAction::AttachFile { field, path } => {
                let absolute = path
                    .canonicalize()
                    .map_err(|e| InteractError::Page(format!("{}: {e}", path.display())))?;
                self.page
                    .wait_for_selector(&self.config.selectors.attachment_dropzone, FIELD_TIMEOUT)
                    .await
                    .map_err(InteractError::from)?;
                self.page
                    .wait_for_selector(field, FIELD_TIMEOUT)
                    .await
                    .map_err(InteractError::from)?;
                self.page
                    .set_file_input(field, &[absolute.to_string_lossy().into_owned()])
                    .await
                    .map_err(InteractError::from)?;
                self.confirm_attachment(&absolute).await?;
            }
        }
        Ok(())
    }

    /// Block until the attachment list names the uploaded file. The
    /// list keeps its drop placeholder until the upload registers, so
    /// the file name is the success signal.
    async fn confirm_attachment(&self, path: &Path) -> Result<(), InteractError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let list = json!(self.config.selectors.attachment_list.as_str());
        let script = format!("(document.querySelector({list})?.innerText || '')");

        wait_for(
            "attachment row",
            FORM_TIMEOUT,
            Duration::from_millis(250),
            || {
                let page = &self.page;
                let script = script.clone();
                let file_name = file_name.clone();
                async move {
                    let text = page.evaluate(&script).await?;
                    Ok(attachment_listed(text.as_str().unwrap_or(""), &file_name).then_some(()))
                }
            },
        )
        .await
    }

    async fn fill_field(&self, field: &str, value: &str) -> Result<(), InteractError> {
        let node_id = self.page.wait_for_selector(field, FIELD_TIMEOUT).await?;
        self.page.focus(node_id).await?;
        self.page.fill_focused(value).await?;
        // Commit the field; the application validates on blur.
        self.page.press_key("Tab").await?;
        Ok(())
    }

    /// Save the report and watch for a rejection dialog.
    async fn save_and_close(&self) -> Result<(), BrowserError> {
        let sel = &self.config.selectors;
        let form_anchor = sel.item_form_anchor.clone();
        activate_by_label(
            &self.page,
            &form_anchor,
            &sel.save_and_close_label,
            || {
                let page = &self.page;
                let form_anchor = form_anchor.clone();
                async move { Ok(!page_has_text(page, &form_anchor).await?) }
            },
        )
        .await?;

        let dialog = sel.error_dialog.clone();
        let watched = wait_for(
            "error dialog",
            DIALOG_WATCH,
            Duration::from_millis(250),
            || {
                let page = &self.page;
                let dialog = dialog.clone();
                async move { Ok(page.query_selector(&dialog).await.map_err(InteractError::from)?.map(|_| ())) }
            },
        )
        .await;

        match watched {
            Ok(()) => {
                let body = self
                    .page
                    .evaluate(&format!(
                        "(document.querySelector({})?.textContent || '').trim()",
                        json!(sel.error_dialog_body.as_str())
                    ))
                    .await?;
                Err(BrowserError::SaveRejected(
                    body.as_str().unwrap_or("unknown error").to_string(),
                ))
            }
            // No dialog within the watch window means the save went through.
            Err(InteractError::Timeout { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// True when the page shows the given text anywhere.
async fn page_has_text(page: &PageSession, text: &str) -> Result<bool, InteractError> {
    let script = format!(
        "document.body && document.body.innerText.includes({})",
        json!(text)
    );
    let value = page.evaluate(&script).await?;
    Ok(value.as_bool() == Some(true))
}

/// True when the rendered attachment list names the uploaded file
/// instead of its drop placeholder.
fn attachment_listed(list_text: &str, file_name: &str) -> bool {
    !file_name.is_empty() && list_text.contains(file_name)
}

fn parse_existing_items(value: &serde_json::Value) -> Vec<ExistingItem> {
    value
        .as_array()
        .map(|cards| {
            cards
                .iter()
                .map(|card| ExistingItem {
                    merchant: card["merchant"].as_str().unwrap_or("").to_string(),
                    amount_text: card["amount"].as_str().unwrap_or("").to_string(),
                    date_text: card["date"].as_str().unwrap_or("").to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}
