//! Duplicate detection against items already on the report.
//!
//! The existing items arrive as rendered UI text, so amounts and dates
//! are normalized from display form before comparison.

use chrono::NaiveDate;
use regex::Regex;
use tracing::info;

use crate::record::{to_cents, ExpenseRecord, RecordStatus};

/// One expense item scraped from the open report, still in display
/// form.
#[derive(Debug, Clone)]
pub struct ExistingItem {
    pub merchant: String,
    pub amount_text: String,
    pub date_text: String,
}

/// Parse a UI-rendered amount like "$1,234.56". Thousands separators
/// and any currency marker are stripped; what remains must read as a
/// decimal number.
pub fn parse_ui_amount(text: &str) -> Option<i64> {
    // Non-breaking spaces show up in some rendered amounts.
    let cleaned = text.replace(['\u{a0}', ','], " ").replace(' ', "");
    let re = match Regex::new(r"-?\d+(?:\.\d+)?") {
        Ok(re) => re,
        Err(_) => return None,
    };
    let number = re.find(&cleaned)?.as_str();
    number.parse::<f64>().ok().map(to_cents)
}

/// Parse a UI-rendered date. The target application renders
/// "dd-Mon-yyyy"; two-digit years and ISO dates are accepted too.
pub fn parse_ui_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    for format in ["%d-%b-%Y", "%d-%b-%y", "%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date);
        }
    }
    None
}

/// Mark records already present on the report as skipped duplicates.
///
/// A record matches an existing item when the amounts agree within the
/// tolerance, the dates are equal, and either merchant name contains
/// the other case-insensitively. An existing item whose amount or date
/// text does not parse never matches anything.
pub fn mark_duplicates(
    records: &mut [ExpenseRecord],
    existing: &[ExistingItem],
    tolerance_cents: i64,
) {
    for record in records.iter_mut() {
        if record.status != RecordStatus::Pending {
            continue;
        }
        let Some(date) = record.date else { continue };
        let record_cents = record.amount_cents();
        let record_merchant = record.merchant.to_lowercase();

        let hit = existing.iter().find(|item| {
            let Some(item_cents) = parse_ui_amount(&item.amount_text) else {
                return false;
            };
            let Some(item_date) = parse_ui_date(&item.date_text) else {
                return false;
            };
            if (item_cents - record_cents).abs() > tolerance_cents || item_date != date {
                return false;
            }
            let item_merchant = item.merchant.to_lowercase();
            !record_merchant.is_empty()
                && (item_merchant.contains(&record_merchant)
                    || record_merchant.contains(&item_merchant))
        });

        if let Some(item) = hit {
            info!(
                file = %record.file_name(),
                merchant = %item.merchant,
                amount = %item.amount_text,
                "receipt already on the report"
            );
            record.mark_skipped_duplicate(format!(
                "Matches existing item '{}' ({}) on {}",
                item.merchant, item.amount_text, item.date_text
            ));
        }
    }
}

#[cfg(test)]
#[path = "dedupe_tests.rs"]
mod tests;
