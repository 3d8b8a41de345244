//! Per-category form-filling strategies.
//!
//! A strategy turns a record into a flat list of field actions; the
//! orchestrator replays those against the open item form. Keeping the
//! planning pure means every category's field mapping is testable
//! without a page.

mod airfare;
mod generic;
mod hotel;
mod meal;

use std::path::PathBuf;

use chrono::NaiveDate;

use expenser_config::{Config, ExpenseCategory, Selectors};
use expenser_core::ExpenseRecord;

pub use airfare::AirfareStrategy;
pub use generic::GenericStrategy;
pub use hotel::HotelStrategy;
pub use meal::MealStrategy;

/// Date format the application's date inputs accept.
pub const UI_DATE_FORMAT: &str = "%d-%b-%Y";

/// One step of a form fill.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldAction {
    /// Choose a dropdown option by visible label.
    Select { field: String, label: String },
    /// Clear a text input and type a value.
    Fill { field: String, value: String },
    /// Click an element, for row-add buttons.
    Click { selector: String },
    /// Attach a local file to a file input.
    AttachFile { field: String, path: PathBuf },
}

/// Field mapping for one expense category. The set is closed; it
/// mirrors the application's own form variants.
pub trait FieldStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn plan(&self, record: &ExpenseRecord, config: &Config) -> Vec<FieldAction>;
}

static GENERIC: GenericStrategy = GenericStrategy;
static MEAL: MealStrategy = MealStrategy;
static AIRFARE: AirfareStrategy = AirfareStrategy;
static HOTEL: HotelStrategy = HotelStrategy;

pub fn strategy_for(category: ExpenseCategory) -> &'static dyn FieldStrategy {
    match category {
        ExpenseCategory::Generic => &GENERIC,
        ExpenseCategory::Meal => &MEAL,
        ExpenseCategory::Airfare => &AIRFARE,
        ExpenseCategory::Hotel => &HOTEL,
    }
}

/// The fields every category shares, ending with the receipt
/// attachment.
pub(crate) fn base_plan(record: &ExpenseRecord, selectors: &Selectors) -> Vec<FieldAction> {
    let mut plan = vec![FieldAction::Select {
        field: selectors.expense_type_dropdown.clone(),
        label: record.expense_type.clone(),
    }];
    if let Some(date) = record.date {
        plan.push(FieldAction::Fill {
            field: selectors.date_field.clone(),
            value: format_ui_date(date),
        });
    }
    plan.push(FieldAction::Fill {
        field: selectors.amount_field.clone(),
        value: format_amount(record.total_amount),
    });
    plan.push(FieldAction::Fill {
        field: selectors.merchant_field.clone(),
        value: record.merchant.clone(),
    });
    plan.push(FieldAction::Fill {
        field: selectors.description_field.clone(),
        value: record.description.clone(),
    });
    plan.push(FieldAction::AttachFile {
        field: selectors.attachment_input.clone(),
        path: record.source_file.clone(),
    });
    plan
}

pub(crate) fn format_ui_date(date: NaiveDate) -> String {
    date.format(UI_DATE_FORMAT).to_string()
}

pub(crate) fn format_amount(amount: f64) -> String {
    format!("{amount:.2}")
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
