//! Expense record data model.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use expenser_config::ExpenseCategory;

/// Convert an amount to minor currency units. All cent-exact
/// arithmetic in this crate happens on these integers.
pub fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// How a record's date was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateSource {
    /// No date yet; the Date Resolver still has to fill it.
    Pending,
    /// Read from the receipt by the extraction service.
    Extracted,
    /// Carried forward from the nearest prior accepted date.
    Reused,
    /// Entered by the operator for a leading gap.
    Prompted,
}

/// Processing status of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Pending,
    Created,
    SkippedDuplicate,
    Failed,
}

/// One nightly charge of a hotel stay. A missing date means "record
/// date plus row offset" at entry time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NightCharge {
    pub date: Option<NaiveDate>,
    pub amount: f64,
}

/// Type-specific payload. The set is closed: it mirrors the target
/// application's own expense categories, not an extensible hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeDetails {
    Generic,
    Meal {
        attendee_count: u32,
        attendee_names: String,
    },
    Airfare {
        ticket_number: String,
        flight_class: String,
        international: bool,
        departure_city: String,
        arrival_city: String,
        passenger_name: String,
        agency: String,
    },
    Hotel {
        nights: Vec<NightCharge>,
    },
}

impl TypeDetails {
    pub fn category(&self) -> ExpenseCategory {
        match self {
            TypeDetails::Generic => ExpenseCategory::Generic,
            TypeDetails::Meal { .. } => ExpenseCategory::Meal,
            TypeDetails::Airfare { .. } => ExpenseCategory::Airfare,
            TypeDetails::Hotel { .. } => ExpenseCategory::Hotel,
        }
    }
}

/// One receipt, normalized. Immutable after normalization except for
/// `date` (Date Resolver), `status`/`skip_reason` (Duplicate Detector
/// and orchestrator), and `warnings`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub source_file: PathBuf,
    /// Always a member of the configured allow-list.
    pub expense_type: String,
    pub merchant: String,
    pub description: String,
    pub total_amount: f64,
    pub currency: String,
    pub date: Option<NaiveDate>,
    pub date_source: DateSource,
    pub city: Option<String>,
    pub meal_time: Option<NaiveTime>,
    pub details: TypeDetails,
    pub warnings: Vec<String>,
    pub status: RecordStatus,
    pub skip_reason: Option<String>,
}

impl ExpenseRecord {
    /// A failed placeholder for a receipt the extraction service could
    /// not read. It flows through the summary but never the browser.
    pub fn failed(source_file: PathBuf, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            source_file,
            expense_type: String::new(),
            merchant: String::new(),
            description: String::new(),
            total_amount: 0.0,
            currency: String::new(),
            date: None,
            date_source: DateSource::Pending,
            city: None,
            meal_time: None,
            details: TypeDetails::Generic,
            warnings: vec![reason.clone()],
            status: RecordStatus::Failed,
            skip_reason: Some(reason),
        }
    }

    pub fn push_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn mark_failed(&mut self, reason: impl Into<String>) {
        self.status = RecordStatus::Failed;
        self.skip_reason = Some(reason.into());
    }

    pub fn mark_skipped_duplicate(&mut self, reason: impl Into<String>) {
        self.status = RecordStatus::SkippedDuplicate;
        self.skip_reason = Some(reason.into());
    }

    pub fn amount_cents(&self) -> i64 {
        to_cents(self.total_amount)
    }

    /// File name shown in logs and the summary table.
    pub fn file_name(&self) -> String {
        self.source_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source_file.display().to_string())
    }
}

/// Process-scoped state for one run.
#[derive(Debug)]
pub struct RunContext {
    pub records: Vec<ExpenseRecord>,
    pub trip_destination: String,
    pub last_accepted_date: Option<NaiveDate>,
    pub test_mode: bool,
    pub home_city: String,
}

impl RunContext {
    pub fn new(records: Vec<ExpenseRecord>, home_city: impl Into<String>, test_mode: bool) -> Self {
        Self {
            records,
            trip_destination: String::new(),
            last_accepted_date: None,
            test_mode,
            home_city: home_city.into(),
        }
    }

    /// Report purpose derived from the trip destination.
    pub fn report_purpose(&self) -> String {
        format!("Trip to {}", self.trip_destination)
    }

    /// Totals in cents per currency over records that were neither
    /// failed nor skipped.
    pub fn totals_by_currency(&self) -> BTreeMap<String, i64> {
        let mut totals = BTreeMap::new();
        for record in &self.records {
            match record.status {
                RecordStatus::Failed | RecordStatus::SkippedDuplicate => continue,
                _ => {
                    *totals.entry(record.currency.clone()).or_insert(0) +=
                        record.amount_cents();
                }
            }
        }
        totals
    }
}
