//! Raw extraction payload as returned by the language model.

use serde::{Deserialize, Serialize};

/// One synthesized or extracted hotel night as the model reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawNight {
    #[serde(default)]
    pub date: Option<String>,
    pub amount: f64,
}

/// The fixed response schema requested from the extraction service.
/// Everything is optional here; the validator decides what a missing
/// field means. The extraction client only enforces presence of the
/// required quartet (type, merchant, amount, currency).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawExtraction {
    #[serde(default)]
    pub expense_type: Option<String>,
    #[serde(default)]
    pub merchant: Option<String>,
    #[serde(default)]
    pub total_amount: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    /// `YYYY-MM-DD` when present.
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    /// `HH:MM`, meals only.
    #[serde(default)]
    pub time: Option<String>,

    // Airfare
    #[serde(default)]
    pub ticket_number: Option<String>,
    #[serde(default)]
    pub departure_city: Option<String>,
    #[serde(default)]
    pub arrival_city: Option<String>,
    #[serde(default)]
    pub agency: Option<String>,
    #[serde(default)]
    pub flight_duration_hours: Option<f64>,
    #[serde(default)]
    pub international: Option<bool>,

    // Hotel
    #[serde(default)]
    pub nights: Option<Vec<RawNight>>,
    #[serde(default)]
    pub check_in_date: Option<String>,
    #[serde(default)]
    pub check_out_date: Option<String>,
}

impl RawExtraction {
    /// Fields the extraction client refuses to proceed without.
    pub fn missing_required_field(&self) -> Option<&'static str> {
        if self.expense_type.is_none() {
            Some("expense_type")
        } else if self.merchant.is_none() {
            Some("merchant")
        } else if self.total_amount.is_none() {
            Some("total_amount")
        } else if self.currency.is_none() {
            Some("currency")
        } else {
            None
        }
    }
}
