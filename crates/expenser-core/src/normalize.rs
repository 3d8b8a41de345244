//! Raw payload validation and normalization.
//!
//! Every step is idempotent and recovers via a fallback value plus a
//! warning; normalization never fails a record outright.

use std::path::Path;

use chrono::{NaiveDate, NaiveTime};
use tracing::debug;

use expenser_config::{Config, ExpenseCategory};

use crate::raw::RawExtraction;
use crate::record::{
    to_cents, DateSource, ExpenseRecord, NightCharge, RecordStatus, TypeDetails,
};

/// The only accepted date format in raw payloads.
const RAW_DATE_FORMAT: &str = "%Y-%m-%d";

/// Turn a raw extraction into a canonical record.
pub fn normalize(raw: &RawExtraction, config: &Config, source_file: &Path) -> ExpenseRecord {
    let mut warnings = Vec::new();

    let mut expense_type = resolve_expense_type(raw, config, &mut warnings);
    let merchant = raw.merchant.clone().unwrap_or_default();

    let (date, date_source) = parse_raw_date(raw.date.as_deref(), &mut warnings);

    let total_amount = match raw.total_amount {
        Some(amount) if amount > 0.0 => amount,
        Some(amount) => {
            warnings.push(format!(
                "Amount {amount} is not positive, using 0.00 placeholder"
            ));
            0.0
        }
        None => {
            warnings.push("Amount missing, using 0.00 placeholder".to_string());
            0.0
        }
    };

    let currency = raw
        .currency
        .clone()
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| config.user.home_currency.clone());

    let description = match raw.description.clone().filter(|d| !d.trim().is_empty()) {
        Some(d) => d,
        None => {
            warnings.push("Generated description from merchant and type".to_string());
            format!("{merchant} - {expense_type}")
        }
    };

    let mut meal_time = None;
    let mut category = config.category_for(&expense_type);

    if category == ExpenseCategory::Meal {
        if let Some(time) = parse_meal_time(raw.time.as_deref(), &mut warnings) {
            let bucketed = bucket_meal_label(time, config);
            if bucketed != expense_type {
                debug!(from = %expense_type, to = %bucketed, "meal label bucketed by time of day");
                expense_type = bucketed;
                category = config.category_for(&expense_type);
            }
            meal_time = Some(time);
        }
    }

    let details = match category {
        ExpenseCategory::Generic => TypeDetails::Generic,
        ExpenseCategory::Meal => TypeDetails::Meal {
            attendee_count: 1,
            attendee_names: config.user.full_name.clone(),
        },
        ExpenseCategory::Airfare => airfare_details(raw, config),
        ExpenseCategory::Hotel => hotel_details(raw, total_amount, date, &mut warnings),
    };

    ExpenseRecord {
        source_file: source_file.to_path_buf(),
        expense_type,
        merchant,
        description,
        total_amount,
        currency,
        date,
        date_source,
        city: raw.city.clone().filter(|c| !c.trim().is_empty()),
        meal_time,
        details,
        warnings,
        status: RecordStatus::Pending,
        skip_reason: None,
    }
}

/// Case-sensitive exact match against the allow-list; anything else
/// falls back to the configured default label.
fn resolve_expense_type(
    raw: &RawExtraction,
    config: &Config,
    warnings: &mut Vec<String>,
) -> String {
    let proposed = raw.expense_type.clone().unwrap_or_default();
    if config.expense_type(&proposed).is_some() {
        return proposed;
    }
    warnings.push(format!(
        "Unknown expense type '{}', falling back to '{}'",
        proposed, config.report.default_expense_type
    ));
    config.report.default_expense_type.clone()
}

fn parse_raw_date(
    raw: Option<&str>,
    warnings: &mut Vec<String>,
) -> (Option<NaiveDate>, DateSource) {
    match raw {
        Some(text) => match NaiveDate::parse_from_str(text, RAW_DATE_FORMAT) {
            Ok(date) => (Some(date), DateSource::Extracted),
            Err(_) => {
                warnings.push(format!("Could not parse date '{text}'"));
                (None, DateSource::Pending)
            }
        },
        None => (None, DateSource::Pending),
    }
}

fn parse_meal_time(raw: Option<&str>, warnings: &mut Vec<String>) -> Option<NaiveTime> {
    let text = raw?;
    match NaiveTime::parse_from_str(text, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M:%S"))
    {
        Ok(time) => Some(time),
        Err(_) => {
            warnings.push(format!("Could not parse meal time '{text}'"));
            None
        }
    }
}

/// Time-of-day bucketing. Lower bucket edges are inclusive: 11:00 is
/// lunch, 16:00 is dinner.
fn bucket_meal_label(time: NaiveTime, config: &Config) -> String {
    let lunch_start = NaiveTime::from_hms_opt(11, 0, 0).unwrap_or_default();
    let dinner_start = NaiveTime::from_hms_opt(16, 0, 0).unwrap_or_default();
    if time < lunch_start {
        config.meals.breakfast.clone()
    } else if time < dinner_start {
        config.meals.lunch.clone()
    } else {
        config.meals.dinner.clone()
    }
}

/// Business class only on long international flights.
fn infer_flight_class(international: bool, duration_hours: Option<f64>) -> &'static str {
    if international && duration_hours.is_some_and(|h| h >= 6.0) {
        "Business"
    } else {
        "Coach"
    }
}

fn airfare_details(raw: &RawExtraction, config: &Config) -> TypeDetails {
    let international = raw.international.unwrap_or(false);
    TypeDetails::Airfare {
        ticket_number: raw.ticket_number.clone().unwrap_or_default(),
        flight_class: infer_flight_class(international, raw.flight_duration_hours).to_string(),
        international,
        departure_city: raw.departure_city.clone().unwrap_or_default(),
        arrival_city: raw.arrival_city.clone().unwrap_or_default(),
        passenger_name: config.user.full_name.clone(),
        agency: raw
            .agency
            .clone()
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| config.report.travel_agency.clone()),
    }
}

/// Synthesize the nightly breakdown so its sum equals the total to the
/// cent, with the remainder assigned to the last night.
fn hotel_details(
    raw: &RawExtraction,
    total_amount: f64,
    base_date: Option<NaiveDate>,
    warnings: &mut Vec<String>,
) -> TypeDetails {
    let total_cents = to_cents(total_amount);

    if let Some(raw_nights) = raw.nights.as_ref().filter(|n| !n.is_empty()) {
        let supplied_cents: i64 = raw_nights.iter().map(|n| to_cents(n.amount)).sum();
        let dates: Vec<Option<NaiveDate>> = raw_nights
            .iter()
            .map(|n| {
                n.date
                    .as_deref()
                    .and_then(|d| NaiveDate::parse_from_str(d, RAW_DATE_FORMAT).ok())
            })
            .collect();

        if supplied_cents == total_cents {
            let nights = raw_nights
                .iter()
                .zip(dates)
                .map(|(n, date)| NightCharge {
                    date,
                    amount: n.amount,
                })
                .collect();
            return TypeDetails::Hotel { nights };
        }

        warnings.push(format!(
            "Nightly amounts sum to {:.2} but total is {:.2}, redistributing evenly",
            supplied_cents as f64 / 100.0,
            total_amount
        ));
        return TypeDetails::Hotel {
            nights: distribute_nights(total_cents, dates),
        };
    }

    let night_count = match inferred_night_count(raw) {
        Some(count) => count,
        None => {
            warnings.push("No stay length on receipt, assuming a single night".to_string());
            1
        }
    };

    let start = raw
        .check_in_date
        .as_deref()
        .and_then(|d| NaiveDate::parse_from_str(d, RAW_DATE_FORMAT).ok())
        .or(base_date);
    let dates = (0..night_count)
        .map(|i| start.map(|s| s + chrono::Days::new(i as u64)))
        .collect();

    TypeDetails::Hotel {
        nights: distribute_nights(total_cents, dates),
    }
}

/// Night count from the check-in/check-out range when both parse.
fn inferred_night_count(raw: &RawExtraction) -> Option<usize> {
    let check_in = NaiveDate::parse_from_str(raw.check_in_date.as_deref()?, RAW_DATE_FORMAT).ok()?;
    let check_out =
        NaiveDate::parse_from_str(raw.check_out_date.as_deref()?, RAW_DATE_FORMAT).ok()?;
    let nights = (check_out - check_in).num_days();
    Some(nights.max(1) as usize)
}

fn distribute_nights(total_cents: i64, dates: Vec<Option<NaiveDate>>) -> Vec<NightCharge> {
    let count = dates.len().max(1) as i64;
    let base = total_cents / count;
    dates
        .iter()
        .enumerate()
        .map(|(i, date)| {
            let cents = if i as i64 == count - 1 {
                total_cents - base * (count - 1)
            } else {
                base
            };
            NightCharge {
                date: *date,
                amount: cents as f64 / 100.0,
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "normalize_tests.rs"]
mod tests;
