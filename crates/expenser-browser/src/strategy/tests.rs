use std::path::PathBuf;

use chrono::NaiveDate;

use expenser_config::{Config, ExpenseCategory};
use expenser_core::{DateSource, ExpenseRecord, NightCharge, RecordStatus, TypeDetails};

use super::*;

fn record(expense_type: &str, amount: f64, details: TypeDetails) -> ExpenseRecord {
    ExpenseRecord {
        source_file: PathBuf::from("/receipts/IMG_0001.jpg"),
        expense_type: expense_type.to_string(),
        merchant: "Grand Plaza".to_string(),
        description: "Stay".to_string(),
        total_amount: amount,
        currency: "USD".to_string(),
        date: NaiveDate::from_ymd_opt(2026, 3, 4),
        date_source: DateSource::Extracted,
        city: None,
        meal_time: None,
        details,
        warnings: Vec::new(),
        status: RecordStatus::Pending,
        skip_reason: None,
    }
}

fn fills(plan: &[FieldAction]) -> Vec<(&str, &str)> {
    plan.iter()
        .filter_map(|a| match a {
            FieldAction::Fill { field, value } => Some((field.as_str(), value.as_str())),
            _ => None,
        })
        .collect()
}

#[test]
fn test_generic_plan_has_shared_fields_and_attachment() {
    let config = Config::default();
    let record = record("Miscellaneous Other", 12.5, TypeDetails::Generic);
    let plan = strategy_for(ExpenseCategory::Generic).plan(&record, &config);

    assert_eq!(
        plan[0],
        FieldAction::Select {
            field: config.selectors.expense_type_dropdown.clone(),
            label: "Miscellaneous Other".to_string(),
        }
    );
    let fills = fills(&plan);
    assert!(fills.contains(&(config.selectors.date_field.as_str(), "04-Mar-2026")));
    assert!(fills.contains(&(config.selectors.amount_field.as_str(), "12.50")));
    assert!(matches!(
        plan.last().unwrap(),
        FieldAction::AttachFile { path, .. } if path.ends_with("IMG_0001.jpg")
    ));
}

#[test]
fn test_meal_plan_appends_attendee_fields() {
    let config = Config::default();
    let record = record(
        "Meals - Dinner",
        64.0,
        TypeDetails::Meal {
            attendee_count: 1,
            attendee_names: "Pat Doe".to_string(),
        },
    );
    let plan = strategy_for(ExpenseCategory::Meal).plan(&record, &config);
    let fills = fills(&plan);
    assert!(fills.contains(&(config.selectors.attendee_count.as_str(), "1")));
    assert!(fills.contains(&(config.selectors.attendee_names.as_str(), "Pat Doe")));
}

#[test]
fn test_airfare_plan_selects_flight_type_by_leg() {
    let config = Config::default();
    let details = TypeDetails::Airfare {
        ticket_number: "0162345678901".to_string(),
        flight_class: "Business".to_string(),
        international: true,
        departure_city: "San Francisco".to_string(),
        arrival_city: "Tokyo".to_string(),
        passenger_name: "Pat Doe".to_string(),
        agency: "Globetrotter Travel".to_string(),
    };
    let plan = strategy_for(ExpenseCategory::Airfare).plan(&record("Airfare", 2400.0, details), &config);

    let selects: Vec<_> = plan
        .iter()
        .filter_map(|a| match a {
            FieldAction::Select { field, label } => Some((field.as_str(), label.as_str())),
            _ => None,
        })
        .collect();
    assert!(selects.contains(&(config.selectors.flight_type_dropdown.as_str(), "International")));
    assert!(selects.contains(&(config.selectors.flight_class_dropdown.as_str(), "Business")));
}

#[test]
fn test_hotel_plan_adds_rows_after_the_first() {
    let config = Config::default();
    let details = TypeDetails::Hotel {
        nights: vec![
            NightCharge {
                date: NaiveDate::from_ymd_opt(2026, 3, 4),
                amount: 150.0,
            },
            NightCharge {
                date: None,
                amount: 150.01,
            },
        ],
    };
    let plan = strategy_for(ExpenseCategory::Hotel).plan(&record("Hotel", 300.01, details), &config);

    let clicks = plan
        .iter()
        .filter(|a| matches!(a, FieldAction::Click { .. }))
        .count();
    assert_eq!(clicks, 1, "one add-row for the second night");

    let fills = fills(&plan);
    let row0_date = config.selectors.hotel_row_date.replace("{row}", "0");
    let row1_date = config.selectors.hotel_row_date.replace("{row}", "1");
    let row1_amount = config.selectors.hotel_row_amount.replace("{row}", "1");
    assert!(fills.contains(&(row0_date.as_str(), "04-Mar-2026")));
    // Missing night date falls back to check-in plus row offset.
    assert!(fills.contains(&(row1_date.as_str(), "05-Mar-2026")));
    assert!(fills.contains(&(row1_amount.as_str(), "150.01")));
}

#[test]
fn test_strategy_names_cover_every_category() {
    assert_eq!(strategy_for(ExpenseCategory::Generic).name(), "generic");
    assert_eq!(strategy_for(ExpenseCategory::Meal).name(), "meal");
    assert_eq!(strategy_for(ExpenseCategory::Airfare).name(), "airfare");
    assert_eq!(strategy_for(ExpenseCategory::Hotel).name(), "hotel");
}
