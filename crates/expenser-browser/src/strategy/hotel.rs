use chrono::Days;

use expenser_config::Config;
use expenser_core::{ExpenseRecord, TypeDetails};

use super::{base_plan, format_amount, format_ui_date, FieldAction, FieldStrategy};

/// Hotels expand into one nightly row per night. The form opens with a
/// single row; each further night needs the add-row control first.
pub struct HotelStrategy;

impl FieldStrategy for HotelStrategy {
    fn name(&self) -> &'static str {
        "hotel"
    }

    fn plan(&self, record: &ExpenseRecord, config: &Config) -> Vec<FieldAction> {
        let selectors = &config.selectors;
        let mut plan = base_plan(record, selectors);

        let TypeDetails::Hotel { nights } = &record.details else {
            return plan;
        };

        for (row, night) in nights.iter().enumerate() {
            if row > 0 {
                plan.push(FieldAction::Click {
                    selector: selectors.hotel_add_row.clone(),
                });
            }
            // A night without its own date lands on check-in plus offset.
            let date = night
                .date
                .or_else(|| record.date.and_then(|d| d.checked_add_days(Days::new(row as u64))));
            if let Some(date) = date {
                plan.push(FieldAction::Fill {
                    field: row_selector(&selectors.hotel_row_date, row),
                    value: format_ui_date(date),
                });
            }
            plan.push(FieldAction::Fill {
                field: row_selector(&selectors.hotel_row_amount, row),
                value: format_amount(night.amount),
            });
        }
        plan
    }
}

fn row_selector(template: &str, row: usize) -> String {
    template.replace("{row}", &row.to_string())
}
