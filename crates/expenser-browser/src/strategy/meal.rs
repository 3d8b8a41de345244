use expenser_config::Config;
use expenser_core::{ExpenseRecord, TypeDetails};

use super::{base_plan, FieldAction, FieldStrategy};

/// Meals add the attendee fields the application requires even for a
/// solo meal.
pub struct MealStrategy;

impl FieldStrategy for MealStrategy {
    fn name(&self) -> &'static str {
        "meal"
    }

    fn plan(&self, record: &ExpenseRecord, config: &Config) -> Vec<FieldAction> {
        let mut plan = base_plan(record, &config.selectors);
        if let TypeDetails::Meal {
            attendee_count,
            attendee_names,
        } = &record.details
        {
            plan.push(FieldAction::Fill {
                field: config.selectors.attendee_count.clone(),
                value: attendee_count.to_string(),
            });
            plan.push(FieldAction::Fill {
                field: config.selectors.attendee_names.clone(),
                value: attendee_names.clone(),
            });
        }
        plan
    }
}
