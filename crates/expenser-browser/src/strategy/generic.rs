use expenser_config::Config;
use expenser_core::ExpenseRecord;

use super::{base_plan, FieldAction, FieldStrategy};

/// Plain expense items: the shared fields and nothing else.
pub struct GenericStrategy;

impl FieldStrategy for GenericStrategy {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn plan(&self, record: &ExpenseRecord, config: &Config) -> Vec<FieldAction> {
        base_plan(record, &config.selectors)
    }
}
