//! Sequential date resolution.
//!
//! Receipts are processed in file order, which for phone camera rolls
//! is chronological. A record without a readable date inherits the
//! nearest prior accepted date; if no date has been accepted yet the
//! operator is asked once, and that answer covers the whole leading
//! gap.

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::error::CoreError;
use crate::record::{DateSource, ExpenseRecord, RecordStatus};

/// Source of an operator-entered date. The binary wires this to stdin;
/// tests script it.
pub trait DatePrompt {
    /// Ask for the date of the named receipt. `Err` aborts the run.
    fn prompt_date(&mut self, file_name: &str) -> Result<NaiveDate, CoreError>;
}

#[derive(Debug, Default)]
pub struct DateResolver {
    last_accepted: Option<NaiveDate>,
}

impl DateResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent date accepted by a `resolve_batch` call.
    pub fn last_accepted(&self) -> Option<NaiveDate> {
        self.last_accepted
    }

    /// Fill every missing date in order. Failed records are left
    /// untouched and never influence the carried date.
    pub fn resolve_batch(
        &mut self,
        records: &mut [ExpenseRecord],
        prompt: &mut dyn DatePrompt,
    ) -> Result<(), CoreError> {
        for record in records.iter_mut() {
            if record.status == RecordStatus::Failed {
                continue;
            }
            match record.date {
                Some(date) => {
                    self.last_accepted = Some(date);
                }
                None => {
                    let (date, source) = match self.last_accepted {
                        Some(prior) => (prior, DateSource::Reused),
                        None => {
                            let file = record.file_name();
                            warn!(file = %file, "no prior date to reuse, asking operator");
                            let entered = prompt.prompt_date(&file)?;
                            (entered, DateSource::Prompted)
                        }
                    };
                    info!(
                        file = %record.file_name(),
                        date = %date,
                        source = ?source,
                        "filled missing receipt date"
                    );
                    record.date = Some(date);
                    record.date_source = source;
                    self.last_accepted = Some(date);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "dates_tests.rs"]
mod tests;
