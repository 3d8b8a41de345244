//! Interactive stdin prompt for the date resolver.

use std::io::{BufRead, Write};

use chrono::NaiveDate;
use expenser_core::{CoreError, DatePrompt};

const PROMPT_ATTEMPTS: u32 = 3;

/// Asks the operator on stdin for a receipt date in `YYYY-MM-DD` form.
pub(crate) struct StdinDatePrompt;

impl DatePrompt for StdinDatePrompt {
    fn prompt_date(&mut self, file_name: &str) -> Result<NaiveDate, CoreError> {
        let stdin = std::io::stdin();
        let mut line = String::new();

        for attempt in 1..=PROMPT_ATTEMPTS {
            print!("Enter date for {file_name} (YYYY-MM-DD): ");
            std::io::stdout()
                .flush()
                .map_err(|e| CoreError::PromptFailed(e.to_string()))?;

            line.clear();
            stdin
                .lock()
                .read_line(&mut line)
                .map_err(|e| CoreError::PromptFailed(e.to_string()))?;

            match parse_entered_date(&line) {
                Some(date) => return Ok(date),
                None if attempt < PROMPT_ATTEMPTS => {
                    println!("Could not parse {:?}, expected YYYY-MM-DD.", line.trim());
                }
                None => break,
            }
        }

        Err(CoreError::PromptFailed(format!(
            "no valid date entered for {file_name} after {PROMPT_ATTEMPTS} attempts"
        )))
    }
}

fn parse_entered_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").ok()
}
