//! Prompt construction and response cleanup.

use std::fmt::Write as _;

use expenser_config::{Config, ExpenseCategory};

/// System prompt: the extraction contract the model must follow.
pub fn system_prompt(config: &Config) -> String {
    let mut out = String::from(
        "You read expense receipts and reply with a single JSON object, \
         no prose and no markdown. Required keys: expense_type, merchant, \
         total_amount (number), currency (ISO code), date (YYYY-MM-DD). \
         Optional keys when visible on the receipt: description, city, \
         time (HH:MM, 24h).\n",
    );

    out.push_str("expense_type must be exactly one of:\n");
    for et in &config.expense_types {
        if et.keywords.is_empty() {
            let _ = writeln!(out, "- {}", et.label);
        } else {
            let _ = writeln!(out, "- {} (hints: {})", et.label, et.keywords.join(", "));
        }
    }

    if config
        .expense_types
        .iter()
        .any(|et| et.category == ExpenseCategory::Airfare)
    {
        out.push_str(
            "For airfare add: ticket_number, departure_city, arrival_city, \
             agency, flight_duration_hours (number), international (boolean).\n",
        );
    }
    if config
        .expense_types
        .iter()
        .any(|et| et.category == ExpenseCategory::Hotel)
    {
        out.push_str(
            "For hotels add: check_in_date, check_out_date, and nights, an \
             array of {date, amount} objects, one per night including room \
             taxes and fees.\n",
        );
    }
    out.push_str("Omit any key you cannot read. Never guess values.");
    out
}

/// User prompt for vision mode, paired with the attached image.
pub fn vision_user_prompt() -> &'static str {
    "Extract the expense data from this receipt image."
}

/// User prompt for ocr_text mode, wrapping the OCR output.
pub fn ocr_user_prompt(ocr_text: &str) -> String {
    format!(
        "Extract the expense data from this OCR text of a receipt:\n\n{ocr_text}"
    )
}

/// Strip a markdown code fence around a JSON payload. Models wrap
/// output in ```json fences even when told not to.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}
