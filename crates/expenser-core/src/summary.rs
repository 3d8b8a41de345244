//! End-of-run summary.

use std::fmt::Write as _;

use crate::record::{RecordStatus, RunContext};

/// Aggregated outcome of one run, rendered as a plain-text table for
/// the terminal.
#[derive(Debug)]
pub struct RunSummary {
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
    lines: Vec<String>,
    totals: Vec<(String, i64)>,
}

impl RunSummary {
    pub fn from_context(ctx: &RunContext) -> Self {
        let mut created = 0;
        let mut skipped = 0;
        let mut failed = 0;
        let mut lines = Vec::with_capacity(ctx.records.len());

        for record in &ctx.records {
            let status = match record.status {
                RecordStatus::Created => {
                    created += 1;
                    "created"
                }
                RecordStatus::SkippedDuplicate => {
                    skipped += 1;
                    "duplicate"
                }
                RecordStatus::Failed => {
                    failed += 1;
                    "FAILED"
                }
                RecordStatus::Pending => "pending",
            };
            let date = record
                .date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string());
            let mut line = format!(
                "{:<28} {:<24} {:>10.2} {:<4} {:<10} {}",
                truncate(&record.file_name(), 28),
                truncate(&record.expense_type, 24),
                record.total_amount,
                record.currency,
                date,
                status
            );
            if let Some(reason) = &record.skip_reason {
                let _ = write!(line, "  ({reason})");
            }
            for warning in &record.warnings {
                let _ = write!(line, "\n    warning: {warning}");
            }
            lines.push(line);
        }

        let totals = ctx
            .totals_by_currency()
            .into_iter()
            .collect::<Vec<(String, i64)>>();

        Self {
            created,
            skipped,
            failed,
            lines,
            totals,
        }
    }

    /// True when at least one receipt could not be entered.
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    pub fn render(&self, trip_destination: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Trip to {trip_destination}");
        let _ = writeln!(out, "{}", "-".repeat(92));
        for line in &self.lines {
            let _ = writeln!(out, "{line}");
        }
        let _ = writeln!(out, "{}", "-".repeat(92));
        for (currency, cents) in &self.totals {
            let _ = writeln!(out, "Total {currency}: {:.2}", *cents as f64 / 100.0);
        }
        let _ = writeln!(
            out,
            "{} created, {} duplicates skipped, {} failed",
            self.created, self.skipped, self.failed
        );
        out
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let head: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{head}~")
    }
}
