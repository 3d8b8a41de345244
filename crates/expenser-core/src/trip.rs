//! Trip destination inference.

use tracing::info;

use crate::record::{ExpenseRecord, RecordStatus};

/// First extracted city that differs from the home city,
/// case-insensitively. Falls back to the configured default when no
/// receipt names another city.
pub fn resolve_trip_destination(
    records: &[ExpenseRecord],
    home_city: &str,
    default_destination: &str,
) -> String {
    let home = home_city.to_lowercase();
    for record in records {
        if record.status == RecordStatus::Failed {
            continue;
        }
        if let Some(city) = record.city.as_deref() {
            if !city.trim().is_empty() && city.to_lowercase() != home {
                info!(city = %city, file = %record.file_name(), "trip destination inferred");
                return city.to_string();
            }
        }
    }
    info!(default = %default_destination, "no away city on any receipt, using default");
    default_destination.to_string()
}
