//! # Expenser Core
//!
//! The data model and batch pre-passes shared by the extraction and
//! browser layers: `ExpenseRecord`/`RunContext`, raw-payload
//! normalization, the sequential Date Resolver, the Trip Context
//! Resolver, the Duplicate Detector, and the end-of-run summary.

mod dates;
mod dedupe;
mod error;
mod normalize;
mod raw;
mod record;
mod summary;
mod trip;

pub use dates::{DatePrompt, DateResolver};
pub use dedupe::{mark_duplicates, parse_ui_amount, parse_ui_date, ExistingItem};
pub use error::CoreError;
pub use normalize::normalize;
pub use raw::{RawExtraction, RawNight};
pub use record::{
    to_cents, DateSource, ExpenseRecord, NightCharge, RecordStatus, RunContext, TypeDetails,
};
pub use summary::RunSummary;
pub use trip::resolve_trip_destination;
