//! # Expenser Browser
//!
//! Drives the expense application through an already-running Chrome
//! instance with remote debugging enabled. The `cdp` module is the
//! wire-level DevTools client, `interact` holds the keyboard-first
//! interaction primitives the application's widgets require, and
//! `orchestrator` walks the report entry state machine.

pub mod cdp;
pub mod interact;
pub mod orchestrator;
pub mod strategy;

mod error;

pub use error::BrowserError;
pub use orchestrator::Orchestrator;
