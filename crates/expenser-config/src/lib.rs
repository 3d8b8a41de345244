//! # Expenser Config
//!
//! Configuration management for the expenser pipeline: LLM provider
//! settings, the expense-type allow-list, operator identity, and the
//! selector map for every control the browser layer addresses.

mod error;
mod loader;
mod schema;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
