//! # Expenser Extract
//!
//! Turns receipt images into raw structured payloads by calling an
//! OpenAI-compatible chat completions endpoint, either with the image
//! attached (vision mode) or with locally OCR'd text (ocr_text mode).

mod api;
mod client;
mod error;
mod ocr;
mod prompt;

pub use client::ReceiptExtractor;
pub use error::ExtractError;
