//! Browser layer errors.

use thiserror::Error;

use crate::cdp::CdpError;
use crate::interact::InteractError;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error(transparent)]
    Cdp(#[from] CdpError),

    #[error(transparent)]
    Interact(#[from] InteractError),

    /// Could not reach the application page at all. Fatal; the browser
    /// is left open for inspection.
    #[error("Bootstrap failed: {0}")]
    Bootstrap(String),

    /// The report could not be selected or created. Fatal.
    #[error("Report setup failed: {0}")]
    Report(String),

    /// The application rejected the save. The dialog text is included.
    #[error("Save rejected by the application: {0}")]
    SaveRejected(String),
}
