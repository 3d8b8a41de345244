//! Chrome DevTools Protocol client.
//!
//! Attaches to a Chrome instance started with
//! `chrome --remote-debugging-port=9222` and talks JSON-RPC over the
//! browser WebSocket. Only the domains the expense flow needs are
//! wired up.

mod client;
mod error;
mod protocol;
mod session;

pub use client::CdpClient;
pub use error::CdpError;
pub use protocol::{BrowserVersion, KeyEventType, PageInfo};
pub use session::PageSession;
