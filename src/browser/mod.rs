//! Browser automation over the Chrome DevTools Protocol.
//!
//! - `cdp`: WebSocket transport with id-correlated replies and an event queue.
//! - `launch`: owns the browser process and its throw-away profile.
//! - `page`: the [`PageSession`] capability the navigation driver is written
//!   against, and its DevTools-backed implementation.

mod cdp;
mod error;
mod launch;
mod page;

pub use error::BrowserError;
pub use launch::{Browser, LaunchOptions};
pub use page::{PageSession, Probe};
