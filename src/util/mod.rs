//! # Utility Modules
//!
//! Small helpers shared across the gateway: rate-limited logging and
//! payload previews for diagnostics.

pub mod logging;

pub use logging::{hex_preview, LogThrottle};
