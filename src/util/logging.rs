//! # Logging Utilities
//!
//! Rate limiting for log lines emitted from hot loops, and bounded hex
//! previews of payloads that were rejected.
//!
//! ## Usage
//!
//! ```rust
//! use lora_gateway::util::logging::{hex_preview, LogThrottle};
//!
//! // Allow 5 messages per second
//! let mut throttle = LogThrottle::new(1000, 5);
//! if throttle.allow() {
//!     log::warn!("CRC error detected");
//! }
//!
//! assert_eq!(hex_preview(&[0x7B, 0x22], 16), "7b22");
//! ```

use std::time::Instant;

/// Throttling structure for rate-limiting log messages
///
/// A receive loop stuck on a persistent fault would otherwise emit one line
/// per iteration. Callers still count every event; only the log line is
/// suppressed.
#[derive(Debug)]
pub struct LogThrottle {
    /// Time window for throttling (in milliseconds)
    window_ms: u64,
    /// Maximum messages allowed per window
    cap: u32,
    /// Current message count in window
    count: u32,
    /// Messages suppressed since the last allowed one
    suppressed: u64,
    /// Start time of current window
    t0: Instant,
}

impl LogThrottle {
    /// Create new throttle with time window and message cap
    ///
    /// # Arguments
    /// * `window_ms` - Time window in milliseconds
    /// * `cap` - Maximum messages allowed per window
    pub fn new(window_ms: u64, cap: u32) -> Self {
        Self {
            window_ms,
            cap,
            count: 0,
            suppressed: 0,
            t0: Instant::now(),
        }
    }

    /// Check if logging is allowed (resets counter after window expires)
    ///
    /// Returns `true` if the message should be logged, `false` if it
    /// should be throttled.
    pub fn allow(&mut self) -> bool {
        let now = Instant::now();
        let elapsed_ms = now.duration_since(self.t0).as_millis() as u64;

        if elapsed_ms > self.window_ms {
            self.t0 = now;
            self.count = 0;
        }

        self.count = self.count.saturating_add(1);
        if self.count <= self.cap {
            true
        } else {
            self.suppressed += 1;
            false
        }
    }

    /// Returns and resets the number of suppressed messages.
    pub fn take_suppressed(&mut self) -> u64 {
        std::mem::take(&mut self.suppressed)
    }
}

/// Lowercase hex of at most `max_bytes` bytes, with an ellipsis marker when
/// the input was longer.
pub fn hex_preview(data: &[u8], max_bytes: usize) -> String {
    if data.len() <= max_bytes {
        hex::encode(data)
    } else {
        format!(
            "{}... ({} bytes)",
            hex::encode(&data[..max_bytes]),
            data.len()
        )
    }
}
