//! Monotonic millisecond clock.
//!
//! The node's timers compare `u32` millisecond stamps with wrapping
//! arithmetic, so the clock simply truncates the elapsed time to 32 bits
//! and rolls over every ~49.7 days.

use std::time::Instant;

pub struct MonotonicClock {
    start: Instant,
    /// Added to every reading; lets simulations start near the rollover.
    offset_ms: u32,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::with_offset(0)
    }

    /// A clock whose first reading is `offset_ms`.
    pub fn with_offset(offset_ms: u32) -> Self {
        Self {
            start: Instant::now(),
            offset_ms,
        }
    }

    /// Milliseconds since construction (wrapping at `u32::MAX`).
    pub fn now_ms(&self) -> u32 {
        let elapsed = self.start.elapsed().as_millis() as u32;
        elapsed.wrapping_add(self.offset_ms)
    }
}
