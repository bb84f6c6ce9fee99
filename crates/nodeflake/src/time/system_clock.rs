use core::time::Duration;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{EPOCH, TimeSource};

/// A wall-clock time source backed by [`SystemTime`].
///
/// Every read queries the system clock, so NTP step-backs and manual clock
/// changes are visible to the allocator, which then applies its
/// [`ClockBackoff`] policy. Readings earlier than the epoch saturate to `0`.
///
/// [`ClockBackoff`]: crate::ClockBackoff
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SystemClock {
    epoch: Duration,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::with_epoch(EPOCH)
    }
}

impl SystemClock {
    /// Constructs a wall clock whose zero point is `epoch`, given as a
    /// [`Duration`] since 1970-01-01 UTC.
    pub const fn with_epoch(epoch: Duration) -> Self {
        Self { epoch }
    }

    /// The epoch this clock measures from.
    pub const fn epoch(&self) -> Duration {
        self.epoch
    }
}

impl TimeSource for SystemClock {
    fn current_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .ok()
            .and_then(|now| now.checked_sub(self.epoch))
            .map_or(0, |since| since.as_millis() as u64)
    }
}
