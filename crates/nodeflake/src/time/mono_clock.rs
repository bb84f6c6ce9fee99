use core::time::Duration;
use std::{
    sync::Arc,
    thread,
    time::{Instant, SystemTime, UNIX_EPOCH},
};

use portable_atomic::{AtomicU64, Ordering};

use crate::{EPOCH, TimeSource};

/// A time source that never moves backward.
///
/// The wall-clock offset from the epoch is sampled once at construction. From
/// then on a background ticker thread advances a shared counter by the
/// elapsed [`Instant`] time, once per millisecond. Reads are a single atomic
/// load and are immune to NTP or manual clock adjustments, at the cost of
/// slowly drifting from wall time if the system clock is corrected later.
///
/// Clones share one ticker. The thread exits once the last clone is dropped.
#[derive(Clone, Debug)]
pub struct MonotonicClock {
    elapsed: Arc<AtomicU64>,
    epoch_offset: u64,
}

impl Default for MonotonicClock {
    /// A monotonic clock aligned to [`EPOCH`].
    fn default() -> Self {
        Self::with_epoch(EPOCH)
    }
}

impl MonotonicClock {
    /// Constructs a monotonic clock whose zero point is `epoch`, given as a
    /// [`Duration`] since 1970-01-01 UTC.
    ///
    /// If the system clock is earlier than `epoch`, readings start at `0`.
    pub fn with_epoch(epoch: Duration) -> Self {
        let start = Instant::now();
        let epoch_offset = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .ok()
            .and_then(|now| now.checked_sub(epoch))
            .map_or(0, |since| since.as_millis() as u64);

        let elapsed = Arc::new(AtomicU64::new(0));
        let ticker = Arc::downgrade(&elapsed);
        thread::spawn(move || {
            let mut tick = 0;
            while let Some(elapsed) = ticker.upgrade() {
                let target = start + Duration::from_millis(tick);
                let now = Instant::now();
                if now < target {
                    thread::sleep(target - now);
                }

                let elapsed_ms = start.elapsed().as_millis() as u64;
                elapsed.store(elapsed_ms, Ordering::Relaxed);
                tick = elapsed_ms + 1;
            }
        });

        Self {
            elapsed,
            epoch_offset,
        }
    }
}

impl TimeSource for MonotonicClock {
    fn current_millis(&self) -> u64 {
        self.epoch_offset + self.elapsed.load(Ordering::Relaxed)
    }
}
