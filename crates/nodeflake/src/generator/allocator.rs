use core::{cmp, time::Duration};
use std::thread;

use portable_atomic::{AtomicU64, Ordering};
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    error::{Error, Result},
    generator::{ClockBackoff, IdGenStatus},
    id::SnowflakeId,
    time::{SystemClock, TimeSource},
};

/// A lock-free ID allocator for one node, safe to share across threads.
///
/// The last issued ID is stored in a single [`AtomicU64`]. Because the
/// timestamp and sequence live in the same word, each new ID is committed with
/// one compare-and-swap, and no thread can ever observe a new timestamp paired
/// with a stale sequence (or the reverse). Losing the race only means
/// re-reading fresh state and trying again.
///
/// Allocators are independent: several may coexist in one process as long as
/// each has its own node ID. Share one allocator by reference or
/// [`Arc`](std::sync::Arc); there is no global instance.
///
/// ## Lifetime
///
/// The 41-bit timestamp field covers about 69 years past the clock's epoch.
/// This is not checked at runtime. Past that bound clock readings wrap modulo
/// 2^41, so the timestamp appears to jump backward and the allocator applies
/// its [`ClockBackoff`] policy. It never reissues an ID.
pub struct IdAllocator<T = SystemClock>
where
    T: TimeSource,
{
    #[cfg(feature = "cache-padded")]
    state: crossbeam_utils::CachePadded<AtomicU64>,
    #[cfg(not(feature = "cache-padded"))]
    state: AtomicU64,
    node_id: u64,
    backoff: ClockBackoff,
    clock: T,
}

impl IdAllocator<SystemClock> {
    /// Creates an allocator for `node_id` reading the system wall clock.
    ///
    /// `backoff` accepts a [`ClockBackoff`] or a `bool`, where `true` means
    /// [`ClockBackoff::Wait`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNodeId`] unless `0 <= node_id <= 1023`.
    ///
    /// # Example
    ///
    /// ```
    /// use nodeflake::{ClockBackoff, Error, IdAllocator};
    ///
    /// let allocator = IdAllocator::new(1023, ClockBackoff::Wait)?;
    /// assert_eq!(allocator.node_id(), 1023);
    ///
    /// assert!(matches!(
    ///     IdAllocator::new(1024, true),
    ///     Err(Error::InvalidNodeId { node_id: 1024, .. })
    /// ));
    /// # Ok::<(), Error>(())
    /// ```
    pub fn new(node_id: i64, backoff: impl Into<ClockBackoff>) -> Result<Self> {
        Self::with_clock(node_id, backoff, SystemClock::default())
    }
}

impl<T> IdAllocator<T>
where
    T: TimeSource,
{
    /// Creates an allocator reading time from `clock`.
    ///
    /// The last issued timestamp and the sequence both start at zero.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNodeId`] unless `0 <= node_id <= 1023`.
    pub fn with_clock(node_id: i64, backoff: impl Into<ClockBackoff>, clock: T) -> Result<Self> {
        Self::from_components(node_id, backoff, 0, 0, clock)
    }

    /// Creates an allocator whose last issued ID had the given timestamp and
    /// sequence.
    ///
    /// This is mainly useful for restoring a known state or for tests. The
    /// next ID will sort after `(last_timestamp, sequence)`. Values wider than
    /// their field are truncated.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNodeId`] unless `0 <= node_id <= 1023`.
    pub fn from_components(
        node_id: i64,
        backoff: impl Into<ClockBackoff>,
        last_timestamp: u64,
        sequence: u64,
        clock: T,
    ) -> Result<Self> {
        let node_id = validate_node_id(node_id)?;
        let backoff = backoff.into();
        let initial = SnowflakeId::from_components(last_timestamp, node_id, sequence);

        #[cfg(feature = "tracing")]
        tracing::debug!(node_id, %backoff, last_timestamp, sequence, "created id allocator");

        Ok(Self {
            #[cfg(feature = "cache-padded")]
            state: crossbeam_utils::CachePadded::new(AtomicU64::new(initial.to_raw())),
            #[cfg(not(feature = "cache-padded"))]
            state: AtomicU64::new(initial.to_raw()),
            node_id,
            backoff,
            clock,
        })
    }

    /// The node ID embedded in every ID from this allocator.
    pub fn node_id(&self) -> u64 {
        self.node_id
    }

    /// The policy applied when the clock moves backward.
    pub fn backoff(&self) -> ClockBackoff {
        self.backoff
    }

    /// Generates the next ID, blocking if necessary.
    ///
    /// The call spins (yielding to the scheduler) while the sequence is
    /// exhausted for the current millisecond, which lasts at most until the
    /// clock ticks. If the clock reads earlier than the last issued
    /// timestamp, the allocator's [`ClockBackoff`] decides what happens:
    /// [`Wait`](ClockBackoff::Wait) sleeps for the size of the jump and
    /// retries, [`Fail`](ClockBackoff::Fail) returns an error.
    ///
    /// IDs from one allocator are unique, and IDs issued one after another
    /// by the same thread are strictly increasing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClockMovedBackward`] only under
    /// [`ClockBackoff::Fail`]. A failed call changes no state; the next call
    /// may succeed once the clock has caught up.
    ///
    /// # Example
    ///
    /// ```
    /// use nodeflake::{ClockBackoff, IdAllocator};
    ///
    /// let allocator = IdAllocator::new(3, ClockBackoff::Wait)?;
    /// let a = allocator.generate()?;
    /// let b = allocator.generate()?;
    /// assert!(a < b);
    /// assert_eq!(b.node_id(), 3);
    /// # Ok::<(), nodeflake::Error>(())
    /// ```
    pub fn generate(&self) -> Result<SnowflakeId> {
        loop {
            match self.poll_id() {
                IdGenStatus::Ready { id } => return Ok(id),
                IdGenStatus::Pending { yield_for: 0 } => core::hint::spin_loop(),
                IdGenStatus::Pending { .. } => thread::yield_now(),
                IdGenStatus::ClockBehind { now, last } => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        node_id = self.node_id,
                        now,
                        last,
                        behind_ms = last - now,
                        backoff = %self.backoff,
                        "clock moved backward"
                    );

                    match self.backoff {
                        ClockBackoff::Wait => thread::sleep(Duration::from_millis(last - now)),
                        ClockBackoff::Fail => return Err(Error::ClockMovedBackward { now, last }),
                    }
                }
            }
        }
    }

    /// Generates `count` IDs in order.
    ///
    /// # Errors
    ///
    /// Stops at the first failure of [`Self::generate`] and returns it. IDs
    /// generated before the failure are dropped.
    pub fn generate_batch(&self, count: usize) -> Result<Vec<SnowflakeId>> {
        (0..count).map(|_| self.generate()).collect()
    }

    /// Makes one attempt at committing a new ID, without blocking.
    ///
    /// - [`IdGenStatus::Ready`]: the ID is committed and unique.
    /// - [`IdGenStatus::Pending`]: the sequence is exhausted for this
    ///   millisecond (`yield_for == 1`) or another thread committed first
    ///   (`yield_for == 0`).
    /// - [`IdGenStatus::ClockBehind`]: the clock reads earlier than the last
    ///   issued timestamp. The backoff policy is not applied here.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "trace", skip(self), fields(node_id = self.node_id))
    )]
    pub fn poll_id(&self) -> IdGenStatus {
        // Compare in the timestamp field's domain so readings past the 41-bit
        // bound cannot re-enter `Greater` with a truncated value.
        let now = self.clock.current_millis() & SnowflakeId::TIMESTAMP_MASK;

        let current_raw = self.state.load(Ordering::Relaxed);
        let current = SnowflakeId::from_raw(current_raw);
        let last = current.timestamp();

        let next = match now.cmp(&last) {
            cmp::Ordering::Equal => {
                if current.has_sequence_room() {
                    current.increment_sequence()
                } else {
                    return IdGenStatus::Pending { yield_for: 1 };
                }
            }
            cmp::Ordering::Greater => current.rollover_to_timestamp(now),
            cmp::Ordering::Less => return Self::cold_clock_behind(now, last),
        };

        if self
            .state
            .compare_exchange(current_raw, next.to_raw(), Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
        {
            IdGenStatus::Ready { id: next }
        } else {
            IdGenStatus::Pending { yield_for: 0 }
        }
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(now: u64, last: u64) -> IdGenStatus {
        IdGenStatus::ClockBehind { now, last }
    }
}

fn validate_node_id(node_id: i64) -> Result<u64> {
    let max = SnowflakeId::max_node_id();
    match u64::try_from(node_id) {
        Ok(id) if id <= max => Ok(id),
        _ => Err(Error::InvalidNodeId { node_id, max }),
    }
}
