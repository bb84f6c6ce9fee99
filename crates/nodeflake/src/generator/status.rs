use crate::SnowflakeId;

/// The outcome of a single, non-blocking generation attempt.
///
/// Returned by [`IdAllocator::poll_id`]. [`IdAllocator::generate`] loops over
/// it until an ID is [`Ready`](IdGenStatus::Ready), but callers that must not
/// block (event loops, async executors) can drive the loop themselves.
///
/// # Example
///
/// ```
/// use nodeflake::{ClockBackoff, IdAllocator, IdGenStatus, TimeSource};
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1
///     }
/// }
///
/// let allocator = IdAllocator::with_clock(0, ClockBackoff::Fail, FixedTime)?;
/// match allocator.poll_id() {
///     IdGenStatus::Ready { id } => println!("ID: {id}"),
///     IdGenStatus::Pending { yield_for } => println!("retry in {yield_for}ms"),
///     IdGenStatus::ClockBehind { now, last } => println!("clock at {now}, last {last}"),
/// }
/// # Ok::<(), nodeflake::Error>(())
/// ```
///
/// [`IdAllocator::poll_id`]: crate::IdAllocator::poll_id
/// [`IdAllocator::generate`]: crate::IdAllocator::generate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdGenStatus {
    /// A unique ID was committed and is ready to use.
    Ready {
        /// The generated ID.
        id: SnowflakeId,
    },
    /// No ID was committed; try again.
    ///
    /// `yield_for` is `1` when the sequence is exhausted for the current
    /// millisecond, and `0` when another thread won the compare-and-swap and
    /// the attempt can be repeated right away.
    Pending {
        /// Milliseconds to wait before the next attempt can succeed.
        yield_for: u64,
    },
    /// The clock reads earlier than the last issued timestamp.
    ///
    /// Nothing was committed. Both values are milliseconds since the epoch.
    ClockBehind {
        /// The current clock reading.
        now: u64,
        /// The timestamp of the last issued ID.
        last: u64,
    },
}
