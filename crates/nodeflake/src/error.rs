/// A result type defaulting to this crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All errors `nodeflake` can report.
///
/// CAS contention and sequence exhaustion are resolved internally by retrying
/// and never surface here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The node ID passed at construction does not fit the 10-bit node
    /// field.
    ///
    /// The allocator was not created and must not be used.
    #[error("node ID {node_id} is out of range (expected 0..={max})")]
    InvalidNodeId {
        /// The rejected node ID.
        node_id: i64,
        /// The largest accepted node ID.
        max: u64,
    },

    /// The clock reported a time earlier than the last issued timestamp and
    /// the allocator was built with [`ClockBackoff::Fail`].
    ///
    /// Both values are milliseconds since the allocator's epoch. The
    /// allocator state is left untouched, so the call may simply be retried
    /// later.
    ///
    /// [`ClockBackoff::Fail`]: crate::ClockBackoff::Fail
    #[error("clock moved backward: now {now}ms is behind last issued {last}ms")]
    ClockMovedBackward {
        /// The clock reading that triggered the failure.
        now: u64,
        /// The timestamp of the last issued identifier.
        last: u64,
    },
}
