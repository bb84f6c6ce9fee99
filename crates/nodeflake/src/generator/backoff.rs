use core::fmt;

/// What [`IdAllocator::generate`] does when the clock moves backward.
///
/// [`IdAllocator::generate`]: crate::IdAllocator::generate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ClockBackoff {
    /// Block the calling thread until the clock catches up with the last
    /// issued timestamp, then retry. IDs stay monotonic; throughput drops for
    /// the length of the backward jump.
    #[default]
    Wait,
    /// Return [`Error::ClockMovedBackward`] immediately.
    ///
    /// [`Error::ClockMovedBackward`]: crate::Error::ClockMovedBackward
    Fail,
}

impl From<bool> for ClockBackoff {
    /// `true` allows waiting out the backward jump.
    fn from(allow_backoff: bool) -> Self {
        if allow_backoff { Self::Wait } else { Self::Fail }
    }
}

impl fmt::Display for ClockBackoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wait => f.write_str("wait"),
            Self::Fail => f.write_str("fail"),
        }
    }
}
