use core::time::Duration;
use std::sync::Arc;

/// The reference point all timestamps are measured from: Thursday, September
/// 30, 2021 18:00:00 UTC.
///
/// With a 41-bit millisecond timestamp, IDs stay sortable until roughly 2091.
/// Allocators whose IDs must sort against each other have to share this
/// epoch.
pub const EPOCH: Duration = Duration::from_millis(1_633_024_800_000);

/// A source of millisecond timestamps relative to some epoch.
///
/// Allocators read the clock once per generation attempt. Implement this to
/// plug in a custom clock or a fake one in tests.
///
/// # Example
///
/// ```
/// use nodeflake::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1234
///     }
/// }
///
/// assert_eq!(FixedTime.current_millis(), 1234);
/// ```
pub trait TimeSource {
    /// Returns the current time in milliseconds since the configured epoch.
    fn current_millis(&self) -> u64;
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for Arc<T> {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }
}
