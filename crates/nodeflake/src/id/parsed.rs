use core::time::Duration;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{EPOCH, SnowflakeId};

/// The decoded components of a [`SnowflakeId`].
///
/// Decoding never fails: the format carries no checksum, so any 64-bit value
/// yields a structurally valid triple. Values that were never issued by an
/// allocator decode to meaningless but well-formed components.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ParsedId {
    /// Unix time of issue, in milliseconds.
    pub timestamp_ms: u64,
    /// Node ID of the issuing allocator, in `0..=1023`.
    pub node_id: u16,
    /// Sequence within the millisecond, in `0..=4095`.
    pub sequence: u16,
}

impl ParsedId {
    /// Decodes `id` against a custom `epoch` instead of [`EPOCH`].
    pub fn with_epoch(id: SnowflakeId, epoch: Duration) -> Self {
        let epoch_ms = u64::try_from(epoch.as_millis()).unwrap_or(u64::MAX);
        Self {
            timestamp_ms: epoch_ms.saturating_add(id.timestamp()),
            // Both fields are masked to 10 and 12 bits.
            node_id: id.node_id() as u16,
            sequence: id.sequence() as u16,
        }
    }

    /// The issue time as a [`SystemTime`].
    pub fn system_time(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_millis(self.timestamp_ms)
    }
}

impl From<SnowflakeId> for ParsedId {
    fn from(id: SnowflakeId) -> Self {
        Self::with_epoch(id, EPOCH)
    }
}

/// Decodes an identifier into its Unix-millisecond timestamp, node ID, and
/// sequence.
///
/// The reserved bit is masked off, so negative inputs decode like their
/// unsigned bit pattern.
///
/// ```
/// use nodeflake::{EPOCH, SnowflakeId, parse_id};
///
/// let id = SnowflakeId::from_components(1_000, 12, 3);
/// let parsed = parse_id(id.into());
///
/// assert_eq!(parsed.timestamp_ms, EPOCH.as_millis() as u64 + 1_000);
/// assert_eq!(parsed.node_id, 12);
/// assert_eq!(parsed.sequence, 3);
/// ```
pub fn parse_id(id: i64) -> ParsedId {
    ParsedId::from(SnowflakeId::from_raw(id as u64))
}
