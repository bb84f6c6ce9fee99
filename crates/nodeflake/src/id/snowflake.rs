use core::{fmt, num::ParseIntError, num::TryFromIntError, str::FromStr};

use crate::ParsedId;

/// A 64-bit time-ordered identifier.
///
/// - 1 bit reserved (always zero for generated IDs)
/// - 41 bits timestamp (ms since [`EPOCH`])
/// - 10 bits node ID
/// - 12 bits sequence
///
/// ```text
///  Bit Index:  63           63 62            22 21          12 11             0
///              +--------------+----------------+--------------+---------------+
///  Field:      | reserved (1) | timestamp (41) | node ID (10) | sequence (12) |
///              +--------------+----------------+--------------+---------------+
///              |<----------- MSB --------- 64 bits ---------- LSB ----------->|
/// ```
///
/// Because the timestamp occupies the most significant bits, IDs compare in
/// the order they were issued.
///
/// [`EPOCH`]: crate::EPOCH
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "i64", into = "i64")
)]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct SnowflakeId {
    id: u64,
}

impl SnowflakeId {
    /// Width of the timestamp field.
    pub const TIMESTAMP_BITS: u32 = 41;

    /// Width of the node ID field.
    pub const NODE_ID_BITS: u32 = 10;

    /// Width of the sequence field.
    pub const SEQUENCE_BITS: u32 = 12;

    /// Bitmask for the 41-bit timestamp field. Occupies bits 22 through 62.
    pub const TIMESTAMP_MASK: u64 = (1 << Self::TIMESTAMP_BITS) - 1;

    /// Bitmask for the 10-bit node ID field. Occupies bits 12 through 21.
    pub const NODE_ID_MASK: u64 = (1 << Self::NODE_ID_BITS) - 1;

    /// Bitmask for the 12-bit sequence field. Occupies bits 0 through 11.
    pub const SEQUENCE_MASK: u64 = (1 << Self::SEQUENCE_BITS) - 1;

    /// Number of bits to shift the timestamp to its position (bit 22).
    pub const TIMESTAMP_SHIFT: u32 = Self::NODE_ID_BITS + Self::SEQUENCE_BITS;

    /// Number of bits to shift the node ID to its position (bit 12).
    pub const NODE_ID_SHIFT: u32 = Self::SEQUENCE_BITS;

    /// Number of bits to shift the sequence field (bit 0).
    pub const SEQUENCE_SHIFT: u32 = 0;

    const RESERVED_BIT: u64 = 1 << 63;

    /// Packs the three components into an ID.
    ///
    /// Each component is truncated to its field width.
    pub const fn from_components(timestamp: u64, node_id: u64, sequence: u64) -> Self {
        let timestamp = (timestamp & Self::TIMESTAMP_MASK) << Self::TIMESTAMP_SHIFT;
        let node_id = (node_id & Self::NODE_ID_MASK) << Self::NODE_ID_SHIFT;
        let sequence = (sequence & Self::SEQUENCE_MASK) << Self::SEQUENCE_SHIFT;
        Self {
            id: timestamp | node_id | sequence,
        }
    }

    /// Wraps a raw value without any validation.
    pub const fn from_raw(raw: u64) -> Self {
        Self { id: raw }
    }

    /// Returns the raw packed value.
    pub const fn to_raw(&self) -> u64 {
        self.id
    }

    /// Milliseconds since the epoch at which this ID was issued.
    pub const fn timestamp(&self) -> u64 {
        (self.id >> Self::TIMESTAMP_SHIFT) & Self::TIMESTAMP_MASK
    }

    /// The node ID of the allocator that issued this ID.
    pub const fn node_id(&self) -> u64 {
        (self.id >> Self::NODE_ID_SHIFT) & Self::NODE_ID_MASK
    }

    /// The per-millisecond sequence number.
    pub const fn sequence(&self) -> u64 {
        (self.id >> Self::SEQUENCE_SHIFT) & Self::SEQUENCE_MASK
    }

    /// Returns the maximum possible value for the timestamp field.
    pub const fn max_timestamp() -> u64 {
        Self::TIMESTAMP_MASK
    }

    /// Returns the maximum possible value for the node ID field.
    pub const fn max_node_id() -> u64 {
        Self::NODE_ID_MASK
    }

    /// Returns the maximum possible value for the sequence field.
    pub const fn max_sequence() -> u64 {
        Self::SEQUENCE_MASK
    }

    /// Returns `true` if the reserved (sign) bit is clear.
    ///
    /// Every ID produced by an allocator is valid. An invalid value still
    /// decodes, but it cannot be represented as a non-negative `i64`.
    pub const fn is_valid(&self) -> bool {
        self.id & Self::RESERVED_BIT == 0
    }

    /// Decodes the ID against the default epoch.
    pub fn parse(self) -> ParsedId {
        ParsedId::from(self)
    }

    /// Returns the ID as a zero-padded 20-digit string, so that string order
    /// matches numeric order.
    pub fn to_padded_string(&self) -> String {
        format!("{:020}", self.id)
    }

    pub(crate) const fn has_sequence_room(&self) -> bool {
        self.sequence() < Self::max_sequence()
    }

    pub(crate) const fn increment_sequence(&self) -> Self {
        Self::from_components(self.timestamp(), self.node_id(), self.sequence() + 1)
    }

    pub(crate) const fn rollover_to_timestamp(&self, timestamp: u64) -> Self {
        Self::from_components(timestamp, self.node_id(), 0)
    }
}

impl From<u64> for SnowflakeId {
    fn from(raw: u64) -> Self {
        Self::from_raw(raw)
    }
}

impl From<SnowflakeId> for u64 {
    fn from(id: SnowflakeId) -> Self {
        id.to_raw()
    }
}

impl TryFrom<i64> for SnowflakeId {
    type Error = TryFromIntError;

    /// Rejects negative values, i.e. values with the reserved bit set.
    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        u64::try_from(raw).map(Self::from_raw)
    }
}

impl From<SnowflakeId> for i64 {
    /// Reinterprets the bits as a signed integer. The result is negative only
    /// for IDs that are not [`valid`](SnowflakeId::is_valid).
    fn from(id: SnowflakeId) -> Self {
        id.to_raw() as i64
    }
}

impl FromStr for SnowflakeId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>().map(Self::from_raw)
    }
}

impl fmt::Display for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnowflakeId")
            .field("id", &self.id)
            .field("timestamp", &self.timestamp())
            .field("node_id", &self.node_id())
            .field("sequence", &self.sequence())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_field_widths() {
        assert_eq!(SnowflakeId::TIMESTAMP_SHIFT, 22);
        assert_eq!(SnowflakeId::NODE_ID_SHIFT, 12);
        assert_eq!(SnowflakeId::max_node_id(), 1023);
        assert_eq!(SnowflakeId::max_sequence(), 4095);
        assert_eq!(SnowflakeId::max_timestamp(), (1 << 41) - 1);
        assert_eq!(
            SnowflakeId::TIMESTAMP_BITS + SnowflakeId::NODE_ID_BITS + SnowflakeId::SEQUENCE_BITS,
            63
        );
    }

    #[test]
    fn packs_components_into_expected_bits() {
        let id = SnowflakeId::from_components(5, 3, 7);
        assert_eq!(id.to_raw(), (5 << 22) | (3 << 12) | 7);
        assert_eq!(id.timestamp(), 5);
        assert_eq!(id.node_id(), 3);
        assert_eq!(id.sequence(), 7);
    }

    #[test]
    fn oversized_components_are_truncated() {
        let id = SnowflakeId::from_components(u64::MAX, 1024 + 9, 4096 + 1);
        assert_eq!(id.timestamp(), SnowflakeId::max_timestamp());
        assert_eq!(id.node_id(), 9);
        assert_eq!(id.sequence(), 1);
        assert!(id.is_valid());
    }

    #[test]
    fn max_components_fill_every_field() {
        let id = SnowflakeId::from_components(
            SnowflakeId::max_timestamp(),
            SnowflakeId::max_node_id(),
            SnowflakeId::max_sequence(),
        );
        assert_eq!(id.to_raw(), i64::MAX as u64);
        assert_eq!(i64::from(id), i64::MAX);
    }

    #[test]
    fn ordering_follows_timestamp_then_sequence() {
        let early = SnowflakeId::from_components(10, 1023, 4095);
        let later = SnowflakeId::from_components(11, 0, 0);
        assert!(early < later);

        let first = SnowflakeId::from_components(10, 4, 0);
        let second = first.increment_sequence();
        assert!(first < second);
        assert_eq!(second.sequence(), 1);
        assert_eq!(second.node_id(), 4);
    }

    #[test]
    fn rollover_resets_sequence_and_keeps_node() {
        let id = SnowflakeId::from_components(10, 42, SnowflakeId::max_sequence());
        assert!(!id.has_sequence_room());

        let next = id.rollover_to_timestamp(11);
        assert_eq!(next.timestamp(), 11);
        assert_eq!(next.node_id(), 42);
        assert_eq!(next.sequence(), 0);
    }

    #[test]
    fn signed_conversion_rejects_reserved_bit() {
        assert!(SnowflakeId::try_from(-1_i64).is_err());
        let id = SnowflakeId::try_from(12_345_i64).unwrap();
        assert_eq!(id.to_raw(), 12_345);

        let invalid = SnowflakeId::from_raw(1 << 63);
        assert!(!invalid.is_valid());
        assert!(i64::from(invalid) < 0);
    }

    #[test]
    fn decimal_string_forms() {
        let id: SnowflakeId = "4194304".parse().unwrap();
        assert_eq!(id.timestamp(), 1);
        assert_eq!(id.to_string(), "4194304");
        assert_eq!(id.to_padded_string(), "00000000000004194304");
        assert_eq!(id.to_padded_string().len(), 20);
        assert!("not-a-number".parse::<SnowflakeId>().is_err());
    }

    #[test]
    fn debug_lists_decoded_fields() {
        let id = SnowflakeId::from_components(2, 3, 4);
        let debug = format!("{id:?}");
        assert!(debug.contains("timestamp: 2"));
        assert!(debug.contains("node_id: 3"));
        assert!(debug.contains("sequence: 4"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_uses_native_integer() {
        let id = SnowflakeId::from_components(1, 2, 3);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, id.to_raw().to_string());

        let back: SnowflakeId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);

        assert!(serde_json::from_str::<SnowflakeId>("-5").is_err());
    }
}
