//! Lock-free, time-ordered 64-bit identifiers.
//!
//! An [`IdAllocator`] hands out [`SnowflakeId`]s laid out as
//!
//! ```text
//!  Bit Index:  63           63 62            22 21          12 11             0
//!              +--------------+----------------+--------------+---------------+
//!  Field:      | reserved (1) | timestamp (41) | node ID (10) | sequence (12) |
//!              +--------------+----------------+--------------+---------------+
//! ```
//!
//! where the timestamp counts milliseconds since [`EPOCH`]. Any number of
//! threads may call [`IdAllocator::generate`] on the same allocator; the last
//! issued timestamp and sequence live in a single atomic word, so every commit
//! is one compare-and-swap.
//!
//! ```
//! use nodeflake::{ClockBackoff, IdAllocator, parse_id};
//!
//! let allocator = IdAllocator::new(7, ClockBackoff::Wait)?;
//! let id = allocator.generate()?;
//!
//! let parsed = parse_id(id.into());
//! assert_eq!(parsed.node_id, 7);
//! # Ok::<(), nodeflake::Error>(())
//! ```
//!
//! ## Features
//!
//! - `tracing`: emit `tracing` events for clock regressions and trace spans
//!   around each generation attempt.
//! - `serde`: `Serialize`/`Deserialize` for [`SnowflakeId`] and [`ParsedId`].
//! - `cache-padded`: pad the allocator state to a cache line to avoid false
//!   sharing when many allocators sit next to each other in memory.

mod error;
mod generator;
mod id;
mod time;

pub use crate::error::*;
pub use crate::generator::*;
pub use crate::id::*;
pub use crate::time::*;
