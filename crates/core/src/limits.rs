//! Capacity limits for patterns and joins.
//!
//! All bounds are small compile-time constants; nothing in this crate
//! grows dynamically past them.

/// Maximum number of distinct slots per pattern, and per join slot namespace.
///
/// Slot indices fit in the high bits of an encoded pattern byte
/// (`128 + index`), and the completeness analysis packs one bit per slot
/// into a `u32` mask, so this must stay well below both 128 and 32.
pub const SLOT_CAPACITY: usize = 8;

/// Maximum encoded length of a pattern, in bytes.
///
/// Each literal byte and each slot reference occupies one encoded byte.
pub const PATTERN_CAPACITY: usize = 32;

/// Maximum number of patterns per join (one sink plus sources).
pub const JOIN_CAPACITY: usize = 8;
