//! Error types for pattern and join validation.

use alloc::string::String;
use core::fmt;

/// Result type alias for Vellum operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error types for pattern parsing, join parsing and join analysis.
///
/// Every variant is a recoverable validation outcome: a failed parse leaves
/// the pattern or join in an unspecified state and the caller discards it,
/// but the process never aborts on malformed input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Empty slot name inside `<...>`.
    MalformedName,
    /// First use of a slot name without a `:length` description.
    NoLengthDescription {
        name: String,
    },
    /// `:` not followed by a decimal digit, or the length does not fit a byte.
    MalformedLength {
        name: String,
    },
    /// Slot reference not closed by `>` before end of input.
    UnterminatedSlot,
    /// Slot namespace full, or a first use declared with length 0.
    SlotCapacity {
        name: String,
    },
    /// A slot name re-declared with a different length.
    LengthMismatch {
        name: String,
        expected: usize,
        got: usize,
    },
    /// Encoded pattern is at capacity.
    PatternCapacity,
    /// Literal byte outside the 7-bit range.
    LiteralOutOfRange {
        byte: u8,
    },
    /// Second reference to the same slot index within one pattern.
    DuplicateSlot {
        slot: usize,
    },
    /// Slot index at or above `SLOT_CAPACITY`.
    SlotOutOfRange {
        slot: usize,
    },
    /// Slot appended with length 0.
    ZeroSlotLength {
        slot: usize,
    },
    /// A pattern whose expanded prefix names no table.
    UnresolvableTable {
        pattern: String,
    },
    /// A join needs a sink plus at least one source.
    TooFewPatterns {
        count: usize,
    },
    /// A join with more patterns than `JOIN_CAPACITY`.
    TooManyPatterns {
        capacity: usize,
    },
    /// A sink slot that no source binds with a matching length.
    UnsatisfiableJoin {
        slot: usize,
    },
    /// Malformed compiled-pattern JSON.
    BadJson {
        message: String,
    },
    /// Unrecognized value-type name in textual input.
    UnknownValueType {
        name: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MalformedName => {
                write!(f, "Malformed slot name")
            }
            Error::NoLengthDescription { name } => {
                write!(f, "No length description for slot: {}", name)
            }
            Error::MalformedLength { name } => {
                write!(f, "Malformed length description for slot: {}", name)
            }
            Error::UnterminatedSlot => {
                write!(f, "Slot reference not terminated by '>'")
            }
            Error::SlotCapacity { name } => {
                write!(f, "Slot capacity reached at slot: {}", name)
            }
            Error::LengthMismatch {
                name,
                expected,
                got,
            } => {
                write!(
                    f,
                    "Slot {} redefined with length {} (was {})",
                    name, got, expected
                )
            }
            Error::PatternCapacity => {
                write!(f, "Pattern capacity reached")
            }
            Error::LiteralOutOfRange { byte } => {
                write!(f, "Literal byte out of 7-bit range: {:#04x}", byte)
            }
            Error::DuplicateSlot { slot } => {
                write!(f, "Slot {} already used in this pattern", slot)
            }
            Error::SlotOutOfRange { slot } => {
                write!(f, "Slot index out of range: {}", slot)
            }
            Error::ZeroSlotLength { slot } => {
                write!(f, "Slot {} appended with zero length", slot)
            }
            Error::UnresolvableTable { pattern } => {
                write!(f, "No table resolvable for pattern: {}", pattern)
            }
            Error::TooFewPatterns { count } => {
                write!(f, "Join needs a sink and at least one source, got {}", count)
            }
            Error::TooManyPatterns { capacity } => {
                write!(f, "Join pattern capacity reached: {}", capacity)
            }
            Error::UnsatisfiableJoin { slot } => {
                write!(f, "No source completes sink slot {}", slot)
            }
            Error::BadJson { message } => {
                write!(f, "Bad compiled-pattern JSON: {}", message)
            }
            Error::UnknownValueType { name } => {
                write!(f, "Unknown value type: {}", name)
            }
        }
    }
}

impl Error {
    /// Creates a missing-length error for a slot's first use.
    pub fn no_length_description(name: impl Into<String>) -> Self {
        Error::NoLengthDescription { name: name.into() }
    }

    /// Creates a malformed-length error.
    pub fn malformed_length(name: impl Into<String>) -> Self {
        Error::MalformedLength { name: name.into() }
    }

    /// Creates a slot-capacity error.
    pub fn slot_capacity(name: impl Into<String>) -> Self {
        Error::SlotCapacity { name: name.into() }
    }

    /// Creates a length-redefinition error.
    pub fn length_mismatch(name: impl Into<String>, expected: usize, got: usize) -> Self {
        Error::LengthMismatch {
            name: name.into(),
            expected,
            got,
        }
    }

    /// Creates an unresolvable-table error.
    pub fn unresolvable_table(pattern: impl Into<String>) -> Self {
        Error::UnresolvableTable {
            pattern: pattern.into(),
        }
    }

    /// Creates a bad-JSON error.
    pub fn bad_json(message: impl Into<String>) -> Self {
        Error::BadJson {
            message: message.into(),
        }
    }
}
