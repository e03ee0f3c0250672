//! Vellum Core - Key patterns and slot bindings for the Vellum view cache.
//!
//! Keys in the underlying key-value store are structured strings made of
//! literal bytes interleaved with named variable-length fields ("slots").
//! This crate provides the foundational types for working with them:
//!
//! - `Pattern`: a compiled key template (literal runs + slot references)
//! - `Match`: a transient binding of byte ranges to slots, with a
//!   narrowing merge operator
//! - `SlotMap`: the slot-name namespace shared across the patterns of
//!   one join while they are parsed
//! - `Error`: error types for pattern and join validation
//!
//! # Example
//!
//! ```rust
//! use vellum_core::{Match, Pattern};
//!
//! let pat = Pattern::parse("post|<author:5>|<seq:3>").unwrap();
//! assert_eq!(pat.key_length(), "post|".len() + 5 + 1 + 3);
//!
//! let mut m = Match::default();
//! assert!(pat.match_key(b"post|alice|017", &mut m));
//! assert_eq!(m.slot(0), b"alice");
//! assert_eq!(m.slot(1), b"017");
//! ```

#![no_std]

extern crate alloc;

mod error;
mod limits;
mod matching;
mod pattern;
mod slotmap;

pub use error::{Error, Result};
pub use limits::{JOIN_CAPACITY, PATTERN_CAPACITY, SLOT_CAPACITY};
pub use matching::Match;
pub use pattern::Pattern;
pub use slotmap::SlotMap;
