//! Vellum Join - join compilation and completeness analysis.
//!
//! A *join* declares one sink key pattern as a function of one or more
//! ordered source key patterns sharing slot names, so that when a source
//! row changes the derived sink row can be recomputed incrementally. This
//! crate compiles and validates joins over the pattern types of
//! `vellum-core`:
//!
//! - `Join`: sink + sources over one slot namespace, with the derived
//!   *completion source* (the last source needed to fully bind the sink)
//! - `ValueType`: the aggregation strategy tag (copy-last, count, min, max)
//! - `TableRegistry` / `SourceFactory`: the collaborator contracts through
//!   which a validated join constructs its runtime strategy objects
//!
//! # Example
//!
//! ```rust
//! use vellum_join::Join;
//!
//! // timeline entries are derived from posts of followed authors
//! let join = Join::parse(
//!     "tl|<user:5>|<seq:3> sub|<user:5>|<author:5> post|<author:5>|<seq:3>",
//! )
//! .unwrap();
//! assert_eq!(join.nsource(), 2);
//! assert_eq!(join.completion_source(), Some(1));
//! ```

#![no_std]

extern crate alloc;

mod join;
mod source;
mod table;

pub use join::Join;
pub use source::{SourceFactory, TableRegistry, ValueType};
pub use table::table_name;
