//! Value types and the factory seam to the runtime aggregation layer.
//!
//! A validated join derives its sink value from matching source events by
//! one of four strategies, selected by the join's [`ValueType`] tag. The
//! strategy objects themselves (source ranges walking matching source rows,
//! and accumulators holding running aggregate state) live in the runtime
//! execution layer; this module only defines the collaborator contracts
//! through which [`Join`](crate::Join) constructs them.

use core::str::FromStr;
use vellum_core::Error;

/// How a sink value is derived from matching source events.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ValueType {
    /// The sink takes the value of the last matching source row.
    #[default]
    CopyLast,
    /// The sink counts matching source rows.
    CountMatch,
    /// The sink keeps the minimum of the last-seen source values.
    MinLast,
    /// The sink keeps the maximum of the last-seen source values.
    MaxLast,
}

impl ValueType {
    /// Returns the textual tag used in join descriptions.
    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::CopyLast => "copy_last",
            ValueType::CountMatch => "count_match",
            ValueType::MinLast => "min_last",
            ValueType::MaxLast => "max_last",
        }
    }

    /// Returns true if this value type maintains running aggregate state.
    pub fn has_accumulator(self) -> bool {
        !matches!(self, ValueType::CopyLast)
    }
}

impl FromStr for ValueType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "copy_last" => Ok(ValueType::CopyLast),
            "count_match" => Ok(ValueType::CountMatch),
            "min_last" => Ok(ValueType::MinLast),
            "max_last" => Ok(ValueType::MaxLast),
            _ => Err(Error::UnknownValueType { name: s.into() }),
        }
    }
}

/// Get-or-create access to the tables of the underlying store.
///
/// Accumulators are bound to the sink's table, which is created on first
/// use; this is the only way the join core touches table state.
pub trait TableRegistry {
    /// The store's table handle.
    type Table;

    /// Returns the named table, creating it if it does not exist.
    fn make_table(&mut self, name: &str) -> &mut Self::Table;
}

/// Constructors for the per-value-type strategy objects.
///
/// [`Join::make_source`](crate::Join::make_source) and
/// [`Join::make_accumulator`](crate::Join::make_accumulator) dispatch on the
/// join's tag to exactly one of these; every constructor for a source range
/// receives the same arguments. Adding a value type means extending both
/// this trait and the dispatch in `Join`, so the two are kept colocated.
pub trait SourceFactory<R: TableRegistry> {
    /// A source range walking the matching rows of one source pattern.
    type Source;
    /// Running aggregate state for count/min/max joins.
    type Accumulator;

    /// Copy-last source range over `[begin, end)`.
    fn copy_last(
        &mut self,
        server: &mut R,
        join: &crate::Join,
        m: &vellum_core::Match<'_>,
        begin: &[u8],
        end: &[u8],
    ) -> Self::Source;

    /// Count-match source range over `[begin, end)`.
    fn count_match(
        &mut self,
        server: &mut R,
        join: &crate::Join,
        m: &vellum_core::Match<'_>,
        begin: &[u8],
        end: &[u8],
    ) -> Self::Source;

    /// Min-last source range over `[begin, end)`.
    fn min_last(
        &mut self,
        server: &mut R,
        join: &crate::Join,
        m: &vellum_core::Match<'_>,
        begin: &[u8],
        end: &[u8],
    ) -> Self::Source;

    /// Max-last source range over `[begin, end)`.
    fn max_last(
        &mut self,
        server: &mut R,
        join: &crate::Join,
        m: &vellum_core::Match<'_>,
        begin: &[u8],
        end: &[u8],
    ) -> Self::Source;

    /// Count accumulator bound to the sink's table.
    fn count_accumulator(&mut self, table: &mut R::Table) -> Self::Accumulator;

    /// Min accumulator bound to the sink's table.
    fn min_accumulator(&mut self, table: &mut R::Table) -> Self::Accumulator;

    /// Max accumulator bound to the sink's table.
    fn max_accumulator(&mut self, table: &mut R::Table) -> Self::Accumulator;
}
