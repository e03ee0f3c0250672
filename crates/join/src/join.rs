//! Join compilation: a sink pattern derived from ordered source patterns.

use crate::source::{SourceFactory, TableRegistry, ValueType};
use crate::table::table_name;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;
use serde_json::Value;
use vellum_core::{Error, Match, Pattern, Result, SlotMap, JOIN_CAPACITY, SLOT_CAPACITY};

/// A compiled join: one sink pattern plus ordered source patterns sharing
/// a slot namespace.
///
/// The first pattern is the sink (output); the remaining patterns are the
/// sources, consulted in declared order. Compilation validates that every
/// pattern routes to a table and that the sources, processed in order,
/// eventually bind every sink slot, the invariant all derived views depend
/// on. A join that failed compilation must be discarded.
///
/// Once built, a join is immutable and may be read concurrently.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Join {
    pat: [Pattern; JOIN_CAPACITY],
    npat: usize,
    /// Index of the last source required to complete the sink's bindings;
    /// `None` when the sink references no slots. Set by `analyze`.
    completion_source: Option<usize>,
    value_type: ValueType,
}

impl Default for Join {
    fn default() -> Self {
        Self {
            pat: [Pattern::new(); JOIN_CAPACITY],
            npat: 0,
            completion_source: None,
            value_type: ValueType::default(),
        }
    }
}

impl Join {
    /// Creates an empty, unusable join; populate it with `assign_parse`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates a join description.
    pub fn parse(text: &str) -> Result<Join> {
        let mut join = Join::new();
        join.assign_parse(text)?;
        Ok(join)
    }

    /// Returns the sink (output) pattern.
    #[inline]
    pub fn sink(&self) -> &Pattern {
        &self.pat[0]
    }

    /// Returns source pattern `i`, in declared order.
    #[inline]
    pub fn source(&self, i: usize) -> &Pattern {
        &self.pat[1 + i]
    }

    /// Returns the number of source patterns.
    #[inline]
    pub fn nsource(&self) -> usize {
        self.npat.saturating_sub(1)
    }

    /// Returns the total number of patterns (sink + sources).
    #[inline]
    pub fn npat(&self) -> usize {
        self.npat
    }

    /// Returns the index of the last source whose processing is required
    /// before the sink's slots are guaranteed fully bound, or `None` when
    /// the sink references no slots at all.
    #[inline]
    pub fn completion_source(&self) -> Option<usize> {
        self.completion_source
    }

    /// Returns the join's value-type tag.
    #[inline]
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Sets the value-type tag. The join text format does not carry the
    /// tag; it arrives from the join description layer.
    pub fn set_value_type(&mut self, value_type: ValueType) {
        self.value_type = value_type;
    }

    /// Returns the sink's table name, resolvable for any validated join.
    pub fn sink_table_name(&self) -> Option<String> {
        let prefix = self.sink().expand_first(&Match::new());
        let name = table_name(&prefix)?;
        core::str::from_utf8(name).ok().map(String::from)
    }

    /// Parses a whitespace-separated list of pattern tokens: sink first,
    /// then the sources in order. All tokens share one slot namespace, so
    /// a slot name means the same variable wherever it appears. Ends by
    /// running `analyze`.
    ///
    /// On error the join's content is unspecified; discard it.
    pub fn assign_parse(&mut self, text: &str) -> Result<()> {
        let mut map = SlotMap::new();
        self.npat = 0;
        let bytes = text.as_bytes();
        let mut i = 0;
        loop {
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            let begin = i;
            while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if begin == i {
                self.analyze()?;
                log::debug!(
                    "compiled join: {} source(s), completion source {:?}",
                    self.nsource(),
                    self.completion_source
                );
                return Ok(());
            }
            if self.npat == JOIN_CAPACITY {
                return Err(Error::TooManyPatterns {
                    capacity: JOIN_CAPACITY,
                });
            }
            self.pat[self.npat].assign_parse(&text[begin..i], &mut map)?;
            // every pattern must route to a table before any slot is bound
            if table_name(&self.pat[self.npat].expand_first(&Match::new())).is_none() {
                return Err(Error::unresolvable_table(&text[begin..i]));
            }
            self.npat += 1;
        }
    }

    /// Completeness analysis: walks the sources in declared order, clearing
    /// each sink slot once a source references it *with the sink's exact
    /// length* (position does not matter), and records how far the walk had
    /// to go. Fails when fewer than two patterns are present or when some
    /// sink slot is never cleared.
    pub fn analyze(&mut self) -> Result<()> {
        if self.npat <= 1 {
            return Err(Error::TooFewPatterns { count: self.npat });
        }

        let mut need: u32 = 0;
        for s in 0..SLOT_CAPACITY {
            if self.sink().has_slot(s) {
                need |= 1 << s;
            }
        }

        self.completion_source = None;
        let mut idx = 0;
        while need != 0 {
            if idx == self.nsource() {
                return Err(Error::UnsatisfiableJoin {
                    slot: need.trailing_zeros() as usize,
                });
            }
            for s in 0..SLOT_CAPACITY {
                if self.source(idx).has_slot(s)
                    && self.source(idx).slot_length(s) == self.sink().slot_length(s)
                {
                    need &= !(1 << s);
                }
            }
            self.completion_source = Some(idx);
            idx += 1;
        }
        Ok(())
    }

    /// Constructs the source-range strategy matching this join's value
    /// type. All four constructors take the same arguments; the dispatch is
    /// exhaustive over the closed tag, so a validated join cannot reach an
    /// unknown strategy.
    pub fn make_source<R, F>(
        &self,
        factory: &mut F,
        server: &mut R,
        m: &Match<'_>,
        begin: &[u8],
        end: &[u8],
    ) -> F::Source
    where
        R: TableRegistry,
        F: SourceFactory<R>,
    {
        match self.value_type {
            ValueType::CopyLast => factory.copy_last(server, self, m, begin, end),
            ValueType::CountMatch => factory.count_match(server, self, m, begin, end),
            ValueType::MinLast => factory.min_last(server, self, m, begin, end),
            ValueType::MaxLast => factory.max_last(server, self, m, begin, end),
        }
    }

    /// Constructs the accumulator matching this join's value type, bound to
    /// the sink's table (created through the registry if needed). Copy-last
    /// keeps no running state, so it yields `None` (absence, not an error).
    pub fn make_accumulator<R, F>(&self, factory: &mut F, server: &mut R) -> Option<F::Accumulator>
    where
        R: TableRegistry,
        F: SourceFactory<R>,
    {
        if !self.value_type.has_accumulator() {
            return None;
        }
        let name = self.sink_table_name()?;
        let table = server.make_table(&name);
        match self.value_type {
            ValueType::CopyLast => None,
            ValueType::CountMatch => Some(factory.count_accumulator(table)),
            ValueType::MinLast => Some(factory.min_accumulator(table)),
            ValueType::MaxLast => Some(factory.max_accumulator(table)),
        }
    }

    /// Serializes the compiled join as an array of pattern arrays, sink
    /// first.
    pub fn unparse_json(&self) -> Value {
        let mut patterns = Vec::with_capacity(self.npat);
        for pat in &self.pat[..self.npat] {
            patterns.push(pat.unparse_json());
        }
        Value::Array(patterns)
    }

    /// Compact JSON rendering of `unparse_json()`.
    pub fn unparse(&self) -> String {
        self.unparse_json().to_string()
    }

    /// Rebuilds a join from its `unparse_json()` encoding and re-validates
    /// it. Slot identity survives through the positional slot numbers.
    pub fn from_unparse_json(value: &Value) -> Result<Join> {
        let patterns = value
            .as_array()
            .ok_or_else(|| Error::bad_json("join is not an array"))?;
        if patterns.len() > JOIN_CAPACITY {
            return Err(Error::TooManyPatterns {
                capacity: JOIN_CAPACITY,
            });
        }
        let mut join = Join::new();
        for pattern in patterns {
            join.pat[join.npat] = Pattern::from_unparse_json(pattern)?;
            join.npat += 1;
        }
        join.analyze()?;
        Ok(join)
    }
}

impl fmt::Display for Join {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.unparse())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_analyze_rejects_single_pattern() {
        assert_eq!(
            Join::parse("t|<a:3>"),
            Err(Error::TooFewPatterns { count: 1 })
        );
        assert_eq!(Join::parse("  "), Err(Error::TooFewPatterns { count: 0 }));
    }

    #[test]
    fn test_completion_source_spans_two_sources() {
        let join = Join::parse("s|<a:3>|<b:4> t|<a:3> u|<b:4>").unwrap();
        assert_eq!(join.nsource(), 2);
        assert_eq!(join.completion_source(), Some(1));
    }

    #[test]
    fn test_completion_source_single_source() {
        let join = Join::parse("s|<a:3>|<b:4> t|<b:4>|<a:3> u|<a:3>").unwrap();
        // source 0 already binds both sink slots; source 2 is not needed
        assert_eq!(join.completion_source(), Some(0));
    }

    #[test]
    fn test_length_mismatch_fails_analysis() {
        // built through the JSON decoder, which has no shared name map, so
        // the length disagreement reaches analyze() instead of the parser
        let join = Join::from_unparse_json(&json!([
            ["s|", [1, 3], "|", [2, 4]],
            ["t|", [1, 3]],
            ["u|", [2, 5]],
        ]));
        assert_eq!(join.unwrap_err(), Error::UnsatisfiableJoin { slot: 1 });
    }

    #[test]
    fn test_unbound_sink_slot_fails() {
        assert_eq!(
            Join::parse("s|<a:3>|<b:4> t|<a:3>"),
            Err(Error::UnsatisfiableJoin { slot: 1 })
        );
    }

    #[test]
    fn test_unresolvable_table_fails() {
        assert_eq!(
            Join::parse("nodelimiter t|<a:3>"),
            Err(Error::unresolvable_table("nodelimiter"))
        );
        // table prefix must be literal: a leading slot cannot route
        assert_eq!(
            Join::parse("s|<a:3> <a:3>|x"),
            Err(Error::unresolvable_table("<a:3>|x"))
        );
    }

    #[test]
    fn test_too_many_patterns() {
        let mut text = String::from("s|<a:3>");
        for _ in 0..JOIN_CAPACITY {
            text.push_str(" t|<a:3>");
        }
        assert_eq!(
            Join::parse(&text),
            Err(Error::TooManyPatterns {
                capacity: JOIN_CAPACITY
            })
        );
    }

    #[test]
    fn test_shared_namespace_across_patterns() {
        let join = Join::parse("s|<a:3>|<b:4> t|<b:4>|<a>").unwrap();
        // `a` keeps index 0 and length 3 in the source even though the
        // source references it by name only, at a different offset
        assert_eq!(join.source(0).slot_length(0), 3);
        assert_eq!(join.source(0).slot_position(0), 2 + 4 + 1);
        assert_eq!(join.completion_source(), Some(0));
    }

    #[test]
    fn test_sink_table_name() {
        let join = Join::parse("sink|<a:3> src|<a:3>").unwrap();
        assert_eq!(join.sink_table_name().as_deref(), Some("sink"));
    }

    #[test]
    fn test_value_type_round_trip() {
        let mut join = Join::parse("s|<a:3> t|<a:3>").unwrap();
        assert_eq!(join.value_type(), ValueType::CopyLast);
        join.set_value_type(ValueType::CountMatch);
        assert_eq!(join.value_type(), ValueType::CountMatch);
    }

    #[test]
    fn test_json_round_trip() {
        let join = Join::parse("s|<a:3>|<b:4> t|<a:3> u|<b:4>").unwrap();
        let back = Join::from_unparse_json(&join.unparse_json()).unwrap();
        assert_eq!(back.npat(), join.npat());
        assert_eq!(back.completion_source(), join.completion_source());
        assert_eq!(back.unparse(), join.unparse());
        assert_eq!(
            join.unparse_json(),
            json!([
                ["s|", [1, 3], "|", [2, 4]],
                ["t|", [1, 3]],
                ["u|", [2, 4]],
            ])
        );
    }
}
