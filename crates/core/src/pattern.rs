//! Compiled key templates: literal runs interleaved with slot references.
//!
//! # Pattern mini-language
//!
//! A pattern is written as a sequence of literal 7-bit characters and slot
//! references:
//!
//! - `<name:N>`: reference to slot `name`, declaring its byte length `N`
//!   (required on the first use of a name within a slot namespace)
//! - `<name>`: reference to an already-declared slot
//!
//! Example: `post|<author:5>|<seq:3>` expands to keys such as
//! `post|alice|017`.
//!
//! # Compiled form
//!
//! The compiled pattern is a byte sequence where values below 128 are
//! literal characters and `128 + i` marks a reference to slot `i`, plus
//! per-slot metadata (byte length and offset within the expanded key).
//! Patterns are built once by parsing and immutable afterwards.

use crate::error::{Error, Result};
use crate::limits::{PATTERN_CAPACITY, SLOT_CAPACITY};
use crate::matching::Match;
use crate::slotmap::SlotMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;
use serde_json::{json, Value};

/// A compiled key template.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pattern {
    /// Encoded bytes: literals < 128, slot markers = 128 + index.
    pat: [u8; PATTERN_CAPACITY],
    /// Number of encoded bytes in use.
    plen: usize,
    /// Expanded key length: literals count 1, slots count their length.
    klen: usize,
    /// Per-slot byte length; 0 = slot unused in this pattern.
    slotlen: [usize; SLOT_CAPACITY],
    /// Per-slot offset within the expanded key.
    slotpos: [usize; SLOT_CAPACITY],
}

impl Pattern {
    /// Creates an empty pattern.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a standalone pattern with a private slot namespace.
    pub fn parse(text: &str) -> Result<Pattern> {
        let mut map = SlotMap::new();
        let mut pat = Pattern::new();
        pat.assign_parse(text, &mut map)?;
        Ok(pat)
    }

    /// Returns the expanded key length.
    #[inline]
    pub fn key_length(&self) -> usize {
        self.klen
    }

    /// Returns the number of encoded bytes.
    #[inline]
    pub fn pattern_length(&self) -> usize {
        self.plen
    }

    /// Returns true if this pattern references the given slot.
    #[inline]
    pub fn has_slot(&self, slot: usize) -> bool {
        self.slotlen[slot] != 0
    }

    /// Returns the byte length of a slot (0 if unused here).
    #[inline]
    pub fn slot_length(&self, slot: usize) -> usize {
        self.slotlen[slot]
    }

    /// Returns a slot's offset within the expanded key.
    #[inline]
    pub fn slot_position(&self, slot: usize) -> usize {
        self.slotpos[slot]
    }

    /// Appends one literal byte. The byte must be 7-bit ASCII.
    pub fn append_literal(&mut self, byte: u8) -> Result<()> {
        if byte >= 128 {
            return Err(Error::LiteralOutOfRange { byte });
        }
        if self.plen == PATTERN_CAPACITY {
            return Err(Error::PatternCapacity);
        }
        self.pat[self.plen] = byte;
        self.plen += 1;
        self.klen += 1;
        Ok(())
    }

    /// Appends a reference to slot `slot` with byte length `length`.
    ///
    /// A slot may appear at most once per pattern, and its offset is the
    /// expanded key length accumulated before this append.
    pub fn append_slot(&mut self, slot: usize, length: usize) -> Result<()> {
        if self.plen == PATTERN_CAPACITY {
            return Err(Error::PatternCapacity);
        }
        if slot >= SLOT_CAPACITY {
            return Err(Error::SlotOutOfRange { slot });
        }
        if self.has_slot(slot) {
            return Err(Error::DuplicateSlot { slot });
        }
        if length == 0 {
            return Err(Error::ZeroSlotLength { slot });
        }
        self.slotlen[slot] = length;
        self.slotpos[slot] = self.klen;
        self.pat[self.plen] = 128 + slot as u8;
        self.plen += 1;
        self.klen += length;
        Ok(())
    }

    /// Resets this pattern and parses `text` against a shared slot namespace.
    ///
    /// On error the pattern's content is unspecified; discard it rather than
    /// retrying in place.
    pub fn assign_parse(&mut self, text: &str, map: &mut SlotMap) -> Result<()> {
        *self = Pattern::new();
        let bytes = text.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] != b'<' {
                self.append_literal(bytes[i])?;
                i += 1;
                continue;
            }
            // slot reference: name up to ':' or '>'
            i += 1;
            let name0 = i;
            while i < bytes.len() && bytes[i] != b':' && bytes[i] != b'>' {
                i += 1;
            }
            if i == bytes.len() {
                return Err(Error::UnterminatedSlot);
            }
            if i == name0 {
                return Err(Error::MalformedName);
            }
            let name = &text[name0..i];
            let known = map.get(name);
            if bytes[i] != b':' && known.is_none() {
                return Err(Error::no_length_description(name));
            }
            // optional explicit length
            let mut len = 0usize;
            if bytes[i] == b':' {
                if i + 1 == bytes.len() || !bytes[i + 1].is_ascii_digit() {
                    return Err(Error::malformed_length(name));
                }
                i += 1;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    len = 10 * len + (bytes[i] - b'0') as usize;
                    if len > 255 {
                        return Err(Error::malformed_length(name));
                    }
                    i += 1;
                }
            }
            if i == bytes.len() || bytes[i] != b'>' {
                return Err(Error::UnterminatedSlot);
            }
            i += 1;
            // resolve the slot, registering first uses
            let (index, length) = match known {
                None => map.insert(name, len)?,
                Some((index, stored)) => {
                    if len != 0 && len != stored {
                        return Err(Error::length_mismatch(name, stored, len));
                    }
                    (index, stored)
                }
            };
            self.append_slot(index, length)?;
        }
        Ok(())
    }

    /// Matches a concrete key of exactly `key_length()` bytes, binding slot
    /// spans into `m`.
    ///
    /// A slot already bound in `m` must agree with the key over its valid
    /// prefix and is extended to this pattern's slot length. Returns false
    /// without fully updating `m` when the key does not fit the pattern.
    pub fn match_key<'k>(&self, key: &'k [u8], m: &mut Match<'k>) -> bool {
        if key.len() != self.klen {
            return false;
        }
        let mut pos = 0;
        for &b in &self.pat[..self.plen] {
            if b < 128 {
                if key[pos] != b {
                    return false;
                }
                pos += 1;
            } else {
                let si = (b - 128) as usize;
                let len = self.slotlen[si];
                let bytes = &key[pos..pos + len];
                let bound = m.slot_length(si);
                if bound != 0 && m.slot(si) != &bytes[..bound.min(len)] {
                    return false;
                }
                if bound < len {
                    m.bind(si, bytes);
                }
                pos += len;
            }
        }
        true
    }

    /// Expands the leading part of a key: literals and bound slot bytes,
    /// stopping at the first slot that is not fully bound in `m`.
    pub fn expand_first(&self, m: &Match<'_>) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.klen);
        for &b in &self.pat[..self.plen] {
            if b < 128 {
                out.push(b);
            } else {
                let si = (b - 128) as usize;
                out.extend_from_slice(m.slot(si));
                if m.slot_length(si) < self.slotlen[si] {
                    break;
                }
            }
        }
        out
    }

    /// Expands the full key, or `None` if any referenced slot is not fully
    /// bound in `m`.
    pub fn expand(&self, m: &Match<'_>) -> Option<Vec<u8>> {
        let mut out = Vec::with_capacity(self.klen);
        for &b in &self.pat[..self.plen] {
            if b < 128 {
                out.push(b);
            } else {
                let si = (b - 128) as usize;
                if m.slot_length(si) != self.slotlen[si] {
                    return None;
                }
                out.extend_from_slice(m.slot(si));
            }
        }
        Some(out)
    }

    /// Serializes the compiled form: literal runs become strings, slot
    /// markers become `[slot_number, length]` with a 1-based slot number.
    ///
    /// This encoding keeps structure (literal bytes, slot order, lengths)
    /// but discards slot names; it is for persistence and debugging, not a
    /// textual inverse of `assign_parse`.
    pub fn unparse_json(&self) -> Value {
        let mut tokens = Vec::new();
        let mut i = 0;
        while i < self.plen {
            if self.pat[i] >= 128 {
                let si = (self.pat[i] - 128) as usize;
                tokens.push(json!([si + 1, self.slotlen[si]]));
                i += 1;
            } else {
                let first = i;
                i += 1;
                while i < self.plen && self.pat[i] < 128 {
                    i += 1;
                }
                // literals are 7-bit, so the run is always valid UTF-8
                let run = core::str::from_utf8(&self.pat[first..i]).unwrap_or_default();
                tokens.push(Value::String(run.into()));
            }
        }
        Value::Array(tokens)
    }

    /// Compact JSON rendering of `unparse_json()`.
    pub fn unparse(&self) -> String {
        self.unparse_json().to_string()
    }

    /// Rebuilds a pattern from its `unparse_json()` encoding.
    pub fn from_unparse_json(value: &Value) -> Result<Pattern> {
        let tokens = value
            .as_array()
            .ok_or_else(|| Error::bad_json("pattern is not an array"))?;
        let mut pat = Pattern::new();
        for token in tokens {
            match token {
                Value::String(run) => {
                    for &b in run.as_bytes() {
                        pat.append_literal(b)?;
                    }
                }
                Value::Array(pair) if pair.len() == 2 => {
                    let number = pair[0]
                        .as_u64()
                        .ok_or_else(|| Error::bad_json("slot number is not an integer"))?;
                    let length = pair[1]
                        .as_u64()
                        .ok_or_else(|| Error::bad_json("slot length is not an integer"))?;
                    if number == 0 {
                        return Err(Error::bad_json("slot numbers are 1-based"));
                    }
                    pat.append_slot(number as usize - 1, length as usize)?;
                }
                _ => return Err(Error::bad_json("expected string or [slot, length]")),
            }
        }
        Ok(pat)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for &b in &self.pat[..self.plen] {
            if b >= 128 {
                let si = (b - 128) as usize;
                write!(f, "<pos:{} len:{}>", self.slotpos[si], self.slotlen[si])?;
            } else {
                write!(f, "{}", b as char)?;
            }
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;

    #[test]
    fn test_fixed_name_rest() {
        let pat = Pattern::parse("fixed<name:3>rest").unwrap();
        assert_eq!(pat.key_length(), 12);
        assert_eq!(pat.pattern_length(), 10);
        assert!(pat.has_slot(0));
        assert_eq!(pat.slot_length(0), 3);
        assert_eq!(pat.slot_position(0), 5);
        assert_eq!(pat.unparse_json(), json!(["fixed", [1, 3], "rest"]));
        assert_eq!(pat.unparse(), r#"["fixed",[1,3],"rest"]"#);
    }

    #[test]
    fn test_unknown_name_without_length() {
        assert_eq!(
            Pattern::parse("<name>"),
            Err(Error::no_length_description("name"))
        );
    }

    #[test]
    fn test_known_name_without_length() {
        let mut map = SlotMap::new();
        let mut first = Pattern::new();
        first.assign_parse("a|<id:4>", &mut map).unwrap();

        let mut second = Pattern::new();
        second.assign_parse("b|<id>", &mut map).unwrap();
        assert_eq!(second.slot_length(0), 4);
        assert_eq!(second.key_length(), 6);
    }

    #[test]
    fn test_malformed_name() {
        assert_eq!(Pattern::parse("<>"), Err(Error::MalformedName));
        assert_eq!(Pattern::parse("<:3>"), Err(Error::MalformedName));
    }

    #[test]
    fn test_malformed_length() {
        assert_eq!(Pattern::parse("<a:>"), Err(Error::malformed_length("a")));
        assert_eq!(Pattern::parse("<a:x>"), Err(Error::malformed_length("a")));
        assert_eq!(Pattern::parse("<a:"), Err(Error::malformed_length("a")));
        assert_eq!(Pattern::parse("<a:999>"), Err(Error::malformed_length("a")));
    }

    #[test]
    fn test_unterminated_slot() {
        assert_eq!(Pattern::parse("<name"), Err(Error::UnterminatedSlot));
        assert_eq!(Pattern::parse("<a:3"), Err(Error::UnterminatedSlot));
        assert_eq!(Pattern::parse("k|<a:3"), Err(Error::UnterminatedSlot));
    }

    #[test]
    fn test_length_redefinition() {
        let mut map = SlotMap::new();
        let mut pat = Pattern::new();
        assert_eq!(
            pat.assign_parse("<a:3>|<a:4>", &mut map),
            Err(Error::length_mismatch("a", 3, 4))
        );
    }

    #[test]
    fn test_zero_length_first_use() {
        assert_eq!(Pattern::parse("<a:0>"), Err(Error::slot_capacity("a")));
    }

    #[test]
    fn test_slot_namespace_capacity() {
        let mut text = String::new();
        for i in 0..=SLOT_CAPACITY {
            text.push_str(&format!("<s{}:1>", i));
        }
        assert_eq!(
            Pattern::parse(&text),
            Err(Error::slot_capacity(format!("s{}", SLOT_CAPACITY)))
        );
    }

    #[test]
    fn test_duplicate_slot_in_one_pattern() {
        assert_eq!(
            Pattern::parse("<a:3>|<a>"),
            Err(Error::DuplicateSlot { slot: 0 })
        );
    }

    #[test]
    fn test_append_literal_rejects_high_bytes() {
        let mut pat = Pattern::new();
        assert_eq!(
            pat.append_literal(200),
            Err(Error::LiteralOutOfRange { byte: 200 })
        );
    }

    #[test]
    fn test_append_slot_preconditions() {
        let mut pat = Pattern::new();
        assert_eq!(
            pat.append_slot(SLOT_CAPACITY, 3),
            Err(Error::SlotOutOfRange {
                slot: SLOT_CAPACITY
            })
        );
        assert_eq!(pat.append_slot(1, 0), Err(Error::ZeroSlotLength { slot: 1 }));
        pat.append_slot(1, 3).unwrap();
        assert_eq!(pat.append_slot(1, 3), Err(Error::DuplicateSlot { slot: 1 }));
    }

    #[test]
    fn test_pattern_capacity() {
        let text: String = core::iter::repeat('x').take(PATTERN_CAPACITY + 1).collect();
        assert_eq!(Pattern::parse(&text), Err(Error::PatternCapacity));
    }

    #[test]
    fn test_match_key_binds_slots() {
        let pat = Pattern::parse("post|<author:5>|<seq:3>").unwrap();
        let mut m = Match::new();
        assert!(pat.match_key(b"post|alice|017", &mut m));
        assert_eq!(m.slot(0), b"alice");
        assert_eq!(m.slot(1), b"017");
    }

    #[test]
    fn test_match_key_rejects_bad_keys() {
        let pat = Pattern::parse("post|<author:5>").unwrap();
        let mut m = Match::new();
        assert!(!pat.match_key(b"mail|alice", &mut m));
        assert!(!pat.match_key(b"post|al", &mut m));
    }

    #[test]
    fn test_match_key_respects_existing_bindings() {
        let pat = Pattern::parse("p|<a:5>").unwrap();
        let mut m = Match::new();
        m.bind(0, b"alice");
        assert!(pat.match_key(b"p|alice", &mut m));
        assert!(!pat.match_key(b"p|carol", &mut m));

        // an agreeing shorter binding is extended
        let mut partial = Match::new();
        partial.bind(0, b"ali");
        assert!(pat.match_key(b"p|alice", &mut partial));
        assert_eq!(partial.slot(0), b"alice");
    }

    #[test]
    fn test_expand_first_stops_at_unbound_slot() {
        let pat = Pattern::parse("p|<a:5>|<b:3>").unwrap();
        assert_eq!(pat.expand_first(&Match::new()), b"p|");

        let mut m = Match::new();
        m.bind(0, b"alice");
        assert_eq!(pat.expand_first(&m), b"p|alice|");
    }

    #[test]
    fn test_expand_requires_full_bindings() {
        let pat = Pattern::parse("p|<a:5>|<b:3>").unwrap();
        let mut m = Match::new();
        m.bind(0, b"alice");
        assert_eq!(pat.expand(&m), None);
        m.bind(1, b"017");
        assert_eq!(pat.expand(&m).as_deref(), Some(&b"p|alice|017"[..]));
    }

    #[test]
    fn test_json_round_trip() {
        let pat = Pattern::parse("fixed<name:3>rest").unwrap();
        let back = Pattern::from_unparse_json(&pat.unparse_json()).unwrap();
        assert_eq!(back, pat);
    }

    #[test]
    fn test_from_unparse_json_rejects_garbage() {
        assert!(Pattern::from_unparse_json(&json!("flat string")).is_err());
        assert!(Pattern::from_unparse_json(&json!([[0, 3]])).is_err());
        assert!(Pattern::from_unparse_json(&json!([[1, 3, 9]])).is_err());
        assert!(Pattern::from_unparse_json(&json!([true])).is_err());
    }

    #[test]
    fn test_display() {
        let pat = Pattern::parse("fixed<name:3>rest").unwrap();
        assert_eq!(format!("{}", pat), "{fixed<pos:5 len:3>rest}");
    }

    #[test]
    fn test_failed_parse_is_discarded() {
        // content after a failed parse is unspecified; a fresh parse on the
        // same pattern must start clean
        let mut map = SlotMap::new();
        let mut pat = Pattern::new();
        assert!(pat.assign_parse("ab<bad", &mut map).is_err());
        pat.assign_parse("cd<ok:2>", &mut map).unwrap();
        assert_eq!(pat.key_length(), 4);
        assert_eq!(pat.pattern_length(), 3);
    }
}
