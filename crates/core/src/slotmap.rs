//! Slot name namespace shared across the patterns of one join.

use crate::error::{Error, Result};
use crate::limits::SLOT_CAPACITY;
use alloc::string::{String, ToString};
use hashbrown::HashMap;

/// Maps slot names to `(index, length)` pairs while patterns are parsed.
///
/// Indices are assigned in first-seen order, so the first name to appear
/// anywhere in a join's patterns gets slot 0. The map is scoped to a single
/// `Pattern::parse` or one join's parse and dropped once parsing completes;
/// compiled patterns refer to slots by index only.
///
/// Entries store the encoded integer `length + 256 * index`, the same
/// packing the compiled form uses for slot metadata.
#[derive(Debug, Default)]
pub struct SlotMap {
    slots: HashMap<String, u32>,
}

impl SlotMap {
    /// Creates an empty slot namespace.
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }

    /// Returns the number of registered slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if no slot has been registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Looks up a name, returning its `(index, length)` if registered.
    pub fn get(&self, name: &str) -> Option<(usize, usize)> {
        self.slots.get(name).map(|&enc| Self::decode(enc))
    }

    /// Registers a new name with the given byte length.
    ///
    /// The slot index is the current map size. Fails with `SlotCapacity`
    /// when the namespace is full or when `length` is zero, since a slot
    /// with no bytes can never bind anything; lengths above 255 do not fit
    /// the packed encoding and fail as malformed.
    pub fn insert(&mut self, name: &str, length: usize) -> Result<(usize, usize)> {
        if length > 255 {
            return Err(Error::malformed_length(name));
        }
        if length == 0 || self.slots.len() == SLOT_CAPACITY {
            return Err(Error::slot_capacity(name));
        }
        let index = self.slots.len();
        self.slots
            .insert(name.to_string(), (length + 256 * index) as u32);
        Ok((index, length))
    }

    #[inline]
    fn decode(enc: u32) -> (usize, usize) {
        ((enc >> 8) as usize, (enc & 255) as usize)
    }
}
