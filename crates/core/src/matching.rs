//! Slot bindings produced by matching concrete keys against patterns.

use crate::limits::SLOT_CAPACITY;
use core::fmt;
use core::ops::BitAndAssign;

/// A transient binding of byte ranges to slots.
///
/// A `Match` never owns key bytes: each bound slot is a view into some
/// externally owned key buffer, so a match is only valid while that buffer
/// is. Per slot it also carries a *valid length*, which starts at the
/// bound range's full length and only ever shrinks as matches are merged.
/// A valid length of 0 means the slot is unbound.
///
/// Matches are single-writer and short-lived, typically scoped to the
/// processing of one notification event.
#[derive(Clone, Copy, Debug, Default)]
pub struct Match<'k> {
    slots: [&'k [u8]; SLOT_CAPACITY],
    slotlen: [usize; SLOT_CAPACITY],
}

impl<'k> Match<'k> {
    /// Creates a match with every slot unbound.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a slot to a byte range, making its whole range valid.
    #[inline]
    pub fn bind(&mut self, slot: usize, bytes: &'k [u8]) {
        self.slots[slot] = bytes;
        self.slotlen[slot] = bytes.len();
    }

    /// Returns the valid prefix of a slot's bound bytes (empty if unbound).
    #[inline]
    pub fn slot(&self, slot: usize) -> &'k [u8] {
        &self.slots[slot][..self.slotlen[slot]]
    }

    /// Returns a slot's currently valid length (0 = unbound).
    #[inline]
    pub fn slot_length(&self, slot: usize) -> usize {
        self.slotlen[slot]
    }

    /// Returns true if no slot is bound.
    pub fn is_empty(&self) -> bool {
        self.slotlen.iter().all(|&l| l == 0)
    }
}

/// Narrowing merge: folds another match into this one.
///
/// For every slot, the valid length shrinks to the longest common prefix
/// of the two sides' valid bytes. A slot unbound on either side ends up
/// unbound. The retained byte references stay those of the receiver; only
/// the valid lengths change, so the resulting *length* is the same
/// whichever operand receives the merge.
impl<'k> BitAndAssign<&Match<'k>> for Match<'k> {
    fn bitand_assign(&mut self, other: &Match<'k>) {
        for i in 0..SLOT_CAPACITY {
            let mut l = 0;
            while l != self.slotlen[i]
                && l != other.slotlen[i]
                && self.slots[i][l] == other.slots[i][l]
            {
                l += 1;
            }
            self.slotlen[i] = l;
        }
    }
}

impl fmt::Display for Match<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        let mut sep = "";
        for i in 0..SLOT_CAPACITY {
            if self.slotlen[i] != 0 {
                write!(f, "{}{}: ", sep, i)?;
                for &b in self.slot(i) {
                    if b.is_ascii() && !b.is_ascii_control() {
                        write!(f, "{}", b as char)?;
                    } else {
                        write!(f, "\\x{:02x}", b)?;
                    }
                }
                sep = ", ";
            }
        }
        write!(f, "}}")
    }
}
