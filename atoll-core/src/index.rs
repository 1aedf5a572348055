//! The ordered index from ring position to owning node
//!
//! This determines which node owns any point on the ring.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Included};

use super::errors::RingError;

/// The ordered index from ring position to owning node
///
/// Positions are stored linearly but the index is logically circular:
/// lookups past the largest stored position wrap back to the smallest.
#[derive(Default, Clone, Debug)]
pub struct RingIndex {
    /// The ring entries ordered by position
    slots: BTreeMap<u32, String>,
}

impl RingIndex {
    /// Insert or overwrite the entry at a position
    ///
    /// Two virtual nodes can hash to the same position. When that happens
    /// the later insert silently wins. This is an accepted approximation
    /// and is deliberately not corrected with collision chaining.
    ///
    /// # Arguments
    ///
    /// * `position` - The position on the ring to fill
    /// * `node` - The node that owns this position
    pub fn insert(&mut self, position: u32, node: &str) {
        self.slots.insert(position, node.to_owned());
    }

    /// Remove the entry at a position if one exists
    ///
    /// # Arguments
    ///
    /// * `position` - The position on the ring to clear
    pub fn remove(&mut self, position: u32) {
        self.slots.remove(&position);
    }

    /// Get the node that owns a position on the ring
    ///
    /// This finds the smallest stored position at or after the queried
    /// one, wrapping back to the start of the ring if none exists.
    ///
    /// # Arguments
    ///
    /// * `position` - The position to find an owner for
    pub fn owner_of(&self, position: u32) -> Result<&str, RingError> {
        // look for the next entry at or after this position
        match self
            .slots
            .range((Included(&position), Included(&u32::MAX)))
            .next()
        {
            Some((_, node)) => Ok(node.as_str()),
            // nothing follows this position so wrap to the rings start
            None => match self.slots.iter().next() {
                Some((_, node)) => Ok(node.as_str()),
                None => Err(RingError::Empty),
            },
        }
    }

    /// Get the first node strictly after a position that is not a given node
    ///
    /// This walks the ring clockwise from just past `position`, wrapping
    /// around, and skips any slots owned by `skip`. Returns None when every
    /// slot on the ring belongs to `skip` or the ring is empty.
    ///
    /// # Arguments
    ///
    /// * `position` - The position to start walking from
    /// * `skip` - The node whose slots should be skipped
    pub fn successor_skipping(&self, position: u32, skip: &str) -> Option<&str> {
        // walk every slot after this position and then wrap to the start
        let after = self.slots.range((Excluded(&position), Included(&u32::MAX)));
        let before = self.slots.range((Included(&0), Included(&position)));
        // take the first slot owned by someone else
        after
            .chain(before)
            .map(|(_, node)| node.as_str())
            .find(|node| *node != skip)
    }

    /// Step over the ring entries in ascending position order
    pub fn iter(&self) -> btree_map::Iter<'_, u32, String> {
        self.slots.iter()
    }

    /// The number of slots on the ring
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the ring has no slots at all
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
