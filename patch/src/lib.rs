//! Composable records of text edits
//!
//! A [`Patch`] maps an old document onto a new one as a sorted set of
//! non-overlapping [`Change`]s. The changes live in a splay tree whose nodes
//! are stored in an arena; every node carries the aggregates of its subtree in
//! both coordinate spaces, so a change can be located by either its old or its
//! new position in logarithmic amortized time.
//!
//! Reads come in two flavours:
//! - `get_*` queries take `&self` and never restructure the tree, so they are
//!   safe to run side by side on a shared patch.
//! - `grab_*` queries take `&mut self` and splay the located change to the
//!   root, which makes runs of nearby queries cheap.
//!
//! Mutations ([`Patch::splice`], [`Patch::splice_old`], [`Patch::combine`])
//! keep the tree normalized: changes never overlap, and no-op changes are
//! dropped.

mod change;
mod coordinates;
mod debug;
mod node;
mod query;
mod serialize;
mod splice;
mod tree;

pub use change::Change;
pub use serialize::SERIALIZATION_VERSION;

use node::{Arena, NodeId};

/// Mutations between checks of the tree height.
const REBALANCE_CHECK_INTERVAL: u32 = 256;

#[derive(Clone, Debug)]
pub struct Patch {
    arena: Arena,
    root: Option<NodeId>,
    change_count: u32,
    merges_adjacent_changes: bool,
    mutations_since_rebalance_check: u32,
}

impl Default for Patch {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Patch {
    /// Create an empty patch.
    ///
    /// When `merges_adjacent_changes` is set, an edit that touches an existing
    /// change without overlapping it is fused into that change.
    pub fn new(merges_adjacent_changes: bool) -> Self {
        Self {
            arena: Arena::default(),
            root: None,
            change_count: 0,
            merges_adjacent_changes,
            mutations_since_rebalance_check: 0,
        }
    }

    pub fn merges_adjacent_changes(&self) -> bool {
        self.merges_adjacent_changes
    }

    pub fn get_change_count(&self) -> usize {
        self.change_count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn clear(&mut self) {
        self.arena.clear();
        self.root = None;
        self.change_count = 0;
        self.mutations_since_rebalance_check = 0;
    }

    /// A fully independent deep copy.
    pub fn copy(&self) -> Patch {
        self.clone()
    }

    /// The patch that maps the new document back onto the old one.
    pub fn invert(&self) -> Patch {
        let mut inverted = self.clone();
        for node in inverted.arena.slots_mut() {
            node.invert();
        }
        inverted
    }

    fn note_mutation(&mut self) {
        self.mutations_since_rebalance_check += 1;
        if self.mutations_since_rebalance_check < REBALANCE_CHECK_INTERVAL {
            return;
        }
        self.mutations_since_rebalance_check = 0;

        let bit_length = u32::BITS - self.change_count.leading_zeros();
        let height = self.height();
        if height > 3 * bit_length.max(1) {
            tracing::debug!(
                height,
                change_count = self.change_count,
                "patch tree too deep, rebalancing"
            );
            self.rebalance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchwork_text::{Point, Text};

    fn insert(patch: &mut Patch, column: u32, text: &str) {
        let text = Text::from(text);
        patch.splice(
            Point::new(0, column),
            Point::zero(),
            text.extent(),
            Some(Text::new()),
            Some(text),
            0,
        );
    }

    #[test]
    fn new_patch_is_empty() {
        let patch = Patch::default();
        assert!(patch.is_empty());
        assert!(patch.merges_adjacent_changes());
        assert_eq!(patch.get_change_count(), 0);
        assert!(patch.get_changes().is_empty());
    }

    #[test]
    fn clear_discards_everything() {
        let mut patch = Patch::default();
        insert(&mut patch, 0, "abc");
        insert(&mut patch, 10, "def");
        assert_eq!(patch.get_change_count(), 2);
        patch.clear();
        assert!(patch.is_empty());
        assert_eq!(patch.get_change_count(), 0);
        insert(&mut patch, 2, "x");
        assert_eq!(patch.get_change_count(), 1);
    }

    #[test]
    fn copy_is_independent() {
        let mut patch = Patch::default();
        insert(&mut patch, 0, "abc");
        insert(&mut patch, 10, "def");

        let mut copy = patch.copy();
        assert_eq!(copy.get_changes(), patch.get_changes());

        insert(&mut copy, 20, "ghi");
        assert_eq!(copy.get_change_count(), 3);
        assert_eq!(patch.get_change_count(), 2);
    }

    #[test]
    fn invert_swaps_coordinate_spaces() {
        let mut patch = Patch::default();
        let deleted = Text::from("xy");
        let inserted = Text::from("hello\n");
        patch.splice(
            Point::new(0, 3),
            deleted.extent(),
            inserted.extent(),
            Some(deleted.clone()),
            Some(inserted.clone()),
            0,
        );

        let inverted = patch.invert();
        let changes = inverted.get_changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].old_start, Point::new(0, 3));
        assert_eq!(changes[0].old_end, Point::new(1, 0));
        assert_eq!(changes[0].new_end, Point::new(0, 5));
        assert_eq!(changes[0].old_text, Some(&inserted));
        assert_eq!(changes[0].new_text, Some(&deleted));

        assert_eq!(inverted.invert().get_changes(), patch.get_changes());
    }

    #[test]
    fn rebalance_preserves_changes() {
        let mut patch = Patch::new(false);
        for row in 0..2_000 {
            let text = Text::from("x");
            patch.splice(
                Point::new(row * 2, 0),
                Point::zero(),
                text.extent(),
                None,
                Some(text),
                0,
            );
        }
        assert_eq!(patch.get_change_count(), 2_000);

        let before: Vec<_> = patch
            .get_changes()
            .iter()
            .map(|change| (change.old_start, change.new_start, change.new_end))
            .collect();
        patch.rebalance();
        assert!(patch.height() <= 11);
        let after: Vec<_> = patch
            .get_changes()
            .iter()
            .map(|change| (change.old_start, change.new_start, change.new_end))
            .collect();
        assert_eq!(before, after);
    }
}
