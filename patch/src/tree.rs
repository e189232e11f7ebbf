//! Splay tree mechanics shared by the mutations and the queries.

use crate::{
    node::{Location, Node, NodeId, Position},
    Patch,
};
use patchwork_text::Text;
use smallvec::SmallVec;

/// A change removed from the tree by [`Patch::partition`], with its absolute
/// coordinates from before the removal.
pub(crate) struct Extracted {
    pub location: Location,
    pub old_text: Option<Text>,
    pub new_text: Option<Text>,
}

/// The three pieces of a tree split around an edit.
pub(crate) struct Partition {
    /// Detached tree of the changes that end before the edit.
    pub left: Option<NodeId>,
    /// Position at the end of `left`.
    pub left_end: Position,
    /// Changes touched by the edit, in order.
    pub middle: SmallVec<[Extracted; 4]>,
    /// Root of the changes after the edit together with the location of its
    /// first change. The root has no left child.
    pub right: Option<(NodeId, Location)>,
}

impl Patch {
    /// Recomputes the subtree aggregates of `id` from its children.
    pub(crate) fn update(&mut self, id: NodeId) {
        let node = &self.arena[id];
        let mut total = match node.left {
            Some(left) => Position::default().after_subtree(&self.arena[left]),
            None => Position::default(),
        };
        total = Location::after(total, node).end();
        if let Some(right) = node.right {
            total = total.after_subtree(&self.arena[right]);
        }

        let node = &mut self.arena[id];
        node.old_subtree_extent = total.old;
        node.new_subtree_extent = total.new;
        node.old_subtree_text_size = total.old_text_size;
        node.new_subtree_text_size = total.new_text_size;
    }

    /// Rotates `x` above its parent.
    fn rotate_up(&mut self, x: NodeId) {
        let Some(parent) = self.arena[x].parent else {
            return;
        };
        let grandparent = self.arena[parent].parent;

        if self.arena[parent].left == Some(x) {
            let inner = self.arena[x].right;
            self.arena[parent].left = inner;
            if let Some(inner) = inner {
                self.arena[inner].parent = Some(parent);
            }
            self.arena[x].right = Some(parent);
        } else {
            let inner = self.arena[x].left;
            self.arena[parent].right = inner;
            if let Some(inner) = inner {
                self.arena[inner].parent = Some(parent);
            }
            self.arena[x].left = Some(parent);
        }
        self.arena[parent].parent = Some(x);
        self.arena[x].parent = grandparent;

        match grandparent {
            Some(grandparent) => {
                if self.arena[grandparent].left == Some(parent) {
                    self.arena[grandparent].left = Some(x);
                } else {
                    self.arena[grandparent].right = Some(x);
                }
            },
            None => self.root = Some(x),
        }

        self.update(parent);
        self.update(x);
    }

    /// Moves `x` to the root of the main tree.
    pub(crate) fn splay(&mut self, x: NodeId) {
        while let Some(parent) = self.arena[x].parent {
            match self.arena[parent].parent {
                None => self.rotate_up(x),
                Some(grandparent) => {
                    let x_is_left = self.arena[parent].left == Some(x);
                    let parent_is_left = self.arena[grandparent].left == Some(parent);
                    if x_is_left == parent_is_left {
                        self.rotate_up(parent);
                        self.rotate_up(x);
                    } else {
                        self.rotate_up(x);
                        self.rotate_up(x);
                    }
                },
            }
        }
    }

    /// The first change in the subtree at `root` for which `predicate` holds.
    ///
    /// `origin` is the position at the start of the subtree. `predicate` must
    /// be monotone over the in-order sequence: false for a prefix, then true.
    pub(crate) fn find_first(
        &self,
        root: Option<NodeId>,
        origin: Position,
        predicate: impl Fn(&Location) -> bool,
    ) -> Option<(NodeId, Location)> {
        let mut found = None;
        let mut origin = origin;
        let mut current = root;
        while let Some(id) = current {
            let node = &self.arena[id];
            let location = self.locate_in_subtree(origin, node);
            if predicate(&location) {
                found = Some((id, location));
                current = node.left;
            } else {
                origin = location.end();
                current = node.right;
            }
        }
        found
    }

    /// The last change in the subtree at `root` for which `predicate` holds.
    ///
    /// `predicate` must be true for a prefix of the in-order sequence, then
    /// false.
    pub(crate) fn find_last(
        &self,
        root: Option<NodeId>,
        origin: Position,
        predicate: impl Fn(&Location) -> bool,
    ) -> Option<(NodeId, Location)> {
        let mut found = None;
        let mut origin = origin;
        let mut current = root;
        while let Some(id) = current {
            let node = &self.arena[id];
            let location = self.locate_in_subtree(origin, node);
            if predicate(&location) {
                found = Some((id, location));
                origin = location.end();
                current = node.right;
            } else {
                current = node.left;
            }
        }
        found
    }

    /// Locates a node given the position at the start of its subtree.
    fn locate_in_subtree(&self, origin: Position, node: &Node) -> Location {
        let preceding = match node.left {
            Some(left) => origin.after_subtree(&self.arena[left]),
            None => origin,
        };
        Location::after(preceding, node)
    }

    pub(crate) fn leftmost(&self, mut id: NodeId) -> NodeId {
        while let Some(left) = self.arena[id].left {
            id = left;
        }
        id
    }

    /// The in-order successor of `id` within the tree that contains it.
    pub(crate) fn successor(&self, id: NodeId) -> Option<NodeId> {
        if let Some(right) = self.arena[id].right {
            return Some(self.leftmost(right));
        }
        let mut current = id;
        while let Some(parent) = self.arena[current].parent {
            if self.arena[parent].left == Some(current) {
                return Some(parent);
            }
            current = parent;
        }
        None
    }

    pub(crate) fn height(&self) -> u32 {
        let mut height = 0;
        let mut stack: SmallVec<[(NodeId, u32); 64]> = SmallVec::new();
        if let Some(root) = self.root {
            stack.push((root, 1));
        }
        while let Some((id, depth)) = stack.pop() {
            height = height.max(depth);
            let node = &self.arena[id];
            if let Some(left) = node.left {
                stack.push((left, depth + 1));
            }
            if let Some(right) = node.right {
                stack.push((right, depth + 1));
            }
        }
        height
    }

    /// Rebuilds the tree with minimal height (Day-Stout-Warren).
    pub fn rebalance(&mut self) {
        let Some(root) = self.root else {
            return;
        };

        // Flatten into a right-leaning vine.
        let mut current = Some(root);
        while let Some(id) = current {
            match self.arena[id].left {
                Some(left) => {
                    self.rotate_up(left);
                    current = Some(left);
                },
                None => current = self.arena[id].right,
            }
        }

        let count = u64::from(self.change_count);
        let perfect = (1u64 << (u64::BITS - 1 - (count + 1).leading_zeros())) - 1;
        self.compress(count - perfect);
        let mut remaining = perfect;
        while remaining > 1 {
            remaining /= 2;
            self.compress(remaining);
        }
    }

    /// One left-rotation pass down the right spine.
    fn compress(&mut self, rotations: u64) {
        let mut current = self.root;
        for _ in 0..rotations {
            let Some(id) = current else {
                break;
            };
            let Some(right) = self.arena[id].right else {
                break;
            };
            self.rotate_up(right);
            current = self.arena[right].right;
        }
    }

    /// Splits the tree around an edit.
    ///
    /// `leaves_left` selects the changes that do not belong to the left part
    /// and `enters_right` the ones that belong to the right part. Both must be
    /// monotone in the sense of [`Patch::find_first`]. Middle changes are
    /// removed from the arena. The patch has no root afterwards; callers
    /// reattach the parts with [`Patch::assemble`].
    pub(crate) fn partition(
        &mut self,
        leaves_left: impl Fn(&Location) -> bool,
        enters_right: impl Fn(&Location) -> bool,
    ) -> Partition {
        let Some((first, _)) = self.find_first(self.root, Position::default(), leaves_left)
        else {
            let left = self.root.take();
            let left_end = match left {
                Some(left) => Position::default().after_subtree(&self.arena[left]),
                None => Position::default(),
            };
            return Partition {
                left,
                left_end,
                middle: SmallVec::new(),
                right: None,
            };
        };

        self.splay(first);
        let left = self.arena[first].left.take();
        let left_end = match left {
            Some(left) => {
                self.arena[left].parent = None;
                Position::default().after_subtree(&self.arena[left])
            },
            None => Position::default(),
        };
        self.update(first);

        let right = self.find_first(Some(first), left_end, enters_right);
        let middle_root = match right {
            Some((boundary, _)) => {
                self.splay(boundary);
                let middle = self.arena[boundary].left.take();
                if let Some(middle) = middle {
                    self.arena[middle].parent = None;
                }
                self.update(boundary);
                middle
            },
            None => self.root,
        };
        self.root = None;

        let middle = self.extract(middle_root, left_end);
        Partition {
            left,
            left_end,
            middle,
            right,
        }
    }

    /// Removes every node of a detached subtree, returning their changes.
    fn extract(&mut self, root: Option<NodeId>, origin: Position) -> SmallVec<[Extracted; 4]> {
        let mut extracted = SmallVec::new();
        let mut ids: SmallVec<[NodeId; 4]> = SmallVec::new();
        let mut current = root.map(|root| self.leftmost(root));
        let mut preceding = origin;
        while let Some(id) = current {
            let location = Location::after(preceding, &self.arena[id]);
            preceding = location.end();
            current = self.successor(id);
            ids.push(id);

            let node = &mut self.arena[id];
            extracted.push(Extracted {
                location,
                old_text: node.old_text.take(),
                new_text: node.new_text.take(),
            });
        }
        for id in ids {
            self.arena.free(id);
        }
        extracted
    }

    /// Joins the parts of a partition back into one tree.
    ///
    /// `right` must be a root without a left child whose aggregates are
    /// current.
    pub(crate) fn assemble(
        &mut self,
        left: Option<NodeId>,
        middle: Option<NodeId>,
        right: Option<NodeId>,
    ) {
        self.root = match (middle, right) {
            (Some(middle), right) => {
                self.set_left(middle, left);
                self.set_right(middle, right);
                self.update(middle);
                Some(middle)
            },
            (None, Some(right)) => {
                self.set_left(right, left);
                self.update(right);
                Some(right)
            },
            (None, None) => left,
        };
    }

    fn set_left(&mut self, parent: NodeId, child: Option<NodeId>) {
        self.arena[parent].left = child;
        if let Some(child) = child {
            self.arena[child].parent = Some(parent);
        }
    }

    fn set_right(&mut self, parent: NodeId, child: Option<NodeId>) {
        self.arena[parent].right = child;
        if let Some(child) = child {
            self.arena[child].parent = Some(parent);
        }
    }
}
