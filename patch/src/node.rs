//! Arena-allocated tree nodes and the positions derived from them

use patchwork_text::{Point, Text};
use std::ops::{Index, IndexMut};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(u32);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// One change plus the aggregates of the subtree rooted at it.
///
/// `gap` is the unchanged extent between the end of the in-order predecessor
/// (or the document start) and the start of this change. Unchanged text reads
/// the same in both coordinate spaces, so a single gap serves both. Rotations
/// never reorder nodes, which leaves every gap valid.
#[derive(Clone, Debug)]
pub(crate) struct Node {
    pub left: Option<NodeId>,
    pub right: Option<NodeId>,
    pub parent: Option<NodeId>,

    pub gap: Point,
    pub old_extent: Point,
    pub new_extent: Point,
    pub old_text: Option<Text>,
    pub new_text: Option<Text>,
    pub old_text_size: u32,
    pub new_text_size: u32,

    /// Extent from the start of the subtree to the end of its last change.
    pub old_subtree_extent: Point,
    pub new_subtree_extent: Point,
    pub old_subtree_text_size: u32,
    pub new_subtree_text_size: u32,
}

impl Node {
    pub(crate) fn new(
        gap: Point,
        old_extent: Point,
        new_extent: Point,
        old_text: Option<Text>,
        new_text: Option<Text>,
        old_text_size: u32,
        new_text_size: u32,
    ) -> Self {
        Self {
            left: None,
            right: None,
            parent: None,
            gap,
            old_extent,
            new_extent,
            old_text,
            new_text,
            old_text_size,
            new_text_size,
            old_subtree_extent: gap.traverse(old_extent),
            new_subtree_extent: gap.traverse(new_extent),
            old_subtree_text_size: old_text_size,
            new_subtree_text_size: new_text_size,
        }
    }

    pub(crate) fn is_noop(&self) -> bool {
        self.old_extent.is_zero() && self.new_extent.is_zero()
    }

    /// Exchanges the old and new halves, yielding the node of the inverse patch.
    pub(crate) fn invert(&mut self) {
        std::mem::swap(&mut self.old_extent, &mut self.new_extent);
        std::mem::swap(&mut self.old_text, &mut self.new_text);
        std::mem::swap(&mut self.old_text_size, &mut self.new_text_size);
        std::mem::swap(&mut self.old_subtree_extent, &mut self.new_subtree_extent);
        std::mem::swap(
            &mut self.old_subtree_text_size,
            &mut self.new_subtree_text_size,
        );
    }
}

/// Node storage addressed by [`NodeId`]. Freed slots are recycled.
#[derive(Clone, Debug, Default)]
pub(crate) struct Arena {
    nodes: Vec<Node>,
    free: Vec<NodeId>,
}

impl Arena {
    pub(crate) fn alloc(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id.index()] = node;
                id
            },
            None => {
                self.nodes.push(node);
                NodeId(self.nodes.len() as u32 - 1)
            },
        }
    }

    pub(crate) fn free(&mut self, id: NodeId) {
        let node = &mut self.nodes[id.index()];
        node.old_text = None;
        node.new_text = None;
        node.left = None;
        node.right = None;
        node.parent = None;
        self.free.push(id);
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
    }

    /// Every slot, including freed ones.
    pub(crate) fn slots_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.iter_mut()
    }
}

impl Index<NodeId> for Arena {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }
}

impl IndexMut<NodeId> for Arena {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }
}

/// Cumulative coordinates at some boundary between changes: the ends of
/// everything preceding it in both spaces, and the text sizes consumed so far.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Position {
    pub old: Point,
    pub new: Point,
    pub old_text_size: u32,
    pub new_text_size: u32,
}

impl Position {
    /// The position after a whole subtree that starts here.
    pub(crate) fn after_subtree(self, subtree: &Node) -> Position {
        Position {
            old: self.old.traverse(subtree.old_subtree_extent),
            new: self.new.traverse(subtree.new_subtree_extent),
            old_text_size: self.old_text_size + subtree.old_subtree_text_size,
            new_text_size: self.new_text_size + subtree.new_subtree_text_size,
        }
    }
}

/// Absolute coordinates of a single change.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Location {
    pub old_start: Point,
    pub old_end: Point,
    pub new_start: Point,
    pub new_end: Point,
    pub preceding_old_text_size: u32,
    pub preceding_new_text_size: u32,
    pub old_text_size: u32,
    pub new_text_size: u32,
}

impl Location {
    /// Locates `node` given the position at the end of its predecessor.
    pub(crate) fn after(preceding: Position, node: &Node) -> Location {
        let old_start = preceding.old.traverse(node.gap);
        let new_start = preceding.new.traverse(node.gap);
        Location {
            old_start,
            old_end: old_start.traverse(node.old_extent),
            new_start,
            new_end: new_start.traverse(node.new_extent),
            preceding_old_text_size: preceding.old_text_size,
            preceding_new_text_size: preceding.new_text_size,
            old_text_size: node.old_text_size,
            new_text_size: node.new_text_size,
        }
    }

    /// The position right after this change.
    pub(crate) fn end(&self) -> Position {
        Position {
            old: self.old_end,
            new: self.new_end,
            old_text_size: self.preceding_old_text_size + self.old_text_size,
            new_text_size: self.preceding_new_text_size + self.new_text_size,
        }
    }

    /// The position right before this change.
    pub(crate) fn start(&self) -> Position {
        Position {
            old: self.old_start,
            new: self.new_start,
            old_text_size: self.preceding_old_text_size,
            new_text_size: self.preceding_new_text_size,
        }
    }
}
