//! Selects which half of a change a traversal is keyed on.
//!
//! The range and boundary queries are written once against
//! [`CoordinateSpace`] and instantiated for [`Old`] and [`New`].

use crate::node::{Location, Node};
use patchwork_text::Point;

pub(crate) trait CoordinateSpace {
    fn extent(node: &Node) -> Point;
    fn start(location: &Location) -> Point;
    fn end(location: &Location) -> Point;
}

/// Coordinates in the document before the patch is applied.
pub(crate) struct Old;

/// Coordinates in the document after the patch is applied.
pub(crate) struct New;

impl CoordinateSpace for Old {
    fn extent(node: &Node) -> Point {
        node.old_extent
    }

    fn start(location: &Location) -> Point {
        location.old_start
    }

    fn end(location: &Location) -> Point {
        location.old_end
    }
}

impl CoordinateSpace for New {
    fn extent(node: &Node) -> Point {
        node.new_extent
    }

    fn start(location: &Location) -> Point {
        location.new_start
    }

    fn end(location: &Location) -> Point {
        location.new_end
    }
}
