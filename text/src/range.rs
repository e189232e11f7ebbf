//! Half-open ranges of two-dimensional positions

use crate::Point;
use std::fmt;

/// A half-open range `[start, end)` of positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Range {
    pub start: Point,
    pub end: Point,
}

impl Range {
    /// Create a new range
    pub fn new(start: Point, end: Point) -> Self {
        assert!(start <= end, "Invalid range: start {start} > end {end}");
        Self { start, end }
    }

    /// Create an empty range at the given position
    pub fn empty(position: Point) -> Self {
        Self {
            start: position,
            end: position,
        }
    }

    /// The range covering every representable position
    pub fn all_inclusive() -> Self {
        Self {
            start: Point::zero(),
            end: Point::MAX,
        }
    }

    pub fn extent(&self) -> Point {
        self.end.traversal(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if this range contains the given position
    pub fn contains(&self, position: Point) -> bool {
        self.start <= position && position < self.end
    }
}

impl From<std::ops::Range<Point>> for Range {
    fn from(range: std::ops::Range<Point>) -> Self {
        Self::new(range.start, range.end)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.start, self.end)
    }
}
