use crate::serialization::{Deserializer, Result, Serializer};
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    ops::{Add, AddAssign, Sub},
};

/// A position (or extent) in a two-dimensional text coordinate space.
///
/// Points are ordered by row, then by column. The same type doubles as a
/// relative extent: the extent of a run of text is the number of newlines it
/// contains paired with the number of units after the last newline.
#[derive(
    Copy, Clone, Default, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Point {
    pub row: u32,
    pub column: u32,
}

impl Point {
    /// Sentinel for an unbounded position.
    pub const MAX: Point = Point {
        row: u32::MAX,
        column: u32::MAX,
    };

    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    pub const fn zero() -> Self {
        Self { row: 0, column: 0 }
    }

    pub fn is_zero(&self) -> bool {
        self.row == 0 && self.column == 0
    }

    /// Moves this position forward by `extent`.
    ///
    /// Saturates instead of overflowing so that traversing from or by
    /// [`Point::MAX`] stays bounded.
    pub fn traverse(self, extent: Point) -> Point {
        if extent.row == 0 {
            Point {
                row: self.row,
                column: self.column.saturating_add(extent.column),
            }
        } else {
            Point {
                row: self.row.saturating_add(extent.row),
                column: extent.column,
            }
        }
    }

    /// The extent that leads from `start` to this position.
    ///
    /// Inverse of [`Point::traverse`]: `start.traverse(p.traversal(start)) == p`.
    pub fn traversal(self, start: Point) -> Point {
        assert!(
            self >= start,
            "cannot traverse backwards from {start} to {self}"
        );
        if self.row == start.row {
            Point {
                row: 0,
                column: self.column - start.column,
            }
        } else {
            Point {
                row: self.row - start.row,
                column: self.column,
            }
        }
    }

    pub fn serialize(&self, output: &mut Serializer<'_>) {
        output.append_u32(self.row);
        output.append_u32(self.column);
    }

    pub fn deserialize(input: &mut Deserializer<'_>) -> Result<Self> {
        let row = input.read_u32()?;
        let column = input.read_u32()?;
        Ok(Self { row, column })
    }
}

impl Add for Point {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        self.traverse(other)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, other: Self) {
        *self = self.traverse(other);
    }
}

impl Sub for Point {
    type Output = Self;

    fn sub(self, start: Self) -> Self {
        self.traversal(start)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_by_row_then_column() {
        assert!(Point::new(0, 10) < Point::new(1, 0));
        assert!(Point::new(2, 3) < Point::new(2, 4));
        assert_eq!(Point::new(1, 1).max(Point::new(0, 9)), Point::new(1, 1));
        assert_eq!(Point::new(1, 1).min(Point::new(0, 9)), Point::new(0, 9));
    }

    #[test]
    fn traverse_within_and_across_rows() {
        let start = Point::new(3, 4);
        assert_eq!(start.traverse(Point::new(0, 2)), Point::new(3, 6));
        assert_eq!(start.traverse(Point::new(2, 1)), Point::new(5, 1));
        assert_eq!(start + Point::zero(), start);
    }

    #[test]
    fn traversal_inverts_traverse() {
        let start = Point::new(3, 4);
        for extent in [Point::new(0, 0), Point::new(0, 7), Point::new(4, 2)] {
            let end = start.traverse(extent);
            assert_eq!(end.traversal(start), extent);
            assert_eq!(end - start, extent);
        }
    }

    #[test]
    fn traverse_saturates_at_max() {
        assert_eq!(Point::new(1, 5).traverse(Point::new(0, u32::MAX)).column, u32::MAX);
        assert_eq!(Point::MAX.traverse(Point::new(1, 0)), Point::new(u32::MAX, 0));
    }

    #[test]
    #[should_panic(expected = "cannot traverse backwards")]
    fn traversal_rejects_earlier_end() {
        let _ = Point::new(1, 0).traversal(Point::new(1, 1));
    }

    #[test]
    fn displays_as_tuple() {
        assert_eq!(Point::new(2, 7).to_string(), "(2, 7)");
    }
}
