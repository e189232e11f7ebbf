use crate::{
    coordinates::{CoordinateSpace, New, Old},
    node::{Location, NodeId, Position},
    Change, Patch,
};
use patchwork_text::Point;

impl Patch {
    fn change_at(&self, id: NodeId, location: &Location) -> Change<'_> {
        let node = &self.arena[id];
        Change {
            old_start: location.old_start,
            old_end: location.old_end,
            new_start: location.new_start,
            new_end: location.new_end,
            old_text: node.old_text.as_ref(),
            new_text: node.new_text.as_ref(),
            preceding_old_text_size: location.preceding_old_text_size,
            preceding_new_text_size: location.preceding_new_text_size,
            old_text_size: location.old_text_size,
            new_text_size: location.new_text_size,
        }
    }

    /// Walks forward from `id` while `keep_going` holds.
    fn collect_from(
        &self,
        id: NodeId,
        location: Location,
        keep_going: impl Fn(&Location) -> bool,
    ) -> Vec<Change<'_>> {
        let mut changes = Vec::new();
        let mut current = Some((id, location));
        while let Some((id, location)) = current {
            if !keep_going(&location) {
                break;
            }
            changes.push(self.change_at(id, &location));
            current = self
                .successor(id)
                .map(|next| (next, Location::after(location.end(), &self.arena[next])));
        }
        changes
    }

    /// Every change, in order.
    pub fn get_changes(&self) -> Vec<Change<'_>> {
        let Some(root) = self.root else {
            return Vec::new();
        };
        let first = self.leftmost(root);
        let location = Location::after(Position::default(), &self.arena[first]);
        self.collect_from(first, location, |_| true)
    }

    fn first_overlapping<S: CoordinateSpace>(
        &self,
        start: Point,
    ) -> Option<(NodeId, Location)> {
        self.find_first(self.root, Position::default(), |location| {
            S::end(location) > start
        })
    }

    fn changes_in_range<S: CoordinateSpace>(&self, start: Point, end: Point) -> Vec<Change<'_>> {
        match self.first_overlapping::<S>(start) {
            Some((id, location)) => {
                self.collect_from(id, location, |location| S::start(location) < end)
            },
            None => Vec::new(),
        }
    }

    fn grab_changes_in_range<S: CoordinateSpace>(
        &mut self,
        start: Point,
        end: Point,
    ) -> Vec<Change<'_>> {
        match self.first_overlapping::<S>(start) {
            Some((id, location)) => {
                self.splay(id);
                self.collect_from(id, location, |location| S::start(location) < end)
            },
            None => Vec::new(),
        }
    }

    /// Changes whose old range overlaps `[start, end)`.
    pub fn get_changes_in_old_range(&self, start: Point, end: Point) -> Vec<Change<'_>> {
        self.changes_in_range::<Old>(start, end)
    }

    /// Changes whose new range overlaps `[start, end)`.
    pub fn get_changes_in_new_range(&self, start: Point, end: Point) -> Vec<Change<'_>> {
        self.changes_in_range::<New>(start, end)
    }

    pub fn grab_changes_in_old_range(&mut self, start: Point, end: Point) -> Vec<Change<'_>> {
        self.grab_changes_in_range::<Old>(start, end)
    }

    pub fn grab_changes_in_new_range(&mut self, start: Point, end: Point) -> Vec<Change<'_>> {
        self.grab_changes_in_range::<New>(start, end)
    }

    fn last_starting_at_or_before<S: CoordinateSpace>(
        &self,
        target: Point,
    ) -> Option<(NodeId, Location)> {
        self.find_last(self.root, Position::default(), |location| {
            S::start(location) <= target
        })
    }

    /// The last change starting at or before `target` in the old space.
    pub fn get_change_starting_before_old_position(&self, target: Point) -> Option<Change<'_>> {
        self.last_starting_at_or_before::<Old>(target)
            .map(|(id, location)| self.change_at(id, &location))
    }

    /// The last change starting at or before `target` in the new space.
    pub fn get_change_starting_before_new_position(&self, target: Point) -> Option<Change<'_>> {
        self.last_starting_at_or_before::<New>(target)
            .map(|(id, location)| self.change_at(id, &location))
    }

    pub fn grab_change_starting_before_old_position(
        &mut self,
        target: Point,
    ) -> Option<Change<'_>> {
        let (id, location) = self.last_starting_at_or_before::<Old>(target)?;
        self.splay(id);
        Some(self.change_at(id, &location))
    }

    pub fn grab_change_starting_before_new_position(
        &mut self,
        target: Point,
    ) -> Option<Change<'_>> {
        let (id, location) = self.last_starting_at_or_before::<New>(target)?;
        self.splay(id);
        Some(self.change_at(id, &location))
    }

    fn first_ending_after_new(&self, target: Point) -> Option<(NodeId, Location)> {
        self.find_first(self.root, Position::default(), |location| {
            location.new_end > target
        })
    }

    /// The first change whose new range ends strictly after `target`.
    pub fn get_change_ending_after_new_position(&self, target: Point) -> Option<Change<'_>> {
        self.first_ending_after_new(target)
            .map(|(id, location)| self.change_at(id, &location))
    }

    pub fn grab_change_ending_after_new_position(
        &mut self,
        target: Point,
    ) -> Option<Change<'_>> {
        let (id, location) = self.first_ending_after_new(target)?;
        self.splay(id);
        Some(self.change_at(id, &location))
    }

    /// A synthetic change spanning from the first change's start to the last
    /// change's end in both spaces, or `None` for an empty patch.
    ///
    /// The bounds carry no text; their sizes are the totals over all changes.
    pub fn get_bounds(&self) -> Option<Change<'_>> {
        let root = self.root?;
        let first = self.leftmost(root);
        let start = Location::after(Position::default(), &self.arena[first]).start();
        let total = Position::default().after_subtree(&self.arena[root]);
        Some(Change {
            old_start: start.old,
            old_end: total.old,
            new_start: start.new,
            new_end: total.new,
            old_text: None,
            new_text: None,
            preceding_old_text_size: start.old_text_size,
            preceding_new_text_size: start.new_text_size,
            old_text_size: total.old_text_size - start.old_text_size,
            new_text_size: total.new_text_size - start.new_text_size,
        })
    }

    /// Maps a linear offset in the new document to a position.
    ///
    /// The patch only knows the text it stores, so offsets that land outside
    /// every change are resolved through the old document with the two
    /// callbacks. Offsets that land inside a change whose new text was elided
    /// clip to the change start.
    pub fn new_position_for_new_offset(
        &self,
        new_offset: u32,
        old_offset_for_old_position: impl Fn(Point) -> u32,
        old_position_for_old_offset: impl Fn(u32) -> Point,
    ) -> Point {
        // The change with the greatest start offset at or before the target.
        let preceding = self.find_last(self.root, Position::default(), |location| {
            let old_start_offset = old_offset_for_old_position(location.old_start);
            let new_start_offset = (i64::from(old_start_offset)
                + i64::from(location.preceding_new_text_size)
                - i64::from(location.preceding_old_text_size))
            .max(0) as u32;
            new_start_offset <= new_offset
        });

        let Some((id, location)) = preceding else {
            return old_position_for_old_offset(new_offset);
        };

        let old_start_offset = old_offset_for_old_position(location.old_start);
        let new_start_offset = (i64::from(old_start_offset)
            + i64::from(location.preceding_new_text_size)
            - i64::from(location.preceding_old_text_size))
        .max(0) as u32;
        let new_end_offset = new_start_offset + location.new_text_size;

        if new_offset < new_end_offset {
            return match &self.arena[id].new_text {
                Some(text) => location
                    .new_start
                    .traverse(text.position_for_offset(new_offset - new_start_offset)),
                None => location.new_start,
            };
        }

        let old_end_offset = old_offset_for_old_position(location.old_end);
        let old_offset = old_end_offset + (new_offset - new_end_offset);
        let old_position = old_position_for_old_offset(old_offset).max(location.old_end);
        location.new_end.traverse(old_position.traversal(location.old_end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchwork_text::Text;

    /// `"abcdefghij"` with "XY" inserted at 2 and "ef" deleted.
    fn sample() -> Patch {
        let mut patch = Patch::default();
        let inserted = Text::from("XY");
        patch.splice(
            Point::new(0, 2),
            Point::zero(),
            inserted.extent(),
            Some(Text::new()),
            Some(inserted),
            0,
        );
        let deleted = Text::from("ef");
        patch.splice(
            Point::new(0, 6),
            deleted.extent(),
            Point::zero(),
            Some(deleted),
            Some(Text::new()),
            0,
        );
        patch
    }

    #[test]
    fn range_queries_are_half_open() {
        let patch = sample();
        // old: insertion at 2, deletion 4..6
        assert_eq!(patch.get_changes_in_old_range(Point::new(0, 0), Point::new(0, 4)).len(), 1);
        assert_eq!(patch.get_changes_in_old_range(Point::new(0, 3), Point::new(0, 5)).len(), 1);
        assert_eq!(patch.get_changes_in_old_range(Point::new(0, 0), Point::new(0, 10)).len(), 2);
        assert_eq!(patch.get_changes_in_old_range(Point::new(0, 6), Point::new(0, 10)).len(), 0);
        // new: insertion 2..4, deletion at 6
        assert_eq!(patch.get_changes_in_new_range(Point::new(0, 3), Point::new(0, 4)).len(), 1);
        assert_eq!(patch.get_changes_in_new_range(Point::new(0, 4), Point::new(0, 10)).len(), 1);
        assert_eq!(patch.get_changes_in_new_range(Point::new(0, 7), Point::new(0, 10)).len(), 0);
        assert_eq!(patch.get_changes_in_new_range(Point::new(0, 0), Point::new(0, 2)).len(), 0);
    }

    #[test]
    fn grab_matches_get() {
        let mut patch = sample();
        let expected: Vec<_> = patch
            .get_changes_in_new_range(Point::new(0, 0), Point::new(0, 3))
            .iter()
            .map(|change| (change.old_start, change.new_start))
            .collect();
        let grabbed: Vec<_> = patch
            .grab_changes_in_new_range(Point::new(0, 0), Point::new(0, 3))
            .iter()
            .map(|change| (change.old_start, change.new_start))
            .collect();
        assert_eq!(expected, grabbed);

        let get = patch
            .get_change_starting_before_old_position(Point::new(0, 5))
            .map(|change| change.old_start);
        let grab = patch
            .grab_change_starting_before_old_position(Point::new(0, 5))
            .map(|change| change.old_start);
        assert_eq!(get, Some(Point::new(0, 4)));
        assert_eq!(get, grab);
        assert_eq!(patch.get_changes().len(), 2);
    }

    #[test]
    fn boundary_queries() {
        let mut patch = sample();
        assert!(patch
            .get_change_starting_before_new_position(Point::new(0, 1))
            .is_none());
        let change = patch
            .get_change_starting_before_new_position(Point::new(0, 5))
            .map(|change| change.new_start);
        assert_eq!(change, Some(Point::new(0, 2)));

        let change = patch
            .grab_change_ending_after_new_position(Point::new(0, 4))
            .map(|change| change.old_start);
        assert_eq!(change, Some(Point::new(0, 4)));
        assert!(patch
            .get_change_ending_after_new_position(Point::new(0, 6))
            .is_none());
    }

    #[test]
    fn bounds_span_every_change() {
        assert!(Patch::default().get_bounds().is_none());
        let patch = sample();
        let bounds = patch.get_bounds();
        let bounds = bounds.as_ref();
        assert_eq!(bounds.map(|b| b.old_start), Some(Point::new(0, 2)));
        assert_eq!(bounds.map(|b| b.old_end), Some(Point::new(0, 6)));
        assert_eq!(bounds.map(|b| b.new_start), Some(Point::new(0, 2)));
        assert_eq!(bounds.map(|b| b.new_end), Some(Point::new(0, 6)));
        assert_eq!(bounds.map(|b| b.old_text_size), Some(2));
        assert_eq!(bounds.map(|b| b.new_text_size), Some(2));
        assert_eq!(bounds.map(|b| b.preceding_old_text_size), Some(0));
    }

    #[test]
    fn new_offsets_map_through_changes_and_gaps() {
        let old = Text::from("ab\ncdefgh");
        let mut patch = Patch::default();
        let inserted = Text::from("X\nY");
        patch.splice(
            Point::new(0, 1),
            Point::zero(),
            inserted.extent(),
            Some(Text::new()),
            Some(inserted),
            0,
        );
        // new document: "aX\nYb\ncdefgh"
        let to_offset = |position: Point| old.offset_for_position(position);
        let to_position = |offset: u32| old.position_for_offset(offset);
        let expected = Text::from("aX\nYb\ncdefgh");
        for offset in 0..=expected.size() {
            assert_eq!(
                patch.new_position_for_new_offset(offset, to_offset, to_position),
                expected.position_for_offset(offset),
                "offset {offset}"
            );
        }
    }
}
