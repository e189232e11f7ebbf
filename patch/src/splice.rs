//! Recording edits: splicing in new space, in old space, and composing patches.

use crate::{
    node::{Node, Position},
    Patch,
};
use patchwork_text::{Point, Range, Text, TextSlice};
use smallvec::SmallVec;

/// Maps `point` through the unchanged region that follows an anchor known in
/// both spaces.
fn translate(anchor_old: Point, anchor_new: Point, point: Point) -> Point {
    anchor_old.traverse(point.traversal(anchor_new))
}

impl Patch {
    /// Records an edit expressed in the coordinates of the patch's new space.
    ///
    /// Replaces `new_deletion_extent` at `new_splice_start` with content of
    /// extent `new_insertion_extent`. `deleted_text` and `inserted_text` are
    /// optional; when given, their extents must match. `deleted_text_size`
    /// is the size of the deleted text when `deleted_text` is elided.
    ///
    /// Returns `false` when the edit left no change behind: either both
    /// extents were empty or the merged change turned out to be a no-op.
    pub fn splice(
        &mut self,
        new_splice_start: Point,
        new_deletion_extent: Point,
        new_insertion_extent: Point,
        deleted_text: Option<Text>,
        inserted_text: Option<Text>,
        deleted_text_size: u32,
    ) -> bool {
        let inserted_text_size = inserted_text.as_ref().map_or(0, Text::size);
        self.splice_with_sizes(
            new_splice_start,
            new_deletion_extent,
            new_insertion_extent,
            deleted_text,
            inserted_text,
            deleted_text_size,
            inserted_text_size,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn splice_with_sizes(
        &mut self,
        new_splice_start: Point,
        new_deletion_extent: Point,
        new_insertion_extent: Point,
        deleted_text: Option<Text>,
        inserted_text: Option<Text>,
        deleted_text_size: u32,
        inserted_text_size: u32,
    ) -> bool {
        if new_deletion_extent.is_zero() && new_insertion_extent.is_zero() {
            return false;
        }
        if let Some(text) = &deleted_text {
            assert_eq!(text.extent(), new_deletion_extent, "deleted text extent");
        }
        if let Some(text) = &inserted_text {
            assert_eq!(text.extent(), new_insertion_extent, "inserted text extent");
        }

        let start = new_splice_start;
        let deletion_end = start.traverse(new_deletion_extent);
        let insertion_end = start.traverse(new_insertion_extent);
        let deleted_text_size = deleted_text.as_ref().map_or(deleted_text_size, Text::size);
        let inserted_text_size = inserted_text.as_ref().map_or(inserted_text_size, Text::size);

        let merges = self.merges_adjacent_changes;
        let partition = self.partition(
            |location| {
                if merges {
                    location.new_end >= start
                } else {
                    location.new_end > start
                }
            },
            |location| {
                if merges {
                    location.new_start > deletion_end
                } else {
                    location.new_start >= deletion_end
                }
            },
        );
        let left_end = partition.left_end;
        let middle = partition.middle;
        self.change_count -= middle.len() as u32;

        let first = middle.first();
        let last = middle.last();

        let (old_start, new_start) = match first {
            Some(first) if first.location.new_start <= start => {
                (first.location.old_start, first.location.new_start)
            },
            _ => (translate(left_end.old, left_end.new, start), start),
        };
        // `replaced_end` is where the replaced region ends in the new space
        // before this edit.
        let (old_end, replaced_end) = match last {
            Some(last) if last.location.new_end >= deletion_end => {
                (last.location.old_end, last.location.new_end)
            },
            Some(last) => (
                translate(last.location.old_end, last.location.new_end, deletion_end),
                deletion_end,
            ),
            None => (translate(left_end.old, left_end.new, deletion_end), deletion_end),
        };
        let prefix_extent = start.traversal(new_start);
        let suffix_extent = replaced_end.traversal(deletion_end);
        let new_end = insertion_end.traverse(suffix_extent);

        // New text: the untouched head of the first change, the insertion,
        // then the untouched tail of the last change.
        let mut new_pieces: SmallVec<[TextSlice<'_>; 3]> = SmallVec::new();
        let mut new_text_complete = inserted_text.is_some();
        let mut prefix_size = 0;
        let mut suffix_size = 0;
        if !prefix_extent.is_zero() {
            match first.and_then(|first| first.new_text.as_ref()) {
                Some(text) => {
                    let prefix = text.as_slice().prefix(prefix_extent);
                    prefix_size = prefix.size();
                    new_pieces.push(prefix);
                },
                None => new_text_complete = false,
            }
        }
        if let Some(text) = &inserted_text {
            new_pieces.push(text.as_slice());
        }
        if !suffix_extent.is_zero() {
            match last.and_then(|last| last.new_text.as_ref().map(|text| (last, text))) {
                Some((last, text)) => {
                    let suffix = text
                        .as_slice()
                        .suffix(deletion_end.traversal(last.location.new_start));
                    suffix_size = suffix.size();
                    new_pieces.push(suffix);
                },
                None => new_text_complete = false,
            }
        }
        let new_text = new_text_complete.then(|| Text::concat(&new_pieces));
        let new_text_size = new_text
            .as_ref()
            .map_or(prefix_size + inserted_text_size + suffix_size, Text::size);

        // Old text: the deleted gaps interleaved with the old text of every
        // replaced change.
        let mut old_pieces: SmallVec<[TextSlice<'_>; 8]> = SmallVec::new();
        let mut old_text_complete = deleted_text.is_some();
        let mut cursor = start;
        for change in &middle {
            let location = &change.location;
            if location.new_start > cursor {
                if let Some(text) = &deleted_text {
                    old_pieces.push(text.as_slice().slice(Range::new(
                        cursor.traversal(start),
                        location.new_start.traversal(start),
                    )));
                }
            }
            match &change.old_text {
                Some(text) => old_pieces.push(text.as_slice()),
                None => old_text_complete = false,
            }
            cursor = cursor.max(location.new_end);
        }
        if deletion_end > cursor {
            if let Some(text) = &deleted_text {
                old_pieces.push(text.as_slice().slice(Range::new(
                    cursor.traversal(start),
                    deletion_end.traversal(start),
                )));
            }
        }
        let old_text = old_text_complete.then(|| Text::concat(&old_pieces));
        let old_text_size = match &old_text {
            Some(text) => text.size(),
            None => {
                let replaced_old: i64 = middle
                    .iter()
                    .map(|change| i64::from(change.location.old_text_size))
                    .sum();
                let replaced_new: i64 = middle
                    .iter()
                    .map(|change| i64::from(change.location.new_text_size))
                    .sum();
                let size = replaced_old
                    + i64::from(prefix_size)
                    + i64::from(deleted_text_size)
                    + i64::from(suffix_size)
                    - replaced_new;
                size.clamp(0, i64::from(u32::MAX)) as u32
            },
        };

        let gap = new_start.traversal(left_end.new);
        let node = Node::new(
            gap,
            old_end.traversal(old_start),
            new_end.traversal(new_start),
            old_text,
            new_text,
            old_text_size,
            new_text_size,
        );

        let kept = !node.is_noop();
        let right_gap = |right_start: Point| {
            let trailing = right_start.traversal(replaced_end);
            if kept {
                trailing
            } else {
                gap.traverse(trailing)
            }
        };
        let right = partition.right.map(|(id, location)| {
            self.arena[id].gap = right_gap(location.new_start);
            self.update(id);
            id
        });

        let middle = if kept {
            self.change_count += 1;
            Some(self.arena.alloc(node))
        } else {
            None
        };
        self.assemble(partition.left, middle, right);

        tracing::trace!(
            start = %new_splice_start,
            deletion = %new_deletion_extent,
            insertion = %new_insertion_extent,
            kept,
            change_count = self.change_count,
            "splice"
        );
        self.note_mutation();
        kept
    }

    /// Records an edit expressed in the coordinates of the patch's old space.
    ///
    /// Changes that intersect the deleted region are discarded and changes
    /// after it are shifted by the difference between the insertion and the
    /// deletion. No change is created for the edit itself.
    ///
    /// A change ending at `old_splice_start` stays where it is, and one
    /// starting at the end of the deleted region is shifted. A change with an
    /// empty old range at `old_splice_start` stays in place when the edit
    /// deletes text. On a pure insertion it moves after the inserted text.
    pub fn splice_old(
        &mut self,
        old_splice_start: Point,
        old_deletion_extent: Point,
        old_insertion_extent: Point,
    ) {
        if self.root.is_none() {
            return;
        }
        let start = old_splice_start;
        let deletion_end = start.traverse(old_deletion_extent);

        let partition = self.partition(
            |location| location.old_end > start || location.old_start >= deletion_end,
            |location| location.old_start >= deletion_end,
        );
        self.change_count -= partition.middle.len() as u32;

        let left_end: Position = partition.left_end;
        let right = partition.right.map(|(id, location)| {
            self.arena[id].gap = start
                .traversal(left_end.old)
                .traverse(old_insertion_extent)
                .traverse(location.old_start.traversal(deletion_end));
            self.update(id);
            id
        });
        self.assemble(partition.left, None, right);

        tracing::trace!(
            start = %old_splice_start,
            deletion = %old_deletion_extent,
            insertion = %old_insertion_extent,
            change_count = self.change_count,
            "splice_old"
        );
        self.note_mutation();
    }

    /// Composes `other` onto this patch.
    ///
    /// With `left_to_right` this patch maps old to mid and `other` maps mid
    /// to new. Otherwise `other` maps old to mid and this patch maps mid to
    /// new. Either way the result maps old to new.
    pub fn combine(&mut self, other: &Patch, left_to_right: bool) {
        if !left_to_right {
            let mut combined = other.copy();
            combined.merges_adjacent_changes = self.merges_adjacent_changes;
            combined.combine(self, true);
            *self = combined;
            return;
        }

        let changes = other.get_changes();
        for change in &changes {
            self.splice_with_sizes(
                change.new_start,
                change.old_extent(),
                change.new_extent(),
                change.old_text.cloned(),
                change.new_text.cloned(),
                change.old_text_size,
                change.new_text_size,
            );
        }
        tracing::debug!(
            combined = changes.len(),
            change_count = self.change_count,
            "combined patches"
        );
    }
}
