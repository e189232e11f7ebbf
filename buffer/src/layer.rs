//! Layers of a buffer's history and the reads that resolve through them.
//!
//! Level 0 of a stack is the base text. Every level above it is a patch whose
//! old space is the content of the level below. Reads start at the top level
//! and fall through to lower levels wherever the patch leaves text unchanged.

use patchwork_patch::Patch;
use patchwork_text::{ClipResult, Point, Range, Text, TextSlice};
use smallvec::SmallVec;

#[derive(Debug)]
pub(crate) enum LayerContent {
    Base(Text),
    Delta(Patch),
}

/// A frozen level, shared between the buffer and its snapshots.
#[derive(Debug)]
pub(crate) struct Layer {
    pub content: LayerContent,
    pub size: u32,
    pub extent: Point,
}

impl Layer {
    pub(crate) fn base(text: Text) -> Self {
        Self {
            size: text.size(),
            extent: text.extent(),
            content: LayerContent::Base(text),
        }
    }

    pub(crate) fn delta(patch: Patch, size: u32, extent: Point) -> Self {
        Self {
            content: LayerContent::Delta(patch),
            size,
            extent,
        }
    }

    pub(crate) fn level(&self) -> Level<'_> {
        match &self.content {
            LayerContent::Base(text) => Level::Base(text),
            LayerContent::Delta(patch) => Level::Delta {
                patch,
                size: self.size,
                extent: self.extent,
            },
        }
    }
}

#[derive(Clone, Copy)]
pub(crate) enum Level<'a> {
    Base(&'a Text),
    Delta {
        patch: &'a Patch,
        size: u32,
        extent: Point,
    },
}

/// A borrowed stack of levels, lowest first.
pub(crate) struct Levels<'a> {
    levels: SmallVec<[Level<'a>; 8]>,
}

/// Maps a new-space point through the unchanged region after an anchor.
fn to_old(anchor: (Point, Point), new_position: Point) -> Point {
    anchor.0.traverse(new_position.traversal(anchor.1))
}

fn signed_offset(base: u32, added: u32, removed: u32) -> u32 {
    (i64::from(base) + i64::from(added) - i64::from(removed)).max(0) as u32
}

impl<'a> Levels<'a> {
    pub(crate) fn new(levels: impl IntoIterator<Item = Level<'a>>) -> Self {
        Self {
            levels: levels.into_iter().collect(),
        }
    }

    fn top(&self) -> usize {
        self.levels.len() - 1
    }

    pub(crate) fn base_text(&self) -> &'a Text {
        match self.levels[0] {
            Level::Base(text) => text,
            Level::Delta { .. } => unreachable!("level 0 is always the base text"),
        }
    }

    pub(crate) fn size(&self) -> u32 {
        match self.levels[self.top()] {
            Level::Base(text) => text.size(),
            Level::Delta { size, .. } => size,
        }
    }

    pub(crate) fn extent(&self) -> Point {
        match self.levels[self.top()] {
            Level::Base(text) => text.extent(),
            Level::Delta { extent, .. } => extent,
        }
    }

    pub(crate) fn line_length_for_row(&self, row: u32) -> Option<u32> {
        let extent = self.extent();
        if row > extent.row {
            return None;
        }
        let top = self.top();
        let start = self.offset_at(top, Point::new(row, 0));
        let end = if row == extent.row {
            self.size()
        } else {
            self.offset_at(top, Point::new(row + 1, 0)) - 1
        };
        Some(end - start)
    }

    pub(crate) fn clip_position(&self, position: Point) -> ClipResult {
        let extent = self.extent();
        let position = if position.row > extent.row {
            extent
        } else {
            let length = self.line_length_for_row(position.row).unwrap_or(0);
            Point::new(position.row, position.column.min(length))
        };
        ClipResult {
            position,
            offset: self.offset_at(self.top(), position),
        }
    }

    pub(crate) fn offset_for_position(&self, position: Point) -> u32 {
        self.clip_position(position).offset
    }

    pub(crate) fn position_for_offset(&self, offset: u32) -> Point {
        self.position_at(self.top(), offset.min(self.size()))
    }

    pub(crate) fn chunks_in_range(&self, range: Range) -> Vec<TextSlice<'a>> {
        let start = self.clip_position(range.start).position;
        let end = self.clip_position(range.end).position.max(start);
        let mut chunks = Vec::new();
        self.collect_chunks(self.top(), start, end, &mut chunks);
        chunks.retain(|chunk| !chunk.is_empty());
        chunks
    }

    pub(crate) fn text_in_range(&self, range: Range) -> Text {
        Text::concat(&self.chunks_in_range(range))
    }

    pub(crate) fn text(&self) -> Text {
        self.text_in_range(Range::new(Point::zero(), self.extent()))
    }

    /// Offset of an already clipped position in the content of `level`.
    fn offset_at(&self, level: usize, position: Point) -> u32 {
        let patch = match self.levels[level] {
            Level::Base(text) => return text.offset_for_position(position),
            Level::Delta { patch, .. } => patch,
        };
        let Some(change) = patch.get_change_starting_before_new_position(position) else {
            return self.offset_at(level - 1, position);
        };

        let old_start_offset = self.offset_at(level - 1, change.old_start);
        if position < change.new_end {
            let start_offset = signed_offset(
                old_start_offset,
                change.preceding_new_text_size,
                change.preceding_old_text_size,
            );
            let within = change.new_text.map_or(0, |text| {
                text.offset_for_position(position.traversal(change.new_start))
            });
            return start_offset + within;
        }

        let old_position = to_old((change.old_end, change.new_end), position);
        signed_offset(
            self.offset_at(level - 1, old_position),
            change.preceding_new_text_size + change.new_text_size,
            change.preceding_old_text_size + change.old_text_size,
        )
    }

    fn position_at(&self, level: usize, offset: u32) -> Point {
        match self.levels[level] {
            Level::Base(text) => text.position_for_offset(offset),
            Level::Delta { patch, .. } => patch.new_position_for_new_offset(
                offset,
                |position| self.offset_at(level - 1, position),
                |offset| self.position_at(level - 1, offset),
            ),
        }
    }

    /// Appends the content of `level` between two of its positions.
    fn collect_chunks(
        &self,
        level: usize,
        start: Point,
        end: Point,
        chunks: &mut Vec<TextSlice<'a>>,
    ) {
        let patch = match self.levels[level] {
            Level::Base(text) => {
                chunks.push(text.slice(Range::new(start, end)));
                return;
            },
            Level::Delta { patch, .. } => patch,
        };

        // (old, new) coordinates of a boundary before `start` with only
        // unchanged text between it and `start`.
        let mut anchor = match patch.get_change_starting_before_new_position(start) {
            Some(change) if change.new_end <= start => (change.old_end, change.new_end),
            Some(change) => (change.old_start, change.new_start),
            None => (Point::zero(), Point::zero()),
        };
        let mut position = start;
        for change in patch.get_changes_in_new_range(start, end) {
            if change.new_start > position {
                self.collect_chunks(
                    level - 1,
                    to_old(anchor, position),
                    change.old_start,
                    chunks,
                );
                position = change.new_start;
            }
            let chunk_end = change.new_end.min(end);
            if chunk_end > position {
                if let Some(text) = change.new_text {
                    chunks.push(text.slice(Range::new(
                        position.traversal(change.new_start),
                        chunk_end.traversal(change.new_start),
                    )));
                }
                position = chunk_end;
            }
            anchor = (change.old_end, change.new_end);
        }
        if end > position {
            self.collect_chunks(level - 1, to_old(anchor, position), to_old(anchor, end), chunks);
        }
    }
}
