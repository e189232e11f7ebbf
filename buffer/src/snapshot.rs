use crate::layer::{Layer, Levels};
use patchwork_text::{ClipResult, Point, Range, Text, TextSlice};
use std::sync::Arc;

/// A frozen view of a [`crate::TextBuffer`] at the moment it was taken.
///
/// Holds shared references to the layers beneath it, so it stays readable
/// while the buffer keeps changing. Reads never restructure the underlying
/// patches, which makes a snapshot safe to share across threads.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub(crate) layers: Vec<Arc<Layer>>,
}

impl Snapshot {
    fn levels(&self) -> Levels<'_> {
        Levels::new(self.layers.iter().map(|layer| layer.level()))
    }

    /// The topmost layer this snapshot references.
    pub(crate) fn top_layer(&self) -> &Arc<Layer> {
        &self.layers[self.layers.len() - 1]
    }

    pub fn size(&self) -> u32 {
        self.levels().size()
    }

    pub fn extent(&self) -> Point {
        self.levels().extent()
    }

    pub fn line_length_for_row(&self, row: u32) -> Option<u32> {
        self.levels().line_length_for_row(row)
    }

    pub fn line_for_row(&self, row: u32) -> Option<Text> {
        let levels = self.levels();
        let length = levels.line_length_for_row(row)?;
        Some(levels.text_in_range(Range::new(Point::new(row, 0), Point::new(row, length))))
    }

    pub fn clip_position(&self, position: Point) -> ClipResult {
        self.levels().clip_position(position)
    }

    pub fn offset_for_position(&self, position: Point) -> u32 {
        self.levels().offset_for_position(position)
    }

    pub fn position_for_offset(&self, offset: u32) -> Point {
        self.levels().position_for_offset(offset)
    }

    pub fn text(&self) -> Text {
        self.levels().text()
    }

    pub fn text_in_range(&self, range: Range) -> Text {
        self.levels().text_in_range(range)
    }

    pub fn chunks(&self) -> Vec<TextSlice<'_>> {
        self.levels().chunks_in_range(Range::all_inclusive())
    }

    pub fn chunks_in_range(&self, range: Range) -> Vec<TextSlice<'_>> {
        self.levels().chunks_in_range(range)
    }

    pub fn base_text(&self) -> &Text {
        self.levels().base_text()
    }
}
