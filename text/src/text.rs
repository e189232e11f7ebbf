//! UTF-16 text values with a line index
//!
//! [`Text`] owns its code units together with the offset of the first unit of
//! every row, so conversions between linear offsets and [`Point`]s are a binary
//! search. [`TextSlice`] borrows a clipped region of a [`Text`].

use crate::{
    serialization::{CorruptSnafu, Deserializer, Result, Serializer},
    Point, Range,
};
use std::fmt;

const NEWLINE: u16 = b'\n' as u16;

/// The result of clamping a position into a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipResult {
    pub position: Point,
    pub offset: u32,
}

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Text {
    content: Vec<u16>,
    line_offsets: Vec<u32>,
}

impl Default for Text {
    fn default() -> Self {
        Self::new()
    }
}

impl Text {
    pub fn new() -> Self {
        Self {
            content: Vec::new(),
            line_offsets: vec![0],
        }
    }

    pub fn from_utf16(content: Vec<u16>) -> Self {
        let line_offsets = Self::compute_line_offsets(&content);
        Self {
            content,
            line_offsets,
        }
    }

    fn compute_line_offsets(content: &[u16]) -> Vec<u32> {
        let mut offsets = vec![0];
        offsets.extend(
            content
                .iter()
                .enumerate()
                .filter(|(_, unit)| **unit == NEWLINE)
                .map(|(ix, _)| ix as u32 + 1),
        );
        offsets
    }

    /// The extent of a run of UTF-16 code units.
    pub fn extent_of(units: &[u16]) -> Point {
        let mut extent = Point::zero();
        for unit in units {
            if *unit == NEWLINE {
                extent.row += 1;
                extent.column = 0;
            } else {
                extent.column += 1;
            }
        }
        extent
    }

    /// Concatenate any number of slices into a new text.
    pub fn concat(slices: &[TextSlice<'_>]) -> Text {
        let len = slices.iter().map(|slice| slice.size() as usize).sum();
        let mut content = Vec::with_capacity(len);
        for slice in slices {
            content.extend_from_slice(slice.units());
        }
        Self::from_utf16(content)
    }

    /// Replace `deletion_extent` worth of text at `start` with `inserted`.
    pub fn splice(&mut self, start: Point, deletion_extent: Point, inserted: TextSlice<'_>) {
        let start_offset = self.offset_for_position(start) as usize;
        let end_offset = self.offset_for_position(start.traverse(deletion_extent)) as usize;
        self.content
            .splice(start_offset..end_offset, inserted.units().iter().copied());
        self.line_offsets = Self::compute_line_offsets(&self.content);
    }

    pub fn append(&mut self, slice: TextSlice<'_>) {
        self.content.extend_from_slice(slice.units());
        self.line_offsets = Self::compute_line_offsets(&self.content);
    }

    pub fn assign(&mut self, slice: TextSlice<'_>) {
        let content = slice.units().to_vec();
        *self = Self::from_utf16(content);
    }

    pub fn clear(&mut self) {
        self.content.clear();
        self.line_offsets.truncate(1);
    }

    pub fn content(&self) -> &[u16] {
        &self.content
    }

    pub fn at(&self, offset: u32) -> Option<u16> {
        self.content.get(offset as usize).copied()
    }

    /// Number of UTF-16 code units.
    pub fn size(&self) -> u32 {
        self.content.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn extent(&self) -> Point {
        let last_row = self.line_offsets.len() - 1;
        Point::new(
            last_row as u32,
            self.size() - self.line_offsets[last_row],
        )
    }

    /// Length of `row` excluding its newline, or `None` past the last row.
    pub fn line_length_for_row(&self, row: u32) -> Option<u32> {
        let row = row as usize;
        let start = *self.line_offsets.get(row)?;
        let end = match self.line_offsets.get(row + 1) {
            Some(next) => next - 1,
            None => self.size(),
        };
        Some(end - start)
    }

    pub fn clip_position(&self, position: Point) -> ClipResult {
        let extent = self.extent();
        if position.row > extent.row {
            return ClipResult {
                position: extent,
                offset: self.size(),
            };
        }
        let row_start = self.line_offsets[position.row as usize];
        let line_length = self.line_length_for_row(position.row).unwrap_or(0);
        let column = position.column.min(line_length);
        ClipResult {
            position: Point::new(position.row, column),
            offset: row_start + column,
        }
    }

    pub fn offset_for_position(&self, position: Point) -> u32 {
        self.clip_position(position).offset
    }

    pub fn position_for_offset(&self, offset: u32) -> Point {
        let offset = offset.min(self.size());
        let row = self.line_offsets.partition_point(|start| *start <= offset) - 1;
        Point::new(row as u32, offset - self.line_offsets[row])
    }

    pub fn as_slice(&self) -> TextSlice<'_> {
        TextSlice {
            text: self,
            start: ClipResult {
                position: Point::zero(),
                offset: 0,
            },
            end: ClipResult {
                position: self.extent(),
                offset: self.size(),
            },
        }
    }

    /// Borrow the text between two positions, clipping both into bounds.
    pub fn slice(&self, range: Range) -> TextSlice<'_> {
        let start = self.clip_position(range.start);
        let end = self.clip_position(range.end);
        let end = if end.offset < start.offset { start } else { end };
        TextSlice {
            text: self,
            start,
            end,
        }
    }

    pub fn serialize(&self, output: &mut Serializer<'_>) {
        output.append_u32(self.size());
        for unit in &self.content {
            output.append_u16(*unit);
        }
    }

    pub fn deserialize(input: &mut Deserializer<'_>) -> Result<Self> {
        let len = input.read_u32()? as usize;
        if input.remaining() < len * 2 {
            return CorruptSnafu {
                message: format!(
                    "text of {len} units does not fit in {} bytes",
                    input.remaining()
                ),
            }
            .fail();
        }
        let mut content = Vec::with_capacity(len);
        for _ in 0..len {
            content.push(input.read_u16()?);
        }
        Ok(Self::from_utf16(content))
    }
}

impl From<&str> for Text {
    fn from(text: &str) -> Self {
        Self::from_utf16(text.encode_utf16().collect())
    }
}

impl From<String> for Text {
    fn from(text: String) -> Self {
        Self::from(text.as_str())
    }
}

impl From<TextSlice<'_>> for Text {
    fn from(slice: TextSlice<'_>) -> Self {
        slice.to_text()
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf16_lossy(&self.content))
    }
}

impl fmt::Debug for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Text({:?})", self.to_string())
    }
}

/// A borrowed, clipped region of a [`Text`].
///
/// Positions passed to the slicing methods are relative to the slice start.
#[derive(Clone, Copy)]
pub struct TextSlice<'a> {
    text: &'a Text,
    start: ClipResult,
    end: ClipResult,
}

impl<'a> TextSlice<'a> {
    pub fn units(&self) -> &'a [u16] {
        &self.text.content[self.start.offset as usize..self.end.offset as usize]
    }

    pub fn size(&self) -> u32 {
        self.end.offset - self.start.offset
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn extent(&self) -> Point {
        self.end.position.traversal(self.start.position)
    }

    pub fn start_position(&self) -> Point {
        self.start.position
    }

    pub fn end_position(&self) -> Point {
        self.end.position
    }

    fn clip_relative(&self, position: Point) -> ClipResult {
        let absolute = self.start.position.traverse(position).min(self.end.position);
        let clipped = self.text.clip_position(absolute);
        if clipped.offset > self.end.offset {
            self.end
        } else {
            clipped
        }
    }

    /// The first `extent` of this slice.
    pub fn prefix(&self, extent: Point) -> TextSlice<'a> {
        TextSlice {
            text: self.text,
            start: self.start,
            end: self.clip_relative(extent),
        }
    }

    /// Everything after the first `extent` of this slice.
    pub fn suffix(&self, extent: Point) -> TextSlice<'a> {
        TextSlice {
            text: self.text,
            start: self.clip_relative(extent),
            end: self.end,
        }
    }

    pub fn slice(&self, range: Range) -> TextSlice<'a> {
        let start = self.clip_relative(range.start);
        let end = self.clip_relative(range.end);
        let end = if end.offset < start.offset { start } else { end };
        TextSlice {
            text: self.text,
            start,
            end,
        }
    }

    pub fn to_text(&self) -> Text {
        Text::from_utf16(self.units().to_vec())
    }
}

impl fmt::Display for TextSlice<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf16_lossy(self.units()))
    }
}

impl fmt::Debug for TextSlice<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TextSlice({:?})", self.to_string())
    }
}
