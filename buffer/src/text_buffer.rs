use crate::{
    config::BufferConfig,
    error::{AlreadyModifiedSnafu, DeserializeSnafu, MissingTextSnafu, Result, UnknownSnapshotSnafu},
    layer::{Layer, LayerContent, Level, Levels},
    snapshot::Snapshot,
};
use patchwork_patch::Patch;
use patchwork_text::{
    ClipResult, CorruptSnafu, Deserializer, Point, Range, Serializer, Text, TextSlice,
};
use snafu::{ensure, ResultExt};
use std::{fmt::Write, sync::Arc};

/// A text document made of a base text and a stack of patches.
///
/// Edits accumulate in a live patch on top of the stack. Taking a snapshot
/// freezes the live patch into a shared layer and starts a new one above it.
/// Frozen layers that no snapshot references any longer are folded back into
/// the live patch by [`TextBuffer::consolidate_layers`].
#[derive(Debug)]
pub struct TextBuffer {
    /// Frozen layers, base text first.
    layers: Vec<Arc<Layer>>,
    top: Patch,
    size: u32,
    extent: Point,
    config: BufferConfig,
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for TextBuffer {
    fn from(text: &str) -> Self {
        Self::from(Text::from(text))
    }
}

impl From<Text> for TextBuffer {
    fn from(text: Text) -> Self {
        Self::with_config(text, BufferConfig::default())
    }
}

impl TextBuffer {
    pub fn new() -> Self {
        Self::from(Text::new())
    }

    pub fn with_config(text: Text, config: BufferConfig) -> Self {
        let layer = Layer::base(text);
        Self {
            size: layer.size,
            extent: layer.extent,
            layers: vec![Arc::new(layer)],
            top: Patch::new(config.merges_adjacent_changes),
            config,
        }
    }

    pub fn config(&self) -> &BufferConfig {
        &self.config
    }

    fn levels(&self) -> Levels<'_> {
        Levels::new(
            self.layers
                .iter()
                .map(|layer| layer.level())
                .chain(std::iter::once(Level::Delta {
                    patch: &self.top,
                    size: self.size,
                    extent: self.extent,
                })),
        )
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn extent(&self) -> Point {
        self.extent
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

    /// The text the buffer's history starts from.
    pub fn base_text(&self) -> &Text {
        self.levels().base_text()
    }

    /// Number of levels, counting the base text and the live patch.
    pub fn layer_count(&self) -> usize {
        self.layers.len() + 1
    }

    pub fn set_text(&mut self, text: Text) {
        self.set_text_in_range(Range::new(Point::zero(), self.extent), text);
    }

    /// Replaces the text in `range`, clipped to the buffer, with `text`.
    pub fn set_text_in_range(&mut self, range: Range, text: Text) {
        let start = self.clip_position(range.start).position;
        let end = self.clip_position(range.end).position.max(start);
        let deleted = self.text_in_range(Range::new(start, end));

        let tail = self.extent.traversal(end);
        self.size = self.size - deleted.size() + text.size();
        self.extent = start.traverse(text.extent()).traverse(tail);

        tracing::trace!(
            %start,
            %end,
            deleted = deleted.size(),
            inserted = text.size(),
            "set_text_in_range"
        );
        self.top.splice(
            start,
            deleted.extent(),
            text.extent(),
            Some(deleted),
            Some(text),
            0,
        );
    }

    /// Discards the whole history and starts over from `text`.
    ///
    /// Outstanding snapshots keep their own layers but no longer belong to
    /// this buffer.
    pub fn reset(&mut self, text: Text) {
        *self = Self::with_config(text, self.config.clone());
    }

    /// Makes the current text the new base.
    pub fn flush_changes(&mut self) {
        let text = self.text();
        self.reset(text);
    }

    /// Makes the text of `snapshot` the new base, keeping every later edit
    /// pending on top of it.
    pub fn flush_preceding_changes(&mut self, snapshot: &Snapshot) -> Result<()> {
        let pending = self.changes_since(snapshot)?;
        let base = snapshot.text();
        let (size, extent) = (self.size, self.extent);
        let layer = Layer::base(base);
        self.layers = vec![Arc::new(layer)];
        self.top = pending;
        self.size = size;
        self.extent = extent;
        tracing::debug!(
            pending = self.top.get_change_count(),
            "flushed changes preceding snapshot"
        );
        Ok(())
    }

    /// Freezes the live patch and returns a view of the current text.
    pub fn create_snapshot(&mut self) -> Snapshot {
        if self.config.consolidate_on_snapshot {
            self.consolidate_layers();
        }
        if !self.top.is_empty() {
            let patch = std::mem::replace(
                &mut self.top,
                Patch::new(self.config.merges_adjacent_changes),
            );
            self.layers
                .push(Arc::new(Layer::delta(patch, self.size, self.extent)));
        }
        Snapshot {
            layers: self.layers.clone(),
        }
    }

    /// Folds frozen layers that only this buffer still references into the
    /// live patch. Returns the number of layers removed.
    pub fn consolidate_layers(&mut self) -> usize {
        let mut folded = 0;
        while self.layers.len() > 1 {
            let Some(layer) = self.layers.pop() else {
                break;
            };
            match Arc::try_unwrap(layer) {
                Ok(Layer {
                    content: LayerContent::Delta(mut patch),
                    ..
                }) => {
                    patch.combine(&self.top, true);
                    self.top = patch;
                    folded += 1;
                },
                Ok(layer) => {
                    self.layers.push(Arc::new(layer));
                    break;
                },
                Err(layer) => {
                    self.layers.push(layer);
                    break;
                },
            }
        }
        if folded > 0 {
            tracing::debug!(
                folded,
                layers = self.layers.len(),
                changes = self.top.get_change_count(),
                "consolidated layers"
            );
        }
        folded
    }

    /// Index of the topmost layer of `snapshot` in this buffer's history.
    fn locate(&self, snapshot: &Snapshot) -> Result<usize> {
        let index = snapshot.layers.len() - 1;
        ensure!(
            self.layers
                .get(index)
                .is_some_and(|layer| Arc::ptr_eq(layer, snapshot.top_layer())),
            UnknownSnapshotSnafu
        );
        Ok(index)
    }

    /// The patch from `snapshot`'s text to the current text.
    fn changes_since(&self, snapshot: &Snapshot) -> Result<Patch> {
        let index = self.locate(snapshot)?;
        Ok(self.combine_from(index + 1))
    }

    /// Composes every frozen layer from `first` upwards with the live patch.
    fn combine_from(&self, first: usize) -> Patch {
        let mut combined = Patch::new(self.config.merges_adjacent_changes);
        for layer in &self.layers[first..] {
            if let LayerContent::Delta(patch) = &layer.content {
                combined.combine(patch, true);
            }
        }
        combined.combine(&self.top, true);
        combined
    }

    /// Whether the current text differs from the base text.
    pub fn is_modified(&self) -> bool {
        has_effective_change(&self.combine_from(1))
    }

    /// Whether the current text differs from the text of `snapshot`.
    pub fn is_modified_since(&self, snapshot: &Snapshot) -> Result<bool> {
        Ok(has_effective_change(&self.changes_since(snapshot)?))
    }

    /// The patch that turns the current text back into `snapshot`'s text.
    pub fn get_inverted_changes(&self, snapshot: &Snapshot) -> Result<Patch> {
        Ok(self.changes_since(snapshot)?.invert())
    }

    /// Writes every change since the base text.
    pub fn serialize_changes(&self, output: &mut Serializer<'_>) {
        self.combine_from(1).serialize(output);
    }

    /// Replays changes written by [`TextBuffer::serialize_changes`] on top
    /// of an unmodified buffer.
    pub fn deserialize_changes(&mut self, input: &mut Deserializer<'_>) -> Result<()> {
        ensure!(!self.is_modified(), AlreadyModifiedSnafu);
        let patch = Patch::deserialize(input).context(DeserializeSnafu)?;

        let changes = patch.get_changes();
        if let Some(change) = changes.iter().find(|change| change.new_text.is_none()) {
            return MissingTextSnafu {
                position: change.new_start,
            }
            .fail();
        }

        let current = self.text();
        let mut size = i64::from(self.size);
        for change in &changes {
            let range = Range::new(change.old_start, change.old_end);
            if current.clip_position(range.start).position != range.start
                || current.clip_position(range.end).position != range.end
            {
                return corrupt_changes(format!(
                    "change at {} - {} lies outside the buffer text",
                    range.start, range.end
                ));
            }
            let replaced = current.slice(range);
            if let Some(old_text) = change.old_text {
                if old_text.content() != replaced.units() {
                    return corrupt_changes(format!(
                        "change at {} - {} replaces {:?} but the buffer holds {:?}",
                        range.start,
                        range.end,
                        old_text.to_string(),
                        replaced.to_string()
                    ));
                }
            }
            size += i64::from(change.new_text_size) - i64::from(replaced.size());
        }
        let extent = match changes.last() {
            Some(last) => last.new_end.traverse(self.extent.traversal(last.old_end)),
            None => self.extent,
        };

        self.flush_changes();
        self.size = size.max(0) as u32;
        self.extent = extent;
        self.top = patch;
        tracing::debug!(changes = self.top.get_change_count(), "loaded changes");
        Ok(())
    }

    /// Every layer in Graphviz dot syntax, base text first.
    pub fn get_dot_graph(&self) -> String {
        let mut graph = String::new();
        for (index, layer) in self.layers.iter().enumerate() {
            match &layer.content {
                LayerContent::Base(text) => {
                    let _ = writeln!(graph, "// layer {index}: base text {:?}", text.to_string());
                },
                LayerContent::Delta(patch) => {
                    let _ = writeln!(graph, "// layer {index}");
                    graph.push_str(&patch.get_dot_graph());
                },
            }
        }
        let _ = writeln!(graph, "// layer {}: live", self.layers.len());
        graph.push_str(&self.top.get_dot_graph());
        graph
    }
}

fn corrupt_changes(message: String) -> Result<()> {
    Err(CorruptSnafu { message }.build()).context(DeserializeSnafu)
}

fn has_effective_change(patch: &Patch) -> bool {
    patch
        .get_changes()
        .iter()
        .any(|change| change.old_text != change.new_text)
}
