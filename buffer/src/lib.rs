//! A layered text buffer built on patchwork patches
//!
//! [`TextBuffer`] keeps its base text immutable and records edits as patches.
//! [`TextBuffer::create_snapshot`] freezes the pending edits into a layer
//! shared with the returned [`Snapshot`], so snapshots stay cheap and
//! readable while the buffer keeps changing.

mod config;
mod error;
mod layer;
mod snapshot;
mod text_buffer;

pub use config::BufferConfig;
pub use error::{BufferError, Result};
pub use snapshot::Snapshot;
pub use text_buffer::TextBuffer;

#[cfg(test)]
mod tests {
    use super::*;
    use patchwork_text::{Deserializer, Point, Range, Serializer, Text};

    fn range(start: (u32, u32), end: (u32, u32)) -> Range {
        Range::new(Point::new(start.0, start.1), Point::new(end.0, end.1))
    }

    #[test]
    fn edits_are_visible_immediately() {
        patchwork_log::test();
        let mut buffer = TextBuffer::from("abc\ndef");
        buffer.set_text_in_range(range((0, 1), (1, 1)), Text::from("XY"));
        assert_eq!(buffer.text().to_string(), "aXYef");
        assert_eq!(buffer.size(), 5);
        assert_eq!(buffer.extent(), Point::new(0, 5));
        assert_eq!(buffer.base_text().to_string(), "abc\ndef");
        assert!(buffer.is_modified());
    }

    #[test]
    fn out_of_bounds_ranges_are_clipped() {
        let mut buffer = TextBuffer::from("ab\ncd");
        buffer.set_text_in_range(range((1, 1), (9, 9)), Text::from("!"));
        assert_eq!(buffer.text().to_string(), "ab\nc!");
        assert_eq!(buffer.line_for_row(1).map(|line| line.to_string()), Some("c!".into()));
        assert_eq!(buffer.line_for_row(2), None);
    }

    #[test]
    fn snapshots_keep_their_text() {
        let mut buffer = TextBuffer::from("hello");
        buffer.set_text_in_range(range((0, 5), (0, 5)), Text::from(" world"));
        let snapshot = buffer.create_snapshot();
        buffer.set_text_in_range(range((0, 0), (0, 5)), Text::from("goodbye"));

        assert_eq!(snapshot.text().to_string(), "hello world");
        assert_eq!(buffer.text().to_string(), "goodbye world");
        assert_eq!(snapshot.extent(), Point::new(0, 11));
        assert_eq!(snapshot.base_text().to_string(), "hello");
        assert!(buffer.is_modified_since(&snapshot).unwrap());
    }

    #[test]
    fn undoing_edits_is_not_a_modification() {
        let mut buffer = TextBuffer::from("abc");
        let snapshot = buffer.create_snapshot();
        buffer.set_text_in_range(range((0, 1), (0, 2)), Text::from("X"));
        assert!(buffer.is_modified_since(&snapshot).unwrap());
        buffer.set_text_in_range(range((0, 1), (0, 2)), Text::from("b"));
        assert!(!buffer.is_modified_since(&snapshot).unwrap());
        assert!(!buffer.is_modified());
    }

    #[test]
    fn inverted_changes_restore_the_snapshot() {
        let mut buffer = TextBuffer::from("one two three");
        let snapshot = buffer.create_snapshot();
        buffer.set_text_in_range(range((0, 4), (0, 7)), Text::from("2"));
        buffer.set_text_in_range(range((0, 0), (0, 0)), Text::from(">> "));

        let inverted = buffer.get_inverted_changes(&snapshot).unwrap();
        for change in inverted.get_changes().iter().rev() {
            let text = change.new_text.cloned().unwrap_or_default();
            buffer.set_text_in_range(Range::new(change.old_start, change.old_end), text);
        }
        assert_eq!(buffer.text(), snapshot.text());
    }

    #[test]
    fn unreferenced_layers_are_consolidated() {
        let mut buffer = TextBuffer::from("0123456789");
        for column in 0..5 {
            buffer.set_text_in_range(range((0, column), (0, column + 1)), Text::from("x"));
            drop(buffer.create_snapshot());
        }
        // Only the newest frozen layer survives each snapshot.
        assert_eq!(buffer.layer_count(), 3);
        assert_eq!(buffer.consolidate_layers(), 1);
        assert_eq!(buffer.layer_count(), 2);
        assert_eq!(buffer.text().to_string(), "xxxxx56789");
    }

    #[test]
    fn referenced_layers_survive_consolidation() {
        let mut buffer = TextBuffer::from("abc");
        buffer.set_text_in_range(range((0, 0), (0, 1)), Text::from("A"));
        let first = buffer.create_snapshot();
        buffer.set_text_in_range(range((0, 1), (0, 2)), Text::from("B"));
        let second = buffer.create_snapshot();
        buffer.set_text_in_range(range((0, 2), (0, 3)), Text::from("C"));

        assert_eq!(buffer.consolidate_layers(), 0);
        assert_eq!(buffer.layer_count(), 4);
        drop(second);
        assert_eq!(buffer.consolidate_layers(), 1);
        assert_eq!(first.text().to_string(), "Abc");
        assert_eq!(buffer.text().to_string(), "ABC");
        assert!(buffer.is_modified_since(&first).unwrap());
    }

    #[test]
    fn foreign_snapshots_are_rejected() {
        let mut other = TextBuffer::from("other");
        other.set_text_in_range(range((0, 0), (0, 1)), Text::from("O"));
        let foreign = other.create_snapshot();

        let buffer = TextBuffer::from("mine");
        assert!(matches!(
            buffer.is_modified_since(&foreign),
            Err(BufferError::UnknownSnapshot)
        ));
        assert!(matches!(
            buffer.get_inverted_changes(&foreign),
            Err(BufferError::UnknownSnapshot)
        ));
    }

    #[test]
    fn reset_detaches_snapshots() {
        let mut buffer = TextBuffer::from("abc");
        buffer.set_text_in_range(range((0, 0), (0, 0)), Text::from("1"));
        let snapshot = buffer.create_snapshot();
        buffer.reset(Text::from("fresh"));
        assert_eq!(buffer.text().to_string(), "fresh");
        assert!(!buffer.is_modified());
        assert_eq!(buffer.layer_count(), 2);
        assert!(buffer.is_modified_since(&snapshot).is_err());
        assert_eq!(snapshot.text().to_string(), "1abc");
    }

    #[test]
    fn flush_changes_moves_the_base() {
        let mut buffer = TextBuffer::from("abc");
        buffer.set_text_in_range(range((0, 3), (0, 3)), Text::from("d"));
        buffer.flush_changes();
        assert_eq!(buffer.base_text().to_string(), "abcd");
        assert!(!buffer.is_modified());
        assert_eq!(buffer.layer_count(), 2);
    }

    #[test]
    fn flush_preceding_changes_keeps_later_edits() {
        let mut buffer = TextBuffer::from("abc");
        buffer.set_text_in_range(range((0, 0), (0, 0)), Text::from("<"));
        let saved = buffer.create_snapshot();
        buffer.set_text_in_range(range((0, 4), (0, 4)), Text::from(">"));

        buffer.flush_preceding_changes(&saved).unwrap();
        assert_eq!(buffer.base_text().to_string(), "<abc");
        assert_eq!(buffer.text().to_string(), "<abc>");
        assert!(buffer.is_modified());
    }

    #[test]
    fn changes_round_trip_through_serialization() {
        let mut buffer = TextBuffer::from("line one\nline two");
        buffer.set_text_in_range(range((0, 5), (0, 8)), Text::from("1"));
        buffer.create_snapshot();
        buffer.set_text_in_range(range((1, 0), (1, 0)), Text::from("> "));

        let mut bytes = Vec::new();
        buffer.serialize_changes(&mut Serializer::new(&mut bytes));

        let mut restored = TextBuffer::from("line one\nline two");
        restored
            .deserialize_changes(&mut Deserializer::new(&bytes))
            .unwrap();
        assert_eq!(restored.text(), buffer.text());
        assert_eq!(restored.size(), buffer.size());
        assert_eq!(restored.extent(), buffer.extent());

        assert!(matches!(
            restored.deserialize_changes(&mut Deserializer::new(&bytes)),
            Err(BufferError::AlreadyModified)
        ));
    }

    #[test]
    fn changes_without_text_are_rejected() {
        let mut patch = patchwork_patch::Patch::default();
        patch.splice(Point::new(0, 0), Point::new(0, 1), Point::new(0, 1), None, None, 1);
        let bytes = patch.to_bytes();

        let mut buffer = TextBuffer::from("abc");
        assert!(matches!(
            buffer.deserialize_changes(&mut Deserializer::new(&bytes)),
            Err(BufferError::MissingText { .. })
        ));
        assert!(matches!(
            buffer.deserialize_changes(&mut Deserializer::new(&bytes[..3])),
            Err(BufferError::Deserialize { .. })
        ));
    }

    fn change_bytes(start: (u32, u32), deleted: &str, inserted: &str) -> Vec<u8> {
        let mut patch = patchwork_patch::Patch::default();
        let deleted = Text::from(deleted);
        let inserted = Text::from(inserted);
        patch.splice(
            Point::new(start.0, start.1),
            deleted.extent(),
            inserted.extent(),
            Some(deleted),
            Some(inserted),
            0,
        );
        patch.to_bytes()
    }

    #[test]
    fn changes_past_the_end_of_a_line_are_rejected() {
        let mut buffer = TextBuffer::from("ab\ncd");
        let bytes = change_bytes((0, 5), "x", "Q");
        assert!(matches!(
            buffer.deserialize_changes(&mut Deserializer::new(&bytes)),
            Err(BufferError::Deserialize { .. })
        ));
        assert_eq!(buffer.text().to_string(), "ab\ncd");
        assert_eq!(buffer.size(), 5);
        assert!(!buffer.is_modified());
    }

    #[test]
    fn changes_that_disagree_with_the_text_are_rejected() {
        let mut buffer = TextBuffer::from("ab\ncd");
        let bytes = change_bytes((0, 0), "zz", "AB");
        assert!(matches!(
            buffer.deserialize_changes(&mut Deserializer::new(&bytes)),
            Err(BufferError::Deserialize { .. })
        ));

        let bytes = change_bytes((0, 0), "ab", "AB");
        buffer
            .deserialize_changes(&mut Deserializer::new(&bytes))
            .unwrap();
        assert_eq!(buffer.text().to_string(), "AB\ncd");
        assert_eq!(buffer.size(), 5);
    }

    #[test]
    fn chunks_cover_the_text() {
        let mut buffer = TextBuffer::from("abcdef");
        buffer.set_text_in_range(range((0, 2), (0, 4)), Text::from("XY\nZ"));
        let chunks: Vec<String> = buffer.chunks().iter().map(ToString::to_string).collect();
        assert_eq!(chunks, vec!["ab", "XY\nZ", "ef"]);
        let chunks: Vec<String> = buffer
            .chunks_in_range(range((0, 3), (1, 2)))
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(chunks, vec!["Y\nZ", "e"]);
    }

    #[test]
    fn dot_graph_names_every_layer() {
        let mut buffer = TextBuffer::from("abc");
        buffer.set_text_in_range(range((0, 0), (0, 1)), Text::from("A"));
        let _snapshot = buffer.create_snapshot();
        let graph = buffer.get_dot_graph();
        assert!(graph.contains("// layer 0: base text"));
        assert!(graph.contains("// layer 1"));
        assert!(graph.contains("// layer 2: live"));
    }
}
