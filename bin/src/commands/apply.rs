use anyhow::{Context, Result};
use patchwork_buffer::{BufferConfig, TextBuffer};
use patchwork_text::{Deserializer, Text};
use std::{fs, io::Write, path::Path};

/// Loads `base` into a buffer, replays the serialized buffer changes in
/// `changes`, and writes the resulting text.
pub(super) fn apply(
    changes: &Path,
    base: &Path,
    config: Option<&Path>,
    output: Option<&Path>,
    out: &mut impl Write,
) -> Result<()> {
    let config = BufferConfig::load_with_overrides(config, None)?;
    let text = fs::read_to_string(base)
        .with_context(|| format!("Failed to read base text: {}", base.display()))?;
    let bytes = fs::read(changes)
        .with_context(|| format!("Failed to read changes file: {}", changes.display()))?;

    let mut buffer = TextBuffer::with_config(Text::from(text), config);
    buffer
        .deserialize_changes(&mut Deserializer::new(&bytes))
        .with_context(|| format!("Failed to apply changes from {}", changes.display()))?;
    tracing::debug!(size = buffer.size(), "applied changes");

    let result = buffer.text().to_string();
    match output {
        Some(path) => fs::write(path, result)
            .with_context(|| format!("Failed to write text: {}", path.display()))?,
        None => out.write_all(result.as_bytes())?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchwork_text::{Point, Range, Serializer};

    fn recorded_changes(base: &str, dir: &Path) -> std::path::PathBuf {
        let mut buffer = TextBuffer::from(base);
        buffer.set_text_in_range(
            Range::new(Point::new(0, 0), Point::new(0, 3)),
            Text::from("one"),
        );
        buffer.create_snapshot();
        buffer.set_text_in_range(
            Range::new(Point::new(1, 3), Point::new(1, 3)),
            Text::from("!"),
        );
        let mut bytes = Vec::new();
        buffer.serialize_changes(&mut Serializer::new(&mut bytes));

        let path = dir.join("edits.changes");
        fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn replays_changes_onto_the_base() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("base.txt");
        fs::write(&base, "1st\ntwo").unwrap();
        let changes = recorded_changes("1st\ntwo", dir.path());

        let mut out = Vec::new();
        apply(&changes, &base, None, None, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "one\ntwo!");

        let written = dir.path().join("result.txt");
        apply(&changes, &base, None, Some(&written), &mut Vec::<u8>::new()).unwrap();
        assert_eq!(fs::read_to_string(written).unwrap(), "one\ntwo!");
    }

    #[test]
    fn honours_a_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("base.txt");
        fs::write(&base, "1st\ntwo").unwrap();
        let changes = recorded_changes("1st\ntwo", dir.path());
        let config = dir.path().join("buffer.toml");
        fs::write(&config, "merges_adjacent_changes = false\n").unwrap();

        let mut out = Vec::new();
        apply(&changes, &base, Some(&config), None, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "one\ntwo!");

        fs::write(&config, "unknown_option = 1\n").unwrap();
        assert!(apply(&changes, &base, Some(&config), None, &mut Vec::<u8>::new()).is_err());
    }

    #[test]
    fn changes_past_the_end_of_the_base_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("base.txt");
        fs::write(&base, "1").unwrap();
        let changes = recorded_changes("1st\ntwo", dir.path());
        let error = apply(&changes, &base, None, None, &mut Vec::<u8>::new()).unwrap_err();
        assert!(error.to_string().contains("Failed to apply changes"));
    }
}
