use patchwork_text::{DeserializeError, Point};
use snafu::Snafu;

pub type Result<T, E = BufferError> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum BufferError {
    #[snafu(display("Snapshot is not part of this buffer's history"))]
    UnknownSnapshot,

    #[snafu(display("Cannot load changes into a buffer with unsaved modifications"))]
    AlreadyModified,

    #[snafu(display("Loaded change at {position} does not carry its new text"))]
    MissingText { position: Point },

    #[snafu(display("Failed to deserialize changes: {source}"))]
    Deserialize { source: DeserializeError },
}
