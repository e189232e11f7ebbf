//! Text primitives for patchwork
//!
//! This crate provides the leaf types the patch engine is built on:
//! - [`Point`] and [`Range`] - two-dimensional positions and half-open ranges
//! - [`Text`] and [`TextSlice`] - UTF-16 content with a line index
//! - [`Serializer`] and [`Deserializer`] - the little-endian wire codec

mod point;
mod range;
mod serialization;
mod text;

pub use point::Point;
pub use range::Range;
pub use serialization::{
    CorruptSnafu, DeserializeError, Deserializer, Result, Serializer, UnexpectedEofSnafu,
    UnsupportedVersionSnafu,
};
pub use text::{ClipResult, Text, TextSlice};
