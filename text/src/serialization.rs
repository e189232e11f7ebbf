//! Fixed-width little-endian encoding used to move patches across process
//! boundaries.

use snafu::Snafu;

pub type Result<T, E = DeserializeError> = std::result::Result<T, E>;

/// Errors produced while decoding a serialized value
#[derive(Debug, Snafu, PartialEq, Eq)]
#[snafu(visibility(pub))]
pub enum DeserializeError {
    #[snafu(display("Unexpected end of input: needed {needed} bytes, {remaining} remaining"))]
    UnexpectedEof { needed: usize, remaining: usize },

    #[snafu(display("Unsupported serialization version {found} (expected {expected})"))]
    UnsupportedVersion { found: u32, expected: u32 },

    #[snafu(display("Corrupt serialized data: {message}"))]
    Corrupt { message: String },
}

/// Appends little-endian integers to a byte vector.
pub struct Serializer<'a> {
    output: &'a mut Vec<u8>,
}

impl<'a> Serializer<'a> {
    pub fn new(output: &'a mut Vec<u8>) -> Self {
        Self { output }
    }

    pub fn append_u8(&mut self, value: u8) {
        self.output.push(value);
    }

    pub fn append_u16(&mut self, value: u16) {
        self.output.extend_from_slice(&value.to_le_bytes());
    }

    pub fn append_u32(&mut self, value: u32) {
        self.output.extend_from_slice(&value.to_le_bytes());
    }

    /// Number of bytes written so far, including anything already in the vector.
    pub fn len(&self) -> usize {
        self.output.len()
    }

    pub fn is_empty(&self) -> bool {
        self.output.is_empty()
    }
}

/// Reads little-endian integers from a byte slice.
pub struct Deserializer<'a> {
    input: &'a [u8],
    position: usize,
}

impl<'a> Deserializer<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, position: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.input.len() - self.position
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        let remaining = self.remaining();
        if remaining < N {
            return UnexpectedEofSnafu {
                needed: N,
                remaining,
            }
            .fail();
        }
        let mut bytes = [0; N];
        bytes.copy_from_slice(&self.input[self.position..self.position + N]);
        self.position += N;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.take()?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take()?))
    }

    /// Reads a `u32` without consuming it.
    pub fn peek_u32(&self) -> Result<u32> {
        let remaining = self.remaining();
        if remaining < 4 {
            return UnexpectedEofSnafu {
                needed: 4usize,
                remaining,
            }
            .fail();
        }
        let mut bytes = [0; 4];
        bytes.copy_from_slice(&self.input[self.position..self.position + 4]);
        Ok(u32::from_le_bytes(bytes))
    }
}
