//! # Byte Channels
//!
//! Minimal non-blocking byte I/O used by the command line and the transfer
//! link. Text output to the operator goes through `core::fmt::Write`.

/// Non-blocking byte input.
pub trait ByteSource {
    /// Next available byte, or `None` if nothing is pending right now.
    fn read_byte(&mut self) -> Option<u8>;
}

/// Blocking byte output. Returns once every byte has been accepted.
pub trait ByteSink {
    fn write_bytes(&mut self, bytes: &[u8]);
}

/// Serves a fixed byte string, then reports no input forever.
pub struct SliceSource<'s> {
    bytes: &'s [u8],
    pos: usize,
}

impl<'s> SliceSource<'s> {
    pub const fn new(bytes: &'s [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }
}

impl ByteSource for SliceSource<'_> {
    fn read_byte(&mut self) -> Option<u8> {
        let b = *self.bytes.get(self.pos)?;
        self.pos += 1;
        Some(b)
    }
}
