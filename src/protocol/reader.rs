//! Bounds-checked cursor over untrusted response bytes
//!
//! Every read checks the remaining length first and fails with
//! [`Error::BufferTooSmall`] instead of indexing past the end.

use crate::error::{Error, Result};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

pub struct WireReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> WireReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
        }
    }

    /// Reader positioned at `offset`, failing if the offset is past the end
    pub fn at(data: &'a [u8], offset: usize) -> Result<Self> {
        let mut reader = Self::new(data);
        reader.seek(offset)?;
        Ok(reader)
    }

    pub fn len(&self) -> usize {
        self.cursor.get_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn position(&self) -> usize {
        self.cursor.position() as usize
    }

    pub fn remaining(&self) -> usize {
        self.len().saturating_sub(self.position())
    }

    /// Move to an absolute offset (the end itself is allowed)
    pub fn seek(&mut self, offset: usize) -> Result<()> {
        if offset > self.len() {
            return Err(Error::BufferTooSmall {
                need: offset,
                have: self.len(),
            });
        }
        self.cursor.set_position(offset as u64);
        Ok(())
    }

    pub fn skip(&mut self, count: usize) -> Result<()> {
        let target = self.position().checked_add(count).ok_or(Error::BufferTooSmall {
            need: usize::MAX,
            have: self.len(),
        })?;
        self.seek(target)
    }

    /// Skip padding up to the next multiple of `alignment`, clamped to the end
    pub fn align(&mut self, alignment: usize) {
        let pos = self.position();
        let padding = (alignment - (pos % alignment)) % alignment;
        let target = (pos + padding).min(self.len());
        self.cursor.set_position(target as u64);
    }

    fn ensure(&self, need: usize) -> Result<()> {
        if self.remaining() < need {
            return Err(Error::BufferTooSmall {
                need,
                have: self.remaining(),
            });
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.cursor.read_u8()?)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.ensure(2)?;
        Ok(self.cursor.read_u16::<LittleEndian>()?)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.ensure(4)?;
        Ok(self.cursor.read_u32::<LittleEndian>()?)
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.ensure(8)?;
        Ok(self.cursor.read_u64::<LittleEndian>()?)
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        self.ensure(count)?;
        let start = self.position();
        let data: &'a [u8] = *self.cursor.get_ref();
        self.cursor.set_position((start + count) as u64);
        Ok(&data[start..start + count])
    }

    /// Decode `byte_len` bytes of UTF-16LE, trailing NULs dropped
    pub fn read_utf16(&mut self, byte_len: usize) -> Result<String> {
        let bytes = self.read_bytes(byte_len)?;
        Ok(decode_utf16le(bytes))
    }
}

/// Lossy UTF-16LE decode; an odd trailing byte and trailing NULs are ignored
pub fn decode_utf16le(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    let end = units.iter().rposition(|&c| c != 0).map_or(0, |i| i + 1);
    String::from_utf16_lossy(&units[..end])
}

/// UTF-16LE encoding of a string, no terminator
pub fn encode_utf16le(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(|c| c.to_le_bytes()).collect()
}
