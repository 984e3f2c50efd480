//! Direct-TCP session framing
//!
//! Every SMB2 message on port 445 is preceded by a 4-byte header: one type
//! byte and a 24-bit big-endian payload length.

use crate::error::{Error, Result};
use bytes::BufMut;
use std::convert::TryFrom;

pub mod frame;

/// Session service message types seen on a direct-TCP connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NetBiosMessageType {
    SessionMessage = 0x00,
    Keepalive = 0x85,
}

impl TryFrom<u8> for NetBiosMessageType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x00 => Ok(NetBiosMessageType::SessionMessage),
            0x85 => Ok(NetBiosMessageType::Keepalive),
            _ => Err(Error::Protocol(format!(
                "Invalid session message type: 0x{:02x}",
                value
            ))),
        }
    }
}

/// Session message header (4 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetBiosHeader {
    pub message_type: NetBiosMessageType,
    pub length: u32,
}

impl NetBiosHeader {
    /// Largest length the 24-bit field can carry
    pub const MAX_LENGTH: u32 = 0x00FF_FFFF;

    /// Header size in bytes
    pub const SIZE: usize = 4;

    pub fn new(message_type: NetBiosMessageType, length: u32) -> Result<Self> {
        if length > Self::MAX_LENGTH {
            return Err(Error::InvalidArguments(format!(
                "Frame length {} exceeds maximum {}",
                length,
                Self::MAX_LENGTH
            )));
        }
        Ok(Self {
            message_type,
            length,
        })
    }

    pub fn session_message(length: u32) -> Result<Self> {
        Self::new(NetBiosMessageType::SessionMessage, length)
    }

    pub fn parse(buf: &[u8]) -> Result<Self> {
        if buf.len() < Self::SIZE {
            return Err(Error::BufferTooSmall {
                need: Self::SIZE,
                have: buf.len(),
            });
        }

        let message_type = NetBiosMessageType::try_from(buf[0])?;
        let length = ((buf[1] as u32) << 16) | ((buf[2] as u32) << 8) | (buf[3] as u32);

        Ok(Self {
            message_type,
            length,
        })
    }

    pub fn to_bytes(&self) -> [u8; 4] {
        let len = self.length.to_be_bytes();
        [self.message_type as u8, len[1], len[2], len[3]]
    }

    pub fn write_to<B: BufMut>(&self, buf: &mut B) {
        buf.put_slice(&self.to_bytes());
    }
}
