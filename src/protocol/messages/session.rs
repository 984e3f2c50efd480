//! SMB2 Session Setup messages

use super::SmbRequest;
use crate::error::{Error, Result};
use crate::protocol::reader::WireReader;
use crate::protocol::smb2_constants::{
    header_offsets, structure_size, SecurityMode, Smb2Capabilities, Smb2Command, SMB2_HEADER_SIZE,
};
use byteorder::{LittleEndian, WriteBytesExt};
use std::io::Write;

/// Fixed part of the request body before the security buffer
const FIXED_BODY_SIZE: usize = 24;

/// Shortest SESSION_SETUP response accepted as a success
pub const MIN_SESSION_SETUP_RESPONSE: usize = 44;

/// SMB2 SessionSetup Request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Smb2SessionSetupRequest {
    pub flags: u8,
    pub security_mode: SecurityMode,
    pub capabilities: Smb2Capabilities,
    pub channel: u32,
    pub previous_session_id: u64,
    pub security_blob: Vec<u8>,
}

impl Smb2SessionSetupRequest {
    pub fn new(security_blob: Vec<u8>) -> Self {
        Self {
            flags: 0,
            security_mode: SecurityMode::SIGNING_ENABLED,
            capabilities: Smb2Capabilities::empty(),
            channel: 0,
            previous_session_id: 0,
            security_blob,
        }
    }
}

impl SmbRequest for Smb2SessionSetupRequest {
    const COMMAND: Smb2Command = Smb2Command::SessionSetup;

    fn serialize(&self) -> Result<Vec<u8>> {
        let blob_length = u16::try_from(self.security_blob.len()).map_err(|_| {
            Error::InvalidArguments(format!(
                "Security blob too long: {} bytes",
                self.security_blob.len()
            ))
        })?;
        let mut buf = Vec::with_capacity(FIXED_BODY_SIZE + self.security_blob.len());
        buf.write_u16::<LittleEndian>(structure_size::SESSION_SETUP_REQUEST)?;
        buf.write_u8(self.flags)?;
        buf.write_u8(self.security_mode.bits() as u8)?;
        buf.write_u32::<LittleEndian>(self.capabilities.bits())?;
        buf.write_u32::<LittleEndian>(self.channel)?;

        let security_buffer_offset = if !self.security_blob.is_empty() {
            (SMB2_HEADER_SIZE + FIXED_BODY_SIZE) as u16
        } else {
            0
        };

        buf.write_u16::<LittleEndian>(security_buffer_offset)?;
        buf.write_u16::<LittleEndian>(blob_length)?;
        buf.write_u64::<LittleEndian>(self.previous_session_id)?;
        buf.write_all(&self.security_blob)?;

        Ok(buf)
    }
}

/// Session id the server assigned in a SESSION_SETUP response.
///
/// The header status is not consulted. A response long enough to count as
/// a success but cut inside the id field yields 0.
pub fn session_id_from_response(response: &[u8]) -> Result<u64> {
    if response.len() < MIN_SESSION_SETUP_RESPONSE {
        return Err(Error::InvalidData(format!(
            "SessionSetup response too short: {} bytes",
            response.len()
        )));
    }
    if response.len() < header_offsets::SESSION_ID + 8 {
        return Ok(0);
    }
    WireReader::at(response, header_offsets::SESSION_ID)?.read_u64()
}
