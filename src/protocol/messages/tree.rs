//! SMB2 Tree Connect messages

use super::SmbRequest;
use crate::error::{Error, Result};
use crate::protocol::reader::{encode_utf16le, WireReader};
use crate::protocol::smb2_constants::{
    header_offsets, structure_size, Smb2Command, SMB2_HEADER_SIZE,
};
use byteorder::{LittleEndian, WriteBytesExt};
use std::io::Write;

/// Shortest TREE_CONNECT response accepted as a success
pub const MIN_TREE_CONNECT_RESPONSE: usize = 16;

/// SMB2 TreeConnect Request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Smb2TreeConnectRequest {
    pub flags: u16,
    pub path: String,
}

impl Smb2TreeConnectRequest {
    pub fn new(path: String) -> Self {
        Self { flags: 0, path }
    }

    /// Request for `\\<host>\<share>`
    pub fn for_share(host: &str, share: &str) -> Self {
        Self::new(format!("\\\\{}\\{}", host, share))
    }
}

impl SmbRequest for Smb2TreeConnectRequest {
    const COMMAND: Smb2Command = Smb2Command::TreeConnect;

    fn serialize(&self) -> Result<Vec<u8>> {
        let path_bytes = encode_utf16le(&self.path);
        let path_length = u16::try_from(path_bytes.len()).map_err(|_| {
            Error::InvalidArguments(format!("Share path too long: {} bytes", path_bytes.len()))
        })?;
        let mut buf = Vec::with_capacity(8 + path_bytes.len());

        let path_offset = if !path_bytes.is_empty() {
            (SMB2_HEADER_SIZE + 8) as u16
        } else {
            0
        };

        buf.write_u16::<LittleEndian>(structure_size::TREE_CONNECT_REQUEST)?;
        buf.write_u16::<LittleEndian>(self.flags)?;
        buf.write_u16::<LittleEndian>(path_offset)?;
        buf.write_u16::<LittleEndian>(path_length)?;
        buf.write_all(&path_bytes)?;

        Ok(buf)
    }
}

/// Tree id the server assigned in a TREE_CONNECT response, 0 when the
/// response ends before the id field
pub fn tree_id_from_response(response: &[u8]) -> Result<u32> {
    if response.len() < MIN_TREE_CONNECT_RESPONSE {
        return Err(Error::InvalidData(format!(
            "TreeConnect response too short: {} bytes",
            response.len()
        )));
    }
    if response.len() < header_offsets::TREE_ID + 4 {
        return Ok(0);
    }
    WireReader::at(response, header_offsets::TREE_ID)?.read_u32()
}
