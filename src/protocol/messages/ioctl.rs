//! SMB2 IOCTL request and response messages

use super::SmbRequest;
use crate::error::Result;
use crate::protocol::reader::WireReader;
use crate::protocol::smb2_constants::{
    ctl_code, ioctl_flags, response_size, structure_size, Smb2Command, SMB2_HEADER_SIZE,
};
use byteorder::{LittleEndian, WriteBytesExt};

/// File ID for SMB2 operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId {
    pub persistent: u64,
    pub volatile: u64,
}

impl FileId {
    /// The all-ones id that refers to the previously opened handle
    pub const ANY: FileId = FileId {
        persistent: u64::MAX,
        volatile: u64::MAX,
    };
}

/// SMB2 IOCTL request structure
#[derive(Debug, Clone)]
pub struct Smb2IoctlRequest {
    pub ctl_code: u32,
    pub file_id: FileId,
    pub max_input_response: u32,
    pub max_output_response: u32,
    pub flags: u32,
    pub input_buffer: Vec<u8>,
}

impl Smb2IoctlRequest {
    /// Share enumeration request over the server service pipe
    pub fn share_enumeration(max_output_response: u32) -> Self {
        Self {
            ctl_code: ctl_code::FSCTL_PIPE_TRANSCEIVE,
            file_id: FileId::ANY,
            max_input_response: 0,
            max_output_response,
            flags: ioctl_flags::IS_FSCTL,
            input_buffer: Vec::new(),
        }
    }
}

impl SmbRequest for Smb2IoctlRequest {
    const COMMAND: Smb2Command = Smb2Command::Ioctl;

    fn serialize(&self) -> Result<Vec<u8>> {
        let mut result = Vec::with_capacity(56 + self.input_buffer.len());

        result.write_u16::<LittleEndian>(structure_size::IOCTL_REQUEST)?;
        result.write_u16::<LittleEndian>(0)?; // reserved
        result.write_u32::<LittleEndian>(self.ctl_code)?;
        result.write_u64::<LittleEndian>(self.file_id.persistent)?;
        result.write_u64::<LittleEndian>(self.file_id.volatile)?;

        let input_offset: u32 = if !self.input_buffer.is_empty() {
            (SMB2_HEADER_SIZE + 56) as u32
        } else {
            0
        };

        result.write_u32::<LittleEndian>(input_offset)?;
        result.write_u32::<LittleEndian>(self.input_buffer.len() as u32)?;
        result.write_u32::<LittleEndian>(self.max_input_response)?;
        result.write_u32::<LittleEndian>(0)?; // output offset
        result.write_u32::<LittleEndian>(0)?; // output count
        result.write_u32::<LittleEndian>(self.max_output_response)?;
        result.write_u32::<LittleEndian>(self.flags)?;
        result.write_u32::<LittleEndian>(0)?; // reserved2

        result.extend_from_slice(&self.input_buffer);

        Ok(result)
    }
}

/// Output buffer of an IOCTL response, located through its offset/count fields
pub fn ioctl_output_buffer(response: &[u8]) -> Option<&[u8]> {
    if response.len() < SMB2_HEADER_SIZE + response_size::IOCTL_RESPONSE {
        return None;
    }
    let mut reader = WireReader::at(response, SMB2_HEADER_SIZE + 32).ok()?;
    let output_offset = reader.read_u32().ok()? as usize;
    let output_count = reader.read_u32().ok()? as usize;
    if output_count == 0 {
        return None;
    }
    let mut reader = WireReader::at(response, output_offset).ok()?;
    reader.read_bytes(output_count).ok()
}
