//! SMB2 Directory operations messages

use super::ioctl::FileId;
use super::SmbRequest;
use crate::entry::{filetime_to_utc, DirectoryEntry};
use crate::error::{Error, Result};
use crate::protocol::reader::{encode_utf16le, WireReader};
use crate::protocol::smb2_constants::{
    file_information_class, query_directory_flags, response_size, structure_size,
    FileAttributes, Smb2Command, SMB2_HEADER_SIZE,
};
use byteorder::{LittleEndian, WriteBytesExt};
use tracing::debug;

/// Bytes before the first FILE_DIRECTORY_INFORMATION record
pub const DIRECTORY_LIST_HEADER: usize =
    SMB2_HEADER_SIZE + response_size::QUERY_DIRECTORY_RESPONSE;

/// Field offsets inside a FILE_DIRECTORY_INFORMATION record
mod entry_offsets {
    pub const LAST_WRITE_TIME: usize = 24;
    pub const END_OF_FILE: usize = 40;
    pub const FILE_ATTRIBUTES: usize = 56;
    pub const FILE_NAME_LENGTH: usize = 60;
    pub const FILE_NAME: usize = 64;
}

/// SMB2 QUERY_DIRECTORY Request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Smb2QueryDirectoryRequest {
    pub file_information_class: u8,
    pub flags: u8,
    pub file_index: u32,
    pub file_id: FileId,
    pub output_buffer_length: u32,
    pub file_name: String,
}

impl Smb2QueryDirectoryRequest {
    pub fn new(path: &str, output_buffer_length: u32) -> Self {
        Self {
            file_information_class: file_information_class::FILE_DIRECTORY_INFORMATION,
            flags: query_directory_flags::SMB2_RESTART_SCANS,
            file_index: 0,
            file_id: FileId::ANY,
            output_buffer_length,
            file_name: path.to_string(),
        }
    }
}

impl SmbRequest for Smb2QueryDirectoryRequest {
    const COMMAND: Smb2Command = Smb2Command::QueryDirectory;

    fn serialize(&self) -> Result<Vec<u8>> {
        let file_name_bytes = encode_utf16le(&self.file_name);
        let file_name_length = u16::try_from(file_name_bytes.len()).map_err(|_| {
            Error::InvalidArguments(format!(
                "Directory path too long: {} bytes",
                file_name_bytes.len()
            ))
        })?;
        let mut buf = Vec::with_capacity(32 + file_name_bytes.len());

        buf.write_u16::<LittleEndian>(structure_size::QUERY_DIRECTORY_REQUEST)?;
        buf.write_u8(self.file_information_class)?;
        buf.write_u8(self.flags)?;
        buf.write_u32::<LittleEndian>(self.file_index)?;
        buf.write_u64::<LittleEndian>(self.file_id.persistent)?;
        buf.write_u64::<LittleEndian>(self.file_id.volatile)?;

        let file_name_offset = if !file_name_bytes.is_empty() {
            SMB2_HEADER_SIZE + 32
        } else {
            0
        };

        buf.write_u16::<LittleEndian>(file_name_offset as u16)?;
        buf.write_u16::<LittleEndian>(file_name_length)?;
        buf.write_u32::<LittleEndian>(self.output_buffer_length)?;
        buf.extend_from_slice(&file_name_bytes);

        Ok(buf)
    }
}

/// Decode the FILE_DIRECTORY_INFORMATION chain of a QUERY_DIRECTORY response.
///
/// Entries are followed through their next-entry offsets until a zero
/// offset or a record that does not fit; whatever decoded before that is
/// returned.
pub fn parse_directory_listing(response: &[u8]) -> Vec<DirectoryEntry> {
    let mut entries = Vec::new();
    if response.len() < DIRECTORY_LIST_HEADER {
        return entries;
    }

    let mut offset = DIRECTORY_LIST_HEADER;
    loop {
        let (entry, next_entry_offset) = match parse_entry(response, offset) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("Directory listing truncated at offset {}: {}", offset, e);
                break;
            }
        };
        entries.push(entry);

        if next_entry_offset == 0 {
            break;
        }
        offset = match offset.checked_add(next_entry_offset as usize) {
            Some(next) => next,
            None => break,
        };
    }

    entries
}

fn parse_entry(buf: &[u8], offset: usize) -> Result<(DirectoryEntry, u32)> {
    let mut reader = WireReader::at(buf, offset)?;
    let next_entry_offset = reader.read_u32()?;

    reader.seek(offset + entry_offsets::LAST_WRITE_TIME)?;
    let last_write_time = reader.read_u64()?;

    reader.seek(offset + entry_offsets::END_OF_FILE)?;
    let end_of_file = reader.read_u64()?;

    reader.seek(offset + entry_offsets::FILE_ATTRIBUTES)?;
    let attributes = reader.read_u32()?;

    reader.seek(offset + entry_offsets::FILE_NAME_LENGTH)?;
    let name_length = reader.read_u16()? as usize;

    reader.seek(offset + entry_offsets::FILE_NAME)?;
    let name = reader.read_utf16(name_length)?;

    let is_directory = FileAttributes::from_bits_retain(attributes).contains(FileAttributes::DIRECTORY);
    let mut entry = DirectoryEntry::file(name, attributes, is_directory);
    if !is_directory {
        entry.size = end_of_file;
    }
    entry.modified = filetime_to_utc(last_write_time);

    Ok((entry, next_entry_offset))
}
