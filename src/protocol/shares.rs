//! Share list decoding for IOCTL share-enumeration responses
//!
//! Servers answer the enumeration in one of three layouts. Each decoder is
//! lenient: it returns the shares it could decode before the data ran out
//! and an empty list when the response is too short to hold its header.

use super::messages::ioctl::ioctl_output_buffer;
use super::reader::WireReader;
use super::smb2_constants::{response_size, SMB2_HEADER_SIZE};
use crate::entry::DirectoryEntry;
use crate::error::{Error, Result};
use tracing::debug;

/// Bytes before the share records: SMB2 header plus the IOCTL response body
pub const SHARE_LIST_HEADER: usize = SMB2_HEADER_SIZE + response_size::IOCTL_RESPONSE;

/// Name length (u16) plus share type (u32)
const SHARE_RECORD_HEADER: usize = 6;

/// DCE/RPC response PDU header preceding the NDR stub
const RPC_RESPONSE_HEADER: usize = 24;

/// Fixed part of one SHARE_INFO_1 array element: name ptr, type, remark ptr
const NDR_SHARE_INFO_1_SIZE: usize = 12;

/// RAP parameter block: status, converter, entry count, available
const RAP_PARAMETER_BLOCK: usize = 8;

/// RAP share_info_1 record: 13-byte name, pad, u16 type, u32 remark pointer
const RAP_SHARE_INFO_1_SIZE: usize = 20;
const RAP_NAME_LENGTH: usize = 13;

/// Layouts understood by [`parse_shares`], in the order they are tried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareListFormat {
    /// Length-prefixed UTF-16 records after the fixed header
    Structured,
    /// NDR `SHARE_INFO_1` container inside the IOCTL output buffer
    Ndr,
    /// Fixed-width RAP `share_info_1` records
    Legacy,
}

impl ShareListFormat {
    pub const ALL: [ShareListFormat; 3] = [
        ShareListFormat::Structured,
        ShareListFormat::Ndr,
        ShareListFormat::Legacy,
    ];

    pub fn parse(self, response: &[u8]) -> Vec<DirectoryEntry> {
        match self {
            ShareListFormat::Structured => parse_share_list(response),
            ShareListFormat::Ndr => parse_share_list_ndr(response),
            ShareListFormat::Legacy => parse_share_list_legacy(response),
        }
    }
}

/// First layout that yields at least one share
pub fn parse_shares(response: &[u8]) -> Option<(ShareListFormat, Vec<DirectoryEntry>)> {
    ShareListFormat::ALL.iter().find_map(|format| {
        let shares = format.parse(response);
        if shares.is_empty() {
            None
        } else {
            Some((*format, shares))
        }
    })
}

/// Structured layout: `[name_len u16][share_type u32][name UTF-16LE]`, 4-byte aligned
pub fn parse_share_list(response: &[u8]) -> Vec<DirectoryEntry> {
    let mut shares = Vec::new();
    let mut reader = match WireReader::at(response, SHARE_LIST_HEADER) {
        Ok(reader) => reader,
        Err(_) => return shares,
    };

    while reader.remaining() >= SHARE_RECORD_HEADER {
        match read_structured_record(&mut reader) {
            Ok(Some(share)) => shares.push(share),
            // zero-length name: trailing padding
            Ok(None) => break,
            Err(e) => {
                debug!("Share record at {} does not fit: {}", reader.position(), e);
                break;
            }
        }
        reader.align(4);
    }

    shares
}

fn read_structured_record(reader: &mut WireReader<'_>) -> Result<Option<DirectoryEntry>> {
    let name_length = reader.read_u16()? as usize;
    let share_type = reader.read_u32()?;
    if name_length == 0 {
        return Ok(None);
    }
    let name = reader.read_utf16(name_length)?;
    Ok(Some(DirectoryEntry::share(name, share_type)))
}

/// NDR layout: NetShareEnumAll level 1 container after the RPC response header
pub fn parse_share_list_ndr(response: &[u8]) -> Vec<DirectoryEntry> {
    let output = match ioctl_output_buffer(response) {
        Some(output) if output.len() > RPC_RESPONSE_HEADER => output,
        _ => return Vec::new(),
    };
    let mut reader = WireReader::new(&output[RPC_RESPONSE_HEADER..]);

    let share_types = match read_ndr_container(&mut reader) {
        Ok(types) => types,
        Err(e) => {
            debug!("NDR share container rejected: {}", e);
            return Vec::new();
        }
    };

    let mut shares = Vec::with_capacity(share_types.len());
    for (has_name, share_type, has_remark) in share_types {
        let name = if has_name {
            match read_ndr_string(&mut reader) {
                Ok(name) => name,
                Err(_) => break,
            }
        } else {
            String::new()
        };
        if has_remark && read_ndr_string(&mut reader).is_err() {
            if !name.is_empty() {
                shares.push(DirectoryEntry::share(name, share_type));
            }
            break;
        }
        if !name.is_empty() {
            shares.push(DirectoryEntry::share(name, share_type));
        }
    }

    shares
}

/// Reads the fixed part of the container: one (name?, type, remark?) per share
fn read_ndr_container(reader: &mut WireReader<'_>) -> Result<Vec<(bool, u32, bool)>> {
    let level = reader.read_u32()?;
    let _switch_value = reader.read_u32()?;
    if level != 1 {
        return Err(Error::Protocol(format!("Unexpected share info level {}", level)));
    }

    let container_ptr = reader.read_u32()?;
    if container_ptr == 0 {
        return Ok(Vec::new());
    }
    let count = reader.read_u32()? as usize;
    let array_ptr = reader.read_u32()?;
    if array_ptr == 0 || count == 0 {
        return Ok(Vec::new());
    }
    let max_count = reader.read_u32()? as usize;
    let count = count.min(max_count);

    let need = count.saturating_mul(NDR_SHARE_INFO_1_SIZE);
    if need > reader.remaining() {
        return Err(Error::BufferTooSmall {
            need,
            have: reader.remaining(),
        });
    }

    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        let name_ptr = reader.read_u32()?;
        let share_type = reader.read_u32()?;
        let remark_ptr = reader.read_u32()?;
        entries.push((name_ptr != 0, share_type, remark_ptr != 0));
    }
    Ok(entries)
}

/// Conformant varying UTF-16 string: max count, offset, actual count, chars
fn read_ndr_string(reader: &mut WireReader<'_>) -> Result<String> {
    reader.align(4);
    let _max_count = reader.read_u32()?;
    let _offset = reader.read_u32()?;
    let actual_count = reader.read_u32()? as usize;
    let byte_len = actual_count.checked_mul(2).ok_or(Error::BufferTooSmall {
        need: usize::MAX,
        have: reader.remaining(),
    })?;
    reader.read_utf16(byte_len)
}

/// Legacy layout: RAP NetShareEnum parameter block followed by share_info_1 records
pub fn parse_share_list_legacy(response: &[u8]) -> Vec<DirectoryEntry> {
    let mut shares = Vec::new();
    let mut reader = match WireReader::at(response, SHARE_LIST_HEADER) {
        Ok(reader) if reader.remaining() >= RAP_PARAMETER_BLOCK => reader,
        _ => return shares,
    };

    let (status, entry_count) = match read_rap_parameters(&mut reader) {
        Ok(params) => params,
        Err(_) => return shares,
    };
    if status != 0 {
        debug!("RAP share enumeration returned status {}", status);
        return shares;
    }

    for _ in 0..entry_count {
        let record = match reader.read_bytes(RAP_SHARE_INFO_1_SIZE) {
            Ok(record) => record,
            Err(_) => break,
        };
        let name_field = &record[..RAP_NAME_LENGTH];
        let name_end = name_field
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(RAP_NAME_LENGTH);
        let name = String::from_utf8_lossy(&name_field[..name_end]).into_owned();
        let share_type = u16::from_le_bytes([record[14], record[15]]) as u32;
        if !name.is_empty() {
            shares.push(DirectoryEntry::share(name, share_type));
        }
    }

    shares
}

fn read_rap_parameters(reader: &mut WireReader<'_>) -> Result<(u16, u16)> {
    let status = reader.read_u16()?;
    let _converter = reader.read_u16()?;
    let entry_count = reader.read_u16()?;
    let _available = reader.read_u16()?;
    Ok((status, entry_count))
}
