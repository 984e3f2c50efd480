//! SMB2 protocol constants

use bitflags::bitflags;
use std::convert::TryFrom;

/// SMB2 magic as bytes
pub const SMB2_MAGIC: [u8; 4] = [0xFE, b'S', b'M', b'B'];

/// SMB2 magic as u32
pub const SMB2_MAGIC_U32: u32 = 0x424D53FE;

/// SMB2 header size
pub const SMB2_HEADER_SIZE: usize = 64;

/// Fixed offsets into the SMB2 sync header
pub mod header_offsets {
    pub const STATUS: usize = 8;
    pub const COMMAND: usize = 12;
    pub const MESSAGE_ID: usize = 24;
    pub const TREE_ID: usize = 36;
    pub const SESSION_ID: usize = 40;
}

/// Structure sizes for the SMB2 messages this client speaks
pub mod structure_size {
    pub const NEGOTIATE_REQUEST: u16 = 36;
    pub const SESSION_SETUP_REQUEST: u16 = 25;
    pub const TREE_CONNECT_REQUEST: u16 = 9;
    pub const IOCTL_REQUEST: u16 = 57;
    pub const QUERY_DIRECTORY_REQUEST: u16 = 33;
}

/// Size of the fixed part of response bodies
pub mod response_size {
    pub const IOCTL_RESPONSE: usize = 48;
    pub const QUERY_DIRECTORY_RESPONSE: usize = 8;
}

/// IOCTL control codes
pub mod ctl_code {
    /// Transact on a named pipe (used for the share enumeration request)
    pub const FSCTL_PIPE_TRANSCEIVE: u32 = 0x0011C017;
}

/// IOCTL request flags
pub mod ioctl_flags {
    pub const IS_FSCTL: u32 = 0x00000001;
}

/// QUERY_DIRECTORY request flags
pub mod query_directory_flags {
    pub const SMB2_RESTART_SCANS: u8 = 0x01;
    pub const SMB2_RETURN_SINGLE_ENTRY: u8 = 0x02;
    pub const SMB2_INDEX_SPECIFIED: u8 = 0x04;
    pub const SMB2_REOPEN: u8 = 0x10;
}

/// File information classes used by QUERY_DIRECTORY
pub mod file_information_class {
    pub const FILE_DIRECTORY_INFORMATION: u8 = 0x01;
}

/// SMB2 Commands (opcodes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Smb2Command {
    Negotiate = 0x00,
    SessionSetup = 0x01,
    Logoff = 0x02,
    TreeConnect = 0x03,
    TreeDisconnect = 0x04,
    Create = 0x05,
    Close = 0x06,
    Read = 0x08,
    Write = 0x09,
    Ioctl = 0x0B,
    Echo = 0x0D,
    QueryDirectory = 0x0E,
}

impl TryFrom<u16> for Smb2Command {
    type Error = crate::Error;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Self::Negotiate),
            0x01 => Ok(Self::SessionSetup),
            0x02 => Ok(Self::Logoff),
            0x03 => Ok(Self::TreeConnect),
            0x04 => Ok(Self::TreeDisconnect),
            0x05 => Ok(Self::Create),
            0x06 => Ok(Self::Close),
            0x08 => Ok(Self::Read),
            0x09 => Ok(Self::Write),
            0x0B => Ok(Self::Ioctl),
            0x0D => Ok(Self::Echo),
            0x0E => Ok(Self::QueryDirectory),
            _ => Err(crate::Error::Protocol(format!(
                "Unsupported SMB2 command: 0x{:04x}",
                value
            ))),
        }
    }
}

bitflags! {
    /// SMB2 header flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Smb2HeaderFlags: u32 {
        const SERVER_TO_REDIR = 0x00000001;
        const ASYNC_COMMAND = 0x00000002;
        const RELATED_OPERATIONS = 0x00000004;
        const SIGNED = 0x00000008;
        const DFS_OPERATIONS = 0x10000000;
    }
}

bitflags! {
    /// SMB2 negotiate security mode
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SecurityMode: u16 {
        const SIGNING_ENABLED = 0x0001;
        const SIGNING_REQUIRED = 0x0002;
    }
}

bitflags! {
    /// SMB2 capabilities
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Smb2Capabilities: u32 {
        const DFS = 0x00000001;
        const LEASING = 0x00000002;
        const LARGE_MTU = 0x00000004;
    }
}

bitflags! {
    /// File attributes as defined in MS-FSCC
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FileAttributes: u32 {
        const READONLY            = 0x00000001;
        const HIDDEN              = 0x00000002;
        const SYSTEM              = 0x00000004;
        const DIRECTORY           = 0x00000010;
        const ARCHIVE             = 0x00000020;
        const NORMAL              = 0x00000080;
    }
}

/// Share types as reported by the server service
pub mod share_type {
    pub const DISK_TREE: u32 = 0x00000000;
    pub const PRINT_QUEUE: u32 = 0x00000001;
    pub const DEVICE: u32 = 0x00000002;
    pub const IPC: u32 = 0x00000003;
    pub const SPECIAL: u32 = 0x80000000;
}

/// SMB2 dialect versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u16)]
pub enum Smb2Dialect {
    Smb202 = 0x0202,
    Smb210 = 0x0210,
    Smb300 = 0x0300,
    Smb302 = 0x0302,
    Smb311 = 0x0311,
}

impl Smb2Dialect {
    pub fn to_u16(self) -> u16 {
        self as u16
    }
}
