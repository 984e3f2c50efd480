//! SMB2 Negotiate messages

use super::SmbRequest;
use crate::error::Result;
use crate::protocol::reader::WireReader;
use crate::protocol::smb2_constants::{
    structure_size, SecurityMode, Smb2Capabilities, Smb2Command, Smb2Dialect, SMB2_HEADER_SIZE,
};
use byteorder::{LittleEndian, WriteBytesExt};
use std::io::Write;
use uuid::Uuid;

/// SMB2 Negotiate Request offering a single dialect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Smb2NegotiateRequest {
    pub security_mode: SecurityMode,
    pub capabilities: Smb2Capabilities,
    pub client_guid: Uuid,
    pub dialect: Smb2Dialect,
}

impl Smb2NegotiateRequest {
    pub fn new(client_guid: Uuid) -> Self {
        Self {
            security_mode: SecurityMode::SIGNING_ENABLED,
            capabilities: Smb2Capabilities::empty(),
            client_guid,
            dialect: Smb2Dialect::Smb202,
        }
    }

    pub fn with_dialect(mut self, dialect: Smb2Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_security(mut self, mode: SecurityMode, capabilities: Smb2Capabilities) -> Self {
        self.security_mode = mode;
        self.capabilities = capabilities;
        self
    }
}

impl SmbRequest for Smb2NegotiateRequest {
    const COMMAND: Smb2Command = Smb2Command::Negotiate;

    fn serialize(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(38);
        buf.write_u16::<LittleEndian>(structure_size::NEGOTIATE_REQUEST)?;
        buf.write_u16::<LittleEndian>(1)?; // dialect count
        buf.write_u16::<LittleEndian>(self.security_mode.bits())?;
        buf.write_u16::<LittleEndian>(0)?; // reserved
        buf.write_u32::<LittleEndian>(self.capabilities.bits())?;
        buf.write_all(self.client_guid.as_bytes())?;
        buf.write_u64::<LittleEndian>(0)?; // client start time
        buf.write_u16::<LittleEndian>(self.dialect.to_u16())?;
        Ok(buf)
    }
}

/// Dialect revision chosen by the server, if the response carries one
pub fn negotiated_dialect(response: &[u8]) -> Option<u16> {
    let mut reader = WireReader::at(response, SMB2_HEADER_SIZE + 4).ok()?;
    reader.read_u16().ok()
}
