//! SMB2 protocol messages organized by category

pub mod directory;
pub mod ioctl;
pub mod negotiate;
pub mod session;
pub mod tree;

use crate::error::Result;
use crate::protocol::header::Smb2Header;
use crate::protocol::smb2_constants::Smb2Command;

// Re-export commonly used types
pub use directory::{parse_directory_listing, Smb2QueryDirectoryRequest};
pub use ioctl::{Smb2IoctlRequest, FileId};
pub use negotiate::Smb2NegotiateRequest;
pub use session::Smb2SessionSetupRequest;
pub use tree::Smb2TreeConnectRequest;

/// Trait for request bodies the client sends
pub trait SmbRequest {
    /// Command code carried in the header
    const COMMAND: Smb2Command;

    /// Serialize the body (everything after the 64-byte header)
    fn serialize(&self) -> Result<Vec<u8>>;
}

/// Build one complete frame: header followed by the request body
pub fn encode_request<R: SmbRequest>(
    request: &R,
    message_id: u64,
    session_id: u64,
    tree_id: u32,
) -> Result<Vec<u8>> {
    let header = Smb2Header::request(R::COMMAND, message_id, session_id, tree_id);
    let mut frame = header.serialize()?;
    frame.extend_from_slice(&request.serialize()?);
    Ok(frame)
}

/// Raw NT status of a response, if the header is long enough to carry one
pub fn response_status(buf: &[u8]) -> Option<u32> {
    use crate::protocol::reader::WireReader;
    use crate::protocol::smb2_constants::header_offsets;

    WireReader::at(buf, header_offsets::STATUS)
        .and_then(|mut reader| reader.read_u32())
        .ok()
}
