//! SMB2 wire format: header, request bodies and response decoders

pub mod header;
pub mod messages;
pub mod reader;
pub mod shares;
pub mod smb2_constants;

pub use header::*;
pub use reader::WireReader;
pub use shares::{parse_shares, ShareListFormat};
