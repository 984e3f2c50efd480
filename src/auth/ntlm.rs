//! NTLM authenticate blob
//!
//! The blob is the signature, the AUTHENTICATE message type and the UTF-16LE
//! user and domain names back to back. There is no field table, no
//! workstation and no response computation, so servers that enforce NTLM
//! reject it; the password never leaves the process.

use crate::protocol::reader::encode_utf16le;

/// NTLM signature - "NTLMSSP\0"
pub const NTLMSSP_SIGNATURE: &[u8] = b"NTLMSSP\0";

/// Message type of the final AUTHENTICATE message
pub const NTLMSSP_AUTHENTICATE: u32 = 0x00000003;

/// Build the AUTHENTICATE blob for `username` in `domain`
pub fn authenticate_blob(username: &str, domain: &str) -> Vec<u8> {
    let user = encode_utf16le(username);
    let domain = encode_utf16le(domain);

    let mut blob = Vec::with_capacity(NTLMSSP_SIGNATURE.len() + 4 + user.len() + domain.len());
    blob.extend_from_slice(NTLMSSP_SIGNATURE);
    blob.extend_from_slice(&NTLMSSP_AUTHENTICATE.to_le_bytes());
    blob.extend_from_slice(&user);
    blob.extend_from_slice(&domain);
    blob
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_layout() {
        let blob = authenticate_blob("bob", "HOME");
        assert_eq!(&blob[0..8], b"NTLMSSP\0");
        assert_eq!(&blob[8..12], &[3, 0, 0, 0]);
        assert_eq!(&blob[12..18], &[b'b', 0, b'o', 0, b'b', 0]);
        assert_eq!(&blob[18..], encode_utf16le("HOME").as_slice());
    }

    #[test]
    fn test_empty_domain() {
        let blob = authenticate_blob("guest", "");
        assert_eq!(blob.len(), 12 + 10);
        assert_eq!(&blob[12..], encode_utf16le("guest").as_slice());
    }
}
