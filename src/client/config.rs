//! Client configuration

use crate::protocol::smb2_constants::{SecurityMode, Smb2Capabilities, Smb2Dialect};
use std::time::Duration;
use uuid::Uuid;

/// Default SMB port (direct TCP)
pub const DEFAULT_PORT: u16 = 445;

/// SMB client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Client GUID sent in NEGOTIATE
    pub client_guid: Uuid,
    /// The single dialect offered
    pub dialect: Smb2Dialect,
    pub security_mode: SecurityMode,
    pub capabilities: Smb2Capabilities,
    /// Port used when the caller does not give one
    pub default_port: u16,
    /// Bound on each request/response exchange
    pub request_timeout: Duration,
    /// Bound on opening the TCP connection
    pub connect_timeout: Duration,
    /// Share bound during authentication
    pub admin_share: String,
    /// Output buffer size requested from IOCTL and QUERY_DIRECTORY
    pub max_output_response: u32,
    /// Return made-up drive letters when share enumeration fails
    pub synthetic_drive_fallback: bool,
    /// Fail the handshake on an error status or a zero session id instead
    /// of accepting any response of sufficient length
    pub strict_handshake: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            client_guid: Uuid::new_v4(),
            dialect: Smb2Dialect::Smb202,
            security_mode: SecurityMode::SIGNING_ENABLED,
            capabilities: Smb2Capabilities::empty(),
            default_port: DEFAULT_PORT,
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(30),
            admin_share: String::from("IPC$"),
            max_output_response: 64 * 1024,
            synthetic_drive_fallback: true,
            strict_handshake: false,
        }
    }
}

impl ClientConfig {
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_default_port(mut self, port: u16) -> Self {
        self.default_port = port;
        self
    }

    pub fn with_synthetic_drive_fallback(mut self, enabled: bool) -> Self {
        self.synthetic_drive_fallback = enabled;
        self
    }

    pub fn with_strict_handshake(mut self, enabled: bool) -> Self {
        self.strict_handshake = enabled;
        self
    }
}
