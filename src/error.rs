//! Error types for the SMB share browser

use std::convert::TryFrom;
use std::fmt;
use std::io;
use thiserror::Error;

/// Result type for SMB operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for SMB client operations
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A required argument was missing or empty
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The transport could not be opened
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Authentication failed or has not happened yet
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// No usable connection for the request
    #[error("Not connected")]
    NotConnected,

    /// Share or directory enumeration failed
    #[error("List failed: {0}")]
    ListFailed(String),

    /// Operation is permanently unsupported by this client
    #[error("Feature not implemented: {0}")]
    NotImplemented(&'static str),

    /// Disconnect was asked for a key that is not registered
    #[error("Invalid connection: {0}")]
    InvalidConnection(String),

    /// Response was too short or otherwise unusable
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Protocol error
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Buffer too small
    #[error("Buffer too small: need {need} bytes, have {have}")]
    BufferTooSmall { need: usize, have: usize },

    /// No response within the configured bound
    #[error("Operation timed out")]
    Timeout,

    /// Peer closed the connection
    #[error("Connection closed")]
    ConnectionClosed,

    /// Connection was torn down locally while a request was outstanding
    #[error("Connection cancelled")]
    Cancelled,

    /// Invalid state
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Coarse failure taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Caller mistake, never retried
    Argument,
    /// Connect/send/receive failures and timeouts
    Transport,
    /// Short, absent or malformed responses
    Protocol,
    /// Operation attempted without an established session or connection
    Session,
    /// Permanently unimplemented operations
    Capability,
}

impl Error {
    /// Category of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidArguments(_) => ErrorCategory::Argument,
            Error::Io(_)
            | Error::ConnectionFailed(_)
            | Error::Timeout
            | Error::ConnectionClosed
            | Error::Cancelled => ErrorCategory::Transport,
            Error::InvalidData(_)
            | Error::Protocol(_)
            | Error::BufferTooSmall { .. }
            | Error::ListFailed(_) => ErrorCategory::Protocol,
            Error::AuthenticationFailed(_)
            | Error::NotConnected
            | Error::InvalidConnection(_)
            | Error::InvalidState(_) => ErrorCategory::Session,
            Error::NotImplemented(_) => ErrorCategory::Capability,
        }
    }

    /// Stable code reported to callers of the registry
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidArguments(_) => "INVALID_ARGUMENTS",
            Error::ConnectionFailed(_) => "CONNECTION_FAILED",
            Error::AuthenticationFailed(_) => "AUTH_FAILED",
            Error::NotConnected | Error::InvalidState(_) => "NOT_CONNECTED",
            Error::NotImplemented(_) => "NOT_IMPLEMENTED",
            Error::InvalidConnection(_) => "INVALID_CONNECTION",
            Error::ListFailed(_) => "LIST_FAILED",
            Error::Io(_)
            | Error::InvalidData(_)
            | Error::Protocol(_)
            | Error::BufferTooSmall { .. }
            | Error::Timeout
            | Error::ConnectionClosed
            | Error::Cancelled => "COMMUNICATION_FAILED",
        }
    }
}

/// SMB protocol status codes (subset of NTSTATUS)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum NtStatus {
    /// The operation completed successfully
    Success = 0x00000000,
    /// The request is still being processed
    Pending = 0x00000103,
    /// No more files
    NoMoreFiles = 0x80000006,
    /// More processing required
    MoreProcessingRequired = 0xC0000016,
    /// Access denied
    AccessDenied = 0xC0000022,
    /// The object name is not found
    ObjectNameNotFound = 0xC0000034,
    /// The user name or password is incorrect
    LogonFailure = 0xC000006D,
    /// Account is disabled
    AccountDisabled = 0xC0000072,
    /// The request is not supported
    NotSupported = 0xC00000BB,
    /// Bad network name
    BadNetworkName = 0xC00000CC,
    /// The user session has been deleted
    UserSessionDeleted = 0xC0000203,
}

impl TryFrom<u32> for NtStatus {
    type Error = u32;

    fn try_from(value: u32) -> std::result::Result<Self, Self::Error> {
        match value {
            0x00000000 => Ok(NtStatus::Success),
            0x00000103 => Ok(NtStatus::Pending),
            0x80000006 => Ok(NtStatus::NoMoreFiles),
            0xC0000016 => Ok(NtStatus::MoreProcessingRequired),
            0xC0000022 => Ok(NtStatus::AccessDenied),
            0xC0000034 => Ok(NtStatus::ObjectNameNotFound),
            0xC000006D => Ok(NtStatus::LogonFailure),
            0xC0000072 => Ok(NtStatus::AccountDisabled),
            0xC00000BB => Ok(NtStatus::NotSupported),
            0xC00000CC => Ok(NtStatus::BadNetworkName),
            0xC0000203 => Ok(NtStatus::UserSessionDeleted),
            other => Err(other),
        }
    }
}

impl NtStatus {
    /// Check whether a raw status value has error severity
    pub fn is_error_code(value: u32) -> bool {
        value & 0xC0000000 == 0xC0000000
    }

    /// Human readable form of a raw status value
    pub fn describe(value: u32) -> String {
        match NtStatus::try_from(value) {
            Ok(status) => status.to_string(),
            Err(raw) => format!("Unknown status (0x{:08X})", raw),
        }
    }
}

impl fmt::Display for NtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            NtStatus::Success => "Success",
            NtStatus::Pending => "Pending",
            NtStatus::NoMoreFiles => "No more files",
            NtStatus::MoreProcessingRequired => "More processing required",
            NtStatus::AccessDenied => "Access denied",
            NtStatus::ObjectNameNotFound => "Object name not found",
            NtStatus::LogonFailure => "Logon failure",
            NtStatus::AccountDisabled => "Account disabled",
            NtStatus::NotSupported => "Not supported",
            NtStatus::BadNetworkName => "Bad network name",
            NtStatus::UserSessionDeleted => "User session deleted",
        };
        write!(f, "{} (0x{:08X})", msg, *self as u32)
    }
}
