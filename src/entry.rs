//! Share and directory entries returned to callers

use chrono::{DateTime, Utc};

/// Seconds between 1601-01-01 and 1970-01-01
const WINDOWS_EPOCH_OFFSET_SECS: i64 = 11_644_473_600;

/// One share or directory listing entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: String,
    pub is_directory: bool,
    /// True only for top-level shares
    pub is_drive: bool,
    /// Share type for shares, file attribute bits for directory entries
    pub entry_type: u32,
    /// End-of-file size, 0 for shares and directories
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

impl DirectoryEntry {
    /// A top-level share
    pub fn share(name: impl Into<String>, share_type: u32) -> Self {
        Self {
            name: name.into(),
            is_directory: true,
            is_drive: true,
            entry_type: share_type,
            size: 0,
            modified: None,
        }
    }

    /// A file or directory inside a share
    pub fn file(name: impl Into<String>, attributes: u32, is_directory: bool) -> Self {
        Self {
            name: name.into(),
            is_directory,
            is_drive: false,
            entry_type: attributes,
            size: 0,
            modified: None,
        }
    }
}

/// Convert a Windows FILETIME (100ns ticks since 1601) to UTC, `None` for zero
pub fn filetime_to_utc(filetime: u64) -> Option<DateTime<Utc>> {
    if filetime == 0 {
        return None;
    }
    let secs = (filetime / 10_000_000) as i64 - WINDOWS_EPOCH_OFFSET_SECS;
    let nanos = ((filetime % 10_000_000) * 100) as u32;
    DateTime::from_timestamp(secs, nanos)
}
