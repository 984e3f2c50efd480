//! SMB2 share and directory browsing client
//!
//! Connects to a server over direct TCP, authenticates, binds the IPC$
//! share and lists shares or directory contents. Connections live in a
//! [`registry::ConnectionRegistry`] keyed by caller-chosen ids; the
//! [`blocking`] module wraps it for callers without an async runtime.

#![allow(missing_docs)]
#![forbid(unsafe_code)]

pub mod auth;
pub mod entry;
pub mod error;
pub mod host;
pub mod netbios;
pub mod protocol;
pub mod transport;

#[cfg(feature = "client")]
pub mod client;

#[cfg(feature = "client")]
pub mod registry;

#[cfg(feature = "blocking")]
pub mod blocking;

#[cfg(all(test, feature = "client"))]
pub mod e2e_tests;

pub use entry::DirectoryEntry;
pub use error::{Error, ErrorCategory, Result};
