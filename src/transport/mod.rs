//! Event-driven transport layer
//!
//! The transport owns the socket and runs on the tokio runtime. It reports
//! what happens on the wire through [`TransportEvents`]; the session that
//! implements the trait decides what the events mean.

use crate::error::Error;
use bytes::Bytes;

pub mod tcp;

pub use tcp::{TcpTransport, TransportHandle};

/// Lifecycle of the underlying socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportState {
    Connecting,
    Ready,
    Failed(String),
    Closed,
}

/// Callbacks invoked from the transport task
pub trait TransportEvents: Send + Sync + 'static {
    /// The socket moved to a new state
    fn on_state(&self, state: TransportState);

    /// One complete SMB2 message arrived (framing already removed)
    fn on_receive(&self, message: Bytes);

    /// A send or receive failed; the transport stops after reporting it
    fn on_error(&self, error: Error);
}
