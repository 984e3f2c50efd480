//! Request/response correlation over the event-driven transport
//!
//! One request may be outstanding per connection. The waiter registers a
//! [`PendingRequest`] before its frame is sent; the transport callbacks
//! complete it with the response, an error, or nothing (the waiter's timeout
//! fires).

use crate::error::{Error, NtStatus, Result};
use crate::protocol::header::Smb2Header;
use bytes::Bytes;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// The single in-flight exchange of a connection
#[derive(Debug)]
pub struct PendingRequest {
    pub message_id: u64,
    responder: oneshot::Sender<Result<Bytes>>,
}

#[derive(Debug, Default)]
pub struct RequestBridge {
    pending: Mutex<Option<PendingRequest>>,
}

/// Clears the slot when the waiter goes away, whatever the outcome
struct PendingGuard<'a> {
    bridge: &'a RequestBridge,
    message_id: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.bridge.clear(self.message_id);
    }
}

impl RequestBridge {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, Option<PendingRequest>> {
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn register(&self, message_id: u64) -> Result<oneshot::Receiver<Result<Bytes>>> {
        let mut slot = self.slot();
        if let Some(existing) = slot.as_ref() {
            return Err(Error::InvalidState(format!(
                "Request {} is still outstanding",
                existing.message_id
            )));
        }
        let (responder, receiver) = oneshot::channel();
        *slot = Some(PendingRequest {
            message_id,
            responder,
        });
        Ok(receiver)
    }

    fn clear(&self, message_id: u64) {
        let mut slot = self.slot();
        if slot.as_ref().map(|p| p.message_id) == Some(message_id) {
            *slot = None;
        }
    }

    pub fn has_pending(&self) -> bool {
        self.slot().is_some()
    }

    /// Send `frame` through `send` and wait for the matching response.
    ///
    /// Resolves exactly once: with the response bytes, with the error the
    /// transport reported, or with [`Error::Timeout`] once `timeout` elapses.
    pub async fn send_and_await<F>(
        &self,
        message_id: u64,
        frame: Bytes,
        send: F,
        timeout: Duration,
    ) -> Result<Bytes>
    where
        F: FnOnce(Bytes) -> Result<()>,
    {
        let receiver = self.register(message_id)?;
        let _guard = PendingGuard {
            bridge: self,
            message_id,
        };

        send(frame)?;

        match tokio::time::timeout(timeout, receiver).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(Error::ConnectionClosed),
            Err(_) => {
                warn!(
                    "No response to message {} within {:?}",
                    message_id, timeout
                );
                Err(Error::Timeout)
            }
        }
    }

    /// Hand an inbound message to the waiter if it answers the pending request
    pub fn deliver(&self, message: Bytes) {
        let mut slot = self.slot();
        let Some(pending) = slot.as_ref() else {
            debug!("Dropping {} unsolicited bytes", message.len());
            return;
        };

        if let Ok(header) = Smb2Header::parse(&message) {
            if header.is_async() && header.status == NtStatus::Pending as u32 {
                debug!("Interim response for message {}", header.message_id);
                return;
            }
            if header.message_id != pending.message_id {
                warn!(
                    "Dropping response for message {} while waiting on {}",
                    header.message_id, pending.message_id
                );
                return;
            }
        }

        if let Some(pending) = slot.take() {
            let _ = pending.responder.send(Ok(message));
        }
    }

    /// Fail the outstanding request, if any
    pub fn fail(&self, error: Error) {
        if let Some(pending) = self.slot().take() {
            debug!("Failing message {}: {}", pending.message_id, error);
            let _ = pending.responder.send(Err(error));
        }
    }
}
