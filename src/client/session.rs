//! One SMB2 connection: socket lifecycle and per-connection counters

use super::bridge::RequestBridge;
use super::config::ClientConfig;
use crate::error::{Error, Result};
use crate::protocol::messages::{encode_request, SmbRequest};
use crate::transport::{TcpTransport, TransportEvents, TransportHandle, TransportState};
use bytes::Bytes;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Session lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Ready,
    Failed(String),
    Cancelled,
}

impl SessionState {
    fn is_settled(&self) -> bool {
        !matches!(self, SessionState::Idle | SessionState::Connecting)
    }
}

/// State shared with the transport task
#[derive(Debug)]
struct SessionEvents {
    state: watch::Sender<SessionState>,
    bridge: RequestBridge,
}

impl SessionEvents {
    /// Transitions reported by the transport never override a local cancel
    fn transition(&self, next: SessionState) {
        self.state.send_if_modified(|current| {
            if *current == SessionState::Cancelled || *current == next {
                return false;
            }
            debug!("Session state {:?} -> {:?}", current, next);
            *current = next;
            true
        });
    }
}

impl TransportEvents for SessionEvents {
    fn on_state(&self, state: TransportState) {
        match state {
            TransportState::Connecting => self.transition(SessionState::Connecting),
            TransportState::Ready => self.transition(SessionState::Ready),
            TransportState::Failed(reason) => self.transition(SessionState::Failed(reason)),
            TransportState::Closed => {
                self.bridge.fail(Error::ConnectionClosed);
                self.transition(SessionState::Failed("connection closed".to_string()));
            }
        }
    }

    fn on_receive(&self, message: Bytes) {
        self.bridge.deliver(message);
    }

    fn on_error(&self, error: Error) {
        warn!("Transport error: {}", error);
        let reason = error.to_string();
        self.bridge.fail(error);
        self.transition(SessionState::Failed(reason));
    }
}

/// A single TCP connection to an SMB server
#[derive(Debug)]
pub struct SocketSession {
    host: String,
    port: u16,
    connect_timeout: Duration,
    request_timeout: Duration,
    events: Arc<SessionEvents>,
    transport: Mutex<Option<TransportHandle>>,
    message_id: AtomicU64,
    session_id: AtomicU64,
    tree_id: AtomicU32,
    operation: tokio::sync::Mutex<()>,
}

impl SocketSession {
    pub fn new(host: impl Into<String>, port: u16, config: &ClientConfig) -> Self {
        let (state, _) = watch::channel(SessionState::Idle);
        Self {
            host: host.into(),
            port,
            connect_timeout: config.connect_timeout,
            request_timeout: config.request_timeout,
            events: Arc::new(SessionEvents {
                state,
                bridge: RequestBridge::new(),
            }),
            transport: Mutex::new(None),
            message_id: AtomicU64::new(0),
            session_id: AtomicU64::new(0),
            tree_id: AtomicU32::new(0),
            operation: tokio::sync::Mutex::new(()),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn state(&self) -> SessionState {
        self.events.state.borrow().clone()
    }

    pub fn is_ready(&self) -> bool {
        self.state() == SessionState::Ready
    }

    pub fn ensure_ready(&self) -> Result<()> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(Error::NotConnected)
        }
    }

    fn transport_slot(&self) -> MutexGuard<'_, Option<TransportHandle>> {
        self.transport
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Open the socket and wait until it is ready or has failed
    pub async fn connect(&self) -> Result<()> {
        let mut state = self.events.state.subscribe();
        {
            let mut slot = self.transport_slot();
            if slot.is_some() {
                return Err(Error::InvalidState(format!(
                    "Session to {}:{} was already started",
                    self.host, self.port
                )));
            }
            self.events.state.send_replace(SessionState::Connecting);
            let events: Arc<dyn TransportEvents> = self.events.clone();
            *slot = Some(TcpTransport::open(
                &self.host,
                self.port,
                self.connect_timeout,
                events,
            ));
        }

        let settled = state
            .wait_for(SessionState::is_settled)
            .await
            .map_err(|_| Error::ConnectionFailed("session state channel closed".to_string()))?
            .clone();

        match settled {
            SessionState::Ready => {
                info!("Connected to {}:{}", self.host, self.port);
                Ok(())
            }
            SessionState::Failed(reason) => Err(Error::ConnectionFailed(reason)),
            SessionState::Cancelled => Err(Error::Cancelled),
            other => Err(Error::ConnectionFailed(format!(
                "unexpected state {:?}",
                other
            ))),
        }
    }

    /// Cancel the socket and clear the counters. Safe to call repeatedly.
    pub fn disconnect(&self) {
        self.events.state.send_replace(SessionState::Cancelled);
        if let Some(transport) = self.transport_slot().take() {
            transport.cancel();
            debug!("Closed transport to {}:{}", self.host, self.port);
        }
        self.events.bridge.fail(Error::Cancelled);
        self.message_id.store(0, Ordering::SeqCst);
        self.reset_ids();
    }

    pub fn next_message_id(&self) -> u64 {
        self.message_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn session_id(&self) -> u64 {
        self.session_id.load(Ordering::SeqCst)
    }

    pub fn set_session_id(&self, session_id: u64) {
        self.session_id.store(session_id, Ordering::SeqCst);
    }

    pub fn tree_id(&self) -> u32 {
        self.tree_id.load(Ordering::SeqCst)
    }

    pub fn set_tree_id(&self, tree_id: u32) {
        self.tree_id.store(tree_id, Ordering::SeqCst);
    }

    pub fn reset_ids(&self) {
        self.session_id.store(0, Ordering::SeqCst);
        self.tree_id.store(0, Ordering::SeqCst);
    }

    /// Serialize multi-step operations on this connection
    pub async fn begin_operation(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.operation.lock().await
    }

    /// Send one request and wait for its response
    pub async fn exchange<R: SmbRequest>(&self, request: &R) -> Result<Bytes> {
        self.ensure_ready()?;
        let message_id = self.next_message_id();
        let frame = encode_request(request, message_id, self.session_id(), self.tree_id())?;
        debug!(
            "Sending {:?} message {} ({} bytes)",
            R::COMMAND,
            message_id,
            frame.len()
        );

        let send = |frame: Bytes| match self.transport_slot().as_ref() {
            Some(handle) => handle.send(frame),
            None => Err(Error::NotConnected),
        };
        self.events
            .bridge
            .send_and_await(message_id, Bytes::from(frame), send, self.request_timeout)
            .await
    }
}
