//! TCP transport for SMB2 over direct TCP

use super::{TransportEvents, TransportState};
use crate::error::{Error, Result};
use crate::netbios::frame::{encode_frame, read_frame, write_frame};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Opens TCP connections and drives them on the runtime
pub struct TcpTransport;

impl TcpTransport {
    /// Start connecting to `host:port`.
    ///
    /// Returns immediately; progress is reported through `events`. Must be
    /// called from within a tokio runtime.
    pub fn open(
        host: &str,
        port: u16,
        connect_timeout: Duration,
        events: Arc<dyn TransportEvents>,
    ) -> TransportHandle {
        let target = socket_target(host, port);
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(target, connect_timeout, outbound_rx, events));
        TransportHandle {
            outbound: outbound_tx,
            task,
        }
    }
}

/// Control side of a running transport
#[derive(Debug)]
pub struct TransportHandle {
    outbound: mpsc::UnboundedSender<Bytes>,
    task: JoinHandle<()>,
}

impl TransportHandle {
    /// Queue one SMB2 message for sending; framing is added by the writer
    pub fn send(&self, message: Bytes) -> Result<()> {
        self.outbound
            .send(message)
            .map_err(|_| Error::ConnectionClosed)
    }

    /// Stop the transport and close the socket
    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for TransportHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn socket_target(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}

async fn run(
    target: String,
    connect_timeout: Duration,
    mut outbound: mpsc::UnboundedReceiver<Bytes>,
    events: Arc<dyn TransportEvents>,
) {
    events.on_state(TransportState::Connecting);
    debug!("Connecting to {}", target);

    let stream = match tokio::time::timeout(connect_timeout, TcpStream::connect(&target)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            events.on_state(TransportState::Failed(format!("{}: {}", target, e)));
            return;
        }
        Err(_) => {
            events.on_state(TransportState::Failed(format!(
                "{}: connect timed out after {:?}",
                target, connect_timeout
            )));
            return;
        }
    };
    if let Err(e) = stream.set_nodelay(true) {
        debug!("Could not set TCP_NODELAY: {}", e);
    }

    let (mut reader, mut writer) = stream.into_split();
    events.on_state(TransportState::Ready);

    let outcome = tokio::select! {
        result = read_loop(&mut reader, events.as_ref()) => result,
        result = write_loop(&mut writer, &mut outbound) => result,
    };

    match outcome {
        Ok(()) => debug!("Transport to {} finished", target),
        Err(e) => {
            debug!("Transport to {} failed: {}", target, e);
            events.on_error(e);
        }
    }
    events.on_state(TransportState::Closed);
}

async fn read_loop(reader: &mut OwnedReadHalf, events: &dyn TransportEvents) -> Result<()> {
    loop {
        match read_frame(reader).await? {
            Some(message) => {
                trace!("Received {} bytes", message.len());
                events.on_receive(message);
            }
            None => return Err(Error::ConnectionClosed),
        }
    }
}

/// Ends cleanly once every handle clone is gone
async fn write_loop(
    writer: &mut OwnedWriteHalf,
    outbound: &mut mpsc::UnboundedReceiver<Bytes>,
) -> Result<()> {
    while let Some(message) = outbound.recv().await {
        let frame = encode_frame(&message)?;
        write_frame(writer, &frame).await?;
        trace!("Sent {} bytes", message.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests;
