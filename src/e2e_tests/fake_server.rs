//! Scripted SMB2 peer on 127.0.0.1 for driving the client end to end

use crate::error::Result;
use crate::netbios::frame::{encode_frame, read_frame, write_frame};
use crate::protocol::header::Smb2Header;
use crate::protocol::reader::encode_utf16le;
use crate::protocol::smb2_constants::{Smb2Command, Smb2HeaderFlags};
use std::sync::{Arc, Mutex};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// What the server answers to the share enumeration IOCTL
#[derive(Debug, Clone)]
pub enum IoctlReply {
    Shares(Vec<(String, u32)>),
    /// Well-formed response with no share data
    Empty,
}

/// Per-server behavior
#[derive(Debug, Clone)]
pub struct ServerScript {
    pub session_id: u64,
    pub tree_id: u32,
    pub session_status: u32,
    pub ioctl: IoctlReply,
    /// (name, attributes, size)
    pub directory: Vec<(String, u32, u64)>,
    /// Commands that are read but never answered
    pub silent: Vec<Smb2Command>,
}

impl Default for ServerScript {
    fn default() -> Self {
        Self {
            session_id: 0x0000_4000_0000_0011,
            tree_id: 7,
            session_status: 0,
            ioctl: IoctlReply::Empty,
            directory: Vec::new(),
            silent: Vec::new(),
        }
    }
}

impl ServerScript {
    pub fn with_shares(mut self, shares: &[(&str, u32)]) -> Self {
        self.ioctl = IoctlReply::Shares(
            shares
                .iter()
                .map(|(name, ty)| (name.to_string(), *ty))
                .collect(),
        );
        self
    }

    pub fn with_directory(mut self, entries: &[(&str, u32, u64)]) -> Self {
        self.directory = entries
            .iter()
            .map(|(name, attrs, size)| (name.to_string(), *attrs, *size))
            .collect();
        self
    }

    pub fn silent_on(mut self, command: Smb2Command) -> Self {
        self.silent.push(command);
        self
    }
}

/// A request header as the server saw it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeenRequest {
    pub command: Smb2Command,
    pub message_id: u64,
    pub session_id: u64,
    pub tree_id: u32,
}

pub struct FakeServer {
    pub port: u16,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
    task: JoinHandle<()>,
}

impl FakeServer {
    pub async fn start(script: ServerScript) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let script = Arc::new(script);
        let log = seen.clone();
        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, script.clone(), log.clone()));
            }
        });

        Ok(Self { port, seen, task })
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }

    pub fn commands(&self) -> Vec<Smb2Command> {
        self.requests().iter().map(|r| r.command).collect()
    }
}

impl Drop for FakeServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(mut stream: TcpStream, script: Arc<ServerScript>, seen: Arc<Mutex<Vec<SeenRequest>>>) {
    while let Ok(Some(message)) = read_frame(&mut stream).await {
        let Ok(request) = Smb2Header::parse(&message) else {
            continue;
        };
        seen.lock().unwrap().push(SeenRequest {
            command: request.command,
            message_id: request.message_id,
            session_id: request.session_id,
            tree_id: request.tree_id,
        });
        if script.silent.contains(&request.command) {
            continue;
        }

        let response = respond(&request, &script);
        let Ok(frame) = encode_frame(&response) else {
            return;
        };
        if write_frame(&mut stream, &frame).await.is_err() {
            return;
        }
    }
}

fn respond(request: &Smb2Header, script: &ServerScript) -> Vec<u8> {
    let mut header = Smb2Header::new(request.command);
    header.message_id = request.message_id;
    header.session_id = request.session_id;
    header.tree_id = request.tree_id;
    header.flags = Smb2HeaderFlags::SERVER_TO_REDIR;

    let body = match request.command {
        Smb2Command::Negotiate => {
            let mut body = vec![0u8; 64];
            body[0..2].copy_from_slice(&65u16.to_le_bytes());
            body[4..6].copy_from_slice(&0x0202u16.to_le_bytes());
            body
        }
        Smb2Command::SessionSetup => {
            header.status = script.session_status;
            header.session_id = script.session_id;
            let mut body = vec![0u8; 8];
            body[0..2].copy_from_slice(&9u16.to_le_bytes());
            body
        }
        Smb2Command::TreeConnect => {
            header.tree_id = script.tree_id;
            let mut body = vec![0u8; 16];
            body[0..2].copy_from_slice(&16u16.to_le_bytes());
            body
        }
        Smb2Command::Ioctl => ioctl_body(&script.ioctl),
        Smb2Command::QueryDirectory => directory_body(&script.directory),
        _ => vec![0u8; 8],
    };

    let mut response = header.serialize().unwrap();
    response.extend_from_slice(&body);
    response
}

fn ioctl_body(reply: &IoctlReply) -> Vec<u8> {
    let mut body = vec![0u8; 48];
    body[0..2].copy_from_slice(&49u16.to_le_bytes());
    if let IoctlReply::Shares(shares) = reply {
        for (name, share_type) in shares {
            let name_bytes = encode_utf16le(name);
            body.extend_from_slice(&(name_bytes.len() as u16).to_le_bytes());
            body.extend_from_slice(&share_type.to_le_bytes());
            body.extend_from_slice(&name_bytes);
            while body.len() % 4 != 0 {
                body.push(0);
            }
        }
    }
    body
}

fn directory_body(entries: &[(String, u32, u64)]) -> Vec<u8> {
    let mut body = vec![0u8; 8];
    body[0..2].copy_from_slice(&9u16.to_le_bytes());

    for (i, (name, attributes, size)) in entries.iter().enumerate() {
        let name_bytes = encode_utf16le(name);
        let mut record = vec![0u8; 64];
        record.extend_from_slice(&name_bytes);
        while record.len() % 8 != 0 {
            record.push(0);
        }
        let next = if i + 1 == entries.len() {
            0
        } else {
            record.len() as u32
        };
        record[0..4].copy_from_slice(&next.to_le_bytes());
        record[40..48].copy_from_slice(&size.to_le_bytes());
        record[56..60].copy_from_slice(&attributes.to_le_bytes());
        record[60..64].copy_from_slice(&(name_bytes.len() as u32).to_le_bytes());
        body.extend_from_slice(&record);
    }
    body
}
