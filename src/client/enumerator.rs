//! Handshake and listing operations over one session

use super::config::ClientConfig;
use super::fallback::synthetic_drives;
use super::session::SocketSession;
use crate::auth::Credentials;
use crate::entry::DirectoryEntry;
use crate::error::{Error, ErrorCategory, NtStatus, Result};
use crate::protocol::messages::negotiate::negotiated_dialect;
use crate::protocol::messages::session::session_id_from_response;
use crate::protocol::messages::tree::tree_id_from_response;
use crate::protocol::messages::{
    parse_directory_listing, response_status, Smb2IoctlRequest, Smb2NegotiateRequest,
    Smb2QueryDirectoryRequest, Smb2SessionSetupRequest, Smb2TreeConnectRequest,
};
use crate::protocol::shares::parse_shares;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Runs NEGOTIATE, SESSION_SETUP and TREE_CONNECT, then share and directory listings
#[derive(Debug)]
pub struct ShareEnumerator {
    session: Arc<SocketSession>,
    config: Arc<ClientConfig>,
    credentials: Credentials,
}

impl ShareEnumerator {
    pub fn new(
        session: Arc<SocketSession>,
        config: Arc<ClientConfig>,
        credentials: Credentials,
    ) -> Self {
        Self {
            session,
            config,
            credentials,
        }
    }

    pub fn session(&self) -> &Arc<SocketSession> {
        &self.session
    }

    /// Establish the session and bind the administrative share.
    ///
    /// On failure the session and tree ids are left at zero.
    pub async fn authenticate(&self) -> Result<()> {
        let _op = self.session.begin_operation().await;
        let result = self.handshake().await;
        if let Err(e) = &result {
            warn!("Handshake with {} failed: {}", self.session.host(), e);
            self.session.reset_ids();
        }
        result
    }

    async fn handshake(&self) -> Result<()> {
        self.negotiate().await?;
        self.session_setup().await?;
        self.tree_connect().await
    }

    async fn negotiate(&self) -> Result<()> {
        let request = Smb2NegotiateRequest::new(self.config.client_guid)
            .with_dialect(self.config.dialect)
            .with_security(self.config.security_mode, self.config.capabilities);
        let response = self.session.exchange(&request).await?;
        if response.is_empty() {
            return Err(Error::ConnectionFailed("Empty NEGOTIATE response".to_string()));
        }
        match negotiated_dialect(&response) {
            Some(dialect) => debug!("Server selected dialect 0x{:04x}", dialect),
            None => debug!("NEGOTIATE response carries no dialect"),
        }
        Ok(())
    }

    async fn session_setup(&self) -> Result<()> {
        let request = Smb2SessionSetupRequest::new(self.credentials.security_blob());
        let response = self.session.exchange(&request).await?;

        self.check_status(&response, "SESSION_SETUP")?;
        let session_id = session_id_from_response(&response)
            .map_err(|e| Error::AuthenticationFailed(e.to_string()))?;
        if session_id == 0 && self.config.strict_handshake {
            return Err(Error::AuthenticationFailed(
                "Server assigned no session id".to_string(),
            ));
        }

        self.session.set_session_id(session_id);
        info!(
            "Session 0x{:016x} established for {}",
            session_id, self.credentials.username
        );
        Ok(())
    }

    async fn tree_connect(&self) -> Result<()> {
        let request = Smb2TreeConnectRequest::for_share(self.session.host(), &self.config.admin_share);
        let response = self.session.exchange(&request).await?;

        self.check_status(&response, "TREE_CONNECT")?;
        let tree_id = tree_id_from_response(&response)
            .map_err(|e| Error::AuthenticationFailed(e.to_string()))?;

        self.session.set_tree_id(tree_id);
        debug!("Bound {} as tree {}", request.path, tree_id);
        Ok(())
    }

    /// Reject an error status when the handshake is strict, otherwise only
    /// note it
    fn check_status(&self, response: &[u8], step: &str) -> Result<()> {
        if self.config.strict_handshake {
            return require_success(response, step);
        }
        if let Some(status) = response_status(response).filter(|s| NtStatus::is_error_code(*s)) {
            debug!("{} answered {}", step, NtStatus::describe(status));
        }
        Ok(())
    }

    /// Top-level shares, or synthetic drive letters when none can be decoded
    pub async fn list_drives(&self) -> Result<Vec<DirectoryEntry>> {
        if self.session.session_id() == 0 {
            return Err(Error::AuthenticationFailed(
                "Session has not been established".to_string(),
            ));
        }

        let _op = self.session.begin_operation().await;
        let request = Smb2IoctlRequest::share_enumeration(self.config.max_output_response);

        let failure = match self.session.exchange(&request).await {
            Ok(response) => match parse_shares(&response) {
                Some((format, shares)) => {
                    info!("Decoded {} shares ({:?} layout)", shares.len(), format);
                    return Ok(shares);
                }
                None => {
                    debug!("No share layout matched {} response bytes", response.len());
                    Error::ListFailed("Share list could not be decoded".to_string())
                }
            },
            Err(e) => {
                warn!("Share enumeration request failed: {}", e);
                e
            }
        };

        if self.config.synthetic_drive_fallback {
            let drives = synthetic_drives(&mut rand::thread_rng());
            info!("Returning {} synthetic drives", drives.len());
            Ok(drives)
        } else {
            Err(Error::ListFailed(failure.to_string()))
        }
    }

    /// Entries of the directory at `path` inside the bound share
    pub async fn list_files(&self, path: &str) -> Result<Vec<DirectoryEntry>> {
        self.session.ensure_ready()?;

        let _op = self.session.begin_operation().await;
        let request = Smb2QueryDirectoryRequest::new(path, self.config.max_output_response);
        let response = self.session.exchange(&request).await.map_err(|e| match e {
            Error::NotConnected => Error::NotConnected,
            other => Error::ListFailed(other.to_string()),
        })?;

        let entries = parse_directory_listing(&response);
        debug!("Listed {} entries under {}", entries.len(), path);
        Ok(entries)
    }

    pub async fn download_file(&self, _from: &str, _to: &str) -> Result<()> {
        self.session.ensure_ready()?;
        Err(Error::NotImplemented("download"))
    }

    pub async fn upload_file(&self, _from: &str, _to: &str) -> Result<()> {
        self.session.ensure_ready()?;
        Err(Error::NotImplemented("upload"))
    }
}

fn require_success(response: &[u8], step: &str) -> Result<()> {
    match response_status(response) {
        Some(status) if NtStatus::is_error_code(status) => Err(Error::AuthenticationFailed(
            format!("{} rejected: {}", step, NtStatus::describe(status)),
        )),
        Some(_) => Ok(()),
        None => Err(Error::AuthenticationFailed(format!(
            "{} response too short: {} bytes",
            step,
            response.len()
        ))),
    }
}

/// Errors from the handshake surface as connection or authentication failures
pub(crate) fn handshake_error(error: Error) -> Error {
    match error {
        Error::AuthenticationFailed(_) | Error::ConnectionFailed(_) => error,
        other if other.category() == ErrorCategory::Transport => {
            Error::ConnectionFailed(other.to_string())
        }
        other => Error::AuthenticationFailed(other.to_string()),
    }
}
