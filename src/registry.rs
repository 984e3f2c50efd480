//! Named connections and the operations callers run against them

use crate::auth::Credentials;
use crate::client::enumerator::handshake_error;
use crate::client::{ClientConfig, ShareEnumerator, SocketSession};
use crate::entry::DirectoryEntry;
use crate::error::{Error, Result};
use crate::host::normalize_host;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Key used when the caller does not name a connection
pub const DEFAULT_CONNECTION_ID: &str = "default";

/// Arguments of [`ConnectionRegistry::connect`]
#[derive(Debug, Clone, Default)]
pub struct ConnectOptions {
    pub host: String,
    pub username: String,
    pub password: String,
    pub domain: String,
    /// Falls back to the configured default port
    pub port: Option<u16>,
    /// Falls back to [`DEFAULT_CONNECTION_ID`]
    pub connection_id: Option<String>,
}

impl ConnectOptions {
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn connection_id(mut self, id: impl Into<String>) -> Self {
        self.connection_id = Some(id.into());
        self
    }
}

#[derive(Debug)]
struct Connection {
    enumerator: ShareEnumerator,
}

impl Connection {
    fn session(&self) -> &Arc<SocketSession> {
        self.enumerator.session()
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    connections: HashMap<String, Arc<Connection>>,
    /// Key of the most recently connected entry
    current: Option<String>,
}

/// Connections keyed by caller-chosen ids
#[derive(Debug)]
pub struct ConnectionRegistry {
    config: Arc<ClientConfig>,
    state: RwLock<RegistryState>,
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

impl ConnectionRegistry {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config: Arc::new(config),
            state: RwLock::new(RegistryState::default()),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Open, authenticate and register a connection.
    ///
    /// An existing connection under the same id is replaced and closed.
    pub async fn connect(&self, options: ConnectOptions) -> Result<bool> {
        let host = normalize_host(&options.host)?;
        if options.username.is_empty() {
            return Err(Error::InvalidArguments("username is required".to_string()));
        }
        let port = options.port.unwrap_or(self.config.default_port);
        let key = options
            .connection_id
            .unwrap_or_else(|| DEFAULT_CONNECTION_ID.to_string());

        let session = Arc::new(SocketSession::new(host.as_str(), port, &self.config));
        session.connect().await.map_err(handshake_error)?;

        let credentials =
            Credentials::new(options.username, options.password).with_domain(options.domain);
        let enumerator = ShareEnumerator::new(session.clone(), self.config.clone(), credentials);
        if let Err(e) = enumerator.authenticate().await {
            session.disconnect();
            return Err(handshake_error(e));
        }

        let replaced = {
            let mut state = self.state.write().await;
            state.current = Some(key.clone());
            state
                .connections
                .insert(key.clone(), Arc::new(Connection { enumerator }))
        };
        if let Some(old) = replaced {
            debug!("Replacing connection {:?}", key);
            old.session().disconnect();
        }

        info!("Connection {:?} ready to {}:{}", key, host, port);
        Ok(true)
    }

    /// Close and forget a connection
    pub async fn disconnect(&self, connection_id: Option<&str>) -> Result<bool> {
        let removed = {
            let mut state = self.state.write().await;
            let key = match connection_id {
                Some(id) => id.to_string(),
                None => state
                    .current
                    .clone()
                    .ok_or_else(|| Error::InvalidConnection("no current connection".to_string()))?,
            };
            let connection = state
                .connections
                .remove(&key)
                .ok_or_else(|| Error::InvalidConnection(key.clone()))?;
            if state.current.as_deref() == Some(key.as_str()) {
                state.current = None;
            }
            (key, connection)
        };

        let (key, connection) = removed;
        connection.session().disconnect();
        info!("Connection {:?} closed", key);
        Ok(true)
    }

    async fn resolve(&self, connection_id: Option<&str>) -> Result<Arc<Connection>> {
        let state = self.state.read().await;
        let key = match connection_id {
            Some(id) => id,
            None => state.current.as_deref().ok_or(Error::NotConnected)?,
        };
        state
            .connections
            .get(key)
            .cloned()
            .ok_or(Error::NotConnected)
    }

    pub async fn list_drives(&self, connection_id: Option<&str>) -> Result<Vec<DirectoryEntry>> {
        let connection = self.resolve(connection_id).await?;
        connection.enumerator.list_drives().await
    }

    pub async fn list_files(
        &self,
        path: &str,
        connection_id: Option<&str>,
    ) -> Result<Vec<DirectoryEntry>> {
        if path.is_empty() {
            return Err(Error::InvalidArguments("path is required".to_string()));
        }
        let connection = self.resolve(connection_id).await?;
        connection.enumerator.list_files(path).await
    }

    pub async fn download_file(
        &self,
        from_path: &str,
        to_path: &str,
        connection_id: Option<&str>,
    ) -> Result<()> {
        let connection = self.resolve(connection_id).await?;
        connection.enumerator.download_file(from_path, to_path).await
    }

    pub async fn upload_file(
        &self,
        from_path: &str,
        to_path: &str,
        connection_id: Option<&str>,
    ) -> Result<()> {
        let connection = self.resolve(connection_id).await?;
        connection.enumerator.upload_file(from_path, to_path).await
    }

    /// Ids of the registered connections, sorted
    pub async fn connection_ids(&self) -> Vec<String> {
        let state = self.state.read().await;
        let mut ids: Vec<String> = state.connections.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn current(&self) -> Option<String> {
        self.state.read().await.current.clone()
    }
}
