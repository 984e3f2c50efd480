//! Blocking facade over [`ConnectionRegistry`]
//!
//! Owns a multi-threaded tokio runtime; the transports keep running on its
//! workers between calls.

use crate::client::ClientConfig;
use crate::entry::DirectoryEntry;
use crate::error::Result;
use crate::registry::{ConnectOptions, ConnectionRegistry};
use tokio::runtime::{Builder, Runtime};

pub struct BlockingRegistry {
    runtime: Runtime,
    registry: ConnectionRegistry,
}

impl BlockingRegistry {
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("smb-client")
            .enable_all()
            .build()?;
        Ok(Self {
            runtime,
            registry: ConnectionRegistry::new(config),
        })
    }

    pub fn connect(&self, options: ConnectOptions) -> Result<bool> {
        self.runtime.block_on(self.registry.connect(options))
    }

    pub fn disconnect(&self, connection_id: Option<&str>) -> Result<bool> {
        self.runtime.block_on(self.registry.disconnect(connection_id))
    }

    pub fn list_drives(&self, connection_id: Option<&str>) -> Result<Vec<DirectoryEntry>> {
        self.runtime.block_on(self.registry.list_drives(connection_id))
    }

    pub fn list_files(
        &self,
        path: &str,
        connection_id: Option<&str>,
    ) -> Result<Vec<DirectoryEntry>> {
        self.runtime
            .block_on(self.registry.list_files(path, connection_id))
    }

    pub fn download_file(
        &self,
        from_path: &str,
        to_path: &str,
        connection_id: Option<&str>,
    ) -> Result<()> {
        self.runtime
            .block_on(self.registry.download_file(from_path, to_path, connection_id))
    }

    pub fn upload_file(
        &self,
        from_path: &str,
        to_path: &str,
        connection_id: Option<&str>,
    ) -> Result<()> {
        self.runtime
            .block_on(self.registry.upload_file(from_path, to_path, connection_id))
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }
}
