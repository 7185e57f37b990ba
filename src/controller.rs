use crate::config::{Config, FetchMode};
use crate::core::error::{ControllerError, ControllerResult};
use crate::core::file_entry::FileEntry;
use crate::core::node_record::NodeRecord;
use crate::directory::file_directory::FileDirectory;
use crate::directory::replica_fetcher::{PlaceholderFetcher, ReplicaFetcher, TcpReplicaFetcher};
use crate::registry::liveness::spawn_liveness_sweeper;
use crate::registry::node_registry::NodeRegistry;
use log::info;
use serde::Serialize;
use std::fmt::{self, Display};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Read-only view used to render the status page.
#[derive(Debug, Serialize, Clone)]
pub struct StatusReport {
    pub nodes: Vec<NodeRecord>,
    pub files: Vec<FileEntry>,
    pub total_nodes: usize,
    pub online_nodes: usize,
    pub total_files: usize,
}

impl Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Nodes: {} ({} online), Files: {}",
            self.total_nodes, self.online_nodes, self.total_files
        )?;
        for node in &self.nodes {
            writeln!(f, " - node {}", node)?;
        }
        for file in &self.files {
            writeln!(f, " - file {}", file)?;
        }
        Ok(())
    }
}

///
/// # Storage controller
///
/// Owns the node registry and the file directory for the lifetime of the service and exposes
/// the calls the front end needs. Created with [`Controller::start`], torn down with
/// [`Controller::shutdown`].
///
pub struct Controller {
    registry: Arc<NodeRegistry>,
    directory: Arc<FileDirectory>,
    sweeper: Option<JoinHandle<()>>,
}

impl Controller {
    /// Builds the registry and directory and starts the liveness sweeper.
    /// Must be called from within a tokio runtime.
    pub fn start(config: &Config) -> Self {
        let registry = Arc::new(NodeRegistry::new());

        let fetcher: Box<dyn ReplicaFetcher> = match config.fetch_mode {
            FetchMode::Placeholder => Box::new(PlaceholderFetcher),
            FetchMode::Tcp => Box::new(TcpReplicaFetcher::new(config.fetch_timeout())),
        };
        let directory = FileDirectory::new(Arc::clone(&registry))
            .with_default_owner(config.default_owner_location())
            .with_fetcher(fetcher);

        let sweeper = spawn_liveness_sweeper(
            Arc::clone(&registry),
            config.sweep_interval(),
            config.node_ttl(),
        );

        info!("Storage controller started ({:?} fetch)", config.fetch_mode);
        Controller {
            registry,
            directory: Arc::new(directory),
            sweeper: Some(sweeper),
        }
    }

    pub fn registry(&self) -> Arc<NodeRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn directory(&self) -> Arc<FileDirectory> {
        Arc::clone(&self.directory)
    }

    /// Registers a node from raw front-end input. The port must be a number in 1..=65535.
    pub async fn register_node(&self, id: &str, address: &str, port: &str) -> ControllerResult<()> {
        let port = parse_port(port)?;
        self.registry.register(id, address, port).await
    }

    pub async fn heartbeat(&self, id: &str) -> ControllerResult<()> {
        self.registry.heartbeat(id).await
    }

    pub async fn upload_file(&self, filename: &str, owner_id: &str) -> ControllerResult<()> {
        self.directory.record_upload(filename, owner_id).await
    }

    /// Looks the file up and fetches it from one of its owners.
    pub async fn download_file(&self, filename: &str) -> ControllerResult<Vec<u8>> {
        self.directory.fetch_content(filename).await
    }

    pub async fn status(&self) -> StatusReport {
        let nodes = self.registry.snapshot().await;
        let files = self.directory.snapshot().await;
        StatusReport {
            total_nodes: nodes.len(),
            online_nodes: nodes.iter().filter(|node| node.online).count(),
            total_files: files.len(),
            nodes,
            files,
        }
    }

    /// Stops background work. In-memory state is dropped with the controller.
    pub fn shutdown(&mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.abort();
            info!("Storage controller stopped");
        }
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn parse_port(port: &str) -> ControllerResult<u16> {
    match port.trim().parse::<u16>() {
        Ok(0) | Err(_) => Err(ControllerError::InvalidArgument(format!(
            "port '{}' is not a number in 1..=65535",
            port
        ))),
        Ok(port) => Ok(port),
    }
}
