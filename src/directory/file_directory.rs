use crate::constants::{DEFAULT_OWNER_ADDRESS, DEFAULT_OWNER_PORT};
use crate::core::error::{ControllerError, ControllerResult};
use crate::core::file_entry::{FileEntry, Owner};
use crate::core::node_record::NodeLocation;
use crate::directory::replica_fetcher::{PlaceholderFetcher, ReplicaFetcher};
use crate::registry::node_registry::NodeRegistry;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct FileTable {
    entries: HashMap<String, FileEntry>,
    order: Vec<String>,
}

///
/// # File Directory
///
/// Maps each filename to the nodes that purportedly hold a copy of it.
///
/// Owner locations are resolved through the [`NodeRegistry`] at upload time and stored by
/// value. Lock order is always directory first, then registry; the registry never takes the
/// directory lock, so the two cannot deadlock.
///
pub struct FileDirectory {
    registry: Arc<NodeRegistry>,
    table: RwLock<FileTable>,
    default_owner: NodeLocation,
    fetcher: Box<dyn ReplicaFetcher>,
}

impl FileDirectory {
    pub fn new(registry: Arc<NodeRegistry>) -> Self {
        FileDirectory {
            registry,
            table: RwLock::new(FileTable::default()),
            default_owner: NodeLocation::new(DEFAULT_OWNER_ADDRESS.to_string(), DEFAULT_OWNER_PORT),
            fetcher: Box::new(PlaceholderFetcher),
        }
    }

    /// Location recorded for owners the registry does not know.
    pub fn with_default_owner(mut self, location: NodeLocation) -> Self {
        self.default_owner = location;
        self
    }

    pub fn with_fetcher(mut self, fetcher: Box<dyn ReplicaFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    ///
    /// Records that `owner_id` uploaded `filename`.
    ///
    /// The entry is created on first sight. The owner's location comes from the registry,
    /// falling back to the default location for nodes that never registered. `upload_time`
    /// is refreshed even when the owner triple was already present.
    ///
    /// The whole sequence runs under the directory write lock, so racing uploads for the same
    /// filename cannot lose each other's owners.
    ///
    pub async fn record_upload(&self, filename: &str, owner_id: &str) -> ControllerResult<()> {
        if filename.is_empty() {
            return Err(ControllerError::InvalidArgument(
                "filename must not be empty".to_string(),
            ));
        }
        if owner_id.is_empty() {
            return Err(ControllerError::InvalidArgument(
                "owner id must not be empty".to_string(),
            ));
        }

        let mut table = self.table.write().await;

        if !table.entries.contains_key(filename) {
            table.order.push(filename.to_string());
            debug!("Created directory entry for '{}'", filename);
        }

        let location = match self.registry.location_of(owner_id).await {
            Some(location) => location,
            None => {
                warn!(
                    "Owner {} of '{}' is not registered, recording default location {}",
                    owner_id, filename, self.default_owner
                );
                self.default_owner.clone()
            }
        };
        let owner = Owner::new(owner_id.to_string(), location.address, location.port);

        let entry = table
            .entries
            .entry(filename.to_string())
            .or_insert_with(|| FileEntry::new(filename.to_string()));
        entry.add_owner(owner);
        entry.touch();

        info!("File '{}' uploaded and owned by {}", filename, owner_id);
        Ok(())
    }

    pub async fn lookup(&self, filename: &str) -> ControllerResult<FileEntry> {
        let table = self.table.read().await;
        table
            .entries
            .get(filename)
            .cloned()
            .ok_or_else(|| ControllerError::NotFound(format!("file '{}'", filename)))
    }

    /// All entries in first-upload order.
    pub async fn snapshot(&self) -> Vec<FileEntry> {
        let table = self.table.read().await;
        table
            .order
            .iter()
            .filter_map(|filename| table.entries.get(filename))
            .cloned()
            .collect()
    }

    ///
    /// Picks the owner to read from: the first owner (in insertion order) whose node is
    /// registered and online, otherwise the first owner overall.
    ///
    pub async fn select_replica(&self, entry: &FileEntry) -> ControllerResult<Owner> {
        for owner in entry.owners() {
            if self.registry.is_online(&owner.node_id).await == Some(true) {
                return Ok(owner.clone());
            }
        }

        entry.owners().first().cloned().ok_or_else(|| {
            ControllerError::NotFound(format!("no replica of '{}'", entry.filename))
        })
    }

    ///
    /// Returns the content of `filename` from one of its owners.
    ///
    /// No lock is held while the fetcher runs.
    ///
    pub async fn fetch_content(&self, filename: &str) -> ControllerResult<Vec<u8>> {
        let entry = self.lookup(filename).await?;
        let owner = self.select_replica(&entry).await?;
        debug!("Selected replica {} for '{}'", owner, filename);
        self.fetcher.fetch(&owner, filename).await
    }

    pub async fn len(&self) -> usize {
        self.table.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.table.read().await.entries.is_empty()
    }
}
