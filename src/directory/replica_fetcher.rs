use crate::constants::MAX_REPLICA_SIZE_MB;
use crate::core::error::{ControllerError, ControllerResult};
use crate::core::file_entry::Owner;
use futures::future::BoxFuture;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::io;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use uuid::Uuid;

/// Retrieves the bytes of one replica from its owner.
pub trait ReplicaFetcher: Send + Sync {
    fn fetch<'a>(
        &'a self,
        owner: &'a Owner,
        filename: &'a str,
    ) -> BoxFuture<'a, ControllerResult<Vec<u8>>>;
}

///
/// Content is never stored by the controller, so this fetcher hands back a fixed
/// placeholder. Callers must not assume the bytes reflect anything that was uploaded.
///
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderFetcher;

impl PlaceholderFetcher {
    pub fn content_for(filename: &str) -> Vec<u8> {
        format!("Dummy content of {} (not actual file data)", filename).into_bytes()
    }
}

impl ReplicaFetcher for PlaceholderFetcher {
    fn fetch<'a>(
        &'a self,
        owner: &'a Owner,
        filename: &'a str,
    ) -> BoxFuture<'a, ControllerResult<Vec<u8>>> {
        Box::pin(async move {
            debug!("Serving placeholder for '{}' (owner {})", filename, owner);
            Ok(PlaceholderFetcher::content_for(filename))
        })
    }
}

/// Request sent to a storage node. The node answers with the raw replica bytes and
/// closes the connection.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct FetchRequest {
    pub request_id: Uuid,
    pub filename: String,
}

impl FetchRequest {
    pub fn new(filename: String) -> Self {
        FetchRequest {
            request_id: Uuid::new_v4(),
            filename,
        }
    }
}

/// Fetches replicas over TCP. The whole exchange is bounded by `timeout`.
#[derive(Debug, Clone)]
pub struct TcpReplicaFetcher {
    timeout: Duration,
    max_replica_bytes: u64,
}

impl TcpReplicaFetcher {
    pub fn new(timeout: Duration) -> Self {
        TcpReplicaFetcher {
            timeout,
            max_replica_bytes: (MAX_REPLICA_SIZE_MB * 1024 * 1024) as u64,
        }
    }

    /// Replicas larger than this are rejected rather than cut short.
    pub fn with_max_replica_bytes(mut self, max_replica_bytes: u64) -> Self {
        self.max_replica_bytes = max_replica_bytes;
        self
    }

    async fn exchange(&self, owner: &Owner, request: &FetchRequest) -> ControllerResult<Vec<u8>> {
        let mut stream = TcpStream::connect((owner.address.as_str(), owner.port)).await?;

        let serialized = serde_json::to_vec(request)
            .map_err(|e| ControllerError::InvalidArgument(format!("unencodable request: {}", e)))?;
        stream.write_all(&serialized).await?;
        // EOF marks the end of the request.
        stream.shutdown().await?;

        // One byte past the limit tells an oversize replica apart from one that fits exactly.
        let limit = self.max_replica_bytes;
        let mut data = Vec::new();
        stream.take(limit + 1).read_to_end(&mut data).await?;
        if data.len() as u64 > limit {
            return Err(ControllerError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "replica of '{}' from {} exceeds {} bytes",
                    request.filename, owner.node_id, limit
                ),
            )));
        }
        Ok(data)
    }
}

impl ReplicaFetcher for TcpReplicaFetcher {
    fn fetch<'a>(
        &'a self,
        owner: &'a Owner,
        filename: &'a str,
    ) -> BoxFuture<'a, ControllerResult<Vec<u8>>> {
        Box::pin(async move {
            let request = FetchRequest::new(filename.to_string());
            info!(
                "Fetching '{}' from {} [{}]",
                filename, owner, request.request_id
            );

            match timeout(self.timeout, self.exchange(owner, &request)).await {
                Ok(Ok(data)) => {
                    info!(
                        "Received {} bytes of '{}' from {}",
                        data.len(),
                        filename,
                        owner.node_id
                    );
                    Ok(data)
                }
                Ok(Err(e)) => Err(e),
                Err(_) => Err(ControllerError::Timeout(format!(
                    "fetching '{}' from {}:{}",
                    filename, owner.address, owner.port
                ))),
            }
        })
    }
}
