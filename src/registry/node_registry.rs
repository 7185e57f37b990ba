use crate::core::error::{ControllerError, ControllerResult};
use crate::core::node_record::{NodeLocation, NodeRecord};
use log::{debug, info};
use std::collections::HashMap;
use std::time::{Duration, SystemTime};
use tokio::sync::RwLock;

/// Records keyed by id, plus ids in first-registration order.
#[derive(Default)]
struct NodeTable {
    nodes: HashMap<String, NodeRecord>,
    order: Vec<String>,
}

///
/// # Node Registry
///
/// Authoritative mapping from node id to its last known location and liveness.
/// Every access goes through a single `RwLock`, so readers always see whole records.
///
#[derive(Default)]
pub struct NodeRegistry {
    table: RwLock<NodeTable>,
}

fn validate_registration(id: &str, address: &str, port: u16) -> ControllerResult<()> {
    if id.is_empty() {
        return Err(ControllerError::InvalidArgument(
            "node id must not be empty".to_string(),
        ));
    }
    if address.is_empty() || address.chars().any(char::is_whitespace) {
        return Err(ControllerError::InvalidArgument(format!(
            "malformed address '{}'",
            address
        )));
    }
    if port == 0 {
        return Err(ControllerError::InvalidArgument(
            "port must be in 1..=65535".to_string(),
        ));
    }
    Ok(())
}

impl NodeRegistry {
    pub fn new() -> Self {
        NodeRegistry {
            table: RwLock::new(NodeTable::default()),
        }
    }

    /// Creates or overwrites the record for `id`. The node is marked online and
    /// `last_seen` is set to now. Last write wins, nothing is merged.
    pub async fn register(&self, id: &str, address: &str, port: u16) -> ControllerResult<()> {
        validate_registration(id, address, port)?;

        let record = NodeRecord::new(id.to_string(), address.to_string(), port);
        let mut table = self.table.write().await;
        if table.nodes.insert(id.to_string(), record).is_none() {
            table.order.push(id.to_string());
        }

        info!("Node {} registered at {}:{} (ONLINE)", id, address, port);
        Ok(())
    }

    pub async fn lookup(&self, id: &str) -> ControllerResult<NodeRecord> {
        let table = self.table.read().await;
        table
            .nodes
            .get(id)
            .cloned()
            .ok_or_else(|| ControllerError::NotFound(format!("node '{}'", id)))
    }

    /// Location of a registered node, `None` if the id is unknown.
    pub async fn location_of(&self, id: &str) -> Option<NodeLocation> {
        let table = self.table.read().await;
        table.nodes.get(id).map(NodeRecord::location)
    }

    /// Liveness of a registered node, `None` if the id is unknown.
    pub async fn is_online(&self, id: &str) -> Option<bool> {
        let table = self.table.read().await;
        table.nodes.get(id).map(|record| record.online)
    }

    /// All records in first-registration order.
    pub async fn snapshot(&self) -> Vec<NodeRecord> {
        let table = self.table.read().await;
        table
            .order
            .iter()
            .filter_map(|id| table.nodes.get(id))
            .cloned()
            .collect()
    }

    /// Refreshes `last_seen` and marks the node online without touching its location.
    pub async fn heartbeat(&self, id: &str) -> ControllerResult<()> {
        let mut table = self.table.write().await;
        match table.nodes.get_mut(id) {
            Some(record) => {
                record.touch();
                debug!("Heartbeat from node {}", id);
                Ok(())
            }
            None => Err(ControllerError::NotFound(format!("node '{}'", id))),
        }
    }

    pub async fn mark_offline(&self, id: &str) -> ControllerResult<()> {
        let mut table = self.table.write().await;
        match table.nodes.get_mut(id) {
            Some(record) => {
                record.online = false;
                info!("Node {} marked OFFLINE", id);
                Ok(())
            }
            None => Err(ControllerError::NotFound(format!("node '{}'", id))),
        }
    }

    /// Marks every online node whose `last_seen` is older than `ttl` (relative to `now`)
    /// as offline. Returns the ids that were flipped, in registration order.
    pub(crate) async fn mark_stale_offline(&self, ttl: Duration, now: SystemTime) -> Vec<String> {
        let mut table = self.table.write().await;
        let NodeTable { nodes, order } = &mut *table;

        let mut flipped = Vec::new();
        for id in order.iter() {
            if let Some(record) = nodes.get_mut(id) {
                // A clock step backwards counts as "just seen".
                let elapsed = now
                    .duration_since(record.last_seen)
                    .unwrap_or(Duration::ZERO);
                if record.online && elapsed > ttl {
                    record.online = false;
                    flipped.push(id.clone());
                }
            }
        }
        flipped
    }

    pub async fn online_count(&self) -> usize {
        let table = self.table.read().await;
        table.nodes.values().filter(|record| record.online).count()
    }

    pub async fn len(&self) -> usize {
        self.table.read().await.nodes.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.table.read().await.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn age_node(registry: &NodeRegistry, id: &str, by: Duration) {
        let mut table = registry.table.write().await;
        let record = table.nodes.get_mut(id).unwrap();
        record.last_seen = SystemTime::now() - by;
    }

    #[tokio::test]
    async fn test_register_and_lookup() {
        let registry = NodeRegistry::new();
        registry.register("A", "10.0.0.1", 5001).await.unwrap();

        let record = registry.lookup("A").await.unwrap();
        assert_eq!(record.id, "A");
        assert_eq!(record.address, "10.0.0.1");
        assert_eq!(record.port, 5001);
        assert!(record.online);
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let registry = NodeRegistry::new();
        registry.register("A", "10.0.0.1", 5001).await.unwrap();
        registry.mark_offline("A").await.unwrap();
        registry.register("A", "10.0.0.3", 7000).await.unwrap();
        registry.register("A", "10.0.0.2", 6000).await.unwrap();

        let record = registry.lookup("A").await.unwrap();
        assert_eq!(record.location(), NodeLocation::new("10.0.0.2".into(), 6000));
        assert!(record.online);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_lookup_unknown_is_not_found() {
        let registry = NodeRegistry::new();
        let result = registry.lookup("ghost").await;
        assert!(matches!(result, Err(ControllerError::NotFound(_))));
        assert!(registry.location_of("ghost").await.is_none());
        assert!(registry.is_online("ghost").await.is_none());
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_arguments() {
        let registry = NodeRegistry::new();
        let cases = [
            ("", "10.0.0.1", 5001),
            ("A", "", 5001),
            ("A", "10.0 .0.1", 5001),
            ("A", "10.0.0.1", 0),
        ];
        for (id, address, port) in cases {
            let result = registry.register(id, address, port).await;
            assert!(
                matches!(result, Err(ControllerError::InvalidArgument(_))),
                "expected InvalidArgument for ({:?}, {:?}, {})",
                id,
                address,
                port
            );
        }
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_snapshot_keeps_first_registration_order() {
        let registry = NodeRegistry::new();
        registry.register("C", "10.0.0.3", 5001).await.unwrap();
        registry.register("A", "10.0.0.1", 5001).await.unwrap();
        registry.register("B", "10.0.0.2", 5001).await.unwrap();
        // Re-registering must not move the node to the back.
        registry.register("C", "10.0.0.9", 5002).await.unwrap();

        let ids: Vec<String> = registry.snapshot().await.into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["C", "A", "B"]);
        assert_eq!(registry.snapshot().await[0].address, "10.0.0.9");
    }

    #[tokio::test]
    async fn test_heartbeat_keeps_location() {
        let registry = NodeRegistry::new();
        registry.register("A", "10.0.0.1", 5001).await.unwrap();
        registry.mark_offline("A").await.unwrap();
        assert_eq!(registry.is_online("A").await, Some(false));

        registry.heartbeat("A").await.unwrap();
        let record = registry.lookup("A").await.unwrap();
        assert!(record.online);
        assert_eq!(record.address, "10.0.0.1");

        assert!(registry.heartbeat("ghost").await.unwrap_err().is_not_found());
        assert!(registry.mark_offline("ghost").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_mark_stale_offline() {
        let registry = NodeRegistry::new();
        registry.register("A", "10.0.0.1", 5001).await.unwrap();
        registry.register("B", "10.0.0.2", 5001).await.unwrap();
        age_node(&registry, "A", Duration::from_secs(120)).await;

        let flipped = registry
            .mark_stale_offline(Duration::from_secs(30), SystemTime::now())
            .await;
        assert_eq!(flipped, vec!["A".to_string()]);
        assert_eq!(registry.is_online("A").await, Some(false));
        assert_eq!(registry.is_online("B").await, Some(true));
        assert_eq!(registry.online_count().await, 1);

        // Already offline nodes are not reported twice.
        let flipped = registry
            .mark_stale_offline(Duration::from_secs(30), SystemTime::now())
            .await;
        assert!(flipped.is_empty());
    }
}
