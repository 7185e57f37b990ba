use crate::registry::node_registry::NodeRegistry;
use log::{info, warn};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

/// Marks nodes offline once they have been silent for longer than `ttl`.
///
/// Nodes are never removed; a later registration or heartbeat brings them back online.
pub async fn sweep_stale_nodes(registry: &NodeRegistry, ttl: Duration) -> Vec<String> {
    let flipped = registry.mark_stale_offline(ttl, SystemTime::now()).await;
    for id in &flipped {
        warn!("Node {} missed its heartbeat window, marked OFFLINE", id);
    }
    flipped
}

/// Spawns a task that runs [`sweep_stale_nodes`] every `interval`.
/// The task runs until the returned handle is aborted.
pub fn spawn_liveness_sweeper(
    registry: Arc<NodeRegistry>,
    interval: Duration,
    ttl: Duration,
) -> JoinHandle<()> {
    info!(
        "Starting liveness sweeper (interval {:?}, node ttl {:?})",
        interval, ttl
    );
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            sweep_stale_nodes(&registry, ttl).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sweep_with_zero_ttl_marks_everyone_offline() {
        let registry = NodeRegistry::new();
        registry.register("A", "10.0.0.1", 5001).await.unwrap();
        registry.register("B", "10.0.0.2", 5001).await.unwrap();
        time::sleep(Duration::from_millis(5)).await;

        let flipped = sweep_stale_nodes(&registry, Duration::ZERO).await;
        assert_eq!(flipped, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(registry.online_count().await, 0);
    }

    #[tokio::test]
    async fn test_sweep_leaves_fresh_nodes_online() {
        let registry = NodeRegistry::new();
        registry.register("A", "10.0.0.1", 5001).await.unwrap();

        let flipped = sweep_stale_nodes(&registry, Duration::from_secs(60)).await;
        assert!(flipped.is_empty());
        assert_eq!(registry.is_online("A").await, Some(true));
    }

    #[tokio::test]
    async fn test_reregistration_after_sweep_brings_node_back() {
        let registry = NodeRegistry::new();
        registry.register("A", "10.0.0.1", 5001).await.unwrap();
        time::sleep(Duration::from_millis(5)).await;
        sweep_stale_nodes(&registry, Duration::ZERO).await;
        assert_eq!(registry.is_online("A").await, Some(false));

        registry.register("A", "10.0.0.1", 5001).await.unwrap();
        assert_eq!(registry.is_online("A").await, Some(true));
    }

    #[tokio::test]
    async fn test_spawned_sweeper_runs_and_aborts() {
        let registry = Arc::new(NodeRegistry::new());
        registry.register("A", "10.0.0.1", 5001).await.unwrap();

        let handle = spawn_liveness_sweeper(
            Arc::clone(&registry),
            Duration::from_millis(10),
            Duration::ZERO,
        );
        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(registry.is_online("A").await, Some(false));

        handle.abort();
        let result = handle.await;
        assert!(result.unwrap_err().is_cancelled());
    }
}
