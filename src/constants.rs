// This module contains the constants that affect the behavior of the controller.

/// Address recorded for owners that never registered with the controller.
pub const DEFAULT_OWNER_ADDRESS: &str = "127.0.0.1";

/// Port recorded for owners that never registered with the controller.
pub const DEFAULT_OWNER_PORT: u16 = 5001;

/// # Liveness
/// A node that has not registered or sent a heartbeat for this long is marked offline
/// by the sweeper. Nodes are never evicted.
pub const DEFAULT_NODE_TTL_S: u64 = 30;

/// How often the liveness sweeper runs.
pub const DEFAULT_SWEEP_INTERVAL_S: u64 = 15;

/// Upper bound for a whole replica fetch exchange (connect, request, read to EOF).
pub const FETCH_TIMEOUT_MILLISECONDS: u64 = 1000;

/// Largest replica accepted from a storage node in a single fetch.
pub const MAX_REPLICA_SIZE_MB: usize = 64;
