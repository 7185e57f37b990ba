pub mod liveness;
pub mod node_registry;
