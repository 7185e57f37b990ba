use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::time::SystemTime;

/// Network location of a storage node.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
pub struct NodeLocation {
    pub address: String,
    pub port: u16,
}

impl NodeLocation {
    pub fn new(address: String, port: u16) -> Self {
        NodeLocation { address, port }
    }
}

impl Display for NodeLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

/// Last known state of one storage node.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NodeRecord {
    pub id: String,
    pub address: String,
    pub port: u16,
    pub online: bool,
    /// Time of the last registration or heartbeat.
    pub last_seen: SystemTime,
}

impl NodeRecord {
    pub fn new(id: String, address: String, port: u16) -> Self {
        NodeRecord {
            id,
            address,
            port,
            online: true,
            last_seen: SystemTime::now(),
        }
    }

    pub fn location(&self) -> NodeLocation {
        NodeLocation::new(self.address.clone(), self.port)
    }

    /// Refresh `last_seen` and bring the node back online.
    pub fn touch(&mut self) {
        self.online = true;
        self.last_seen = SystemTime::now();
    }
}

impl Display for NodeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.online { "ONLINE" } else { "OFFLINE" };
        write!(f, "{} @ {}:{} ({})", self.id, self.address, self.port, status)
    }
}
