use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::time::SystemTime;

/// A node recorded as holding a replica.
///
/// This is a copy of the node's location at upload time, not a live reference into the
/// registry. Re-registering the node at another address leaves existing owners untouched.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
pub struct Owner {
    pub node_id: String,
    pub address: String,
    pub port: u16,
}

impl Owner {
    pub fn new(node_id: String, address: String, port: u16) -> Self {
        Owner {
            node_id,
            address,
            port,
        }
    }
}

impl Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{})", self.node_id, self.address, self.port)
    }
}

/// Directory record for one filename.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FileEntry {
    pub filename: String,
    /// Insertion-ordered set of owners. Identical triples collapse.
    owners: Vec<Owner>,
    /// Time of the most recent upload touching this file.
    pub upload_time: SystemTime,
}

impl FileEntry {
    pub fn new(filename: String) -> Self {
        FileEntry {
            filename,
            owners: Vec::new(),
            upload_time: SystemTime::now(),
        }
    }

    /// Adds the owner unless an identical triple is already present.
    /// Returns `true` if the set grew.
    pub fn add_owner(&mut self, owner: Owner) -> bool {
        if self.owners.contains(&owner) {
            false
        } else {
            self.owners.push(owner);
            true
        }
    }

    pub fn owners(&self) -> &[Owner] {
        &self.owners
    }

    pub fn touch(&mut self) {
        self.upload_time = SystemTime::now();
    }
}

impl Display for FileEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [", self.filename)?;
        for (i, owner) in self.owners.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", owner)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_owner_collapses() {
        let mut entry = FileEntry::new("x".into());
        assert!(entry.add_owner(Owner::new("A".into(), "10.0.0.1".into(), 5001)));
        assert!(!entry.add_owner(Owner::new("A".into(), "10.0.0.1".into(), 5001)));
        assert_eq!(entry.owners().len(), 1);
    }

    #[test]
    fn test_same_node_at_new_location_is_kept() {
        let mut entry = FileEntry::new("x".into());
        entry.add_owner(Owner::new("A".into(), "10.0.0.1".into(), 5001));
        entry.add_owner(Owner::new("A".into(), "10.0.0.2".into(), 6000));
        assert_eq!(entry.owners().len(), 2);
        assert_eq!(entry.owners()[1].address, "10.0.0.2");
    }

    #[test]
    fn test_display() {
        let mut entry = FileEntry::new("report.txt".into());
        entry.add_owner(Owner::new("A".into(), "10.0.0.1".into(), 5001));
        entry.add_owner(Owner::new("B".into(), "127.0.0.1".into(), 5001));
        assert_eq!(
            format!("{}", entry),
            "report.txt [A (10.0.0.1:5001), B (127.0.0.1:5001)]"
        );
    }
}
