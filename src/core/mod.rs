pub mod error;
pub mod file_entry;
pub mod node_record;
