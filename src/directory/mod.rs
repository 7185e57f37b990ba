pub mod file_directory;
pub mod replica_fetcher;
