pub mod config;
pub mod constants;
pub mod controller;
pub mod core;

pub mod directory;
pub mod registry;
pub mod utils;
