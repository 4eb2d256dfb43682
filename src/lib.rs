pub mod config;
pub mod expenses;
pub mod server;
