pub mod config;
pub mod error;
pub mod middleware;
pub mod protocol;
pub mod sandbox;
pub mod server;
pub mod storage;

pub use server::Server;
