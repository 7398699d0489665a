//! Weltmeister level editor server - Entry Point
//!
//! Serves the game and editor assets and the editor's file API from a
//! sandboxed root directory.

use log::{error, info};
use std::process;

use weltmeister_server::config::ServerConfig;
use weltmeister_server::middleware::logging::setup_logging;
use weltmeister_server::sandbox::SandboxInitializer;
use weltmeister_server::server::Server;

// Landlock binds the calling thread and its later children only, so every
// task runs on the main thread.
#[tokio::main(flavor = "current_thread")]
async fn main() {
    setup_logging();

    info!("Launching level editor server...");

    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let server = match Server::new(config).await {
        Ok(server) => server,
        Err(e) => {
            error!("Server startup failed: {}", e);
            process::exit(1);
        }
    };

    let sandbox = SandboxInitializer::for_platform();
    if let Err(e) = server.start(&sandbox).await {
        error!("Server stopped: {}", e);
        process::exit(1);
    }
}
