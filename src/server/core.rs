use axum::Router;
use log::info;
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::protocol::{AppState, router};
use crate::sandbox::{SandboxInitializer, SandboxPolicy};
use crate::storage::ConfinedFilesystem;

pub struct Server {
    listener: TcpListener,
    state: AppState,
}

impl Server {
    /// Checks the root, builds the confined filesystem and binds the
    /// listener. Nothing is served until [`Server::start`].
    pub async fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let root = config.server_root_path();

        let index = root.join(&config.index_file);
        if !index.is_file() {
            return Err(ServerError::MissingIndex(index));
        }

        let fs = ConfinedFilesystem::new(&root, &config.writable_dir_path())?;
        info!("Server root directory: {}", fs.root().display());
        info!("Writable directory: {}", fs.writable_root().display());

        let socket = config.socket_addr();
        let listener = TcpListener::bind(&socket).await?;
        info!("Server bound to {}", socket);

        Ok(Self {
            listener,
            state: AppState::new(fs, config),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn router(&self) -> Router {
        router(self.state.clone())
    }

    /// Applies the sandbox, then serves until the listener fails.
    /// A sandbox failure other than an unsupported platform aborts startup.
    pub async fn start(self, sandbox: &SandboxInitializer) -> Result<(), ServerError> {
        let policy = SandboxPolicy::for_editor(self.state.fs.root(), self.state.fs.writable_root());
        sandbox.initialize(&policy)?;

        let port = self.local_addr()?.port();
        info!("Running Weltmeister under {}", self.state.fs.root().display());
        info!("Game:   http://localhost:{port}");
        info!("Editor: http://localhost:{port}/editor");

        let app = self.router();
        axum::serve(
            self.listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;

        Ok(())
    }
}
