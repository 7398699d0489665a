//! HTTP protocol layer
//!
//! Routes requests to the save, browse and glob endpoints by exact path and
//! falls back to static asset serving for everything else.

pub mod handlers;
pub mod params;
pub mod responses;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use std::sync::Arc;

use crate::config::ServerConfig;
use crate::middleware::logging::log_request;
use crate::storage::ConfinedFilesystem;

/// Shared, read-only request state
#[derive(Clone)]
pub struct AppState {
    pub fs: Arc<ConfinedFilesystem>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(fs: ConfinedFilesystem, config: ServerConfig) -> Self {
        Self {
            fs: Arc::new(fs),
            config: Arc::new(config),
        }
    }
}

/// Builds the request router for the configured endpoints. Save bodies are
/// not size-capped, since level files can be large.
pub fn router(state: AppState) -> Router {
    let api = state.config.api.clone();

    Router::new()
        .route(
            &api.save,
            post(handlers::save)
                .fallback(handlers::method_not_allowed)
                .layer(DefaultBodyLimit::disable()),
        )
        .route(
            &api.browse,
            get(handlers::browse).fallback(handlers::method_not_allowed),
        )
        .route(
            &api.glob,
            get(handlers::glob).fallback(handlers::method_not_allowed),
        )
        .fallback(handlers::serve_asset)
        .layer(middleware::from_fn_with_state(state.clone(), log_request))
        .with_state(state)
}
