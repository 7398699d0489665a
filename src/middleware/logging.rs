//! Logging middleware
//!
//! Logger setup and the optional per-request access log.

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use env_logger::Env;
use log::info;
use std::net::SocketAddr;

use crate::protocol::AppState;

/// Initialize env_logger at `info` unless RUST_LOG says otherwise.
pub fn setup_logging() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}

/// Log a request and its status when `log_requests` is enabled
pub async fn log_request(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if !state.config.log_requests {
        return next.run(request).await;
    }

    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string());
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;
    info!("{} \"{} {}\" {}", client, method, uri, response.status().as_u16());
    response
}
