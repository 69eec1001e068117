//! HTTP surface for the relay: routing, controllers, typed params, and the
//! SSE subscriber endpoint.

use log::*;
use tokio::net::TcpListener;

pub(crate) mod controller;
pub mod error;
pub(crate) mod params;
pub mod router;
pub(crate) mod sse;

pub use error::{Error, Result};
pub use service::AppState;

/// Binds the listener and serves the API router until the process exits.
pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let host = app_state
        .config
        .interface
        .clone()
        .unwrap_or_else(|| "0.0.0.0".to_string());
    let port = app_state.config.port;

    let listener = TcpListener::bind(format!("{host}:{port}")).await?;
    info!("Server running at http://{host}:{port}");
    info!("SSE endpoint available at http://{host}:{port}/events");

    axum::serve(listener, router::define_routes(app_state)).await
}
