//! ccbrowse-web - HTTP API server for ccbrowse using Axum

pub mod error;
pub mod router;

pub use error::ApiError;
pub use router::create_router;

use anyhow::{Context, Result};
use ccbrowse_core::LocalSessionStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Address the server binds for `port`
pub fn bind_addr(port: u16) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], port))
}

/// Run the web server
pub async fn run(store: Arc<LocalSessionStore>, port: u16) -> Result<()> {
    let listener = TcpListener::bind(bind_addr(port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    serve(listener, store).await
}

/// Serve on an already bound listener
pub async fn serve(listener: TcpListener, store: Arc<LocalSessionStore>) -> Result<()> {
    let addr = listener.local_addr().context("Listener has no local address")?;
    let router = create_router(store);

    info!(%addr, "Web server listening");
    println!("Web server listening on http://{}", addr);

    axum::serve(listener, router)
        .await
        .context("Web server terminated")?;

    Ok(())
}
