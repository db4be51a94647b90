//! REST command surface for taskboard.
//!
//! Cards and columns are addressed by their external hashes
//! (`card-xxxx`, `col-xxxx`). Creates accept an `Idempotency-Key` header so
//! retries never duplicate an entity.

pub mod error;
pub mod routes;
pub mod service;
pub mod views;

pub use error::ApiError;
pub use routes::{router, IDEMPOTENCY_KEY_HEADER};
pub use service::BoardService;
pub use views::*;

use std::net::SocketAddr;
use std::sync::Arc;
use taskboard_persistence::BoardRepository;

/// Bind `addr` and serve the router until the server fails.
pub async fn serve<R>(addr: SocketAddr, service: Arc<BoardService<R>>) -> std::io::Result<()>
where
    R: BoardRepository + ?Sized + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Taskboard API listening on {}", listener.local_addr()?);
    axum::serve(listener, router(service)).await
}
