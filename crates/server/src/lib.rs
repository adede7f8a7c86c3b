//! # bk-server
//!
//! HTTP surface of bootkit: image upload, artifact download and progress
//! polling over an [`ImageService`].

pub mod error;
pub mod handlers;

pub use error::{ApiError, ServerError};

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use bk_core::service::ImageService;
use log::info;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Shared handler state.
pub type AppState = Arc<ImageService>;

/// Allowance for multipart framing on top of the upload size limit.
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

/// Build the router with every route and the upload body limit.
pub fn build_router(service: AppState) -> Router {
    let body_limit = service
        .config()
        .max_upload_bytes
        .saturating_add(MULTIPART_OVERHEAD);
    let body_limit = usize::try_from(body_limit).unwrap_or(usize::MAX);

    Router::new()
        .route("/upload", post(handlers::handle_upload))
        .route("/download/:filename", get(handlers::handle_download))
        .route("/step-status", get(handlers::handle_step_status))
        .route("/product-info", get(handlers::handle_product_info))
        .route("/runs/:run_id", get(handlers::handle_run))
        .route("/healthz", get(handlers::handle_healthz))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(service)
}

/// Prepare storage, bind `service.config().bind` and serve until `shutdown`
/// resolves.
pub async fn run_server<F>(service: AppState, shutdown: F) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    service.prepare_dirs().await?;

    let addr = service.config().bind.clone();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;
    info!(
        "listening on http://{} (uploads: {}, output: {})",
        addr,
        service.config().upload_dir.display(),
        service.config().output_dir.display()
    );

    axum::serve(listener, build_router(service))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ServerError::Serve)?;

    info!("server stopped");
    Ok(())
}
