//! Route handlers.

use crate::error::ApiError;
use crate::AppState;
use axum::body::Body;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bk_protocol::api_models::{ProductInfoResponse, StepStatusResponse, SubmitResponse};
use bk_protocol::run_models::RunSnapshot;
use log::{info, warn};
use serde::Deserialize;
use tokio_stream::StreamExt;
use tokio_util::io::{ReaderStream, StreamReader};
use uuid::Uuid;

/// Multipart field carrying the image.
const FILE_FIELD: &str = "file";

/// Optional run selector shared by the upload and polling routes.
#[derive(Debug, Default, Deserialize)]
pub struct RunQuery {
    pub run_id: Option<Uuid>,
}

/// `POST /upload`: store the `file` part and convert it.
///
/// Always answers 200 with a [`SubmitResponse`]; failures are reported in
/// the body. A client that disconnects after the upload is stored does not
/// stop the conversion.
pub async fn handle_upload(
    State(service): State<AppState>,
    Query(query): Query<RunQuery>,
    mut multipart: Multipart,
) -> Json<SubmitResponse> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Json(SubmitResponse::failed(None, "No file part")),
            Err(err) => {
                warn!("rejected malformed upload: {err}");
                return Json(SubmitResponse::failed(None, format!("Invalid upload: {err}")));
            }
        };
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        info!("upload received: {:?}", filename);
        let chunks = field.map(|chunk| chunk.map_err(std::io::Error::other));
        let reader = StreamReader::new(Box::pin(chunks));

        let outcome = service.submit(&filename, reader, query.run_id).await;
        return Json(outcome.to_response());
    }
}

/// `GET /download/{filename}`: stream a produced image as an attachment.
pub async fn handle_download(
    State(service): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let path = service
        .artifact_path(&filename)
        .ok_or_else(|| ApiError::not_found("File not found"))?;
    let file = tokio::fs::File::open(&path).await.map_err(|err| {
        warn!("failed to open {}: {err}", path.display());
        ApiError::not_found("File not found")
    })?;
    let length = file
        .metadata()
        .await
        .map_err(|err| ApiError::internal(err.to_string()))?
        .len();

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        filename.replace('"', "_")
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    let body = Body::from_stream(ReaderStream::new(file));
    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CONTENT_LENGTH, HeaderValue::from(length)),
        ],
        body,
    )
        .into_response())
}

/// `GET /step-status`: stage records of one run, or of the latest.
pub async fn handle_step_status(
    State(service): State<AppState>,
    Query(query): Query<RunQuery>,
) -> Result<Json<StepStatusResponse>, ApiError> {
    service
        .step_status(query.run_id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Run not found"))
}

/// `GET /product-info`: product metadata of one run, or of the latest.
pub async fn handle_product_info(
    State(service): State<AppState>,
    Query(query): Query<RunQuery>,
) -> Result<Json<ProductInfoResponse>, ApiError> {
    service
        .product_info(query.run_id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Run not found"))
}

/// `GET /runs/{run_id}`
pub async fn handle_run(
    State(service): State<AppState>,
    Path(run_id): Path<Uuid>,
) -> Result<Json<RunSnapshot>, ApiError> {
    service
        .snapshot(run_id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Run not found"))
}

pub async fn handle_healthz() -> &'static str {
    "ok"
}
