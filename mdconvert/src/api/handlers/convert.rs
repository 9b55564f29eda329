use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use tracing::{info, warn};

use crate::{
    AppState,
    api::{cors, models::convert::ConversionOutcome},
    conversion::markdown_filename,
    errors::{Error, Result},
    multipart::extract_upload,
    staging,
};

#[utoipa::path(
    post,
    path = "/",
    tag = "convert",
    summary = "Convert a file to Markdown",
    description = "Upload one file as multipart/form-data and receive its Markdown rendering. \
        The same endpoint is also served at /api/convert. Unsupported and binary files still \
        succeed, with a Markdown body explaining the problem.",
    request_body(content_type = "multipart/form-data", description = "A form with one file part"),
    responses(
        (status = 200, description = "Converted", body = ConversionOutcome),
        (status = 400, description = "Not multipart/form-data, empty body, or no file part", body = String),
        (status = 500, description = "Conversion or server failure", body = ConversionOutcome),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn convert_upload(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Result<impl IntoResponse> {
    let content_type = headers.get(header::CONTENT_TYPE).and_then(|value| value.to_str().ok());
    let content_length = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok());

    let upload = extract_upload(content_type, content_length, body).await?;
    let filename = upload.filename.clone();
    info!(filename = %filename, size = upload.bytes.len(), "Received upload");

    let dir = state.config.staging_dir();
    let staged = tokio::task::spawn_blocking(move || staging::stage(&dir, &upload))
        .await
        .map_err(|e| Error::Other(e.into()))?
        .map_err(|e| {
            warn!(error = %e, "Failed to stage upload");
            Error::Internal {
                operation: "stage upload".to_string(),
            }
        })?;

    let converted = state.converter.convert(staged.path(), &filename).await;

    if let Err(e) = staged.remove() {
        warn!(error = %e, "Failed to remove staged upload");
    }

    let converted = converted?;
    info!(filename = %filename, strategy = converted.strategy.as_str(), "Converted upload");

    Ok((
        StatusCode::OK,
        cors::response_headers(),
        Json(ConversionOutcome::converted(converted.markdown, markdown_filename(&filename))),
    ))
}

#[utoipa::path(
    options,
    path = "/",
    tag = "convert",
    summary = "CORS preflight",
    responses(
        (status = 200, description = "Allowed methods and headers"),
    )
)]
pub async fn preflight() -> impl IntoResponse {
    (StatusCode::OK, cors::response_headers())
}
