//! Recovers the uploaded file from a `multipart/form-data` request body.
//!
//! Parsing is delegated to [`multer`]; this module only decides which part is
//! "the file". A part qualifies when it carries both a `filename` in its
//! `Content-Disposition` and its own `Content-Type` header, which is what
//! browsers send for `<input type="file">` fields. The first qualifying part
//! wins and later parts are never read.

use std::convert::Infallible;

use axum::http::header::CONTENT_TYPE;
use bytes::Bytes;
use tracing::debug;

use crate::errors::{Error, Result};

const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// A single uploaded file, as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub filename: String,
    pub bytes: Bytes,
}

/// Extract the first file part from a multipart request body.
///
/// `content_type` and `content_length` are the raw request header values, if present.
pub async fn extract_upload(content_type: Option<&str>, content_length: Option<u64>, body: Bytes) -> Result<Upload> {
    let content_type = content_type
        .filter(|value| value.starts_with(MULTIPART_FORM_DATA))
        .ok_or(Error::UnsupportedContentType)?;

    if content_length == Some(0) || body.is_empty() {
        return Err(Error::EmptyBody);
    }

    let boundary = multer::parse_boundary(content_type).map_err(|e| {
        debug!(error = %e, "Multipart content type without a usable boundary");
        Error::NoFileFound
    })?;

    let stream = futures::stream::once(async move { Ok::<_, Infallible>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!(error = %e, "Malformed multipart body");
        Error::NoFileFound
    })? {
        let Some(filename) = field.file_name().map(str::to_owned) else {
            debug!(field = ?field.name(), "Skipping non-file form field");
            continue;
        };
        // Presence of the header is enough; its value need not parse as a MIME type
        if !field.headers().contains_key(CONTENT_TYPE) {
            debug!(filename = %filename, "Skipping file field without a content type");
            continue;
        }

        let bytes = field.bytes().await.map_err(|e| {
            debug!(error = %e, "Failed to read file part");
            Error::NoFileFound
        })?;

        if filename.is_empty() || bytes.is_empty() {
            return Err(Error::NoFileFound);
        }

        return Ok(Upload { filename, bytes });
    }

    Err(Error::NoFileFound)
}
