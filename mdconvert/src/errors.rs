use crate::api::{cors, models::convert::ConversionOutcome};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Request body is not `multipart/form-data`
    #[error("Only multipart/form-data is supported")]
    UnsupportedContentType,

    /// Request carried no body at all
    #[error("No file data received")]
    EmptyBody,

    /// Multipart body parsed, but no part looked like a file upload
    #[error("No valid file found in request")]
    NoFileFound,

    /// I/O failure while converting that could not be reported as Markdown
    #[error("Conversion failed: {message}")]
    ConversionFailed { message: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::UnsupportedContentType | Error::EmptyBody | Error::NoFileFound => StatusCode::BAD_REQUEST,
            Error::ConversionFailed { .. } | Error::Internal { .. } | Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::UnsupportedContentType | Error::EmptyBody | Error::NoFileFound => self.to_string(),
            Error::ConversionFailed { .. } => self.to_string(),
            Error::Internal { operation } => format!("Server error: failed to {operation}"),
            Error::Other(_) => "Server error: internal server error".to_string(),
        }
    }

    fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self {
            Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::ConversionFailed { .. } => {
                tracing::warn!("Conversion error: {}", self);
            }
            Error::UnsupportedContentType | Error::EmptyBody | Error::NoFileFound => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();
        let user_message = self.user_message();

        // Request-shape errors are plain text; everything else uses the JSON outcome shape
        let mut response = if self.is_client_error() {
            (status, user_message).into_response()
        } else {
            (status, Json(ConversionOutcome::failed(user_message))).into_response()
        };

        let [(name, value), ..] = cors::response_headers();
        response.headers_mut().insert(name, value);
        response
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
