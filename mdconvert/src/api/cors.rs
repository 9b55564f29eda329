//! CORS headers for the conversion endpoint.
//!
//! The endpoint is meant to be called from any browser origin, so instead of a
//! configurable `CorsLayer` every response carries the same static header set.

use axum::http::{HeaderName, HeaderValue, header};

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "POST, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type";

/// Headers sent on preflight and successful conversion responses.
///
/// The first entry is always `Access-Control-Allow-Origin`, which error
/// responses send on its own.
pub fn response_headers() -> [(HeaderName, HeaderValue); 3] {
    [
        (header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static(ALLOW_ORIGIN)),
        (header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOW_METHODS)),
        (header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOW_HEADERS)),
    ]
}
