//! HTTP request handlers.
//!
//! - [`convert`]: file upload to Markdown conversion and its CORS preflight
//!
//! Handlers return [`crate::errors::Error`], which turns into the right status
//! code and body for each failure class.

pub mod convert;
