//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Response data structures (the JSON wire contract)
//! - **[`cors`]**: The fixed CORS header set every conversion response carries
//!
//! The conversion endpoint is mounted at both `/` and `/api/convert`.

pub mod cors;
pub mod handlers;
pub mod models;
