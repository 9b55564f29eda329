//! API response data models.
//!
//! - [`convert`]: The `ConversionOutcome` returned by the conversion endpoint

pub mod convert;
