//! Keel Point - line-protocol point parsing and field codec
//!
//! This crate is the ingestion-time encoder/decoder for a time-series
//! point: a measurement name, an ordered tag set, a set of typed fields,
//! and a nanosecond timestamp, expressed in the line-oriented text
//! protocol and convertible to the binary form the storage engine
//! persists.
//!
//! - `parse_point` / `parse_points` - text to `Point`
//! - `Point::fields()` - lazy decode of raw field spans to `FieldValue`
//! - `Point::line_protocol()` - canonical text re-serialization
//! - `Point::marshal_binary()` / `Point::unmarshal_binary()` - storage form
//!
//! # Design Principles
//!
//! - **Lazy decode**: parsing records each field's raw byte span and its
//!   syntactic kind; semantic interpretation (numeric conversion, base64,
//!   array elements) happens on first access
//! - **Immutable after construction**: input bytes are copied into owned
//!   spans, so concurrent readers need no coordination
//! - **Closed type union**: `FieldValue` is an exhaustive enum; callers
//!   handle every kind or none
//! - **Errors carry context**: parse errors name a byte offset, decode
//!   errors name the failing field key

mod binary;
mod error;
mod escape;
mod field;
mod parse;
mod point;
mod scan;

pub use error::PointError;
pub use field::{ArrayValue, FieldKind, FieldValue};
pub use parse::{Precision, parse_point, parse_points};
pub use point::{Point, PointBuilder, Tag};

// Re-export bytes for convenience
pub use bytes::Bytes;

/// Result type for point operations
pub type Result<T> = std::result::Result<T, PointError>;

/// Maximum length of a series key (escaped measurement + tags) in bytes
pub const MAX_KEY_LENGTH: usize = 65535;

#[cfg(test)]
mod parse_test;
