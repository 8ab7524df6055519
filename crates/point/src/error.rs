//! Error types for point parsing, field decoding, and persistence
//!
//! One enum covers the four failure groups: syntax errors (malformed
//! text, carry a byte offset), field decode errors (carry the field
//! key), the persistence-contract sentinel for field-less points, and
//! corruption errors from binary unmarshaling.

use thiserror::Error;

/// Errors that can occur when parsing, decoding, or persisting points
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PointError {
    /// Malformed text structure
    #[error("syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },

    /// Tag key appears more than once in one point
    #[error("duplicate tag key {key:?}")]
    DuplicateTag { key: String },

    /// Field key appears more than once in one point
    #[error("duplicate field key {key:?}")]
    DuplicateField { key: String },

    /// Trailing timestamp is not a valid integer
    #[error("invalid timestamp at offset {offset}: {token:?}")]
    InvalidTimestamp { offset: usize, token: String },

    /// Escaped measurement + tags exceed the series key limit
    #[error("series key too long: {length} bytes exceeds maximum {max}")]
    KeyTooLong { length: usize, max: usize },

    /// Constructed point has an empty measurement name
    #[error("point must have a measurement name")]
    EmptyName,

    /// Constructed point has an empty tag or field key
    #[error("tag and field keys must not be empty")]
    EmptyKey,

    /// Constructed field value cannot be represented on the wire
    #[error("invalid value for field {key:?}: {reason}")]
    InvalidField { key: String, reason: String },

    /// Syntactically valid raw span failed semantic interpretation
    #[error("unable to decode field {key:?}: {reason}")]
    FieldDecode { key: String, reason: String },

    /// Marshal sentinel: the storage format needs at least one field
    #[error("point must have at least one field")]
    MustHaveAField,

    /// Binary input is shorter than its length prefixes require
    #[error("binary point too short: need at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },

    /// Binary input is structurally inconsistent
    #[error("corrupt binary point: {0}")]
    Corrupt(String),
}

impl PointError {
    /// Create a syntax error at the given byte offset
    #[inline]
    pub fn syntax(offset: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            offset,
            message: message.into(),
        }
    }

    /// Create a field decode error naming the failing field
    #[inline]
    pub fn field_decode(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::FieldDecode {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create a construction-time invalid field value error
    #[inline]
    pub fn invalid_field(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create a binary truncation error
    #[inline]
    pub fn too_short(expected: usize, actual: usize) -> Self {
        Self::TooShort { expected, actual }
    }

    /// Create a binary corruption error
    #[inline]
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt(message.into())
    }

    /// Shift offset-bearing variants by a base offset
    ///
    /// Used by batch parsing so errors report positions in the whole
    /// input rather than within one line.
    pub(crate) fn offset_by(self, base: usize) -> Self {
        match self {
            Self::Syntax { offset, message } => Self::Syntax {
                offset: offset + base,
                message,
            },
            Self::InvalidTimestamp { offset, token } => Self::InvalidTimestamp {
                offset: offset + base,
                token,
            },
            other => other,
        }
    }

    /// Check if this is a parse-time syntax error
    pub fn is_syntax(&self) -> bool {
        matches!(
            self,
            Self::Syntax { .. }
                | Self::DuplicateTag { .. }
                | Self::DuplicateField { .. }
                | Self::InvalidTimestamp { .. }
                | Self::KeyTooLong { .. }
        )
    }

    /// Check if this is a lazy field decode error
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::FieldDecode { .. })
    }

    /// Check if this is a binary corruption error
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::TooShort { .. } | Self::Corrupt(_))
    }
}
