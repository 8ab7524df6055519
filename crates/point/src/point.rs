//! Point - the immutable measurement entity
//!
//! A `Point` owns its name, its canonically sorted tag set, the raw
//! undecoded byte span of every field, and a nanosecond timestamp.
//! Field spans are copied out of the parser's input at construction, so
//! a `Point` never aliases caller buffers and concurrent readers can
//! call `fields()`, `line_protocol()`, or `marshal_binary()` without
//! coordination.
//!
//! Construction goes through [`PointBuilder`] (or [`Point::new`] for
//! already-typed collections); parsing goes through
//! [`crate::parse_point`]. There are no mutators.

use std::collections::HashMap;
use std::fmt;

use bytes::Bytes;

use crate::error::PointError;
use crate::field::{self, FieldKind, FieldValue};
use crate::{MAX_KEY_LENGTH, Result, escape};

/// A single tag: one key/value pair of the series identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    /// Create a new tag
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Raw undecoded field value: the exact wire text plus its kind
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawValue {
    /// Exact text of the value (quotes, suffix, brackets included)
    pub(crate) span: Bytes,
    /// Syntactic kind recorded at parse or construction time
    pub(crate) kind: FieldKind,
}

/// A field key with its raw value
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawField {
    pub(crate) key: String,
    pub(crate) value: RawValue,
}

/// A single measurement event
///
/// Immutable after construction. Fields are stored as raw spans and
/// decoded on demand; decoding allocates fresh values and never
/// mutates the raw representation.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    name: String,
    tags: Vec<Tag>,
    fields: Vec<RawField>,
    time: i64,
}

impl Point {
    /// Start building a point with the given measurement name
    pub fn builder(name: impl Into<String>) -> PointBuilder {
        PointBuilder::new(name)
    }

    /// Construct a point from typed values
    ///
    /// Tags are sorted into canonical order; fields keep the given
    /// order and are encoded to their wire text immediately. Fails on
    /// an empty name, an empty tag or field key, an empty tag value, a
    /// duplicate key, an empty field set, or a value that cannot be
    /// represented on the wire (non-finite float, empty binary or
    /// array).
    pub fn new(
        name: impl Into<String>,
        tags: Vec<Tag>,
        fields: Vec<(String, FieldValue)>,
        time: i64,
    ) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(PointError::EmptyName);
        }
        if fields.is_empty() {
            return Err(PointError::MustHaveAField);
        }

        let mut tags = tags;
        for tag in &tags {
            if tag.key.is_empty() || tag.value.is_empty() {
                return Err(PointError::EmptyKey);
            }
        }
        tags.sort_by(|a, b| a.key.cmp(&b.key));
        if let Some(pair) = tags.windows(2).find(|pair| pair[0].key == pair[1].key) {
            return Err(PointError::DuplicateTag {
                key: pair[0].key.clone(),
            });
        }

        let mut raw_fields = Vec::with_capacity(fields.len());
        for (key, value) in fields {
            if key.is_empty() {
                return Err(PointError::EmptyKey);
            }
            if raw_fields.iter().any(|f: &RawField| f.key == key) {
                return Err(PointError::DuplicateField { key });
            }
            if let Err(reason) = value.validate() {
                return Err(PointError::invalid_field(key, reason));
            }
            let mut span = String::new();
            value.encode_into(&mut span);
            raw_fields.push(RawField {
                key,
                value: RawValue {
                    span: Bytes::from(span.into_bytes()),
                    kind: value.kind(),
                },
            });
        }

        let point = Self {
            name,
            tags,
            fields: raw_fields,
            time,
        };
        let key_len = point.series_key().len();
        if key_len > MAX_KEY_LENGTH {
            return Err(PointError::KeyTooLong {
                length: key_len,
                max: MAX_KEY_LENGTH,
            });
        }
        Ok(point)
    }

    /// Assemble a point whose parts were already validated by the parser
    pub(crate) fn from_parts(
        name: String,
        tags: Vec<Tag>,
        fields: Vec<RawField>,
        time: i64,
    ) -> Self {
        Self {
            name,
            tags,
            fields,
            time,
        }
    }

    /// Get the measurement name (unescaped)
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the tags in canonical (key-sorted) order
    #[inline]
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Get the timestamp in nanoseconds
    #[inline]
    pub fn time(&self) -> i64 {
        self.time
    }

    /// Get the number of fields
    #[inline]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Check whether a field with the given key exists
    pub fn has_field(&self, key: &str) -> bool {
        self.fields.iter().any(|f| f.key == key)
    }

    /// Iterate over the field keys in stored order
    pub fn field_keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.key.as_str())
    }

    /// Decode a single field by key
    ///
    /// Returns `None` for an unknown key. A decode failure of one field
    /// does not depend on any other field.
    pub fn field(&self, key: &str) -> Option<Result<FieldValue>> {
        self.fields
            .iter()
            .find(|f| f.key == key)
            .map(|f| field::decode_value(&f.key, &f.value.span, f.value.kind))
    }

    /// Decode every field into typed values
    ///
    /// Idempotent: repeated calls re-decode the same immutable spans
    /// and yield equal, independently owned results. The first field
    /// that fails to decode aborts the call with an error naming that
    /// field.
    pub fn fields(&self) -> Result<HashMap<String, FieldValue>> {
        let mut map = HashMap::with_capacity(self.fields.len());
        for f in &self.fields {
            let value = field::decode_value(&f.key, &f.value.span, f.value.kind)?;
            map.insert(f.key.clone(), value);
        }
        Ok(map)
    }

    /// Serialize to canonical line-protocol text
    ///
    /// Name and tags are escaped, fields are sorted by key and written
    /// as their stored raw spans, and the timestamp is appended. Works
    /// even when a field would fail to decode; the raw span is emitted
    /// as-is.
    pub fn line_protocol(&self) -> String {
        let mut out = String::with_capacity(64);
        self.write_key(&mut out);
        if !self.fields.is_empty() {
            out.push(' ');
            let mut sorted: Vec<&RawField> = self.fields.iter().collect();
            sorted.sort_by(|a, b| a.key.cmp(&b.key));
            for (i, f) in sorted.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                escape::escape_key(&f.key, &mut out);
                out.push('=');
                out.push_str(&String::from_utf8_lossy(&f.value.span));
            }
            out.push(' ');
            out.push_str(&self.time.to_string());
        }
        out
    }

    /// Get the raw fields in stored (parse) order
    pub(crate) fn raw_fields(&self) -> &[RawField] {
        &self.fields
    }

    /// Append the escaped series key (measurement + tags) to `out`
    pub(crate) fn write_key(&self, out: &mut String) {
        escape::escape_measurement(&self.name, out);
        for tag in &self.tags {
            out.push(',');
            escape::escape_key(&tag.key, out);
            out.push('=');
            escape::escape_key(&tag.value, out);
        }
    }

    /// Get the escaped series key as a string
    pub(crate) fn series_key(&self) -> String {
        let mut out = String::with_capacity(self.name.len());
        self.write_key(&mut out);
        out
    }

    /// Append the raw field section (stored order) to `out`
    pub(crate) fn write_fields_raw(&self, out: &mut String) {
        for (i, f) in self.fields.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            escape::escape_key(&f.key, out);
            out.push('=');
            out.push_str(&String::from_utf8_lossy(&f.value.span));
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.line_protocol())
    }
}

/// Builder for constructing points from typed values
///
/// The Rust construction surface for callers that hold native scalars,
/// byte sequences, or arrays rather than wire text.
#[derive(Debug, Clone)]
pub struct PointBuilder {
    name: String,
    tags: Vec<Tag>,
    fields: Vec<(String, FieldValue)>,
    time: Option<i64>,
}

impl PointBuilder {
    /// Create a builder for the given measurement name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: Vec::new(),
            fields: Vec::new(),
            time: None,
        }
    }

    /// Add a tag
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push(Tag::new(key, value));
        self
    }

    /// Add a field
    pub fn field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }

    /// Set the timestamp in nanoseconds (defaults to 0)
    pub fn timestamp(mut self, time: i64) -> Self {
        self.time = Some(time);
        self
    }

    /// Validate and build the point
    pub fn build(self) -> Result<Point> {
        Point::new(self.name, self.tags, self.fields, self.time.unwrap_or(0))
    }
}
