//! Field value types and codec
//!
//! A field's raw text span is classified into a [`FieldKind`] at parse
//! time from its syntactic form alone (suffix, quoting, brackets), and
//! only interpreted into a [`FieldValue`] when the caller asks for it.
//! Decoding is a pure function of the raw bytes: it allocates fresh
//! owned values and never touches the span.
//!
//! # Text Forms
//!
//! ```text
//! 1.5          float         (bare numeral)
//! 2i           integer       (numeral + 'i')
//! 32u          unsigned      (numeral + 'u')
//! true         boolean       (t, T, true, f, F, false)
//! "abc"        string        (backslash-escaped '"' and '\')
//! "MTIzCg=="b  binary        (base64 payload + 'b')
//! [1i,2i]      array         (homogeneous elements, trailing comma ok)
//! ```

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::PointError;
use crate::{Result, escape, scan};

// =============================================================================
// Syntactic Kind
// =============================================================================

/// Syntactic form of a raw field value, recorded at parse time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Bare numeral, no suffix
    Float,
    /// Numeral with `i` suffix
    Integer,
    /// Numeral with `u` suffix
    Unsigned,
    /// One of `t`, `T`, `true`, `f`, `F`, `false`
    Boolean,
    /// Double-quoted, no suffix
    String,
    /// Double-quoted base64 payload with `b` suffix
    Binary,
    /// Bracketed comma-separated elements
    Array,
}

impl FieldKind {
    /// Get the string name of this kind
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Integer => "integer",
            Self::Unsigned => "unsigned",
            Self::Boolean => "boolean",
            Self::String => "string",
            Self::Binary => "binary",
            Self::Array => "array",
        }
    }

    /// Classify a raw value span by its syntactic form
    ///
    /// `offset` is the span's position in the line, used for error
    /// reporting. Validates shape (digits, suffix, quote closure) but
    /// performs no semantic interpretation; overflow, base64 payloads,
    /// and array elements are checked at decode time.
    pub(crate) fn classify(span: &[u8], offset: usize) -> Result<Self> {
        let Some(&first) = span.first() else {
            return Err(PointError::syntax(offset, "missing field value"));
        };
        match first {
            b'"' => {
                let Some(close) = scan::find_closing_quote(span) else {
                    return Err(PointError::syntax(offset, "unterminated string"));
                };
                match &span[close + 1..] {
                    [] => Ok(Self::String),
                    [b'b'] => Ok(Self::Binary),
                    rest => Err(PointError::syntax(
                        offset + close + 1,
                        format!(
                            "unsupported suffix {:?} after quoted value",
                            String::from_utf8_lossy(rest)
                        ),
                    )),
                }
            }
            b'[' => {
                if span.len() >= 2 && span[span.len() - 1] == b']' {
                    Ok(Self::Array)
                } else {
                    Err(PointError::syntax(offset, "unbalanced brackets"))
                }
            }
            _ => Self::classify_bare(span, offset),
        }
    }

    fn classify_bare(span: &[u8], offset: usize) -> Result<Self> {
        if matches!(span, b"t" | b"T" | b"true" | b"f" | b"F" | b"false") {
            return Ok(Self::Boolean);
        }
        match span.last() {
            Some(b'i') => {
                if is_integer_body(&span[..span.len() - 1], true) {
                    Ok(Self::Integer)
                } else {
                    Err(PointError::syntax(
                        offset,
                        format!("invalid integer {:?}", String::from_utf8_lossy(span)),
                    ))
                }
            }
            Some(b'u') => {
                if is_integer_body(&span[..span.len() - 1], false) {
                    Ok(Self::Unsigned)
                } else {
                    Err(PointError::syntax(
                        offset,
                        format!(
                            "invalid unsigned integer {:?}",
                            String::from_utf8_lossy(span)
                        ),
                    ))
                }
            }
            _ => {
                if is_float_body(span) {
                    Ok(Self::Float)
                } else {
                    Err(PointError::syntax(
                        offset,
                        format!("invalid number {:?}", String::from_utf8_lossy(span)),
                    ))
                }
            }
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Check a numeral body: optional leading `-` (signed only), then digits
fn is_integer_body(body: &[u8], signed: bool) -> bool {
    let digits = match body.first() {
        Some(&b'-') if signed => &body[1..],
        _ => body,
    };
    !digits.is_empty() && digits.iter().all(u8::is_ascii_digit)
}

/// Check a float body: `-?digits[.digits][eE[+-]digits]`
fn is_float_body(span: &[u8]) -> bool {
    let mut i = usize::from(span.first() == Some(&b'-'));
    let mut digits = 0usize;
    let mut dot = false;
    while i < span.len() {
        match span[i] {
            b'0'..=b'9' => digits += 1,
            b'.' if !dot => dot = true,
            b'e' | b'E' => break,
            _ => return false,
        }
        i += 1;
    }
    if digits == 0 {
        return false;
    }
    if i < span.len() {
        i += 1; // consume the exponent marker
        if matches!(span.get(i), Some(&b'+' | &b'-')) {
            i += 1;
        }
        if i >= span.len() {
            return false;
        }
        while i < span.len() {
            if !span[i].is_ascii_digit() {
                return false;
            }
            i += 1;
        }
    }
    true
}

// =============================================================================
// Decoded Values
// =============================================================================

/// A decoded field value
///
/// Closed union over every kind the wire format can carry. Dispatch on
/// a decoded value is an exhaustive match; there is no dynamic escape
/// hatch.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Integer(i64),
    Unsigned(u64),
    Boolean(bool),
    String(String),
    Binary(Vec<u8>),
    Array(ArrayValue),
}

/// A decoded array value
///
/// Elements live in a typed vector, so a heterogeneous array is
/// unrepresentable after decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayValue {
    Float(Vec<f64>),
    Integer(Vec<i64>),
    Unsigned(Vec<u64>),
    Boolean(Vec<bool>),
    String(Vec<String>),
    Binary(Vec<Vec<u8>>),
}

impl FieldValue {
    /// Get the syntactic kind this value serializes as
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Float(_) => FieldKind::Float,
            Self::Integer(_) => FieldKind::Integer,
            Self::Unsigned(_) => FieldKind::Unsigned,
            Self::Boolean(_) => FieldKind::Boolean,
            Self::String(_) => FieldKind::String,
            Self::Binary(_) => FieldKind::Binary,
            Self::Array(_) => FieldKind::Array,
        }
    }

    /// Append the text form of this value to `out`
    pub(crate) fn encode_into(&self, out: &mut String) {
        match self {
            Self::Float(v) => out.push_str(&v.to_string()),
            Self::Integer(v) => {
                out.push_str(&v.to_string());
                out.push('i');
            }
            Self::Unsigned(v) => {
                out.push_str(&v.to_string());
                out.push('u');
            }
            Self::Boolean(v) => out.push_str(if *v { "true" } else { "false" }),
            Self::String(s) => {
                out.push('"');
                escape::escape_string_value(s, out);
                out.push('"');
            }
            Self::Binary(b) => {
                out.push('"');
                out.push_str(&STANDARD.encode(b));
                out.push_str("\"b");
            }
            Self::Array(a) => a.encode_into(out),
        }
    }

    /// Check that this value can be represented on the wire
    ///
    /// Returns the rejection reason for non-finite floats, empty binary
    /// payloads, and empty arrays; their text forms would not survive a
    /// parse round-trip.
    pub(crate) fn validate(&self) -> std::result::Result<(), String> {
        match self {
            Self::Float(v) if !v.is_finite() => Err("non-finite float value".to_string()),
            Self::Binary(b) if b.is_empty() => Err("empty binary value".to_string()),
            Self::Array(a) => a.validate(),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.encode_into(&mut out);
        f.write_str(&out)
    }
}

impl ArrayValue {
    /// Number of elements
    pub fn len(&self) -> usize {
        match self {
            Self::Float(vs) => vs.len(),
            Self::Integer(vs) => vs.len(),
            Self::Unsigned(vs) => vs.len(),
            Self::Boolean(vs) => vs.len(),
            Self::String(vs) => vs.len(),
            Self::Binary(vs) => vs.len(),
        }
    }

    /// Check if the array has no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the kind shared by every element
    pub fn element_kind(&self) -> FieldKind {
        match self {
            Self::Float(_) => FieldKind::Float,
            Self::Integer(_) => FieldKind::Integer,
            Self::Unsigned(_) => FieldKind::Unsigned,
            Self::Boolean(_) => FieldKind::Boolean,
            Self::String(_) => FieldKind::String,
            Self::Binary(_) => FieldKind::Binary,
        }
    }

    /// Build a typed array from decoded scalar elements
    ///
    /// The first element fixes the kind; any later mismatch is a decode
    /// error naming the field.
    pub(crate) fn from_elements(key: &str, elements: Vec<FieldValue>) -> Result<Self> {
        let Some(first) = elements.first() else {
            return Err(PointError::field_decode(key, "empty array value"));
        };
        let expected = first.kind();
        let mut array = match expected {
            FieldKind::Float => Self::Float(Vec::with_capacity(elements.len())),
            FieldKind::Integer => Self::Integer(Vec::with_capacity(elements.len())),
            FieldKind::Unsigned => Self::Unsigned(Vec::with_capacity(elements.len())),
            FieldKind::Boolean => Self::Boolean(Vec::with_capacity(elements.len())),
            FieldKind::String => Self::String(Vec::with_capacity(elements.len())),
            FieldKind::Binary => Self::Binary(Vec::with_capacity(elements.len())),
            FieldKind::Array => {
                return Err(PointError::field_decode(key, "nested arrays are not supported"));
            }
        };
        for element in elements {
            let got = element.kind();
            match (&mut array, element) {
                (Self::Float(vs), FieldValue::Float(v)) => vs.push(v),
                (Self::Integer(vs), FieldValue::Integer(v)) => vs.push(v),
                (Self::Unsigned(vs), FieldValue::Unsigned(v)) => vs.push(v),
                (Self::Boolean(vs), FieldValue::Boolean(v)) => vs.push(v),
                (Self::String(vs), FieldValue::String(v)) => vs.push(v),
                (Self::Binary(vs), FieldValue::Binary(v)) => vs.push(v),
                _ => {
                    return Err(PointError::field_decode(
                        key,
                        format!("array element type mismatch: expected {expected}, got {got}"),
                    ));
                }
            }
        }
        Ok(array)
    }

    /// Append the text form of this array to `out`
    pub(crate) fn encode_into(&self, out: &mut String) {
        out.push('[');
        match self {
            Self::Float(vs) => encode_elements(out, vs, |v, out| out.push_str(&v.to_string())),
            Self::Integer(vs) => encode_elements(out, vs, |v, out| {
                out.push_str(&v.to_string());
                out.push('i');
            }),
            Self::Unsigned(vs) => encode_elements(out, vs, |v, out| {
                out.push_str(&v.to_string());
                out.push('u');
            }),
            Self::Boolean(vs) => {
                encode_elements(out, vs, |v, out| {
                    out.push_str(if *v { "true" } else { "false" })
                });
            }
            Self::String(vs) => encode_elements(out, vs, |v, out| {
                out.push('"');
                escape::escape_string_value(v, out);
                out.push('"');
            }),
            Self::Binary(vs) => encode_elements(out, vs, |v, out| {
                out.push('"');
                out.push_str(&STANDARD.encode(v));
                out.push_str("\"b");
            }),
        }
        out.push(']');
    }

    pub(crate) fn validate(&self) -> std::result::Result<(), String> {
        if self.is_empty() {
            return Err("empty array value".to_string());
        }
        match self {
            Self::Float(vs) if vs.iter().any(|v| !v.is_finite()) => {
                Err("non-finite float value in array".to_string())
            }
            Self::Binary(vs) if vs.iter().any(|v| v.is_empty()) => {
                Err("empty binary value in array".to_string())
            }
            _ => Ok(()),
        }
    }
}

fn encode_elements<T>(out: &mut String, items: &[T], encode: impl Fn(&T, &mut String)) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        encode(item, out);
    }
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode a raw span into a typed value
///
/// Pure function of the span and its recorded kind; errors name the
/// owning field key.
pub(crate) fn decode_value(key: &str, span: &[u8], kind: FieldKind) -> Result<FieldValue> {
    match kind {
        FieldKind::Float => {
            let body = span_str(key, span)?;
            let v: f64 = body
                .parse()
                .map_err(|_| decode_err(key, format!("invalid float {body:?}")))?;
            Ok(FieldValue::Float(v))
        }
        FieldKind::Integer => {
            let body = span_str(key, span.strip_suffix(b"i").unwrap_or(span))?;
            let v: i64 = body
                .parse()
                .map_err(|_| decode_err(key, format!("integer out of range: {body}")))?;
            Ok(FieldValue::Integer(v))
        }
        FieldKind::Unsigned => {
            let body = span_str(key, span.strip_suffix(b"u").unwrap_or(span))?;
            let v: u64 = body
                .parse()
                .map_err(|_| decode_err(key, format!("unsigned integer out of range: {body}")))?;
            Ok(FieldValue::Unsigned(v))
        }
        FieldKind::Boolean => match span {
            b"t" | b"T" | b"true" => Ok(FieldValue::Boolean(true)),
            b"f" | b"F" | b"false" => Ok(FieldValue::Boolean(false)),
            _ => Err(decode_err(
                key,
                format!("invalid boolean {:?}", String::from_utf8_lossy(span)),
            )),
        },
        FieldKind::String => {
            let close = scan::find_closing_quote(span)
                .ok_or_else(|| decode_err(key, "unterminated string"))?;
            let body = span_str(key, &span[1..close])?;
            Ok(FieldValue::String(escape::unescape_string_value(body)))
        }
        FieldKind::Binary => {
            let close = scan::find_closing_quote(span)
                .ok_or_else(|| decode_err(key, "unterminated string"))?;
            let body = span_str(key, &span[1..close])?;
            if body.is_empty() {
                return Err(decode_err(key, "empty binary value"));
            }
            let bytes = STANDARD
                .decode(body)
                .map_err(|e| decode_err(key, format!("invalid base64: {e}")))?;
            Ok(FieldValue::Binary(bytes))
        }
        FieldKind::Array => decode_array(key, span),
    }
}

/// Decode a bracketed array span
///
/// Elements are split on top-level commas, trimmed, and decoded with
/// the scalar rules; one empty trailing element (a trailing comma) is
/// skipped. Any element failure aborts the whole field's decode.
fn decode_array(key: &str, span: &[u8]) -> Result<FieldValue> {
    let body = &span[1..span.len() - 1];
    if body.trim_ascii().is_empty() {
        return Err(decode_err(key, "empty array value"));
    }

    let mut ranges = scan::split_commas(body);
    if let Some(&(s, e)) = ranges.last() {
        if ranges.len() > 1 && body[s..e].trim_ascii().is_empty() {
            ranges.pop();
        }
    }

    let mut elements = Vec::with_capacity(ranges.len());
    for (s, e) in ranges {
        let elem = body[s..e].trim_ascii();
        if elem.is_empty() {
            return Err(decode_err(key, "empty array element"));
        }
        let kind = FieldKind::classify(elem, 0).map_err(|_| {
            decode_err(
                key,
                format!("invalid array element {:?}", String::from_utf8_lossy(elem)),
            )
        })?;
        if kind == FieldKind::Array {
            return Err(decode_err(key, "nested arrays are not supported"));
        }
        elements.push(decode_value(key, elem, kind)?);
    }

    Ok(FieldValue::Array(ArrayValue::from_elements(key, elements)?))
}

fn span_str<'a>(key: &str, span: &'a [u8]) -> Result<&'a str> {
    std::str::from_utf8(span).map_err(|_| decode_err(key, "invalid UTF-8"))
}

fn decode_err(key: &str, reason: impl Into<String>) -> PointError {
    PointError::field_decode(key, reason)
}

// =============================================================================
// Conversions
// =============================================================================

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        Self::Unsigned(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&[u8]> for FieldValue {
    fn from(v: &[u8]) -> Self {
        Self::Binary(v.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for FieldValue {
    fn from(v: &[u8; N]) -> Self {
        Self::Binary(v.to_vec())
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(v: Vec<u8>) -> Self {
        Self::Binary(v)
    }
}

impl From<Vec<f64>> for FieldValue {
    fn from(v: Vec<f64>) -> Self {
        Self::Array(ArrayValue::Float(v))
    }
}

impl From<Vec<i64>> for FieldValue {
    fn from(v: Vec<i64>) -> Self {
        Self::Array(ArrayValue::Integer(v))
    }
}

impl From<Vec<u64>> for FieldValue {
    fn from(v: Vec<u64>) -> Self {
        Self::Array(ArrayValue::Unsigned(v))
    }
}

impl From<Vec<bool>> for FieldValue {
    fn from(v: Vec<bool>) -> Self {
        Self::Array(ArrayValue::Boolean(v))
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(v: Vec<String>) -> Self {
        Self::Array(ArrayValue::String(v))
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(v: Vec<&str>) -> Self {
        Self::Array(ArrayValue::String(v.into_iter().map(str::to_string).collect()))
    }
}

impl From<Vec<Vec<u8>>> for FieldValue {
    fn from(v: Vec<Vec<u8>>) -> Self {
        Self::Array(ArrayValue::Binary(v))
    }
}

impl From<ArrayValue> for FieldValue {
    fn from(v: ArrayValue) -> Self {
        Self::Array(v)
    }
}
