//! Grammar parser for line-protocol text
//!
//! Assembles a [`Point`] from one line: measurement name, sorted and
//! deduplicated tags, raw field spans with their syntactic kinds, and
//! an optional trailing timestamp scaled by a [`Precision`]. Field
//! values are recorded, not decoded; see [`crate::field`].
//!
//! A line must be valid UTF-8 (checked once up front; every delimiter
//! is ASCII, so span slicing afterwards cannot split a character).
//! Binary payloads travel base64-encoded inside quotes, so the wire
//! format stays textual.

use std::fmt;

use bytes::Bytes;
use tracing::trace;

use crate::error::PointError;
use crate::field::FieldKind;
use crate::point::{Point, RawField, RawValue, Tag};
use crate::{MAX_KEY_LENGTH, Result, escape, scan};

// =============================================================================
// Precision
// =============================================================================

/// Resolution of explicit timestamps on the ingest surface
///
/// Timestamps are stored in nanoseconds; an explicit text timestamp is
/// multiplied up from the source's precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Precision {
    #[default]
    Nanosecond,
    Microsecond,
    Millisecond,
    Second,
}

impl Precision {
    /// Multiplier from this precision to nanoseconds
    #[inline]
    pub const fn multiplier(self) -> i64 {
        match self {
            Self::Nanosecond => 1,
            Self::Microsecond => 1_000,
            Self::Millisecond => 1_000_000,
            Self::Second => 1_000_000_000,
        }
    }

    /// Parse a precision tag as it appears on the ingest surface
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "n" | "ns" => Some(Self::Nanosecond),
            "u" | "us" => Some(Self::Microsecond),
            "ms" => Some(Self::Millisecond),
            "s" => Some(Self::Second),
            _ => None,
        }
    }

    /// Get the canonical tag for this precision
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Nanosecond => "n",
            Self::Microsecond => "u",
            Self::Millisecond => "ms",
            Self::Second => "s",
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Parse a newline-separated batch of points
///
/// Blank lines are skipped. Newlines inside quoted field values do not
/// terminate a point. The first malformed line aborts the batch; its
/// error reports offsets relative to the whole input.
pub fn parse_points(buf: &[u8], default_time: i64, precision: Precision) -> Result<Vec<Point>> {
    let mut points = Vec::new();
    let mut skipped = 0usize;

    let mut pos = 0usize;
    while pos < buf.len() {
        let end = scan::scan_line(buf, pos);
        let line = strip_cr(&buf[pos..end]);
        if line.iter().all(|b| b.is_ascii_whitespace()) {
            skipped += 1;
        } else {
            let point =
                parse_line(line, default_time, precision).map_err(|e| e.offset_by(pos))?;
            points.push(point);
        }
        pos = end + 1;
    }

    if skipped > 0 {
        trace!(skipped, parsed = points.len(), "skipped blank lines in batch");
    }
    Ok(points)
}

/// Parse a single point
///
/// `default_time` is used when the line carries no timestamp. Input
/// bytes are copied into the point at construction; the caller's
/// buffer is not referenced afterwards.
pub fn parse_point(buf: &[u8], default_time: i64, precision: Precision) -> Result<Point> {
    let end = scan::scan_line(buf, 0);
    if buf[end..].iter().any(|b| !b.is_ascii_whitespace()) {
        return Err(PointError::syntax(end, "unexpected trailing content after point"));
    }
    parse_line(strip_cr(&buf[..end]), default_time, precision)
}

fn strip_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn parse_line(line: &[u8], default_time: i64, precision: Precision) -> Result<Point> {
    if line.is_empty() {
        return Err(PointError::syntax(0, "empty point"));
    }
    if let Err(e) = std::str::from_utf8(line) {
        return Err(PointError::syntax(e.valid_up_to(), "invalid UTF-8"));
    }

    let key_end = scan::scan_key_section(line)?;
    if key_end > MAX_KEY_LENGTH {
        return Err(PointError::KeyTooLong {
            length: key_end,
            max: MAX_KEY_LENGTH,
        });
    }
    let (name, tags) = parse_key(&line[..key_end])?;

    let mut fields = Vec::new();
    let mut time = default_time;
    let fields_start = scan::skip_spaces(line, key_end);
    if fields_start < line.len() {
        let fields_end = scan::scan_field_section(line, fields_start)?;
        fields = parse_fields(line, fields_start, fields_end)?;
        let time_start = scan::skip_spaces(line, fields_end);
        if time_start < line.len() {
            time = parse_timestamp(line, time_start, precision)?;
        }
    }

    Ok(Point::from_parts(name, tags, fields, time))
}

/// Parse the measurement/tag section into a name and sorted tags
///
/// Also used by binary unmarshal to re-validate a stored series key.
pub(crate) fn parse_key(section: &[u8]) -> Result<(String, Vec<Tag>)> {
    let name_end = scan::scan_to_unescaped(section, 0, section.len(), b',');
    if name_end == 0 {
        return Err(PointError::syntax(0, "missing measurement name"));
    }
    let name = escape::unescape_measurement(section_str(&section[..name_end], 0)?);

    let mut tags = Vec::new();
    let mut i = name_end;
    while i < section.len() {
        i += 1; // step over the comma
        if i >= section.len() {
            return Err(PointError::syntax(i, "missing tag key"));
        }
        let pair_end = scan::scan_to_unescaped(section, i, section.len(), b',');
        let eq = scan::scan_to_unescaped(section, i, pair_end, b'=');
        if eq == pair_end {
            return Err(PointError::syntax(i, "missing '=' in tag"));
        }
        if eq == i {
            return Err(PointError::syntax(i, "missing tag key"));
        }
        if eq + 1 == pair_end {
            return Err(PointError::syntax(eq + 1, "missing tag value"));
        }
        if scan::scan_to_unescaped(section, eq + 1, pair_end, b'=') != pair_end {
            return Err(PointError::syntax(eq + 1, "unescaped '=' in tag value"));
        }
        let key = escape::unescape_key(section_str(&section[i..eq], i)?);
        let value = escape::unescape_key(section_str(&section[eq + 1..pair_end], eq + 1)?);
        tags.push(Tag { key, value });
        i = pair_end;
    }

    tags.sort_by(|a, b| a.key.cmp(&b.key));
    if let Some(pair) = tags.windows(2).find(|pair| pair[0].key == pair[1].key) {
        return Err(PointError::DuplicateTag {
            key: pair[0].key.clone(),
        });
    }
    Ok((name, tags))
}

/// Parse the field section `line[start..end]` into raw fields
///
/// Records each value's span and syntactic kind without decoding.
/// Also used by binary unmarshal to re-validate a stored field section.
pub(crate) fn parse_fields(line: &[u8], start: usize, end: usize) -> Result<Vec<RawField>> {
    let section = &line[start..end];
    let mut fields: Vec<RawField> = Vec::new();

    for (seg_start, seg_end) in scan::split_commas(section) {
        let abs = start + seg_start;
        let chunk = &section[seg_start..seg_end];
        if chunk.is_empty() {
            return Err(PointError::syntax(abs, "missing field"));
        }
        let eq = scan::scan_to_unescaped(chunk, 0, chunk.len(), b'=');
        if eq == chunk.len() {
            return Err(PointError::syntax(abs, "missing '=' in field"));
        }
        if eq == 0 {
            return Err(PointError::syntax(abs, "missing field key"));
        }
        let key = escape::unescape_key(section_str(&chunk[..eq], abs)?);
        if fields.iter().any(|f| f.key == key) {
            return Err(PointError::DuplicateField { key });
        }

        let span = &chunk[eq + 1..];
        let kind = FieldKind::classify(span, abs + eq + 1)?;
        fields.push(RawField {
            key,
            value: RawValue {
                span: Bytes::copy_from_slice(span),
                kind,
            },
        });
    }
    Ok(fields)
}

fn parse_timestamp(line: &[u8], start: usize, precision: Precision) -> Result<i64> {
    let span = line[start..].trim_ascii_end();
    let token = section_str(span, start)?;

    let digits = span.strip_prefix(b"-").unwrap_or(span);
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return Err(PointError::InvalidTimestamp {
            offset: start,
            token: token.to_string(),
        });
    }

    let ts: i64 = token.parse().map_err(|_| PointError::InvalidTimestamp {
        offset: start,
        token: token.to_string(),
    })?;
    ts.checked_mul(precision.multiplier())
        .ok_or_else(|| PointError::InvalidTimestamp {
            offset: start,
            token: token.to_string(),
        })
}

fn section_str(span: &[u8], offset: usize) -> Result<&str> {
    std::str::from_utf8(span).map_err(|_| PointError::syntax(offset, "invalid UTF-8"))
}
