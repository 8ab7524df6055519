//! Binary marshal/unmarshal for the storage engine
//!
//! # Wire Format Layout
//!
//! Little-endian, length-prefixed sections:
//!
//! ```text
//! [u32 key_len][key bytes][u32 fields_len][fields bytes][i64 time]
//! ```
//!
//! `key` is the escaped series-key text (measurement plus canonically
//! sorted tags) and `fields` is the raw field section text in stored
//! order, so field spans round-trip bit-exactly. Unmarshal re-validates
//! both sections through the same scanners as text parsing; truncated
//! or inconsistent input fails with a corruption error, never a panic
//! or a partially populated point.

use crate::error::PointError;
use crate::point::Point;
use crate::{Result, parse, scan};

impl Point {
    /// Marshal to the storage engine's binary form
    ///
    /// The storage format needs at least one field to anchor a record;
    /// a field-less point fails with [`PointError::MustHaveAField`].
    pub fn marshal_binary(&self) -> Result<Vec<u8>> {
        if self.field_count() == 0 {
            return Err(PointError::MustHaveAField);
        }

        let mut key = String::new();
        self.write_key(&mut key);
        let mut fields = String::new();
        self.write_fields_raw(&mut fields);

        if key.len() > u32::MAX as usize || fields.len() > u32::MAX as usize {
            return Err(PointError::corrupt("point too large to marshal"));
        }

        let mut buf = Vec::with_capacity(4 + key.len() + 4 + fields.len() + 8);
        write_u32(&mut buf, key.len() as u32);
        buf.extend_from_slice(key.as_bytes());
        write_u32(&mut buf, fields.len() as u32);
        buf.extend_from_slice(fields.as_bytes());
        write_i64(&mut buf, self.time());
        Ok(buf)
    }

    /// Unmarshal from the storage engine's binary form
    pub fn unmarshal_binary(buf: &[u8]) -> Result<Self> {
        let key_len = read_u32(buf, 0)? as usize;
        let mut offset = 4usize;
        let key = buf
            .get(offset..offset + key_len)
            .ok_or_else(|| PointError::too_short(offset + key_len, buf.len()))?;
        offset += key_len;

        let fields_len = read_u32(buf, offset)? as usize;
        offset += 4;
        let fields_bytes = buf
            .get(offset..offset + fields_len)
            .ok_or_else(|| PointError::too_short(offset + fields_len, buf.len()))?;
        offset += fields_len;

        let time = read_i64(buf, offset)?;
        offset += 8;
        if offset != buf.len() {
            return Err(PointError::corrupt(format!(
                "{} trailing bytes after point",
                buf.len() - offset
            )));
        }

        if fields_bytes.is_empty() {
            return Err(PointError::corrupt("point has no fields"));
        }

        let (name, tags) = parse::parse_key(key)
            .map_err(|e| PointError::corrupt(format!("invalid series key: {e}")))?;

        let section_end = scan::scan_field_section(fields_bytes, 0)
            .map_err(|e| PointError::corrupt(format!("invalid field section: {e}")))?;
        if section_end != fields_bytes.len() {
            return Err(PointError::corrupt("unexpected space in field section"));
        }
        let fields = parse::parse_fields(fields_bytes, 0, section_end)
            .map_err(|e| PointError::corrupt(format!("invalid field section: {e}")))?;

        Ok(Point::from_parts(name, tags, fields, time))
    }
}

// =============================================================================
// Read/Write Helpers
// =============================================================================

#[inline]
fn write_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

#[inline]
fn write_i64(buf: &mut Vec<u8>, value: i64) {
    buf.extend_from_slice(&value.to_le_bytes());
}

#[inline]
fn read_u32(buf: &[u8], offset: usize) -> Result<u32> {
    if offset + 4 > buf.len() {
        return Err(PointError::too_short(offset + 4, buf.len()));
    }
    Ok(u32::from_le_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ]))
}

#[inline]
fn read_i64(buf: &[u8], offset: usize) -> Result<i64> {
    if offset + 8 > buf.len() {
        return Err(PointError::too_short(offset + 8, buf.len()));
    }
    Ok(i64::from_le_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
        buf[offset + 4],
        buf[offset + 5],
        buf[offset + 6],
        buf[offset + 7],
    ]))
}
