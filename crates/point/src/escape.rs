//! Escaping rules for the line-protocol text form
//!
//! Each section of a line has its own escapable set:
//!
//! - measurement: `,` and space
//! - tag keys, tag values, field keys: `,`, `=`, and space
//! - quoted string bodies: `"` and `\`
//!
//! A backslash before a character outside the section's set is passed
//! through unchanged, so unescape(escape(x)) == x and foreign escape
//! sequences survive a round-trip.

/// Escapable characters in a measurement name
const MEASUREMENT: &[char] = &[',', ' '];

/// Escapable characters in tag keys, tag values, and field keys
const KEY: &[char] = &[',', '=', ' '];

/// Escapable characters inside a double-quoted string value
const STRING_VALUE: &[char] = &['"', '\\'];

fn escape_with(raw: &str, escapable: &[char], out: &mut String) {
    for c in raw.chars() {
        if escapable.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
}

fn unescape_with(raw: &str, escapable: &[char]) -> String {
    if !raw.contains('\\') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.clone().next() {
                Some(next) if escapable.contains(&next) => {
                    out.push(next);
                    chars.next();
                }
                _ => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Escape a measurement name into `out`
pub(crate) fn escape_measurement(raw: &str, out: &mut String) {
    escape_with(raw, MEASUREMENT, out);
}

/// Unescape a measurement name span
pub(crate) fn unescape_measurement(raw: &str) -> String {
    unescape_with(raw, MEASUREMENT)
}

/// Escape a tag key, tag value, or field key into `out`
pub(crate) fn escape_key(raw: &str, out: &mut String) {
    escape_with(raw, KEY, out);
}

/// Unescape a tag key, tag value, or field key span
pub(crate) fn unescape_key(raw: &str) -> String {
    unescape_with(raw, KEY)
}

/// Escape a string field body into `out` (quotes not included)
pub(crate) fn escape_string_value(raw: &str, out: &mut String) {
    escape_with(raw, STRING_VALUE, out);
}

/// Unescape a string field body (quotes already stripped)
pub(crate) fn unescape_string_value(raw: &str) -> String {
    unescape_with(raw, STRING_VALUE)
}
