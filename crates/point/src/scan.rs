//! Tokenizer for the line-protocol text format
//!
//! Walks raw bytes with an explicit finite-state scanner (plain,
//! escape-pending, in-quote, in-quote-escape, plus bracket depth) to
//! locate the unescaped delimiters that separate a line's three
//! top-level sections and their internal tokens. Escaping rules differ
//! by section: in the measurement/tag section a backslash escapes the
//! following byte; inside a double-quoted field value only `\"` and
//! `\\` are escapes and every other byte passes through, including
//! delimiters and newlines.
//!
//! All delimiters are ASCII, so scanning byte-by-byte never splits a
//! UTF-8 character.

use crate::error::PointError;
use crate::Result;

/// Scanner states for the field section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Plain,
    Escape,
    Quoted,
    QuotedEscape,
}

/// Find the end of the line starting at `start`
///
/// Returns the index of the terminating `\n`, or `buf.len()` if the
/// input ends first. Newlines inside a quoted field value do not
/// terminate the line; quotes only become meaningful after the first
/// unescaped space (the start of the field section).
pub(crate) fn scan_line(buf: &[u8], start: usize) -> usize {
    let mut state = State::Plain;
    let mut in_fields = false;

    let mut i = start;
    while i < buf.len() {
        let b = buf[i];
        match state {
            State::Plain => match b {
                b'\\' if i + 1 < buf.len() => state = State::Escape,
                b'\n' => return i,
                b' ' => in_fields = true,
                b'"' if in_fields => state = State::Quoted,
                _ => {}
            },
            State::Escape => state = State::Plain,
            State::Quoted => match b {
                b'\\' => state = State::QuotedEscape,
                b'"' => state = State::Plain,
                _ => {}
            },
            State::QuotedEscape => state = State::Quoted,
        }
        i += 1;
    }
    buf.len()
}

/// Find the end of the measurement/tag section
///
/// Returns the index of the first unescaped space, or `line.len()` for
/// a line with no field section. A backslash escapes any following
/// byte; a backslash with nothing after it is a syntax error.
pub(crate) fn scan_key_section(line: &[u8]) -> Result<usize> {
    let mut i = 0;
    while i < line.len() {
        match line[i] {
            b'\\' => {
                if i + 1 >= line.len() {
                    return Err(PointError::syntax(i, "incomplete escape sequence"));
                }
                i += 2;
            }
            b' ' => return Ok(i),
            _ => i += 1,
        }
    }
    Ok(line.len())
}

/// Find the end of the field section starting at `start`
///
/// Returns the index of the first unescaped space that sits outside
/// quotes and outside brackets, or `line.len()`. Validates on the way
/// that every quote is terminated and every bracket is balanced; the
/// returned errors carry the offset of the opening quote or bracket.
pub(crate) fn scan_field_section(line: &[u8], start: usize) -> Result<usize> {
    let mut state = State::Plain;
    let mut depth = 0usize;
    let mut quote_open = start;
    let mut bracket_open = start;

    let mut i = start;
    while i < line.len() {
        let b = line[i];
        match state {
            State::Plain => match b {
                b'\\' => {
                    if i + 1 >= line.len() {
                        return Err(PointError::syntax(i, "incomplete escape sequence"));
                    }
                    state = State::Escape;
                }
                b'"' => {
                    quote_open = i;
                    state = State::Quoted;
                }
                b'[' => {
                    if depth == 0 {
                        bracket_open = i;
                    }
                    depth += 1;
                }
                b']' => depth = depth.saturating_sub(1),
                b' ' if depth == 0 => return Ok(i),
                _ => {}
            },
            State::Escape => state = State::Plain,
            State::Quoted => match b {
                b'\\' => state = State::QuotedEscape,
                b'"' => state = State::Plain,
                _ => {}
            },
            State::QuotedEscape => state = State::Quoted,
        }
        i += 1;
    }

    if matches!(state, State::Quoted | State::QuotedEscape) {
        return Err(PointError::syntax(quote_open, "unterminated string"));
    }
    if depth > 0 {
        return Err(PointError::syntax(bracket_open, "unbalanced brackets"));
    }
    Ok(line.len())
}

/// Find the first unescaped `delim` in `buf[start..end]`
///
/// Returns `end` if the delimiter does not occur. A backslash escapes
/// the following byte.
pub(crate) fn scan_to_unescaped(buf: &[u8], start: usize, end: usize, delim: u8) -> usize {
    let mut i = start;
    while i < end {
        match buf[i] {
            b'\\' if i + 1 < end => i += 2,
            b if b == delim => return i,
            _ => i += 1,
        }
    }
    end
}

/// Skip over spaces starting at `start`
pub(crate) fn skip_spaces(buf: &[u8], start: usize) -> usize {
    let mut i = start;
    while i < buf.len() && buf[i] == b' ' {
        i += 1;
    }
    i
}

/// Split `buf` on top-level unescaped commas
///
/// Commas inside quotes or brackets do not split; a backslash escapes
/// the following byte outside quotes. Returns `(start, end)` ranges,
/// including empty ones (the caller decides how to treat them).
/// Assumes quotes and brackets were already validated by
/// `scan_field_section`.
pub(crate) fn split_commas(buf: &[u8]) -> Vec<(usize, usize)> {
    let mut parts = Vec::new();
    let mut seg = 0usize;
    let mut depth = 0usize;
    let mut quoted = false;

    let mut i = 0;
    while i < buf.len() {
        let b = buf[i];
        if quoted {
            match b {
                b'\\' if i + 1 < buf.len() => i += 1,
                b'"' => quoted = false,
                _ => {}
            }
        } else {
            match b {
                b'\\' if i + 1 < buf.len() => i += 1,
                b'"' => quoted = true,
                b'[' => depth += 1,
                b']' => depth = depth.saturating_sub(1),
                b',' if depth == 0 => {
                    parts.push((seg, i));
                    seg = i + 1;
                }
                _ => {}
            }
        }
        i += 1;
    }
    parts.push((seg, buf.len()));
    parts
}

/// Find the closing quote of a span starting with `"`
///
/// Returns the index of the closing quote, honoring `\"` and `\\`
/// escapes, or `None` if the quote never closes.
pub(crate) fn find_closing_quote(span: &[u8]) -> Option<usize> {
    let mut i = 1;
    while i < span.len() {
        match span[i] {
            b'\\' if i + 1 < span.len() => i += 2,
            b'"' => return Some(i),
            _ => i += 1,
        }
    }
    None
}
