//! # Struct Tags
//!
//! Per-field annotation strings in the conventional `key:"value"` form.
//!
//! ## Syntax
//! ```text
//! ezg:"no-preload" db:"author_id"
//! ───┬─────────────  ───┬────────
//!    │                  └── second pair, separated by spaces
//!    └── key, colon, double-quoted value (backslash escapes allowed)
//! ```
//!
//! Parsing is lenient: a malformed pair ends the scan and the lookup reports
//! "not found". Tags never produce errors.

use std::fmt;

use serde::Serialize;

/// Raw tag text attached to a field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StructTag(String);

impl StructTag {
    pub fn new(raw: impl Into<String>) -> Self {
        StructTag(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the value for `key`, or `None` when the key is absent or the
    /// tag is malformed before reaching it.
    ///
    /// ## Example
    /// ```rust
    /// use ezrepo_core::StructTag;
    ///
    /// let tag = StructTag::new(r#"ezg:"no-preload" db:"posts""#);
    /// assert_eq!(tag.lookup("ezg"), Some("no-preload".to_string()));
    /// assert_eq!(tag.lookup("db"), Some("posts".to_string()));
    /// assert_eq!(tag.lookup("json"), None);
    /// ```
    pub fn lookup(&self, key: &str) -> Option<String> {
        let mut rest = self.0.as_bytes();

        while !rest.is_empty() {
            let skip = rest.iter().take_while(|&&b| b == b' ').count();
            rest = &rest[skip..];
            if rest.is_empty() {
                break;
            }

            let name_len = rest
                .iter()
                .take_while(|&&b| b > b' ' && b != b':' && b != b'"' && b != 0x7f)
                .count();
            if name_len == 0
                || name_len + 1 >= rest.len()
                || rest[name_len] != b':'
                || rest[name_len + 1] != b'"'
            {
                break;
            }
            let name = &rest[..name_len];
            rest = &rest[name_len + 1..];

            // Find the closing quote, stepping over escaped characters.
            let mut i = 1;
            while i < rest.len() && rest[i] != b'"' {
                if rest[i] == b'\\' {
                    i += 1;
                }
                i += 1;
            }
            if i >= rest.len() {
                break;
            }
            let quoted = &rest[..=i];
            rest = &rest[i + 1..];

            if name == key.as_bytes() {
                return unquote(quoted);
            }
        }

        None
    }
}

impl fmt::Display for StructTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StructTag {
    fn from(raw: &str) -> Self {
        StructTag::new(raw)
    }
}

/// Strips the surrounding quotes and resolves backslash escapes.
///
/// Accepts the escapes of a double-quoted Go string literal: `\a \b \f \n
/// \r \t \v \\ \"`, `\xhh`, three-digit octal `\ooo`, `\uhhhh` and
/// `\Uhhhhhhhh`. Anything else, or a result that is not UTF-8, is rejected.
fn unquote(quoted: &[u8]) -> Option<String> {
    let inner = quoted.strip_prefix(b"\"")?.strip_suffix(b"\"")?;

    let mut out: Vec<u8> = Vec::with_capacity(inner.len());
    let mut i = 0;
    while i < inner.len() {
        match inner[i] {
            b'"' | b'\n' => return None,
            b'\\' => {}
            byte => {
                out.push(byte);
                i += 1;
                continue;
            }
        }

        let escape = *inner.get(i + 1)?;
        i += 2;
        match escape {
            b'a' => out.push(0x07),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0c),
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'v' => out.push(0x0b),
            b'\\' => out.push(b'\\'),
            b'"' => out.push(b'"'),
            b'x' => {
                let value = parse_digits(inner.get(i..i + 2)?, 16)?;
                out.push(u8::try_from(value).ok()?);
                i += 2;
            }
            b'u' | b'U' => {
                let len = if escape == b'u' { 4 } else { 8 };
                let value = parse_digits(inner.get(i..i + len)?, 16)?;
                let c = char::from_u32(value)?;
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                i += len;
            }
            b'0'..=b'7' => {
                let value = parse_digits(inner.get(i - 1..i + 2)?, 8)?;
                out.push(u8::try_from(value).ok()?);
                i += 2;
            }
            _ => return None,
        }
    }
    String::from_utf8(out).ok()
}

fn parse_digits(digits: &[u8], radix: u32) -> Option<u32> {
    digits.iter().try_fold(0u32, |acc, &d| {
        let digit = char::from(d).to_digit(radix)?;
        Some(acc * radix + digit)
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
