//! Quoting and escaping for settings file keys and values.
//!
//! Text that would not survive a plain `key=value` line is wrapped in double
//! quotes, with C-style escapes inside. Unquoted text is taken literally.
//!
//! Inside quotes the following escapes are understood:
//!
//! | Escape | Byte |
//! |--------|------|
//! | `\n` `\r` `\t` | newline, carriage return, tab |
//! | `\b` `\v` `\a` `\f` | backspace, vertical tab, bell, form feed |
//! | `\\` `\"` `\'` | the character itself |
//! | `\xH`, `\xHH` | one or two hex digits |
//! | `\N`, `\NN`, `\NNN` | one to three octal digits |
//!
//! Any other escaped character is kept with the backslash dropped.

use std::borrow::Cow;

/// Returns true if `text` must be quoted to survive a round trip.
pub fn needs_quoting(text: &str) -> bool {
    text.starts_with(' ')
        || text.ends_with(' ')
        || text
            .bytes()
            .any(|b| b < 0x20 || b >= 0x7F || matches!(b, b'"' | b'\'' | b'\\'))
}

/// Returns true if a key must be quoted.
///
/// Keys additionally cannot contain `=` or start with a character that the
/// parser treats as a section header or comment.
pub fn key_needs_quoting(key: &str) -> bool {
    key.is_empty()
        || needs_quoting(key)
        || key.contains('=')
        || key.starts_with(['[', '#', ';'])
}

/// Escapes a value, quoting it only when necessary.
pub fn escape(text: &str) -> Cow<'_, str> {
    if needs_quoting(text) {
        Cow::Owned(quote(text))
    } else {
        Cow::Borrowed(text)
    }
}

/// Escapes a key, quoting it only when necessary.
pub fn escape_key(key: &str) -> Cow<'_, str> {
    if key_needs_quoting(key) {
        Cow::Owned(quote(key))
    } else {
        Cow::Borrowed(key)
    }
}

fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    out.push('"');
    for b in text.bytes() {
        match b {
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x08 => out.push_str("\\b"),
            0x0B => out.push_str("\\v"),
            0x07 => out.push_str("\\a"),
            0x0C => out.push_str("\\f"),
            b'\\' => out.push_str("\\\\"),
            b'"' => out.push_str("\\\""),
            b'\'' => out.push_str("\\'"),
            0x20..=0x7E => out.push(char::from(b)),
            _ => out.push_str(&format!("\\x{b:02x}")),
        }
    }
    out.push('"');
    out
}

/// Reverses [`escape`].
///
/// Text not starting with a double quote is returned unchanged. Quoted text
/// ends at the first unescaped closing quote; anything after it is ignored.
pub fn unescape(text: &str) -> Cow<'_, str> {
    let Some(body) = text.strip_prefix('"') else {
        return Cow::Borrowed(text);
    };
    let bytes = body.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        i += 1;
        match b {
            b'"' => break,
            b'\\' => {
                let Some(&c) = bytes.get(i) else {
                    break;
                };
                i += 1;
                match c {
                    b'n' => out.push(b'\n'),
                    b'r' => out.push(b'\r'),
                    b't' => out.push(b'\t'),
                    b'b' => out.push(0x08),
                    b'v' => out.push(0x0B),
                    b'a' => out.push(0x07),
                    b'f' => out.push(0x0C),
                    b'x' => {
                        let (value, used) = scan_digits(&bytes[i..], 2, 16);
                        if used == 0 {
                            out.push(b'x');
                        } else {
                            out.push(value as u8);
                            i += used;
                        }
                    }
                    b'0'..=b'7' => {
                        let (value, used) = scan_digits(&bytes[i - 1..], 3, 8);
                        out.push((value & 0xFF) as u8);
                        i += used - 1;
                    }
                    // Covers \\ \" \' and unknown escapes alike.
                    other => out.push(other),
                }
            }
            other => out.push(other),
        }
    }
    match String::from_utf8(out) {
        Ok(s) => Cow::Owned(s),
        Err(err) => Cow::Owned(String::from_utf8_lossy(err.as_bytes()).into_owned()),
    }
}

/// Reads up to `max` digits in `radix`, returning the value and digit count.
fn scan_digits(bytes: &[u8], max: usize, radix: u32) -> (u32, usize) {
    bytes
        .iter()
        .take(max)
        .map_while(|&b| char::from(b).to_digit(radix))
        .fold((0, 0), |(value, used), d| (value * radix + d, used + 1))
}
