//! Sectioned key-value settings and their text file format.
//!
//! [`Settings`] holds `[section] / key=value` data. Values are stored as text
//! and converted on access by the typed readers and writers. Every entry
//! carries a mark: entries written at runtime, or loaded from a file parsed
//! with `mark = true`, are marked, and only marked entries are written back
//! out by [`Settings::unparse`].
//!
//! # File Format
//!
//! ```text
//! # comment
//! [Section Name]
//! key=value
//! key2="quoted value with \n newline and \"escaped quote\""
//! ```
//!
//! Malformed lines are logged and skipped; parsing never fails as a whole.
//!
//! # Example
//!
//! ```
//! use horizon_lattice_registry::Settings;
//!
//! let mut settings = Settings::new();
//! settings.parse_str("[Window]\nwidth=1024\n", false);
//! assert_eq!(settings.read_int("Window", "width", 800), 1024);
//!
//! settings.write_bool("Window", "maximized", true);
//! assert!(settings.is_modified());
//! assert_eq!(settings.unparse(), "[Window]\nmaximized=true\n");
//! ```

use std::fmt;
use std::io::{Read, Write};
use std::path::Path;

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::atomic::atomic_write;
use crate::color::Color;
use crate::dict::{Dict, ValuePolicy};
use crate::error::{RegistryError, RegistryResult};
use crate::escape::{escape, escape_key, unescape};
use crate::section::Section;

/// Creates an empty [`Section`] for every new section name.
#[derive(Debug)]
pub struct SectionPolicy;

impl ValuePolicy for SectionPolicy {
    type Input = ();
    type Stored = Section;

    fn create(_input: &()) -> Section {
        Section::new()
    }
}

/// A collection of named sections of string entries.
#[derive(Default)]
pub struct Settings {
    sections: Dict<SectionPolicy>,
    modified: bool,
}

impl Settings {
    /// Creates an empty settings store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if any entry was written or deleted since the flag was
    /// last cleared.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Sets or clears the modified flag.
    pub fn set_modified(&mut self, modified: bool) {
        self.modified = modified;
    }

    // ========================================================================
    // Sections
    // ========================================================================

    /// Returns the named section.
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.find(name)
    }

    /// Iterates over `(name, section)` pairs.
    pub fn sections(&self) -> impl Iterator<Item = (&str, &Section)> {
        self.sections.iter().map(|(name, section, _)| (name, section))
    }

    /// Returns the number of sections.
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Returns true if the named section exists.
    pub fn exists_section(&self, section: &str) -> bool {
        self.sections.contains(section)
    }

    /// Deletes a whole section.
    pub fn delete_section(&mut self, section: &str) -> bool {
        let removed = self.sections.remove(section);
        if removed {
            self.modified = true;
        }
        removed
    }

    /// Removes all sections.
    pub fn clear(&mut self) {
        self.sections.clear();
        self.modified = true;
    }

    // ========================================================================
    // Raw entries
    // ========================================================================

    /// Returns true if `key` exists in `section`.
    pub fn exists_entry(&self, section: &str, key: &str) -> bool {
        self.section(section).is_some_and(|s| s.contains(key))
    }

    /// Deletes an entry.
    pub fn delete_entry(&mut self, section: &str, key: &str) -> bool {
        let removed = self
            .sections
            .find_mut(section)
            .is_some_and(|s| s.remove(key));
        if removed {
            self.modified = true;
        }
        removed
    }

    /// Returns the raw text of an entry.
    pub fn read_string(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section)?.get(key)
    }

    /// Returns the raw text of an entry, or `default`.
    pub fn read_string_or<'a>(&'a self, section: &str, key: &str, default: &'a str) -> &'a str {
        self.read_string(section, key).unwrap_or(default)
    }

    /// Writes the raw text of an entry and marks it.
    ///
    /// Section headers are written unescaped, so a section name containing
    /// `]` or a control character could not be read back. Such names are
    /// refused and nothing is written.
    pub fn write_string(&mut self, section: &str, key: &str, value: &str) -> bool {
        if !is_section_name(section) {
            warn!(
                target: "horizon_lattice_registry::settings",
                section,
                "section name cannot be written as a header, entry refused"
            );
            return false;
        }
        let written = self
            .sections
            .insert(section, &(), false)
            .and_then(|s| s.replace(key, value, true))
            .is_some();
        if written {
            self.modified = true;
        }
        written
    }

    /// Writes a formatted entry.
    ///
    /// ```
    /// # use horizon_lattice_registry::Settings;
    /// let mut settings = Settings::new();
    /// settings.write_entry_fmt("Window", "geometry", format_args!("{}x{}", 800, 600));
    /// assert_eq!(settings.read_string("Window", "geometry"), Some("800x600"));
    /// ```
    pub fn write_entry_fmt(&mut self, section: &str, key: &str, args: fmt::Arguments<'_>) -> bool {
        self.write_string(section, key, &args.to_string())
    }

    // ========================================================================
    // Typed entries
    // ========================================================================

    /// Reads a signed integer entry.
    pub fn read_int(&self, section: &str, key: &str, default: i32) -> i32 {
        self.read_string(section, key)
            .and_then(|v| scan_signed(v))
            .and_then(|v| i32::try_from(v).ok())
            .unwrap_or(default)
    }

    /// Reads an unsigned integer entry.
    pub fn read_uint(&self, section: &str, key: &str, default: u32) -> u32 {
        self.read_string(section, key)
            .and_then(|v| scan_unsigned(v))
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(default)
    }

    /// Reads a signed 64-bit integer entry.
    pub fn read_long(&self, section: &str, key: &str, default: i64) -> i64 {
        self.read_string(section, key)
            .and_then(|v| scan_signed(v))
            .unwrap_or(default)
    }

    /// Reads an unsigned 64-bit integer entry.
    ///
    /// Only hexadecimal text with a `0x` or `0X` prefix is accepted; plain
    /// decimal yields `default`. [`write_ulong`](Self::write_ulong) always
    /// writes the hexadecimal form.
    pub fn read_ulong(&self, section: &str, key: &str, default: u64) -> u64 {
        self.read_string(section, key)
            .and_then(|v| scan_hex(v))
            .unwrap_or(default)
    }

    /// Reads a floating point entry.
    pub fn read_real(&self, section: &str, key: &str, default: f64) -> f64 {
        self.read_string(section, key)
            .and_then(|v| scan_real(v))
            .unwrap_or(default)
    }

    /// Reads a color entry, given as a hex specification or color name.
    pub fn read_color(&self, section: &str, key: &str, default: Color) -> Color {
        self.read_string(section, key)
            .and_then(Color::parse)
            .unwrap_or(default)
    }

    /// Reads a boolean entry.
    ///
    /// `true`, `yes`, `on` and `1` are true; `false`, `no`, `off` and `0` are
    /// false, all case-insensitively. Anything else yields `default`.
    pub fn read_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.read_string(section, key)
            .and_then(parse_bool)
            .unwrap_or(default)
    }

    /// Writes a signed integer entry.
    pub fn write_int(&mut self, section: &str, key: &str, value: i32) -> bool {
        self.write_string(section, key, &value.to_string())
    }

    /// Writes an unsigned integer entry.
    pub fn write_uint(&mut self, section: &str, key: &str, value: u32) -> bool {
        self.write_string(section, key, &value.to_string())
    }

    /// Writes a signed 64-bit integer entry.
    pub fn write_long(&mut self, section: &str, key: &str, value: i64) -> bool {
        self.write_string(section, key, &value.to_string())
    }

    /// Writes an unsigned 64-bit integer entry in `0x` hexadecimal form.
    pub fn write_ulong(&mut self, section: &str, key: &str, value: u64) -> bool {
        self.write_string(section, key, &format!("{value:#x}"))
    }

    /// Writes a floating point entry.
    pub fn write_real(&mut self, section: &str, key: &str, value: f64) -> bool {
        self.write_string(section, key, &value.to_string())
    }

    /// Writes a color entry, by name where one exists.
    pub fn write_color(&mut self, section: &str, key: &str, value: Color) -> bool {
        self.write_string(section, key, &value.to_string())
    }

    /// Writes a boolean entry as `true` or `false`.
    pub fn write_bool(&mut self, section: &str, key: &str, value: bool) -> bool {
        self.write_string(section, key, if value { "true" } else { "false" })
    }

    // ========================================================================
    // Text format
    // ========================================================================

    /// Loads entries from a settings file.
    ///
    /// Every loaded entry gets the given mark and goes through the mark
    /// precedence rules of [`Dict::replace`]. A missing or unreadable file is
    /// an error; malformed lines are not.
    pub fn parse_file(&mut self, path: impl AsRef<Path>, mark: bool) -> RegistryResult<()> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| RegistryError::io(path, e))?;
        let text = String::from_utf8_lossy(&bytes);
        debug!(
            target: "horizon_lattice_registry::settings",
            path = %path.display(),
            mark,
            "parsing settings file"
        );
        self.parse_source(&text, mark, &path.display().to_string());
        Ok(())
    }

    /// Loads entries from settings text.
    pub fn parse_str(&mut self, text: &str, mark: bool) {
        self.parse_source(text, mark, "<string>");
    }

    fn parse_source(&mut self, text: &str, mark: bool, source: &str) {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut current: Option<String> = None;

        for (index, raw) in text.lines().enumerate() {
            let lineno = index + 1;
            let line = raw.trim_start_matches([' ', '\t']);
            if line.is_empty() || line.starts_with(['#', ';']) {
                continue;
            }

            if let Some(header) = line.strip_prefix('[') {
                match header.find(|c: char| c == ']' || c.is_ascii_control()) {
                    Some(end) if header[end..].starts_with(']') => {
                        let name = &header[..end];
                        self.sections.insert(name, &(), false);
                        current = Some(name.to_owned());
                    }
                    _ => {
                        warn!(
                            target: "horizon_lattice_registry::settings",
                            source,
                            line = lineno,
                            "unterminated section header, line skipped"
                        );
                    }
                }
                continue;
            }

            let Some(section) = current.as_deref() else {
                warn!(
                    target: "horizon_lattice_registry::settings",
                    source,
                    line = lineno,
                    "entry outside of any section, line skipped"
                );
                continue;
            };

            let Some((key, value)) = split_entry(line) else {
                warn!(
                    target: "horizon_lattice_registry::settings",
                    source,
                    line = lineno,
                    "expected key=value, line skipped"
                );
                continue;
            };

            if let Some(group) = self.sections.insert(section, &(), false) {
                group.replace(&key, &value, mark);
            }
        }
    }

    /// Renders all marked entries as settings text.
    ///
    /// Sections and keys are emitted in sorted order. Sections without any
    /// marked entry are left out entirely.
    pub fn unparse(&self) -> String {
        let mut sections: Vec<(&str, &Section)> = self
            .sections()
            .filter(|(_, section)| section.marked_count() > 0)
            .collect();
        sections.sort_by(|a, b| a.0.cmp(b.0));

        let mut out = String::new();
        for (i, (name, section)) in sections.into_iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push('[');
            out.push_str(name);
            out.push_str("]\n");

            let mut entries: Vec<(&str, &String)> = section
                .iter()
                .filter(|(_, _, mark)| *mark)
                .map(|(key, value, _)| (key, value))
                .collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            for (key, value) in entries {
                out.push_str(&escape_key(key));
                out.push('=');
                out.push_str(&escape(value));
                out.push('\n');
            }
        }
        out
    }

    /// Atomically writes all marked entries to `path`.
    pub fn unparse_file(&self, path: impl AsRef<Path>) -> RegistryResult<()> {
        let path = path.as_ref();
        atomic_write(path, self.unparse().as_bytes())?;
        debug!(
            target: "horizon_lattice_registry::settings",
            path = %path.display(),
            "wrote settings file"
        );
        Ok(())
    }

    // ========================================================================
    // Binary stream
    // ========================================================================

    /// Writes every section, entry and mark to a binary stream.
    pub fn save_to<W: Write>(&self, writer: W) -> RegistryResult<()> {
        bincode::serialize_into(writer, self)?;
        Ok(())
    }

    /// Reads settings previously written by [`save_to`](Self::save_to).
    pub fn load_from<R: Read>(reader: R) -> RegistryResult<Self> {
        Ok(bincode::deserialize_from(reader)?)
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("sections", &self.sections)
            .field("modified", &self.modified)
            .finish()
    }
}

#[derive(Serialize, Deserialize)]
struct EntryRecord {
    key: String,
    value: String,
    mark: bool,
}

#[derive(Serialize, Deserialize)]
struct SectionRecord {
    name: String,
    entries: Vec<EntryRecord>,
}

impl Serialize for Settings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let records: Vec<SectionRecord> = self
            .sections()
            .map(|(name, section)| SectionRecord {
                name: name.to_owned(),
                entries: section
                    .iter()
                    .map(|(key, value, mark)| EntryRecord {
                        key: key.to_owned(),
                        value: value.clone(),
                        mark,
                    })
                    .collect(),
            })
            .collect();
        records.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Settings {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let records = Vec::<SectionRecord>::deserialize(deserializer)?;
        let mut settings = Settings::new();
        for record in records {
            if let Some(section) = settings.sections.insert(&record.name, &(), false) {
                for entry in record.entries {
                    section.replace(&entry.key, &entry.value, entry.mark);
                }
            }
        }
        Ok(settings)
    }
}

// ============================================================================
// Line and value scanning
// ============================================================================

/// Splits an entry line into its unescaped key and value.
fn split_entry(line: &str) -> Option<(String, String)> {
    let (raw_key, rest) = if line.starts_with('"') {
        let close = closing_quote(line)?;
        let rest = line[close + 1..].trim_start_matches([' ', '\t']);
        (&line[..=close], rest.strip_prefix('=')?)
    } else {
        let end = line.find(|c: char| c == '=' || is_line_break(c))?;
        if !line[end..].starts_with('=') {
            return None;
        }
        (line[..end].trim_end_matches([' ', '\t']), &line[end + 1..])
    };

    let key = unescape(raw_key);
    if key.is_empty() {
        return None;
    }

    let rest = rest.trim_start_matches([' ', '\t']);
    let end = rest.find(is_line_break).unwrap_or(rest.len());
    let raw_value = rest[..end].trim_end_matches([' ', '\t']);
    Some((key.into_owned(), unescape(raw_value).into_owned()))
}

/// Control characters other than tab end a key or value.
///
/// Raw tabs stay part of an unquoted value; the writer always quotes values
/// containing tabs, so its own output is unaffected.
fn is_line_break(c: char) -> bool {
    c.is_ascii_control() && c != '\t'
}

/// Returns true if `name` survives a round trip through a `[name]` header.
fn is_section_name(name: &str) -> bool {
    !name.contains(|c: char| c == ']' || c.is_ascii_control())
}

/// Finds the byte index of the quote closing a quoted string at `text[0]`.
fn closing_quote(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Some(i),
            _ => i += 1,
        }
    }
    None
}

/// Returns the leading run of `text` made of an optional sign and digits.
fn integer_prefix(text: &str, signed: bool) -> &str {
    let bytes = text.as_bytes();
    let mut end = 0;
    if bytes.first().is_some_and(|&b| b == b'+' || (signed && b == b'-')) {
        end = 1;
    }
    let digits = bytes[end..].iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return "";
    }
    &text[..end + digits]
}

fn scan_signed(text: &str) -> Option<i64> {
    integer_prefix(text.trim_start(), true).parse().ok()
}

fn scan_unsigned(text: &str) -> Option<u64> {
    integer_prefix(text.trim_start(), false).parse().ok()
}

fn scan_hex(text: &str) -> Option<u64> {
    let text = text.trim_start();
    let hex = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X"))?;
    let digits = hex.bytes().take_while(u8::is_ascii_hexdigit).count();
    u64::from_str_radix(&hex[..digits], 16).ok()
}

fn scan_real(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let digits_from = |start: usize| bytes[start..].iter().take_while(|b| b.is_ascii_digit()).count();

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    if let Some(value) = scan_non_finite(&text[end..]) {
        return Some(if bytes[0] == b'-' { -value } else { value });
    }
    let mut mantissa = digits_from(end);
    end += mantissa;
    if bytes.get(end) == Some(&b'.') {
        let fraction = digits_from(end + 1);
        mantissa += fraction;
        end += 1 + fraction;
    }
    if mantissa == 0 {
        return None;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
        let exponent = digits_from(end + 1 + sign);
        if exponent > 0 {
            end += 1 + sign + exponent;
        }
    }
    text[..end].parse().ok()
}

/// Accepts `inf`, `infinity` and `nan` in any case, as scanf does.
fn scan_non_finite(text: &str) -> Option<f64> {
    let starts_with = |word: &str| {
        text.get(..word.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(word))
    };
    if starts_with("inf") {
        Some(f64::INFINITY)
    } else if starts_with("nan") {
        Some(f64::NAN)
    } else {
        None
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    let text = text.trim();
    if ["true", "yes", "on", "1"].iter().any(|t| text.eq_ignore_ascii_case(t)) {
        Some(true)
    } else if ["false", "no", "off", "0"].iter().any(|t| text.eq_ignore_ascii_case(t)) {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_round_trip() {
        let mut settings = Settings::new();
        settings.write_int("S", "int", -42);
        settings.write_uint("S", "uint", 4_000_000_000);
        settings.write_long("S", "long", -9_000_000_000);
        settings.write_ulong("S", "ulong", u64::MAX);
        settings.write_real("S", "real", 0.1);
        settings.write_bool("S", "bool", true);
        settings.write_color("S", "color", Color::rgb(1, 2, 3));

        assert_eq!(settings.read_int("S", "int", 0), -42);
        assert_eq!(settings.read_uint("S", "uint", 0), 4_000_000_000);
        assert_eq!(settings.read_long("S", "long", 0), -9_000_000_000);
        assert_eq!(settings.read_ulong("S", "ulong", 0), u64::MAX);
        assert_eq!(settings.read_real("S", "real", 0.0), 0.1);
        assert!(settings.read_bool("S", "bool", false));
        assert_eq!(settings.read_color("S", "color", Color::TRANSPARENT), Color::rgb(1, 2, 3));
    }

    #[test]
    fn test_scanf_like_parsing() {
        let mut settings = Settings::new();
        settings.parse_str(
            "[S]\nint=  12px\nneg=-7\nbad=abc\nbig=99999999999\nreal=2.5e3x\nexp=1e\n",
            false,
        );
        assert_eq!(settings.read_int("S", "int", 0), 12);
        assert_eq!(settings.read_int("S", "neg", 0), -7);
        assert_eq!(settings.read_int("S", "bad", 5), 5);
        assert_eq!(settings.read_int("S", "big", 5), 5);
        assert_eq!(settings.read_long("S", "big", 5), 99_999_999_999);
        assert_eq!(settings.read_uint("S", "neg", 3), 3);
        assert_eq!(settings.read_real("S", "real", 0.0), 2500.0);
        assert_eq!(settings.read_real("S", "exp", 0.0), 1.0);
    }

    #[test]
    fn test_non_finite_reals_round_trip() {
        let mut settings = Settings::new();
        settings.write_real("S", "inf", f64::INFINITY);
        settings.write_real("S", "ninf", f64::NEG_INFINITY);
        settings.write_real("S", "nan", f64::NAN);

        assert_eq!(settings.read_real("S", "inf", 7.0), f64::INFINITY);
        assert_eq!(settings.read_real("S", "ninf", 7.0), f64::NEG_INFINITY);
        assert!(settings.read_real("S", "nan", 7.0).is_nan());

        settings.parse_str("[T]\na=  +Infinity\nb=-INF\nc=nan(0x1)\nd=in\n", false);
        assert_eq!(settings.read_real("T", "a", 0.0), f64::INFINITY);
        assert_eq!(settings.read_real("T", "b", 0.0), f64::NEG_INFINITY);
        assert!(settings.read_real("T", "c", 0.0).is_nan());
        assert_eq!(settings.read_real("T", "d", 7.0), 7.0);
    }

    #[test]
    fn test_raw_tabs_stay_in_unquoted_values() {
        let mut settings = Settings::new();
        settings.parse_str("[S]\nk =\tone\ttwo\t\r\n", false);
        assert_eq!(settings.read_string("S", "k"), Some("one\ttwo"));
    }

    #[test]
    fn test_unwritable_section_names_are_refused() {
        let mut settings = Settings::new();
        assert!(!settings.write_string("a]b", "k", "v"));
        assert!(!settings.write_int("x\ny", "k", 1));
        assert!(!settings.is_modified());
        assert_eq!(settings.section_count(), 0);

        assert!(settings.write_string("a b", "k", "v"));
        let mut loaded = Settings::new();
        loaded.parse_str(&settings.unparse(), true);
        assert_eq!(loaded.read_string("a b", "k"), Some("v"));
    }

    #[test]
    fn test_ulong_requires_hex_prefix() {
        let mut settings = Settings::new();
        settings.parse_str("[S]\ndec=1234\nhex=0x4D2\nupper=0XfF\n", false);
        assert_eq!(settings.read_ulong("S", "dec", 7), 7);
        assert_eq!(settings.read_ulong("S", "hex", 7), 1234);
        assert_eq!(settings.read_ulong("S", "upper", 7), 255);
        assert_eq!(settings.read_uint("S", "dec", 7), 1234);
    }

    #[test]
    fn test_bool_spellings() {
        let mut settings = Settings::new();
        settings.parse_str("[B]\na=YES\nb=On\nc=1\nd=no\ne=OFF\nf=0\ng=maybe\n", false);
        assert!(settings.read_bool("B", "a", false));
        assert!(settings.read_bool("B", "b", false));
        assert!(settings.read_bool("B", "c", false));
        assert!(!settings.read_bool("B", "d", true));
        assert!(!settings.read_bool("B", "e", true));
        assert!(!settings.read_bool("B", "f", true));
        assert!(settings.read_bool("B", "g", true));
        assert!(!settings.read_bool("B", "missing", false));
    }

    #[test]
    fn test_parser_skips_malformed_lines() {
        let mut settings = Settings::new();
        settings.parse_str(
            "orphan=1\n[Broken\n[Good]\n# comment\n; other comment\nnoequals\n  key  =  value  \n=empty key\n",
            false,
        );
        assert!(!settings.exists_section("Broken"));
        assert_eq!(settings.read_string("Good", "key"), Some("value"));
        assert_eq!(settings.section("Good").map(|s| s.len()), Some(1));
        assert!(!settings.is_modified());
    }

    #[test]
    fn test_bom_and_crlf() {
        let mut settings = Settings::new();
        settings.parse_str("\u{feff}[Win]\r\nwidth=640\r\n", false);
        assert_eq!(settings.read_int("Win", "width", 0), 640);
    }

    #[test]
    fn test_quoted_keys_and_values() {
        let mut settings = Settings::new();
        settings.write_string("Q", "a=b", "  padded\ttext  ");
        let text = settings.unparse();
        assert_eq!(text, "[Q]\n\"a=b\"=\"  padded\\ttext  \"\n");

        let mut loaded = Settings::new();
        loaded.parse_str(&text, true);
        assert_eq!(loaded.read_string("Q", "a=b"), Some("  padded\ttext  "));
    }

    #[test]
    fn test_unparse_only_marked() {
        let mut settings = Settings::new();
        settings.parse_str("[Defaults]\na=1\nb=2\n[Mixed]\nx=1\n", false);
        assert_eq!(settings.unparse(), "");

        settings.write_int("Mixed", "y", 2);
        assert_eq!(settings.unparse(), "[Mixed]\ny=2\n");
    }

    #[test]
    fn test_parse_marks_follow_precedence() {
        let mut settings = Settings::new();
        settings.parse_str("[S]\nk=user\n", true);
        settings.parse_str("[S]\nk=system\n", false);
        assert_eq!(settings.read_string("S", "k"), Some("user"));
        settings.parse_str("[S]\nk=newer\n", true);
        assert_eq!(settings.read_string("S", "k"), Some("newer"));
    }

    #[test]
    fn test_delete_and_clear_set_modified() {
        let mut settings = Settings::new();
        settings.parse_str("[S]\nk=v\n", false);
        assert!(!settings.is_modified());
        assert!(!settings.delete_entry("S", "missing"));
        assert!(!settings.is_modified());
        assert!(settings.delete_entry("S", "k"));
        assert!(settings.is_modified());

        settings.set_modified(false);
        settings.clear();
        assert!(settings.is_modified());
        assert_eq!(settings.section_count(), 0);
    }

    #[test]
    fn test_binary_stream() {
        let mut settings = Settings::new();
        settings.parse_str("[A]\nloaded=1\n", false);
        settings.write_string("B", "written", "two words");

        let mut buffer = Vec::new();
        settings.save_to(&mut buffer).unwrap();
        let restored = Settings::load_from(buffer.as_slice()).unwrap();

        assert_eq!(restored.read_string("A", "loaded"), Some("1"));
        assert_eq!(restored.read_string("B", "written"), Some("two words"));
        assert_eq!(restored.section("A").unwrap().is_marked("loaded"), Some(false));
        assert_eq!(restored.section("B").unwrap().is_marked("written"), Some(true));
        assert!(!restored.is_modified());
    }
}
