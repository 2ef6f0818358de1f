//! A settings section: string keys mapped to owned string values.

use crate::dict::{Dict, StringValue};

/// One `[section]` of a settings file.
///
/// Values are copied on insert, so the caller's buffer may be reused or
/// dropped immediately afterwards.
pub type Section = Dict<StringValue>;

impl Dict<StringValue> {
    /// Returns the value under `key` as a string slice.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.find(key).map(String::as_str)
    }

    /// Returns the number of entries eligible for persistence.
    pub fn marked_count(&self) -> usize {
        self.iter().filter(|(_, _, mark)| *mark).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_get_and_marks() {
        let mut section = Section::new();
        section.replace("width", "800", true);
        section.replace("height", "600", false);
        assert_eq!(section.get("width"), Some("800"));
        assert_eq!(section.get("depth"), None);
        assert_eq!(section.marked_count(), 1);
    }
}
