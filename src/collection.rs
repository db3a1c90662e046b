//! Config entry model and the flat `key = value` parser
//!
//! worldserver.conf and bnetserver.conf are flat text: one setting per
//! `key = value` line, optionally preceded by `#` comment lines bound to
//! that key, with blank lines as separators. This module parses that format
//! into an ordered collection, serializes it back, and provides the lookup
//! and anomaly-detection operations everything else is built on.

use std::path::Path;

/// One setting pulled from a config file.
///
/// `description` is the verbatim block of comment/blank lines that sat
/// directly above the key in the source file (newline-joined, no trailing
/// newline). It is carried along so an edited file round-trips with its
/// comments intact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    pub name: String,
    pub value: String,
    pub description: String,
}

impl ConfigEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            description: String::new(),
        }
    }
}

/// Ordered collection of [`ConfigEntry`], in file order.
///
/// Keys are logically unique but duplicates are representable; they are a
/// detectable anomaly ([`duplicate_names`](Self::duplicate_names)), not a
/// structural error.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigCollection {
    entries: Vec<ConfigEntry>,
}

/// Strip every whitespace character. `"Game . Build"` and `"GameBuild"`
/// compare equal after normalization.
pub fn normalize(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

fn norm_eq(a: &str, b: &str) -> bool {
    normalize(a).eq_ignore_ascii_case(&normalize(b))
}

impl ConfigCollection {
    /// Parse config text into a collection.
    ///
    /// Comment and blank lines accumulate into a pending description buffer
    /// that attaches to the next `key = value` line. A stray line that is
    /// neither produces no entry and drops the pending buffer, since those
    /// comments no longer sit directly above a key. Trailing comments with
    /// no key after them are dropped as well.
    pub fn parse(text: &str) -> Self {
        let mut entries = Vec::new();
        let mut pending: Vec<&str> = Vec::new();

        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                pending.push(line);
                continue;
            }

            match line.split_once('=') {
                Some((key, value)) if !key.trim().is_empty() => {
                    entries.push(ConfigEntry {
                        name: key.trim().to_string(),
                        value: value.trim().to_string(),
                        description: pending.join("\n"),
                    });
                    pending.clear();
                }
                _ => pending.clear(),
            }
        }

        Self { entries }
    }

    /// Load a collection from a file. Fails soft: a missing or unreadable
    /// file yields an empty collection, which callers must surface to the
    /// user as "nothing loaded" themselves.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(&text),
            Err(e) => {
                tracing::warn!("[config] cannot read {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Serialize back to config text: each entry's description block (when
    /// present) followed by its `name = value` line, in collection order.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            if !entry.description.is_empty() {
                out.push_str(&entry.description);
                out.push('\n');
            }
            out.push_str(&entry.name);
            out.push_str(" = ");
            out.push_str(&entry.value);
            out.push('\n');
        }
        out
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, entry: ConfigEntry) {
        self.entries.push(entry);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigEntry> {
        self.entries.iter()
    }

    /// Update the value of the FIRST case-insensitive match and stop.
    ///
    /// When a key is duplicated the first occurrence is most likely the
    /// original/valid one, so that is the one edits land on. Returns whether
    /// a match was found.
    pub fn update_value(&mut self, name: &str, value: &str) -> bool {
        for entry in &mut self.entries {
            if entry.name.eq_ignore_ascii_case(name) {
                entry.value = value.to_string();
                return true;
            }
        }
        false
    }

    /// Fetch the value for `name`, whitespace-normalized case-insensitive
    /// match. When the key is duplicated the LAST match wins. The returned
    /// value is whitespace-stripped; absent keys yield an empty string.
    ///
    /// Note the asymmetry with [`update_value`](Self::update_value), which
    /// targets the first match. Kept as-is; see DESIGN.md.
    pub fn get_value(&self, name: &str) -> String {
        let mut result = String::new();
        for entry in &self.entries {
            if norm_eq(&entry.name, name) {
                result = entry.value.clone();
            }
        }
        normalize(&result)
    }

    /// True iff a matching key exists whose value is exactly `"1"`.
    /// Anything else, including `"true"`, counts as disabled.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.entries
            .iter()
            .any(|e| norm_eq(&e.name, name) && e.value == "1")
    }

    /// Whitespace-normalized, case-insensitive existence check.
    pub fn has_key(&self, name: &str) -> bool {
        self.entries.iter().any(|e| norm_eq(&e.name, name))
    }

    /// Names appearing two or more times case-insensitively, reported once
    /// each under their first-seen casing.
    pub fn duplicate_names(&self) -> Vec<String> {
        let mut results: Vec<String> = Vec::new();
        for entry in &self.entries {
            let matches = self
                .entries
                .iter()
                .filter(|e| e.name.eq_ignore_ascii_case(&entry.name))
                .count();
            if matches > 1
                && !results.iter().any(|r| r.eq_ignore_ascii_case(&entry.name))
            {
                results.push(entry.name.clone());
            }
        }
        results
    }

    /// Names of entries whose value contains a `#`. Comments embedded in a
    /// value line are a latent hazard: they corrupt round-tripping.
    pub fn inline_comment_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.value.contains('#'))
            .map(|e| e.name.clone())
            .collect()
    }
}

impl FromIterator<ConfigEntry> for ConfigCollection {
    fn from_iter<I: IntoIterator<Item = ConfigEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# Bind address for the listener
# 0.0.0.0 means all interfaces
BindIP = 0.0.0.0

# Client build this server accepts
Game.Build.Version = 26972
WorldServerPort = 8198
";

    #[test]
    fn test_parse_basic() {
        let c = ConfigCollection::parse(SAMPLE);
        assert_eq!(c.len(), 3);
        assert_eq!(c.get_value("BindIP"), "0.0.0.0");
        assert_eq!(c.get_value("Game.Build.Version"), "26972");
        assert_eq!(c.get_value("WorldServerPort"), "8198");
    }

    #[test]
    fn test_parse_binds_comments_to_next_key() {
        let c = ConfigCollection::parse(SAMPLE);
        let first = c.iter().next().unwrap();
        assert!(first.description.contains("Bind address"));
        assert!(first.description.contains("all interfaces"));

        // Blank separator belongs to the following entry's block
        let second = c.iter().nth(1).unwrap();
        assert!(second.description.starts_with('\n'));
        assert!(second.description.contains("Client build"));
    }

    #[test]
    fn test_round_trip() {
        let c = ConfigCollection::parse(SAMPLE);
        let again = ConfigCollection::parse(&c.to_text());
        assert_eq!(c, again);
    }

    #[test]
    fn test_stray_line_drops_pending_comments() {
        let text = "# orphaned comment\nnot a setting line\nKey = 1\n";
        let c = ConfigCollection::parse(text);
        assert_eq!(c.len(), 1);
        assert_eq!(c.iter().next().unwrap().description, "");
    }

    #[test]
    fn test_trailing_comments_dropped() {
        let c = ConfigCollection::parse("Key = 1\n# dangling\n");
        assert_eq!(c.len(), 1);
        assert_eq!(c.to_text(), "Key = 1\n");
    }

    #[test]
    fn test_value_keeps_later_equals_signs() {
        let c = ConfigCollection::parse("Motd = Welcome = yes\n");
        assert_eq!(c.iter().next().unwrap().value, "Welcome = yes");
    }

    #[test]
    fn test_update_first_get_last_on_duplicates() {
        let mut c: ConfigCollection = [
            ConfigEntry::new("Key", "one"),
            ConfigEntry::new("key", "two"),
            ConfigEntry::new("KEY", "three"),
        ]
        .into_iter()
        .collect();

        // Lookup returns the last occurrence
        assert_eq!(c.get_value("key"), "three");

        // Update lands on the first occurrence only
        assert!(c.update_value("key", "edited"));
        let values: Vec<&str> = c.iter().map(|e| e.value.as_str()).collect();
        assert_eq!(values, ["edited", "two", "three"]);
    }

    #[test]
    fn test_update_value_idempotent() {
        let mut a = ConfigCollection::parse(SAMPLE);
        a.update_value("BindIP", "127.0.0.1");
        let once = a.clone();
        a.update_value("BindIP", "127.0.0.1");
        assert_eq!(a, once);
    }

    #[test]
    fn test_update_value_missing_key() {
        let mut c = ConfigCollection::parse(SAMPLE);
        assert!(!c.update_value("NoSuchKey", "1"));
    }

    #[test]
    fn test_normalized_lookup() {
        let c = ConfigCollection::parse("Game.Build.Version = 26972\n");
        assert_eq!(c.get_value("game . build . version"), "26972");
        assert!(c.has_key(" Game.Build.Version "));
        assert!(!c.has_key("Game.Build"));
    }

    #[test]
    fn test_is_enabled_exact_one_only() {
        let c = ConfigCollection::parse(
            "A = 1\nB = 0\nC = true\nD =\n",
        );
        assert!(c.is_enabled("A"));
        assert!(!c.is_enabled("B"));
        assert!(!c.is_enabled("C"));
        assert!(!c.is_enabled("D"));
        assert!(!c.is_enabled("E"));
    }

    #[test]
    fn test_duplicate_names_case_insensitive_once() {
        let c: ConfigCollection = [
            ConfigEntry::new("A", "1"),
            ConfigEntry::new("a", "2"),
            ConfigEntry::new("B", "3"),
        ]
        .into_iter()
        .collect();
        assert_eq!(c.duplicate_names(), vec!["A".to_string()]);
    }

    #[test]
    fn test_inline_comment_names() {
        let c = ConfigCollection::parse("A = 1 # enable\nB = 2\nC = #\n");
        assert_eq!(c.inline_comment_names(), vec!["A".to_string(), "C".to_string()]);
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let c = ConfigCollection::load("/no/such/dir/worldserver.conf");
        assert!(c.is_empty());
    }
}
