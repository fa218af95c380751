//! Raw key/value property sources.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::error::Result;

/// Something that can answer raw property lookups.
pub trait PropertySource {
    /// Returns the raw value stored under `key`.
    fn property(&self, key: &str) -> Option<&str>;
}

impl PropertySource for HashMap<String, String> {
    fn property(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

impl PropertySource for BTreeMap<String, String> {
    fn property(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

/// A parsed set of properties.
///
/// Accepts `key=value` lines and `getprop` style `[key]: [value]` lines.
/// Blank lines, `#` comments and lines matching neither form are skipped.
/// A repeated key keeps its last value.
///
/// # Example
///
/// ```
/// use dnsinfo::{Properties, PropertySource};
///
/// let props = Properties::parse("[net.dns1]: [8.8.8.8]\nnet.dns2=1.1.1.1\n");
/// assert_eq!(props.property("net.dns1"), Some("8.8.8.8"));
/// assert_eq!(props.property("net.dns2"), Some("1.1.1.1"));
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    /// Creates an empty property set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses property text, skipping lines that match neither form.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut props = Self::new();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match parse_line(line) {
                Some((key, value)) => props.insert(key, value),
                None => tracing::debug!(line = lineno + 1, "Skipping malformed property line"),
            }
        }
        props
    }

    /// Reads and parses a property file.
    ///
    /// # Errors
    ///
    /// Returns [`DnsInfoError::Io`](crate::DnsInfoError::Io) if the file
    /// cannot be read.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let props = Self::parse(&text);
        tracing::debug!(path = %path.display(), count = props.len(), "Loaded properties");
        Ok(props)
    }

    /// Sets `key`, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no property is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PropertySource for Properties {
    fn property(&self, key: &str) -> Option<&str> {
        self.get(key)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut props = Self::new();
        for (key, value) in iter {
            props.insert(key, value);
        }
        props
    }
}

fn parse_line(line: &str) -> Option<(&str, &str)> {
    if let Some(rest) = line.strip_prefix('[') {
        let (key, rest) = rest.split_once(']')?;
        let value = rest.trim_start().strip_prefix(':')?.trim();
        let value = value.strip_prefix('[')?.strip_suffix(']')?;
        return Some((key.trim(), value));
    }
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, value.trim()))
}
