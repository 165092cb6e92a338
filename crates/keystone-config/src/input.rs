//! Raw, untyped configuration input.
//!
//! A [`RawInput`] is a flat map of key to string, built from the process
//! environment, a `KEY=VALUE` file, or explicit pairs. It is read once per
//! validation pass and never mutated by the pipeline.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::LoadError;

/// Flat map of raw configuration values.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawInput {
    values: BTreeMap<String, String>,
}

impl RawInput {
    /// An empty input.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an input from key/value pairs. Later duplicates win.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    /// Snapshot the current process environment.
    ///
    /// Variables whose name or value is not valid Unicode are skipped.
    pub fn from_process_env() -> Self {
        Self::from_pairs(std::env::vars_os().filter_map(|(key, value)| {
            Some((key.into_string().ok()?, value.into_string().ok()?))
        }))
    }

    /// Read a `KEY=VALUE` file.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the file is missing or unreadable. Malformed
    /// lines inside the file are skipped, never reported as errors.
    pub fn from_env_file<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(LoadError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| LoadError::read_error(path, e))?;
        let input = Self::parse_env_str(&content);
        tracing::debug!(path = %path.display(), keys = input.len(), "Loaded environment file");

        Ok(input)
    }

    /// Parse `KEY=VALUE` text.
    ///
    /// Each physical line is one entry. Comments, blank lines and `export`
    /// prefixes follow dotenv conventions, and quoted values are unquoted.
    /// Values are taken verbatim: `$NAME` is never expanded. A line that
    /// cannot be parsed (including one with no `=` or an unterminated quote)
    /// is skipped on its own.
    pub fn parse_env_str(content: &str) -> Self {
        let mut values = BTreeMap::new();

        for (index, line) in content.lines().enumerate() {
            match parse_env_line(line) {
                None => {}
                Some(Ok((key, value))) => {
                    values.insert(key, value);
                }
                Some(Err(reason)) => {
                    tracing::warn!(line = index + 1, error = %reason, "Skipping malformed environment entry");
                }
            }
        }

        Self { values }
    }

    /// Raw value of `key`, if set.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Whether `key` is set to a non-empty value.
    pub fn is_signalled(&self, key: &str) -> bool {
        self.get(key).is_some_and(|value| !value.is_empty())
    }

    /// Set a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(key.into(), value.into())
    }

    /// Overlay `other` on top of `self`; values from `other` win.
    pub fn merge(&mut self, other: RawInput) {
        self.values.extend(other.values);
    }

    /// Entries whose key starts with `prefix`, in key order.
    pub fn with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.values
            .iter()
            .filter(move |(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no keys.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over all entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawInput {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self::from_pairs(iter)
    }
}

/// Parse one line of an environment file.
///
/// Returns `None` for blank lines and comments.
fn parse_env_line(line: &str) -> Option<Result<(String, String), String>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let Some((key, value)) = line.split_once('=') else {
        return Some(Err("expected KEY=VALUE".to_string()));
    };
    let value = value.trim_start();

    let parsed = match value.chars().next() {
        // Double quotes allow escapes and substitution; escape `$` so it stays literal.
        Some('"') => parse_quoted(&format!("{key}={}", escape_dollars(value))),
        Some('\'') => parse_quoted(line),
        _ => {
            let key = key.trim();
            let key = key.strip_prefix("export ").map_or(key, str::trim_start);
            if !is_valid_key(key) {
                return Some(Err(format!("invalid key `{key}`")));
            }
            Ok((key.to_string(), strip_inline_comment(value).to_string()))
        }
    };
    Some(parsed)
}

fn parse_quoted(line: &str) -> Result<(String, String), String> {
    match dotenvy::from_read_iter(line.as_bytes()).next() {
        Some(entry) => entry.map_err(|e| e.to_string()),
        None => Err("empty entry".to_string()),
    }
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

/// Unquoted values end at a ` #` comment.
fn strip_inline_comment(value: &str) -> &str {
    let end = value
        .char_indices()
        .find(|&(i, c)| c == '#' && i > 0 && value[..i].ends_with(char::is_whitespace))
        .map_or(value.len(), |(i, _)| i);
    value[..end].trim_end()
}

/// Escape every `$` that is not already escaped.
fn escape_dollars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut escaped = false;
    for c in value.chars() {
        if c == '$' && !escaped {
            out.push('\\');
        }
        escaped = c == '\\' && !escaped;
        out.push(c);
    }
    out
}
