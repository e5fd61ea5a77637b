//! `mod.conf` / `modpack.conf` handling.
//!
//! The format is a flat list of `key = value` lines. Blank lines and lines
//! starting with `#` or `;` are ignored, and a value opened with `"""` runs
//! until the line that closes it. Keys keep their original order so that a
//! rewritten file only differs where values were changed.

use std::fmt;
use std::path::Path;

use indexmap::IndexMap;
use thiserror::Error;

use crate::error::{ContentDbError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct ConfParseError {
    pub line: usize,
    pub message: String,
}

/// Ordered key-value configuration of a mod or modpack
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModConf {
    entries: IndexMap<String, String>,
}

impl ModConf {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration text
    pub fn parse(text: &str) -> std::result::Result<Self, ConfParseError> {
        let mut entries = IndexMap::new();
        let mut lines = text.lines().enumerate();

        while let Some((index, raw)) = lines.next() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            let (key, value) = line.split_once('=').ok_or_else(|| ConfParseError {
                line: index + 1,
                message: format!("expected `key = value`, found `{}`", line),
            })?;

            let key = key.trim();
            if key.is_empty() {
                return Err(ConfParseError {
                    line: index + 1,
                    message: "empty key".to_string(),
                });
            }

            let value = value.trim();
            let value = match value.strip_prefix("\"\"\"") {
                Some(rest) => read_multiline(rest, &mut lines, index + 1)?,
                None => value.to_string(),
            };

            entries.insert(key.to_string(), value);
        }

        Ok(Self { entries })
    }

    /// Load from disk; a missing file yields an empty configuration
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let text = std::fs::read_to_string(path)?;
        Self::parse(&text).map_err(|source| ContentDbError::ConfParse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Write to disk, replacing any existing file
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_string())?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Set a value, keeping the key's position if it already exists
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Set a value only when the key is absent. Returns whether it was set.
    pub fn set_if_absent(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, value.into());
        true
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.shift_remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn name(&self) -> Option<&str> {
        self.get("name").filter(|v| !v.is_empty())
    }

    pub fn author(&self) -> Option<&str> {
        self.get("author").filter(|v| !v.is_empty())
    }

    pub fn release(&self) -> Option<&str> {
        self.get("release").filter(|v| !v.is_empty())
    }

    /// Hard dependencies listed in `depends`
    pub fn depends(&self) -> Vec<String> {
        split_list(self.get("depends"))
    }

    /// Soft dependencies listed in `optional_depends`
    pub fn optional_depends(&self) -> Vec<String> {
        split_list(self.get("optional_depends"))
    }
}

impl fmt::Display for ModConf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.entries {
            if value.contains('\n') {
                writeln!(f, "{} = \"\"\"\n{}\n\"\"\"", key, value)?;
            } else {
                writeln!(f, "{} = {}", key, value)?;
            }
        }
        Ok(())
    }
}

fn read_multiline<'a, I>(first: &str, lines: &mut I, start_line: usize) -> std::result::Result<String, ConfParseError>
where
    I: Iterator<Item = (usize, &'a str)>,
{
    if let Some(inline) = first.strip_suffix("\"\"\"") {
        return Ok(inline.to_string());
    }

    let mut parts: Vec<&str> = Vec::new();
    if !first.is_empty() {
        parts.push(first);
    }

    for (_, raw) in lines.by_ref() {
        if let Some(last) = raw.trim_end().strip_suffix("\"\"\"") {
            if !last.is_empty() {
                parts.push(last);
            }
            return Ok(parts.join("\n"));
        }
        parts.push(raw);
    }

    Err(ConfParseError {
        line: start_line,
        message: "unterminated \"\"\" value".to_string(),
    })
}

fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
