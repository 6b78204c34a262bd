//! The source `DbContext` file, read once and never mutated in place.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

use crate::error::SplitError;

static USING_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^using\s+[^;]*;").expect("Invalid regex"));

static NAMESPACE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)(?:^|[\s;])namespace\s+([A-Za-z_@][\w.]*)").expect("Invalid regex")
});

#[derive(Debug, Clone)]
pub struct Document {
    pub path: PathBuf,
    pub text: String,
}

impl Document {
    pub fn new(path: PathBuf, text: String) -> Self {
        Self { path, text }
    }

    /// Reads the document from disk, resolving it to an absolute path first.
    pub fn load(path: &Path) -> Result<Self, SplitError> {
        if !path.is_file() {
            return Err(SplitError::SourceNotFound(path.to_path_buf()));
        }
        let path = std::path::absolute(path).map_err(|source| SplitError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let text = std::fs::read_to_string(&path).map_err(|source| SplitError::Read {
            path: path.clone(),
            source,
        })?;
        Ok(Self::new(path, text))
    }

    /// `\r\n` if the document uses it anywhere, `\n` otherwise.
    pub fn line_ending(&self) -> &'static str {
        line_ending_of(&self.text)
    }

    /// Top-level `using` directives in document order.
    pub fn usings(&self) -> Vec<&str> {
        USING_REGEX
            .find_iter(&self.text)
            .map(|m| m.as_str())
            .collect()
    }

    /// The first declared namespace, block-scoped or file-scoped. Empty if none.
    pub fn namespace(&self) -> &str {
        NAMESPACE_REGEX
            .captures(&self.text)
            .and_then(|caps| caps.get(1))
            .map_or("", |m| m.as_str())
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned()
    }

    /// Directory holding the document.
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }
}

pub fn line_ending_of(text: &str) -> &'static str {
    if text.contains("\r\n") { "\r\n" } else { "\n" }
}

/// Offset of the first byte of the line containing `offset`.
pub fn line_start(text: &str, offset: usize) -> usize {
    text[..offset].rfind('\n').map_or(0, |i| i + 1)
}
