//! Line and scalar extraction from pseudo-files.
//!
//! Every helper here is total: a missing or unreadable file yields an empty
//! result, a malformed value yields the documented default. Logging is the
//! only observable side effect of a failure.

use std::collections::HashMap;
use std::io;
use std::path::Path;

use tracing::{debug, error, trace, warn};

use crate::source::parse::{parse_int, parse_long};
use crate::source::traits::FileSystem;

/// Extraction helpers available on every [`FileSystem`].
pub trait FileSystemExt: FileSystem {
    /// Reads every line of `path`, surfacing the I/O error.
    fn try_read_lines(&self, path: &Path) -> io::Result<Vec<String>> {
        let content = self.read_to_string(path)?;
        Ok(content.lines().map(str::to_string).collect())
    }

    /// Reads every line of `path`; empty if the file is absent or unreadable.
    fn read_lines(&self, path: &Path) -> Vec<String> {
        read_lines_reporting(self, path, true)
    }

    /// First line parsed as `i64`, or 0.
    fn first_line_as_long(&self, path: &Path) -> i64 {
        first_line(self, path)
            .and_then(|line| parse_long(&line))
            .unwrap_or(0)
    }

    /// First line parsed as `i32`, or 0. Out-of-range values also yield 0.
    fn first_line_as_int(&self, path: &Path) -> i32 {
        match first_line(self, path) {
            Some(line) => parse_int(&line).unwrap_or_else(|| {
                debug!(path = %path.display(), value = %line, "unable to read int value");
                0
            }),
            None => 0,
        }
    }

    /// First line verbatim, or "".
    fn first_line_as_string(&self, path: &Path) -> String {
        first_line(self, path).unwrap_or_default()
    }

    /// First line split on runs of whitespace.
    fn first_line_tokens(&self, path: &Path) -> Vec<String> {
        first_line(self, path)
            .map(|line| line.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Splits each line on `separator` into a key and a trimmed value.
    ///
    /// Lines that do not split into exactly two fields are skipped.
    fn key_value_map(&self, path: &Path, separator: &str) -> HashMap<String, String> {
        let mut map = HashMap::new();
        for line in read_lines_reporting(self, path, false) {
            if let Some((key, value)) = split_key_value(&line, separator) {
                map.insert(key.to_string(), value.trim().to_string());
            }
        }
        map
    }
}

impl<F: FileSystem + ?Sized> FileSystemExt for F {}

/// Splits a line into exactly two fields. Trailing empty fields are dropped
/// first, so `"key:"` has one field and is rejected.
pub fn split_key_value<'a>(line: &'a str, separator: &str) -> Option<(&'a str, &'a str)> {
    if separator.is_empty() {
        return None;
    }
    let mut parts: Vec<&str> = line.split(separator).collect();
    while parts.last().is_some_and(|p| p.is_empty()) {
        parts.pop();
    }
    match parts.as_slice() {
        [key, value] => Some((key, value)),
        _ => None,
    }
}

fn read_lines_reporting<F: FileSystem + ?Sized>(fs: &F, path: &Path, report: bool) -> Vec<String> {
    if !fs.exists(path) {
        if report {
            warn!(path = %path.display(), "file not found");
        }
        return Vec::new();
    }
    debug!(path = %path.display(), "reading file");
    match fs.try_read_lines(path) {
        Ok(lines) => lines,
        Err(e) => {
            if report {
                error!(path = %path.display(), error = %e, "error reading file");
            }
            Vec::new()
        }
    }
}

fn first_line<F: FileSystem + ?Sized>(fs: &F, path: &Path) -> Option<String> {
    let line = read_lines_reporting(fs, path, false).into_iter().next()?;
    trace!(path = %path.display(), line = %line, "read first line");
    Some(line)
}
