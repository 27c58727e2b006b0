//! In-memory sources for testing collectors without a real `/proc` or the
//! real diagnostic commands.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use crate::source::command::CommandRunner;
use crate::source::traits::FileSystem;

/// In-memory filesystem.
///
/// Stores file contents keyed by path, so tests can simulate any set of
/// pseudo-files on any platform.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    files: HashMap<PathBuf, String>,
}

impl MockFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a file with the given content.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        self.files
            .insert(path.as_ref().to_path_buf(), content.into());
    }

    /// Builder form of [`add_file`](Self::add_file).
    pub fn with_file(mut self, path: impl AsRef<Path>, content: impl Into<String>) -> Self {
        self.add_file(path, content);
        self
    }
}

impl FileSystem for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {:?}", path),
            )
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }
}

/// Command runner that replays canned output.
///
/// Output is keyed by the full command line (program and arguments joined
/// by single spaces). Unknown commands fail as if the program were missing.
#[derive(Debug, Clone, Default)]
pub struct MockCommandRunner {
    outputs: HashMap<String, Vec<String>>,
}

impl MockCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the stdout of `command_line`, split into lines.
    pub fn add_output(&mut self, command_line: &str, stdout: &str) {
        self.outputs.insert(
            command_line.to_string(),
            stdout.lines().map(str::to_string).collect(),
        );
    }

    /// Builder form of [`add_output`](Self::add_output).
    pub fn with_output(mut self, command_line: &str, stdout: &str) -> Self {
        self.add_output(command_line, stdout);
        self
    }
}

impl CommandRunner for MockCommandRunner {
    fn execute(&self, program: &str, args: &[&str]) -> io::Result<Vec<String>> {
        let mut key = program.to_string();
        for arg in args {
            key.push(' ');
            key.push_str(arg);
        }
        self.outputs.get(&key).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("command not found: {}", key),
            )
        })
    }
}
