use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::StoreError;

/// Append-only log of finished games, one summary line per game.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryLog {
    lines: Vec<String>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Writes every line, newline separated, to `path`. Returns the number of
    /// lines written; an empty log leaves the filesystem untouched.
    pub fn export<P: AsRef<Path>>(&self, path: P) -> Result<usize, StoreError> {
        if self.lines.is_empty() {
            return Ok(0);
        }
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.lines.join("\n"))?;
        info!(lines = self.lines.len(), path = %path.display(), "history exported");
        Ok(self.lines.len())
    }
}
