// src/journal.rs

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Append-only run journal, one `<timestamp>\t<message>` entry per line.
/// Kept separate from tracing: this file is a data output of the system,
/// readable next to the dataset it describes.
#[derive(Debug)]
pub struct Journal {
    path: PathBuf,
}

impl Journal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one timestamped entry. The newline is a prefix, written only
    /// once the file has content, so the journal never ends in a blank
    /// line and its first line is a real entry.
    pub fn append(&self, message: &str) -> io::Result<()> {
        let entry = format!("{}\t{}", crate::timestamp_now(), message);
        let has_content = self.path.is_file() && fs::metadata(&self.path)?.len() > 0;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        if has_content {
            file.write_all(b"\n")?;
        }
        file.write_all(entry.as_bytes())
    }
}
