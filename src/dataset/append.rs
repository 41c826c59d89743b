// src/dataset/append.rs

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use super::types::DatasetError;

/// Handle on one append-only dataset file.
///
/// `open` reads the established header and the last row's id once; appends
/// validate against that cached state instead of re-reading the file on
/// every call. The file itself is only ever grown, one `\n`-prefixed line
/// at a time, so it never ends in a trailing blank line.
#[derive(Debug)]
pub struct Dataset {
    path: PathBuf,
    /// Header fields (`id,time,<names…>`) once the file exists.
    header: Option<Vec<String>>,
    next_id: u64,
}

impl Dataset {
    /// Open `path`, caching its header and next row id. A missing or empty
    /// file is fine: the header gets established by the first append. A
    /// last line whose id field doesn't parse as an integer means the file
    /// is already damaged, and nothing may be appended to it.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DatasetError> {
        let path = path.into();
        if !path.is_file() {
            return Ok(Self {
                path,
                header: None,
                next_id: 0,
            });
        }

        let contents = fs::read_to_string(&path)?;
        let lines: Vec<&str> = contents.lines().collect();
        let (first, rest) = match lines.split_first() {
            Some(split) => split,
            None => {
                return Ok(Self {
                    path,
                    header: None,
                    next_id: 0,
                })
            }
        };

        let header: Vec<String> = first.split(',').map(str::to_string).collect();
        let next_id = match rest.last() {
            Some(last) => {
                let id_field = last.split(',').next().unwrap_or_default();
                match id_field.trim().parse::<u64>() {
                    Ok(id) => id + 1,
                    Err(_) => return Err(DatasetError::CorruptState { path }),
                }
            }
            // Header but no data rows; start ids from scratch.
            None => 0,
        };

        Ok(Self {
            path,
            header: Some(header),
            next_id,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Header fields as established on disk, if the file exists yet.
    pub fn header(&self) -> Option<&[String]> {
        self.header.as_deref()
    }

    /// Number of lines currently in the file (header included), 0 if the
    /// file hasn't been created yet.
    pub fn line_count(&self) -> Result<usize, DatasetError> {
        if !self.path.is_file() {
            return Ok(0);
        }
        Ok(fs::read_to_string(&self.path)?.lines().count())
    }

    /// Append one row of named values.
    ///
    /// On the very first append the file is created with its header line
    /// and row 0 in a single write. Afterwards the name count must keep
    /// matching the established header (`names + id + time`), otherwise
    /// the append is refused and the file stays untouched.
    pub fn append_row(
        &mut self,
        values: &[String],
        names: &[&str],
        verbose: bool,
    ) -> Result<(), DatasetError> {
        if values.len() != names.len() {
            return Err(DatasetError::ShapeMismatch {
                values: values.len(),
                names: names.len(),
            });
        }

        let stamp = crate::timestamp_now();

        match &self.header {
            None => {
                let mut fields = vec!["id".to_string(), "time".to_string()];
                fields.extend(names.iter().map(|n| n.to_string()));
                let header_line = fields.join(",");
                let row = format!("0,{},{}", stamp, values.join(","));

                let mut file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.path)?;
                file.write_all(format!("{}\n{}", header_line, row).as_bytes())?;

                if verbose {
                    info!(
                        "no file called `{}` has been found, so it has been created \
                         with header `{}`",
                        self.path.display(),
                        header_line
                    );
                    info!("added new row to data: {}", row);
                }
                self.header = Some(fields);
                self.next_id = 1;
            }
            Some(header) => {
                if names.len() + 2 != header.len() {
                    return Err(DatasetError::SchemaDrift {
                        path: self.path.clone(),
                        attempted: names.len() + 2,
                        established: header.len(),
                    });
                }

                let row = format!("{},{},{}", self.next_id, stamp, values.join(","));
                let mut file = OpenOptions::new().append(true).open(&self.path)?;
                file.write_all(format!("\n{}", row).as_bytes())?;

                if verbose {
                    info!("added new row to data: {}", row);
                }
                self.next_id += 1;
            }
        }

        Ok(())
    }
}
