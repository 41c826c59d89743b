// src/dataset/write.rs

use rand::seq::SliceRandom;
use std::fs;
use tracing::info;

use super::append::Dataset;
use super::types::{DatasetError, Snapshot, MISSING_VALUE};
use crate::journal::Journal;

/// Outcome of one snapshot write. `rows_added` is the file's line count
/// after the batch minus the count before it, so the very first write also
/// counts the header line.
#[derive(Debug)]
pub struct WriteSummary {
    pub rows_added: usize,
}

/// Flatten `snapshot` into one dataset row per asset and append them all.
///
/// `order` fixes the metric columns; a dataset cannot be written without
/// one. Metrics absent from a record are emitted as [`MISSING_VALUE`] so
/// every row carries the full column count. The first failing append
/// aborts the rest of the batch: a shape violation means the dataset as a
/// whole is compromised, not just one row.
pub fn write_snapshot(
    snapshot: &Snapshot,
    dataset: &mut Dataset,
    order: &[&str],
    verbose: bool,
    journal: Option<&Journal>,
) -> Result<WriteSummary, DatasetError> {
    if order.is_empty() {
        return Err(DatasetError::EmptyOrder);
    }

    let lines_before = dataset.line_count()?;

    let mut names = Vec::with_capacity(order.len() + 1);
    names.push("token");
    names.extend_from_slice(order);

    for (symbol, record) in snapshot {
        let mut values = Vec::with_capacity(names.len());
        values.push(symbol.clone());
        for metric in order {
            values.push(match record.get(*metric) {
                Some(value) => value.to_string(),
                None => MISSING_VALUE.to_string(),
            });
        }
        dataset.append_row(&values, &names, verbose)?;
    }

    let lines_after = dataset.line_count()?;
    let rows_added = lines_after - lines_before;

    log_sample(dataset, rows_added)?;

    info!(
        "appended {} rows to {}",
        rows_added,
        dataset.path().display()
    );
    if let Some(journal) = journal {
        journal.append(&format!(
            "Appended {} rows to {}.",
            rows_added,
            dataset.path().display()
        ))?;
    }

    Ok(WriteSummary { rows_added })
}

/// Log one random row out of the fresh tail of the file, labeled by the
/// header, as a quick manual sanity check.
fn log_sample(dataset: &Dataset, rows_added: usize) -> Result<(), DatasetError> {
    if rows_added == 0 {
        return Ok(());
    }
    let header = match dataset.header() {
        Some(header) => header,
        None => return Ok(()),
    };

    let contents = fs::read_to_string(dataset.path())?;
    let lines: Vec<&str> = contents.lines().collect();
    // Skip the header line when the file was only just created.
    let start = lines.len().saturating_sub(rows_added).max(1);
    if let Some(sample) = lines[start..].choose(&mut rand::thread_rng()) {
        let labeled = header
            .iter()
            .zip(sample.split(','))
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join(", ");
        info!("random sample: {}", labeled);
    }
    Ok(())
}
