// src/dataset/types.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

/// Metrics scraped for one asset. A metric the producer could not locate
/// is simply absent from the map; the flattener decides how absence is
/// rendered in the emitted row.
pub type MetricRecord = BTreeMap<String, f64>;

/// One complete scrape result: every asset's metrics at one point in time,
/// keyed by asset symbol.
pub type Snapshot = BTreeMap<String, MetricRecord>;

/// Field written in place of a metric that is absent from a record.
pub const MISSING_VALUE: &str = "NaN";

/// Failures of the dataset writer. All of these are unrecoverable at the
/// point they occur: the file is left exactly as it was.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Caller handed over mismatched value/name sequences.
    #[error("number of values ({values}) and names ({names}) to append must be the same")]
    ShapeMismatch { values: usize, names: usize },

    /// The row's column count disagrees with the header established when
    /// the file was created. The metric set must not change over the
    /// lifetime of a dataset file.
    #[error(
        "refusing to append a row of {attempted} fields to `{path}`: \
         its header has {established}"
    )]
    SchemaDrift {
        path: PathBuf,
        attempted: usize,
        established: usize,
    },

    /// The last line of the file does not start with a valid integer id.
    #[error(
        "the last line of `{path}` doesn't start with a valid id value (int); \
         something is wrong with the data file, inspect it manually"
    )]
    CorruptState { path: PathBuf },

    /// A dataset cannot be created without an explicit metric ordering.
    #[error("an explicit, non-empty metric ordering is required")]
    EmptyOrder,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
