pub mod append;
pub mod types;
pub mod write;

pub use append::Dataset;
pub use types::{DatasetError, MetricRecord, Snapshot, MISSING_VALUE};
pub use write::{write_snapshot, WriteSummary};
