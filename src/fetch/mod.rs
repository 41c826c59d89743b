pub mod top100;

pub use top100::fetch_top100_snapshot;
