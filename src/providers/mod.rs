//! External data sources: concentration readings and dashboard snapshots.

pub mod prometheus;
pub mod snapshot;
pub mod traits;

pub use prometheus::PrometheusReadingSource;
pub use snapshot::HttpSnapshotProvider;
pub use traits::{MetricsSourceError, ReadingSource, SnapshotError, SnapshotProvider};
