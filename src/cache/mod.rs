// Cache module for local filesystem storage.
// Persists gist snapshots for offline viewing.

pub mod paths;
pub mod snapshot;
pub mod store;

pub use snapshot::SnapshotCache;
pub use store::{CachedData, FORMAT_VERSION};
