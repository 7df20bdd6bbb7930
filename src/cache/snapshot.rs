// Offline snapshot cache.
// Persists the last fetched gist collection per name so it can be shown without a network.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::github::Gist;

use super::paths::{sanitize_name, snapshots_dir};
use super::store::{self, CachedData};

/// Snapshot files, one per collection name, under a single directory.
#[derive(Debug, Clone)]
pub struct SnapshotCache {
    dir: PathBuf,
}

impl SnapshotCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Snapshot cache in the per-user data directory.
    pub fn open_default() -> Option<Self> {
        snapshots_dir().map(Self::new)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing the snapshot for `name`.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_name(name)))
    }

    /// Replace the snapshot for `name`. Returns false if it could not be written.
    pub fn save(&self, name: &str, gists: &[Gist]) -> bool {
        let path = self.path_for(name);
        match store::write_cached(&path, &gists) {
            Ok(()) => {
                debug!(name, count = gists.len(), "saved snapshot");
                true
            }
            Err(e) => {
                warn!(name, error = %e, "failed to save snapshot");
                false
            }
        }
    }

    /// Load the snapshot for `name`. Absent, unreadable and corrupt snapshots
    /// all read as `None`.
    pub fn load(&self, name: &str) -> Option<Vec<Gist>> {
        self.read(name).map(|cached| cached.data)
    }

    /// When the snapshot for `name` was written.
    pub fn saved_at(&self, name: &str) -> Option<DateTime<Utc>> {
        self.read(name).map(|cached| cached.cached_at)
    }

    /// Delete the snapshot for `name`. Returns false if it could not be removed.
    pub fn remove(&self, name: &str) -> bool {
        store::delete(&self.path_for(name)).is_ok()
    }

    fn read(&self, name: &str) -> Option<CachedData<Vec<Gist>>> {
        match store::read_cached(&self.path_for(name)) {
            Ok(cached) => cached,
            Err(e) => {
                warn!(name, error = %e, "ignoring unreadable snapshot");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::File;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn sample_gists() -> Vec<Gist> {
        vec![
            Gist {
                id: "aa1".into(),
                description: "remote".into(),
                owner_login: Some("octocat".into()),
                owner_avatar_url: Some("https://avatars.example/octocat".into()),
                url: "https://api.github.com/gists/aa1".into(),
                files: vec![File {
                    filename: Some("hello.rs".into()),
                    raw_url: Some("https://gist.example/raw/hello.rs".into()),
                    content: None,
                }],
                created_at: Some(Utc.with_ymd_and_hms(2017, 3, 27, 10, 0, 0).unwrap()),
                updated_at: Some(Utc.with_ymd_and_hms(2017, 3, 28, 11, 30, 15).unwrap()),
            },
            Gist {
                id: "bb2".into(),
                description: "".into(),
                owner_login: None,
                owner_avatar_url: None,
                url: "https://api.github.com/gists/bb2".into(),
                files: vec![
                    File::new("draft.md", "# Draft"),
                    File {
                        filename: None,
                        raw_url: None,
                        content: None,
                    },
                ],
                created_at: None,
                updated_at: None,
            },
        ]
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let cache = SnapshotCache::new(temp_dir.path());
        let gists = sample_gists();

        assert!(cache.save("Public", &gists));
        assert_eq!(cache.load("Public"), Some(gists));
        assert!(cache.saved_at("Public").is_some());
    }

    #[test]
    fn test_save_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let cache = SnapshotCache::new(temp_dir.path());
        let gists = sample_gists();

        assert!(cache.save("Public", &gists));
        assert!(cache.save("Public", &gists[1..]));
        assert_eq!(cache.load("Public").unwrap().len(), 1);
    }

    #[test]
    fn test_names_are_independent() {
        let temp_dir = TempDir::new().unwrap();
        let cache = SnapshotCache::new(temp_dir.path());

        assert!(cache.save("Public", &sample_gists()));
        assert_eq!(cache.load("Starred"), None);
    }

    #[test]
    fn test_missing_and_corrupt_read_as_none() {
        let temp_dir = TempDir::new().unwrap();
        let cache = SnapshotCache::new(temp_dir.path());
        assert_eq!(cache.load("Public"), None);

        std::fs::write(cache.path_for("Public"), "{ not json").unwrap();
        assert_eq!(cache.load("Public"), None);
        assert_eq!(cache.saved_at("Public"), None);
    }

    #[test]
    fn test_save_failure_returns_false() {
        let temp_dir = TempDir::new().unwrap();
        // A regular file where the snapshot directory should be
        let blocker = temp_dir.path().join("snapshots");
        std::fs::write(&blocker, "").unwrap();

        let cache = SnapshotCache::new(&blocker);
        assert!(!cache.save("Public", &sample_gists()));
    }

    #[test]
    fn test_remove() {
        let temp_dir = TempDir::new().unwrap();
        let cache = SnapshotCache::new(temp_dir.path());

        assert!(cache.save("Mine", &sample_gists()));
        assert!(cache.remove("Mine"));
        assert_eq!(cache.load("Mine"), None);
    }
}
