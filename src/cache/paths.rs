// Storage path utilities.
// Locates per-user directories for gist snapshots and the file-backed secret store.

use std::path::PathBuf;

use directories::ProjectDirs;

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "gistkit")
}

/// Get the base data directory (~/.local/share/gistkit on Linux).
pub fn data_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
}

/// Directory holding one snapshot file per collection.
pub fn snapshots_dir() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("snapshots"))
}

/// Path to the file-backed secret store.
pub fn secrets_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("secrets.json"))
}

/// Sanitize a name for use in filesystem paths.
/// Replaces problematic characters with underscores.
pub(crate) fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("Public"), "Public");
        assert_eq!(sanitize_name("with/slash"), "with_slash");
        assert_eq!(sanitize_name("../escape"), ".._escape");
    }

    #[test]
    fn test_storage_paths() {
        // Path construction only; nothing is created on disk.
        if let Some(dir) = snapshots_dir() {
            assert!(dir.ends_with("snapshots"));
        }
        if let Some(path) = secrets_path() {
            assert!(path.ends_with("secrets.json"));
        }
    }
}
