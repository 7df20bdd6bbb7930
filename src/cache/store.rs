// Versioned JSON file store.
// Handles envelope metadata, atomic writes, and filesystem operations.

use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::Result;

/// Current on-disk format version.
pub const FORMAT_VERSION: u32 = 1;

/// Wrapper for stored data with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    /// Format version the data was written with.
    pub version: u32,
    /// When the data was written.
    pub cached_at: DateTime<Utc>,
    /// The stored data.
    pub data: T,
}

impl<T> CachedData<T> {
    /// Create a new entry stamped with the current version and time.
    pub fn new(data: T) -> Self {
        Self {
            version: FORMAT_VERSION,
            cached_at: Utc::now(),
            data,
        }
    }
}

/// Read a JSON envelope from a file. Missing files and entries written with a
/// different format version read as `None`.
pub fn read_cached<T: DeserializeOwned>(path: &Path) -> Result<Option<CachedData<T>>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path)?;
    let cached: CachedData<T> = serde_json::from_str(&contents)?;
    if cached.version != FORMAT_VERSION {
        return Ok(None);
    }
    Ok(Some(cached))
}

/// Write data wrapped in a JSON envelope.
pub fn write_cached<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let cached = CachedData::new(data);
    let json = serde_json::to_string_pretty(&cached)?;
    write_atomic(path, json.as_bytes())
}

/// Write bytes to a file atomically via a temp file and rename.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    write_atomic_with_mode(path, bytes, None)
}

/// Like [`write_atomic`], but the file is readable only by its owner on Unix
/// from the moment it is created.
pub fn write_private(path: &Path, bytes: &[u8]) -> Result<()> {
    write_atomic_with_mode(path, bytes, Some(0o600))
}

fn write_atomic_with_mode(path: &Path, bytes: &[u8], mode: Option<u32>) -> Result<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    // A leftover temp file would keep its old permissions
    let temp_path = path.with_extension("tmp");
    if temp_path.exists() {
        fs::remove_file(&temp_path)?;
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    set_mode(&mut options, mode);

    let mut file = options.open(&temp_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    fs::rename(&temp_path, path)?;

    Ok(())
}

#[cfg(unix)]
fn set_mode(options: &mut fs::OpenOptions, mode: Option<u32>) {
    use std::os::unix::fs::OpenOptionsExt;

    if let Some(mode) = mode {
        options.mode(mode);
    }
}

#[cfg(not(unix))]
fn set_mode(_options: &mut fs::OpenOptions, _mode: Option<u32>) {}

/// Delete a stored file.
pub fn delete(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}
