//! File-based caching for detector responses.
//!
//! This module provides a simple file-based cache with TTL (time-to-live)
//! support. It's used by the OSV detectors to avoid re-querying packages that
//! were looked up recently.
//!
//! # Cache Location
//!
//! The cache is stored under the platform cache directory:
//! - Linux: `~/.cache/layerscan/osv/`
//! - macOS: `~/Library/Caches/layerscan/osv/`
//! - Windows: `%LOCALAPPDATA%\layerscan\osv\`
//!
//! # Example
//!
//! ```no_run
//! use layerscan::Cache;
//!
//! let cache = Cache::new();
//!
//! cache.set("my_key", &"cached value".to_string()).unwrap();
//!
//! let value: Option<String> = cache.get("my_key");
//! assert_eq!(value, Some("cached value".to_string()));
//! ```

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Default cache TTL in hours.
const CACHE_TTL_HOURS: u64 = 24;

/// Returns the root cache directory for layerscan.
pub fn cache_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("layerscan")
}

/// Maps a key to a string that is safe to use as a file name.
///
/// ASCII letters, digits, `-` and `.` are kept. Every other byte, `_`
/// included, is written as `_` plus two hex digits, so distinct keys never
/// share a file.
pub(crate) fn safe_file_stem(key: &str) -> String {
    let mut stem = String::with_capacity(key.len());
    for byte in key.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'.' => stem.push(char::from(byte)),
            _ => stem.push_str(&format!("_{byte:02x}")),
        }
    }
    stem
}

/// A file-based cache with TTL support.
///
/// Values are stored as JSON files in the cache directory. Each entry
/// expires after the configured TTL period.
#[derive(Debug, Clone)]
pub struct Cache {
    dir: PathBuf,
    ttl: Duration,
}

impl Cache {
    /// Creates a new cache with the default 24-hour TTL.
    pub fn new() -> Self {
        Self::with_ttl_hours(CACHE_TTL_HOURS)
    }

    /// Creates a new cache with a custom TTL.
    ///
    /// # Example
    ///
    /// ```
    /// use layerscan::Cache;
    ///
    /// // Cache that expires after 1 hour
    /// let cache = Cache::with_ttl_hours(1);
    /// ```
    pub fn with_ttl_hours(hours: u64) -> Self {
        Self::in_dir(cache_root().join("osv"), Duration::from_secs(hours * 3600))
    }

    /// Creates a cache rooted at `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)
                .with_context(|| format!("failed to create cache dir {}", self.dir.display()))?;
        }
        Ok(())
    }

    fn cache_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", safe_file_stem(key)))
    }

    /// Retrieves a value from the cache.
    ///
    /// Returns `None` if the key doesn't exist, has expired, or can't be
    /// decoded as `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.cache_path(key);

        if !path.exists() {
            return None;
        }

        if let Ok(metadata) = fs::metadata(&path) {
            if let Ok(modified) = metadata.modified() {
                if let Ok(elapsed) = SystemTime::now().duration_since(modified) {
                    if elapsed > self.ttl {
                        let _ = fs::remove_file(&path);
                        return None;
                    }
                }
            }
        }

        let content = fs::read_to_string(&path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Stores a value in the cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory cannot be created or
    /// the file cannot be written.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.ensure_dir()?;
        let path = self.cache_path(key);
        let content = serde_json::to_string(value)?;
        fs::write(&path, content)
            .with_context(|| format!("failed to write cache entry {}", path.display()))?;
        Ok(())
    }

    /// Clears all cached entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory cannot be read.
    pub fn clear(&self) -> Result<()> {
        if self.dir.exists() {
            for entry in fs::read_dir(&self.dir)?.flatten() {
                let path = entry.path();
                if path.extension().map(|e| e == "json").unwrap_or(false) {
                    let _ = fs::remove_file(path);
                }
            }
        }
        Ok(())
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}
