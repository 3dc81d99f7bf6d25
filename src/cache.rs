//! On-disk cache of downloaded songs.
//!
//! Songs are stored as `<video ID>.m4a` in one flat directory. When caching
//! is enabled, files outlive their queue entry and the directory is kept
//! under a size limit by evicting the least recently modified files. When it
//! is disabled, each song's file is deleted once the song is done.

use std::{
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use tokio::fs;

use crate::{config::Config, error::Result, id::VideoId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cache {
    dir: PathBuf,
    enabled: bool,
    maximum_size: u64,
    expiry: Duration,
}

#[derive(Debug)]
struct Entry {
    path: PathBuf,
    size: u64,
    modified: SystemTime,
}

impl Cache {
    /// File extension of cached songs.
    pub const EXTENSION: &'static str = "m4a";

    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self::with_limits(
            config.cache_dir(),
            config.cache.enabled,
            config.cache.maximum_bytes(),
            config.cache.expiry(),
        )
    }

    /// Creates a cache over `dir` with a size limit in bytes.
    #[must_use]
    pub fn with_limits(
        dir: impl Into<PathBuf>,
        enabled: bool,
        maximum_size: u64,
        expiry: Duration,
    ) -> Self {
        Self {
            dir: dir.into(),
            enabled,
            maximum_size,
            expiry,
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// File name of the cached audio of `id`.
    #[must_use]
    pub fn file_name(id: &VideoId) -> String {
        format!("{id}.{}", Self::EXTENSION)
    }

    #[must_use]
    pub fn path_for(&self, id: &VideoId) -> PathBuf {
        self.dir.join(Self::file_name(id))
    }

    /// Creates the cache directory and its parents.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created.
    pub async fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).await.map_err(Into::into)
    }

    /// Regular files in the cache directory. A missing directory is empty.
    async fn entries(&self) -> Result<Vec<Entry>> {
        let mut dir = match fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }

            entries.push(Entry {
                path: entry.path(),
                size: metadata.len(),
                modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            });
        }

        Ok(entries)
    }

    /// Total size of the cached files in bytes.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be read.
    pub async fn size(&self) -> Result<u64> {
        Ok(self.entries().await?.iter().map(|entry| entry.size).sum())
    }

    /// Deletes the least recently modified files until the cache fits its
    /// size limit. Returns the number of files deleted.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be read or a file cannot be
    /// deleted.
    pub async fn enforce_limit(&self) -> Result<usize> {
        let mut entries = self.entries().await?;
        let mut size: u64 = entries.iter().map(|entry| entry.size).sum();
        entries.sort_by_key(|entry| entry.modified);

        let mut deleted = 0;
        for entry in entries {
            if size <= self.maximum_size {
                break;
            }

            fs::remove_file(&entry.path).await?;
            debug!(
                "evicted {} ({} bytes) from cache",
                entry.path.display(),
                entry.size
            );
            size = size.saturating_sub(entry.size);
            deleted += 1;
        }

        Ok(deleted)
    }

    /// Deletes files older than the expiry time. Returns the number of files
    /// deleted.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be read or a file cannot be
    /// deleted.
    pub async fn delete_expired(&self) -> Result<usize> {
        let now = SystemTime::now();
        let mut deleted = 0;

        for entry in self.entries().await? {
            let age = now.duration_since(entry.modified).unwrap_or(Duration::ZERO);
            if age > self.expiry {
                fs::remove_file(&entry.path).await?;
                debug!("expired {} from cache", entry.path.display());
                deleted += 1;
            }
        }

        Ok(deleted)
    }
}
