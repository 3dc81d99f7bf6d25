//! Process-wide state shared by songs, playlists and the queue.

use crate::{
    cache::Cache,
    config::Config,
    download::Downloader,
    error::Result,
    resolver::Resolver,
    votes::PlaylistTable,
};

/// Everything a queue item needs besides itself.
///
/// One context lives for the whole session. It is shared by reference, or
/// behind an `Arc` when queue owners need to hold on to it.
pub struct Context {
    config: Config,
    resolver: Resolver,
    playlists: PlaylistTable,
    cache: Cache,
    downloader: Downloader,
}

impl Context {
    /// Builds the context for `config`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self> {
        let resolver = Resolver::new(&config)?;
        let cache = Cache::new(&config);
        let downloader = Downloader::new(&config);

        debug!(
            "cache at {} ({})",
            cache.dir().display(),
            if cache.is_enabled() { "enabled" } else { "disabled" }
        );

        Ok(Self {
            config,
            resolver,
            playlists: PlaylistTable::new(),
            cache,
            downloader,
        })
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    #[must_use]
    pub fn playlists(&self) -> &PlaylistTable {
        &self.playlists
    }

    #[must_use]
    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    #[must_use]
    pub fn downloader(&self) -> &Downloader {
        &self.downloader
    }

    /// Tears the context down. Returns the number of playlist vote sets that
    /// were never released.
    pub fn shutdown(self) -> usize {
        match self.playlists.ids() {
            Ok(ids) => {
                for id in &ids {
                    warn!("vote set of playlist {id} was never released");
                }
                ids.len()
            }
            Err(e) => {
                error!("could not inspect playlist vote sets: {e}");
                0
            }
        }
    }
}
