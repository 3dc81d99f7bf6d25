//! Runtime configuration.
//!
//! Settings are read from a TOML document ([`Settings`]) and combined with
//! the provider API key into an immutable [`Config`]. Every setting has a
//! default, so an empty document is valid.
//!
//! ```toml
//! [general]
//! max_song_duration = 0      # seconds, 0 = unlimited
//! skip_ratio = 0.5
//! playlist_skip_ratio = 0.5
//!
//! [cache]
//! enabled = false
//! maximum_size = 512         # MiB
//! expire_time = 24           # hours
//!
//! [downloader]
//! program = "youtube-dl"
//! format = "m4a"
//! ```

use std::{fs, path::PathBuf, time::Duration};

use serde::Deserialize;
use url::Url;

use crate::{
    api_key::ApiKey,
    duration::SongDuration,
    error::{Error, Result},
};

/// Settings as stored on disk.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub general: General,
    pub cache: CacheSettings,
    pub downloader: DownloaderSettings,
}

/// Queue admission and voting policy.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct General {
    /// Maximum song duration in seconds. Zero means unlimited.
    pub max_song_duration: u32,

    /// Fraction of listeners that must vote to skip a single song.
    pub skip_ratio: f32,

    /// Fraction of listeners that must vote to skip a whole playlist.
    pub playlist_skip_ratio: f32,
}

impl Default for General {
    fn default() -> Self {
        Self {
            max_song_duration: 0,
            skip_ratio: 0.5,
            playlist_skip_ratio: 0.5,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheSettings {
    /// Keep downloaded songs after they have been played.
    pub enabled: bool,

    /// Maximum size of the cache directory in MiB.
    pub maximum_size: u64,

    /// Hours after which a cached song is considered stale.
    pub expire_time: u64,

    /// Cache directory. Defaults to `~/.mumbledj/songs`.
    pub directory: Option<PathBuf>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            maximum_size: 512,
            expire_time: 24,
            directory: None,
        }
    }
}

impl CacheSettings {
    #[must_use]
    pub fn maximum_bytes(&self) -> u64 {
        self.maximum_size.saturating_mul(1024 * 1024)
    }

    #[must_use]
    pub fn expiry(&self) -> Duration {
        Duration::from_secs(self.expire_time.saturating_mul(60 * 60))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DownloaderSettings {
    /// Download utility to invoke.
    pub program: String,

    /// Audio format requested from the download utility.
    pub format: String,
}

impl Default for DownloaderSettings {
    fn default() -> Self {
        Self {
            program: String::from("youtube-dl"),
            format: String::from("m4a"),
        }
    }
}

impl Settings {
    /// Settings files are tiny; anything larger is not one.
    const MAX_FILE_SIZE: u64 = 64 * 1024;

    /// Reads settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the file is too large, unreadable, or
    /// not valid TOML for these settings.
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        // Prevent out-of-memory condition: settings files should be small.
        let file_size = fs::metadata(&path)?.len();
        if file_size > Self::MAX_FILE_SIZE {
            return Err(Error::invalid_argument(format!(
                "{} is too large ({file_size} bytes)",
                path.display()
            )));
        }

        let contents = fs::read_to_string(&path)?;
        toml::from_str(&contents).map_err(|e| {
            Error::invalid_argument(format!("{} format is invalid: {e}", path.display()))
        })
    }
}

/// Resolved runtime configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub app_name: String,
    pub app_version: String,
    pub user_agent: String,

    /// Base URL of the provider's metadata API.
    pub api_url: Url,
    pub api_key: ApiKey,

    pub general: General,
    pub cache: CacheSettings,
    pub downloader: DownloaderSettings,
}

impl Config {
    /// Base URL of the YouTube Data API.
    pub const API_URL: &'static str = "https://www.googleapis.com/youtube/v3/";

    /// Combines `settings` with the API key.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if a skip ratio is not a number between 0
    /// and 1, or if the downloader program is empty.
    pub fn new(api_key: ApiKey, settings: Settings) -> Result<Self> {
        let Settings {
            general,
            cache,
            downloader,
        } = settings;

        for (name, ratio) in [
            ("skip_ratio", general.skip_ratio),
            ("playlist_skip_ratio", general.playlist_skip_ratio),
        ] {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(Error::invalid_argument(format!(
                    "{name} must be between 0 and 1 but is {ratio}"
                )));
            }
        }

        if downloader.program.trim().is_empty() {
            return Err(Error::invalid_argument("downloader program is empty"));
        }

        let app_name = env!("CARGO_PKG_NAME").to_owned();
        let app_version = env!("CARGO_PKG_VERSION").to_owned();

        let os_name = match std::env::consts::OS {
            "macos" => "osx",
            other => other,
        };
        let os_version = sysinfo::System::os_version().unwrap_or_else(|| String::from("0"));
        let user_agent = format!("{app_name}/{app_version} (Rust; {os_name}/{os_version})");
        trace!("user agent: {user_agent}");

        Ok(Self {
            app_name,
            app_version,
            user_agent,
            api_url: Url::parse(Self::API_URL)?,
            api_key,
            general,
            cache,
            downloader,
        })
    }

    /// Whether a song of `duration` may enter the queue.
    #[must_use]
    pub fn permits(&self, duration: &SongDuration) -> bool {
        self.general.max_song_duration == 0
            || duration.total_seconds() <= self.general.max_song_duration
    }

    /// The cache directory, falling back to `~/.mumbledj/songs`.
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.cache
            .directory
            .clone()
            .unwrap_or_else(|| default_cache_dir(dirs::home_dir()))
    }
}

/// `.mumbledj/songs` under `home`, or under the system temporary directory
/// when there is no home directory.
fn default_cache_dir(home: Option<PathBuf>) -> PathBuf {
    let base = home.unwrap_or_else(|| {
        let temp = std::env::temp_dir();
        warn!(
            "no home directory found, caching songs under {}",
            temp.display()
        );
        temp
    });

    base.join(".mumbledj").join("songs")
}
