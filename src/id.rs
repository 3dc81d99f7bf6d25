//! Provider identifiers and submission links.
//!
//! Video and playlist IDs are opaque strings assigned by the provider. They
//! end up in request URLs and file names, so only the characters the provider
//! actually uses are accepted.
//!
//! # Example
//!
//! ```rust
//! use djqueue::id::Link;
//!
//! let link: Link = "https://www.youtube.com/watch?v=HYd9B6YvIHM".parse()?;
//! assert!(matches!(link, Link::Video(_)));
//! ```

use std::{fmt, str::FromStr, sync::LazyLock};

use regex_lite::Regex;

use crate::error::{Error, Result};

fn validate<'a>(kind: &str, s: &'a str) -> Result<&'a str> {
    if s.is_empty() {
        return Err(Error::invalid_argument(format!("{kind} ID is empty")));
    }

    if let Some(illegal) = s
        .chars()
        .find(|chr| !(chr.is_ascii_alphanumeric() || *chr == '-' || *chr == '_'))
    {
        return Err(Error::invalid_argument(format!(
            "{kind} ID \"{s}\" contains illegal character {illegal:?}"
        )));
    }

    Ok(s)
}

/// Identifier of a single playable video.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VideoId(String);

impl FromStr for VideoId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        validate("video", s).map(|id| Self(id.to_owned()))
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a playlist.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlaylistId(String);

impl FromStr for PlaylistId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        validate("playlist", s).map(|id| Self(id.to_owned()))
    }
}

impl AsRef<str> for PlaylistId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlaylistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a member submitted: one video or a whole playlist.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Link {
    Video(VideoId),
    Playlist(PlaylistId),
}

static WATCH_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://(?:www\.|m\.)?youtube\.com/watch\?(?:[^#]*&)?v=([\w-]+)")
        .expect("invalid watch URL pattern")
});

static SHORT_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://youtu\.be/([\w-]+)").expect("invalid short URL pattern")
});

static PLAYLIST_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://(?:www\.|m\.)?youtube\.com/playlist\?(?:[^#]*&)?list=([\w-]+)")
        .expect("invalid playlist URL pattern")
});

/// Parses a watch, short or playlist URL.
///
/// A watch URL that also carries a `list` parameter is a video submission:
/// the member pointed at one song of the playlist, not at the playlist.
impl FromStr for Link {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let capture = |re: &Regex| {
            re.captures(s)
                .and_then(|caps| caps.get(1))
                .map(|id| id.as_str())
        };

        if let Some(id) = capture(&WATCH_URL).or_else(|| capture(&SHORT_URL)) {
            return id.parse().map(Self::Video);
        }

        if let Some(id) = capture(&PLAYLIST_URL) {
            return id.parse().map(Self::Playlist);
        }

        Err(Error::invalid_argument(format!(
            "\"{s}\" is not a YouTube video or playlist link"
        )))
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video(id) => write!(f, "https://youtu.be/{id}"),
            Self::Playlist(id) => write!(f, "https://www.youtube.com/playlist?list={id}"),
        }
    }
}
