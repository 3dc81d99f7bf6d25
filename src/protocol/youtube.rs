//! YouTube Data API v3 response bodies.
//!
//! Only the fields djqueue uses are modelled. Extraction is best-effort:
//! every field defaults when it is missing or `null`, so a sparse response
//! yields empty strings instead of a parse failure. Whether an empty value
//! is acceptable is decided by the caller.
//!
//! ```json
//! {
//!     "pageInfo": { "totalResults": 2, "resultsPerPage": 25 },
//!     "items": [ ... ]
//! }
//! ```

use serde::Deserialize;
use serde_with::{serde_as, DefaultOnNull};

/// Endpoint names, relative to the API base URL.
pub const VIDEOS: &str = "videos";
pub const PLAYLISTS: &str = "playlists";
pub const PLAYLIST_ITEMS: &str = "playlistItems";

/// A page of results from any list endpoint.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    #[serde(default)]
    pub page_info: PageInfo,
    #[serde(default)]
    pub items: Vec<T>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageInfo {
    pub total_results: u64,
    pub results_per_page: u64,
}

/// An entry of the `videos` endpoint.
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Video {
    #[serde_as(as = "DefaultOnNull")]
    pub id: String,
    pub snippet: Snippet,
    pub content_details: ContentDetails,
}

/// An entry of the `playlists` endpoint.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Playlist {
    pub snippet: Snippet,
}

/// An entry of the `playlistItems` endpoint.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlaylistItem {
    pub snippet: Snippet,
}

#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Snippet {
    #[serde_as(as = "DefaultOnNull")]
    pub title: String,
    pub thumbnails: Thumbnails,

    /// Present on playlist items only.
    pub resource_id: ResourceId,
}

#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResourceId {
    #[serde_as(as = "DefaultOnNull")]
    pub video_id: String,
}

#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ContentDetails {
    /// ISO 8601 duration such as `PT4M13S`.
    #[serde_as(as = "DefaultOnNull")]
    pub duration: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Thumbnails {
    pub default: Option<Thumbnail>,
    pub medium: Option<Thumbnail>,
    pub high: Option<Thumbnail>,
}

#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Thumbnail {
    #[serde_as(as = "DefaultOnNull")]
    pub url: String,
}

impl Thumbnails {
    /// URL of the largest available thumbnail, or an empty string.
    #[must_use]
    pub fn best(&self) -> &str {
        [&self.high, &self.medium, &self.default]
            .into_iter()
            .flatten()
            .map(|thumbnail| thumbnail.url.as_str())
            .find(|url| !url.is_empty())
            .unwrap_or_default()
    }
}
