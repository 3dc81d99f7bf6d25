//! Metadata lookups against the provider.
//!
//! Each lookup is one HTTP round-trip. Response statuses are classified as:
//! * 200 - success, the body is parsed
//! * 403 - [`InvalidCredentials`](crate::error::ErrorKind::InvalidCredentials)
//! * anything else - [`InvalidReference`](crate::error::ErrorKind::InvalidReference)
//!
//! Transport failures keep their own kinds (see [`crate::error`]).
//!
//! # Durations of playlist items
//!
//! The playlist listing does not include durations. Instead of one extra
//! lookup per item, [`Resolver::video_durations`] fetches the durations of
//! all listed items in a single `videos` request. Its contract: every
//! requested ID has an entry in the returned map; IDs the provider leaves
//! out map to `InvalidReference`, unparsable durations to
//! `MalformedDuration`; a failure of the request itself fails the call.

use std::collections::HashMap;

use reqwest::StatusCode;
use url::Url;

use crate::{
    api_key::ApiKey,
    config::Config,
    duration::SongDuration,
    error::{Error, Result},
    http::Client as HttpClient,
    id::{PlaylistId, VideoId},
    protocol::{
        self,
        youtube::{self, ListResponse},
    },
};

/// Metadata of a single video.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoMetadata {
    pub title: String,
    pub thumbnail: String,
    pub duration: SongDuration,
}

/// One listed item of a playlist, before its duration is known.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlaylistEntry {
    pub title: String,
    pub id: VideoId,
    pub thumbnail: String,
}

pub struct Resolver {
    http_client: HttpClient,
    api_url: Url,
    api_key: ApiKey,
}

impl Resolver {
    /// Maximum number of items taken from a playlist.
    pub const PLAYLIST_ITEMS_MAX: usize = 25;

    /// Maximum number of IDs the `videos` endpoint accepts per request.
    const VIDEOS_PER_REQUEST: usize = 50;

    /// Creates a resolver for the API at `config.api_url`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self> {
        // Endpoints are joined onto the base, which only appends when the
        // base path ends with a slash.
        let mut api_url = config.api_url.clone();
        if !api_url.path().ends_with('/') {
            let path = format!("{}/", api_url.path());
            api_url.set_path(&path);
        }

        Ok(Self {
            http_client: HttpClient::new(config)?,
            api_url,
            api_key: config.api_key.clone(),
        })
    }

    async fn request<T>(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<ListResponse<T>>
    where
        T: std::fmt::Debug + for<'de> serde::Deserialize<'de> + Default,
    {
        let mut url = self.api_url.join(endpoint)?;
        url.query_pairs_mut()
            .extend_pairs(query)
            .append_pair("key", &self.api_key);

        trace!("GET {endpoint} {query:?}");
        let request = self.http_client.get(url);
        let response = self.http_client.execute(request).await?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::FORBIDDEN => {
                return Err(Error::invalid_credentials(format!(
                    "{endpoint} returned {}",
                    StatusCode::FORBIDDEN
                )));
            }
            status => {
                return Err(Error::invalid_reference(format!(
                    "{endpoint} returned {status} for {query:?}"
                )));
            }
        }

        let body = response.text().await?;
        protocol::json(&body, endpoint)
    }

    /// Resolves the title, thumbnail and duration of a video.
    ///
    /// # Errors
    ///
    /// * `InvalidCredentials` or `InvalidReference` per the response status
    /// * `InvalidReference` if the provider knows no video with this ID
    /// * `MalformedDuration` if the duration does not parse
    pub async fn video(&self, id: &VideoId) -> Result<VideoMetadata> {
        let response = self
            .request::<youtube::Video>(
                youtube::VIDEOS,
                &[("part", "snippet,contentDetails"), ("id", id.as_ref())],
            )
            .await?;

        let video = response
            .items
            .into_iter()
            .next()
            .ok_or_else(|| Error::invalid_reference(format!("no video found with ID {id}")))?;

        Ok(VideoMetadata {
            thumbnail: video.snippet.thumbnails.best().to_owned(),
            title: video.snippet.title,
            duration: video.content_details.duration.parse()?,
        })
    }

    /// Resolves the durations of `ids` in as few requests as the provider
    /// allows. See the module documentation for the contract.
    ///
    /// # Errors
    ///
    /// Returns error if any request fails as a whole.
    pub async fn video_durations(
        &self,
        ids: &[VideoId],
    ) -> Result<HashMap<VideoId, Result<SongDuration>>> {
        let mut durations = HashMap::with_capacity(ids.len());

        for chunk in ids.chunks(Self::VIDEOS_PER_REQUEST) {
            let joined = chunk
                .iter()
                .map(AsRef::as_ref)
                .collect::<Vec<_>>()
                .join(",");

            let response = self
                .request::<youtube::Video>(
                    youtube::VIDEOS,
                    &[("part", "contentDetails"), ("id", &joined)],
                )
                .await?;

            for video in response.items {
                match video.id.parse::<VideoId>() {
                    Ok(id) if chunk.contains(&id) => {
                        durations.insert(id, video.content_details.duration.parse());
                    }
                    _ => warn!("ignoring unrequested video \"{}\" in response", video.id),
                }
            }
        }

        for id in ids {
            durations.entry(id.clone()).or_insert_with(|| {
                Err(Error::invalid_reference(format!(
                    "no video found with ID {id}"
                )))
            });
        }

        Ok(durations)
    }

    /// Resolves the title of a playlist.
    ///
    /// # Errors
    ///
    /// * `InvalidCredentials` or `InvalidReference` per the response status
    /// * `InvalidReference` if the provider knows no playlist with this ID
    pub async fn playlist_title(&self, id: &PlaylistId) -> Result<String> {
        let response = self
            .request::<youtube::Playlist>(
                youtube::PLAYLISTS,
                &[("part", "snippet"), ("id", id.as_ref())],
            )
            .await?;

        response
            .items
            .into_iter()
            .next()
            .map(|playlist| playlist.snippet.title)
            .ok_or_else(|| Error::invalid_reference(format!("no playlist found with ID {id}")))
    }

    /// Lists up to [`PLAYLIST_ITEMS_MAX`](Self::PLAYLIST_ITEMS_MAX) items of a
    /// playlist in provider order.
    ///
    /// Entries without a usable video ID are left out.
    ///
    /// # Errors
    ///
    /// `InvalidCredentials` or `InvalidReference` per the response status.
    pub async fn playlist_items(&self, id: &PlaylistId) -> Result<Vec<PlaylistEntry>> {
        let max_results = Self::PLAYLIST_ITEMS_MAX.to_string();
        let response = self
            .request::<youtube::PlaylistItem>(
                youtube::PLAYLIST_ITEMS,
                &[
                    ("part", "snippet"),
                    ("maxResults", &max_results),
                    ("playlistId", id.as_ref()),
                ],
            )
            .await?;

        let count = usize::try_from(response.page_info.total_results)
            .unwrap_or(usize::MAX)
            .min(Self::PLAYLIST_ITEMS_MAX);

        let entries = response
            .items
            .into_iter()
            .take(count)
            .filter_map(|item| {
                let snippet = item.snippet;
                match snippet.resource_id.video_id.parse::<VideoId>() {
                    Ok(video_id) => Some(PlaylistEntry {
                        thumbnail: snippet.thumbnails.best().to_owned(),
                        title: snippet.title,
                        id: video_id,
                    }),
                    Err(e) => {
                        warn!("skipping item \"{}\" of playlist {id}: {e}", snippet.title);
                        None
                    }
                }
            })
            .collect();

        Ok(entries)
    }
}
