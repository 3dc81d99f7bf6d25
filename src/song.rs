//! A single queued video.
//!
//! A song is created from a video ID, resolved against the provider and
//! checked against the duration limit before it is handed to the queue.
//! Songs that came from a playlist share the playlist's skip votes instead
//! of carrying their own.

use std::fmt;

use crate::{
    announcement::{Announcement, Notifier},
    cache::Cache,
    context::Context,
    duration::SongDuration,
    error::{Error, Result},
    id::{PlaylistId, VideoId},
    player::Player,
    queue::Queue,
    resolver::VideoMetadata,
    votes::{VoteState, Votes},
};

#[derive(Clone, Debug)]
pub struct Song {
    id: VideoId,
    submitter: String,
    title: String,
    thumbnail: String,
    duration: SongDuration,
    playlist: Option<PlaylistId>,
    skippers: Votes,
    dont_skip: bool,
}

impl Song {
    /// Resolves `id`, checks it against the duration limit and adds it to
    /// `queue`.
    ///
    /// # Errors
    ///
    /// * `InvalidCredentials` or `InvalidReference` if the lookup fails
    /// * `MalformedDuration` if the duration does not parse
    /// * `DurationExceeded` if the song is longer than allowed
    /// * `InvalidArgument` if `playlist` is not registered
    ///
    /// On error nothing is added to the queue.
    pub async fn new<Q>(
        ctx: &Context,
        queue: &Q,
        submitter: &str,
        id: &VideoId,
        playlist: Option<&PlaylistId>,
    ) -> Result<Self>
    where
        Q: Queue + ?Sized,
    {
        if let Some(playlist) = playlist {
            if !ctx.playlists().contains(playlist)? {
                return Err(Error::invalid_argument(format!(
                    "playlist {playlist} is not registered"
                )));
            }
        }

        let metadata = ctx.resolver().video(id).await?;
        let song = Self::accept(ctx, submitter, id.clone(), metadata, playlist.cloned())?;

        queue.add_song(song.clone());
        info!("{submitter} added {song}");

        Ok(song)
    }

    /// Builds a song from metadata that is already resolved.
    pub(crate) fn accept(
        ctx: &Context,
        submitter: &str,
        id: VideoId,
        metadata: VideoMetadata,
        playlist: Option<PlaylistId>,
    ) -> Result<Self> {
        if !ctx.config().permits(&metadata.duration) {
            return Err(Error::duration_exceeded(format!(
                "{id} lasts {} but at most {} seconds are allowed",
                metadata.duration,
                ctx.config().general.max_song_duration
            )));
        }

        Ok(Self {
            id,
            submitter: submitter.to_owned(),
            title: metadata.title,
            thumbnail: metadata.thumbnail,
            duration: metadata.duration,
            playlist,
            skippers: Votes::new(),
            dont_skip: false,
        })
    }

    #[must_use]
    pub fn id(&self) -> &VideoId {
        &self.id
    }

    #[must_use]
    pub fn submitter(&self) -> &str {
        &self.submitter
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn thumbnail(&self) -> &str {
        &self.thumbnail
    }

    #[must_use]
    pub fn duration(&self) -> SongDuration {
        self.duration
    }

    /// The playlist this song was queued from, if any.
    #[must_use]
    pub fn playlist(&self) -> Option<&PlaylistId> {
        self.playlist.as_ref()
    }

    /// Title of the owning playlist while it is still registered.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the playlist table lock is poisoned.
    pub fn playlist_title(&self, ctx: &Context) -> Result<Option<String>> {
        match &self.playlist {
            Some(id) => ctx.playlists().title(id),
            None => Ok(None),
        }
    }

    #[must_use]
    pub fn filename(&self) -> String {
        Cache::file_name(&self.id)
    }

    #[must_use]
    pub fn dont_skip(&self) -> bool {
        self.dont_skip
    }

    /// Exempts the song from vote skipping, or lifts the exemption.
    pub fn set_dont_skip(&mut self, dont_skip: bool) {
        self.dont_skip = dont_skip;
    }

    fn skip_ratio(&self, ctx: &Context) -> f32 {
        let general = &ctx.config().general;
        if self.playlist.is_some() {
            general.playlist_skip_ratio
        } else {
            general.skip_ratio
        }
    }

    /// Records a vote by `voter` to skip this song, or its playlist if it
    /// has one.
    ///
    /// # Errors
    ///
    /// * `DuplicateVote` if `voter` has already voted
    /// * `InvalidArgument` if the playlist has been released
    pub fn add_skip(&mut self, ctx: &Context, voter: &str) -> Result<()> {
        match &self.playlist {
            Some(id) => ctx.playlists().add_skip(id, voter),
            None => self.skippers.add(voter),
        }
    }

    /// Withdraws a vote by `voter`.
    ///
    /// # Errors
    ///
    /// Returns `NoSuchVote` if `voter` has not voted.
    pub fn remove_skip(&mut self, ctx: &Context, voter: &str) -> Result<()> {
        match &self.playlist {
            Some(id) => ctx.playlists().remove_skip(id, voter),
            None => self.skippers.remove(voter),
        }
    }

    /// Number of votes to skip this song.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the playlist table lock is poisoned.
    pub fn skips(&self, ctx: &Context) -> Result<usize> {
        match &self.playlist {
            Some(id) => ctx.playlists().votes(id),
            None => Ok(self.skippers.len()),
        }
    }

    /// Whether enough of `listeners` voted to skip. Never true for a song
    /// exempt from skipping.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the playlist table lock is poisoned.
    pub fn skip_reached(&self, ctx: &Context, listeners: usize) -> Result<bool> {
        if self.dont_skip {
            return Ok(false);
        }

        let ratio = self.skip_ratio(ctx);
        match &self.playlist {
            Some(id) => ctx.playlists().skip_reached(id, listeners, ratio),
            None => Ok(self.skippers.skip_reached(listeners, ratio)),
        }
    }

    /// Vote state against `listeners`. A song whose playlist was released
    /// counts as clean.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the playlist table lock is poisoned.
    pub fn vote_state(&self, ctx: &Context, listeners: usize) -> Result<VoteState> {
        let ratio = self.skip_ratio(ctx);
        let state = match &self.playlist {
            Some(id) => ctx
                .playlists()
                .state(id, listeners, ratio)?
                .unwrap_or(VoteState::Clean),
            None => self.skippers.state(listeners, ratio),
        };

        if self.dont_skip && state == VoteState::ThresholdReached {
            return Ok(VoteState::PartiallyVoted);
        }
        Ok(state)
    }

    /// Downloads the song into the cache directory unless it is already
    /// there. With caching enabled, the cache is trimmed afterwards.
    ///
    /// # Errors
    ///
    /// Returns `DownloadFailed` if the download utility fails.
    pub async fn download(&self, ctx: &Context) -> Result<()> {
        let cache = ctx.cache();
        let path = cache.path_for(&self.id);

        if tokio::fs::try_exists(&path).await? {
            debug!("{} is already downloaded", self.id);
            return Ok(());
        }

        cache.ensure_dir().await?;
        ctx.downloader().fetch(&self.id, &path).await?;

        if cache.is_enabled() {
            match cache.enforce_limit().await {
                Ok(0) => {}
                Ok(n) => debug!("evicted {n} songs from cache"),
                Err(e) => warn!("could not trim cache: {e}"),
            }
        }

        Ok(())
    }

    /// Starts playback of the downloaded file and announces the song.
    /// `on_finished` is passed to the player and runs when playback ends.
    ///
    /// # Errors
    ///
    /// Returns `PlaybackFailed` if the player cannot start; nothing is
    /// announced then.
    pub fn play<P, N, F>(
        &self,
        ctx: &Context,
        player: &P,
        notifier: &N,
        on_finished: F,
    ) -> Result<Announcement>
    where
        P: Player + ?Sized,
        N: Notifier + ?Sized,
        F: FnOnce() + Send + 'static,
    {
        let path = ctx.cache().path_for(&self.id);
        player
            .play(&path, Box::new(on_finished))
            .map_err(|e| Error::playback_failed(format!("{}: {e}", self.id)))?;

        let announcement = self.announcement(ctx)?;
        notifier.announce(&announcement);
        Ok(announcement)
    }

    /// The announcement made when this song starts.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the playlist table lock is poisoned.
    pub fn announcement(&self, ctx: &Context) -> Result<Announcement> {
        Ok(Announcement {
            thumbnail: self.thumbnail.clone(),
            id: self.id.to_string(),
            title: self.title.clone(),
            duration: self.duration.to_string(),
            submitter: self.submitter.clone(),
            playlist: self.playlist_title(ctx)?,
        })
    }

    /// Deletes the downloaded file, unless caching is enabled. A file that
    /// is already gone is not an error.
    ///
    /// # Errors
    ///
    /// Returns `DeleteFailed` if the file exists but cannot be deleted.
    pub async fn delete(&self, ctx: &Context) -> Result<()> {
        if ctx.cache().is_enabled() {
            return Ok(());
        }

        let path = ctx.cache().path_for(&self.id);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!("deleted {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::delete_failed(format!("{}: {e}", path.display()))),
        }
    }
}

impl fmt::Display for Song {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" ({}, {})", self.title, self.id, self.duration)
    }
}
