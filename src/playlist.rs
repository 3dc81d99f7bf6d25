//! Expansion of a playlist into songs.
//!
//! Submitting a playlist queues up to 25 of its videos in playlist order.
//! Videos that are too long, unknown to the provider or carry a malformed
//! duration are skipped one by one; the rest still go in. Only failures of
//! the playlist lookups themselves abort the submission, and they do so
//! before anything is queued.
//!
//! All queued songs of a playlist share one skip-vote set, held in the
//! [`PlaylistTable`](crate::votes::PlaylistTable) until the last of them
//! leaves the queue.

use std::collections::HashMap;

use crate::{
    context::Context,
    duration::SongDuration,
    error::{Error, Result},
    id::{PlaylistId, VideoId},
    queue::Queue,
    resolver::{PlaylistEntry, VideoMetadata},
    song::Song,
    votes::VoteState,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Playlist {
    id: PlaylistId,
    title: String,
    accepted: usize,
    skipped: usize,
}

impl Playlist {
    /// Resolves the playlist and adds its acceptable items to `queue`.
    ///
    /// The playlist is returned even if none of its items were accepted.
    ///
    /// # Errors
    ///
    /// `InvalidCredentials` or `InvalidReference` if looking up the title,
    /// the items or their durations fails.
    pub async fn new<Q>(ctx: &Context, queue: &Q, submitter: &str, id: &PlaylistId) -> Result<Self>
    where
        Q: Queue + ?Sized,
    {
        let resolver = ctx.resolver();
        let title = resolver.playlist_title(id).await?;
        let entries = resolver.playlist_items(id).await?;

        let ids: Vec<_> = entries.iter().map(|entry| entry.id.clone()).collect();
        let durations = resolver.video_durations(&ids).await?;

        ctx.playlists().register(id, &title)?;
        let queued = Self::queue_entries(ctx, queue, submitter, id, entries, &durations);
        ctx.playlists().unpin(id)?;

        // An earlier submission of the same playlist may still have songs
        // queued that hold on to the votes.
        if !queue.contains_playlist(id) {
            ctx.playlists().release(id)?;
        }
        let (accepted, skipped) = queued?;

        info!(
            "{submitter} added playlist \"{title}\" ({id}): {accepted} songs queued, {skipped} skipped"
        );

        Ok(Self {
            id: id.clone(),
            title,
            accepted,
            skipped,
        })
    }

    /// Adds the acceptable entries to `queue`, returning how many were
    /// accepted and skipped.
    fn queue_entries<Q>(
        ctx: &Context,
        queue: &Q,
        submitter: &str,
        id: &PlaylistId,
        entries: Vec<PlaylistEntry>,
        durations: &HashMap<VideoId, Result<SongDuration>>,
    ) -> Result<(usize, usize)>
    where
        Q: Queue + ?Sized,
    {
        let mut accepted = 0;
        let mut skipped = 0;
        for entry in entries {
            let duration = match durations.get(&entry.id) {
                Some(Ok(duration)) => Ok(*duration),
                Some(Err(e)) => Err(Error::new(e.kind, e.error.to_string())),
                None => Err(Error::invalid_reference(format!(
                    "no duration for {}",
                    entry.id
                ))),
            };

            let song = duration.and_then(|duration| {
                let metadata = VideoMetadata {
                    title: entry.title,
                    thumbnail: entry.thumbnail,
                    duration,
                };
                Song::accept(ctx, submitter, entry.id.clone(), metadata, Some(id.clone()))
            });

            match song {
                Ok(song) => {
                    trace!("queueing {song} from playlist {id}");
                    queue.add_song(song);
                    accepted += 1;
                }
                Err(e) if e.is_item_rejection() => {
                    info!("skipping {} of playlist {id}: {e}", entry.id);
                    skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        Ok((accepted, skipped))
    }

    #[must_use]
    pub fn id(&self) -> &PlaylistId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Number of items that went into the queue.
    #[must_use]
    pub fn accepted(&self) -> usize {
        self.accepted
    }

    /// Number of items that were left out.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Records a vote by `voter` to skip the rest of this playlist.
    ///
    /// # Errors
    ///
    /// * `DuplicateVote` if `voter` has already voted
    /// * `InvalidArgument` if the playlist has been released
    pub fn add_skip(&self, ctx: &Context, voter: &str) -> Result<()> {
        ctx.playlists().add_skip(&self.id, voter)
    }

    /// Withdraws a vote by `voter`.
    ///
    /// # Errors
    ///
    /// Returns `NoSuchVote` if `voter` has not voted.
    pub fn remove_skip(&self, ctx: &Context, voter: &str) -> Result<()> {
        ctx.playlists().remove_skip(&self.id, voter)
    }

    /// Number of votes to skip the playlist.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the playlist table lock is poisoned.
    pub fn skips(&self, ctx: &Context) -> Result<usize> {
        ctx.playlists().votes(&self.id)
    }

    /// # Errors
    ///
    /// Returns `Internal` if the playlist table lock is poisoned.
    pub fn skip_reached(&self, ctx: &Context, listeners: usize) -> Result<bool> {
        let ratio = ctx.config().general.playlist_skip_ratio;
        ctx.playlists().skip_reached(&self.id, listeners, ratio)
    }

    /// Vote state against `listeners`, or `None` once released.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the playlist table lock is poisoned.
    pub fn vote_state(&self, ctx: &Context, listeners: usize) -> Result<Option<VoteState>> {
        let ratio = ctx.config().general.playlist_skip_ratio;
        ctx.playlists().state(&self.id, listeners, ratio)
    }

    /// Discards the playlist's vote set. Call once no queued song refers to
    /// the playlist anymore; a later submission starts with no votes.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the playlist table lock is poisoned.
    pub fn release(&self, ctx: &Context) -> Result<bool> {
        ctx.playlists().release(&self.id)
    }
}
