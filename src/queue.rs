//! The shared playback queue.
//!
//! [`Queue`] is the seam songs and playlists register through. Queue owners
//! implement it however they like; [`MemoryQueue`] is an in-process,
//! first-in first-out implementation that also takes care of skip votes
//! and releases playlist vote sets once their last song is gone.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use crate::{
    context::Context,
    error::{Error, Result},
    id::PlaylistId,
    song::Song,
};

pub trait Queue: Send + Sync {
    /// Appends `song` to the end of the queue.
    fn add_song(&self, song: Song);

    /// Called when the current song stops playing.
    fn on_song_finished(&self);

    /// Whether any queued song came from `playlist`.
    fn contains_playlist(&self, playlist: &PlaylistId) -> bool;
}

pub struct MemoryQueue {
    ctx: Arc<Context>,
    songs: Mutex<VecDeque<Song>>,
}

impl MemoryQueue {
    #[must_use]
    pub fn new(ctx: Arc<Context>) -> Self {
        Self {
            ctx,
            songs: Mutex::new(VecDeque::new()),
        }
    }

    #[must_use]
    pub fn context(&self) -> &Arc<Context> {
        &self.ctx
    }

    /// # Errors
    ///
    /// Returns `Internal` if the queue lock is poisoned.
    pub fn len(&self) -> Result<usize> {
        Ok(self.songs.lock()?.len())
    }

    /// # Errors
    ///
    /// Returns `Internal` if the queue lock is poisoned.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.songs.lock()?.is_empty())
    }

    /// The song at the head of the queue.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the queue lock is poisoned.
    pub fn current(&self) -> Result<Option<Song>> {
        Ok(self.songs.lock()?.front().cloned())
    }

    /// A snapshot of all queued songs in order.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the queue lock is poisoned.
    pub fn songs(&self) -> Result<Vec<Song>> {
        Ok(self.songs.lock()?.iter().cloned().collect())
    }

    /// Removes the song at `index`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if there is no song at `index`.
    pub fn remove(&self, index: usize) -> Result<Song> {
        let mut songs = self.songs.lock()?;
        let song = songs.remove(index).ok_or_else(|| {
            Error::invalid_argument(format!("no song at position {index} of {}", songs.len()))
        })?;

        self.release_orphan(&songs, song.playlist())?;
        Ok(song)
    }

    /// Exempts the song at `index` from vote skipping, or lifts the
    /// exemption.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if there is no song at `index`.
    pub fn set_dont_skip(&self, index: usize, dont_skip: bool) -> Result<()> {
        let mut songs = self.songs.lock()?;
        let len = songs.len();
        let song = songs.get_mut(index).ok_or_else(|| {
            Error::invalid_argument(format!("no song at position {index} of {len}"))
        })?;

        debug!("{song} may be skipped: {}", !dont_skip);
        song.set_dont_skip(dont_skip);
        Ok(())
    }

    /// Votes to skip the current song on behalf of `voter`. For a song from
    /// a playlist, the vote counts against the whole playlist.
    ///
    /// Returns whether the vote reached the threshold, in which case the
    /// song (or every queued song of its playlist) is removed.
    ///
    /// # Errors
    ///
    /// * `InvalidArgument` if the queue is empty
    /// * `DuplicateVote` if `voter` has already voted
    pub fn skip_current(&self, voter: &str, listeners: usize) -> Result<bool> {
        let mut songs = self.songs.lock()?;
        let song = songs
            .front_mut()
            .ok_or_else(|| Error::invalid_argument("queue is empty"))?;

        song.add_skip(&self.ctx, voter)?;
        if !song.skip_reached(&self.ctx, listeners)? {
            return Ok(false);
        }

        match song.playlist().cloned() {
            Some(playlist) => {
                info!("skipping playlist {playlist} by vote");
                self.remove_playlist(&mut songs, &playlist)?;
            }
            None => {
                if let Some(song) = songs.pop_front() {
                    info!("skipping {song} by vote");
                }
            }
        }

        Ok(true)
    }

    /// Votes to skip the playlist of the current song.
    ///
    /// # Errors
    ///
    /// * `InvalidArgument` if the queue is empty or the current song is not
    ///   from a playlist
    /// * `DuplicateVote` if `voter` has already voted
    pub fn skip_playlist(&self, voter: &str, listeners: usize) -> Result<bool> {
        let playlist = self
            .current()?
            .and_then(|song| song.playlist().cloned())
            .ok_or_else(|| Error::invalid_argument("current song is not from a playlist"))?;
        trace!("{voter} votes to skip playlist {playlist}");

        self.skip_current(voter, listeners)
    }

    /// Withdraws a vote by `voter` on the current song.
    ///
    /// # Errors
    ///
    /// * `InvalidArgument` if the queue is empty
    /// * `NoSuchVote` if `voter` has not voted
    pub fn withdraw_skip(&self, voter: &str) -> Result<()> {
        let mut songs = self.songs.lock()?;
        songs
            .front_mut()
            .ok_or_else(|| Error::invalid_argument("queue is empty"))?
            .remove_skip(&self.ctx, voter)
    }

    /// Empties the queue and releases every playlist vote set it held.
    /// Returns the number of songs removed.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if a lock is poisoned.
    pub fn clear(&self) -> Result<usize> {
        let mut songs = self.songs.lock()?;
        let removed = songs.len();

        for song in songs.drain(..) {
            if let Some(playlist) = song.playlist() {
                self.ctx.playlists().release(playlist)?;
            }
        }

        Ok(removed)
    }

    fn remove_playlist(&self, songs: &mut VecDeque<Song>, playlist: &PlaylistId) -> Result<()> {
        let before = songs.len();
        songs.retain(|song| song.playlist() != Some(playlist));
        debug!(
            "removed {} songs of playlist {playlist}",
            before - songs.len()
        );

        self.ctx.playlists().release(playlist)?;
        Ok(())
    }

    /// Releases the vote set of `playlist` if no queued song refers to it.
    fn release_orphan(&self, songs: &VecDeque<Song>, playlist: Option<&PlaylistId>) -> Result<()> {
        if let Some(playlist) = playlist {
            if !songs.iter().any(|song| song.playlist() == Some(playlist)) {
                self.ctx.playlists().release(playlist)?;
            }
        }
        Ok(())
    }
}

impl Queue for MemoryQueue {
    fn add_song(&self, song: Song) {
        match self.songs.lock() {
            Ok(mut songs) => songs.push_back(song),
            Err(e) => error!("could not queue {song}: {e}"),
        }
    }

    fn on_song_finished(&self) {
        let result = self.songs.lock().map_err(Error::from).and_then(|mut songs| {
            match songs.pop_front() {
                Some(song) => {
                    debug!("finished {song}");
                    self.release_orphan(&songs, song.playlist())
                }
                None => Ok(()),
            }
        });

        if let Err(e) = result {
            error!("could not advance queue: {e}");
        }
    }

    fn contains_playlist(&self, playlist: &PlaylistId) -> bool {
        match self.songs.lock() {
            Ok(songs) => songs.iter().any(|song| song.playlist() == Some(playlist)),
            Err(e) => {
                // Unknown contents count as referenced.
                error!("could not inspect queue: {e}");
                true
            }
        }
    }
}
