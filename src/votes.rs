//! Skip-vote accounting.
//!
//! A voteable unit (a song, or a playlist shared by several songs) holds a
//! set of voter names. A voter counts at most once per unit. Whether the
//! unit should be skipped is computed on demand against the number of
//! listeners present at that moment, so it follows people joining and
//! leaving without any bookkeeping:
//!
//! ```text
//! votes / listeners >= ratio
//! ```
//!
//! With no listeners the threshold is never reached.
//!
//! Song vote sets are owned by their song. Playlist vote sets live in the
//! process-wide [`PlaylistTable`], keyed by playlist ID, because songs of the
//! same playlist may be voted on from different tasks.

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use crate::{
    error::{Error, Result},
    id::PlaylistId,
};

/// Where a voteable unit stands relative to its threshold.
///
/// A released playlist has no state at all: its vote set is gone.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum VoteState {
    /// Nobody has voted.
    Clean,
    /// Some voted, but not enough.
    PartiallyVoted,
    /// Enough listeners voted to skip.
    ThresholdReached,
}

/// The set of voters that want to skip one unit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Votes(HashSet<String>);

impl Votes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a vote by `voter`.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateVote` if `voter` has already voted. The set is
    /// left unchanged.
    pub fn add(&mut self, voter: &str) -> Result<()> {
        if self.0.contains(voter) {
            return Err(Error::duplicate_vote(format!(
                "{voter} has already voted to skip"
            )));
        }

        self.0.insert(voter.to_owned());
        Ok(())
    }

    /// Withdraws the vote of `voter`.
    ///
    /// # Errors
    ///
    /// Returns `NoSuchVote` if `voter` has not voted.
    pub fn remove(&mut self, voter: &str) -> Result<()> {
        if self.0.remove(voter) {
            Ok(())
        } else {
            Err(Error::no_such_vote(format!("{voter} has not voted to skip")))
        }
    }

    #[must_use]
    pub fn contains(&self, voter: &str) -> bool {
        self.0.contains(voter)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Whether at least `ratio` of `listeners` have voted.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn skip_reached(&self, listeners: usize, ratio: f32) -> bool {
        if listeners == 0 {
            return false;
        }

        self.0.len() as f32 / listeners as f32 >= ratio
    }

    #[must_use]
    pub fn state(&self, listeners: usize, ratio: f32) -> VoteState {
        if self.is_empty() {
            VoteState::Clean
        } else if self.skip_reached(listeners, ratio) {
            VoteState::ThresholdReached
        } else {
            VoteState::PartiallyVoted
        }
    }
}

#[derive(Clone, Debug, Default)]
struct PlaylistRecord {
    title: String,
    votes: Votes,
    /// Submissions that registered the playlist and have not unpinned it.
    pending: usize,
}

/// Titles and shared vote sets of the playlists that have songs queued.
///
/// A record must be [released](Self::release) once the last song of its
/// playlist leaves the queue. Until then it stays for the life of the table.
///
/// A submission [registers](Self::register) the playlist before queueing
/// its songs and [unpins](Self::unpin) it afterwards. While pinned, a
/// release only clears the votes so the songs being queued still find
/// their record.
#[derive(Debug, Default)]
pub struct PlaylistTable {
    playlists: Mutex<HashMap<PlaylistId, PlaylistRecord>>,
}

impl PlaylistTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers and pins a playlist, keeping any votes already cast on it.
    /// Every call must be paired with [`unpin`](Self::unpin).
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the table lock is poisoned.
    pub fn register(&self, id: &PlaylistId, title: &str) -> Result<()> {
        let mut playlists = self.playlists.lock()?;
        let record = playlists.entry(id.clone()).or_default();
        record.title = title.to_owned();
        record.pending += 1;
        Ok(())
    }

    /// Drops one pin taken by [`register`](Self::register). The record stays
    /// until it is released.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the table lock is poisoned.
    pub fn unpin(&self, id: &PlaylistId) -> Result<()> {
        let mut playlists = self.playlists.lock()?;
        if let Some(record) = playlists.get_mut(id) {
            record.pending = record.pending.saturating_sub(1);
        }
        Ok(())
    }

    /// Title of a registered playlist.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the table lock is poisoned.
    pub fn title(&self, id: &PlaylistId) -> Result<Option<String>> {
        let playlists = self.playlists.lock()?;
        Ok(playlists.get(id).map(|record| record.title.clone()))
    }

    /// Whether the playlist still has a record.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the table lock is poisoned.
    pub fn contains(&self, id: &PlaylistId) -> Result<bool> {
        Ok(self.playlists.lock()?.contains_key(id))
    }

    /// Records a vote to skip the playlist.
    ///
    /// # Errors
    ///
    /// * `DuplicateVote` if `voter` already voted on this playlist
    /// * `InvalidArgument` if the playlist is not registered
    pub fn add_skip(&self, id: &PlaylistId, voter: &str) -> Result<()> {
        let mut playlists = self.playlists.lock()?;
        match playlists.get_mut(id) {
            Some(record) => record.votes.add(voter),
            None => Err(Error::invalid_argument(format!(
                "playlist {id} is not registered"
            ))),
        }
    }

    /// Withdraws a vote to skip the playlist.
    ///
    /// # Errors
    ///
    /// Returns `NoSuchVote` if `voter` did not vote on this playlist.
    pub fn remove_skip(&self, id: &PlaylistId, voter: &str) -> Result<()> {
        let mut playlists = self.playlists.lock()?;
        match playlists.get_mut(id) {
            Some(record) => record.votes.remove(voter),
            None => Err(Error::no_such_vote(format!(
                "{voter} has not voted to skip playlist {id}"
            ))),
        }
    }

    /// Number of votes on the playlist; zero once released.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the table lock is poisoned.
    pub fn votes(&self, id: &PlaylistId) -> Result<usize> {
        let playlists = self.playlists.lock()?;
        Ok(playlists.get(id).map_or(0, |record| record.votes.len()))
    }

    /// Whether at least `ratio` of `listeners` voted to skip the playlist.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the table lock is poisoned.
    pub fn skip_reached(&self, id: &PlaylistId, listeners: usize, ratio: f32) -> Result<bool> {
        let playlists = self.playlists.lock()?;
        Ok(playlists
            .get(id)
            .is_some_and(|record| record.votes.skip_reached(listeners, ratio)))
    }

    /// Vote state of the playlist, or `None` once it has been released.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the table lock is poisoned.
    pub fn state(&self, id: &PlaylistId, listeners: usize, ratio: f32) -> Result<Option<VoteState>> {
        let playlists = self.playlists.lock()?;
        Ok(playlists
            .get(id)
            .map(|record| record.votes.state(listeners, ratio)))
    }

    /// Discards the playlist's record and its votes. Returns whether there
    /// was a record to discard.
    ///
    /// A pinned record is kept with its votes cleared, and `false` is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the table lock is poisoned.
    pub fn release(&self, id: &PlaylistId) -> Result<bool> {
        let mut playlists = self.playlists.lock()?;
        match playlists.get_mut(id) {
            Some(record) if record.pending > 0 => {
                debug!("playlist {id} is being submitted, clearing its votes only");
                record.votes = Votes::new();
                Ok(false)
            }
            Some(_) => {
                playlists.remove(id);
                debug!("released vote set of playlist {id}");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// IDs of all playlists that still have a record.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the table lock is poisoned.
    pub fn ids(&self) -> Result<Vec<PlaylistId>> {
        Ok(self.playlists.lock()?.keys().cloned().collect())
    }
}
