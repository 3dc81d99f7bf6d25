//! Seam to the audio output of the voice session.
//!
//! The queue does not decode or stream audio itself. A [`Player`] takes a
//! downloaded file and reports back through `on_finished` once playback
//! ends, so the queue can advance.

use std::path::Path;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Callback invoked exactly once when a song stops playing.
pub type OnFinished = Box<dyn FnOnce() + Send>;

pub trait Player: Send + Sync {
    /// Starts streaming the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns error if playback could not start. `on_finished` is then
    /// never invoked.
    fn play(&self, path: &Path, on_finished: OnFinished) -> Result<(), BoxError>;
}
