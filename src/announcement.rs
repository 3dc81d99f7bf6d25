//! Playback-start announcements.
//!
//! When a song starts, the session is told what is playing. This module
//! produces the structured payload; how it is rendered (HTML table, plain
//! text, embed) is up to the chat transport behind [`Notifier`].

use std::fmt;

use serde::Serialize;

/// What is playing, and who asked for it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub thumbnail: String,
    pub id: String,
    pub title: String,
    pub duration: String,
    pub submitter: String,

    /// Title of the playlist the song came from, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playlist: Option<String>,
}

impl Announcement {
    /// Short link to the video.
    #[must_use]
    pub fn url(&self) -> String {
        format!("https://youtu.be/{}", self.id)
    }
}

impl fmt::Display for Announcement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) <{}>, added by {}",
            self.title,
            self.duration,
            self.url(),
            self.submitter
        )?;

        if let Some(playlist) = &self.playlist {
            write!(f, " from playlist \"{playlist}\"")?;
        }

        Ok(())
    }
}

/// Chat transport that delivers announcements to the session.
pub trait Notifier: Send + Sync {
    fn announce(&self, announcement: &Announcement);
}

/// Writes announcements to the log.
#[derive(Copy, Clone, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn announce(&self, announcement: &Announcement) {
        info!("now playing: {announcement}");
    }
}
