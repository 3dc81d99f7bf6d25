//! Parsing of the provider's compact duration format.
//!
//! The provider reports video lengths as ISO 8601 durations restricted to a
//! minutes and a seconds component, for example `PT4M13S`. Parsing is strict:
//! anything that does not have the `PT` prefix, an `M` marker and a trailing
//! `S` is rejected with [`ErrorKind::MalformedDuration`] rather than being
//! read as zero.
//!
//! Hours are not supported. `PT1H2M3S` is malformed, not 2 minutes and 3
//! seconds.
//!
//! [`ErrorKind::MalformedDuration`]: crate::error::ErrorKind::MalformedDuration

use std::{fmt, str::FromStr, time::Duration};

use crate::error::{Error, Result};

/// Length of a song as minutes and seconds.
///
/// Displays as `"<minutes>:<seconds>"` without zero-padding the seconds,
/// so 3 minutes and 5 seconds shows as `3:5`. Use [`padded`](Self::padded)
/// for the conventional `3:05`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SongDuration {
    minutes: u32,
    seconds: u32,
}

impl SongDuration {
    /// Prefix that every provider duration starts with.
    const PREFIX: &'static str = "PT";

    #[must_use]
    pub fn new(minutes: u32, seconds: u32) -> Self {
        Self { minutes, seconds }
    }

    #[must_use]
    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    #[must_use]
    pub fn seconds(&self) -> u32 {
        self.seconds
    }

    #[must_use]
    pub fn total_seconds(&self) -> u32 {
        self.minutes.saturating_mul(60).saturating_add(self.seconds)
    }

    #[must_use]
    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.total_seconds().into())
    }

    /// Renders as `m:ss`.
    #[must_use]
    pub fn padded(&self) -> String {
        format!("{}:{:02}", self.minutes, self.seconds)
    }

    fn component(value: &str, name: &str, input: &str) -> Result<u32> {
        if value.is_empty() {
            return Ok(0);
        }

        value.parse().map_err(|e| {
            Error::malformed_duration(format!("invalid {name} in duration \"{input}\": {e}"))
        })
    }
}

impl FromStr for SongDuration {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let rest = s
            .strip_prefix(Self::PREFIX)
            .ok_or_else(|| Error::malformed_duration(format!("duration \"{s}\" lacks prefix")))?;

        let (minutes, rest) = rest.split_once('M').ok_or_else(|| {
            Error::malformed_duration(format!("duration \"{s}\" lacks minutes marker"))
        })?;

        if minutes.contains('H') {
            return Err(Error::malformed_duration(format!(
                "duration \"{s}\" has an hours component, which is not supported"
            )));
        }

        let seconds = rest.strip_suffix('S').ok_or_else(|| {
            Error::malformed_duration(format!("duration \"{s}\" lacks seconds terminator"))
        })?;

        Ok(Self {
            minutes: Self::component(minutes, "minutes", s)?,
            seconds: Self::component(seconds, "seconds", s)?,
        })
    }
}

impl fmt::Display for SongDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.minutes, self.seconds)
    }
}
