//! Error handling for djqueue.
//!
//! Every failure is scoped to the one submission, vote or playback request
//! that triggered it. Errors carry a category ([`ErrorKind`]) so callers can
//! react to the condition without matching on message text, plus the
//! underlying error for display and logging.
//!
//! # Error Categories
//!
//! * Provider lookups: [`InvalidCredentials`](ErrorKind::InvalidCredentials),
//!   [`InvalidReference`](ErrorKind::InvalidReference)
//! * Admission: [`MalformedDuration`](ErrorKind::MalformedDuration),
//!   [`DurationExceeded`](ErrorKind::DurationExceeded)
//! * Voting: [`DuplicateVote`](ErrorKind::DuplicateVote),
//!   [`NoSuchVote`](ErrorKind::NoSuchVote)
//! * Media handling: [`DownloadFailed`](ErrorKind::DownloadFailed),
//!   [`DeleteFailed`](ErrorKind::DeleteFailed),
//!   [`PlaybackFailed`](ErrorKind::PlaybackFailed)
//! * Everything else: transport, configuration and internal failures
//!
//! # Example
//!
//! ```rust
//! use djqueue::error::{Error, ErrorKind, Result};
//!
//! fn vote(already_voted: bool) -> Result<()> {
//!     if already_voted {
//!         return Err(Error::duplicate_vote("alice has already voted"));
//!     }
//!     Ok(())
//! }
//!
//! assert_eq!(vote(true).unwrap_err().kind, ErrorKind::DuplicateVote);
//! ```

#![allow(clippy::enum_glob_use)]

use std::fmt;
use thiserror::Error;

/// Main error type combining error kind and details.
#[derive(Debug)]
pub struct Error {
    /// Classification of the error
    pub kind: ErrorKind,

    /// Details of the underlying error
    pub error: Box<dyn std::error::Error + Send + Sync>,
}

impl Error {
    /// Attempts to downcast the underlying error to a concrete type.
    ///
    /// # Returns
    /// * `Some(&E)` - If the underlying error is of type `E`
    /// * `None` - If the underlying error is not of type `E`
    #[must_use]
    pub fn downcast<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        self.error.downcast_ref::<E>()
    }

    /// Whether this error is a per-item admission failure that a playlist
    /// expansion absorbs instead of aborting.
    #[must_use]
    pub fn is_item_rejection(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::DurationExceeded | ErrorKind::MalformedDuration | ErrorKind::InvalidReference
        )
    }
}

/// Standard result type for djqueue operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories.
///
/// The first group is the domain taxonomy that callers are expected to act
/// on. The second group covers the ambient failures of talking to the
/// network, the file system and the configuration.
#[expect(clippy::module_name_repetitions)]
#[derive(Clone, Copy, Debug, Eq, Error, Hash, Ord, PartialEq, PartialOrd)]
pub enum ErrorKind {
    /// The provider rejected the API key (HTTP 403).
    #[error("invalid API key supplied")]
    InvalidCredentials,

    /// The provider did not recognize the video or playlist ID.
    #[error("invalid YouTube ID supplied")]
    InvalidReference,

    /// The provider's duration string could not be parsed.
    #[error("malformed duration")]
    MalformedDuration,

    /// The item is longer than the configured maximum duration.
    #[error("song exceeds the maximum allowed duration")]
    DurationExceeded,

    /// The voter has already voted to skip this item or playlist.
    #[error("user has already voted to skip")]
    DuplicateVote,

    /// The voter has no vote to withdraw.
    #[error("user has not voted to skip")]
    NoSuchVote,

    /// The download utility exited unsuccessfully.
    #[error("song download failed")]
    DownloadFailed,

    /// The cached audio file could not be removed.
    #[error("error occurred while deleting audio file")]
    DeleteFailed,

    /// The playback engine refused to start the item.
    #[error("playback failed")]
    PlaybackFailed,

    /// Configuration values, IDs or links that do not validate.
    #[error("invalid argument specified")]
    InvalidArgument,

    /// The provider could not be reached.
    #[error("service unavailable")]
    Unavailable,

    /// A network operation timed out.
    #[error("operation timed out")]
    DeadlineExceeded,

    /// A response body was truncated or unreadable.
    #[error("unrecoverable data loss or corruption")]
    DataLoss,

    /// Something that should not happen during normal operation.
    #[error("internal error")]
    Internal,

    /// Anything that fits no other category.
    #[error("unknown error")]
    Unknown,
}

impl Error {
    /// Creates a new error with specified kind and details.
    pub fn new<E>(kind: ErrorKind, error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self {
            kind,
            error: error.into(),
        }
    }

    /// Creates an error for a rejected API key.
    pub fn invalid_credentials<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::InvalidCredentials, error)
    }

    /// Creates an error for an unknown or unusable video or playlist ID.
    pub fn invalid_reference<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::InvalidReference, error)
    }

    /// Creates an error for a duration string that does not parse.
    ///
    /// # Examples
    ///
    /// ```rust
    /// let err = Error::malformed_duration("missing minutes marker in \"PT5S\"");
    /// assert_eq!(err.kind, ErrorKind::MalformedDuration);
    /// ```
    pub fn malformed_duration<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::MalformedDuration, error)
    }

    /// Creates an error for an item over the maximum duration.
    pub fn duration_exceeded<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::DurationExceeded, error)
    }

    /// Creates an error for a second vote by the same voter.
    pub fn duplicate_vote<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::DuplicateVote, error)
    }

    /// Creates an error for withdrawing a vote that was never cast.
    pub fn no_such_vote<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::NoSuchVote, error)
    }

    /// Creates an error for a failed download.
    pub fn download_failed<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::DownloadFailed, error)
    }

    /// Creates an error for a cached file that could not be removed.
    pub fn delete_failed<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::DeleteFailed, error)
    }

    /// Creates an error for a playback engine that failed to start.
    ///
    /// This is reported to the queue, which decides whether to advance to
    /// the next item or to halt.
    pub fn playback_failed<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::PlaybackFailed, error)
    }

    /// Creates an error for invalid arguments.
    ///
    /// # Examples
    ///
    /// ```rust
    /// let err = Error::invalid_argument("skip ratio must be between 0 and 1");
    /// assert_eq!(err.kind, ErrorKind::InvalidArgument);
    /// ```
    pub fn invalid_argument<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::InvalidArgument, error)
    }

    /// Creates an error for an unreachable service.
    pub fn unavailable<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::Unavailable, error)
    }

    /// Creates an error for operations that exceeded their deadline.
    pub fn deadline_exceeded<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::DeadlineExceeded, error)
    }

    /// Creates an error for data corruption or loss.
    pub fn data_loss<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::DataLoss, error)
    }

    /// Creates an error for internal errors.
    pub fn internal<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::Internal, error)
    }

    /// Creates an error for unknown errors.
    pub fn unknown<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::Unknown, error)
    }
}

/// Returns the underlying error source.
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.error.source()
    }
}

/// Formats the error for display, showing both kind and details.
///
/// Format: "{kind}: {details}"
impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "{}: ", self.kind)?;
        self.error.fmt(fmt)
    }
}

/// Converts IO errors into appropriate error kinds.
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind::*;
        match err.kind() {
            NotFound | PermissionDenied | InvalidInput | InvalidData => Self::invalid_argument(err),
            AddrNotAvailable | ConnectionRefused | NotConnected => Self::unavailable(err),
            UnexpectedEof | BrokenPipe | ConnectionReset | ConnectionAborted => {
                Self::data_loss(err)
            }
            TimedOut => Self::deadline_exceeded(err),
            _ => Self::unknown(err),
        }
    }
}

/// Converts HTTP client errors into appropriate error kinds.
///
/// Only transport failures arrive here. Response statuses are classified
/// by the resolver, never by this conversion.
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_body() || err.is_decode() {
            return Self::data_loss(err);
        }

        if err.is_builder() {
            return Self::internal(err);
        }

        if err.is_connect() || err.is_redirect() {
            return Self::unavailable(err);
        }

        if err.is_timeout() {
            return Self::deadline_exceeded(err);
        }

        Self::unknown(err)
    }
}

/// Converts JSON errors to `InvalidReference`: the provider answered, but
/// not with anything that describes the requested ID.
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::invalid_reference(err)
    }
}

/// Converts TOML errors to `InvalidArgument`.
impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Self::invalid_argument(e)
    }
}

/// Converts URL parsing errors to `Internal`.
impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Self::internal(e.to_string())
    }
}

/// Converts integer parsing errors to `InvalidArgument`.
impl From<std::num::ParseIntError> for Error {
    fn from(e: std::num::ParseIntError) -> Self {
        Self::invalid_argument(e.to_string())
    }
}

/// Converts mutex poisoning errors to `Internal`.
impl<T> From<std::sync::PoisonError<std::sync::MutexGuard<'_, T>>> for Error {
    fn from(e: std::sync::PoisonError<std::sync::MutexGuard<'_, T>>) -> Self {
        Self::internal(e.to_string())
    }
}
