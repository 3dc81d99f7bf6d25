//! Provider API key handling.
//!
//! The key grants access to the provider's metadata API under the owner's
//! quota, so it is never printed: `Debug` output is redacted and there is no
//! `Display` implementation.
//!
//! # Example
//!
//! ```rust
//! use djqueue::api_key::ApiKey;
//!
//! let key: ApiKey = "AIzaSyExample_key-123".parse()?;
//! assert!(!format!("{key:?}").contains("AIza"));
//! ```

use std::{ops::Deref, str::FromStr};

use veil::Redact;

use crate::error::{Error, Result};

/// API key for the metadata provider.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Redact)]
pub struct ApiKey(#[redact] String);

impl ApiKey {
    /// Upper bound on the key length, well above what the provider issues.
    const MAX_LENGTH: usize = 128;
}

impl Deref for ApiKey {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Parses an API key, rejecting anything that could not be sent verbatim as
/// a URL query parameter.
///
/// # Errors
///
/// Returns `InvalidArgument` if the key is empty, too long, or contains
/// characters other than ASCII letters, digits, `-` and `_`.
impl FromStr for ApiKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim();
        if key.is_empty() {
            return Err(Error::invalid_argument("API key is empty"));
        }

        let chars = key.chars().count();
        if chars > Self::MAX_LENGTH {
            return Err(Error::invalid_argument(format!(
                "API key should be at most {} characters long but is {chars}",
                Self::MAX_LENGTH
            )));
        }

        if let Some(illegal) = key
            .chars()
            .find(|chr| !(chr.is_ascii_alphanumeric() || *chr == '-' || *chr == '_'))
        {
            return Err(Error::invalid_argument(format!(
                "API key contains illegal character {illegal:?}"
            )));
        }

        Ok(Self(key.to_owned()))
    }
}
