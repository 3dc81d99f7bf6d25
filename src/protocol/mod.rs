//! Wire types of the metadata provider.
//!
//! # Submodules
//!
//! * [`youtube`] - Response bodies of the YouTube Data API v3
//!
//! # Shared Functionality
//!
//! [`json`] parses a response body and logs it: the parsed structure at
//! TRACE level on success, the raw document when it is JSON of an
//! unexpected shape, and an ERROR when it is not JSON at all.

pub mod youtube;

use crate::error::Result;
use serde::Deserialize;
use std::fmt::Debug;

/// Parses and logs a JSON response body.
///
/// # Arguments
///
/// * `body` - Response body text to parse
/// * `origin` - Description of the API endpoint for logging
///
/// # Errors
///
/// Returns `InvalidReference` if the body is not valid JSON or does not
/// match `T`.
pub fn json<T>(body: &str, origin: &str) -> Result<T>
where
    T: for<'de> Deserialize<'de> + Debug,
{
    match serde_json::from_str(body) {
        Ok(result) => {
            trace!("{origin}: {result:#?}");
            Ok(result)
        }
        Err(e) => {
            if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
                trace!("{origin}: {json:#?}");
            } else {
                error!("{origin}: failed parsing response ({e:?})");
                trace!("{body}");
            }
            Err(e.into())
        }
    }
}
