//! Invocation of the external download utility.
//!
//! The utility (`youtube-dl` or a compatible fork such as `yt-dlp`) is run
//! as a black box:
//!
//! ```text
//! <program> --output <target> --format <format> -- <video ID>
//! ```
//!
//! A zero exit status is success; anything else is
//! [`DownloadFailed`](crate::error::ErrorKind::DownloadFailed).

use std::path::Path;

use tokio::process::Command;

use crate::{
    config::Config,
    error::{Error, Result},
    id::VideoId,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Downloader {
    program: String,
    format: String,
}

impl Downloader {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self::with_program(&config.downloader.program, &config.downloader.format)
    }

    #[must_use]
    pub fn with_program(program: &str, format: &str) -> Self {
        Self {
            program: program.to_owned(),
            format: format.to_owned(),
        }
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Downloads the audio of `id` to `target`.
    ///
    /// # Errors
    ///
    /// Returns `DownloadFailed` if the utility cannot be started or exits
    /// with a non-zero status.
    pub async fn fetch(&self, id: &VideoId, target: &Path) -> Result<()> {
        debug!("downloading {id} to {}", target.display());

        let output = Command::new(&self.program)
            .arg("--output")
            .arg(target)
            .arg("--format")
            .arg(&self.format)
            .arg("--")
            .arg(id.as_ref())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Error::download_failed(format!("could not run {}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::download_failed(format!(
                "{} exited with {} for {id}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        debug!("download of {id} completed");
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn id() -> VideoId {
        "HYd9B6YvIHM".parse().unwrap()
    }

    #[tokio::test]
    async fn zero_exit_status_succeeds() {
        let downloader = Downloader::with_program("true", "m4a");
        downloader.fetch(&id(), Path::new("/tmp/x.m4a")).await.unwrap();
    }

    #[tokio::test]
    async fn non_zero_exit_status_fails() {
        let downloader = Downloader::with_program("false", "m4a");
        let err = downloader
            .fetch(&id(), Path::new("/tmp/x.m4a"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::DownloadFailed);
    }

    #[tokio::test]
    async fn missing_program_fails() {
        let downloader = Downloader::with_program("djqueue-no-such-downloader", "m4a");
        let err = downloader
            .fetch(&id(), Path::new("/tmp/x.m4a"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::DownloadFailed);
    }
}
