//! Shared playback queue for a group voice session.
//!
//! Members submit YouTube videos or playlists. Submissions are resolved
//! against the YouTube Data API, checked against a duration limit, queued,
//! downloaded into a local cache and skipped by majority vote.
//!
//! # Overview
//!
//! * [`song::Song`] and [`playlist::Playlist`] turn submissions into queue
//!   items and register them through the [`queue::Queue`] seam
//! * [`resolver::Resolver`] talks to the provider
//! * [`votes`] counts skip votes against the listeners present
//! * [`cache::Cache`] and [`download::Downloader`] manage the audio files
//! * [`context::Context`] ties them together for one session
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

#[macro_use]
extern crate log;

pub mod announcement;
pub mod api_key;
pub mod cache;
pub mod config;
pub mod context;
pub mod download;
pub mod duration;
pub mod error;
pub mod http;
pub mod id;
pub mod player;
pub mod playlist;
pub mod protocol;
pub mod queue;
pub mod resolver;
pub mod song;
pub mod votes;
