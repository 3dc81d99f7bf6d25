//! Shared fixtures: a context pointed at a mock provider, a queue that
//! records what was registered, and canned API responses.

#![allow(dead_code)]

use std::{
    path::Path,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use djqueue::{
    config::{Config, Settings},
    context::Context,
    id::PlaylistId,
    queue::Queue,
    song::Song,
};
use serde_json::{json, Value};
use url::Url;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

/// Builds a context whose resolver talks to `server` and whose cache lives
/// in `cache_dir`.
pub fn context(server: &MockServer, mut settings: Settings, cache_dir: &Path) -> Context {
    settings.cache.directory = Some(cache_dir.to_path_buf());

    let mut config = Config::new("test-key".parse().unwrap(), settings).unwrap();
    config.api_url = Url::parse(&server.uri()).unwrap();

    Context::new(config).unwrap()
}

pub fn settings_with_limit(max_song_duration: u32) -> Settings {
    let mut settings = Settings::default();
    settings.general.max_song_duration = max_song_duration;
    settings
}

/// Records every song added to it.
#[derive(Default)]
pub struct RecordingQueue {
    songs: Mutex<Vec<Song>>,
    finished: AtomicUsize,
}

impl RecordingQueue {
    pub fn songs(&self) -> Vec<Song> {
        self.songs.lock().unwrap().clone()
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

impl Queue for RecordingQueue {
    fn add_song(&self, song: Song) {
        self.songs.lock().unwrap().push(song);
    }

    fn on_song_finished(&self) {
        self.finished.fetch_add(1, Ordering::SeqCst);
    }

    fn contains_playlist(&self, playlist: &PlaylistId) -> bool {
        self.songs
            .lock()
            .unwrap()
            .iter()
            .any(|song| song.playlist() == Some(playlist))
    }
}

pub fn video_item(id: &str, title: &str, duration: &str) -> Value {
    json!({
        "id": id,
        "snippet": {
            "title": title,
            "thumbnails": {
                "default": {"url": format!("https://i.ytimg.com/vi/{id}/default.jpg")},
                "high": {"url": format!("https://i.ytimg.com/vi/{id}/hqdefault.jpg")}
            }
        },
        "contentDetails": {"duration": duration}
    })
}

pub fn playlist_item(id: &str, title: &str) -> Value {
    json!({
        "snippet": {
            "title": title,
            "thumbnails": {
                "medium": {"url": format!("https://i.ytimg.com/vi/{id}/mqdefault.jpg")}
            },
            "resourceId": {"kind": "youtube#video", "videoId": id}
        }
    })
}

pub fn list(items: Vec<Value>) -> Value {
    json!({
        "pageInfo": {"totalResults": items.len(), "resultsPerPage": 25},
        "items": items
    })
}

/// Mounts a `videos` response for a single ID lookup.
pub async fn mount_video(server: &MockServer, id: &str, title: &str, duration: &str) {
    Mock::given(method("GET"))
        .and(path("/videos"))
        .and(query_param("id", id))
        .respond_with(ResponseTemplate::new(200).set_body_json(list(vec![video_item(
            id, title, duration,
        )])))
        .mount(server)
        .await;
}

/// Mounts the three lookups of a playlist submission: its title, its items
/// and one batched duration request.
pub async fn mount_playlist(server: &MockServer, id: &str, title: &str, videos: &[(&str, &str, &str)]) {
    Mock::given(method("GET"))
        .and(path("/playlists"))
        .and(query_param("id", id))
        .respond_with(ResponseTemplate::new(200).set_body_json(list(vec![json!({
            "snippet": {"title": title}
        })])))
        .mount(server)
        .await;

    let items = videos
        .iter()
        .map(|(video, title, _)| playlist_item(video, title))
        .collect();
    Mock::given(method("GET"))
        .and(path("/playlistItems"))
        .and(query_param("playlistId", id))
        .respond_with(ResponseTemplate::new(200).set_body_json(list(items)))
        .mount(server)
        .await;

    let ids = videos
        .iter()
        .map(|(video, _, _)| *video)
        .collect::<Vec<_>>()
        .join(",");
    let durations = videos
        .iter()
        .map(|(video, title, duration)| video_item(video, title, duration))
        .collect();
    Mock::given(method("GET"))
        .and(path("/videos"))
        .and(query_param("id", ids.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(list(durations)))
        .mount(server)
        .await;
}
