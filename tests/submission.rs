//! Submitting videos and playlists, and voting on them.

mod common;

use std::sync::Arc;

use djqueue::{
    config::Settings,
    error::ErrorKind,
    id::{PlaylistId, VideoId},
    playlist::Playlist,
    queue::{MemoryQueue, Queue},
    song::Song,
    votes::VoteState,
};
use pretty_assertions::assert_eq;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

use common::{context, mount_playlist, mount_video, settings_with_limit, RecordingQueue};

fn video_id(id: &str) -> VideoId {
    id.parse().unwrap()
}

fn playlist_id(id: &str) -> PlaylistId {
    id.parse().unwrap()
}

#[tokio::test]
async fn song_at_the_limit_is_accepted() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(&server, settings_with_limit(300), dir.path());
    let queue = RecordingQueue::default();

    mount_video(&server, "fiveminutes", "Five", "PT5M0S").await;

    let song = Song::new(&ctx, &queue, "alice", &video_id("fiveminutes"), None)
        .await
        .unwrap();
    assert_eq!(song.title(), "Five");
    assert_eq!(song.submitter(), "alice");
    assert_eq!(song.playlist(), None);
    assert_eq!(song.filename(), "fiveminutes.m4a");

    let queued = queue.songs();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].id(), &video_id("fiveminutes"));
}

#[tokio::test]
async fn song_over_the_limit_is_rejected() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(&server, settings_with_limit(300), dir.path());
    let queue = RecordingQueue::default();

    mount_video(&server, "toolong", "Long", "PT5M1S").await;

    let err = Song::new(&ctx, &queue, "alice", &video_id("toolong"), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::DurationExceeded);
    assert!(queue.songs().is_empty());
}

#[tokio::test]
async fn zero_limit_accepts_anything() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(&server, settings_with_limit(0), dir.path());
    let queue = RecordingQueue::default();

    mount_video(&server, "marathon", "Marathon", "PT600M0S").await;

    Song::new(&ctx, &queue, "alice", &video_id("marathon"), None)
        .await
        .unwrap();
    assert_eq!(queue.songs().len(), 1);
}

#[tokio::test]
async fn failed_lookup_queues_nothing() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(&server, Settings::default(), dir.path());
    let queue = RecordingQueue::default();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = Song::new(&ctx, &queue, "alice", &video_id("missing"), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidReference);
    assert!(queue.songs().is_empty());
}

#[tokio::test]
async fn playlist_skips_items_over_the_limit() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(&server, settings_with_limit(300), dir.path());
    let queue = RecordingQueue::default();

    mount_playlist(
        &server,
        "PLmix",
        "Mix",
        &[
            ("first", "First", "PT3M0S"),
            ("epic", "Epic", "PT10M0S"),
            ("last", "Last", "PT4M59S"),
        ],
    )
    .await;

    let playlist = Playlist::new(&ctx, &queue, "bob", &playlist_id("PLmix"))
        .await
        .unwrap();
    assert_eq!(playlist.title(), "Mix");
    assert_eq!(playlist.accepted(), 2);
    assert_eq!(playlist.skipped(), 1);

    let queued = queue.songs();
    let titles: Vec<_> = queued.iter().map(Song::title).collect();
    assert_eq!(titles, ["First", "Last"]);
    for song in &queued {
        assert_eq!(song.playlist(), Some(&playlist_id("PLmix")));
        assert_eq!(song.submitter(), "bob");
    }

    assert_eq!(
        queued[0].playlist_title(&ctx).unwrap().as_deref(),
        Some("Mix")
    );
}

#[tokio::test]
async fn playlist_without_acceptable_items_is_returned() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(&server, settings_with_limit(60), dir.path());
    let queue = RecordingQueue::default();

    mount_playlist(&server, "PLlong", "Long", &[("long1", "Long", "PT9M0S")]).await;

    let playlist = Playlist::new(&ctx, &queue, "bob", &playlist_id("PLlong"))
        .await
        .unwrap();
    assert_eq!(playlist.accepted(), 0);
    assert_eq!(playlist.skipped(), 1);
    assert!(queue.songs().is_empty());
    assert!(!ctx.playlists().contains(playlist.id()).unwrap());
}

#[tokio::test]
async fn failed_playlist_lookup_queues_nothing() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(&server, Settings::default(), dir.path());
    let queue = RecordingQueue::default();

    Mock::given(method("GET"))
        .and(path("/playlists"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = Playlist::new(&ctx, &queue, "bob", &playlist_id("PLgone"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidReference);
    assert!(queue.songs().is_empty());
}

#[tokio::test]
async fn songs_of_a_playlist_share_votes() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(&server, Settings::default(), dir.path());
    let queue = RecordingQueue::default();

    mount_playlist(
        &server,
        "PLshared",
        "Shared",
        &[("a1", "A", "PT1M0S"), ("b2", "B", "PT2M0S")],
    )
    .await;

    let playlist = Playlist::new(&ctx, &queue, "bob", &playlist_id("PLshared"))
        .await
        .unwrap();
    let mut songs = queue.songs();

    songs[0].add_skip(&ctx, "alice").unwrap();
    let err = songs[1].add_skip(&ctx, "alice").unwrap_err();
    assert_eq!(err.kind, ErrorKind::DuplicateVote);
    assert_eq!(playlist.skips(&ctx).unwrap(), 1);
    assert_eq!(songs[1].skips(&ctx).unwrap(), 1);

    assert!(!songs[1].skip_reached(&ctx, 3).unwrap());
    assert!(songs[1].skip_reached(&ctx, 2).unwrap());

    songs[1].remove_skip(&ctx, "alice").unwrap();
    assert_eq!(playlist.vote_state(&ctx, 2).unwrap(), Some(VoteState::Clean));
}

#[tokio::test]
async fn exempt_song_is_never_skipped() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let ctx = Arc::new(context(&server, Settings::default(), dir.path()));
    let queue = MemoryQueue::new(Arc::clone(&ctx));

    mount_video(&server, "keeper", "Keeper", "PT2M0S").await;
    Song::new(&ctx, &queue, "alice", &video_id("keeper"), None)
        .await
        .unwrap();

    queue.set_dont_skip(0, true).unwrap();
    assert!(queue.current().unwrap().unwrap().dont_skip());
    assert!(!queue.skip_current("bob", 2).unwrap());
    assert!(!queue.skip_current("carol", 2).unwrap());
    assert_eq!(queue.len().unwrap(), 1);

    let current = queue.current().unwrap().unwrap();
    assert_eq!(current.skips(&ctx).unwrap(), 2);
    assert_eq!(current.vote_state(&ctx, 2).unwrap(), VoteState::PartiallyVoted);

    queue.set_dont_skip(0, false).unwrap();
    assert!(queue.skip_current("dave", 2).unwrap());
    assert!(queue.is_empty().unwrap());

    assert_eq!(
        queue.set_dont_skip(0, true).unwrap_err().kind,
        ErrorKind::InvalidArgument
    );
}

#[tokio::test]
async fn skipped_playlist_starts_over_with_no_votes() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let ctx = Arc::new(context(&server, Settings::default(), dir.path()));
    let queue = MemoryQueue::new(Arc::clone(&ctx));

    mount_playlist(
        &server,
        "PLagain",
        "Again",
        &[("x1", "X", "PT1M0S"), ("y2", "Y", "PT1M0S")],
    )
    .await;
    mount_video(&server, "solo", "Solo", "PT1M0S").await;

    let id = playlist_id("PLagain");
    Playlist::new(&ctx, &queue, "bob", &id).await.unwrap();
    Song::new(&ctx, &queue, "carol", &video_id("solo"), None)
        .await
        .unwrap();
    assert_eq!(queue.len().unwrap(), 3);

    assert!(!queue.skip_playlist("alice", 4).unwrap());
    assert!(queue.skip_playlist("dave", 4).unwrap());

    let remaining = queue.songs().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].title(), "Solo");
    assert!(!ctx.playlists().contains(&id).unwrap());

    // The solo song is not from a playlist.
    let err = queue.skip_playlist("alice", 4).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidArgument);

    let playlist = Playlist::new(&ctx, &queue, "bob", &id).await.unwrap();
    assert_eq!(playlist.skips(&ctx).unwrap(), 0);
    assert_eq!(playlist.vote_state(&ctx, 4).unwrap(), Some(VoteState::Clean));
    playlist.add_skip(&ctx, "alice").unwrap();
}

#[tokio::test]
async fn finishing_last_song_releases_playlist() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let ctx = Arc::new(context(&server, Settings::default(), dir.path()));
    let queue = MemoryQueue::new(Arc::clone(&ctx));

    mount_playlist(
        &server,
        "PLdone",
        "Done",
        &[("p1", "P", "PT1M0S"), ("q2", "Q", "PT1M0S")],
    )
    .await;

    let id = playlist_id("PLdone");
    Playlist::new(&ctx, &queue, "bob", &id).await.unwrap();

    queue.on_song_finished();
    assert!(ctx.playlists().contains(&id).unwrap());
    assert_eq!(queue.current().unwrap().unwrap().title(), "Q");

    queue.on_song_finished();
    assert!(!ctx.playlists().contains(&id).unwrap());
    assert!(queue.is_empty().unwrap());

    // Finishing on an empty queue is harmless.
    queue.on_song_finished();
}

#[tokio::test]
async fn single_song_skips_by_majority() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let ctx = Arc::new(context(&server, Settings::default(), dir.path()));
    let queue = MemoryQueue::new(Arc::clone(&ctx));

    mount_video(&server, "meh", "Meh", "PT1M0S").await;
    Song::new(&ctx, &queue, "carol", &video_id("meh"), None)
        .await
        .unwrap();

    assert!(!queue.skip_current("alice", 3).unwrap());
    assert_eq!(
        queue.skip_current("alice", 3).unwrap_err().kind,
        ErrorKind::DuplicateVote
    );

    queue.withdraw_skip("alice").unwrap();
    assert_eq!(
        queue.withdraw_skip("alice").unwrap_err().kind,
        ErrorKind::NoSuchVote
    );

    assert!(!queue.skip_current("alice", 3).unwrap());
    assert!(queue.skip_current("bob", 3).unwrap());
    assert!(queue.is_empty().unwrap());

    assert_eq!(
        queue.skip_current("bob", 3).unwrap_err().kind,
        ErrorKind::InvalidArgument
    );
}

#[tokio::test]
async fn shutdown_reports_leaked_vote_sets() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(&server, Settings::default(), dir.path());
    let queue = RecordingQueue::default();

    mount_playlist(&server, "PLleak", "Leak", &[("z1", "Z", "PT1M0S")]).await;
    Playlist::new(&ctx, &queue, "bob", &playlist_id("PLleak"))
        .await
        .unwrap();

    assert_eq!(ctx.shutdown(), 1);
}

#[tokio::test]
async fn resubmitting_without_new_songs_keeps_queued_votes() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let ctx = Arc::new(context(&server, settings_with_limit(300), dir.path()));
    let queue = MemoryQueue::new(Arc::clone(&ctx));

    let id = playlist_id("PLedit");
    mount_playlist(
        &server,
        "PLedit",
        "Edit",
        &[("e1", "E", "PT1M0S"), ("f2", "F", "PT1M0S")],
    )
    .await;
    Playlist::new(&ctx, &queue, "bob", &id).await.unwrap();
    assert!(!queue.skip_playlist("alice", 10).unwrap());

    // The playlist changed upstream and now only holds a song that is too
    // long.
    server.reset().await;
    mount_playlist(&server, "PLedit", "Edit", &[("g3", "G", "PT10M0S")]).await;

    let again = Playlist::new(&ctx, &queue, "carol", &id).await.unwrap();
    assert_eq!(again.accepted(), 0);
    assert_eq!(again.skipped(), 1);

    assert_eq!(queue.len().unwrap(), 2);
    assert_eq!(ctx.playlists().votes(&id).unwrap(), 1);
    assert_eq!(
        queue.songs().unwrap()[1].playlist_title(&ctx).unwrap().as_deref(),
        Some("Edit")
    );
    assert_eq!(
        queue.skip_playlist("alice", 10).unwrap_err().kind,
        ErrorKind::DuplicateVote
    );
}

#[tokio::test]
async fn song_of_unregistered_playlist_is_refused() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(&server, Settings::default(), dir.path());
    let queue = RecordingQueue::default();

    mount_video(&server, "stray", "Stray", "PT1M0S").await;

    let err = Song::new(
        &ctx,
        &queue,
        "alice",
        &video_id("stray"),
        Some(&playlist_id("PLnowhere")),
    )
    .await
    .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidArgument);
    assert!(queue.songs().is_empty());
    assert!(!ctx.playlists().contains(&playlist_id("PLnowhere")).unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_playlist_votes_count_once_per_voter() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let ctx = Arc::new(context(&server, Settings::default(), dir.path()));
    let queue = RecordingQueue::default();

    let id = playlist_id("PLcrowd");
    mount_playlist(
        &server,
        "PLcrowd",
        "Crowd",
        &[("c1", "C", "PT1M0S"), ("d2", "D", "PT1M0S")],
    )
    .await;
    Playlist::new(&*ctx, &queue, "bob", &id).await.unwrap();
    let songs = queue.songs();

    let voters: Vec<_> = (0..8).map(|i| format!("voter{i}")).collect();

    let mut handles = Vec::new();
    for voter in &voters {
        for song in &songs {
            let ctx = Arc::clone(&ctx);
            let mut song = song.clone();
            let voter = voter.clone();
            handles.push(tokio::spawn(async move { song.add_skip(&ctx, &voter) }));
        }
    }

    let mut added = 0;
    let mut duplicates = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => added += 1,
            Err(e) => {
                assert_eq!(e.kind, ErrorKind::DuplicateVote);
                duplicates += 1;
            }
        }
    }
    assert_eq!(added, voters.len());
    assert_eq!(duplicates, voters.len());
    assert_eq!(ctx.playlists().votes(&id).unwrap(), voters.len());

    let mut handles = Vec::new();
    for voter in &voters[..4] {
        for song in &songs {
            let ctx = Arc::clone(&ctx);
            let mut song = song.clone();
            let voter = voter.clone();
            handles.push(tokio::spawn(async move { song.remove_skip(&ctx, &voter) }));
        }
    }

    let mut removed = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => removed += 1,
            Err(e) => assert_eq!(e.kind, ErrorKind::NoSuchVote),
        }
    }
    assert_eq!(removed, 4);
    assert_eq!(ctx.playlists().votes(&id).unwrap(), 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_skips_on_the_queue_are_all_counted() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let ctx = Arc::new(context(&server, Settings::default(), dir.path()));
    let queue = Arc::new(MemoryQueue::new(Arc::clone(&ctx)));

    mount_video(&server, "busy", "Busy", "PT1M0S").await;
    Song::new(&ctx, &*queue, "carol", &video_id("busy"), None)
        .await
        .unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.skip_current(&format!("voter{i}"), 100) })
        })
        .collect();
    for handle in handles {
        assert!(!handle.await.unwrap().unwrap());
    }

    let current = queue.current().unwrap().unwrap();
    assert_eq!(current.skips(&ctx).unwrap(), 8);
}
