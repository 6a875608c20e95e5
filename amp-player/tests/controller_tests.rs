//! Player controller tests: navigation, end-of-track advance and playlist editing

mod helpers;

use amp_common::{TrackDescriptor, TransportState};
use amp_player::Error;
use helpers::*;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

const LONG: Duration = Duration::from_secs(180);

/// Append one local track per name; titles are the names without extension
async fn fill(controller: &Arc<amp_player::PlayerController>, dir: &Path, names: &[&str]) {
    let playlist = controller.playlist();
    let mut playlist = playlist.write().await;
    for name in names {
        let title = name.split('.').next().unwrap_or(name);
        playlist.add_item(local_track(dir, name, title));
    }
}

async fn title_of(controller: &Arc<amp_player::PlayerController>, track_number: u32) -> String {
    let playlist = controller.playlist();
    let playlist = playlist.read().await;
    playlist.get_item(track_number).unwrap().title.clone()
}

#[tokio::test(start_paused = true)]
async fn test_play_starts_first_entry() {
    let dir = tempfile::tempdir().unwrap();
    let backend = MockBackend::new(LONG, StreamScript::Succeed);
    let controller = controller_with(&backend);
    fill(&controller, dir.path(), &["a.mp3", "b.mp3"]).await;

    controller.play(None).await.unwrap();

    assert_eq!(controller.now_playing(), Some(1));
    assert_eq!(controller.engine().state(), TransportState::Playing);
}

#[tokio::test(start_paused = true)]
async fn test_play_with_empty_playlist_does_nothing() {
    let backend = MockBackend::new(LONG, StreamScript::Succeed);
    let controller = controller_with(&backend);

    controller.play(None).await.unwrap();

    assert_eq!(controller.now_playing(), None);
    assert_eq!(controller.engine().state(), TransportState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn test_previous_restarts_track_past_threshold() {
    let dir = tempfile::tempdir().unwrap();
    let backend = MockBackend::new(LONG, StreamScript::Succeed);
    let controller = controller_with(&backend);
    fill(&controller, dir.path(), &["a.mp3", "b.mp3"]).await;

    controller.select(2).await.unwrap();
    controller.play(None).await.unwrap();
    sleep(Duration::from_secs(6)).await;

    assert_eq!(controller.previous().await.unwrap(), Some(2));
    assert_eq!(controller.now_playing(), Some(2));
    assert!(controller.engine().position() < Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_previous_steps_back_early_in_track() {
    let dir = tempfile::tempdir().unwrap();
    let backend = MockBackend::new(LONG, StreamScript::Succeed);
    let controller = controller_with(&backend);
    fill(&controller, dir.path(), &["a.mp3", "b.mp3"]).await;

    controller.select(2).await.unwrap();
    controller.play(None).await.unwrap();
    sleep(Duration::from_secs(2)).await;

    assert_eq!(controller.previous().await.unwrap(), Some(1));
    assert_eq!(controller.now_playing(), Some(1));
    assert_eq!(controller.engine().current_track().unwrap().title, "a");
    // Was playing, keeps playing
    assert_eq!(controller.engine().state(), TransportState::Playing);
}

#[tokio::test(start_paused = true)]
async fn test_previous_at_first_entry_stays_put() {
    let dir = tempfile::tempdir().unwrap();
    let backend = MockBackend::new(LONG, StreamScript::Succeed);
    let controller = controller_with(&backend);
    fill(&controller, dir.path(), &["a.mp3"]).await;

    controller.select(1).await.unwrap();
    assert_eq!(controller.previous().await.unwrap(), None);
    assert_eq!(controller.now_playing(), Some(1));
}

#[tokio::test(start_paused = true)]
async fn test_next_skips_missing_entries() {
    let dir = tempfile::tempdir().unwrap();
    let backend = MockBackend::new(LONG, StreamScript::Succeed);
    let controller = controller_with(&backend);
    {
        let playlist = controller.playlist();
        let mut playlist = playlist.write().await;
        playlist.add_item(local_track(dir.path(), "a.mp3", "a"));
        playlist.add_item(TrackDescriptor::missing("/gone/b.mp3"));
        playlist.add_item(local_track(dir.path(), "c.mp3", "c"));
    }

    controller.select(1).await.unwrap();
    assert_eq!(controller.next().await.unwrap(), Some(3));
    assert_eq!(controller.engine().current_track().unwrap().title, "c");

    // End of list
    assert_eq!(controller.next().await.unwrap(), None);
    assert_eq!(controller.now_playing(), Some(3));
}

#[tokio::test(start_paused = true)]
async fn test_select_missing_entry_is_not_found() {
    let backend = MockBackend::new(LONG, StreamScript::Succeed);
    let controller = controller_with(&backend);
    controller
        .playlist()
        .write()
        .await
        .add_item(TrackDescriptor::missing("/gone/b.mp3"));

    assert!(matches!(controller.select(1).await, Err(Error::NotFound(_))));
    assert!(matches!(controller.select(7).await, Err(Error::NotFound(_))));
    assert_eq!(controller.now_playing(), None);
}

#[tokio::test(start_paused = true)]
async fn test_end_of_track_advances_then_stops_at_end() {
    let dir = tempfile::tempdir().unwrap();
    let backend = MockBackend::new(Duration::from_secs(2), StreamScript::Succeed);
    let controller = controller_with(&backend);
    let events = controller.spawn_event_loop();
    fill(&controller, dir.path(), &["a.mp3", "b.mp3"]).await;

    controller.play(None).await.unwrap();
    sleep(Duration::from_millis(2500)).await;

    assert_eq!(controller.now_playing(), Some(2));
    assert_eq!(controller.engine().state(), TransportState::Playing);
    assert_eq!(controller.engine().current_track().unwrap().title, "b");

    sleep(Duration::from_secs(6)).await;
    assert_eq!(controller.engine().state(), TransportState::Stopped);
    assert!(!controller.engine().is_bound());

    events.abort();
}

#[tokio::test(start_paused = true)]
async fn test_remove_adjusts_now_playing() {
    let dir = tempfile::tempdir().unwrap();
    let backend = MockBackend::new(LONG, StreamScript::Succeed);
    let controller = controller_with(&backend);
    fill(&controller, dir.path(), &["a.mp3", "b.mp3", "c.mp3"]).await;

    controller.select(3).await.unwrap();
    controller.remove(1).await.unwrap();
    assert_eq!(controller.now_playing(), Some(2));
    assert_eq!(title_of(&controller, 2).await, "c");

    controller.remove(2).await.unwrap();
    assert_eq!(controller.now_playing(), None);

    assert!(matches!(controller.remove(5).await, Err(Error::NotFound(_))));
}

#[tokio::test(start_paused = true)]
async fn test_move_and_swap_follow_selected_entry() {
    let dir = tempfile::tempdir().unwrap();
    let backend = MockBackend::new(LONG, StreamScript::Succeed);
    let controller = controller_with(&backend);
    fill(&controller, dir.path(), &["a.mp3", "b.mp3", "c.mp3"]).await;

    controller.select(1).await.unwrap();
    controller.move_item(1, 3).await.unwrap();
    assert_eq!(controller.now_playing(), Some(3));
    assert_eq!(title_of(&controller, 3).await, "a");
    assert_eq!(title_of(&controller, 1).await, "b");

    // Entry moved across the selection shifts it
    controller.move_item(1, 3).await.unwrap();
    assert_eq!(controller.now_playing(), Some(2));

    controller.swap(2, 1).await.unwrap();
    assert_eq!(controller.now_playing(), Some(1));
    assert_eq!(title_of(&controller, 1).await, "a");

    assert!(matches!(controller.move_item(1, 9).await, Err(Error::NotFound(_))));
    assert!(matches!(controller.swap(0, 1).await, Err(Error::NotFound(_))));
}

#[tokio::test(start_paused = true)]
async fn test_shuffle_keeps_selection_on_same_entry() {
    let dir = tempfile::tempdir().unwrap();
    let backend = MockBackend::new(LONG, StreamScript::Succeed);
    let controller = controller_with(&backend);
    fill(&controller, dir.path(), &["a.mp3", "b.mp3", "c.mp3", "d.mp3", "e.mp3"]).await;

    controller.select(2).await.unwrap();
    let mapping = controller.shuffle().await;

    let mut sorted = mapping.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, vec![1, 2, 3, 4, 5]);
    assert_eq!(controller.now_playing(), Some(mapping[1]));
    assert_eq!(title_of(&controller, mapping[1]).await, "b");
}

#[tokio::test(start_paused = true)]
async fn test_clear_stops_playback() {
    let dir = tempfile::tempdir().unwrap();
    let backend = MockBackend::new(LONG, StreamScript::Succeed);
    let controller = controller_with(&backend);
    fill(&controller, dir.path(), &["a.mp3", "b.mp3"]).await;
    controller.play(None).await.unwrap();

    controller.clear().await.unwrap();

    assert_eq!(controller.engine().state(), TransportState::Stopped);
    assert_eq!(controller.playlist().read().await.count(), 0);
    assert_eq!(controller.now_playing(), None);
}

#[tokio::test]
async fn test_add_stream_validates_scheme() {
    let backend = MockBackend::new(LONG, StreamScript::Succeed);
    let controller = controller_with(&backend);

    let number = controller
        .add_stream("http://radio.example.com/live", Some("Jazz FM".to_string()))
        .await
        .unwrap();
    assert_eq!(number, 1);
    assert_eq!(title_of(&controller, 1).await, "Jazz FM");

    // No title: the URI stands in, shown as a placeholder
    controller
        .add_stream("https://radio.example.com/other", None)
        .await
        .unwrap();
    assert_eq!(title_of(&controller, 2).await, "--");

    assert!(matches!(
        controller.add_stream("ftp://radio.example.com/live", None).await,
        Err(Error::Playlist(_))
    ));
    assert!(matches!(
        controller.add_stream("not a uri", None).await,
        Err(Error::Playlist(_))
    ));
    assert_eq!(controller.playlist().read().await.count(), 2);
}

#[tokio::test]
async fn test_add_folder_probes_audio_files_in_order() {
    let dir = tempfile::tempdir().unwrap();
    generate_silent_wav(dir.path().join("b.wav"), 2000).unwrap();
    generate_silent_wav(dir.path().join("a.wav"), 1000).unwrap();
    std::fs::write(dir.path().join("notes.txt"), "not audio").unwrap();
    std::fs::create_dir(dir.path().join("sub")).unwrap();
    generate_silent_wav(dir.path().join("sub").join("c.wav"), 1000).unwrap();

    let backend = MockBackend::new(LONG, StreamScript::Succeed);
    let controller = controller_with(&backend);
    let added = controller.add_folder(dir.path()).await.unwrap();

    assert_eq!(added, vec![1, 2, 3]);
    let playlist = controller.playlist();
    let playlist = playlist.read().await;
    let titles: Vec<_> = playlist.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["a", "b", "c"]);
    assert_eq!(playlist.get_item(2).unwrap().duration_seconds, 2);
}

#[tokio::test]
async fn test_add_folder_rejects_non_directory() {
    let dir = tempfile::tempdir().unwrap();
    let backend = MockBackend::new(LONG, StreamScript::Succeed);
    let controller = controller_with(&backend);

    assert!(matches!(
        controller.add_folder(&dir.path().join("nope")).await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn test_add_file_uses_probed_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Intro.wav");
    generate_silent_wav(&path, 3000).unwrap();

    let backend = MockBackend::new(LONG, StreamScript::Succeed);
    let controller = controller_with(&backend);
    let number = controller.add_file(&path).await.unwrap();

    let playlist = controller.playlist();
    let playlist = playlist.read().await;
    let track = playlist.get_item(number).unwrap();
    assert_eq!(track.title, "Intro");
    assert_eq!(track.duration_seconds, 3);
    assert!(track.local_path().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_save_and_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let backend = MockBackend::new(LONG, StreamScript::Succeed);
    let controller = controller_with(&backend);
    fill(&controller, dir.path(), &["a.mp3", "b.mp3"]).await;
    controller
        .add_stream("http://radio.example.com/live", Some("Radio".to_string()))
        .await
        .unwrap();
    let original = controller.snapshot().await.items;

    let target = dir.path().join("list.m3u");
    assert_eq!(controller.save_playlist(Some(&target)).await.unwrap(), target);
    let text = std::fs::read_to_string(&target).unwrap();
    assert!(text.starts_with("#EXTM3U\n"));
    assert!(text.contains("\na.mp3\n"));

    controller.new_playlist().await.unwrap();
    assert!(controller.playlist_path().is_none());
    assert!(matches!(
        controller.save_playlist(None).await,
        Err(Error::Playlist(_))
    ));

    assert_eq!(controller.load_playlist(&target).await.unwrap(), 3);
    let loaded = controller.snapshot().await;
    assert_eq!(loaded.path.as_deref(), Some(target.as_path()));
    for (before, after) in original.iter().zip(&loaded.items) {
        assert_eq!(before.title, after.title);
        assert_eq!(before.source, after.source);
        assert_eq!(before.track_number, after.track_number);
    }
    assert_eq!(loaded.items[0].artist, "Test Artist");
    assert_eq!(loaded.items[0].duration_seconds, 180);

    // Saving again goes to the remembered file
    assert_eq!(controller.save_playlist(None).await.unwrap(), target);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_load_leaves_playlist_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let backend = MockBackend::new(LONG, StreamScript::Succeed);
    let controller = controller_with(&backend);
    fill(&controller, dir.path(), &["a.mp3"]).await;

    let bad = dir.path().join("bad.m3u");
    std::fs::write(&bad, "just some text\n").unwrap();

    assert!(matches!(
        controller.load_playlist(&bad).await,
        Err(Error::InvalidPlaylist(_))
    ));
    assert_eq!(controller.playlist().read().await.count(), 1);
    assert!(controller.playlist_path().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_status_reflects_engine() {
    let dir = tempfile::tempdir().unwrap();
    let backend = MockBackend::new(LONG, StreamScript::Succeed);
    let controller = controller_with(&backend);
    fill(&controller, dir.path(), &["a.mp3"]).await;

    controller.play(Some(0.4)).await.unwrap();
    let status = controller.status();

    assert_eq!(status.state, TransportState::Playing);
    assert_eq!(status.now_playing, Some(1));
    assert!(status.bound);
    assert_eq!(status.duration_ms, Some(180_000));
    assert_eq!(status.volume, 0.4);
}
