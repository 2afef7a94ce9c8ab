use std::sync::{Arc, Mutex};

use super::*;
use crate::audio::{
    FailureAction, FailureKind, PlaybackHandle, PlaybackInfo, QueueHandle, QueueSnapshot,
};
use crate::events::PlayerEvent;
use crate::library::{TrackRef, TrackSource};
use crate::queue::QueueEntry;

fn handles(len: usize) -> (PlaybackHandle, QueueHandle) {
    let entries = (0..len)
        .map(|i| QueueEntry {
            index: i as u32,
            track: TrackRef::local(format!("/m/{i}.mp3"), format!("T{i}")),
        })
        .collect();
    let queue = QueueSnapshot {
        name: "Folder:/m".into(),
        shuffle: false,
        entries,
    };
    (
        Arc::new(Mutex::new(PlaybackInfo::default())),
        Arc::new(Mutex::new(queue)),
    )
}

fn set_playing(handle: &PlaybackHandle, idx: Option<usize>) {
    handle.lock().unwrap().index = idx;
}

#[test]
fn refresh_copies_snapshots() {
    let (playback, queue) = handles(3);
    let mut app = App::new(playback, queue);
    assert!(!app.has_tracks());

    app.refresh();
    assert_eq!(app.len(), 3);
    assert_eq!(app.queue().name, "Folder:/m");
    assert_eq!(app.selected_track().unwrap().title, "T0");
}

#[test]
fn cursor_follows_playback_until_user_moves() {
    let (playback, queue) = handles(5);
    let mut app = App::new(playback.clone(), queue);

    set_playing(&playback, Some(3));
    app.refresh();
    assert_eq!(app.selected, 3);

    app.follow_playback_off();
    app.prev();
    set_playing(&playback, Some(4));
    app.refresh();
    assert_eq!(app.selected, 2);

    app.follow_playback_on();
    app.refresh();
    assert_eq!(app.selected, 4);
}

#[test]
fn pending_follow_waits_for_engine() {
    let (playback, queue) = handles(5);
    let mut app = App::new(playback.clone(), queue);
    set_playing(&playback, Some(0));
    app.refresh();

    app.follow_index(3);
    app.refresh();
    assert_eq!(app.selected, 3, "stale index must not pull the cursor back");
    assert_eq!(app.pending_follow_index, Some(3));

    set_playing(&playback, Some(3));
    app.refresh();
    assert_eq!(app.pending_follow_index, None);

    set_playing(&playback, Some(4));
    app.refresh();
    assert_eq!(app.selected, 4);
}

#[test]
fn selection_wraps_and_clamps() {
    let (playback, queue) = handles(3);
    let mut app = App::new(playback, queue.clone());
    app.follow_playback_off();
    app.refresh();

    app.prev();
    assert_eq!(app.selected, 2);
    app.next();
    assert_eq!(app.selected, 0);
    app.select_last();
    assert_eq!(app.selected, 2);

    queue.lock().unwrap().entries.truncate(1);
    app.refresh();
    assert_eq!(app.selected, 0);

    queue.lock().unwrap().entries.clear();
    app.refresh();
    app.next();
    assert_eq!(app.selected, 0);
    assert!(app.selected_track().is_none());
}

#[test]
fn failure_events_become_notice() {
    let (playback, queue) = handles(1);
    let mut app = App::new(playback, queue);
    app.on_event(&PlayerEvent::SpeedChanged(1.5));
    assert!(app.notice.is_none());

    app.on_event(&PlayerEvent::TrackFailed {
        track: TrackSource::Local {
            path: "/m/0.mp3".into(),
        },
        kind: FailureKind::SourceUnavailable,
        action: FailureAction::Skip,
    });
    let notice = app.notice.unwrap();
    assert!(notice.contains("/m/0.mp3"), "{notice}");
    assert!(notice.contains("source unavailable"), "{notice}");
}

#[test]
fn lyrics_panel_toggles() {
    let (playback, queue) = handles(1);
    let mut app = App::new(playback, queue);
    assert!(app.show_lyrics);
    app.toggle_lyrics();
    assert!(!app.show_lyrics);
}
