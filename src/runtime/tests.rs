use std::path::Path;

use super::startup::{initial_commands, queue_name};
use crate::audio::AudioCmd;
use crate::config::Settings;
use crate::library::TrackRef;
use crate::persist::{PersistedQueues, PersistedSession};

fn tracks() -> Vec<TrackRef> {
    vec![
        TrackRef::local("/music/a.mp3", "a"),
        TrackRef::local("/music/b.mp3", "b"),
    ]
}

fn saved(name: &str) -> (PersistedQueues, PersistedSession) {
    let queues = PersistedQueues {
        name: name.to_string(),
        main: tracks(),
        shuffled: None,
    };
    let session = PersistedSession {
        current_index: Some(1),
        ..PersistedSession::default()
    };
    (queues, session)
}

#[test]
fn queue_name_is_prefixed_with_folder() {
    assert_eq!(queue_name(Path::new("/music")), "Folder:/music");
}

#[test]
fn fresh_start_sends_plain_queue() {
    let cmds = initial_commands("Folder:/music", tracks(), &Settings::default(), None);
    assert_eq!(cmds.len(), 1);
    assert!(matches!(
        &cmds[0],
        AudioCmd::SetQueue { name, tracks } if name == "Folder:/music" && tracks.len() == 2
    ));
}

#[test]
fn shuffle_setting_sends_shuffled_queue() {
    let mut settings = Settings::default();
    settings.playback.shuffle = true;
    let cmds = initial_commands("Folder:/music", tracks(), &settings, None);
    assert!(matches!(&cmds[0], AudioCmd::SetShuffledQueue { .. }));
}

#[test]
fn matching_saved_session_is_restored_first() {
    let mut settings = Settings::default();
    settings.playback.shuffle = true;
    let cmds = initial_commands(
        "Folder:/music",
        tracks(),
        &settings,
        Some(saved("Folder:/music")),
    );
    assert_eq!(cmds.len(), 2);
    assert!(matches!(
        &cmds[0],
        AudioCmd::Restore { session, .. } if session.current_index == Some(1)
    ));
    assert!(matches!(&cmds[1], AudioCmd::SetQueue { .. }));
}

#[test]
fn saved_session_for_other_folder_is_ignored() {
    let cmds = initial_commands(
        "Folder:/music",
        tracks(),
        &Settings::default(),
        Some(saved("Folder:/elsewhere")),
    );
    assert_eq!(cmds.len(), 1);
    assert!(matches!(&cmds[0], AudioCmd::SetQueue { .. }));
}
