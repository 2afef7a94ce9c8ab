use std::fs;
use std::path::{Path, PathBuf};

use tempfile::tempdir;

use super::*;
use crate::config::TrackDisplayField;

#[test]
fn display_from_fields_can_format_artist_title() {
    let track = TrackRef::local("/tmp/Song.mp3", "Song").with_artist("  Artist  ");
    assert_eq!(
        display_from_fields(
            &track,
            &[TrackDisplayField::Artist, TrackDisplayField::Title],
            " - "
        ),
        "Artist - Song"
    );

    let bare = TrackRef::local("/tmp/Song.mp3", "Song");
    assert_eq!(
        display_from_fields(
            &bare,
            &[TrackDisplayField::Artist, TrackDisplayField::Title],
            " - "
        ),
        "Song"
    );
}

#[test]
fn display_from_fields_handles_remote_tracks() {
    let track = TrackRef::remote(42, "Stream");
    assert_eq!(
        display_from_fields(
            &track,
            &[TrackDisplayField::Filename, TrackDisplayField::Path],
            " | "
        ),
        "remote:42"
    );
}

#[test]
fn identity_distinguishes_local_paths_and_remote_ids() {
    let a = TrackRef::local("/music/a.mp3", "A");
    let a_retitled = TrackRef::local("/music/a.mp3", "Other title");
    let remote = TrackRef::remote(7, "A");

    assert_eq!(a.identity(), a_retitled.identity());
    assert_ne!(a.identity(), remote.identity());
    assert_eq!(remote.identity(), &TrackSource::Remote { id: 7 });
    assert_eq!(a.local_path(), Some(Path::new("/music/a.mp3")));
    assert!(remote.local_path().is_none());
}

#[test]
fn library_provider_resolves_file_with_sidecar_lyrics() {
    let dir = tempdir().unwrap();
    let audio = dir.path().join("song.mp3");
    fs::write(&audio, b"not real audio").unwrap();
    fs::write(dir.path().join("song.lrc"), "[00:01.00]hello").unwrap();

    let provider = LibraryProvider::default();
    let resolved = provider
        .resolve(&TrackRef::local(&audio, "song"), &CancelToken::new())
        .unwrap();

    assert_eq!(resolved.source, PlayableSource::File(audio));
    assert_eq!(resolved.lyrics.as_deref(), Some("[00:01.00]hello"));
}

#[test]
fn library_provider_reports_missing_files_and_remote_ids() {
    let provider = LibraryProvider::default();
    let token = CancelToken::new();

    let missing = provider.resolve(
        &TrackRef::local(PathBuf::from("/definitely/not/here.mp3"), "x"),
        &token,
    );
    assert!(matches!(missing, Err(ProviderError::Missing(_))));

    let remote = provider.resolve(&TrackRef::remote(9, "r"), &token);
    assert!(matches!(remote, Err(ProviderError::RemoteUnsupported(9))));
}

#[test]
fn library_provider_honours_cancellation() {
    let dir = tempdir().unwrap();
    let audio = dir.path().join("song.mp3");
    fs::write(&audio, b"not real audio").unwrap();

    let token = CancelToken::new();
    token.cancel();
    let result = LibraryProvider::default().resolve(&TrackRef::local(&audio, "song"), &token);
    assert!(matches!(result, Err(ProviderError::Cancelled)));
}

#[test]
fn track_ref_serde_keeps_source_kind_tag() {
    let track = TrackRef::remote(5, "Remote").with_artist("Someone");
    let text = toml::to_string(&track).unwrap();
    assert!(text.contains("kind = \"remote\""), "{text}");

    let back: TrackRef = toml::from_str(&text).unwrap();
    assert_eq!(back, track);
    assert!(back.can_play());
}
