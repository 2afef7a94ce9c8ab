use std::path::Path;

use lofty::file::{AudioFile, TaggedFileExt};
use lofty::tag::Accessor;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::display::display_from_fields;
use super::model::TrackRef;

fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
        return false;
    };
    let ext = ext.to_ascii_lowercase();
    settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .any(|e| !e.is_empty() && e == ext)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Read tags into a fresh `TrackRef`. Unreadable tags leave the file-stem title.
fn read_track(path: &Path) -> TrackRef {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("UNKNOWN")
        .to_string();
    let mut track = TrackRef::local(path, stem);

    let tagged = match lofty::read_from_path(path) {
        Ok(t) => t,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "no readable tags");
            return track;
        }
    };

    track.duration = Some(tagged.properties().duration());

    if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
        if let Some(v) = tag.title().filter(|v| !v.trim().is_empty()) {
            track.title = v.trim().to_string();
        }
        if let Some(v) = tag.artist().filter(|v| !v.trim().is_empty()) {
            track.artist = Some(v.trim().to_string());
        }
        if let Some(v) = tag.album().filter(|v| !v.trim().is_empty()) {
            track.album = Some(v.trim().to_string());
        }
    }

    track
}

/// Walk `dir` and build a track list sorted by display text (case-insensitive).
pub fn scan(dir: &Path, settings: &LibrarySettings) -> Vec<TrackRef> {
    let mut walker = WalkDir::new(dir).follow_links(settings.follow_links);

    // Non-recursive = only the root directory.
    let depth_cap = if settings.recursive {
        settings.max_depth
    } else {
        Some(1)
    };
    if let Some(d) = depth_cap {
        walker = walker.max_depth(d);
    }

    let mut tracks: Vec<TrackRef> = walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
        .filter_map(Result::ok)
        .filter(|e| e.path().is_file())
        .filter(|e| is_audio_file(e.path(), settings))
        .map(|e| {
            let mut track = read_track(e.path());
            track.display = display_from_fields(
                &track,
                &settings.display_fields,
                &settings.display_separator,
            );
            track
        })
        .collect();

    tracks.sort_by_key(|t| t.display.to_lowercase());
    info!(dir = %dir.display(), count = tracks.len(), "library scanned");
    tracks
}
