use crate::config::TrackDisplayField;

use super::model::{TrackRef, TrackSource};

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Compose the text shown for `track` from the configured `fields`, joined
/// by `sep`. Falls back to the title when nothing was produced.
pub fn display_from_fields(track: &TrackRef, fields: &[TrackDisplayField], sep: &str) -> String {
    let mut parts: Vec<String> = Vec::new();

    for field in fields {
        match field {
            TrackDisplayField::Display => {
                if let Some(d) = non_blank(Some(&track.display)) {
                    parts.push(d.to_string());
                }
            }
            TrackDisplayField::Title => {
                if let Some(t) = non_blank(Some(&track.title)) {
                    parts.push(t.to_string());
                }
            }
            TrackDisplayField::Artist => {
                if let Some(a) = non_blank(track.artist.as_deref()) {
                    parts.push(a.to_string());
                }
            }
            TrackDisplayField::Album => {
                if let Some(a) = non_blank(track.album.as_deref()) {
                    parts.push(a.to_string());
                }
            }
            TrackDisplayField::Filename => {
                let stem = track
                    .local_path()
                    .and_then(|p| p.file_stem())
                    .and_then(|s| s.to_str());
                if let Some(stem) = non_blank(stem) {
                    parts.push(stem.to_string());
                }
            }
            TrackDisplayField::Path => match &track.source {
                TrackSource::Local { path } => parts.push(path.display().to_string()),
                TrackSource::Remote { id } => parts.push(format!("remote:{id}")),
            },
        }
    }

    if parts.is_empty() {
        track.title.clone()
    } else {
        parts.join(sep)
    }
}
