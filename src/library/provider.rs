//! Resolving queue entries into something the output adapter can open.
//!
//! Resolution may touch the filesystem (or, for catalog tracks, a network
//! service), so the engine runs it off its own thread and hands it a
//! `CancelToken` that flips when the load is superseded.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use lofty::file::TaggedFileExt;
use lofty::tag::ItemKey;
use thiserror::Error;
use tracing::debug;

use super::model::{TrackRef, TrackSource};

/// Shared flag telling an in-flight resolution that nobody wants its result.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What the output adapter is asked to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayableSource {
    File(PathBuf),
    /// A resolved streaming URL. These can expire, so they are fetched on
    /// every load rather than cached on the `TrackRef`.
    Stream(String),
}

/// Fully resolved track, ready to hand to the output adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTrack {
    pub source: PlayableSource,
    /// Raw LRC text, if any was found.
    pub lyrics: Option<String>,
    pub duration: Option<Duration>,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("file not found: {0}")]
    Missing(PathBuf),
    #[error("no catalog available to resolve remote track {0}")]
    RemoteUnsupported(u64),
    #[error("resolution cancelled")]
    Cancelled,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Source of detailed, playable track information.
pub trait TrackProvider: Send + Sync {
    fn resolve(&self, track: &TrackRef, cancel: &CancelToken)
    -> Result<ResolvedTrack, ProviderError>;
}

/// Resolves local files and their lyrics. Remote ids are reported as
/// unavailable since no catalog client is configured.
#[derive(Debug, Clone)]
pub struct LibraryProvider {
    lyrics_extension: String,
}

impl LibraryProvider {
    pub fn new(lyrics_extension: impl Into<String>) -> Self {
        Self {
            lyrics_extension: lyrics_extension.into(),
        }
    }

    /// Look for `<stem>.<ext>` next to the audio file, then an embedded lyrics tag.
    fn find_lyrics(&self, path: &Path) -> Option<String> {
        let sidecar = path.with_extension(&self.lyrics_extension);
        if sidecar.is_file() {
            match fs::read_to_string(&sidecar) {
                Ok(text) => return Some(text),
                Err(e) => debug!(path = %sidecar.display(), error = %e, "unreadable lyrics file"),
            }
        }

        let tagged = lofty::read_from_path(path).ok()?;
        let tag = tagged.primary_tag().or_else(|| tagged.first_tag())?;
        tag.get_string(&ItemKey::Lyrics)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    }
}

impl Default for LibraryProvider {
    fn default() -> Self {
        Self::new("lrc")
    }
}

impl TrackProvider for LibraryProvider {
    fn resolve(
        &self,
        track: &TrackRef,
        cancel: &CancelToken,
    ) -> Result<ResolvedTrack, ProviderError> {
        let path = match &track.source {
            TrackSource::Local { path } => path,
            TrackSource::Remote { id } => return Err(ProviderError::RemoteUnsupported(*id)),
        };

        if !path.is_file() {
            return Err(ProviderError::Missing(path.clone()));
        }
        if cancel.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }

        Ok(ResolvedTrack {
            source: PlayableSource::File(path.clone()),
            lyrics: self.find_lyrics(path),
            duration: track.duration,
        })
    }
}
