use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Where a track's audio comes from. Also serves as the track's identity:
/// local tracks compare by path, remote tracks by catalog id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TrackSource {
    Local { path: PathBuf },
    Remote {
        #[serde(with = "catalog_id")]
        id: u64,
    },
}

/// Catalog ids are written as strings: TOML integers stop at `i64::MAX`.
/// Integer ids from older files still load.
mod catalog_id {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(id: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(id)
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Number(id) => Ok(id),
            Raw::Text(text) => text.parse().map_err(D::Error::custom),
        }
    }
}

impl TrackSource {
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }
}

impl fmt::Display for TrackSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local { path } => write!(f, "{}", path.display()),
            Self::Remote { id } => write!(f, "remote:{id}"),
        }
    }
}

fn default_can_play() -> bool {
    true
}

/// A track as known to the queue: identity, playability and enough
/// metadata to show it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRef {
    pub source: TrackSource,
    pub title: String,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub duration: Option<Duration>,
    /// Cover art location (file path or URI) pushed to the media transport.
    #[serde(default)]
    pub thumbnail: Option<String>,
    pub display: String,
    #[serde(default = "default_can_play")]
    can_play: bool,
}

impl TrackRef {
    /// A local track with `title` as its display text.
    pub fn local(path: impl Into<PathBuf>, title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            source: TrackSource::Local { path: path.into() },
            display: title.clone(),
            title,
            artist: None,
            album: None,
            duration: None,
            thumbnail: None,
            can_play: true,
        }
    }

    /// A catalog track identified by `id`.
    pub fn remote(id: u64, title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            source: TrackSource::Remote { id },
            display: title.clone(),
            title,
            artist: None,
            album: None,
            duration: None,
            thumbnail: None,
            can_play: true,
        }
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = display.into();
        self
    }

    pub fn identity(&self) -> &TrackSource {
        &self.source
    }

    pub fn is_remote(&self) -> bool {
        self.source.is_remote()
    }

    pub fn local_path(&self) -> Option<&Path> {
        match &self.source {
            TrackSource::Local { path } => Some(path),
            TrackSource::Remote { .. } => None,
        }
    }

    pub fn can_play(&self) -> bool {
        self.can_play
    }

    /// Flag set after a load failure; cleared again when a later load succeeds.
    pub fn set_can_play(&mut self, can_play: bool) {
        self.can_play = can_play;
    }
}
