//! Saving and restoring the play queue and session between runs.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::audio::RepeatMode;
use crate::config::{StateSettings, default_state_dir};
use crate::library::{TrackRef, TrackSource};

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("no state directory could be determined")]
    NoStateDir,
    #[error("state I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("cannot serialize state: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedQueues {
    pub name: String,
    pub main: Vec<TrackRef>,
    pub shuffled: Option<Vec<TrackRef>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedSession {
    pub current_index: Option<usize>,
    pub shuffle_on: bool,
    pub repeat_mode: RepeatMode,
    pub is_muted: bool,
    pub volume: u8,
    pub speed: f32,
    /// Identity of the track that was current, tagged with its source kind.
    pub current_track: Option<TrackSource>,
}

impl Default for PersistedSession {
    fn default() -> Self {
        Self {
            current_index: None,
            shuffle_on: false,
            repeat_mode: RepeatMode::default(),
            is_muted: false,
            volume: 100,
            speed: 1.0,
            current_track: None,
        }
    }
}

/// Where queue and session live between runs.
pub trait StateStore: Send {
    fn load_queues(&self) -> Result<PersistedQueues, PersistError>;
    fn load_session(&self) -> Result<PersistedSession, PersistError>;
    fn save_queues(&self, queues: &PersistedQueues) -> Result<(), PersistError>;
    fn save_session(&self, session: &PersistedSession) -> Result<(), PersistError>;

    fn save(&self, queues: &PersistedQueues, session: &PersistedSession) -> Result<(), PersistError> {
        self.save_queues(queues)?;
        self.save_session(session)
    }

    /// Best effort: anything unreadable comes back as defaults.
    fn load_or_default(&self) -> (PersistedQueues, PersistedSession) {
        let queues = self.load_queues().unwrap_or_else(|e| {
            warn!("failed to load saved queue, starting empty: {e}");
            PersistedQueues::default()
        });
        let session = self.load_session().unwrap_or_else(|e| {
            warn!("failed to load saved session, using defaults: {e}");
            PersistedSession::default()
        });
        (queues, session)
    }
}

/// Stores `queue.toml` and `session.toml` in one directory.
#[derive(Debug, Clone)]
pub struct TomlStateStore {
    dir: PathBuf,
}

impl TomlStateStore {
    pub const QUEUE_FILE: &'static str = "queue.toml";
    pub const SESSION_FILE: &'static str = "session.toml";

    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `[state] directory`, then `$REPRISE_STATE_DIR`, then the XDG state dir.
    pub fn from_settings(settings: &StateSettings) -> Result<Self, PersistError> {
        settings
            .directory
            .clone()
            .or_else(|| std::env::var_os("REPRISE_STATE_DIR").map(PathBuf::from))
            .or_else(default_state_dir)
            .map(Self::new)
            .ok_or(PersistError::NoStateDir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read<T: DeserializeOwned + Default>(&self, file: &str) -> Result<T, PersistError> {
        let path = self.dir.join(file);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no saved state");
                return Ok(T::default());
            }
            Err(source) => return Err(PersistError::Io { path, source }),
        };
        toml::from_str(&text).map_err(|source| PersistError::Parse { path, source })
    }

    fn write<T: Serialize>(&self, file: &str, value: &T) -> Result<(), PersistError> {
        let text = toml::to_string(value)?;
        fs::create_dir_all(&self.dir).map_err(|source| PersistError::Io {
            path: self.dir.clone(),
            source,
        })?;

        // Replace the target atomically.
        let path = self.dir.join(file);
        let tmp = path.with_extension("toml.tmp");
        fs::write(&tmp, text).map_err(|source| PersistError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| PersistError::Io { path, source })
    }
}

impl StateStore for TomlStateStore {
    fn load_queues(&self) -> Result<PersistedQueues, PersistError> {
        self.read(Self::QUEUE_FILE)
    }

    fn load_session(&self) -> Result<PersistedSession, PersistError> {
        self.read(Self::SESSION_FILE)
    }

    fn save_queues(&self, queues: &PersistedQueues) -> Result<(), PersistError> {
        self.write(Self::QUEUE_FILE, queues)
    }

    fn save_session(&self, session: &PersistedSession) -> Result<(), PersistError> {
        self.write(Self::SESSION_FILE, session)
    }
}
