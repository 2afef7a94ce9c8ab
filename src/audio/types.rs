//! Audio-related small types and handles.
//!
//! This module defines the enums and shared snapshots used by the audio
//! subsystem: repeat mode, playback state, commands and the session the
//! engine mutates.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::RepeatModeSetting;
use crate::library::TrackRef;
use crate::lyrics::LyricSlice;
use crate::persist::{PersistedQueues, PersistedSession};
use crate::queue::QueueEntry;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepeatMode {
    /// Stop at the queue boundaries.
    Off,
    /// Wrap around to the other end of the queue.
    #[default]
    All,
    /// Replay the current track when it ends.
    One,
}

impl RepeatMode {
    /// Off -> All -> One -> Off.
    pub fn cycle(self) -> Self {
        match self {
            Self::Off => Self::All,
            Self::All => Self::One,
            Self::One => Self::Off,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::All => "all",
            Self::One => "one",
        }
    }
}

impl From<RepeatModeSetting> for RepeatMode {
    fn from(value: RepeatModeSetting) -> Self {
        match value {
            RepeatModeSetting::Off => Self::Off,
            RepeatModeSetting::All => Self::All,
            RepeatModeSetting::One => Self::One,
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Loading,
    Playing,
    Paused,
}

/// What to do once a requested track has loaded.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PlayIntent {
    /// Start playing as soon as the stream is ready.
    Autoplay,
    /// Load the stream but stay stopped; `Play` starts it without reloading.
    Prime,
}

#[derive(Debug)]
pub enum AudioCmd {
    /// Load and play the track at this index of the active queue.
    PlayIndex(usize),
    Play,
    Pause,
    TogglePause,
    /// Stop playback and release the stream. The queue is untouched.
    Stop,
    Next,
    Prev,
    SeekTo(Duration),
    /// Seek by the specified number of seconds (positive or negative).
    SeekBy(i64),
    /// The user grabbed the progress bar; position updates pause until `EndDrag`.
    BeginDrag,
    EndDrag(Duration),
    /// Volume on the 0-100 scale.
    SetVolume(u8),
    SetMute(bool),
    ToggleMute,
    /// Playback speed, 1.0 = normal.
    SetSpeed(f32),
    SetRepeat(RepeatMode),
    CycleRepeat,
    ToggleShuffle,
    SetQueue {
        name: String,
        tracks: Vec<TrackRef>,
    },
    SetShuffledQueue {
        name: String,
        tracks: Vec<TrackRef>,
    },
    AddNext(Vec<TrackRef>),
    Append(Vec<TrackRef>),
    Remove(usize),
    MoveUp(usize),
    MoveDown(usize),
    /// Empty the queue and return the session to its zero state.
    ClearQueue,
    /// Reinstate persisted queues and session scalars.
    Restore {
        queues: PersistedQueues,
        session: PersistedSession,
    },
    SaveState,
    /// Quit the audio thread, optionally fading out over `fade_out_ms` milliseconds.
    Quit { fade_out_ms: u64 },
}

/// Mutable playback state owned by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSession {
    /// Index into the active queue.
    pub current_index: Option<usize>,
    pub state: PlaybackState,
    pub position: Duration,
    pub total_duration: Option<Duration>,
    /// 0-100.
    pub volume: u8,
    pub is_muted: bool,
    pub speed: f32,
    pub repeat_mode: RepeatMode,
    pub consecutive_failures: u8,
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self {
            current_index: None,
            state: PlaybackState::Stopped,
            position: Duration::ZERO,
            total_duration: None,
            volume: 100,
            is_muted: false,
            speed: 1.0,
            repeat_mode: RepeatMode::default(),
            consecutive_failures: 0,
        }
    }
}

impl PlaybackSession {
    /// Zero state that keeps the user's output preferences.
    pub fn reset(&mut self) {
        *self = Self {
            volume: self.volume,
            is_muted: self.is_muted,
            speed: self.speed,
            repeat_mode: self.repeat_mode,
            ..Self::default()
        };
    }

    /// Volume the output should actually play at, 0.0-1.0.
    pub fn effective_volume(&self) -> f32 {
        if self.is_muted {
            0.0
        } else {
            f32::from(self.volume.min(100)) / 100.0
        }
    }

    pub fn percent(&self) -> f64 {
        match self.total_duration {
            Some(total) if !total.is_zero() => {
                (self.position.as_secs_f64() / total.as_secs_f64() * 100.0).min(100.0)
            }
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
/// Runtime playback information shared with the UI.
pub struct PlaybackInfo {
    pub index: Option<usize>,
    pub track: Option<TrackRef>,
    pub state: PlaybackState,
    pub position: Duration,
    pub duration: Option<Duration>,
    pub percent: f64,
    pub volume: u8,
    pub muted: bool,
    pub speed: f32,
    pub repeat: RepeatMode,
    pub shuffle: bool,
    pub prev_enabled: bool,
    pub next_enabled: bool,
    pub lyrics: Arc<[LyricSlice]>,
    pub lyric_index: Option<usize>,
}

/// Active queue as last published by the engine.
#[derive(Debug, Clone, Default)]
pub struct QueueSnapshot {
    pub name: String,
    pub shuffle: bool,
    pub entries: Vec<QueueEntry>,
}

pub type PlaybackHandle = Arc<Mutex<PlaybackInfo>>;
pub type QueueHandle = Arc<Mutex<QueueSnapshot>>;
