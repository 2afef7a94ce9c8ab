use std::path::PathBuf;

use serde::Deserialize;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/reprise/config.toml` or `~/.config/reprise/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `REPRISE__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub audio: AudioSettings,
    pub ui: UiSettings,
    pub controls: ControlsSettings,
    pub playback: PlaybackSettings,
    pub lyrics: LyricsSettings,
    pub library: LibrarySettings,
    pub logging: LoggingSettings,
    pub state: StateSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Position clock interval while playing (milliseconds).
    pub tick_interval_ms: u64,
    /// How long the audio thread sleeps between output polls when idle (milliseconds).
    pub idle_poll_ms: u64,
    /// A playing stream whose position does not advance for this long is
    /// reported as stalled (milliseconds). 0 disables stall detection.
    pub stall_timeout_ms: u64,
    /// Fade-out duration when quitting (milliseconds).
    /// Set to 0 to stop immediately.
    pub quit_fade_out_ms: u64,
    /// Publish an MPRIS service on the session bus.
    pub mpris: bool,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 250,
            idle_poll_ms: 200,
            stall_timeout_ms: 8000,
            quit_fade_out_ms: 500,
            mpris: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// Whether the cursor starts in "follow playback" mode.
    pub follow_playback: bool,

    /// The text rendered inside the top header box.
    pub header_text: String,

    /// Whether the lyrics panel is shown next to the queue.
    pub show_lyrics: bool,

    /// Which track fields to show in the status "Song:" line, and in what order.
    ///
    /// Example: ["artist", "title", "album"]
    pub now_playing_track_fields: Vec<TrackDisplayField>,

    /// Separator used to join `now_playing_track_fields`.
    pub now_playing_track_separator: String,

    /// Which time fields to show for the status line, and in what order.
    ///
    /// Example: ["elapsed", "total", "remaining"]
    pub now_playing_time_fields: Vec<TimeField>,

    /// Separator used to join `now_playing_time_fields`.
    pub now_playing_time_separator: String,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            follow_playback: true,
            header_text: " reprise ".to_string(),
            show_lyrics: true,
            now_playing_track_fields: vec![TrackDisplayField::Display],
            now_playing_track_separator: " - ".to_string(),
            now_playing_time_fields: vec![TimeField::Elapsed, TimeField::Total, TimeField::Remaining],
            now_playing_time_separator: " / ".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControlsSettings {
    /// Number of seconds to scrub when pressing `H` / `L`.
    pub scrub_seconds: u64,
    /// Volume change per keypress, on the 0-100 scale.
    pub volume_step: u8,
    /// Speed change per keypress (1.0 = normal).
    pub speed_step: f32,
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self {
            scrub_seconds: 5,
            volume_step: 5,
            speed_step: 0.1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Whether shuffle starts enabled.
    pub shuffle: bool,
    /// Default repeat mode.
    pub repeat_mode: RepeatModeSetting,
    /// Starting volume, 0-100.
    pub volume: u8,
    /// Starting playback speed (1.0 = normal).
    pub speed: f32,
    /// Consecutive local failures tolerated before playback stops.
    pub max_consecutive_failures: u8,
    /// Restore the last queue and session on startup when the library matches.
    pub restore_session: bool,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            shuffle: false,
            repeat_mode: RepeatModeSetting::All,
            volume: 100,
            speed: 1.0,
            max_consecutive_failures: 2,
            restore_session: true,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepeatModeSetting {
    #[serde(alias = "none", alias = "no-loop", alias = "no_loop")]
    Off,
    #[serde(alias = "loop-all", alias = "loop_all", alias = "loop-around")]
    All,
    #[serde(alias = "loop-one", alias = "loop_one", alias = "repeat-one")]
    One,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LyricsSettings {
    /// Blank lyric runs longer than this collapse into one placeholder (milliseconds).
    pub blank_gap_ms: u64,
    /// Text shown for a collapsed blank run.
    pub placeholder: String,
    /// Extension of sidecar lyric files next to the audio file.
    pub sidecar_extension: String,
}

impl Default for LyricsSettings {
    fn default() -> Self {
        Self {
            blank_gap_ms: 5000,
            placeholder: "•••".to_string(),
            sidecar_extension: "lrc".to_string(),
        }
    }
}

#[derive(Debug, Copy, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeField {
    Elapsed,
    Total,
    Remaining,
}

#[derive(Debug, Copy, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrackDisplayField {
    /// Use `track.display` (whatever the scanner produced).
    Display,
    Title,
    Artist,
    Album,
    Filename,
    Path,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Optional cap on directory recursion depth.
    pub max_depth: Option<usize>,

    /// Which fields to use to build `TrackRef.display` and its ordering.
    ///
    /// Example: ["artist", "title"] -> "Artist - Title"
    pub display_fields: Vec<TrackDisplayField>,
    /// Separator used to join `display_fields`.
    pub display_separator: String,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            extensions: vec!["mp3".into(), "flac".into(), "wav".into(), "ogg".into()],
            follow_links: true,
            include_hidden: false,
            recursive: true,
            max_depth: None,
            display_fields: vec![TrackDisplayField::Artist, TrackDisplayField::Title],
            display_separator: " - ".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Directory for the rolling log files. Defaults to `<state dir>/logs`.
    pub directory: Option<PathBuf>,
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: None,
            filter: "reprise=debug,warn".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StateSettings {
    /// Whether queue and session are saved on quit.
    pub enabled: bool,
    /// Override for the state directory.
    pub directory: Option<PathBuf>,
}

impl Default for StateSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: None,
        }
    }
}
