use std::{env, path::PathBuf};

use super::schema::Settings;
use crate::error::{Error, Result};

/// Configuration loading helpers.
///
/// `Settings::load` tries environment variables first (prefix `REPRISE__`), then an
/// optional config file and falls back to struct defaults.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("REPRISE")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Reject settings the player cannot run with.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(Error::InvalidSetting(msg.to_string()));

        if self.audio.tick_interval_ms == 0 {
            return invalid("audio.tick_interval_ms must be >= 1");
        }
        if self.audio.idle_poll_ms == 0 {
            return invalid("audio.idle_poll_ms must be >= 1");
        }
        if self.playback.volume > 100 {
            return invalid("playback.volume must be between 0 and 100");
        }
        if self.playback.speed.is_nan() || self.playback.speed <= 0.0 {
            return invalid("playback.speed must be > 0");
        }
        if self.controls.speed_step <= 0.0 {
            return invalid("controls.speed_step must be > 0");
        }
        if self.lyrics.sidecar_extension.trim().is_empty() {
            return invalid("lyrics.sidecar_extension must not be empty");
        }
        Ok(())
    }
}

/// Resolve the config path from `REPRISE_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("REPRISE_CONFIG_PATH") {
        return Some(PathBuf::from(p));
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/reprise/config.toml`
/// or `~/.config/reprise/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    xdg_dir("XDG_CONFIG_HOME", ".config").map(|d| d.join("reprise").join("config.toml"))
}

/// `$XDG_STATE_HOME/reprise` or `~/.local/state/reprise`.
pub fn default_state_dir() -> Option<PathBuf> {
    xdg_dir("XDG_STATE_HOME", ".local/state").map(|d| d.join("reprise"))
}

fn xdg_dir(var: &str, home_fallback: &str) -> Option<PathBuf> {
    if let Some(xdg) = env::var_os(var) {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(home_fallback))
    }
}
