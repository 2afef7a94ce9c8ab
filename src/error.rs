//! Crate-level error type.
//!
//! Boundary-specific errors (`LoadError`, `ProviderError`, `PersistError`)
//! live next to the code that raises them and convert into this one.

use thiserror::Error;

use crate::audio::LoadError;
use crate::library::ProviderError;
use crate::persist::PersistError;

#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file or environment could not be read.
    #[error("configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    /// A setting is present but outside its valid range.
    #[error("invalid setting: {0}")]
    InvalidSetting(String),

    /// The audio device could not be opened or the audio thread is gone.
    #[error("audio output error: {0}")]
    AudioOutput(String),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
