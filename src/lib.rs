//! reprise: a terminal music player built around a single-writer playback
//! engine with a shuffle-aware queue, synced lyrics and MPRIS controls.

pub mod app;
pub mod audio;
pub mod config;
pub mod error;
pub mod events;
pub mod library;
pub mod logging;
pub mod lyrics;
pub mod mpris;
pub mod persist;
pub mod queue;
pub mod runtime;
pub mod ui;

pub use error::{Error, Result};
