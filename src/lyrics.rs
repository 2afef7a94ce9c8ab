//! Time-synced lyrics: LRC parsing and playback-position lookup.

mod parse;
mod sync;

pub use parse::*;
pub use sync::LyricSynchronizer;

/// One timed lyric line.
#[derive(Debug, Clone, PartialEq)]
pub struct LyricSlice {
    pub timestamp_ms: f64,
    pub text: String,
}

impl LyricSlice {
    pub fn new(timestamp_ms: f64, text: impl Into<String>) -> Self {
        Self {
            timestamp_ms,
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests;
