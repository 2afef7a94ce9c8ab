use std::fmt;

use tracing::warn;

use crate::library::TrackRef;
use crate::queue::QueueManager;

use super::types::{PlaybackSession, RepeatMode};

/// Why the current track could not be played.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// Resolution or decoding failed.
    SourceUnavailable,
    /// The stream stopped advancing mid-play.
    Stall,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceUnavailable => f.write_str("source unavailable"),
            Self::Stall => f.write_str("stalled"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FailureAction {
    Stop,
    /// Move on as if the user pressed next.
    Skip,
}

/// Decides between skipping past a broken track and giving up.
#[derive(Debug, Clone)]
pub struct FailureHandler {
    threshold: u8,
}

impl Default for FailureHandler {
    fn default() -> Self {
        Self::new(2)
    }
}

impl FailureHandler {
    pub fn new(threshold: u8) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Repeat-one and remote tracks stop straight away. Local tracks are
    /// flagged unplayable in the queue and skipped until more than
    /// `threshold` failures happen in a row.
    pub fn on_failure(
        &self,
        session: &mut PlaybackSession,
        track: &TrackRef,
        kind: FailureKind,
        queue: &mut QueueManager,
    ) -> FailureAction {
        if session.repeat_mode == RepeatMode::One || track.is_remote() {
            warn!(track = %track.source, %kind, repeat = ?session.repeat_mode, "playback failed, stopping");
            return FailureAction::Stop;
        }

        queue.mark_unavailable(track.identity());
        session.consecutive_failures = session.consecutive_failures.saturating_add(1);

        if session.consecutive_failures > self.threshold {
            warn!(
                track = %track.source,
                %kind,
                failures = session.consecutive_failures,
                "too many consecutive failures, stopping"
            );
            session.consecutive_failures = 0;
            FailureAction::Stop
        } else {
            warn!(
                track = %track.source,
                %kind,
                failures = session.consecutive_failures,
                "playback failed, skipping"
            );
            FailureAction::Skip
        }
    }

    pub fn on_success(&self, session: &mut PlaybackSession) {
        session.consecutive_failures = 0;
    }
}
