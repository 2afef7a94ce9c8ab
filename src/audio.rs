//! Audio playback core.
//!
//! `PlaybackEngine` (the state machine) runs on a dedicated audio thread and
//! is driven through `AudioPlayer`. The engine talks to sound hardware only
//! through the `AudioOutput` trait; `RodioOutput` is the real implementation.

mod clock;
mod engine;
mod failure;
mod output;
mod player;
mod sink;
mod thread;
mod types;

pub use clock::PositionClock;
pub use engine::{EngineOptions, LoadRequest, PlaybackEngine, SharedState};
pub use failure::{FailureAction, FailureHandler, FailureKind};
pub use output::{AudioOutput, LoadError, OutputEvent, StreamHandle};
pub use player::{AudioPlayer, PlayerDeps};
pub use sink::RodioOutput;
pub use types::*;
