//! The seam between the engine and whatever actually decodes audio.

use std::time::Duration;

use thiserror::Error;

use crate::library::PlayableSource;

/// Opaque id of a loaded stream. Calls carrying a handle that is no
/// longer live are ignored by implementations.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct StreamHandle(pub u64);

/// Things the output reports back on its own.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OutputEvent {
    /// The stream played to its end.
    End(StreamHandle),
    /// The stream holds audio but its position stopped advancing.
    Stall(StreamHandle),
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),
    #[error("cannot decode {path}: {reason}")]
    Decode { path: String, reason: String },
    #[error("audio device error: {0}")]
    Device(String),
}

/// Decode/output engine driven by `PlaybackEngine`.
///
/// At most one handle is live at a time; the engine always calls `stop`
/// on the previous handle before issuing a new `load`.
pub trait AudioOutput {
    fn load(&mut self, source: &PlayableSource) -> Result<StreamHandle, LoadError>;
    fn play(&mut self, handle: StreamHandle);
    fn pause(&mut self, handle: StreamHandle);
    /// Stop and release the stream.
    fn stop(&mut self, handle: StreamHandle);
    fn seek_to(&mut self, handle: StreamHandle, position: Duration);
    /// 0.0 (silent) to 1.0 (full).
    fn set_volume(&mut self, handle: StreamHandle, volume: f32);
    /// Relative tempo change; 0 is normal speed, 25 is 1.25x.
    ///
    /// Implementations may not preserve pitch. `RodioOutput` resamples, so
    /// pitch rises and falls with tempo.
    fn set_tempo_percent(&mut self, handle: StreamHandle, percent: f32);
    fn position(&self, handle: StreamHandle) -> Duration;
    fn length(&self, handle: StreamHandle) -> Option<Duration>;
    fn poll_event(&mut self) -> Option<OutputEvent>;

    /// Ramp the volume down before a quit. Blocks for up to `duration`.
    fn fade_out(&mut self, _handle: StreamHandle, _duration: Duration) {}
}
