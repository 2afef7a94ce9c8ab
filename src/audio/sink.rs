//! `rodio`-backed `AudioOutput`.
//!
//! Decodes local files into a paused `Sink` on the default output device.
//! Stream URLs are not handled here.

use std::fs::File;
use std::io::BufReader;
use std::thread;
use std::time::{Duration, Instant};

use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use tracing::debug;

use crate::config::AudioSettings;
use crate::library::PlayableSource;

use super::output::{AudioOutput, LoadError, OutputEvent, StreamHandle};

struct LiveStream {
    handle: StreamHandle,
    sink: Sink,
    length: Option<Duration>,
    playing: bool,
    last_pos: Duration,
    last_progress: Instant,
    /// An `End` or `Stall` was already reported for this stream.
    reported: bool,
}

pub struct RodioOutput {
    stream: OutputStream,
    live: Option<LiveStream>,
    next_id: u64,
    stall_timeout: Option<Duration>,
}

impl RodioOutput {
    /// Open the default output device.
    pub fn open(settings: &AudioSettings) -> Result<Self, LoadError> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| LoadError::Device(e.to_string()))?;
        // rodio logs to stderr when OutputStream is dropped, which garbles the TUI.
        stream.log_on_drop(false);

        let stall_timeout =
            (settings.stall_timeout_ms > 0).then(|| Duration::from_millis(settings.stall_timeout_ms));

        Ok(Self {
            stream,
            live: None,
            next_id: 0,
            stall_timeout,
        })
    }

    fn live(&self, handle: StreamHandle) -> Option<&LiveStream> {
        self.live.as_ref().filter(|l| l.handle == handle)
    }

    fn live_mut(&mut self, handle: StreamHandle) -> Option<&mut LiveStream> {
        self.live.as_mut().filter(|l| l.handle == handle)
    }
}

impl AudioOutput for RodioOutput {
    fn load(&mut self, source: &PlayableSource) -> Result<StreamHandle, LoadError> {
        let path = match source {
            PlayableSource::File(path) => path,
            PlayableSource::Stream(url) => {
                return Err(LoadError::SourceUnavailable(format!(
                    "stream playback is not supported: {url}"
                )));
            }
        };

        let file = File::open(path)
            .map_err(|e| LoadError::SourceUnavailable(format!("{}: {e}", path.display())))?;
        let decoder = Decoder::new(BufReader::new(file)).map_err(|e| LoadError::Decode {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let length = decoder.total_duration();

        if let Some(old) = self.live.take() {
            old.sink.stop();
        }

        let sink = Sink::connect_new(self.stream.mixer());
        sink.append(decoder);
        sink.pause();

        self.next_id += 1;
        let handle = StreamHandle(self.next_id);
        self.live = Some(LiveStream {
            handle,
            sink,
            length,
            playing: false,
            last_pos: Duration::ZERO,
            last_progress: Instant::now(),
            reported: false,
        });
        debug!(?handle, path = %path.display(), ?length, "stream loaded");
        Ok(handle)
    }

    fn play(&mut self, handle: StreamHandle) {
        if let Some(live) = self.live_mut(handle) {
            live.sink.play();
            live.playing = true;
            live.last_progress = Instant::now();
        }
    }

    fn pause(&mut self, handle: StreamHandle) {
        if let Some(live) = self.live_mut(handle) {
            live.sink.pause();
            live.playing = false;
        }
    }

    fn stop(&mut self, handle: StreamHandle) {
        if self.live(handle).is_some() {
            if let Some(live) = self.live.take() {
                live.sink.stop();
            }
        }
    }

    fn seek_to(&mut self, handle: StreamHandle, position: Duration) {
        if let Some(live) = self.live_mut(handle) {
            if let Err(e) = live.sink.try_seek(position) {
                debug!(?handle, ?position, "seek failed: {e}");
            }
            live.last_pos = position;
            live.last_progress = Instant::now();
        }
    }

    fn set_volume(&mut self, handle: StreamHandle, volume: f32) {
        if let Some(live) = self.live_mut(handle) {
            live.sink.set_volume(volume.clamp(0.0, 1.0));
        }
    }

    fn set_tempo_percent(&mut self, handle: StreamHandle, percent: f32) {
        if let Some(live) = self.live_mut(handle) {
            // rodio resamples, so pitch moves with tempo.
            live.sink.set_speed((1.0 + percent / 100.0).max(0.05));
        }
    }

    fn position(&self, handle: StreamHandle) -> Duration {
        self.live(handle)
            .map(|l| l.sink.get_pos())
            .unwrap_or(Duration::ZERO)
    }

    fn length(&self, handle: StreamHandle) -> Option<Duration> {
        self.live(handle).and_then(|l| l.length)
    }

    fn poll_event(&mut self) -> Option<OutputEvent> {
        let stall_timeout = self.stall_timeout;
        let live = self.live.as_mut()?;
        if !live.playing || live.reported {
            return None;
        }

        if live.sink.empty() {
            live.reported = true;
            return Some(OutputEvent::End(live.handle));
        }

        let now = Instant::now();
        let pos = live.sink.get_pos();
        if pos != live.last_pos {
            live.last_pos = pos;
            live.last_progress = now;
            return None;
        }

        match stall_timeout {
            Some(timeout) if now.duration_since(live.last_progress) >= timeout => {
                live.reported = true;
                Some(OutputEvent::Stall(live.handle))
            }
            _ => None,
        }
    }

    fn fade_out(&mut self, handle: StreamHandle, duration: Duration) {
        let Some(live) = self.live(handle) else {
            return;
        };
        if duration.is_zero() {
            live.sink.set_volume(0.0);
            return;
        }
        let steps: u32 = 20;
        let start = live.sink.volume();
        let step = (duration / steps).max(Duration::from_millis(1));
        for i in 1..=steps {
            let t = i as f32 / steps as f32;
            live.sink.set_volume(start * (1.0 - t));
            thread::sleep(step);
        }
        live.sink.set_volume(0.0);
    }
}
