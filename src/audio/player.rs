use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::events::{PlayerEvent, Topic};
use crate::library::TrackProvider;
use crate::mpris::TransportBridge;
use crate::persist::StateStore;

use super::engine::{EngineOptions, SharedState};
use super::output::{AudioOutput, LoadError};
use super::sink::RodioOutput;
use super::thread::{Msg, ThreadParts, spawn_audio_thread};
use super::types::{AudioCmd, PlaybackHandle, QueueHandle};

/// Collaborators handed to the audio thread.
pub struct PlayerDeps {
    pub provider: Arc<dyn TrackProvider>,
    pub bridge: Box<dyn TransportBridge>,
    pub store: Option<Box<dyn StateStore>>,
}

/// Command handle for the audio thread.
pub struct AudioPlayer {
    tx: Sender<Msg>,
    shared: SharedState,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl AudioPlayer {
    /// Spawn the audio thread with an output built by `make_output` on that
    /// thread. Fails if the output cannot be created.
    pub fn spawn<O, F>(make_output: F, deps: PlayerDeps, settings: &Settings) -> Result<Self>
    where
        O: AudioOutput,
        F: FnOnce() -> std::result::Result<O, LoadError> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<Msg>();
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);
        let shared = SharedState::default();

        let parts = ThreadParts {
            provider: deps.provider,
            bridge: deps.bridge,
            store: deps.store,
            shared: shared.clone(),
            options: EngineOptions::from_settings(settings),
            idle_poll: Duration::from_millis(settings.audio.idle_poll_ms),
        };
        let join = spawn_audio_thread(make_output, parts, rx, tx.clone(), ready_tx);

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = join.join();
                return Err(Error::Load(e));
            }
            Err(_) => {
                let _ = join.join();
                return Err(Error::AudioOutput("audio thread exited during startup".into()));
            }
        }

        Ok(Self {
            tx,
            shared,
            join: Mutex::new(Some(join)),
        })
    }

    /// Spawn with the default rodio device.
    pub fn with_rodio(deps: PlayerDeps, settings: &Settings) -> Result<Self> {
        let audio = settings.audio.clone();
        Self::spawn(move || RodioOutput::open(&audio), deps, settings)
    }

    pub fn playback_handle(&self) -> PlaybackHandle {
        self.shared.playback.clone()
    }

    pub fn queue_handle(&self) -> QueueHandle {
        self.shared.queue.clone()
    }

    pub fn subscribe(&self, topics: &[Topic]) -> Receiver<PlayerEvent> {
        self.shared.events.subscribe(topics)
    }

    pub fn send(&self, cmd: AudioCmd) -> Result<()> {
        self.tx
            .send(Msg::Cmd(cmd))
            .map_err(|_| Error::AudioOutput("audio thread has exited".into()))
    }

    /// Ask the audio thread to fade out, save state and exit, then wait for it.
    pub fn quit_softly(&self, fade_out: Duration) {
        let _ = self.send(AudioCmd::Quit {
            fade_out_ms: fade_out.as_millis() as u64,
        });

        if let Ok(mut j) = self.join.lock() {
            if let Some(h) = j.take() {
                let _ = h.join();
            }
        }
    }
}
