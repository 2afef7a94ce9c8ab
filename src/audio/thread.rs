use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, SyncSender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use crate::library::{ProviderError, ResolvedTrack, TrackProvider};

use super::engine::{EngineOptions, LoadRequest, PlaybackEngine, SharedState};
use super::output::{AudioOutput, LoadError};
use super::types::AudioCmd;
use crate::mpris::TransportBridge;
use crate::persist::StateStore;

/// Everything the audio thread receives.
pub(super) enum Msg {
    Cmd(AudioCmd),
    Resolved {
        id: u64,
        result: Result<ResolvedTrack, ProviderError>,
    },
}

/// Collaborators moved onto the audio thread.
pub(super) struct ThreadParts {
    pub provider: Arc<dyn TrackProvider>,
    pub bridge: Box<dyn TransportBridge>,
    pub store: Option<Box<dyn StateStore>>,
    pub shared: SharedState,
    pub options: EngineOptions,
    pub idle_poll: Duration,
}

fn spawn_resolver(provider: Arc<dyn TrackProvider>, request: LoadRequest, tx: Sender<Msg>) {
    let LoadRequest { id, track, cancel } = request;
    let fail_tx = tx.clone();
    let spawned = thread::Builder::new()
        .name(format!("resolve-{id}"))
        .spawn(move || {
            let result = provider.resolve(&track, &cancel);
            if cancel.is_cancelled() {
                debug!(id, "resolution finished after cancellation");
                return;
            }
            let _ = tx.send(Msg::Resolved { id, result });
        });
    if let Err(e) = spawned {
        resolver_spawn_failed(id, e, &fail_tx);
    }
}

/// Without a resolver the load can only fail; report it like any other
/// failed resolution so the engine leaves Loading.
pub(super) fn resolver_spawn_failed(id: u64, e: std::io::Error, tx: &Sender<Msg>) {
    error!(id, "failed to spawn resolver thread: {e}");
    let _ = tx.send(Msg::Resolved {
        id,
        result: Err(ProviderError::Io(e)),
    });
}

/// Start the audio thread. The output is built on the thread itself, and
/// whether that worked is reported through `ready` before any command is
/// processed.
pub(super) fn spawn_audio_thread<O, F>(
    make_output: F,
    parts: ThreadParts,
    rx: Receiver<Msg>,
    tx: Sender<Msg>,
    ready: SyncSender<Result<(), LoadError>>,
) -> JoinHandle<()>
where
    O: AudioOutput,
    F: FnOnce() -> Result<O, LoadError> + Send + 'static,
{
    thread::spawn(move || {
        let output = match make_output() {
            Ok(output) => output,
            Err(e) => {
                error!("audio output unavailable: {e}");
                let _ = ready.send(Err(e));
                return;
            }
        };
        let _ = ready.send(Ok(()));

        let ThreadParts {
            provider,
            bridge,
            store,
            shared,
            options,
            idle_poll,
        } = parts;

        let mut engine = PlaybackEngine::new(output, bridge, shared, options);
        if let Some(store) = store {
            engine = engine.with_store(store);
        }
        info!("audio thread started");

        loop {
            let timeout = engine.next_timeout(Instant::now(), idle_poll);
            match rx.recv_timeout(timeout) {
                Ok(Msg::Cmd(AudioCmd::Quit { fade_out_ms })) => {
                    engine.quit(Duration::from_millis(fade_out_ms));
                    break;
                }
                Ok(Msg::Cmd(cmd)) => engine.handle(cmd),
                Ok(Msg::Resolved { id, result }) => engine.finish_load(id, result),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    engine.quit(Duration::ZERO);
                    break;
                }
            }

            engine.poll(Instant::now());
            if let Some(request) = engine.take_load_request() {
                spawn_resolver(provider.clone(), request, tx.clone());
            }
        }
        info!("audio thread exiting");
    })
}
