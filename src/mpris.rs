//! Media-transport integration.
//!
//! `TransportBridge` is what the engine pushes now-playing state into.
//! `MprisHandle` implements it on top of a zbus MPRIS service; inbound
//! D-Bus calls come back as `ControlCmd` on a channel owned by the UI loop.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_io::{Timer, block_on};
use tracing::{debug, info, warn};
use zbus::object_server::InterfaceRef;
use zbus::{Connection, interface};
use zvariant::{ObjectPath, OwnedObjectPath, OwnedValue, Value};

use crate::audio::PlaybackState;
use crate::library::{TrackRef, TrackSource};

const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
const BUS_NAME: &str = "org.mpris.MediaPlayer2.reprise";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControlCmd {
    Quit,
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Prev,
}

/// Outbound now-playing state, implemented by OS media integrations.
pub trait TransportBridge: Send {
    fn set_metadata(&mut self, track: &TrackRef, length: Option<Duration>);
    fn set_timeline(&mut self, length: Option<Duration>);
    fn set_position(&mut self, position: Duration);
    fn set_playback(&mut self, state: PlaybackState);
    fn set_nav_enabled(&mut self, prev: bool, next: bool);
    /// Forget the current track.
    fn clear(&mut self);
}

/// Bridge for when no media transport is available.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBridge;

impl TransportBridge for NullBridge {
    fn set_metadata(&mut self, _track: &TrackRef, _length: Option<Duration>) {}
    fn set_timeline(&mut self, _length: Option<Duration>) {}
    fn set_position(&mut self, _position: Duration) {}
    fn set_playback(&mut self, _state: PlaybackState) {}
    fn set_nav_enabled(&mut self, _prev: bool, _next: bool) {}
    fn clear(&mut self) {}
}

#[derive(Debug)]
struct SharedState {
    playback: PlaybackState,
    track_id: Option<OwnedObjectPath>,
    title: Option<String>,
    artist: Vec<String>,
    album: Option<String>,
    url: Option<String>,
    art_url: Option<String>,
    length_micros: Option<i64>,
    position_micros: i64,
    can_go_previous: bool,
    can_go_next: bool,
}

impl Default for SharedState {
    fn default() -> Self {
        Self {
            playback: PlaybackState::Stopped,
            track_id: None,
            title: None,
            artist: Vec::new(),
            album: None,
            url: None,
            art_url: None,
            length_micros: None,
            position_micros: 0,
            can_go_previous: true,
            can_go_next: true,
        }
    }
}

/// Which properties changed since the service last emitted signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Change {
    Playback,
    Metadata,
    Nav,
}

fn micros(d: Duration) -> i64 {
    i64::try_from(d.as_micros()).unwrap_or(i64::MAX)
}

fn track_object_path(source: &TrackSource) -> Option<OwnedObjectPath> {
    // D-Bus object paths only allow [A-Za-z0-9_], so hash local paths.
    let id = match source {
        TrackSource::Remote { id } => format!("remote_{id}"),
        TrackSource::Local { path } => {
            use std::hash::{DefaultHasher, Hash, Hasher};
            let mut hasher = DefaultHasher::new();
            path.hash(&mut hasher);
            format!("local_{:016x}", hasher.finish())
        }
    };
    ObjectPath::try_from(format!("{OBJECT_PATH}/track/{id}"))
        .ok()
        .map(OwnedObjectPath::from)
}

#[derive(Clone)]
pub struct MprisHandle {
    state: Arc<Mutex<SharedState>>,
    notify: Sender<Change>,
}

impl MprisHandle {
    fn update(&self, change: Change, f: impl FnOnce(&mut SharedState)) {
        if let Ok(mut s) = self.state.lock() {
            f(&mut s);
        }
        let _ = self.notify.send(change);
    }
}

impl TransportBridge for MprisHandle {
    fn set_metadata(&mut self, track: &TrackRef, length: Option<Duration>) {
        self.update(Change::Metadata, |s| {
            s.track_id = track_object_path(track.identity());
            s.title = Some(track.title.clone());
            s.artist = track.artist.iter().cloned().collect();
            s.album = track.album.clone();
            s.url = track
                .local_path()
                .map(|p| format!("file://{}", p.display()));
            s.art_url = track.thumbnail.clone();
            s.length_micros = length.or(track.duration).map(micros);
            s.position_micros = 0;
        });
    }

    fn set_timeline(&mut self, length: Option<Duration>) {
        self.update(Change::Metadata, |s| {
            s.length_micros = length.map(micros);
        });
    }

    fn set_position(&mut self, position: Duration) {
        // Position is polled by clients; no change signal.
        if let Ok(mut s) = self.state.lock() {
            s.position_micros = micros(position);
        }
    }

    fn set_playback(&mut self, state: PlaybackState) {
        self.update(Change::Playback, |s| s.playback = state);
    }

    fn set_nav_enabled(&mut self, prev: bool, next: bool) {
        let changed = self
            .state
            .lock()
            .map(|s| s.can_go_previous != prev || s.can_go_next != next)
            .unwrap_or(false);
        if changed {
            self.update(Change::Nav, |s| {
                s.can_go_previous = prev;
                s.can_go_next = next;
            });
        }
    }

    fn clear(&mut self) {
        self.update(Change::Metadata, |s| {
            *s = SharedState {
                playback: s.playback,
                can_go_previous: s.can_go_previous,
                can_go_next: s.can_go_next,
                ..SharedState::default()
            };
        });
    }
}

struct RootIface {
    tx: Sender<ControlCmd>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {
        // No-op for TUI.
    }

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "reprise"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec!["file".to_string()]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec![]
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
}

impl PlayerIface {
    fn read<T>(&self, default: T, f: impl FnOnce(&SharedState) -> T) -> T {
        self.state.lock().map(|s| f(&s)).unwrap_or(default)
    }
}

fn owned(value: Value<'_>) -> Option<OwnedValue> {
    OwnedValue::try_from(value).ok()
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        let _ = self.tx.send(ControlCmd::Next);
    }

    fn previous(&self) {
        let _ = self.tx.send(ControlCmd::Prev);
    }

    fn play(&self) {
        let _ = self.tx.send(ControlCmd::Play);
    }

    fn pause(&self) {
        let _ = self.tx.send(ControlCmd::Pause);
    }

    fn play_pause(&self) {
        let _ = self.tx.send(ControlCmd::PlayPause);
    }

    fn stop(&self) {
        let _ = self.tx.send(ControlCmd::Stop);
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        match self.read(PlaybackState::Stopped, |s| s.playback) {
            PlaybackState::Stopped => "Stopped",
            // A load in progress is reported as the playing it is about to become.
            PlaybackState::Playing | PlaybackState::Loading => "Playing",
            PlaybackState::Paused => "Paused",
        }
    }

    #[zbus(property)]
    fn position(&self) -> i64 {
        self.read(0, |s| s.position_micros)
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        self.read(true, |s| s.can_go_next)
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        self.read(true, |s| s.can_go_previous)
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        let mut map = HashMap::new();
        let Ok(s) = self.state.lock() else {
            return map;
        };

        let mut put = |key: &str, value: Value<'_>| {
            if let Some(v) = owned(value) {
                map.insert(key.to_string(), v);
            }
        };

        if let Some(id) = &s.track_id {
            put("mpris:trackid", Value::from((**id).clone()));
        }
        if let Some(title) = &s.title {
            put("xesam:title", Value::from(title.as_str()));
        }
        if !s.artist.is_empty() {
            put("xesam:artist", Value::from(s.artist.clone()));
        }
        if let Some(album) = &s.album {
            put("xesam:album", Value::from(album.as_str()));
        }
        if let Some(url) = &s.url {
            put("xesam:url", Value::from(url.as_str()));
        }
        if let Some(art) = &s.art_url {
            put("mpris:artUrl", Value::from(art.as_str()));
        }
        if let Some(len) = s.length_micros {
            put("mpris:length", Value::from(len));
        }
        drop(put);
        map
    }
}

async fn emit_changes(iface: &InterfaceRef<PlayerIface>, changes: &[Change]) {
    let emitter = iface.signal_emitter();
    let player = iface.get().await;
    for change in changes {
        let result = match change {
            Change::Playback => player.playback_status_changed(emitter).await,
            Change::Metadata => player.metadata_changed(emitter).await,
            Change::Nav => {
                if let Err(e) = player.can_go_previous_changed(emitter).await {
                    debug!("MPRIS: signal failed: {e}");
                }
                player.can_go_next_changed(emitter).await
            }
        };
        if let Err(e) = result {
            debug!("MPRIS: signal failed: {e}");
        }
    }
}

/// Drain pending change notices, deduplicated. `None` once the bridge is gone.
fn drain_changes(rx: &Receiver<Change>) -> Option<Vec<Change>> {
    let mut changes = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(change) => {
                if !changes.contains(&change) {
                    changes.push(change);
                }
            }
            Err(TryRecvError::Empty) => return Some(changes),
            Err(TryRecvError::Disconnected) => return None,
        }
    }
}

/// Register the MPRIS service on the session bus from a background thread.
/// Failures are logged; the returned handle works either way.
pub fn spawn_mpris(tx: Sender<ControlCmd>) -> MprisHandle {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (notify_tx, notify_rx) = mpsc::channel::<Change>();

    let state_for_thread = state.clone();
    std::thread::spawn(move || {
        block_on(async move {
            let connection = match Connection::session().await {
                Ok(c) => c,
                Err(e) => {
                    warn!("MPRIS: failed to connect to session bus: {e}");
                    return;
                }
            };

            if let Err(e) = connection.request_name(BUS_NAME).await {
                warn!("MPRIS: failed to acquire name: {e}");
                return;
            }

            let object_server = connection.object_server();

            if let Err(e) = object_server
                .at(OBJECT_PATH, RootIface { tx: tx.clone() })
                .await
            {
                warn!("MPRIS: failed to register root iface: {e}");
                return;
            }

            if let Err(e) = object_server
                .at(
                    OBJECT_PATH,
                    PlayerIface {
                        tx,
                        state: state_for_thread,
                    },
                )
                .await
            {
                warn!("MPRIS: failed to register player iface: {e}");
                return;
            }

            let iface = match object_server.interface::<_, PlayerIface>(OBJECT_PATH).await {
                Ok(i) => i,
                Err(e) => {
                    warn!("MPRIS: player iface lookup failed: {e}");
                    return;
                }
            };
            info!(name = BUS_NAME, "MPRIS service registered");

            loop {
                Timer::after(Duration::from_millis(200)).await;
                let Some(changes) = drain_changes(&notify_rx) else {
                    break;
                };
                if !changes.is_empty() {
                    emit_changes(&iface, &changes).await;
                }
            }
            debug!("MPRIS: bridge dropped, service loop exiting");
        });
    });

    MprisHandle {
        state,
        notify: notify_tx,
    }
}
