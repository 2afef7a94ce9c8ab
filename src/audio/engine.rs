//! The playback state machine.
//!
//! `PlaybackEngine` is the only writer of the queue and the session. It
//! runs on the audio thread, which feeds it commands, resolved loads and
//! clock ticks; everything else observes it through `EventBus`, the
//! shared snapshots and the transport bridge.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::events::{EventBus, PlayerEvent};
use crate::library::{CancelToken, ProviderError, ResolvedTrack, TrackRef, TrackSource};
use crate::lyrics::{LrcOptions, LyricSynchronizer, parse_lrc};
use crate::mpris::TransportBridge;
use crate::persist::{PersistedQueues, PersistedSession, StateStore};
use crate::queue::QueueManager;

use super::clock::PositionClock;
use super::failure::{FailureAction, FailureHandler, FailureKind};
use super::output::{AudioOutput, OutputEvent, StreamHandle};
use super::types::{
    AudioCmd, PlayIntent, PlaybackHandle, PlaybackSession, PlaybackState, QueueHandle,
    QueueSnapshot, RepeatMode,
};

/// A track waiting to be resolved off the audio thread.
#[derive(Debug)]
pub struct LoadRequest {
    pub id: u64,
    pub track: TrackRef,
    pub cancel: CancelToken,
}

#[derive(Debug)]
struct InFlight {
    id: u64,
    intent: PlayIntent,
    cancel: CancelToken,
}

/// Startup values for the engine.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub tick_interval: Duration,
    pub failure_threshold: u8,
    pub lrc: LrcOptions,
    pub volume: u8,
    pub speed: f32,
    pub repeat: RepeatMode,
    pub shuffle: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(250),
            failure_threshold: 2,
            lrc: LrcOptions::default(),
            volume: 100,
            speed: 1.0,
            repeat: RepeatMode::default(),
            shuffle: false,
        }
    }
}

impl EngineOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            tick_interval: Duration::from_millis(settings.audio.tick_interval_ms),
            failure_threshold: settings.playback.max_consecutive_failures,
            lrc: LrcOptions {
                blank_gap_ms: settings.lyrics.blank_gap_ms as f64,
                placeholder: settings.lyrics.placeholder.clone(),
            },
            volume: settings.playback.volume.min(100),
            speed: settings.playback.speed,
            repeat: settings.playback.repeat_mode.into(),
            shuffle: settings.playback.shuffle,
        }
    }
}

/// Handles the engine publishes into. Cloned freely across threads.
#[derive(Clone, Default)]
pub struct SharedState {
    pub playback: PlaybackHandle,
    pub queue: QueueHandle,
    pub events: Arc<EventBus>,
}

fn tempo_percent(speed: f32) -> f32 {
    (speed - 1.0) * 100.0
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

pub struct PlaybackEngine<O: AudioOutput> {
    output: O,
    bridge: Box<dyn TransportBridge>,
    store: Option<Box<dyn StateStore>>,
    shared: SharedState,
    queue: QueueManager,
    session: PlaybackSession,
    failure: FailureHandler,
    clock: PositionClock,
    lyrics: LyricSynchronizer,
    lrc: LrcOptions,
    handle: Option<StreamHandle>,
    current_track: Option<TrackRef>,
    dragging: bool,
    nav: (bool, bool),
    load_seq: u64,
    inflight: Option<InFlight>,
    pending: Option<LoadRequest>,
}

impl<O: AudioOutput> PlaybackEngine<O> {
    pub fn new(
        output: O,
        bridge: Box<dyn TransportBridge>,
        shared: SharedState,
        options: EngineOptions,
    ) -> Self {
        let session = PlaybackSession {
            volume: options.volume.min(100),
            speed: if options.speed > 0.0 { options.speed } else { 1.0 },
            repeat_mode: options.repeat,
            ..PlaybackSession::default()
        };
        let mut queue = QueueManager::new();
        if options.shuffle {
            queue.set_shuffle(true, None);
        }

        let mut engine = Self {
            output,
            bridge,
            store: None,
            shared,
            queue,
            session,
            failure: FailureHandler::new(options.failure_threshold),
            clock: PositionClock::new(options.tick_interval),
            lyrics: LyricSynchronizer::new(),
            lrc: options.lrc,
            handle: None,
            current_track: None,
            dragging: false,
            nav: (false, false),
            load_seq: 0,
            inflight: None,
            pending: None,
        };
        engine.refresh_nav();
        engine.sync_queue();
        engine.sync_snapshot();
        engine
    }

    /// Save queue and session here on quit and on `SaveState`.
    pub fn with_store(mut self, store: Box<dyn StateStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Swap in a specific queue manager (e.g. a seeded one).
    pub fn with_queue(mut self, queue: QueueManager) -> Self {
        self.queue = queue;
        self.sync_queue();
        self
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn queue(&self) -> &QueueManager {
        &self.queue
    }

    pub fn lyrics(&self) -> &LyricSynchronizer {
        &self.lyrics
    }

    pub fn current_track(&self) -> Option<&TrackRef> {
        self.current_track.as_ref()
    }

    pub fn stream(&self) -> Option<StreamHandle> {
        self.handle
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// (previous enabled, next enabled) as last pushed to the bridge.
    pub fn nav_enabled(&self) -> (bool, bool) {
        self.nav
    }

    pub fn is_loading(&self) -> bool {
        self.inflight.is_some()
    }

    pub fn handle(&mut self, cmd: AudioCmd) {
        match cmd {
            AudioCmd::PlayIndex(index) => self.play_index(index, PlayIntent::Autoplay),
            AudioCmd::Play => self.play(),
            AudioCmd::Pause => self.pause(),
            AudioCmd::TogglePause => self.toggle_pause(),
            AudioCmd::Stop => self.stop(),
            AudioCmd::Next => self.next(),
            AudioCmd::Prev => self.previous(),
            AudioCmd::SeekTo(position) => self.seek_to(position),
            AudioCmd::SeekBy(secs) => self.seek_by(secs),
            AudioCmd::BeginDrag => self.begin_drag(),
            AudioCmd::EndDrag(position) => self.end_drag(position),
            AudioCmd::SetVolume(volume) => self.set_volume(volume),
            AudioCmd::SetMute(muted) => self.set_mute(muted),
            AudioCmd::ToggleMute => self.set_mute(!self.session.is_muted),
            AudioCmd::SetSpeed(speed) => self.set_speed(speed),
            AudioCmd::SetRepeat(mode) => self.set_repeat(mode),
            AudioCmd::CycleRepeat => self.set_repeat(self.session.repeat_mode.cycle()),
            AudioCmd::ToggleShuffle => self.toggle_shuffle(),
            AudioCmd::SetQueue { name, tracks } => self.set_queue(&name, tracks),
            AudioCmd::SetShuffledQueue { name, tracks } => self.set_shuffled_queue(&name, tracks),
            AudioCmd::AddNext(tracks) => self.add_next(tracks),
            AudioCmd::Append(tracks) => self.append(tracks),
            AudioCmd::Remove(index) => self.remove(index),
            AudioCmd::MoveUp(index) => self.move_up(index),
            AudioCmd::MoveDown(index) => self.move_down(index),
            AudioCmd::ClearQueue => self.reset(),
            AudioCmd::Restore { queues, session } => self.restore(queues, session),
            AudioCmd::SaveState => self.save_state(),
            AudioCmd::Quit { fade_out_ms } => self.quit(Duration::from_millis(fade_out_ms)),
        }
    }

    // ---- loading -------------------------------------------------------

    /// Stop whatever is playing and start loading `index` of the active queue.
    pub fn play_index(&mut self, index: usize, intent: PlayIntent) {
        let Some(track) = self.queue.get(index).cloned() else {
            debug!(index, len = self.queue.len(), "play_index: index out of range");
            return;
        };

        self.release_stream();
        self.session.current_index = Some(index);
        self.session.total_duration = track.duration;
        self.lyrics.clear();

        self.load_seq += 1;
        let id = self.load_seq;
        let cancel = CancelToken::new();
        info!(index, id, ?intent, track = %track.source, "loading track");

        self.inflight = Some(InFlight {
            id,
            intent,
            cancel: cancel.clone(),
        });
        self.pending = Some(LoadRequest {
            id,
            track: track.clone(),
            cancel,
        });
        self.current_track = Some(track);

        self.set_state(PlaybackState::Loading);
        self.announce_track();
        self.refresh_nav();
        self.sync_snapshot();
    }

    /// The load the audio thread should hand to a resolver, if any.
    pub fn take_load_request(&mut self) -> Option<LoadRequest> {
        self.pending.take()
    }

    /// Apply a resolver result. Results for superseded loads are dropped.
    pub fn finish_load(&mut self, id: u64, result: Result<ResolvedTrack, ProviderError>) {
        let intent = match &self.inflight {
            Some(inflight) if inflight.id == id => inflight.intent,
            _ => {
                debug!(id, "stale load result ignored");
                return;
            }
        };
        self.inflight = None;

        let resolved = match result {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!(id, "track resolution failed: {e}");
                self.on_failure(FailureKind::SourceUnavailable, intent);
                return;
            }
        };

        let handle = match self.output.load(&resolved.source) {
            Ok(handle) => handle,
            Err(e) => {
                warn!(id, "output rejected track: {e}");
                self.on_failure(FailureKind::SourceUnavailable, intent);
                return;
            }
        };

        self.handle = Some(handle);
        self.output.set_volume(handle, self.session.effective_volume());
        self.output
            .set_tempo_percent(handle, tempo_percent(self.session.speed));
        self.session.position = Duration::ZERO;
        self.session.total_duration = self
            .output
            .length(handle)
            .or(resolved.duration)
            .or(self.session.total_duration);

        if let Some(text) = resolved.lyrics.as_deref() {
            let parsed = parse_lrc(text, &self.lrc);
            debug!(id, lines = parsed.slices.len(), "lyrics loaded");
            self.lyrics.load(parsed.slices);
            self.publish_lyric();
        }

        self.failure.on_success(&mut self.session);
        let relisted = self
            .current_track
            .as_mut()
            .filter(|t| !t.can_play())
            .map(|t| {
                t.set_can_play(true);
                t.identity().clone()
            });
        if let Some(identity) = relisted {
            self.queue.mark_playable(&identity);
            self.sync_queue();
        }

        self.bridge.set_timeline(self.session.total_duration);
        if let Some(track) = &self.current_track {
            self.bridge.set_metadata(track, self.session.total_duration);
        }

        match intent {
            PlayIntent::Autoplay => {
                self.output.play(handle);
                self.clock.start(Instant::now());
                self.set_state(PlaybackState::Playing);
            }
            PlayIntent::Prime => {
                info!(id, "track primed");
                self.set_state(PlaybackState::Stopped);
            }
        }
        self.sync_snapshot();
    }

    /// A skip keeps the failed load's intent, so a primed or paused load
    /// never starts playback on its own.
    fn on_failure(&mut self, kind: FailureKind, intent: PlayIntent) {
        let Some(track) = self.current_track.clone() else {
            self.stop();
            return;
        };
        self.release_stream();

        let action = self
            .failure
            .on_failure(&mut self.session, &track, kind, &mut self.queue);
        if let Some(current) = self.session.current_index.and_then(|i| self.queue.get(i)) {
            self.current_track = Some(current.clone());
        }
        self.shared.events.publish(PlayerEvent::TrackFailed {
            track: track.source.clone(),
            kind,
            action,
        });
        self.sync_queue();

        match action {
            FailureAction::Stop => {
                self.set_state(PlaybackState::Stopped);
                self.sync_snapshot();
            }
            FailureAction::Skip => self.skip_failed(intent),
        }
    }

    fn skip_failed(&mut self, intent: PlayIntent) {
        let len = self.queue.len();
        if len == 0 {
            self.stop();
            return;
        }
        match self.session.current_index {
            Some(i) if i + 1 < len => self.play_index(i + 1, intent),
            None => self.play_index(0, intent),
            Some(_) => match self.session.repeat_mode {
                RepeatMode::All => self.play_index(0, intent),
                RepeatMode::Off | RepeatMode::One => self.play_index(0, PlayIntent::Prime),
            },
        }
    }

    // ---- transport -----------------------------------------------------

    pub fn play(&mut self) {
        match self.session.state {
            PlaybackState::Playing => {}
            PlaybackState::Loading => {
                if let Some(inflight) = &mut self.inflight {
                    inflight.intent = PlayIntent::Autoplay;
                }
            }
            PlaybackState::Paused | PlaybackState::Stopped => {
                if let Some(handle) = self.handle {
                    self.output.play(handle);
                    self.clock.start(Instant::now());
                    self.set_state(PlaybackState::Playing);
                    self.sync_snapshot();
                } else if let Some(index) = self.session.current_index {
                    self.play_index(index, PlayIntent::Autoplay);
                } else if !self.queue.is_empty() {
                    self.play_index(0, PlayIntent::Autoplay);
                } else {
                    debug!("play: queue is empty");
                }
            }
        }
    }

    pub fn pause(&mut self) {
        match self.session.state {
            PlaybackState::Playing => {
                if let Some(handle) = self.handle {
                    self.output.pause(handle);
                    self.session.position = self.output.position(handle);
                }
                self.clock.cancel();
                self.set_state(PlaybackState::Paused);
                self.sync_snapshot();
            }
            PlaybackState::Loading => {
                if let Some(inflight) = &mut self.inflight {
                    inflight.intent = PlayIntent::Prime;
                }
            }
            PlaybackState::Paused | PlaybackState::Stopped => {}
        }
    }

    pub fn toggle_pause(&mut self) {
        match self.session.state {
            PlaybackState::Playing => self.pause(),
            PlaybackState::Loading => {
                let autoplay = self
                    .inflight
                    .as_ref()
                    .is_some_and(|f| f.intent == PlayIntent::Autoplay);
                if autoplay { self.pause() } else { self.play() }
            }
            PlaybackState::Paused | PlaybackState::Stopped => self.play(),
        }
    }

    /// Release the stream and rewind. The queue and current index stay.
    pub fn stop(&mut self) {
        self.release_stream();
        self.set_state(PlaybackState::Stopped);
        self.bridge.set_position(Duration::ZERO);
        self.shared.events.publish(PlayerEvent::PositionChanged {
            position: Duration::ZERO,
            percent: 0.0,
        });
        self.sync_snapshot();
    }

    fn release_stream(&mut self) {
        if let Some(inflight) = self.inflight.take() {
            debug!(id = inflight.id, "cancelling in-flight load");
            inflight.cancel.cancel();
        }
        self.pending = None;
        if let Some(handle) = self.handle.take() {
            self.output.stop(handle);
        }
        self.clock.cancel();
        self.dragging = false;
        self.session.position = Duration::ZERO;
        self.lyrics.reset_cursor();
    }

    pub fn next(&mut self) {
        let len = self.queue.len();
        if len == 0 {
            debug!("next: queue is empty");
            return;
        }
        match self.session.current_index {
            None => self.play_index(0, PlayIntent::Autoplay),
            Some(i) if i + 1 < len => self.play_index(i + 1, PlayIntent::Autoplay),
            Some(_) => match self.session.repeat_mode {
                RepeatMode::All => self.play_index(0, PlayIntent::Autoplay),
                RepeatMode::Off | RepeatMode::One => self.play_index(0, PlayIntent::Prime),
            },
        }
    }

    pub fn previous(&mut self) {
        let len = self.queue.len();
        if len == 0 {
            debug!("previous: queue is empty");
            return;
        }
        match self.session.current_index {
            Some(i) if i > 0 && i < len => self.play_index(i - 1, PlayIntent::Autoplay),
            _ => match self.session.repeat_mode {
                RepeatMode::All => self.play_index(len - 1, PlayIntent::Autoplay),
                RepeatMode::Off | RepeatMode::One => self.play_index(0, PlayIntent::Autoplay),
            },
        }
    }

    pub fn seek_to(&mut self, position: Duration) {
        let Some(handle) = self.handle else {
            debug!("seek: nothing loaded");
            return;
        };
        let position = match self.session.total_duration {
            Some(total) => position.min(total),
            None => position,
        };
        self.output.seek_to(handle, position);
        self.session.position = position;
        if self.lyrics.update(millis(position)).is_some() {
            self.publish_lyric();
        }
        self.bridge.set_position(position);
        self.publish_position();
        self.sync_snapshot();
    }

    pub fn seek_by(&mut self, secs: i64) {
        let base = self.session.position;
        let delta = Duration::from_secs(secs.unsigned_abs());
        let target = if secs >= 0 {
            base.saturating_add(delta)
        } else {
            base.saturating_sub(delta)
        };
        self.seek_to(target);
    }

    /// Position updates stop until `end_drag` so the progress bar follows
    /// the pointer instead of the stream.
    pub fn begin_drag(&mut self) {
        if self.handle.is_some() {
            self.dragging = true;
        }
    }

    pub fn end_drag(&mut self, position: Duration) {
        self.dragging = false;
        self.seek_to(position);
    }

    // ---- output settings -----------------------------------------------

    pub fn set_volume(&mut self, volume: u8) {
        self.session.volume = volume.min(100);
        self.apply_volume();
    }

    pub fn set_mute(&mut self, muted: bool) {
        self.session.is_muted = muted;
        self.apply_volume();
    }

    fn apply_volume(&mut self) {
        if let Some(handle) = self.handle {
            self.output
                .set_volume(handle, self.session.effective_volume());
        }
        self.shared.events.publish(PlayerEvent::VolumeChanged {
            volume: self.session.volume,
            muted: self.session.is_muted,
        });
        self.sync_snapshot();
    }

    pub fn set_speed(&mut self, speed: f32) {
        if speed.is_nan() || speed <= 0.0 {
            debug!(speed, "ignoring invalid speed");
            return;
        }
        self.session.speed = speed;
        if let Some(handle) = self.handle {
            self.output.set_tempo_percent(handle, tempo_percent(speed));
        }
        self.shared.events.publish(PlayerEvent::SpeedChanged(speed));
        self.sync_snapshot();
    }

    pub fn set_repeat(&mut self, mode: RepeatMode) {
        info!(repeat = mode.label(), "repeat mode changed");
        self.session.repeat_mode = mode;
        self.publish_mode();
        self.refresh_nav();
        self.sync_snapshot();
    }

    // ---- queue ---------------------------------------------------------

    fn current_identity(&self) -> Option<TrackSource> {
        self.current_track.as_ref().map(|t| t.identity().clone())
    }

    pub fn toggle_shuffle(&mut self) {
        let identity = self.current_identity();
        let index = self.queue.toggle_shuffle(identity.as_ref());
        if self.session.current_index.is_some() && !self.queue.is_empty() {
            self.session.current_index = Some(index);
        }
        info!(shuffle = self.queue.shuffle_on(), "shuffle toggled");
        self.publish_mode();
        self.sync_queue();
        self.sync_snapshot();
    }

    pub fn set_queue(&mut self, name: &str, tracks: Vec<TrackRef>) {
        let identity = self.current_identity();
        let Some(index) = self.queue.set_queue(name, tracks, identity.as_ref()) else {
            return;
        };
        self.after_replace(identity, index);
    }

    pub fn set_shuffled_queue(&mut self, name: &str, tracks: Vec<TrackRef>) {
        let identity = self.current_identity();
        let index = self.queue.set_shuffled_queue(name, tracks, identity.as_ref());
        self.publish_mode();
        self.after_replace(identity, index);
    }

    fn after_replace(&mut self, identity: Option<TrackSource>, index: usize) {
        if self.queue.is_empty() {
            self.reset();
            return;
        }
        let still_queued = identity
            .as_ref()
            .is_some_and(|id| self.queue.get(index).is_some_and(|t| t.identity() == id));

        if still_queued {
            self.session.current_index = Some(index);
        } else if self.session.current_index.is_some() {
            // The playing track is gone from the new queue.
            self.stop();
            self.session.current_index = Some(index);
            self.current_track = self.queue.get(index).cloned();
            self.session.total_duration = self.current_track.as_ref().and_then(|t| t.duration);
            self.announce_track();
        }
        self.sync_queue();
        self.sync_snapshot();
    }

    pub fn add_next(&mut self, tracks: Vec<TrackRef>) {
        self.queue.add_next(self.session.current_index, tracks);
        self.sync_queue();
        self.sync_snapshot();
    }

    pub fn append(&mut self, tracks: Vec<TrackRef>) {
        self.queue.append(tracks);
        self.sync_queue();
        self.sync_snapshot();
    }

    pub fn remove(&mut self, index: usize) {
        let Some(removal) = self.queue.remove(index, self.session.current_index) else {
            return;
        };
        if self.queue.is_empty() {
            self.reset();
            return;
        }

        if removal.was_current {
            let replacement = removal.current.unwrap_or(0);
            let active = matches!(
                self.session.state,
                PlaybackState::Playing | PlaybackState::Loading
            );
            if active {
                self.play_index(replacement, PlayIntent::Autoplay);
            } else {
                self.stop();
                self.session.current_index = Some(replacement);
                self.current_track = self.queue.get(replacement).cloned();
                self.session.total_duration =
                    self.current_track.as_ref().and_then(|t| t.duration);
                self.announce_track();
            }
        } else {
            self.session.current_index = removal.current;
        }
        self.sync_queue();
        self.sync_snapshot();
    }

    pub fn move_up(&mut self, index: usize) {
        let mut current = self.session.current_index;
        if self.queue.move_up(index, &mut current) {
            self.session.current_index = current;
            self.sync_queue();
            self.sync_snapshot();
        }
    }

    pub fn move_down(&mut self, index: usize) {
        let mut current = self.session.current_index;
        if self.queue.move_down(index, &mut current) {
            self.session.current_index = current;
            self.sync_queue();
            self.sync_snapshot();
        }
    }

    /// Empty the queue and return to the zero state. Volume, mute, speed
    /// and repeat mode survive; shuffle is turned off.
    pub fn reset(&mut self) {
        self.release_stream();
        self.set_state(PlaybackState::Stopped);
        self.queue.clear();
        self.session.reset();
        self.current_track = None;
        self.lyrics.clear();
        self.bridge.clear();
        info!("session reset");

        self.announce_track();
        self.publish_mode();
        self.sync_queue();
        self.sync_snapshot();
    }

    // ---- persistence ---------------------------------------------------

    pub fn export_state(&self) -> (PersistedQueues, PersistedSession) {
        let queues = PersistedQueues {
            name: self.queue.name().to_string(),
            main: self.queue.main().tracks(),
            shuffled: self
                .queue
                .shuffled()
                .map(|entries| entries.iter().map(|e| e.track.clone()).collect()),
        };
        let session = PersistedSession {
            current_index: self.session.current_index,
            shuffle_on: self.queue.shuffle_on(),
            repeat_mode: self.session.repeat_mode,
            is_muted: self.session.is_muted,
            volume: self.session.volume,
            speed: self.session.speed,
            current_track: self.current_identity(),
        };
        (queues, session)
    }

    /// Reinstate persisted state without touching the output; `play`
    /// loads the restored current track.
    pub fn restore(&mut self, queues: PersistedQueues, persisted: PersistedSession) {
        self.release_stream();
        self.set_state(PlaybackState::Stopped);

        let shuffled = queues.shuffled.filter(|_| persisted.shuffle_on);
        let redraw = persisted.shuffle_on && shuffled.is_none();
        self.queue.restore(&queues.name, queues.main, shuffled);
        if redraw {
            self.queue.set_shuffle(true, None);
        }

        self.session.reset();
        self.session.volume = persisted.volume.min(100);
        self.session.is_muted = persisted.is_muted;
        if persisted.speed > 0.0 {
            self.session.speed = persisted.speed;
        }
        self.session.repeat_mode = persisted.repeat_mode;

        let index = persisted
            .current_track
            .as_ref()
            .and_then(|id| self.queue.position_of(id))
            .or(persisted.current_index.filter(|i| *i < self.queue.len()));
        self.session.current_index = index;
        self.current_track = index.and_then(|i| self.queue.get(i)).cloned();
        self.session.total_duration = self.current_track.as_ref().and_then(|t| t.duration);
        info!(
            name = %queues.name,
            len = self.queue.len(),
            ?index,
            shuffle = self.queue.shuffle_on(),
            "session restored"
        );

        self.announce_track();
        self.publish_mode();
        self.shared.events.publish(PlayerEvent::VolumeChanged {
            volume: self.session.volume,
            muted: self.session.is_muted,
        });
        self.shared
            .events
            .publish(PlayerEvent::SpeedChanged(self.session.speed));
        self.sync_queue();
        self.sync_snapshot();
    }

    pub fn save_state(&mut self) {
        let Some(store) = &self.store else {
            return;
        };
        let (queues, session) = self.export_state();
        match store.save(&queues, &session) {
            Ok(()) => debug!(len = queues.main.len(), "state saved"),
            Err(e) => warn!("failed to save state: {e}"),
        }
    }

    /// Fade out, persist and release. The audio thread exits afterwards.
    pub fn quit(&mut self, fade: Duration) {
        if let (PlaybackState::Playing, Some(handle)) = (self.session.state, self.handle) {
            self.output.fade_out(handle, fade);
        }
        self.save_state();
        self.release_stream();
        self.set_state(PlaybackState::Stopped);
        self.sync_snapshot();
        info!("audio engine stopped");
    }

    // ---- clock and output events ---------------------------------------

    /// Drain output events and run the clock if a tick is due.
    pub fn poll(&mut self, now: Instant) {
        while let Some(event) = self.output.poll_event() {
            self.on_output_event(event);
        }
        if self.clock.poll(now) {
            self.tick();
        }
    }

    /// How long the audio thread may block waiting for commands.
    pub fn next_timeout(&self, now: Instant, idle: Duration) -> Duration {
        self.clock.timeout(now, idle)
    }

    pub fn on_output_event(&mut self, event: OutputEvent) {
        match event {
            OutputEvent::End(handle) if Some(handle) == self.handle => {
                info!(index = ?self.session.current_index, "track ended");
                match (self.session.repeat_mode, self.session.current_index) {
                    (RepeatMode::One, Some(index)) => self.play_index(index, PlayIntent::Autoplay),
                    _ => self.next(),
                }
            }
            OutputEvent::Stall(handle) if Some(handle) == self.handle => {
                self.on_failure(FailureKind::Stall, PlayIntent::Autoplay);
            }
            other => debug!(?other, "event for a released stream ignored"),
        }
    }

    /// One clock step: sample position, move the lyric cursor, notify.
    pub fn tick(&mut self) {
        if self.session.state != PlaybackState::Playing || self.dragging {
            return;
        }
        let Some(handle) = self.handle else {
            return;
        };
        let position = self.output.position(handle);
        self.session.position = position;
        if self.lyrics.update(millis(position)).is_some() {
            self.publish_lyric();
        }
        self.bridge.set_position(position);
        self.publish_position();
        self.sync_snapshot();
    }

    // ---- notifications -------------------------------------------------

    fn set_state(&mut self, state: PlaybackState) {
        if self.session.state == state {
            return;
        }
        info!(from = ?self.session.state, to = ?state, "playback state changed");
        self.session.state = state;
        self.bridge.set_playback(state);
        self.shared.events.publish(PlayerEvent::StateChanged(state));
    }

    fn announce_track(&mut self) {
        match &self.current_track {
            Some(track) => self.bridge.set_metadata(track, self.session.total_duration),
            None => self.bridge.clear(),
        }
        self.shared.events.publish(PlayerEvent::TrackChanged {
            index: self.session.current_index,
            track: self.current_track.clone(),
        });
    }

    fn publish_position(&self) {
        self.shared.events.publish(PlayerEvent::PositionChanged {
            position: self.session.position,
            percent: self.session.percent(),
        });
    }

    fn publish_lyric(&self) {
        self.shared.events.publish(PlayerEvent::LyricChanged {
            index: self.lyrics.current_index(),
            text: self.lyrics.current_slice().map(|s| s.text.clone()),
        });
    }

    fn publish_mode(&self) {
        self.shared.events.publish(PlayerEvent::ModeChanged {
            repeat: self.session.repeat_mode,
            shuffle: self.queue.shuffle_on(),
        });
    }

    /// Recompute the previous/next availability and push it to the bridge.
    fn refresh_nav(&mut self) {
        let len = self.queue.len();
        let nav = if len == 0 {
            (false, false)
        } else {
            let index = self.session.current_index.unwrap_or(0);
            let wraps = self.session.repeat_mode == RepeatMode::All;
            (wraps || index > 0, wraps || index + 1 < len)
        };
        if nav != self.nav {
            debug!(prev = nav.0, next = nav.1, "navigation availability changed");
        }
        self.nav = nav;
        self.bridge.set_nav_enabled(nav.0, nav.1);
    }

    fn sync_queue(&mut self) {
        if let Ok(mut snapshot) = self.shared.queue.lock() {
            *snapshot = QueueSnapshot {
                name: self.queue.name().to_string(),
                shuffle: self.queue.shuffle_on(),
                entries: self.queue.active().to_vec(),
            };
        }
        self.shared.events.publish(PlayerEvent::QueueChanged {
            len: self.queue.len(),
            shuffle: self.queue.shuffle_on(),
        });
        self.refresh_nav();
    }

    fn sync_snapshot(&self) {
        let Ok(mut info) = self.shared.playback.lock() else {
            return;
        };
        info.index = self.session.current_index;
        info.track = self.current_track.clone();
        info.state = self.session.state;
        info.position = self.session.position;
        info.duration = self.session.total_duration;
        info.percent = self.session.percent();
        info.volume = self.session.volume;
        info.muted = self.session.is_muted;
        info.speed = self.session.speed;
        info.repeat = self.session.repeat_mode;
        info.shuffle = self.queue.shuffle_on();
        info.prev_enabled = self.nav.0;
        info.next_enabled = self.nav.1;
        info.lyrics = self.lyrics.shared();
        info.lyric_index = self.lyrics.current_index();
    }
}
