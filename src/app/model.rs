//! Application model: `App`.
//!
//! `App` holds the UI-side state (selection, cursor mode, panels) plus the
//! last snapshots read from the audio thread. It never mutates playback
//! itself; the runtime turns its intents into `AudioCmd`s.

use crate::audio::{PlaybackHandle, PlaybackInfo, QueueHandle, QueueSnapshot};
use crate::events::PlayerEvent;
use crate::library::TrackRef;

/// The main application model.
pub struct App {
    pub selected: usize,

    /// Cursor tracks the playing entry.
    pub follow_playback: bool,
    /// Index we asked the engine to play; following waits until it reports it.
    pub pending_follow_index: Option<usize>,

    pub show_lyrics: bool,
    pub current_dir: Option<String>,
    /// One-line notice shown in the status box (e.g. a skipped track).
    pub notice: Option<String>,

    playback_handle: PlaybackHandle,
    queue_handle: QueueHandle,
    playback: PlaybackInfo,
    queue: QueueSnapshot,
}

impl App {
    pub fn new(playback_handle: PlaybackHandle, queue_handle: QueueHandle) -> Self {
        Self {
            selected: 0,
            follow_playback: true,
            pending_follow_index: None,
            show_lyrics: true,
            current_dir: None,
            notice: None,
            playback_handle,
            queue_handle,
            playback: PlaybackInfo::default(),
            queue: QueueSnapshot::default(),
        }
    }

    /// Copy the latest snapshots and move the cursor if it follows playback.
    pub fn refresh(&mut self) {
        if let Ok(info) = self.playback_handle.lock() {
            self.playback = info.clone();
        }
        if let Ok(queue) = self.queue_handle.lock() {
            self.queue = queue.clone();
        }

        if let (true, Some(idx)) = (self.follow_playback, self.playback.index) {
            match self.pending_follow_index {
                Some(pending) if pending != idx => {}
                _ => {
                    self.pending_follow_index = None;
                    self.selected = idx;
                }
            }
        }
        self.clamp_selection();
    }

    pub fn playback(&self) -> &PlaybackInfo {
        &self.playback
    }

    pub fn queue(&self) -> &QueueSnapshot {
        &self.queue
    }

    pub fn has_tracks(&self) -> bool {
        !self.queue.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.entries.len()
    }

    pub fn selected_track(&self) -> Option<&TrackRef> {
        self.queue.entries.get(self.selected).map(|e| &e.track)
    }

    /// Note events worth surfacing in the status box.
    pub fn on_event(&mut self, event: &PlayerEvent) {
        if let PlayerEvent::TrackFailed {
            track,
            kind,
            action,
        } = event
        {
            self.notice = Some(format!("{track}: {kind} ({action:?})"));
        }
    }

    pub fn set_current_dir(&mut self, dir: String) {
        self.current_dir = Some(dir);
    }

    pub fn toggle_lyrics(&mut self) {
        self.show_lyrics = !self.show_lyrics;
    }

    pub fn follow_playback_on(&mut self) {
        self.follow_playback = true;
    }

    pub fn follow_playback_off(&mut self) {
        self.follow_playback = false;
        self.pending_follow_index = None;
    }

    /// Follow playback, but only once the engine has picked up `idx`.
    pub fn follow_index(&mut self, idx: usize) {
        self.follow_playback = true;
        self.pending_follow_index = Some(idx);
        self.selected = idx;
    }

    pub fn set_selected(&mut self, idx: usize) {
        self.selected = idx;
        self.clamp_selection();
    }

    /// Move selection down, wrapping to the top.
    pub fn next(&mut self) {
        let len = self.len();
        if len > 0 {
            self.selected = (self.selected + 1) % len;
        }
    }

    /// Move selection up, wrapping to the bottom.
    pub fn prev(&mut self) {
        let len = self.len();
        if len > 0 {
            self.selected = (self.selected + len - 1) % len;
        }
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.len().saturating_sub(1);
    }

    /// Jump the cursor to the playing entry.
    pub fn select_playing(&mut self) {
        if let Some(idx) = self.playback.index {
            self.set_selected(idx);
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.len();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }
}
