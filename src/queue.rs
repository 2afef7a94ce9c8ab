//! Play queue bookkeeping.
//!
//! `QueueManager` owns the main queue and, while shuffle is on, a shuffled
//! permutation of it. Every mutation leaves `entries[i].index == i` in the
//! queues it touched. The current index is owned by the playback engine and
//! passed in explicitly; operations that move it return the new value.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::debug;

use crate::library::{TrackRef, TrackSource};

#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntry {
    pub index: u32,
    pub track: TrackRef,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayQueue {
    /// Where the queue came from, e.g. `Folder:/music`.
    pub name: String,
    pub entries: Vec<QueueEntry>,
}

impl PlayQueue {
    pub fn new(name: impl Into<String>, tracks: Vec<TrackRef>) -> Self {
        Self {
            name: name.into(),
            entries: entries_from(tracks),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn tracks(&self) -> Vec<TrackRef> {
        self.entries.iter().map(|e| e.track.clone()).collect()
    }
}

/// Result of removing an entry from the active queue.
#[derive(Debug, Clone, PartialEq)]
pub struct Removal {
    pub removed: TrackRef,
    /// Whether the removed entry was the current one.
    pub was_current: bool,
    /// Current index after removal; `None` when the queue is now empty or
    /// nothing was current.
    pub current: Option<usize>,
}

fn entries_from(tracks: Vec<TrackRef>) -> Vec<QueueEntry> {
    tracks
        .into_iter()
        .enumerate()
        .map(|(i, track)| QueueEntry {
            index: i as u32,
            track,
        })
        .collect()
}

fn reindex_from(entries: &mut [QueueEntry], start: usize) {
    for (i, entry) in entries.iter_mut().enumerate().skip(start) {
        entry.index = i as u32;
    }
}

fn wrap(tracks: Vec<TrackRef>) -> impl Iterator<Item = QueueEntry> {
    tracks.into_iter().map(|track| QueueEntry { index: 0, track })
}

fn position_in(entries: &[QueueEntry], identity: &TrackSource) -> Option<usize> {
    entries.iter().position(|e| e.track.identity() == identity)
}

pub struct QueueManager {
    main: PlayQueue,
    shuffled: Option<Vec<QueueEntry>>,
    rng: StdRng,
}

impl Default for QueueManager {
    fn default() -> Self {
        Self::new()
    }
}

impl QueueManager {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic shuffles for tests and reproducible sessions.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            main: PlayQueue::default(),
            shuffled: None,
            rng,
        }
    }

    pub fn name(&self) -> &str {
        &self.main.name
    }

    pub fn shuffle_on(&self) -> bool {
        self.shuffled.is_some()
    }

    pub fn main(&self) -> &PlayQueue {
        &self.main
    }

    pub fn shuffled(&self) -> Option<&[QueueEntry]> {
        self.shuffled.as_deref()
    }

    /// The queue playback walks: the shuffled one when shuffle is on.
    pub fn active(&self) -> &[QueueEntry] {
        match &self.shuffled {
            Some(entries) => entries,
            None => &self.main.entries,
        }
    }

    fn active_mut(&mut self) -> &mut Vec<QueueEntry> {
        match &mut self.shuffled {
            Some(entries) => entries,
            None => &mut self.main.entries,
        }
    }

    pub fn len(&self) -> usize {
        self.active().len()
    }

    pub fn is_empty(&self) -> bool {
        self.active().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TrackRef> {
        self.active().get(index).map(|e| &e.track)
    }

    pub fn position_of(&self, identity: &TrackSource) -> Option<usize> {
        position_in(self.active(), identity)
    }

    fn relocate(&self, identity: Option<&TrackSource>) -> usize {
        identity.and_then(|id| self.position_of(id)).unwrap_or(0)
    }

    fn regenerate_shuffled(&mut self) {
        let mut entries = self.main.entries.clone();
        entries.shuffle(&mut self.rng);
        reindex_from(&mut entries, 0);
        self.shuffled = Some(entries);
    }

    /// Replace the main queue unless `name` and length both match the
    /// current one. Returns the relocated current index, or `None` when the
    /// call was a no-op.
    pub fn set_queue(
        &mut self,
        name: &str,
        tracks: Vec<TrackRef>,
        current: Option<&TrackSource>,
    ) -> Option<usize> {
        if self.main.name == name && self.main.len() == tracks.len() {
            debug!(name, len = tracks.len(), "set_queue: same queue, ignoring");
            return None;
        }
        self.main = PlayQueue::new(name, tracks);
        if self.shuffle_on() {
            self.regenerate_shuffled();
        }
        debug!(name, len = self.main.len(), shuffle = self.shuffle_on(), "queue replaced");
        Some(self.relocate(current))
    }

    /// Turn shuffle on, replace the main queue under the same no-op rule as
    /// `set_queue`, and always draw a fresh permutation.
    pub fn set_shuffled_queue(
        &mut self,
        name: &str,
        tracks: Vec<TrackRef>,
        current: Option<&TrackSource>,
    ) -> usize {
        if self.main.name != name || self.main.len() != tracks.len() {
            self.main = PlayQueue::new(name, tracks);
        }
        self.regenerate_shuffled();
        debug!(name, len = self.main.len(), "shuffled queue replaced");
        self.relocate(current)
    }

    /// Insert right after `current` in the active queue (at the front when
    /// nothing is current). In shuffle mode the tracks are also appended
    /// to the main queue.
    pub fn add_next(&mut self, current: Option<usize>, tracks: Vec<TrackRef>) {
        if tracks.is_empty() {
            return;
        }
        let count = tracks.len();
        if let Some(shuffled) = &mut self.shuffled {
            let at = current.map_or(0, |c| c + 1).min(shuffled.len());
            shuffled.splice(at..at, wrap(tracks.clone()));
            reindex_from(shuffled, at);

            let start = self.main.entries.len();
            self.main.entries.extend(wrap(tracks));
            reindex_from(&mut self.main.entries, start);
            debug!(at, count, "added next (shuffled)");
        } else {
            let entries = &mut self.main.entries;
            let at = current.map_or(0, |c| c + 1).min(entries.len());
            entries.splice(at..at, wrap(tracks));
            reindex_from(entries, at);
            debug!(at, count, "added next");
        }
    }

    /// Add to the end of the active queue, mirrored to the main queue in
    /// shuffle mode.
    pub fn append(&mut self, tracks: Vec<TrackRef>) {
        if tracks.is_empty() {
            return;
        }
        if let Some(shuffled) = &mut self.shuffled {
            let start = shuffled.len();
            shuffled.extend(wrap(tracks.clone()));
            reindex_from(shuffled, start);
        }
        let start = self.main.entries.len();
        self.main.entries.extend(wrap(tracks));
        reindex_from(&mut self.main.entries, start);
        debug!(len = self.len(), "appended");
    }

    /// Remove the active entry at `index`. Out-of-range indices are ignored.
    ///
    /// When the current entry is removed its replacement is whatever slides
    /// into the same slot, or index 0 if it was the last one.
    pub fn remove(&mut self, index: usize, current: Option<usize>) -> Option<Removal> {
        if index >= self.len() {
            debug!(index, len = self.len(), "remove: index out of range");
            return None;
        }

        let entry = self.active_mut().remove(index);
        reindex_from(self.active_mut(), index);

        if self.shuffled.is_some() {
            if let Some(pos) = position_in(&self.main.entries, entry.track.identity()) {
                self.main.entries.remove(pos);
                reindex_from(&mut self.main.entries, pos);
            }
        }

        let len = self.len();
        let was_current = current == Some(index);
        let current = match current {
            _ if len == 0 => None,
            Some(c) if c == index => Some(if index < len { index } else { 0 }),
            Some(c) if c > index => Some(c - 1),
            other => other,
        };
        debug!(index, len, was_current, ?current, "removed entry");

        Some(Removal {
            removed: entry.track,
            was_current,
            current,
        })
    }

    /// Swap the entry at `index` with the one above it. `current` keeps
    /// pointing at the same track.
    pub fn move_up(&mut self, index: usize, current: &mut Option<usize>) -> bool {
        if index == 0 || index >= self.len() {
            debug!(index, "move_up: nothing to swap");
            return false;
        }
        self.swap(index - 1, index, current);
        true
    }

    /// Swap the entry at `index` with the one below it.
    pub fn move_down(&mut self, index: usize, current: &mut Option<usize>) -> bool {
        if index + 1 >= self.len() {
            debug!(index, "move_down: nothing to swap");
            return false;
        }
        self.swap(index, index + 1, current);
        true
    }

    fn swap(&mut self, a: usize, b: usize, current: &mut Option<usize>) {
        let entries = self.active_mut();
        entries.swap(a, b);
        entries[a].index = a as u32;
        entries[b].index = b as u32;

        *current = match *current {
            Some(c) if c == a => Some(b),
            Some(c) if c == b => Some(a),
            other => other,
        };
    }

    /// Flip shuffle and return the current track's index in the newly
    /// active queue (0 if it cannot be found).
    pub fn toggle_shuffle(&mut self, current: Option<&TrackSource>) -> usize {
        let enable = !self.shuffle_on();
        self.set_shuffle(enable, current)
    }

    pub fn set_shuffle(&mut self, on: bool, current: Option<&TrackSource>) -> usize {
        if on {
            self.regenerate_shuffled();
        } else {
            self.shuffled = None;
        }
        let idx = self.relocate(current);
        debug!(shuffle = on, current = idx, "shuffle toggled");
        idx
    }

    /// Set `can_play` on every entry carrying `identity`, in both queues.
    pub fn set_playable(&mut self, identity: &TrackSource, playable: bool) {
        let shuffled = self.shuffled.iter_mut().flatten();
        for entry in self.main.entries.iter_mut().chain(shuffled) {
            if entry.track.identity() == identity {
                entry.track.set_can_play(playable);
            }
        }
    }

    pub fn mark_unavailable(&mut self, identity: &TrackSource) {
        self.set_playable(identity, false);
    }

    pub fn mark_playable(&mut self, identity: &TrackSource) {
        self.set_playable(identity, true);
    }

    /// Reinstate persisted queues. A shuffled queue whose length does not
    /// match the main one is discarded and redrawn.
    pub fn restore(&mut self, name: &str, main: Vec<TrackRef>, shuffled: Option<Vec<TrackRef>>) {
        self.main = PlayQueue::new(name, main);
        self.shuffled = None;
        match shuffled {
            Some(tracks) if tracks.len() == self.main.len() => {
                self.shuffled = Some(entries_from(tracks));
            }
            Some(tracks) => {
                debug!(
                    main = self.main.len(),
                    shuffled = tracks.len(),
                    "persisted shuffle order does not match queue, redrawing"
                );
                self.regenerate_shuffled();
            }
            None => {}
        }
    }

    /// Drop both queues and turn shuffle off.
    pub fn clear(&mut self) {
        self.main = PlayQueue::default();
        self.shuffled = None;
    }
}
