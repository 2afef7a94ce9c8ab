use std::sync::Arc;

use super::LyricSlice;

/// Tracks which lyric slice is active for the current playback time.
#[derive(Debug, Default)]
pub struct LyricSynchronizer {
    slices: Arc<[LyricSlice]>,
    current: usize,
}

impl LyricSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the lyric track. `slices` must already be sorted.
    pub fn load(&mut self, slices: Vec<LyricSlice>) {
        self.slices = slices.into();
        self.current = 0;
    }

    pub fn clear(&mut self) {
        self.slices = Arc::default();
        self.current = 0;
    }

    pub fn reset_cursor(&mut self) {
        self.current = 0;
    }

    pub fn is_loaded(&self) -> bool {
        !self.slices.is_empty()
    }

    pub fn slices(&self) -> &[LyricSlice] {
        &self.slices
    }

    /// Cheap handle to the loaded lines for snapshot readers.
    pub fn shared(&self) -> Arc<[LyricSlice]> {
        Arc::clone(&self.slices)
    }

    pub fn current_index(&self) -> Option<usize> {
        self.is_loaded().then_some(self.current)
    }

    pub fn current_slice(&self) -> Option<&LyricSlice> {
        self.slices.get(self.current)
    }

    /// Index of the last slice starting at or before `t_ms`; 0 when none do.
    pub fn lookup(&self, t_ms: f64) -> usize {
        self.slices
            .partition_point(|s| s.timestamp_ms <= t_ms)
            .saturating_sub(1)
    }

    /// Move the cursor to `t_ms`. Returns the new index when it changed.
    pub fn update(&mut self, t_ms: f64) -> Option<usize> {
        if !self.is_loaded() {
            return None;
        }
        let idx = self.lookup(t_ms);
        if idx == self.current {
            return None;
        }
        self.current = idx;
        Some(idx)
    }
}
