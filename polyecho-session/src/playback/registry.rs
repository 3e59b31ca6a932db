//! Track registry and transport fan-out
//!
//! Maps a stem's track index to its live handle and forwards transport
//! commands to every registered track. The aggregate playing flag is kept
//! here rather than derived from the handles: a play/pause toggle flips
//! it without asking any handle for its real status.

use super::handle::TrackHandle;
use polyecho_common::events::PlaybackState;
use std::collections::BTreeMap;
use tracing::debug;

/// Index → handle map with an aggregate transport flag
pub struct TrackRegistry<H: TrackHandle> {
    tracks: BTreeMap<usize, H>,
    state: PlaybackState,
}

impl<H: TrackHandle> Default for TrackRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: TrackHandle> TrackRegistry<H> {
    pub fn new() -> Self {
        Self {
            tracks: BTreeMap::new(),
            state: PlaybackState::Paused,
        }
    }

    /// Insert or replace the handle for `index`
    ///
    /// Returns the replaced handle, if any.
    pub fn register(&mut self, index: usize, handle: H) -> Option<H> {
        let replaced = self.tracks.insert(index, handle);
        debug!(
            track_index = index,
            replaced = replaced.is_some(),
            track_count = self.tracks.len(),
            "Track registered"
        );
        replaced
    }

    /// Toggle every handle, then flip the aggregate flag
    pub fn play_pause_all(&mut self) -> PlaybackState {
        for handle in self.tracks.values_mut() {
            handle.play_pause();
        }
        self.state = self.state.toggled();
        self.state
    }

    /// Start every handle without touching the aggregate flag
    pub fn play_all(&mut self) {
        for handle in self.tracks.values_mut() {
            handle.play();
        }
    }

    /// Stop every handle; the aggregate flag becomes paused
    pub fn stop_all(&mut self) -> PlaybackState {
        for handle in self.tracks.values_mut() {
            handle.stop();
        }
        self.state = PlaybackState::Paused;
        self.state
    }

    /// Seek every handle to the start; the aggregate flag is unchanged
    pub fn rewind_all(&mut self) {
        for handle in self.tracks.values_mut() {
            handle.seek_to(0.0);
        }
    }

    /// A track played to its end: rewind it and mark the transport paused
    pub fn on_track_finished(&mut self, index: usize) -> PlaybackState {
        if let Some(handle) = self.tracks.get_mut(&index) {
            handle.seek_to(0.0);
        }
        self.state = PlaybackState::Paused;
        self.state
    }

    /// Push effective mute flags into the handles
    ///
    /// Indices without a registered handle are ignored.
    pub fn apply_mutes(&mut self, flags: &BTreeMap<usize, bool>) {
        for (index, muted) in flags {
            if let Some(handle) = self.tracks.get_mut(index) {
                handle.set_mute(*muted);
            }
        }
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.state
    }

    pub fn get(&self, index: usize) -> Option<&H> {
        self.tracks.get(&index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut H> {
        self.tracks.get_mut(&index)
    }

    /// Registered indices, ascending
    pub fn indices(&self) -> Vec<usize> {
        self.tracks.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Drop every handle and reset the transport flag
    pub fn clear(&mut self) {
        self.tracks.clear();
        self.state = PlaybackState::Paused;
    }
}
