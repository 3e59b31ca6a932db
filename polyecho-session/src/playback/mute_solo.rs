//! Mute/solo reconciliation
//!
//! Each track is Normal, Muted or Soloed. The user's choices live in a
//! [`Selection`] snapshot (two disjoint index sets plus the unmute-all
//! trigger). Toggles return a new snapshot; [`reconcile`] is the single
//! place effective mute flags are derived:
//!
//! - any track soloed: a track is muted unless it is soloed
//! - nothing soloed: a track is muted iff it is in the muted set
//!
//! Soloing every registered track means the same as soloing none, so
//! that selection collapses: both sets are cleared and the unmute-all
//! trigger flips once so solo highlights can reset.

use polyecho_common::events::TrackState;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Immutable mute/solo selection
///
/// Invariant: `muted` and `soloed` are disjoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    muted: BTreeSet<usize>,
    soloed: BTreeSet<usize>,
    unmute_all: bool,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mute `index`, or return it to Normal if already muted
    pub fn toggle_mute(&self, index: usize) -> Selection {
        let mut next = self.clone();
        if !next.muted.remove(&index) {
            next.muted.insert(index);
        }
        next.soloed.remove(&index);
        next
    }

    /// Solo `index`, or return it to Normal if already soloed
    pub fn toggle_solo(&self, index: usize) -> Selection {
        let mut next = self.clone();
        if !next.soloed.remove(&index) {
            next.soloed.insert(index);
        }
        next.muted.remove(&index);
        next
    }

    pub fn muted(&self) -> &BTreeSet<usize> {
        &self.muted
    }

    pub fn soloed(&self) -> &BTreeSet<usize> {
        &self.soloed
    }

    /// Current trigger value; only its changes carry meaning
    pub fn unmute_all_trigger(&self) -> bool {
        self.unmute_all
    }

    pub fn track_state(&self, index: usize) -> TrackState {
        if self.soloed.contains(&index) {
            TrackState::Soloed
        } else if self.muted.contains(&index) {
            TrackState::Muted
        } else {
            TrackState::Normal
        }
    }

    /// Effective mute flag for one track under this selection
    pub fn effective_mute(&self, index: usize) -> bool {
        if self.soloed.is_empty() {
            self.muted.contains(&index)
        } else {
            !self.soloed.contains(&index)
        }
    }
}

/// Outcome of one recomputation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Snapshot to keep as the current selection
    pub selection: Selection,
    /// Effective mute flag per registered track
    pub mute_flags: BTreeMap<usize, bool>,
    /// Whether the all-soloed collapse happened
    pub collapsed: bool,
}

/// Derive effective mute flags for `tracks` from `selection`
pub fn reconcile(selection: &Selection, tracks: &[usize]) -> Reconciliation {
    let all_soloed = !tracks.is_empty()
        && !selection.soloed.is_empty()
        && tracks.iter().all(|i| selection.soloed.contains(i));

    let next = if all_soloed {
        debug!(
            track_count = tracks.len(),
            "Every track soloed, clearing mute/solo selection"
        );
        Selection {
            muted: BTreeSet::new(),
            soloed: BTreeSet::new(),
            unmute_all: !selection.unmute_all,
        }
    } else {
        selection.clone()
    };

    let mute_flags = tracks
        .iter()
        .map(|&i| (i, next.effective_mute(i)))
        .collect();

    Reconciliation {
        selection: next,
        mute_flags,
        collapsed: all_soloed,
    }
}

/// Holder for the current selection snapshot
#[derive(Debug, Clone, Default)]
pub struct MuteSoloReconciler {
    selection: Selection,
}

impl MuteSoloReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle_mute(&mut self, index: usize) {
        self.selection = self.selection.toggle_mute(index);
    }

    pub fn toggle_solo(&mut self, index: usize) {
        self.selection = self.selection.toggle_solo(index);
    }

    /// Recompute against the registered tracks and keep the result
    pub fn recompute(&mut self, tracks: &[usize]) -> Reconciliation {
        let outcome = reconcile(&self.selection, tracks);
        self.selection = outcome.selection.clone();
        outcome
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Clear both sets; the trigger keeps its value
    pub fn reset(&mut self) {
        self.selection = Selection {
            unmute_all: self.selection.unmute_all,
            ..Selection::default()
        };
    }
}
