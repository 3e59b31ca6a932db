//! Playback-related type definitions

use serde::{Deserialize, Serialize};

/// Aggregate transport state across every registered track
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Playing,
    #[default]
    Paused,
}

impl PlaybackState {
    /// The state a play/pause toggle moves to
    pub fn toggled(self) -> Self {
        match self {
            PlaybackState::Playing => PlaybackState::Paused,
            PlaybackState::Paused => PlaybackState::Playing,
        }
    }

    pub fn is_playing(self) -> bool {
        self == PlaybackState::Playing
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackState::Playing => write!(f, "playing"),
            PlaybackState::Paused => write!(f, "paused"),
        }
    }
}

/// Per-track selection state shown on a stem's mute/solo buttons
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "PascalCase")]
pub enum TrackState {
    #[default]
    Normal,
    Muted,
    Soloed,
}

impl std::fmt::Display for TrackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackState::Normal => write!(f, "Normal"),
            TrackState::Muted => write!(f, "Muted"),
            TrackState::Soloed => write!(f, "Soloed"),
        }
    }
}
