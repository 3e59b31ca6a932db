//! Event types for the Polyecho event system
//!
//! Provides shared event definitions and the EventBus used as the
//! notification sink by the session crates.

// Sub-modules (supporting types)
mod notification_types;
mod playback_types;

pub use notification_types::{Notification, Severity, PROGRESS_NOTIFICATION_MS};
pub use playback_types::{PlaybackState, TrackState};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Polyecho event types
///
/// Events are broadcast via EventBus and can be serialized for display
/// layers that live outside this workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PolyechoEvent {
    /// Aggregate transport state changed (Playing ↔ Paused)
    ///
    /// Triggers:
    /// - UI: swap the play-all button between play and pause icons
    PlaybackStateChanged {
        /// Playback state before change
        old_state: PlaybackState,
        /// Playback state after change
        new_state: PlaybackState,
        /// When state changed
        timestamp: DateTime<Utc>,
    },

    /// A stem finished loading and its track handle joined the registry
    TrackRegistered {
        /// Track index of the stem
        track_index: usize,
        /// Number of tracks registered after this one
        track_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// Effective mute flags were pushed into the registry
    MixApplied {
        /// Tracks that ended up muted, ascending
        muted_tracks: Vec<usize>,
        /// Tracks currently soloed, ascending
        soloed_tracks: Vec<usize>,
        timestamp: DateTime<Utc>,
    },

    /// Every track was soloed at once and the selection collapsed
    ///
    /// Triggers:
    /// - UI: reset every stem's solo highlight
    UnmuteAll {
        /// Trigger value after the flip (only the change is meaningful)
        trigger: bool,
        timestamp: DateTime<Utc>,
    },

    /// A stem payload was recorded by the collector
    StemCollected {
        stem_name: String,
        /// Payloads held after this one
        collected: usize,
        /// Stems the project declares
        expected: usize,
        timestamp: DateTime<Utc>,
    },

    /// A stem payload could not be fetched
    StemLoadFailed {
        stem_name: String,
        error: String,
        timestamp: DateTime<Utc>,
    },

    /// User-facing banner
    Notification {
        notification: Notification,
        timestamp: DateTime<Utc>,
    },

    /// The stem archive was handed to the save target
    DownloadCompleted {
        file_name: String,
        stem_count: usize,
        archive_bytes: usize,
        timestamp: DateTime<Utc>,
    },
}

impl PolyechoEvent {
    /// Wrap a notification with the current timestamp
    pub fn notify(notification: Notification) -> Self {
        PolyechoEvent::Notification {
            notification,
            timestamp: crate::time::now(),
        }
    }

    /// Short event name for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            PolyechoEvent::PlaybackStateChanged { .. } => "PlaybackStateChanged",
            PolyechoEvent::TrackRegistered { .. } => "TrackRegistered",
            PolyechoEvent::MixApplied { .. } => "MixApplied",
            PolyechoEvent::UnmuteAll { .. } => "UnmuteAll",
            PolyechoEvent::StemCollected { .. } => "StemCollected",
            PolyechoEvent::StemLoadFailed { .. } => "StemLoadFailed",
            PolyechoEvent::Notification { .. } => "Notification",
            PolyechoEvent::DownloadCompleted { .. } => "DownloadCompleted",
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus for session events
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use polyecho_common::events::{EventBus, Notification, PolyechoEvent};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(PolyechoEvent::notify(Notification::success("done")));
///
/// let event = rx.try_recv().unwrap();
/// assert_eq!(event.event_type(), "Notification");
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PolyechoEvent>,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<PolyechoEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: PolyechoEvent,
    ) -> Result<usize, broadcast::error::SendError<PolyechoEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: PolyechoEvent) {
        let _ = self.tx.send(event);
    }

    /// Publish a user-facing banner
    pub fn notify(&self, notification: Notification) {
        tracing::debug!(
            severity = %notification.severity,
            message = %notification.message,
            "Notification"
        );
        self.emit_lossy(PolyechoEvent::notify(notification));
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_without_subscribers_errors() {
        let bus = EventBus::new(10);
        let result = bus.emit(PolyechoEvent::UnmuteAll {
            trigger: true,
            timestamp: Utc::now(),
        });
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_subscriber_receives_notification() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        bus.notify(Notification::error("Failed to download all stems"));

        match rx.recv().await.unwrap() {
            PolyechoEvent::Notification { notification, .. } => {
                assert_eq!(notification.severity, Severity::Error);
                assert_eq!(notification.message, "Failed to download all stems");
                assert_eq!(notification.duration_ms, None);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = PolyechoEvent::StemCollected {
            stem_name: "drums".to_string(),
            collected: 1,
            expected: 3,
            timestamp: Utc::now(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "StemCollected");
        assert_eq!(value["stem_name"], "drums");
        assert_eq!(event.event_type(), "StemCollected");
    }

    #[test]
    fn test_progress_notification_duration() {
        let n = Notification::progress("Downloading project stems...");
        assert_eq!(n.severity, Severity::Info);
        assert_eq!(n.duration_ms, Some(PROGRESS_NOTIFICATION_MS));
    }
}
