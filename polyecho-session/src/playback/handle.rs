//! Track handles
//!
//! A [`TrackHandle`] is the live playback controller for one stem. The
//! waveform player that renders and plays the audio lives outside this
//! crate; it only has to expose the transport verbs below.
//!
//! [`HeadlessTrack`] is an in-memory implementation that models the
//! transport without producing sound. It backs the session when no
//! audio device is attached and is what the tests drive.

use std::time::Duration;

/// Transport controller for a single stem
pub trait TrackHandle: Send {
    /// Start if stopped, pause if playing
    fn play_pause(&mut self);

    /// Start playback from the current position
    fn play(&mut self);

    /// Pause and return to the start
    fn stop(&mut self);

    /// Move the playhead to `progress` (0.0 = start, 1.0 = end)
    fn seek_to(&mut self, progress: f64);

    fn set_mute(&mut self, muted: bool);

    fn is_muted(&self) -> bool;

    fn is_playing(&self) -> bool;
}

/// In-memory transport model for one stem
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessTrack {
    duration: Duration,
    position: Duration,
    playing: bool,
    muted: bool,
}

impl HeadlessTrack {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            position: Duration::ZERO,
            playing: false,
            muted: false,
        }
    }

    pub fn position(&self) -> Duration {
        self.position
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Advance the playhead by `elapsed` if playing
    ///
    /// Returns `true` when this advance reached the end of the track. The
    /// track stops at the end; the caller routes the finish event to
    /// [`TrackRegistry::on_track_finished`](super::TrackRegistry::on_track_finished).
    pub fn advance(&mut self, elapsed: Duration) -> bool {
        if !self.playing {
            return false;
        }
        self.position = (self.position + elapsed).min(self.duration);
        if self.position >= self.duration {
            self.playing = false;
            return true;
        }
        false
    }
}

impl TrackHandle for HeadlessTrack {
    fn play_pause(&mut self) {
        if self.playing {
            self.playing = false;
        } else {
            self.play();
        }
    }

    fn play(&mut self) {
        if self.position >= self.duration {
            self.position = Duration::ZERO;
        }
        self.playing = true;
    }

    fn stop(&mut self) {
        self.playing = false;
        self.position = Duration::ZERO;
    }

    fn seek_to(&mut self, progress: f64) {
        let progress = if progress.is_finite() {
            progress.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.position = self.duration.mul_f64(progress);
    }

    fn set_mute(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn is_muted(&self) -> bool {
        self.muted
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_play_pause_toggles() {
        let mut track = HeadlessTrack::new(Duration::from_secs(10));
        track.play_pause();
        assert!(track.is_playing());
        track.play_pause();
        assert!(!track.is_playing());
    }

    #[test]
    fn test_stop_rewinds() {
        let mut track = HeadlessTrack::new(Duration::from_secs(10));
        track.play();
        track.advance(Duration::from_secs(4));
        track.stop();
        assert!(!track.is_playing());
        assert_eq!(track.position(), Duration::ZERO);
    }

    #[test]
    fn test_seek_clamps_progress() {
        let mut track = HeadlessTrack::new(Duration::from_secs(10));
        track.seek_to(0.5);
        assert_eq!(track.position(), Duration::from_secs(5));
        track.seek_to(7.0);
        assert_eq!(track.position(), Duration::from_secs(10));
        track.seek_to(f64::NAN);
        assert_eq!(track.position(), Duration::ZERO);
    }

    #[test]
    fn test_advance_reports_finish_once() {
        let mut track = HeadlessTrack::new(Duration::from_secs(2));
        track.play();
        assert!(!track.advance(Duration::from_secs(1)));
        assert!(track.advance(Duration::from_secs(5)));
        assert!(!track.is_playing());
        assert!(!track.advance(Duration::from_secs(1)));
    }

    #[test]
    fn test_mute_does_not_touch_transport() {
        let mut track = HeadlessTrack::new(Duration::from_secs(2));
        track.play();
        track.set_mute(true);
        assert!(track.is_muted());
        assert!(track.is_playing());
    }
}
