//! Project session tests: track registration, mute/solo and transport

mod helpers;

use helpers::{drain, project_with_stems};
use polyecho_common::config::DownloadConfig;
use polyecho_common::events::{EventBus, PlaybackState, PolyechoEvent, TrackState};
use polyecho_session::playback::{HeadlessTrack, TrackHandle};
use polyecho_session::ProjectSession;
use std::time::Duration;

fn session_with_tracks(count: usize) -> (ProjectSession<HeadlessTrack>, EventBus) {
    let names = ["drums", "bass", "lead", "pad", "vox"];
    let events = EventBus::new(256);
    let mut session = ProjectSession::new(
        project_with_stems(&names[..count]),
        &DownloadConfig::default(),
        events.clone(),
    );
    for index in 0..count {
        session.on_track_ready(index, HeadlessTrack::new(Duration::from_secs(30)));
    }
    (session, events)
}

fn muted(session: &ProjectSession<HeadlessTrack>, index: usize) -> bool {
    session.registry().get(index).unwrap().is_muted()
}

#[test]
fn test_registration_announces_each_track() {
    let events = EventBus::new(64);
    let mut rx = events.subscribe();
    let mut session: ProjectSession<HeadlessTrack> = ProjectSession::new(
        project_with_stems(&["drums", "bass"]),
        &DownloadConfig::default(),
        events.clone(),
    );

    session.on_track_ready(1, HeadlessTrack::new(Duration::from_secs(5)));
    session.on_track_ready(0, HeadlessTrack::new(Duration::from_secs(5)));

    let counts: Vec<(usize, usize)> = drain(&mut rx)
        .into_iter()
        .filter_map(|event| match event {
            PolyechoEvent::TrackRegistered {
                track_index,
                track_count,
                ..
            } => Some((track_index, track_count)),
            _ => None,
        })
        .collect();
    assert_eq!(counts, vec![(1, 1), (0, 2)]);
    assert_eq!(session.registry().indices(), vec![0, 1]);
}

#[test]
fn test_soloing_every_track_returns_all_to_normal() {
    let (mut session, events) = session_with_tracks(3);
    let mut rx = events.subscribe();
    let trigger_before = session.unmute_all_trigger();

    assert_eq!(session.toggle_solo(0), TrackState::Soloed);
    assert!(!muted(&session, 0));
    assert!(muted(&session, 1));
    assert!(muted(&session, 2));

    session.toggle_solo(1);
    assert!(!muted(&session, 0));
    assert!(!muted(&session, 1));
    assert!(muted(&session, 2));

    // Third solo collapses the whole selection
    assert_eq!(session.toggle_solo(2), TrackState::Normal);
    for index in 0..3 {
        assert_eq!(session.track_state(index), TrackState::Normal);
        assert!(!muted(&session, index));
    }
    assert_ne!(session.unmute_all_trigger(), trigger_before);

    let unmute_all: Vec<bool> = drain(&mut rx)
        .into_iter()
        .filter_map(|event| match event {
            PolyechoEvent::UnmuteAll { trigger, .. } => Some(trigger),
            _ => None,
        })
        .collect();
    assert_eq!(unmute_all, vec![!trigger_before]);
}

#[test]
fn test_solo_takes_over_a_muted_track() {
    let (mut session, _events) = session_with_tracks(3);

    assert_eq!(session.toggle_mute(0), TrackState::Muted);
    assert!(muted(&session, 0));
    assert!(!muted(&session, 1));

    assert_eq!(session.toggle_solo(0), TrackState::Soloed);
    assert!(!muted(&session, 0));
    assert!(muted(&session, 1));
    assert!(muted(&session, 2));

    // Un-solo leaves the track Normal, not Muted
    assert_eq!(session.toggle_solo(0), TrackState::Normal);
    for index in 0..3 {
        assert!(!muted(&session, index));
    }
}

#[test]
fn test_mix_applied_reports_effective_mutes() {
    let (mut session, events) = session_with_tracks(3);
    let mut rx = events.subscribe();

    session.toggle_mute(2);
    session.toggle_solo(1);

    let last_mix = drain(&mut rx)
        .into_iter()
        .filter_map(|event| match event {
            PolyechoEvent::MixApplied {
                muted_tracks,
                soloed_tracks,
                ..
            } => Some((muted_tracks, soloed_tracks)),
            _ => None,
        })
        .last()
        .unwrap();
    assert_eq!(last_mix, (vec![0, 2], vec![1]));
}

#[test]
fn test_late_track_joins_current_mix() {
    let events = EventBus::new(64);
    let mut session: ProjectSession<HeadlessTrack> = ProjectSession::new(
        project_with_stems(&["drums", "bass", "lead"]),
        &DownloadConfig::default(),
        events,
    );
    session.on_track_ready(0, HeadlessTrack::new(Duration::from_secs(5)));
    session.on_track_ready(2, HeadlessTrack::new(Duration::from_secs(5)));
    session.toggle_solo(0);
    assert!(muted(&session, 2));

    session.on_track_ready(1, HeadlessTrack::new(Duration::from_secs(5)));
    assert!(muted(&session, 1));
    assert!(!muted(&session, 0));
    assert_eq!(session.track_state(0), TrackState::Soloed);
}

#[test]
fn test_play_pause_fans_out_and_announces() {
    let (mut session, events) = session_with_tracks(3);
    let mut rx = events.subscribe();

    assert_eq!(session.play_pause_all(), PlaybackState::Playing);
    for index in 0..3 {
        assert!(session.registry().get(index).unwrap().is_playing());
    }

    assert_eq!(session.play_pause_all(), PlaybackState::Paused);
    assert!(!session.registry().get(0).unwrap().is_playing());

    let transitions: Vec<(PlaybackState, PlaybackState)> = drain(&mut rx)
        .into_iter()
        .filter_map(|event| match event {
            PolyechoEvent::PlaybackStateChanged {
                old_state,
                new_state,
                ..
            } => Some((old_state, new_state)),
            _ => None,
        })
        .collect();
    assert_eq!(
        transitions,
        vec![
            (PlaybackState::Paused, PlaybackState::Playing),
            (PlaybackState::Playing, PlaybackState::Paused),
        ]
    );
}

#[test]
fn test_finished_track_resets_transport() {
    let (mut session, events) = session_with_tracks(2);
    session.play_pause_all();
    let mut rx = events.subscribe();

    session.on_track_finished(1);
    assert_eq!(session.playback_state(), PlaybackState::Paused);

    // Already paused, nothing further to announce
    session.stop_all();
    let changes = drain(&mut rx)
        .into_iter()
        .filter(|event| matches!(event, PolyechoEvent::PlaybackStateChanged { .. }))
        .count();
    assert_eq!(changes, 1);
}

#[test]
fn test_reset_clears_tracks_and_selection() {
    let (mut session, _events) = session_with_tracks(3);
    session.toggle_solo(1);
    session.play_pause_all();

    session.reset();
    assert!(session.registry().is_empty());
    assert_eq!(session.track_state(1), TrackState::Normal);
    assert_eq!(session.playback_state(), PlaybackState::Paused);
    assert!(session.collector().is_empty());
}
