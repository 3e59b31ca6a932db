//! Project detail session
//!
//! Ties the pieces of one open project together: the track registry, the
//! mute/solo selection, the stem payload collector and the event bus.
//! Every UI action goes through a `&mut self` method, so each state update
//! is complete and visible before the next action runs. Stem fetches run
//! as independent tasks and only touch the shared collector.

use crate::collector::{RecordOutcome, StemCollector, StemPayload};
use crate::download::{DownloadReport, StemDownloader};
use crate::error::Result;
use crate::fetch::AudioFetcher;
use crate::playback::{MuteSoloReconciler, TrackHandle, TrackRegistry};
use polyecho_common::config::DownloadConfig;
use polyecho_common::events::{EventBus, PlaybackState, PolyechoEvent, TrackState};
use polyecho_common::{time, Project};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

/// State of one open project detail view
pub struct ProjectSession<H: TrackHandle> {
    session_id: Uuid,
    project: Project,
    registry: TrackRegistry<H>,
    mixer: MuteSoloReconciler,
    collector: Arc<StemCollector>,
    events: EventBus,
}

impl<H: TrackHandle> ProjectSession<H> {
    pub fn new(project: Project, config: &DownloadConfig, events: EventBus) -> Self {
        let collector = Arc::new(StemCollector::with_expected(
            config.duplicate_policy,
            project.stem_keys(),
        ));
        let session_id = Uuid::new_v4();
        info!(
            %session_id,
            project = %project.name,
            stems = project.stems.len(),
            "Project session opened"
        );
        Self {
            session_id,
            project,
            registry: TrackRegistry::new(),
            mixer: MuteSoloReconciler::new(),
            collector,
            events,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn registry(&self) -> &TrackRegistry<H> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut TrackRegistry<H> {
        &mut self.registry
    }

    pub fn collector(&self) -> Arc<StemCollector> {
        Arc::clone(&self.collector)
    }

    // ------------------------------------------------------------------
    // Tracks and mute/solo
    // ------------------------------------------------------------------

    /// A stem's audio finished loading and its handle is ready
    pub fn on_track_ready(&mut self, index: usize, handle: H) {
        self.registry.register(index, handle);
        self.events.emit_lossy(PolyechoEvent::TrackRegistered {
            track_index: index,
            track_count: self.registry.len(),
            timestamp: time::now(),
        });
        self.reconcile();
    }

    pub fn toggle_mute(&mut self, index: usize) -> TrackState {
        self.mixer.toggle_mute(index);
        self.reconcile();
        self.track_state(index)
    }

    pub fn toggle_solo(&mut self, index: usize) -> TrackState {
        self.mixer.toggle_solo(index);
        self.reconcile();
        self.track_state(index)
    }

    /// Recompute effective mutes and push them into the registry
    fn reconcile(&mut self) {
        let outcome = self.mixer.recompute(&self.registry.indices());
        self.registry.apply_mutes(&outcome.mute_flags);

        if outcome.collapsed {
            info!("Every track soloed, all tracks back to normal");
            self.events.emit_lossy(PolyechoEvent::UnmuteAll {
                trigger: outcome.selection.unmute_all_trigger(),
                timestamp: time::now(),
            });
        }

        self.events.emit_lossy(PolyechoEvent::MixApplied {
            muted_tracks: outcome
                .mute_flags
                .iter()
                .filter(|(_, muted)| **muted)
                .map(|(index, _)| *index)
                .collect(),
            soloed_tracks: outcome.selection.soloed().iter().copied().collect(),
            timestamp: time::now(),
        });
    }

    /// Button state for one track's mute/solo controls
    pub fn track_state(&self, index: usize) -> TrackState {
        self.mixer.selection().track_state(index)
    }

    pub fn unmute_all_trigger(&self) -> bool {
        self.mixer.selection().unmute_all_trigger()
    }

    // ------------------------------------------------------------------
    // Transport
    // ------------------------------------------------------------------

    pub fn playback_state(&self) -> PlaybackState {
        self.registry.playback_state()
    }

    pub fn play_pause_all(&mut self) -> PlaybackState {
        let old_state = self.registry.playback_state();
        let new_state = self.registry.play_pause_all();
        self.announce_transport(old_state, new_state);
        new_state
    }

    pub fn play_all(&mut self) {
        self.registry.play_all();
    }

    pub fn stop_all(&mut self) {
        let old_state = self.registry.playback_state();
        let new_state = self.registry.stop_all();
        self.announce_transport(old_state, new_state);
    }

    pub fn rewind_all(&mut self) {
        self.registry.rewind_all();
    }

    /// A track's player reported that it played to the end
    pub fn on_track_finished(&mut self, index: usize) {
        let old_state = self.registry.playback_state();
        let new_state = self.registry.on_track_finished(index);
        self.announce_transport(old_state, new_state);
    }

    fn announce_transport(&self, old_state: PlaybackState, new_state: PlaybackState) {
        if old_state != new_state {
            self.events.emit_lossy(PolyechoEvent::PlaybackStateChanged {
                old_state,
                new_state,
                timestamp: time::now(),
            });
        }
    }

    // ------------------------------------------------------------------
    // Stem payloads and export
    // ------------------------------------------------------------------

    /// Record a fetched payload under its stem name
    pub fn record_stem(&self, name: &str, payload: StemPayload) -> Result<RecordOutcome> {
        record_and_announce(
            &self.collector,
            &self.events,
            self.project.stems.len(),
            name,
            payload,
        )
    }

    /// Fetch every stem once, concurrently
    ///
    /// Each fetch is its own task; completions arrive in any order and are
    /// recorded with the collector. Failures are recorded and announced,
    /// never retried.
    pub fn load_stems(&self, fetcher: Arc<dyn AudioFetcher>) -> Vec<JoinHandle<()>> {
        let expected = self.project.stems.len();
        self.project
            .stems
            .iter()
            .zip(self.project.stem_keys())
            .map(|(stem, name)| {
                let url = stem.audio_url.clone();
                let fetcher = Arc::clone(&fetcher);
                let collector = Arc::clone(&self.collector);
                let events = self.events.clone();

                tokio::spawn(async move {
                    match fetcher.fetch(&url).await {
                        Ok(payload) => {
                            if let Err(e) =
                                record_and_announce(&collector, &events, expected, &name, payload)
                            {
                                warn!(stem = %name, error = %e, "Stem payload not recorded");
                            }
                        }
                        Err(e) => {
                            collector.record_failure(&name, e.to_string());
                            events.emit_lossy(PolyechoEvent::StemLoadFailed {
                                stem_name: name,
                                error: e.to_string(),
                                timestamp: time::now(),
                            });
                        }
                    }
                })
            })
            .collect()
    }

    /// Export is offered once the project has stems and all are collected
    pub fn export_enabled(&self) -> bool {
        let expected = self.project.stems.len();
        expected > 0 && self.collector.len() == expected
    }

    pub async fn download(
        &self,
        downloader: &StemDownloader,
        cancel: &CancellationToken,
    ) -> Result<DownloadReport> {
        downloader
            .download(&self.project, &self.collector, cancel)
            .await
    }

    /// Tear down: drop every handle, selection and payload
    pub fn reset(&mut self) {
        self.registry.clear();
        self.mixer.reset();
        self.collector.clear();
        info!(
            session_id = %self.session_id,
            project = %self.project.name,
            "Project session reset"
        );
    }
}

fn record_and_announce(
    collector: &StemCollector,
    events: &EventBus,
    expected: usize,
    name: &str,
    payload: StemPayload,
) -> Result<RecordOutcome> {
    let outcome = collector.record_payload(name, payload)?;
    events.emit_lossy(PolyechoEvent::StemCollected {
        stem_name: name.to_string(),
        collected: collector.len(),
        expected,
        timestamp: time::now(),
    });
    Ok(outcome)
}
