//! Multi-track playback: transport fan-out and mute/solo reconciliation

pub mod handle;
pub mod mute_solo;
pub mod registry;

pub use handle::{HeadlessTrack, TrackHandle};
pub use mute_solo::{reconcile, MuteSoloReconciler, Reconciliation, Selection};
pub use registry::TrackRegistry;
