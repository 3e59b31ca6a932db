//! polyecho-session library
//!
//! Session core of the project detail view: multi-track transport,
//! mute/solo reconciliation, stem payload collection and the
//! "download all stems" archive export.

pub mod archive;
pub mod collector;
pub mod download;
pub mod error;
pub mod fetch;
pub mod playback;
pub mod save;
pub mod session;

pub use crate::error::{Error, Result};
pub use crate::session::ProjectSession;
