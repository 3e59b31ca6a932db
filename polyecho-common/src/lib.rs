//! # Polyecho Common Library
//!
//! Shared code for the Polyecho session crates including:
//! - Project and stem document models
//! - Event types (PolyechoEvent enum) and the EventBus notification sink
//! - Configuration loading
//! - Utility functions

pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod time;

pub use error::{Error, Result};
pub use models::{Project, Stem};
