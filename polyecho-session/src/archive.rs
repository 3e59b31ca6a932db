//! Stem archive packaging
//!
//! Every collected payload becomes one archive entry named
//! `<stem name>.wav`. Entries are stored without recompression so each
//! entry's bytes are identical to the fetched audio.

use crate::collector::StemPayload;
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::io::{Cursor, Write};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Serializes a set of (name, payload) pairs into one blob
pub trait ArchiveBuilder: Send + Sync {
    fn build(&self, entries: &BTreeMap<String, StemPayload>) -> Result<Vec<u8>>;

    /// File extension of the produced blob, without the dot
    fn extension(&self) -> &'static str;
}

/// Archive entry name for a stem key
pub fn entry_name(stem_key: &str) -> String {
    format!("{}.wav", stem_key)
}

/// Zip archive with stored entries
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipArchiveBuilder;

impl ArchiveBuilder for ZipArchiveBuilder {
    fn build(&self, entries: &BTreeMap<String, StemPayload>) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let large = entries.values().any(|p| p.len() as u64 >= u32::MAX as u64);

        for (key, payload) in entries {
            let name = entry_name(key);
            let options = SimpleFileOptions::default()
                .compression_method(CompressionMethod::Stored)
                .large_file(large);
            writer
                .start_file(name.as_str(), options)
                .map_err(|e| Error::Archive(format!("{}: {}", name, e)))?;
            writer
                .write_all(payload)
                .map_err(|e| Error::Archive(format!("{}: {}", name, e)))?;
            debug!(entry = %name, bytes = payload.len(), "Archive entry written");
        }

        let cursor = writer
            .finish()
            .map_err(|e| Error::Archive(e.to_string()))?;
        Ok(cursor.into_inner())
    }

    fn extension(&self) -> &'static str {
        "zip"
    }
}
