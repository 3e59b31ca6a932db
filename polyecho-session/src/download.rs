//! "Download all stems" orchestration
//!
//! Waits for every stem payload, packages the archive and hands it to the
//! save target. Progress and outcome are published as notifications; any
//! failure along the way is logged in detail and surfaced to the user as
//! one generic error banner.

use crate::archive::ArchiveBuilder;
use crate::collector::StemCollector;
use crate::error::{Error, Result};
use crate::save::SaveTarget;
use chrono::{DateTime, Utc};
use polyecho_common::config::DownloadConfig;
use polyecho_common::events::{EventBus, Notification, PolyechoEvent};
use polyecho_common::{time, Project};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

pub const DOWNLOADING_MSG: &str = "Downloading project stems... please wait as we ping IPFS";
pub const COMPRESSED_MSG: &str =
    "Stems downloaded and compressed, please select a location to save them";
pub const SUCCESS_MSG: &str = "Stem(s) downloaded successfully";
pub const FAILURE_MSG: &str = "Failed to download all stems";

/// Where a finished download went
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadReport {
    pub path: PathBuf,
    pub file_name: String,
    pub stem_count: usize,
    pub archive_bytes: usize,
}

/// `<prefix>_<project name>_<unix millis>.<extension>`
///
/// Characters that are unsafe in file names are replaced with `_`.
pub fn archive_file_name(
    prefix: &str,
    project_name: &str,
    at: DateTime<Utc>,
    extension: &str,
) -> String {
    let safe_name: String = project_name
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "{}_{}_{}.{}",
        prefix,
        safe_name,
        time::unix_millis(at),
        extension
    )
}

/// Packages collected stems into one saved archive
pub struct StemDownloader {
    archive: Box<dyn ArchiveBuilder>,
    target: Box<dyn SaveTarget>,
    events: EventBus,
    archive_prefix: String,
    timeout: Duration,
}

impl StemDownloader {
    pub fn new(
        archive: Box<dyn ArchiveBuilder>,
        target: Box<dyn SaveTarget>,
        events: EventBus,
        config: &DownloadConfig,
    ) -> Self {
        Self {
            archive,
            target,
            events,
            archive_prefix: config.archive_prefix.clone(),
            timeout: config.timeout(),
        }
    }

    /// Wait for every stem of `project`, build the archive, save it
    ///
    /// Publishes progress, success and failure notifications. The detailed
    /// error is returned to the caller; users only see [`FAILURE_MSG`].
    pub async fn download(
        &self,
        project: &Project,
        collector: &StemCollector,
        cancel: &CancellationToken,
    ) -> Result<DownloadReport> {
        match self.run(project, collector, cancel).await {
            Ok(report) => {
                self.events.notify(Notification::success(SUCCESS_MSG));
                self.events.emit_lossy(PolyechoEvent::DownloadCompleted {
                    file_name: report.file_name.clone(),
                    stem_count: report.stem_count,
                    archive_bytes: report.archive_bytes,
                    timestamp: time::now(),
                });
                Ok(report)
            }
            Err(e) => {
                error!(project = %project.name, error = %e, "Stem download failed");
                self.events.notify(Notification::error(FAILURE_MSG));
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        project: &Project,
        collector: &StemCollector,
        cancel: &CancellationToken,
    ) -> Result<DownloadReport> {
        let expected = project.stems.len();
        if expected == 0 {
            return Err(Error::InvalidState(format!(
                "project '{}' has no stems to export",
                project.name
            )));
        }

        self.events.notify(Notification::progress(DOWNLOADING_MSG));
        info!(project = %project.name, expected, "Waiting for stem payloads");

        let store = collector
            .await_all_collected(expected, self.timeout, cancel)
            .await?;

        let blob = self.archive.build(&store)?;
        self.events.notify(Notification::progress(COMPRESSED_MSG));

        let file_name = archive_file_name(
            &self.archive_prefix,
            &project.name,
            time::now(),
            self.archive.extension(),
        );
        let path = self.target.save(&file_name, &blob).await?;

        info!(
            path = %path.display(),
            stems = store.len(),
            bytes = blob.len(),
            "Stem archive exported"
        );

        Ok(DownloadReport {
            path,
            file_name,
            stem_count: store.len(),
            archive_bytes: blob.len(),
        })
    }
}
