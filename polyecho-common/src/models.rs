//! Project and stem documents
//!
//! Mirrors the persisted project document closely enough for the session
//! layer: identity, display metadata, and the ordered stem list.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

const NAME_LEN: std::ops::RangeInclusive<usize> = 3..=50;
const DESCRIPTION_LEN: std::ops::RangeInclusive<usize> = 1..=300;
const BPM_RANGE: std::ops::RangeInclusive<u32> = 40..=300;
const TIMEBOX_RANGE: std::ops::RangeInclusive<u32> = 0..=30;

/// One contributed audio track
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Stem {
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub filename: String,
    /// Where the audio lives, `https://` or `ipfs://`
    #[serde(alias = "audioHref")]
    pub audio_url: String,
    /// Stem category (drums, bass, melody, ...)
    #[serde(default, rename = "type")]
    pub stem_type: Option<String>,
    /// Wallet address of the contributor
    #[serde(default)]
    pub created_by: Option<String>,
}

impl Stem {
    /// Name the payload is stored and archived under
    ///
    /// The display name when set, otherwise the uploaded filename.
    pub fn archive_key(&self) -> &str {
        let name = self.name.trim();
        if name.is_empty() {
            self.filename.trim()
        } else {
            name
        }
    }
}

/// A collaborative project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    pub created_by: String,
    #[serde(default)]
    pub collaborators: Vec<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub bpm: u32,
    #[serde(default)]
    pub timebox_mins: u32,
    #[serde(default = "default_track_limit")]
    pub track_limit: usize,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub stems: Vec<Stem>,
}

fn default_track_limit() -> usize {
    10
}

impl Project {
    /// Load a project manifest, JSON or TOML by file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let project: Project = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&content)
                .map_err(|e| Error::InvalidInput(format!("{}: {}", path.display(), e)))?,
            _ => serde_json::from_str(&content)?,
        };
        project.validate()?;
        Ok(project)
    }

    /// Check the document constraints the project form enforces
    pub fn validate(&self) -> Result<()> {
        let name_len = self.name.trim().chars().count();
        if !NAME_LEN.contains(&name_len) {
            return Err(Error::InvalidInput(format!(
                "project name must be {}-{} characters, got {}",
                NAME_LEN.start(),
                NAME_LEN.end(),
                name_len
            )));
        }

        let desc_len = self.description.trim().chars().count();
        if !DESCRIPTION_LEN.contains(&desc_len) {
            return Err(Error::InvalidInput(format!(
                "description must be {}-{} characters, got {}",
                DESCRIPTION_LEN.start(),
                DESCRIPTION_LEN.end(),
                desc_len
            )));
        }

        if !BPM_RANGE.contains(&self.bpm) {
            return Err(Error::InvalidInput(format!(
                "bpm {} outside {}-{}",
                self.bpm,
                BPM_RANGE.start(),
                BPM_RANGE.end()
            )));
        }

        if !TIMEBOX_RANGE.contains(&self.timebox_mins) {
            return Err(Error::InvalidInput(format!(
                "timebox {} minutes outside {}-{}",
                self.timebox_mins,
                TIMEBOX_RANGE.start(),
                TIMEBOX_RANGE.end()
            )));
        }

        for (idx, stem) in self.stems.iter().enumerate() {
            if stem.archive_key().is_empty() {
                return Err(Error::InvalidInput(format!(
                    "stem {} has neither a name nor a filename",
                    idx
                )));
            }
            if stem.audio_url.trim().is_empty() {
                return Err(Error::InvalidInput(format!(
                    "stem '{}' has no audio URL",
                    stem.archive_key()
                )));
            }
        }

        Ok(())
    }

    /// No more stems may be added once the track limit is reached
    pub fn limit_reached(&self) -> bool {
        self.stems.len() >= self.track_limit
    }

    /// Unique archive key of every stem, in project order
    ///
    /// Stems sharing a name keep it for the first occurrence; later ones
    /// become `<name> (2)`, `<name> (3)` and so on.
    pub fn stem_keys(&self) -> Vec<String> {
        let mut taken = BTreeSet::new();
        self.stems
            .iter()
            .map(|stem| {
                let base = stem.archive_key();
                let mut key = base.to_string();
                let mut n = 2;
                while taken.contains(&key) {
                    key = format!("{} ({})", base, n);
                    n += 1;
                }
                taken.insert(key.clone());
                key
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stem(name: &str, filename: &str) -> Stem {
        Stem {
            id: None,
            name: name.to_string(),
            filename: filename.to_string(),
            audio_url: format!("ipfs://cid/{}", filename),
            stem_type: Some("drums".to_string()),
            created_by: None,
        }
    }

    fn project() -> Project {
        Project {
            id: Some("p1".to_string()),
            created_by: "0xabc".to_string(),
            collaborators: vec!["0xabc".to_string()],
            name: "Night Drive".to_string(),
            description: "Synthwave jam".to_string(),
            bpm: 120,
            timebox_mins: 10,
            track_limit: 3,
            tags: vec![],
            stems: vec![stem("drums", "drums.wav"), stem("", "bass.wav")],
        }
    }

    #[test]
    fn test_archive_key_falls_back_to_filename() {
        assert_eq!(stem("drums", "d.wav").archive_key(), "drums");
        assert_eq!(stem("  ", "bass.wav").archive_key(), "bass.wav");
    }

    #[test]
    fn test_valid_project_passes() {
        assert!(project().validate().is_ok());
        assert_eq!(project().stem_keys(), vec!["drums", "bass.wav"]);
    }

    #[test]
    fn test_short_name_rejected() {
        let mut p = project();
        p.name = " ab ".to_string();
        assert!(matches!(p.validate(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_bpm_bounds() {
        let mut p = project();
        p.bpm = 39;
        assert!(p.validate().is_err());
        p.bpm = 300;
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_stem_without_url_rejected() {
        let mut p = project();
        p.stems[0].audio_url = String::new();
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_shared_stem_names_get_distinct_keys() {
        let mut p = project();
        p.stems = vec![
            stem("drums", "a.wav"),
            stem("drums", "b.wav"),
            stem("drums (2)", "c.wav"),
            stem("drums", "d.wav"),
        ];
        assert!(p.validate().is_ok());
        assert_eq!(
            p.stem_keys(),
            vec!["drums", "drums (2)", "drums (2) (2)", "drums (3)"]
        );
    }

    #[test]
    fn test_limit_reached() {
        let mut p = project();
        assert!(!p.limit_reached());
        p.stems.push(stem("lead", "lead.wav"));
        assert!(p.limit_reached());
    }

    #[test]
    fn test_parses_document_field_names() {
        let json = r#"{
            "_id": "6241",
            "createdBy": "0xabc",
            "collaborators": ["0xabc"],
            "name": "Night Drive",
            "description": "Synthwave jam",
            "bpm": 100,
            "timeboxMins": 5,
            "trackLimit": 4,
            "tags": ["synth"],
            "stems": [
                {"_id": "s1", "name": "drums", "filename": "drums.wav",
                 "audioHref": "ipfs://bafy/drums.wav", "type": "drums", "createdBy": "0xabc"}
            ]
        }"#;
        let p: Project = serde_json::from_str(json).unwrap();
        assert_eq!(p.id.as_deref(), Some("6241"));
        assert_eq!(p.track_limit, 4);
        assert_eq!(p.stems[0].audio_url, "ipfs://bafy/drums.wav");
        assert_eq!(p.stems[0].stem_type.as_deref(), Some("drums"));
        assert!(p.validate().is_ok());
    }
}
