//! Test helpers for polyecho-session integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use polyecho_common::events::PolyechoEvent;
use polyecho_common::models::{Project, Stem};
use polyecho_session::collector::StemPayload;
use polyecho_session::error::{Error, Result};
use polyecho_session::fetch::AudioFetcher;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::broadcast;

pub fn stem_url(name: &str) -> String {
    format!("https://cdn.example/stems/{}.wav", name)
}

pub fn project_with_stems(names: &[&str]) -> Project {
    Project {
        id: Some("6241f0c1".to_string()),
        created_by: "0xabc".to_string(),
        collaborators: vec!["0xabc".to_string()],
        name: "Night Drive".to_string(),
        description: "Synthwave jam".to_string(),
        bpm: 110,
        timebox_mins: 10,
        track_limit: 10,
        tags: vec!["synthwave".to_string()],
        stems: names
            .iter()
            .map(|name| Stem {
                id: None,
                name: name.to_string(),
                filename: format!("{}.wav", name),
                audio_url: stem_url(name),
                stem_type: None,
                created_by: Some("0xabc".to_string()),
            })
            .collect(),
    }
}

/// Fake audio bytes for a stem
pub fn audio(name: &str) -> StemPayload {
    Bytes::from(format!("RIFF-{}", name))
}

/// What the scripted fetcher does for one URL
#[derive(Debug, Clone, Copy)]
pub enum Reply {
    After(Duration),
    Fail,
    Never,
}

/// Fetcher whose completion order and failures are scripted per stem
#[derive(Default)]
pub struct ScriptedFetcher {
    replies: HashMap<String, Reply>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, stem: &str, reply: Reply) -> Self {
        self.replies.insert(stem_url(stem), reply);
        self
    }
}

#[async_trait]
impl AudioFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<StemPayload> {
        let name = url
            .rsplit('/')
            .next()
            .and_then(|file| file.strip_suffix(".wav"))
            .unwrap_or(url)
            .to_string();

        match self.replies.get(url).copied().unwrap_or(Reply::Fail) {
            Reply::After(delay) => {
                tokio::time::sleep(delay).await;
                Ok(audio(&name))
            }
            Reply::Fail => Err(Error::Fetch {
                url: url.to_string(),
                reason: "HTTP 404".to_string(),
            }),
            Reply::Never => std::future::pending().await,
        }
    }
}

/// Everything currently buffered on a receiver
pub fn drain(rx: &mut broadcast::Receiver<PolyechoEvent>) -> Vec<PolyechoEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
