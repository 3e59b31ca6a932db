//! Stem payload collection
//!
//! Each stem's audio is fetched once, independently, and may complete in
//! any order. The collector keeps the payloads keyed by stem name and
//! publishes the collected count on a watch channel, so a waiter can
//! suspend until the count reaches the expected value instead of polling.
//!
//! Waits are bounded by a timeout and a cancellation token. When a wait
//! gives up, the collector remembers it: payloads that arrive afterwards
//! are still stored but reported as late.

use crate::error::{Error, Result};
use bytes::Bytes;
use polyecho_common::config::DuplicatePolicy;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Raw audio bytes of one stem, exactly as fetched
pub type StemPayload = Bytes;

/// How a recorded payload was treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// First payload under this name
    Inserted,
    /// Replaced an earlier payload under this name
    Replaced,
    /// Stored after a wait had already timed out or been cancelled
    Late,
}

#[derive(Default)]
struct Inner {
    payloads: BTreeMap<String, StemPayload>,
    expected: BTreeSet<String>,
    failures: BTreeMap<String, String>,
    /// Set when a wait gave up; cleared when a new wait starts
    abandoned: bool,
}

/// Name-keyed payload store with a completion signal
pub struct StemCollector {
    inner: Mutex<Inner>,
    count_tx: watch::Sender<usize>,
    policy: DuplicatePolicy,
}

impl Default for StemCollector {
    fn default() -> Self {
        Self::new(DuplicatePolicy::default())
    }
}

impl StemCollector {
    pub fn new(policy: DuplicatePolicy) -> Self {
        let (count_tx, _) = watch::channel(0);
        Self {
            inner: Mutex::new(Inner::default()),
            count_tx,
            policy,
        }
    }

    /// Collector that knows which stem names to expect
    pub fn with_expected<I, S>(policy: DuplicatePolicy, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let collector = Self::new(policy);
        collector.expect(names);
        collector
    }

    /// Declare the stem names this collection should contain
    pub fn expect<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut inner = self.lock();
        inner.expected = names.into_iter().map(Into::into).collect();
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Store `payload` under `name`
    ///
    /// Under [`DuplicatePolicy::Overwrite`] a second payload replaces the
    /// first; under [`DuplicatePolicy::Reject`] it is refused.
    pub fn record_payload(&self, name: &str, payload: StemPayload) -> Result<RecordOutcome> {
        let (outcome, count) = {
            let mut inner = self.lock();

            let exists = inner.payloads.contains_key(name);
            if exists && self.policy == DuplicatePolicy::Reject {
                warn!(stem = name, "Rejected duplicate stem payload");
                return Err(Error::DuplicateStem(name.to_string()));
            }
            if !inner.expected.is_empty() && !inner.expected.contains(name) {
                warn!(stem = name, "Payload recorded for a stem the project does not list");
            }

            let bytes = payload.len();
            inner.payloads.insert(name.to_string(), payload);
            inner.failures.remove(name);

            let outcome = if inner.abandoned {
                warn!(stem = name, "Stem payload arrived after the download gave up");
                RecordOutcome::Late
            } else if exists {
                warn!(stem = name, "Stem payload overwritten");
                RecordOutcome::Replaced
            } else {
                RecordOutcome::Inserted
            };

            debug!(stem = name, bytes, collected = inner.payloads.len(), "Stem payload recorded");
            (outcome, inner.payloads.len())
        };

        self.count_tx.send_replace(count);
        Ok(outcome)
    }

    /// Remember that a stem's fetch failed, for timeout diagnostics
    pub fn record_failure(&self, name: &str, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(stem = name, reason = %reason, "Stem fetch failed");
        self.lock().failures.insert(name.to_string(), reason);
    }

    /// Suspend until exactly `expected` payloads are held
    ///
    /// Fails with [`Error::CollectTimeout`] after `timeout`, with
    /// [`Error::Cancelled`] if `cancel` fires first, and with
    /// [`Error::CountMismatch`] if more payloads than expected are held.
    /// On success returns a snapshot of the store.
    pub async fn await_all_collected(
        &self,
        expected: usize,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<BTreeMap<String, StemPayload>> {
        self.lock().abandoned = false;

        let mut rx = self.count_tx.subscribe();
        let reached = async move {
            rx.wait_for(|count| *count >= expected)
                .await
                .map(|count| *count)
        };

        let waited = tokio::select! {
            _ = cancel.cancelled() => Err(Error::Cancelled),
            result = tokio::time::timeout(timeout, reached) => match result {
                Ok(Ok(_)) => Ok(()),
                Ok(Err(_)) => Err(Error::InvalidState("collector signal closed".to_string())),
                Err(_) => Err(self.timeout_error(expected, timeout)),
            },
        };

        if let Err(e) = waited {
            self.lock().abandoned = true;
            warn!(error = %e, "Stopped waiting for stem payloads");
            return Err(e);
        }

        let inner = self.lock();
        let collected = inner.payloads.len();
        if collected != expected {
            return Err(Error::CountMismatch { expected, collected });
        }
        info!(collected, "All stem payloads collected");
        Ok(inner.payloads.clone())
    }

    fn timeout_error(&self, expected: usize, waited: Duration) -> Error {
        let inner = self.lock();
        let missing: Vec<String> = inner
            .expected
            .iter()
            .filter(|name| !inner.payloads.contains_key(*name))
            .cloned()
            .collect();
        for name in &missing {
            if let Some(reason) = inner.failures.get(name) {
                warn!(stem = %name, reason = %reason, "Missing stem had a failed fetch");
            }
        }
        Error::CollectTimeout {
            expected,
            collected: inner.payloads.len(),
            missing,
            waited,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().payloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().payloads.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().payloads.contains_key(name)
    }

    /// Expected names with no payload yet, ascending
    pub fn missing(&self) -> Vec<String> {
        let inner = self.lock();
        inner
            .expected
            .iter()
            .filter(|name| !inner.payloads.contains_key(*name))
            .cloned()
            .collect()
    }

    /// Stems whose last fetch failed, with the reason
    pub fn failures(&self) -> BTreeMap<String, String> {
        self.lock().failures.clone()
    }

    pub fn snapshot(&self) -> BTreeMap<String, StemPayload> {
        self.lock().payloads.clone()
    }

    /// Drop all payloads and failures; expected names are kept
    pub fn clear(&self) {
        {
            let mut inner = self.lock();
            inner.payloads.clear();
            inner.failures.clear();
            inner.abandoned = false;
        }
        self.count_tx.send_replace(0);
    }
}
