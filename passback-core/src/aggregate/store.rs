//! Score aggregator
//!
//! One [`AggregateState`] per [`AggregateKey`], each behind its own
//! async mutex so same-key events serialize while distinct keys run
//! fully in parallel. The outer map lock is synchronous and held only
//! long enough to fetch or insert an entry Arc, never across an await.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::ScorePolicy;
use crate::launch::AggregateKey;

/// One raw event from the embedded exercise
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UpdateEvent {
    pub score_delta: f64,
    pub attempts_delta: f64,
    /// Session-teardown signal; never mutates aggregate state
    pub is_exit: bool,
}

impl UpdateEvent {
    pub fn exit() -> Self {
        Self {
            is_exit: true,
            ..Self::default()
        }
    }
}

/// Running totals for one learner-activity pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateState {
    pub cumulative_score: f64,
    pub cumulative_attempts: u64,
}

impl AggregateState {
    /// Fold one event into the totals
    ///
    /// Exit events are a snapshot-only signal and leave state untouched.
    /// Negative deltas are treated as zero; the score is clamped to
    /// `score_maximum` on every update, so it never decreases and never
    /// exceeds the ceiling.
    pub fn apply(&mut self, event: &UpdateEvent, score_maximum: f64, policy: ScorePolicy) {
        if event.is_exit {
            return;
        }

        let delta = event.score_delta.max(0.0);
        self.cumulative_score = match policy {
            ScorePolicy::CumulativeAdd => (self.cumulative_score + delta).min(score_maximum),
            ScorePolicy::ReplaceLatest => delta.min(score_maximum),
        };
        self.cumulative_attempts += event.attempts_delta.max(0.0) as u64;
    }

    /// Whether the score has reached its ceiling
    pub fn is_complete(&self, score_maximum: f64) -> bool {
        self.cumulative_score >= score_maximum
    }
}

/// Per-key aggregate map with key-scoped locking
pub struct AggregateStore {
    entries: StdMutex<HashMap<AggregateKey, Arc<Mutex<AggregateState>>>>,
}

impl AggregateStore {
    pub fn new() -> Self {
        Self {
            entries: StdMutex::new(HashMap::new()),
        }
    }

    /// Fetch-or-create the entry for a key
    ///
    /// The returned Arc's mutex is the per-key lock; the orchestrator
    /// holds it across the whole aggregate-resolve-submit sequence so
    /// near-simultaneous events for one learner reconcile in submission
    /// order.
    pub fn entry(&self, key: &AggregateKey) -> Arc<Mutex<AggregateState>> {
        let mut entries = self.entries.lock().unwrap();
        entries.entry(key.clone()).or_default().clone()
    }

    /// Read one key's current totals without holding its lock afterwards
    pub async fn snapshot(&self, key: &AggregateKey) -> Option<AggregateState> {
        let entry = self.entries.lock().unwrap().get(key).cloned()?;
        let state = entry.lock().await;
        Some(*state)
    }

    /// Current totals for every known key (admin surface)
    pub async fn snapshot_all(&self) -> Vec<(AggregateKey, AggregateState)> {
        let entries: Vec<_> = self
            .entries
            .lock()
            .unwrap()
            .iter()
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect();

        let mut snapshots = Vec::with_capacity(entries.len());
        for (key, entry) in entries {
            let state = *entry.lock().await;
            snapshots.push((key, state));
        }
        snapshots
    }

    /// Destroy one key's state (administrative reset)
    ///
    /// Returns whether the key existed. An in-flight request holding the
    /// old entry finishes on it; the next event starts fresh at zero.
    pub fn reset(&self, key: &AggregateKey) -> bool {
        self.entries.lock().unwrap().remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}

impl Default for AggregateStore {
    fn default() -> Self {
        Self::new()
    }
}
