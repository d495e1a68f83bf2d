//! Request orchestrator
//!
//! Runs one reconciliation cycle per inbound update: resolve the
//! session, fold the event into the aggregate, resolve line items, and
//! submit — exactly once, with no internal retries. The per-key entry
//! lock is held from aggregation through submission so events for the
//! same learner-activity pair reconcile in submission order.

use std::sync::Arc;

use crate::aggregate::{AggregateState, AggregateStore, UpdateEvent};
use crate::ags::AgsClient;
use crate::config::PassbackConfig;
use crate::error::UpdateError;
use crate::launch::{AggregateKey, LaunchContext};
use crate::lineitem::{LineItemResolver, LineItemRole};
use crate::session::SessionStore;
use crate::submit::{ResolvedLineItems, SubmissionPipeline, SubmissionResult};

/// Sequences session lookup, aggregation, resolution, and submission
///
/// Owns the shared stores explicitly (no module-level globals); callers
/// construct one per process and [`shutdown`](Self::shutdown) it to
/// clear state and cancel TTL timers.
pub struct Orchestrator {
    config: PassbackConfig,
    sessions: Arc<SessionStore>,
    aggregates: Arc<AggregateStore>,
    resolver: LineItemResolver,
    pipeline: SubmissionPipeline,
}

impl Orchestrator {
    pub fn new(config: PassbackConfig, client: Arc<dyn AgsClient>) -> Self {
        let sessions = Arc::new(SessionStore::new(config.session_ttl()));
        let aggregates = Arc::new(AggregateStore::new());
        Self::with_stores(config, client, sessions, aggregates)
    }

    /// Construct with externally owned stores (dependency injection)
    pub fn with_stores(
        config: PassbackConfig,
        client: Arc<dyn AgsClient>,
        sessions: Arc<SessionStore>,
        aggregates: Arc<AggregateStore>,
    ) -> Self {
        let resolver = LineItemResolver::new(client.clone(), config.clone());
        let pipeline = SubmissionPipeline::new(client, config.include_user_id);
        Self {
            config,
            sessions,
            aggregates,
            resolver,
            pipeline,
        }
    }

    pub fn config(&self) -> &PassbackConfig {
        &self.config
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Store a validated launch context (the launch collaborator's hook)
    pub async fn handle_launch(&self, ctx: LaunchContext) {
        tracing::info!(
            session = %ctx.session_key,
            learner = %ctx.learner_id,
            activity = %ctx.activity_id,
            "launch stored"
        );
        self.sessions.put(ctx).await;
    }

    /// Run one reconciliation cycle
    ///
    /// Aggregation never fails; only session lookup, line-item
    /// resolution, and the primary submission can. A submit failure does
    /// not roll back the aggregate: the next event for the same key
    /// resubmits the latest cumulative snapshot, re-syncing the host.
    pub async fn handle_update(
        &self,
        session_key: &str,
        event: UpdateEvent,
    ) -> Result<SubmissionResult, UpdateError> {
        let ctx = self.sessions.get(session_key).await?;
        let key = ctx.aggregate_key();

        // Per-key lock, held through submission (see module docs).
        let entry = self.aggregates.entry(&key);
        let mut state = entry.lock().await;
        state.apply(&event, self.config.score_maximum, self.config.score_policy);
        let snapshot = *state;
        tracing::debug!(
            key = %key,
            score = snapshot.cumulative_score,
            attempts = snapshot.cumulative_attempts,
            is_exit = event.is_exit,
            "event aggregated"
        );

        let score_item = self
            .resolver
            .resolve(&key, &ctx, LineItemRole::Score)
            .await?;

        // The attempts column is best-effort end to end: a resolution
        // failure degrades to a partial note rather than failing the
        // contractual score submission.
        let mut partial_note = None;
        let attempts_item = if self.config.report_attempts {
            match self.resolver.resolve(&key, &ctx, LineItemRole::Attempts).await {
                Ok(item) => Some(item),
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "attempts line item unavailable");
                    partial_note = Some(format!("attempts line item unavailable: {e}"));
                    None
                }
            }
        } else {
            None
        };

        let items = ResolvedLineItems {
            score: Some(score_item),
            attempts: attempts_item,
        };
        let mut result = self.pipeline.submit(&ctx, &items, snapshot).await?;
        if result.error.is_none() {
            result.error = partial_note;
        }
        Ok(result)
    }

    /// Current totals for every known key (admin surface)
    pub async fn snapshots(&self) -> Vec<(AggregateKey, AggregateState)> {
        self.aggregates.snapshot_all().await
    }

    /// Destroy one key's aggregate state (admin surface)
    pub fn reset(&self, key: &AggregateKey) -> bool {
        let removed = self.aggregates.reset(key);
        if removed {
            tracing::info!(key = %key, "aggregate state reset");
        }
        removed
    }

    /// Clear all sessions and cancel pending TTL timers
    pub async fn shutdown(&self) {
        self.sessions.shutdown().await;
    }
}
