//! Shared application state for the passback server

use std::sync::Arc;

use chrono::{DateTime, Utc};
use passback_core::{AgsClient, LaunchContext, Orchestrator, PassbackConfig};

/// Shared state accessible by all handlers
#[derive(Clone)]
pub struct AppState {
    /// The reconciliation core
    pub orchestrator: Arc<Orchestrator>,
    /// When the server started
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Create state around a freshly built orchestrator
    pub fn new(config: PassbackConfig, client: Arc<dyn AgsClient>) -> Self {
        Self::with_orchestrator(Arc::new(Orchestrator::new(config, client)))
    }

    /// Create state around an existing orchestrator (embedding, tests)
    pub fn with_orchestrator(orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            orchestrator,
            started_at: Utc::now(),
        }
    }

    /// Launch-collaborator hook: store one validated launch context
    ///
    /// Call this from the LTI provider library's launch callback when
    /// embedding the server instead of running the `/api/launch`
    /// endpoint.
    pub async fn handle_launch(&self, ctx: LaunchContext) {
        self.orchestrator.handle_launch(ctx).await;
    }

    /// Returns how long the server has been running
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}
