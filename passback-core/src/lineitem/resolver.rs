//! Line item resolver
//!
//! Finds-or-creates the gradebook column for an (AggregateKey, role)
//! pair, exactly once per process lifetime. The cache entry is a
//! `OnceCell` so concurrent resolution for the same pair collapses to a
//! single find-or-create attempt; failures leave the cell empty so the
//! next request re-attempts resolution.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};

use crate::ags::types::NewLineItem;
use crate::ags::AgsClient;
use crate::config::PassbackConfig;
use crate::error::ResolveError;
use crate::launch::{AggregateKey, LaunchContext};

use super::role::{LineItemRef, LineItemRole};

type CacheKey = (AggregateKey, LineItemRole);

/// Idempotent find-or-create of gradebook columns
pub struct LineItemResolver {
    client: Arc<dyn AgsClient>,
    config: PassbackConfig,
    cache: Mutex<HashMap<CacheKey, Arc<OnceCell<LineItemRef>>>>,
}

impl LineItemResolver {
    pub fn new(client: Arc<dyn AgsClient>, config: PassbackConfig) -> Self {
        Self {
            client,
            config,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// The configured ceiling for a role
    pub fn maximum_for(&self, role: LineItemRole) -> f64 {
        match role {
            LineItemRole::Score => self.config.score_maximum,
            LineItemRole::Attempts => self.config.attempts_maximum,
        }
    }

    /// Resolve the line item for this key and role
    ///
    /// Repeated and concurrent calls for the same (key, role) return the
    /// same id and never create a second line item.
    pub async fn resolve(
        &self,
        key: &AggregateKey,
        ctx: &LaunchContext,
        role: LineItemRole,
    ) -> Result<LineItemRef, ResolveError> {
        let cell = {
            let mut cache = self.cache.lock().await;
            cache
                .entry((key.clone(), role))
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        cell.get_or_try_init(|| self.resolve_uncached(ctx, role))
            .await
            .cloned()
    }

    async fn resolve_uncached(
        &self,
        ctx: &LaunchContext,
        role: LineItemRole,
    ) -> Result<LineItemRef, ResolveError> {
        let score_maximum = self.maximum_for(role);

        // Fast path: the platform handed us the line item at launch.
        if role.hint_eligible() {
            if let Some(hint) = &ctx.line_item_hint {
                tracing::debug!(role = %role, id = %hint, "using launch line-item hint");
                return Ok(LineItemRef {
                    id: hint.clone(),
                    role,
                    score_maximum,
                });
            }
        }

        let items = self
            .client
            .query_line_items(ctx)
            .await
            .map_err(|e| ResolveError::LineItemUnavailable {
                role,
                reason: e.to_string(),
            })?;

        if let Some(item) = items.iter().find(|item| role.matches(item.tag.as_deref())) {
            tracing::debug!(role = %role, id = %item.id, "reusing existing line item");
            return Ok(LineItemRef {
                id: item.id.clone(),
                role,
                score_maximum,
            });
        }

        let created = self
            .client
            .create_line_item(
                ctx,
                NewLineItem {
                    label: role.label(&ctx.activity_id),
                    tag: Some(role.tag().to_string()),
                    score_maximum,
                },
            )
            .await
            .map_err(|e| ResolveError::LineItemUnavailable {
                role,
                reason: e.to_string(),
            })?;

        tracing::info!(role = %role, id = %created.id, activity = %ctx.activity_id, "created line item");
        Ok(LineItemRef {
            id: created.id,
            role,
            score_maximum,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ags::types::LineItemDescriptor;
    use crate::ags::MockAgsClient;

    fn resolver_with(client: Arc<MockAgsClient>) -> LineItemResolver {
        LineItemResolver::new(client, PassbackConfig::default())
    }

    fn ctx() -> LaunchContext {
        LaunchContext::new("sess-1", "learner-1", "iss").with_activity("quiz-3")
    }

    #[tokio::test]
    async fn hint_fast_path_makes_no_network_call() {
        let client = Arc::new(MockAgsClient::new());
        let resolver = resolver_with(client.clone());
        let ctx = ctx().with_hint("https://lms/lineitems/42");
        let key = ctx.aggregate_key();

        let item = resolver
            .resolve(&key, &ctx, LineItemRole::Score)
            .await
            .unwrap();

        assert_eq!(item.id, "https://lms/lineitems/42");
        assert_eq!(client.query_calls(), 0);
        assert_eq!(client.create_calls(), 0);
    }

    #[tokio::test]
    async fn attempts_role_ignores_hint() {
        let client = Arc::new(MockAgsClient::new());
        let resolver = resolver_with(client.clone());
        let ctx = ctx().with_hint("https://lms/lineitems/42");
        let key = ctx.aggregate_key();

        let item = resolver
            .resolve(&key, &ctx, LineItemRole::Attempts)
            .await
            .unwrap();

        assert_ne!(item.id, "https://lms/lineitems/42");
        assert_eq!(client.query_calls(), 1);
        assert_eq!(client.create_calls(), 1);
    }

    #[tokio::test]
    async fn empty_query_creates_exactly_one_item_then_caches() {
        let client = Arc::new(MockAgsClient::new());
        let resolver = resolver_with(client.clone());
        let ctx = ctx();
        let key = ctx.aggregate_key();

        let first = resolver
            .resolve(&key, &ctx, LineItemRole::Score)
            .await
            .unwrap();
        let second = resolver
            .resolve(&key, &ctx, LineItemRole::Score)
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(client.create_calls(), 1);
        assert_eq!(client.query_calls(), 1);
    }

    #[tokio::test]
    async fn reuses_existing_item_matched_by_tag() {
        let client = Arc::new(MockAgsClient::new());
        client.add_line_item(LineItemDescriptor {
            id: "li-existing".into(),
            label: "quiz-3".into(),
            tag: None,
            score_maximum: 100.0,
        });
        let resolver = resolver_with(client.clone());
        let ctx = ctx();
        let key = ctx.aggregate_key();

        let item = resolver
            .resolve(&key, &ctx, LineItemRole::Score)
            .await
            .unwrap();

        assert_eq!(item.id, "li-existing");
        assert_eq!(client.create_calls(), 0);
    }

    #[tokio::test]
    async fn concurrent_resolution_collapses_to_one_create() {
        let client = Arc::new(MockAgsClient::with_latency(
            std::time::Duration::from_millis(10),
        ));
        let resolver = Arc::new(resolver_with(client.clone()));
        let ctx = ctx();
        let key = ctx.aggregate_key();

        let mut handles = vec![];
        for _ in 0..10 {
            let resolver = Arc::clone(&resolver);
            let ctx = ctx.clone();
            let key = key.clone();
            handles.push(tokio::spawn(async move {
                resolver.resolve(&key, &ctx, LineItemRole::Score).await
            }));
        }

        let mut ids = vec![];
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap().id);
        }

        ids.dedup();
        assert_eq!(ids.len(), 1);
        assert_eq!(client.create_calls(), 1);
    }

    #[tokio::test]
    async fn query_failure_without_hint_is_unavailable() {
        let client = Arc::new(MockAgsClient::new());
        client.fail_queries();
        let resolver = resolver_with(client);
        let ctx = ctx();
        let key = ctx.aggregate_key();

        let result = resolver.resolve(&key, &ctx, LineItemRole::Score).await;
        assert!(matches!(
            result,
            Err(ResolveError::LineItemUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn failure_does_not_poison_the_cache() {
        let client = Arc::new(MockAgsClient::new());
        client.fail_queries();
        let resolver = resolver_with(client.clone());
        let ctx = ctx();
        let key = ctx.aggregate_key();

        assert!(resolver
            .resolve(&key, &ctx, LineItemRole::Score)
            .await
            .is_err());

        // Platform recovers; the retried resolve succeeds and creates once.
        client.recover_queries();
        let item = resolver
            .resolve(&key, &ctx, LineItemRole::Score)
            .await
            .unwrap();

        assert!(!item.id.is_empty());
        assert_eq!(client.query_calls(), 2);
        assert_eq!(client.create_calls(), 1);
    }

    #[tokio::test]
    async fn distinct_keys_resolve_independently() {
        let client = Arc::new(MockAgsClient::new());
        let resolver = resolver_with(client.clone());
        let ctx_a = ctx();
        let ctx_b = LaunchContext::new("sess-2", "learner-2", "iss").with_activity("quiz-3");

        let a = resolver
            .resolve(&ctx_a.aggregate_key(), &ctx_a, LineItemRole::Score)
            .await
            .unwrap();
        let b = resolver
            .resolve(&ctx_b.aggregate_key(), &ctx_b, LineItemRole::Score)
            .await
            .unwrap();

        // Second key's query sees the first key's created item and
        // reuses it; either way no duplicate create per key.
        assert_eq!(client.create_calls(), 1);
        assert_eq!(a.id, b.id);
    }
}
