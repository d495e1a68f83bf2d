//! Session store
//!
//! Holds validated launch contexts keyed by session token. Expiry is
//! belt-and-braces: every read checks the TTL, and each stored session
//! also gets a cancellable sweep task that evicts it when the TTL
//! elapses. Storing a session again for the same key cancels the prior
//! task before starting a new one.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::error::SessionError;
use crate::launch::LaunchContext;

struct StoredSession {
    ctx: LaunchContext,
    sweep: CancellationToken,
}

/// TTL'd store of launch contexts
pub struct SessionStore {
    ttl: Duration,
    inner: Arc<RwLock<HashMap<String, StoredSession>>>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Store a launch context, (re)starting its TTL
    ///
    /// Overwriting an existing key cancels the previous sweep task.
    /// Reads never extend the TTL; it runs from `ctx.created_at`.
    pub async fn put(&self, ctx: LaunchContext) {
        let key = ctx.session_key.clone();
        let sweep = CancellationToken::new();
        let deadline = self.remaining(ctx.created_at);

        {
            let mut sessions = self.inner.write().await;
            if let Some(prev) = sessions.insert(
                key.clone(),
                StoredSession {
                    ctx,
                    sweep: sweep.clone(),
                },
            ) {
                prev.sweep.cancel();
                tracing::debug!(session = %key, "session overwritten; prior sweep canceled");
            }
        }

        let inner = Arc::clone(&self.inner);
        let ttl = self.ttl;
        tokio::spawn(async move {
            tokio::select! {
                _ = sweep.cancelled() => {}
                _ = tokio::time::sleep(deadline) => {
                    let mut sessions = inner.write().await;
                    // Re-check under the lock: an overwrite may have raced
                    // the timer and installed a fresh context.
                    let expired = sessions
                        .get(&key)
                        .is_some_and(|s| is_expired(s.ctx.created_at, ttl));
                    if expired {
                        sessions.remove(&key);
                        tracing::debug!(session = %key, "session expired");
                    }
                }
            }
        });
    }

    /// Look up a launch context by session token
    ///
    /// A session past its TTL is never returned, even if the sweep task
    /// has not run yet.
    pub async fn get(&self, key: &str) -> Result<LaunchContext, SessionError> {
        let sessions = self.inner.read().await;
        match sessions.get(key) {
            None => Err(SessionError::NotFound(key.to_string())),
            Some(stored) if is_expired(stored.ctx.created_at, self.ttl) => {
                Err(SessionError::Expired(key.to_string()))
            }
            Some(stored) => Ok(stored.ctx.clone()),
        }
    }

    /// Explicitly evict one session
    pub async fn invalidate(&self, key: &str) -> bool {
        let removed = self.inner.write().await.remove(key);
        if let Some(stored) = removed {
            stored.sweep.cancel();
            true
        } else {
            false
        }
    }

    /// Number of stored, unexpired sessions
    pub async fn count(&self) -> usize {
        let sessions = self.inner.read().await;
        sessions
            .values()
            .filter(|s| !is_expired(s.ctx.created_at, self.ttl))
            .count()
    }

    /// Clear all sessions and cancel every pending sweep task
    pub async fn shutdown(&self) {
        let mut sessions = self.inner.write().await;
        for (_, stored) in sessions.drain() {
            stored.sweep.cancel();
        }
    }

    fn remaining(&self, created_at: DateTime<Utc>) -> Duration {
        let age = Utc::now()
            .signed_duration_since(created_at)
            .to_std()
            .unwrap_or_default();
        self.ttl.saturating_sub(age)
    }
}

fn is_expired(created_at: DateTime<Utc>, ttl: Duration) -> bool {
    Utc::now()
        .signed_duration_since(created_at)
        .to_std()
        .is_ok_and(|age| age >= ttl)
}
