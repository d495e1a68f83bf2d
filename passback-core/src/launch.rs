//! Launch context types
//!
//! A [`LaunchContext`] is produced once per tool launch by the platform's
//! LTI handshake (an external collaborator) and is immutable afterwards.
//! [`AggregateKey`] is the composite identity used to key both score
//! aggregation and line-item caching.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel used when the platform omits a course or activity identifier.
pub const DEFAULT_SCOPE: &str = "default";

fn default_scope() -> String {
    DEFAULT_SCOPE.to_string()
}

/// Grading context established by one validated platform launch
///
/// Created by the launch handshake, stored in the [`SessionStore`] keyed
/// by `session_key`, and evicted after its TTL elapses. Never mutated.
///
/// [`SessionStore`]: crate::session::SessionStore
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchContext {
    /// Opaque session token, unique per launch
    pub session_key: String,
    /// Stable identifier for the launched user
    pub learner_id: String,
    /// Identifier of the host platform
    pub platform_issuer: String,
    /// Enclosing course; `"default"` when the platform omits it
    #[serde(default = "default_scope")]
    pub course_id: String,
    /// Enclosing resource/activity; `"default"` when the platform omits it
    #[serde(default = "default_scope")]
    pub activity_id: String,
    /// Line-item id supplied directly at launch time (score fast path)
    #[serde(default)]
    pub line_item_hint: Option<String>,
    /// When the launch happened; basis for session expiry
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl LaunchContext {
    /// Create a context with default course/activity scope and no hint
    pub fn new(
        session_key: impl Into<String>,
        learner_id: impl Into<String>,
        platform_issuer: impl Into<String>,
    ) -> Self {
        Self {
            session_key: session_key.into(),
            learner_id: learner_id.into(),
            platform_issuer: platform_issuer.into(),
            course_id: default_scope(),
            activity_id: default_scope(),
            line_item_hint: None,
            created_at: Utc::now(),
        }
    }

    /// Set the course identifier
    pub fn with_course(mut self, course_id: impl Into<String>) -> Self {
        self.course_id = course_id.into();
        self
    }

    /// Set the activity identifier
    pub fn with_activity(mut self, activity_id: impl Into<String>) -> Self {
        self.activity_id = activity_id.into();
        self
    }

    /// Set the launch-time line-item hint
    pub fn with_hint(mut self, line_item_id: impl Into<String>) -> Self {
        self.line_item_hint = Some(line_item_id.into());
        self
    }

    /// The aggregate identity this launch grades into
    pub fn aggregate_key(&self) -> AggregateKey {
        AggregateKey::from_context(self)
    }
}

/// Composite identity for one learner's progress on one activity
///
/// Map key for the aggregate store and the line-item cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateKey {
    pub platform_issuer: String,
    pub course_id: String,
    pub activity_id: String,
    pub learner_id: String,
}

impl AggregateKey {
    pub fn from_context(ctx: &LaunchContext) -> Self {
        Self {
            platform_issuer: ctx.platform_issuer.clone(),
            course_id: ctx.course_id.clone(),
            activity_id: ctx.activity_id.clone(),
            learner_id: ctx.learner_id.clone(),
        }
    }
}

impl fmt::Display for AggregateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.platform_issuer, self.course_id, self.activity_id, self.learner_id
        )
    }
}
