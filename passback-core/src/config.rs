//! Core configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How an incoming score delta combines with the stored total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorePolicy {
    /// Add the delta to the running total (normative behavior)
    CumulativeAdd,
    /// Take the event's score as the new total, trusting the exercise
    ReplaceLatest,
}

/// Configuration for the reconciliation core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassbackConfig {
    /// Session lifetime in seconds, measured from launch
    pub session_ttl_secs: u64,
    /// Ceiling for the score line item
    pub score_maximum: f64,
    /// Ceiling for the attempts line item
    pub attempts_maximum: f64,
    /// Cumulative-add or replace-with-latest scoring
    pub score_policy: ScorePolicy,
    /// Include the learner id inside score payloads
    ///
    /// AGS carries the user in the access-token context, so this is off
    /// by default; some platforms want it inline anyway.
    pub include_user_id: bool,
    /// Maintain and submit a second, attempts-counting line item
    pub report_attempts: bool,
}

impl Default for PassbackConfig {
    fn default() -> Self {
        Self {
            session_ttl_secs: 2 * 60 * 60,
            score_maximum: 100.0,
            attempts_maximum: 1000.0,
            score_policy: ScorePolicy::CumulativeAdd,
            include_user_id: false,
            report_attempts: true,
        }
    }
}

impl PassbackConfig {
    /// Session TTL as a [`Duration`]
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}
