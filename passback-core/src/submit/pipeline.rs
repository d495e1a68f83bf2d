//! Submission pipeline
//!
//! Turns an aggregate snapshot into AGS score payloads and posts them:
//! the score line item first (contractual), then the attempts line item
//! as a best-effort second call whose failure only annotates the result.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::aggregate::AggregateState;
use crate::ags::types::{ActivityProgress, GradingProgress, ScorePayload};
use crate::ags::AgsClient;
use crate::error::SubmitError;
use crate::launch::LaunchContext;
use crate::lineitem::LineItemRef;

/// Line items resolved for one reconciliation cycle
#[derive(Debug, Clone)]
pub struct ResolvedLineItems {
    /// The contractual score column; absent means nothing is gradable
    pub score: Option<LineItemRef>,
    /// Optional attempts column, submitted best-effort
    pub attempts: Option<LineItemRef>,
}

/// Outcome of one submission cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResult {
    pub ok: bool,
    pub cumulative_score: f64,
    pub cumulative_attempts: u64,
    pub line_item_ids: Vec<String>,
    /// Partial-failure note; present does not imply `!ok`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Formats and posts score payloads
pub struct SubmissionPipeline {
    client: Arc<dyn AgsClient>,
    include_user_id: bool,
}

impl SubmissionPipeline {
    pub fn new(client: Arc<dyn AgsClient>, include_user_id: bool) -> Self {
        Self {
            client,
            include_user_id,
        }
    }

    /// Submit one snapshot
    ///
    /// Fails fast with [`SubmitError::NoGradableLineItem`] when no score
    /// column was resolved; no network call is made in that case. A
    /// failed attempts submission is reported in `error` but the result
    /// stays `ok` because the primary grade landed.
    pub async fn submit(
        &self,
        ctx: &LaunchContext,
        items: &ResolvedLineItems,
        snapshot: AggregateState,
    ) -> Result<SubmissionResult, SubmitError> {
        let Some(score_item) = &items.score else {
            return Err(SubmitError::NoGradableLineItem);
        };

        let progress = if snapshot.is_complete(score_item.score_maximum) {
            ActivityProgress::Completed
        } else {
            ActivityProgress::InProgress
        };

        let payload = self.payload(ctx, snapshot.cumulative_score, score_item, progress, snapshot);
        self.client
            .submit_score(ctx, &score_item.id, payload)
            .await
            .map_err(SubmitError::SubmissionFailure)?;
        tracing::debug!(
            line_item = %score_item.id,
            score = snapshot.cumulative_score,
            "score submitted"
        );

        let mut line_item_ids = vec![score_item.id.clone()];
        let mut error = None;

        if let Some(attempts_item) = &items.attempts {
            let attempts_given =
                (snapshot.cumulative_attempts as f64).min(attempts_item.score_maximum);
            let payload = self.payload(ctx, attempts_given, attempts_item, progress, snapshot);
            match self.client.submit_score(ctx, &attempts_item.id, payload).await {
                Ok(_) => line_item_ids.push(attempts_item.id.clone()),
                Err(e) => {
                    tracing::warn!(
                        line_item = %attempts_item.id,
                        error = %e,
                        "attempts submission failed; score already landed"
                    );
                    error = Some(format!("attempts submission failed: {e}"));
                }
            }
        }

        Ok(SubmissionResult {
            ok: true,
            cumulative_score: snapshot.cumulative_score,
            cumulative_attempts: snapshot.cumulative_attempts,
            line_item_ids,
            error,
        })
    }

    fn payload(
        &self,
        ctx: &LaunchContext,
        score_given: f64,
        item: &LineItemRef,
        progress: ActivityProgress,
        snapshot: AggregateState,
    ) -> ScorePayload {
        ScorePayload {
            score_given,
            score_maximum: item.score_maximum,
            activity_progress: progress,
            grading_progress: GradingProgress::FullyGraded,
            timestamp: Utc::now(),
            comment: comment_for(snapshot),
            user_id: self.include_user_id.then(|| ctx.learner_id.clone()),
        }
    }
}

/// Human-readable summary attached to every payload
fn comment_for(snapshot: AggregateState) -> String {
    let accuracy = if snapshot.cumulative_attempts > 0 {
        (snapshot.cumulative_score / snapshot.cumulative_attempts as f64 * 100.0).min(100.0)
    } else {
        0.0
    };
    format!(
        "Score {:.1} over {} attempts ({:.0}% accuracy)",
        snapshot.cumulative_score, snapshot.cumulative_attempts, accuracy
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ags::MockAgsClient;
    use crate::lineitem::LineItemRole;

    fn ctx() -> LaunchContext {
        LaunchContext::new("sess-1", "learner-1", "iss").with_activity("quiz-3")
    }

    fn score_ref(id: &str) -> LineItemRef {
        LineItemRef {
            id: id.into(),
            role: LineItemRole::Score,
            score_maximum: 100.0,
        }
    }

    fn attempts_ref(id: &str) -> LineItemRef {
        LineItemRef {
            id: id.into(),
            role: LineItemRole::Attempts,
            score_maximum: 1000.0,
        }
    }

    fn snapshot(score: f64, attempts: u64) -> AggregateState {
        AggregateState {
            cumulative_score: score,
            cumulative_attempts: attempts,
        }
    }

    #[tokio::test]
    async fn submits_score_then_attempts() {
        let client = Arc::new(MockAgsClient::new());
        let pipeline = SubmissionPipeline::new(client.clone(), false);
        let items = ResolvedLineItems {
            score: Some(score_ref("li-score")),
            attempts: Some(attempts_ref("li-attempts")),
        };

        let result = pipeline.submit(&ctx(), &items, snapshot(7.0, 2)).await.unwrap();

        assert!(result.ok);
        assert!(result.error.is_none());
        assert_eq!(result.line_item_ids, vec!["li-score", "li-attempts"]);

        let submissions = client.submissions();
        assert_eq!(submissions.len(), 2);
        assert_eq!(submissions[0].0, "li-score");
        assert_eq!(submissions[0].1.score_given, 7.0);
        assert_eq!(submissions[1].0, "li-attempts");
        assert_eq!(submissions[1].1.score_given, 2.0);
    }

    #[tokio::test]
    async fn completed_progress_at_maximum() {
        let client = Arc::new(MockAgsClient::new());
        let pipeline = SubmissionPipeline::new(client.clone(), false);
        let items = ResolvedLineItems {
            score: Some(score_ref("li-score")),
            attempts: None,
        };

        pipeline.submit(&ctx(), &items, snapshot(100.0, 5)).await.unwrap();

        let (_, payload) = client.last_submission().unwrap();
        assert_eq!(payload.activity_progress, ActivityProgress::Completed);
        assert_eq!(payload.grading_progress, GradingProgress::FullyGraded);
    }

    #[tokio::test]
    async fn in_progress_below_maximum() {
        let client = Arc::new(MockAgsClient::new());
        let pipeline = SubmissionPipeline::new(client.clone(), false);
        let items = ResolvedLineItems {
            score: Some(score_ref("li-score")),
            attempts: None,
        };

        pipeline.submit(&ctx(), &items, snapshot(7.0, 2)).await.unwrap();

        let (_, payload) = client.last_submission().unwrap();
        assert_eq!(payload.activity_progress, ActivityProgress::InProgress);
    }

    #[tokio::test]
    async fn attempts_failure_keeps_result_ok_with_note() {
        // Scenario E: secondary fails, primary landed
        let client = Arc::new(MockAgsClient::new());
        client.fail_submissions_to("li-attempts");
        let pipeline = SubmissionPipeline::new(client.clone(), false);
        let items = ResolvedLineItems {
            score: Some(score_ref("li-score")),
            attempts: Some(attempts_ref("li-attempts")),
        };

        let result = pipeline.submit(&ctx(), &items, snapshot(7.0, 2)).await.unwrap();

        assert!(result.ok);
        assert_eq!(result.line_item_ids, vec!["li-score"]);
        assert!(result.error.as_deref().unwrap().contains("attempts"));
    }

    #[tokio::test]
    async fn score_failure_fails_the_cycle() {
        let client = Arc::new(MockAgsClient::new());
        client.fail_submissions_to("li-score");
        let pipeline = SubmissionPipeline::new(client.clone(), false);
        let items = ResolvedLineItems {
            score: Some(score_ref("li-score")),
            attempts: Some(attempts_ref("li-attempts")),
        };

        let result = pipeline.submit(&ctx(), &items, snapshot(7.0, 2)).await;

        assert!(matches!(result, Err(SubmitError::SubmissionFailure(_))));
        // Attempts must not be submitted after a primary failure.
        assert!(client.submissions().is_empty());
    }

    #[tokio::test]
    async fn no_score_line_item_fails_fast_without_network() {
        let client = Arc::new(MockAgsClient::new());
        let pipeline = SubmissionPipeline::new(client.clone(), false);
        let items = ResolvedLineItems {
            score: None,
            attempts: Some(attempts_ref("li-attempts")),
        };

        let result = pipeline.submit(&ctx(), &items, snapshot(7.0, 2)).await;

        assert!(matches!(result, Err(SubmitError::NoGradableLineItem)));
        assert!(client.submissions().is_empty());
    }

    #[tokio::test]
    async fn user_id_included_only_when_configured() {
        let client = Arc::new(MockAgsClient::new());
        let pipeline = SubmissionPipeline::new(client.clone(), true);
        let items = ResolvedLineItems {
            score: Some(score_ref("li-score")),
            attempts: None,
        };

        pipeline.submit(&ctx(), &items, snapshot(1.0, 1)).await.unwrap();

        let (_, payload) = client.last_submission().unwrap();
        assert_eq!(payload.user_id.as_deref(), Some("learner-1"));
    }

    #[test]
    fn comment_summarizes_score_attempts_accuracy() {
        let comment = comment_for(snapshot(7.0, 2));
        assert!(comment.contains("7.0"));
        assert!(comment.contains("2 attempts"));
        assert!(comment.contains("100% accuracy"));

        let comment = comment_for(snapshot(1.0, 4));
        assert!(comment.contains("25% accuracy"));

        // No attempts yet: accuracy reads zero rather than dividing by zero.
        let comment = comment_for(snapshot(0.0, 0));
        assert!(comment.contains("0% accuracy"));
    }

    #[tokio::test]
    async fn resubmitting_the_same_snapshot_is_stable() {
        let client = Arc::new(MockAgsClient::new());
        let pipeline = SubmissionPipeline::new(client.clone(), false);
        let items = ResolvedLineItems {
            score: Some(score_ref("li-score")),
            attempts: None,
        };

        pipeline.submit(&ctx(), &items, snapshot(7.0, 2)).await.unwrap();
        pipeline.submit(&ctx(), &items, snapshot(7.0, 2)).await.unwrap();

        // Two identical replace-style posts; the host keeps the same grade.
        let submissions = client.submissions();
        assert_eq!(submissions.len(), 2);
        assert_eq!(submissions[0].1.score_given, submissions[1].1.score_given);
    }
}
