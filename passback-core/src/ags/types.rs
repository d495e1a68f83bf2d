//! Wire types for the AGS collaborator

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One gradebook column as reported by the platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemDescriptor {
    /// Opaque platform-assigned identifier (usually a URL)
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    pub score_maximum: f64,
}

/// Request body for creating a gradebook column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLineItem {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    pub score_maximum: f64,
}

/// AGS `activityProgress` values the core reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityProgress {
    InProgress,
    Completed,
}

/// AGS `gradingProgress` values the core reports
///
/// Scores are always final snapshots here, so only `FullyGraded` is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GradingProgress {
    FullyGraded,
}

/// One score snapshot posted to a line item's scores endpoint
///
/// The AGS score endpoint replaces rather than increments, which is what
/// makes resubmitting the same snapshot safe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorePayload {
    pub score_given: f64,
    pub score_maximum: f64,
    pub activity_progress: ActivityProgress,
    pub grading_progress: GradingProgress,
    pub timestamp: DateTime<Utc>,
    pub comment: String,
    /// Omitted by default; AGS puts the user in the token context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Acknowledgement of one accepted score submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionAck {
    pub line_item_id: String,
}
