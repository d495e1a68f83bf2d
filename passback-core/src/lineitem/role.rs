//! Line-item roles
//!
//! The core writes to at most two gradebook columns per activity: one
//! carrying the cumulative score and one counting attempts. Both roles
//! live in one closed enum so the tag convention, default ceiling, and
//! hint eligibility stay in a single table instead of scattered
//! conditionals.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which gradebook column a line item plays for an activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineItemRole {
    Score,
    Attempts,
}

impl LineItemRole {
    /// The tag written onto line items created for this role
    pub fn tag(&self) -> &'static str {
        match self {
            LineItemRole::Score => "score",
            LineItemRole::Attempts => "attempts",
        }
    }

    /// Whether an existing line item's tag matches this role
    ///
    /// Untagged items count as score items; many platforms create the
    /// launch line item without a tag.
    pub fn matches(&self, tag: Option<&str>) -> bool {
        match self {
            LineItemRole::Score => matches!(tag, None | Some("score")),
            LineItemRole::Attempts => tag == Some("attempts"),
        }
    }

    /// Score ceiling used when creating a line item for this role
    pub fn default_maximum(&self) -> f64 {
        match self {
            LineItemRole::Score => 100.0,
            LineItemRole::Attempts => 1000.0,
        }
    }

    /// Whether a launch-time line-item hint may satisfy this role
    ///
    /// The platform's hint always points at the activity's own (score)
    /// column, so only the score role takes the fast path.
    pub fn hint_eligible(&self) -> bool {
        matches!(self, LineItemRole::Score)
    }

    /// Label for a line item created for this role
    pub fn label(&self, activity_id: &str) -> String {
        match self {
            LineItemRole::Score => activity_id.to_string(),
            LineItemRole::Attempts => format!("{activity_id} attempts"),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LineItemRole::Score => "score",
            LineItemRole::Attempts => "attempts",
        }
    }
}

impl fmt::Display for LineItemRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One resolved gradebook column for an (AggregateKey, role) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemRef {
    /// Platform-assigned line item id
    pub id: String,
    pub role: LineItemRole,
    /// Fixed ceiling for this role; payloads and clamping both use it
    pub score_maximum: f64,
}
