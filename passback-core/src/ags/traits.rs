//! AgsClient trait
//!
//! The seam between the reconciliation core and the LTI provider
//! library. Implementations own token acquisition and HTTP transport;
//! the core only decides what to resolve and submit.

use async_trait::async_trait;

use crate::error::AgsError;
use crate::launch::LaunchContext;

use super::types::{LineItemDescriptor, NewLineItem, ScorePayload, SubmissionAck};

/// Remote Assignment and Grades Services operations
///
/// All three calls are fallible remote calls; the core never retries
/// them internally.
#[async_trait]
pub trait AgsClient: Send + Sync {
    /// List the line items scoped to the launch's activity
    async fn query_line_items(
        &self,
        ctx: &LaunchContext,
    ) -> Result<Vec<LineItemDescriptor>, AgsError>;

    /// Create a new line item in the launch's gradebook
    async fn create_line_item(
        &self,
        ctx: &LaunchContext,
        item: NewLineItem,
    ) -> Result<LineItemDescriptor, AgsError>;

    /// Post one score snapshot to a line item
    ///
    /// The platform endpoint replaces the prior score for the learner;
    /// it never increments.
    async fn submit_score(
        &self,
        ctx: &LaunchContext,
        line_item_id: &str,
        payload: ScorePayload,
    ) -> Result<SubmissionAck, AgsError>;
}
