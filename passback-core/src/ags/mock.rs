//! Mock AGS client for testing
//!
//! MockAgsClient stands in for the platform's gradebook: it holds the
//! line items the "platform" already has, records every call the core
//! makes, and can be scripted to fail specific operations. It doubles as
//! the in-memory platform stub used by `passback serve` in development
//! mode.

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::AgsError;
use crate::launch::LaunchContext;

use super::traits::AgsClient;
use super::types::{LineItemDescriptor, NewLineItem, ScorePayload, SubmissionAck};

#[derive(Default)]
struct MockState {
    line_items: Vec<LineItemDescriptor>,
    next_id: u64,
    query_calls: u64,
    create_calls: u64,
    submissions: Vec<(String, ScorePayload)>,
    fail_queries: bool,
    fail_creates: bool,
    fail_submissions_to: HashSet<String>,
}

/// Scriptable in-memory implementation of [`AgsClient`]
pub struct MockAgsClient {
    state: Mutex<MockState>,
    /// Injected latency per call, for concurrency timing tests
    latency: Option<Duration>,
}

impl MockAgsClient {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
            latency: None,
        }
    }

    /// Delay every call by `latency` before answering
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            state: Mutex::new(MockState::default()),
            latency: Some(latency),
        }
    }

    /// Seed a line item the platform already has
    pub fn add_line_item(&self, item: LineItemDescriptor) {
        self.state.lock().unwrap().line_items.push(item);
    }

    /// Make all query_line_items calls fail
    pub fn fail_queries(&self) {
        self.state.lock().unwrap().fail_queries = true;
    }

    /// Make all create_line_item calls fail
    pub fn fail_creates(&self) {
        self.state.lock().unwrap().fail_creates = true;
    }

    /// Undo [`fail_queries`](Self::fail_queries)
    pub fn recover_queries(&self) {
        self.state.lock().unwrap().fail_queries = false;
    }

    /// Undo [`fail_submissions_to`](Self::fail_submissions_to) for one id
    pub fn recover_submissions_to(&self, line_item_id: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_submissions_to
            .remove(line_item_id);
    }

    /// Make submissions to one line item fail
    pub fn fail_submissions_to(&self, line_item_id: impl Into<String>) {
        self.state
            .lock()
            .unwrap()
            .fail_submissions_to
            .insert(line_item_id.into());
    }

    pub fn query_calls(&self) -> u64 {
        self.state.lock().unwrap().query_calls
    }

    pub fn create_calls(&self) -> u64 {
        self.state.lock().unwrap().create_calls
    }

    /// Every (line_item_id, payload) submitted so far, in order
    pub fn submissions(&self) -> Vec<(String, ScorePayload)> {
        self.state.lock().unwrap().submissions.clone()
    }

    pub fn last_submission(&self) -> Option<(String, ScorePayload)> {
        self.state.lock().unwrap().submissions.last().cloned()
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

impl Default for MockAgsClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AgsClient for MockAgsClient {
    async fn query_line_items(
        &self,
        _ctx: &LaunchContext,
    ) -> Result<Vec<LineItemDescriptor>, AgsError> {
        self.simulate_latency().await;
        let mut state = self.state.lock().unwrap();
        state.query_calls += 1;
        if state.fail_queries {
            return Err(AgsError::Transport("query scripted to fail".into()));
        }
        Ok(state.line_items.clone())
    }

    async fn create_line_item(
        &self,
        _ctx: &LaunchContext,
        item: NewLineItem,
    ) -> Result<LineItemDescriptor, AgsError> {
        self.simulate_latency().await;
        let mut state = self.state.lock().unwrap();
        state.create_calls += 1;
        if state.fail_creates {
            return Err(AgsError::Rejected("create scripted to fail".into()));
        }
        state.next_id += 1;
        let created = LineItemDescriptor {
            id: format!("https://mock-lms/lineitems/{}", state.next_id),
            label: item.label,
            tag: item.tag,
            score_maximum: item.score_maximum,
        };
        state.line_items.push(created.clone());
        Ok(created)
    }

    async fn submit_score(
        &self,
        _ctx: &LaunchContext,
        line_item_id: &str,
        payload: ScorePayload,
    ) -> Result<SubmissionAck, AgsError> {
        self.simulate_latency().await;
        let mut state = self.state.lock().unwrap();
        if state.fail_submissions_to.contains(line_item_id) {
            return Err(AgsError::Rejected(format!(
                "submission to {line_item_id} scripted to fail"
            )));
        }
        state
            .submissions
            .push((line_item_id.to_string(), payload));
        Ok(SubmissionAck {
            line_item_id: line_item_id.to_string(),
        })
    }
}
