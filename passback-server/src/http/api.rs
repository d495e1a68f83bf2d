//! REST API handlers

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use passback_core::{
    AggregateKey, LaunchContext, SessionError, SubmitError, UpdateError, UpdateEvent,
};

use crate::AppState;

/// Cookie carrying the session token, as an alternative to `?session=`
pub const SESSION_COOKIE: &str = "passback_session";

/// Error body shared by all endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

fn error_response(
    status: StatusCode,
    code: &str,
    error: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.to_string(),
        }),
    )
        .into_response()
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the server
    pub status: String,
    /// Server version
    pub version: String,
    /// Seconds since server started
    pub uptime_seconds: i64,
    /// Number of active launch sessions
    pub active_sessions: usize,
}

/// GET /api/health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let active_sessions = state.orchestrator.sessions().count().await;

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        active_sessions,
    })
}

/// Response for a stored launch
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchResponse {
    pub ok: bool,
    pub session_key: String,
}

/// POST /api/launch - store a validated launch context
///
/// Trusted, provider-facing: the LTI library has already verified the
/// launch JWT before this context exists.
pub async fn launch(
    State(state): State<Arc<AppState>>,
    Json(ctx): Json<LaunchContext>,
) -> Json<LaunchResponse> {
    let session_key = ctx.session_key.clone();
    state.handle_launch(ctx).await;
    Json(LaunchResponse {
        ok: true,
        session_key,
    })
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuery {
    /// Session token; may instead arrive in the session cookie
    pub session: Option<String>,
}

/// Body of one update request from the embedded exercise
#[derive(Debug, Default, Deserialize)]
pub struct UpdateRequest {
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub attempts: f64,
    #[serde(default, rename = "isExit")]
    pub is_exit: bool,
}

/// Success body for one update request
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResponse {
    pub ok: bool,
    pub score: f64,
    pub attempts: u64,
    pub line_item_ids: Vec<String>,
    /// Partial-failure note; present does not imply failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// POST /api/update - run one reconciliation cycle
pub async fn update(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UpdateQuery>,
    headers: HeaderMap,
    Json(body): Json<UpdateRequest>,
) -> impl IntoResponse {
    let Some(session_key) = session_key_from(&query, &headers) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "MISSING_SESSION",
            UpdateError::MissingSession.to_string(),
        );
    };

    let event = UpdateEvent {
        score_delta: body.score,
        attempts_delta: body.attempts,
        is_exit: body.is_exit,
    };

    // Run the cycle on its own task: a client disconnect drops this
    // handler future, but the reconcile must still run to completion so
    // the aggregate and the host gradebook stay consistent. At worst the
    // response is orphaned.
    let orchestrator = Arc::clone(&state.orchestrator);
    let outcome = tokio::spawn(async move {
        orchestrator.handle_update(&session_key, event).await
    })
    .await;

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(error = %e, "update task panicked");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                e.to_string(),
            );
        }
    };

    match result {
        Ok(result) => Json(UpdateResponse {
            ok: result.ok,
            score: result.cumulative_score,
            attempts: result.cumulative_attempts,
            line_item_ids: result.line_item_ids,
            error: result.error,
        })
        .into_response(),
        Err(e) => {
            let (status, code) = status_for(&e);
            error_response(status, code, e.to_string())
        }
    }
}

/// HTTP status and machine-readable code per error kind
fn status_for(error: &UpdateError) -> (StatusCode, &'static str) {
    match error {
        UpdateError::MissingSession => (StatusCode::BAD_REQUEST, "MISSING_SESSION"),
        UpdateError::Session(SessionError::NotFound(_)) => {
            (StatusCode::UNAUTHORIZED, "SESSION_NOT_FOUND")
        }
        UpdateError::Session(SessionError::Expired(_)) => {
            (StatusCode::UNAUTHORIZED, "SESSION_EXPIRED")
        }
        UpdateError::Resolve(_) => (StatusCode::BAD_GATEWAY, "LINE_ITEM_UNAVAILABLE"),
        UpdateError::Submit(SubmitError::NoGradableLineItem) => {
            (StatusCode::BAD_GATEWAY, "NO_GRADABLE_LINE_ITEM")
        }
        UpdateError::Submit(SubmitError::SubmissionFailure(_)) => {
            (StatusCode::BAD_GATEWAY, "SUBMISSION_FAILED")
        }
    }
}

fn session_key_from(query: &UpdateQuery, headers: &HeaderMap) -> Option<String> {
    if let Some(session) = &query.session {
        if !session.is_empty() {
            return Some(session.clone());
        }
    }
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE && !value.is_empty()).then(|| value.to_string())
    })
}

/// One aggregate snapshot in the admin listing
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateSummary {
    #[serde(flatten)]
    pub key: AggregateKey,
    pub score: f64,
    pub attempts: u64,
}

/// Response for the admin aggregate listing
#[derive(Debug, Serialize, Deserialize)]
pub struct AggregateListResponse {
    pub aggregates: Vec<AggregateSummary>,
}

/// GET /api/admin/aggregates - current snapshots (debug surface)
pub async fn list_aggregates(State(state): State<Arc<AppState>>) -> Json<AggregateListResponse> {
    let aggregates = state
        .orchestrator
        .snapshots()
        .await
        .into_iter()
        .map(|(key, snapshot)| AggregateSummary {
            key,
            score: snapshot.cumulative_score,
            attempts: snapshot.cumulative_attempts,
        })
        .collect();

    Json(AggregateListResponse { aggregates })
}

/// Response for an aggregate reset
#[derive(Debug, Serialize, Deserialize)]
pub struct ResetResponse {
    pub ok: bool,
}

/// POST /api/admin/aggregates/reset - destroy one key's state
pub async fn reset_aggregate(
    State(state): State<Arc<AppState>>,
    Json(key): Json<AggregateKey>,
) -> impl IntoResponse {
    if state.orchestrator.reset(&key) {
        Json(ResetResponse { ok: true }).into_response()
    } else {
        error_response(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("no aggregate state for {key}"),
        )
    }
}
