//! Error types for passback-core

use thiserror::Error;

use crate::lineitem::LineItemRole;

/// Top-level error for one reconciliation cycle
#[derive(Error, Debug)]
pub enum UpdateError {
    /// The request carried no session identifier at all
    #[error("missing session identifier")]
    MissingSession,

    #[error("session error: {0}")]
    Session(#[from] SessionError),

    #[error("line item error: {0}")]
    Resolve(#[from] ResolveError),

    #[error("submission error: {0}")]
    Submit(#[from] SubmitError),
}

/// Errors from the session store
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("session not found: {0}")]
    NotFound(String),

    #[error("session expired: {0}")]
    Expired(String),
}

/// Errors from line-item resolution
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The platform could not be queried and no hint was available
    #[error("no gradebook line item available for {role} role: {reason}")]
    LineItemUnavailable { role: LineItemRole, reason: String },
}

/// Errors from the submission pipeline
#[derive(Error, Debug)]
pub enum SubmitError {
    /// The resolver produced no score-role line item; no call was made
    #[error("no gradable line item for score submission")]
    NoGradableLineItem,

    /// The primary (score) submission failed
    #[error("score submission failed: {0}")]
    SubmissionFailure(#[from] AgsError),
}

/// Errors from the AGS collaborator (remote platform calls)
#[derive(Error, Debug)]
pub enum AgsError {
    #[error("platform request failed: {0}")]
    Transport(String),

    #[error("platform rejected the request: {0}")]
    Rejected(String),
}
