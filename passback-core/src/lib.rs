//! passback-core: LTI Advantage grade passback reconciliation
//!
//! This crate is the core that sits between an embedded interactive
//! exercise and a host platform's gradebook (AGS):
//!
//! - **Session storage** - [`SessionStore`] keeps validated launch
//!   contexts with TTL expiry
//! - **Line-item resolution** - [`LineItemResolver`] finds-or-creates
//!   the gradebook columns an activity writes to, exactly once
//! - **Aggregation** - [`AggregateStore`] folds repeated score events
//!   into one cumulative grade per learner-activity pair
//! - **Submission** - [`SubmissionPipeline`] posts score snapshots,
//!   score column first, attempts column best-effort
//! - **Orchestration** - [`Orchestrator`] sequences one reconciliation
//!   cycle per inbound update
//!
//! The OIDC handshake, JWT signing, and HTTP transport to the platform
//! stay outside: implement [`AgsClient`] over your LTI provider library
//! and hand validated launches to [`Orchestrator::handle_launch`].
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use passback_core::{
//!     LaunchContext, MockAgsClient, Orchestrator, PassbackConfig, UpdateEvent,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(MockAgsClient::new());
//! let orchestrator = Orchestrator::new(PassbackConfig::default(), client);
//!
//! // Delivered by the launch handshake:
//! orchestrator
//!     .handle_launch(LaunchContext::new("sess-1", "learner-1", "https://lms"))
//!     .await;
//!
//! // One update request from the exercise:
//! let result = orchestrator
//!     .handle_update(
//!         "sess-1",
//!         UpdateEvent { score_delta: 3.0, attempts_delta: 1.0, is_exit: false },
//!     )
//!     .await?;
//! assert!(result.ok);
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod ags;
pub mod config;
pub mod error;
pub mod launch;
pub mod lineitem;
pub mod orchestrator;
pub mod session;
pub mod submit;

// Re-export key types for convenience
pub use aggregate::{AggregateState, AggregateStore, UpdateEvent};
pub use ags::{
    ActivityProgress, AgsClient, GradingProgress, LineItemDescriptor, MockAgsClient, NewLineItem,
    ScorePayload, SubmissionAck,
};
pub use config::{PassbackConfig, ScorePolicy};
pub use error::{AgsError, ResolveError, SessionError, SubmitError, UpdateError};
pub use launch::{AggregateKey, LaunchContext, DEFAULT_SCOPE};
pub use lineitem::{LineItemRef, LineItemResolver, LineItemRole};
pub use orchestrator::Orchestrator;
pub use session::SessionStore;
pub use submit::{ResolvedLineItems, SubmissionPipeline, SubmissionResult};
