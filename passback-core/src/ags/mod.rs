//! AGS collaborator interface
//!
//! The core never talks HTTP to the platform itself; everything passes
//! through the [`AgsClient`] trait so the transport (and its OAuth/JWT
//! machinery) stays an external collaborator.

pub mod mock;
pub mod traits;
pub mod types;

pub use mock::MockAgsClient;
pub use traits::AgsClient;
pub use types::{
    ActivityProgress, GradingProgress, LineItemDescriptor, NewLineItem, ScorePayload,
    SubmissionAck,
};
