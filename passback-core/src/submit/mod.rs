//! Score submission

pub mod pipeline;

pub use pipeline::{ResolvedLineItems, SubmissionPipeline, SubmissionResult};
