//! Cumulative score aggregation

pub mod store;

pub use store::{AggregateState, AggregateStore, UpdateEvent};
