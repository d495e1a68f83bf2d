//! Line-item roles and resolution

pub mod resolver;
pub mod role;

pub use resolver::LineItemResolver;
pub use role::{LineItemRef, LineItemRole};
