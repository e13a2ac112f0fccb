//! Per-user task configuration: last-used lookup with default creation.

pub mod handlers;
pub mod resolver;
