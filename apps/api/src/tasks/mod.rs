//! Task retrieval, update, deletion and status lifecycle.

pub mod handlers;
pub mod service;
