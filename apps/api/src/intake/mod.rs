//! Task intake: multipart submission -> task row, stored files, queued notification.

pub mod form;
pub mod handlers;
pub mod ocr;
pub mod service;
