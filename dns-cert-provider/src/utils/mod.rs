//! Utility modules.

/// Log sanitization helpers, keeping credentials and large bodies out of logs.
pub mod log_sanitizer;
