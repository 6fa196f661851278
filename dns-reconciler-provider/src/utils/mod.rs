//! Utility modules.

/// Log-safe rendering of record values.
pub mod log_sanitizer;
