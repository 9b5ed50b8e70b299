//! Utility modules.

/// Log sanitization for record values and backend payloads.
pub mod log_sanitizer;

/// DNS name normalisation and validation shared by the model and providers.
pub mod names;
