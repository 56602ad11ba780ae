//! Output encoders and sinks.

/// PNG bytes and data URLs.
pub mod png;
/// Artifact sinks.
pub mod sink;
/// Verification mark (QR symbol).
pub mod verification;
