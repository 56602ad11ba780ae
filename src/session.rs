//! Stateful wrappers around compositor runs.

/// Many badges, one batch dispatch.
pub mod bulk;
/// One badge for preview, download or a single send.
pub mod single;
