//! Batch delivery: one request per batch, per-recipient results reconciled into a report.

/// HTTP client for the batch endpoint.
pub mod client;
/// Reports and reconciliation.
pub mod report;
