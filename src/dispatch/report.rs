use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::foundation::error::{BadgeError, BadgeResult};

/// Reason recorded for a submitted id the endpoint said nothing about.
pub const NO_STATUS_REASON: &str = "no delivery status reported";

/// One recipient the endpoint could not deliver to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchFailure {
    /// Attendee id.
    pub id: String,
    /// Contact address, as reported or as known from the roster.
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    /// Human-readable reason, verbatim from the endpoint.
    #[serde(default, deserialize_with = "null_as_default")]
    pub error: String,
}

/// Endpoints send `null` for fields they have no value for; treat it like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Per-recipient result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Delivered.
    Delivered(String),
    /// Not delivered.
    Failed(DispatchFailure),
}

impl DispatchOutcome {
    /// Attendee id.
    pub fn id(&self) -> &str {
        match self {
            DispatchOutcome::Delivered(id) => id,
            DispatchOutcome::Failed(f) => &f.id,
        }
    }
}

/// Reconciled result of one transport-successful dispatch.
///
/// `success.len() + failed.len()` equals the number of ids submitted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Delivered ids, in submission order.
    pub success: Vec<String>,
    /// Failed recipients, in submission order.
    pub failed: Vec<DispatchFailure>,
}

impl BatchReport {
    /// Number of recipients covered by the report.
    pub fn total(&self) -> usize {
        self.success.len() + self.failed.len()
    }

    /// Whether at least one recipient failed.
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Whether some recipients were delivered and some were not.
    pub fn is_partial(&self) -> bool {
        !self.success.is_empty() && !self.failed.is_empty()
    }

    /// Every outcome: deliveries first, then failures.
    pub fn outcomes(&self) -> Vec<DispatchOutcome> {
        self.success
            .iter()
            .cloned()
            .map(DispatchOutcome::Delivered)
            .chain(self.failed.iter().cloned().map(DispatchOutcome::Failed))
            .collect()
    }

    /// Outcome for one attendee, if it was part of the batch.
    pub fn outcome(&self, id: &str) -> Option<DispatchOutcome> {
        if self.success.iter().any(|s| s == id) {
            return Some(DispatchOutcome::Delivered(id.to_owned()));
        }
        self.failed
            .iter()
            .find(|f| f.id == id)
            .cloned()
            .map(DispatchOutcome::Failed)
    }

    /// One-line operator summary.
    pub fn summary(&self) -> String {
        let total = self.total();
        match (self.success.len(), self.failed.len()) {
            (0, 0) => "no badges to send".to_owned(),
            (n, 0) => format!("sent {n} badge(s)"),
            (0, f) => format!("no badges delivered; {f} recipient(s) failed"),
            (n, f) => format!("sent {n} of {total} badge(s); {f} recipient(s) failed"),
        }
    }

    /// Fill blank failure addresses from `lookup`.
    pub(crate) fn fill_missing_emails<'a>(&mut self, lookup: impl Fn(&str) -> Option<&'a str>) {
        for f in &mut self.failed {
            if f.email.is_empty()
                && let Some(email) = lookup(&f.id)
            {
                f.email = email.to_owned();
            }
        }
    }
}

/// Operator summary for a whole dispatch attempt, keeping "nothing was sent" apart from
/// "some recipients failed".
pub fn describe_attempt(result: &BadgeResult<BatchReport>) -> String {
    match result {
        Ok(report) => report.summary(),
        Err(e @ BadgeError::Transport { .. }) => format!("nothing was sent: {e}"),
        Err(e) => format!("dispatch not attempted: {e}"),
    }
}

/// Delivery partition as returned by the endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub(crate) struct WirePartition {
    #[serde(default, deserialize_with = "null_as_default")]
    pub(crate) success: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub(crate) failed: Vec<DispatchFailure>,
}

/// Map the endpoint's partition back onto the submitted ids.
///
/// Submission order is kept. A submitted id listed as failed is a failure even if it is also
/// listed as delivered; one listed nowhere fails with [`NO_STATUS_REASON`]. Ids that were never
/// submitted are dropped.
pub(crate) fn reconcile(submitted: &[String], wire: WirePartition) -> BatchReport {
    let submitted_set: BTreeSet<&str> = submitted.iter().map(String::as_str).collect();

    for id in wire
        .success
        .iter()
        .map(String::as_str)
        .chain(wire.failed.iter().map(|f| f.id.as_str()))
    {
        if !submitted_set.contains(id) {
            warn!(id, "endpoint reported an id that was not submitted");
        }
    }

    let delivered: BTreeSet<&str> = wire.success.iter().map(String::as_str).collect();
    let mut failures: BTreeMap<&str, &DispatchFailure> = BTreeMap::new();
    for f in &wire.failed {
        failures.entry(f.id.as_str()).or_insert(f);
    }

    let mut report = BatchReport::default();
    let mut seen = BTreeSet::new();
    for id in submitted {
        if !seen.insert(id.as_str()) {
            continue;
        }
        if let Some(f) = failures.get(id.as_str()) {
            if delivered.contains(id.as_str()) {
                warn!(id = %id, "endpoint reported both delivery and failure");
            }
            report.failed.push((*f).clone());
        } else if delivered.contains(id.as_str()) {
            report.success.push(id.clone());
        } else {
            report.failed.push(DispatchFailure {
                id: id.clone(),
                email: String::new(),
                error: NO_STATUS_REASON.to_owned(),
            });
        }
    }
    report
}

#[cfg(test)]
#[path = "../../tests/unit/dispatch/report.rs"]
mod tests;
