use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tokio::sync::{Semaphore, watch};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::artifact::BadgeArtifact;
use crate::compose::BadgeCompositor;
use crate::dispatch::client::DispatchReporter;
use crate::dispatch::report::BatchReport;
use crate::encode::sink::{ArtifactSink, SinkConfig};
use crate::foundation::error::{BadgeError, BadgeResult};
use crate::model::{Attendee, Event, Issuer, validate_attendees};

/// Phase of a [`BulkSession`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BulkPhase {
    /// Some targeted attendees have no badge yet.
    Generating,
    /// Every targeted attendee has a badge; dispatch is allowed.
    Ready,
    /// A dispatch request is in flight.
    Dispatching,
    /// A dispatch report was received.
    Reported,
}

/// Generation counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BulkProgress {
    /// Targeted attendees.
    pub total: usize,
    /// Badges generated.
    pub generated: usize,
    /// Attendees whose last run failed.
    pub failed: usize,
}

impl BulkProgress {
    /// Whether every target has a badge.
    pub fn is_complete(&self) -> bool {
        self.generated == self.total
    }
}

/// Badges for many attendees of one event, generated independently and dispatched as one batch.
///
/// The accumulation map is insert-once: a badge recorded for an attendee is never replaced. The
/// session becomes [`BulkPhase::Ready`] exactly when the map covers every target; this transition
/// happens at most once. Delivered attendees are remembered, so a later dispatch only submits the
/// rest.
#[derive(Debug)]
pub struct BulkSession {
    event: Event,
    issuer: Issuer,
    targets: Vec<Attendee>,
    artifacts: BTreeMap<String, BadgeArtifact>,
    failures: BTreeMap<String, String>,
    delivered: BTreeSet<String>,
    last_report: Option<BatchReport>,
    phase: watch::Sender<BulkPhase>,
}

impl BulkSession {
    /// Session for `attendees`. Empty or duplicate ids are rejected.
    pub fn new(event: Event, issuer: Issuer, attendees: Vec<Attendee>) -> BadgeResult<Self> {
        validate_attendees(&attendees)?;
        let initial = if attendees.is_empty() {
            BulkPhase::Ready
        } else {
            BulkPhase::Generating
        };
        let (phase, _) = watch::channel(initial);
        Ok(Self {
            event,
            issuer,
            targets: attendees,
            artifacts: BTreeMap::new(),
            failures: BTreeMap::new(),
            delivered: BTreeSet::new(),
            last_report: None,
            phase,
        })
    }

    /// Event the batch belongs to.
    pub fn event(&self) -> &Event {
        &self.event
    }

    /// Targeted attendees, in roster order.
    pub fn targets(&self) -> &[Attendee] {
        &self.targets
    }

    /// Current phase.
    pub fn phase(&self) -> BulkPhase {
        *self.phase.borrow()
    }

    /// Receive every phase change.
    pub fn subscribe(&self) -> watch::Receiver<BulkPhase> {
        self.phase.subscribe()
    }

    fn set_phase(&self, next: BulkPhase) {
        let prev = self.phase.send_replace(next);
        if prev != next {
            debug!(from = ?prev, to = ?next, "bulk phase");
        }
    }

    /// Generation counters.
    pub fn progress(&self) -> BulkProgress {
        BulkProgress {
            total: self.targets.len(),
            generated: self.artifacts.len(),
            failed: self.failures.len(),
        }
    }

    /// Badge for `attendee_id`, if generated.
    pub fn artifact(&self, attendee_id: &str) -> Option<&BadgeArtifact> {
        self.artifacts.get(attendee_id)
    }

    /// Every generated badge keyed by attendee id.
    pub fn artifacts(&self) -> &BTreeMap<String, BadgeArtifact> {
        &self.artifacts
    }

    /// Attendees whose last run failed, with the reason.
    pub fn generation_failures(&self) -> &BTreeMap<String, String> {
        &self.failures
    }

    /// Attendees delivered by earlier dispatches.
    pub fn delivered(&self) -> &BTreeSet<String> {
        &self.delivered
    }

    /// Targets not yet delivered, in roster order.
    pub fn pending(&self) -> Vec<String> {
        self.targets
            .iter()
            .filter(|a| !self.delivered.contains(&a.id))
            .map(|a| a.id.clone())
            .collect()
    }

    /// Report of the latest successful dispatch.
    pub fn last_report(&self) -> Option<&BatchReport> {
        self.last_report.as_ref()
    }

    /// Store a completed badge.
    ///
    /// Returns `false` when the id is not targeted or already has a badge; the stored badge is
    /// kept in both cases.
    pub fn record(&mut self, attendee_id: &str, artifact: BadgeArtifact) -> bool {
        if !self.targets.iter().any(|a| a.id == attendee_id) {
            warn!(attendee = %attendee_id, "badge for an attendee outside this batch ignored");
            return false;
        }
        if self.artifacts.contains_key(attendee_id) {
            debug!(attendee = %attendee_id, "duplicate badge ignored");
            return false;
        }
        self.artifacts.insert(attendee_id.to_owned(), artifact);
        self.failures.remove(attendee_id);

        if self.artifacts.len() == self.targets.len() && self.phase() == BulkPhase::Generating {
            info!(count = self.artifacts.len(), "all badges generated");
            self.set_phase(BulkPhase::Ready);
        }
        true
    }

    /// Note a failed run for `attendee_id`. The session stays generating for that attendee.
    pub fn record_failure(&mut self, attendee_id: &str, reason: impl Into<String>) {
        if self.artifacts.contains_key(attendee_id) {
            return;
        }
        self.failures.insert(attendee_id.to_owned(), reason.into());
    }

    /// Compose a badge for every target that has none yet, at most `max_in_flight` at a time.
    ///
    /// Completions are recorded as they arrive, in any order. Failed runs are noted in
    /// [`Self::generation_failures`]; calling `generate` again retries only those. Dropping the
    /// returned future abandons the runs still in flight.
    pub async fn generate(
        &mut self,
        compositor: &BadgeCompositor,
        max_in_flight: usize,
    ) -> BadgeResult<BulkProgress> {
        if max_in_flight == 0 {
            return Err(BadgeError::validation("max_in_flight must be > 0"));
        }

        let todo: Vec<Attendee> = self
            .targets
            .iter()
            .filter(|a| !self.artifacts.contains_key(&a.id))
            .cloned()
            .collect();
        if todo.is_empty() {
            return Ok(self.progress());
        }
        info!(
            event = %self.event.id,
            count = todo.len(),
            max_in_flight,
            "generating badges"
        );

        let event = Arc::new(self.event.clone());
        let issuer = Arc::new(self.issuer.clone());
        let sem = Arc::new(Semaphore::new(max_in_flight));
        let mut runs = JoinSet::new();

        for attendee in &todo {
            let compositor = compositor.clone();
            let attendee = attendee.clone();
            let event = Arc::clone(&event);
            let issuer = Arc::clone(&issuer);
            let sem = Arc::clone(&sem);
            runs.spawn(async move {
                let result = match sem.acquire_owned().await {
                    Ok(_permit) => compositor.compose(&attendee, &event, &issuer).await,
                    Err(e) => Err(BadgeError::render(format!("run limiter closed: {e}"))),
                };
                (attendee.id, result)
            });
        }

        while let Some(joined) = runs.join_next().await {
            match joined {
                Ok((id, Ok(artifact))) => {
                    if !artifact.is_complete() {
                        debug!(attendee = %id, skipped = ?artifact.skipped(), "badge degraded");
                    }
                    self.record(&id, artifact);
                }
                Ok((id, Err(e))) => {
                    warn!(attendee = %id, error = %e, "badge run failed");
                    self.record_failure(&id, e.to_string());
                }
                Err(e) => warn!(error = %e, "badge task did not complete"),
            }
        }

        // Runs that panicked never reported their id.
        for attendee in &todo {
            if !self.artifacts.contains_key(&attendee.id)
                && !self.failures.contains_key(&attendee.id)
            {
                self.record_failure(&attendee.id, "badge task did not complete");
            }
        }

        Ok(self.progress())
    }

    /// Push every badge into `sink`, in roster order.
    pub fn export(&self, sink: &mut dyn ArtifactSink) -> BadgeResult<usize> {
        if self.phase() == BulkPhase::Generating {
            return Err(BadgeError::not_ready(format!(
                "{} of {} badges generated",
                self.artifacts.len(),
                self.targets.len()
            )));
        }
        sink.begin(SinkConfig {
            count: self.targets.len(),
        })?;
        for a in &self.targets {
            if let Some(artifact) = self.artifacts.get(&a.id) {
                sink.push(artifact)?;
            }
        }
        sink.end()?;
        Ok(self.targets.len())
    }

    /// Submit every not-yet-delivered badge as one batch.
    ///
    /// Rejected with [`BadgeError::NotReady`] while generating. A transport failure marks nothing
    /// and returns the session to its previous phase; a report (even one with failures) moves it
    /// to [`BulkPhase::Reported`] and remembers the delivered ids.
    pub async fn dispatch(&mut self, reporter: &DispatchReporter) -> BadgeResult<BatchReport> {
        let resume = match self.phase() {
            BulkPhase::Generating => {
                return Err(BadgeError::not_ready(format!(
                    "{} of {} badges generated",
                    self.artifacts.len(),
                    self.targets.len()
                )));
            }
            // An earlier dispatch future was dropped mid-flight.
            BulkPhase::Dispatching => BulkPhase::Ready,
            p => p,
        };

        let pending = self.pending();
        if pending.is_empty() {
            let report = BatchReport::default();
            self.last_report = Some(report.clone());
            self.set_phase(BulkPhase::Reported);
            return Ok(report);
        }

        self.set_phase(BulkPhase::Dispatching);
        match reporter
            .dispatch(&self.event.id, &pending, &self.artifacts)
            .await
        {
            Ok(mut report) => {
                let targets = &self.targets;
                report.fill_missing_emails(|id| {
                    targets
                        .iter()
                        .find(|a| a.id == id)
                        .map(|a| a.email.as_str())
                        .filter(|e| !e.is_empty())
                });
                self.delivered.extend(report.success.iter().cloned());
                self.last_report = Some(report.clone());
                self.set_phase(BulkPhase::Reported);
                Ok(report)
            }
            Err(e) => {
                warn!(error = %e, "dispatch failed; nothing marked delivered");
                self.set_phase(resume);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/bulk.rs"]
mod tests;
