use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::artifact::BadgeArtifact;
use crate::compose::BadgeCompositor;
use crate::dispatch::client::DispatchReporter;
use crate::dispatch::report::BatchReport;
use crate::foundation::error::{BadgeError, BadgeResult};
use crate::model::{Attendee, Event, Issuer};

/// Phase of a [`SingleSession`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SinglePhase {
    /// The badge does not exist yet (or its run failed).
    Generating,
    /// The badge exists; every action is available.
    Ready,
}

/// Observable state of a [`SingleSession`].
#[derive(Clone, Debug, Default)]
pub struct SingleState {
    artifact: Option<Arc<BadgeArtifact>>,
    failure: Option<String>,
}

impl SingleState {
    /// Current phase.
    pub fn phase(&self) -> SinglePhase {
        if self.artifact.is_some() {
            SinglePhase::Ready
        } else {
            SinglePhase::Generating
        }
    }

    /// The badge, once ready.
    pub fn artifact(&self) -> Option<&Arc<BadgeArtifact>> {
        self.artifact.as_ref()
    }

    /// Why the run ended without a badge, if it did.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }
}

/// One badge composed in the background for preview, download or a single send.
///
/// Must be started inside a tokio runtime. Dropping the session abandons an unfinished run.
#[derive(Debug)]
pub struct SingleSession {
    attendee: Attendee,
    event_id: String,
    state: watch::Receiver<SingleState>,
    task: JoinHandle<()>,
}

impl SingleSession {
    /// Start composing the badge for `attendee`.
    pub fn start(
        compositor: &BadgeCompositor,
        attendee: Attendee,
        event: Event,
        issuer: Issuer,
    ) -> Self {
        let (tx, rx) = watch::channel(SingleState::default());
        let compositor = compositor.clone();
        let run_attendee = attendee.clone();
        let event_id = event.id.clone();

        let task = tokio::spawn(async move {
            let next = match compositor.compose(&run_attendee, &event, &issuer).await {
                Ok(artifact) => SingleState {
                    artifact: Some(Arc::new(artifact)),
                    failure: None,
                },
                Err(e) => {
                    warn!(attendee = %run_attendee.id, error = %e, "badge run failed");
                    SingleState {
                        artifact: None,
                        failure: Some(e.to_string()),
                    }
                }
            };
            tx.send_replace(next);
        });

        Self {
            attendee,
            event_id,
            state: rx,
            task,
        }
    }

    /// Attendee the badge is for.
    pub fn attendee(&self) -> &Attendee {
        &self.attendee
    }

    /// Current phase.
    pub fn phase(&self) -> SinglePhase {
        self.state.borrow().phase()
    }

    /// Receive every state change.
    pub fn subscribe(&self) -> watch::Receiver<SingleState> {
        self.state.clone()
    }

    /// The badge, if ready.
    pub fn artifact(&self) -> Option<Arc<BadgeArtifact>> {
        self.state.borrow().artifact.clone()
    }

    /// Why the run ended without a badge, if it did.
    pub fn failure(&self) -> Option<String> {
        self.state.borrow().failure.clone()
    }

    /// Wait until the run ends. `None` means it ended without a badge; the session then stays
    /// [`SinglePhase::Generating`].
    pub async fn wait_ready(&self) -> Option<Arc<BadgeArtifact>> {
        let mut rx = self.state.clone();
        let artifact = match rx
            .wait_for(|s| s.artifact.is_some() || s.failure.is_some())
            .await
        {
            Ok(state) => state.artifact.clone(),
            // The run was dropped before publishing anything.
            Err(_) => None,
        };
        artifact
    }

    fn ready(&self) -> BadgeResult<Arc<BadgeArtifact>> {
        self.artifact()
            .ok_or_else(|| BadgeError::not_ready("badge is still generating"))
    }

    /// `data:image/png;base64,...` preview.
    pub fn preview_data_url(&self) -> BadgeResult<String> {
        Ok(self.ready()?.data_url())
    }

    /// Save as `badge-{firstName}-{lastName}.png` in `dir`.
    pub fn save(&self, dir: &Path) -> BadgeResult<PathBuf> {
        let path = self.ready()?.save_to(dir)?;
        info!(path = %path.display(), "badge saved");
        Ok(path)
    }

    /// Send this one badge through the batch endpoint.
    pub async fn send(&self, reporter: &DispatchReporter) -> BadgeResult<BatchReport> {
        let artifact = self.ready()?;
        let ids = vec![self.attendee.id.clone()];
        let mut artifacts = BTreeMap::new();
        artifacts.insert(self.attendee.id.clone(), BadgeArtifact::clone(&artifact));

        let mut report = reporter.dispatch(&self.event_id, &ids, &artifacts).await?;
        let email = self.attendee.email.as_str();
        report.fill_missing_emails(|_| Some(email).filter(|e| !e.is_empty()));
        Ok(report)
    }
}

impl Drop for SingleSession {
    fn drop(&mut self) {
        self.task.abort();
    }
}
