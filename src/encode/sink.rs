use std::path::{Path, PathBuf};

use anyhow::Context as _;
use tracing::debug;

use crate::artifact::BadgeArtifact;
use crate::foundation::error::BadgeResult;

/// Configuration provided to an [`ArtifactSink`] before the first artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkConfig {
    /// Number of artifacts that will be pushed.
    pub count: usize,
}

/// Sink contract for consuming finished badges.
///
/// Ordering contract: `push` is called in roster order, once per attendee, between `begin` and
/// `end`.
pub trait ArtifactSink {
    /// Called once before any artifact.
    fn begin(&mut self, cfg: SinkConfig) -> BadgeResult<()>;
    /// Consume one artifact.
    fn push(&mut self, artifact: &BadgeArtifact) -> BadgeResult<()>;
    /// Called once after the last artifact.
    fn end(&mut self) -> BadgeResult<()>;
}

/// Writes each badge to `{dir}/{file_name}`.
#[derive(Debug)]
pub struct DirSink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl DirSink {
    /// Sink writing below `dir` (created on `begin`).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: Vec::new(),
        }
    }

    /// Target directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Paths written so far, in push order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl ArtifactSink for DirSink {
    fn begin(&mut self, cfg: SinkConfig) -> BadgeResult<()> {
        std::fs::create_dir_all(&self.dir).with_context(|| {
            format!("failed to create output directory '{}'", self.dir.display())
        })?;
        self.written.clear();
        self.written.reserve(cfg.count);
        Ok(())
    }

    fn push(&mut self, artifact: &BadgeArtifact) -> BadgeResult<()> {
        let path = artifact.save_to(&self.dir)?;
        debug!(path = %path.display(), "badge written");
        self.written.push(path);
        Ok(())
    }

    fn end(&mut self) -> BadgeResult<()> {
        Ok(())
    }
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    /// Artifacts in push order.
    pub artifacts: Vec<BadgeArtifact>,
    finished: bool,
}

impl InMemorySink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration received by the last `begin`.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    /// Whether `end` was called after the last `begin`.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl ArtifactSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> BadgeResult<()> {
        self.cfg = Some(cfg);
        self.artifacts.clear();
        self.finished = false;
        Ok(())
    }

    fn push(&mut self, artifact: &BadgeArtifact) -> BadgeResult<()> {
        self.artifacts.push(artifact.clone());
        Ok(())
    }

    fn end(&mut self) -> BadgeResult<()> {
        self.finished = true;
        Ok(())
    }
}
