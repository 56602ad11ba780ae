use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::encode::png::png_data_url;
use crate::foundation::error::BadgeResult;
use crate::render::scene::{LayerDesc, Slot};

/// Output of one compositor run. Immutable once built.
#[derive(Clone, Debug)]
pub struct BadgeArtifact {
    attendee_id: String,
    file_name: String,
    width: u32,
    height: u32,
    png: Arc<Vec<u8>>,
    layout: Vec<LayerDesc>,
    skipped: Vec<Slot>,
}

impl BadgeArtifact {
    pub(crate) fn new(
        attendee_id: String,
        file_name: String,
        (width, height): (u32, u32),
        png: Vec<u8>,
        layout: Vec<LayerDesc>,
        skipped: Vec<Slot>,
    ) -> Self {
        Self {
            attendee_id,
            file_name,
            width,
            height,
            png: Arc::new(png),
            layout,
            skipped,
        }
    }

    /// Attendee this badge belongs to.
    pub fn attendee_id(&self) -> &str {
        &self.attendee_id
    }

    /// Download name, `badge-{firstName}-{lastName}.png`.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Pixel dimensions.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Encoded PNG bytes.
    pub fn png(&self) -> &[u8] {
        &self.png
    }

    /// Self-contained `data:image/png;base64,...` form.
    pub fn data_url(&self) -> String {
        png_data_url(&self.png)
    }

    /// Layers drawn, in paint order.
    pub fn layout(&self) -> &[LayerDesc] {
        &self.layout
    }

    /// Text content of every text layer, in paint order.
    pub fn texts(&self) -> Vec<&str> {
        self.layout.iter().filter_map(LayerDesc::text).collect()
    }

    /// Whether a layer was drawn in `slot`.
    pub fn has_layer(&self, slot: Slot) -> bool {
        self.layout.iter().any(|l| l.slot() == slot)
    }

    /// Optional layers that were requested but could not be produced (failed fetch or encode).
    pub fn skipped(&self) -> &[Slot] {
        &self.skipped
    }

    /// Whether every requested layer was drawn.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    /// Write the PNG into `dir` under [`Self::file_name`] and return the path.
    pub fn save_to(&self, dir: &Path) -> BadgeResult<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, self.png.as_slice())?;
        Ok(path)
    }
}
