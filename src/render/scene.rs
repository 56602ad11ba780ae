//! Ordered layer list for one badge.
//!
//! Layers paint in push order; later layers cover earlier ones. [`Scene::describe`] gives the
//! pixel-free view used to compare layouts.

use std::sync::Arc;

use serde::Serialize;

use crate::assets::decode::PreparedImage;
use crate::foundation::core::{Canvas, Point, Rect, Rgba8};

/// Named position on the badge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    /// Whole-canvas background.
    Background,
    /// Accent band across the top.
    HeaderBand,
    /// Event mark, top-left.
    EventLogo,
    /// Issuer mark, top-right.
    IssuerLogo,
    /// Event title inside the header band.
    Title,
    /// Attendee full name.
    Name,
    /// Attendee job title.
    JobTitle,
    /// Attendee company.
    Company,
    /// Verification mark.
    Verification,
    /// Accent band across the bottom.
    FooterBand,
    /// Label inside the footer band.
    FooterLabel,
}

/// Text styling for a single centered line.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TextStyle {
    /// Font size in logical units.
    pub size: f32,
    /// CSS font weight (100..=900).
    pub weight: u16,
    /// Fill color.
    pub color: Rgba8,
}

/// How an image layer is resampled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Sampling {
    /// Bicubic filtering, for photos and logos.
    Smooth,
    /// Nearest neighbour, for module grids that must stay crisp.
    Crisp,
}

/// One paint operation.
#[derive(Clone, Debug)]
pub enum Layer {
    /// Solid rectangle.
    Fill {
        /// Position.
        slot: Slot,
        /// Area in logical units.
        rect: Rect,
        /// Fill color.
        color: Rgba8,
    },
    /// Raster image scaled into `rect`.
    Image {
        /// Position.
        slot: Slot,
        /// Destination in logical units.
        rect: Rect,
        /// Decoded pixels.
        image: Arc<PreparedImage>,
        /// Resampling mode.
        sampling: Sampling,
    },
    /// One line of text centered on `anchor.x`, baseline at `anchor.y`.
    Text {
        /// Position.
        slot: Slot,
        /// Content, already cased/truncated.
        text: String,
        /// Baseline center point.
        anchor: Point,
        /// Style.
        style: TextStyle,
    },
}

impl Layer {
    /// Slot this layer occupies.
    pub fn slot(&self) -> Slot {
        match self {
            Layer::Fill { slot, .. } | Layer::Image { slot, .. } | Layer::Text { slot, .. } => {
                *slot
            }
        }
    }

    /// Pixel-free description.
    pub fn describe(&self) -> LayerDesc {
        match self {
            Layer::Fill { slot, rect, color } => LayerDesc::Fill {
                slot: *slot,
                rect: *rect,
                color: *color,
            },
            Layer::Image {
                slot,
                rect,
                image,
                sampling,
            } => LayerDesc::Image {
                slot: *slot,
                rect: *rect,
                source_size: (image.width, image.height),
                sampling: *sampling,
            },
            Layer::Text {
                slot,
                text,
                anchor,
                style,
            } => LayerDesc::Text {
                slot: *slot,
                text: text.clone(),
                anchor: *anchor,
                style: *style,
            },
        }
    }
}

/// Serializable view of a [`Layer`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayerDesc {
    /// See [`Layer::Fill`].
    Fill {
        /// Position.
        slot: Slot,
        /// Area.
        rect: Rect,
        /// Color.
        color: Rgba8,
    },
    /// See [`Layer::Image`].
    Image {
        /// Position.
        slot: Slot,
        /// Destination.
        rect: Rect,
        /// Decoded source dimensions.
        source_size: (u32, u32),
        /// Resampling mode.
        sampling: Sampling,
    },
    /// See [`Layer::Text`].
    Text {
        /// Position.
        slot: Slot,
        /// Content.
        text: String,
        /// Baseline center point.
        anchor: Point,
        /// Style.
        style: TextStyle,
    },
}

impl LayerDesc {
    /// Slot this layer occupies.
    pub fn slot(&self) -> Slot {
        match self {
            LayerDesc::Fill { slot, .. }
            | LayerDesc::Image { slot, .. }
            | LayerDesc::Text { slot, .. } => *slot,
        }
    }

    /// Text content, for text layers.
    pub fn text(&self) -> Option<&str> {
        match self {
            LayerDesc::Text { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// Layers for one badge, in paint order.
#[derive(Clone, Debug)]
pub struct Scene {
    /// Logical canvas.
    pub canvas: Canvas,
    /// Paint order.
    pub layers: Vec<Layer>,
}

impl Scene {
    /// Empty scene on `canvas`.
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            layers: Vec::new(),
        }
    }

    /// Append a layer on top.
    pub fn push(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    /// Pixel-free description of every layer, in paint order.
    pub fn describe(&self) -> Vec<LayerDesc> {
        self.layers.iter().map(Layer::describe).collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/scene.rs"]
mod tests;
