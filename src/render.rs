//! Badge rendering: a [`scene::Scene`] describes what to draw, [`raster::Painter`] draws it.

/// CPU painter.
pub mod raster;
/// Layer list.
pub mod scene;
