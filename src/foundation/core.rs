use crate::foundation::error::{BadgeError, BadgeResult};

pub use kurbo::{Point, Rect, Size};

/// Logical canvas dimensions.
///
/// Layout is expressed in logical units; the painter multiplies by the device scale to get
/// output pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in logical units.
    pub width: u32,
    /// Height in logical units.
    pub height: u32,
}

impl Canvas {
    /// Portrait badge canvas.
    pub const BADGE: Canvas = Canvas {
        width: 600,
        height: 900,
    };

    /// Full canvas rectangle in logical units.
    pub fn rect(self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }

    /// Output pixel size for a device scale factor.
    pub fn pixel_size(self, scale: f32) -> BadgeResult<(u32, u32)> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(BadgeError::validation("scale must be finite and > 0"));
        }
        let w = (self.width as f32 * scale).round() as u32;
        let h = (self.height as f32 * scale).round() as u32;

        const MAX_DIM: u32 = 16_384;
        if w == 0 || h == 0 || w > MAX_DIM || h > MAX_DIM {
            return Err(BadgeError::validation(format!(
                "output size {w}x{h} outside 1..={MAX_DIM}"
            )));
        }
        Ok((w, h))
    }
}

/// Straight-alpha RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8 {
    /// Opaque white.
    pub const WHITE: Rgba8 = Rgba8::opaque(255, 255, 255);
    /// Opaque black.
    pub const BLACK: Rgba8 = Rgba8::opaque(0, 0, 0);

    /// Opaque color from RGB channels.
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// `#rrggbb` form used for SVG fills (alpha is emitted separately).
    pub fn to_hex_rgb(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Alpha as a `0..=1` opacity.
    pub fn opacity(self) -> f32 {
        f32::from(self.a) / 255.0
    }
}

/// Fit a `src_w x src_h` image inside `slot`, preserving aspect ratio and centering it.
pub fn fit_contain(src_w: u32, src_h: u32, slot: Rect) -> Rect {
    if src_w == 0 || src_h == 0 {
        return Rect::from_center_size(slot.center(), Size::ZERO);
    }
    let sx = slot.width() / f64::from(src_w);
    let sy = slot.height() / f64::from(src_h);
    let s = sx.min(sy);
    let size = Size::new(f64::from(src_w) * s, f64::from(src_h) * s);
    Rect::from_center_size(slot.center(), size)
}

/// Square of side `side`, horizontally centered in `canvas`, with its top edge at `top`.
pub fn centered_square(canvas: Canvas, side: f64, top: f64) -> Rect {
    let x0 = (f64::from(canvas.width) - side) / 2.0;
    Rect::new(x0, top, x0 + side, top + side)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
