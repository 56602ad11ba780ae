//! Verification mark: a QR symbol encoding `{origin}/attendee/{id}`.
//!
//! Encoding is a pure function of the payload and [`VerificationOpts`]; identical inputs give
//! byte-identical PNG output.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::assets::color::ColorDef;
use crate::encode::png::encode_png_rgba;
use crate::foundation::core::Rgba8;
use crate::foundation::error::{BadgeError, BadgeResult};

/// Path segment between the origin and the attendee id.
pub const ATTENDEE_PATH: &str = "/attendee/";

/// Largest mark side length, in pixels, the encoder will rasterize.
pub const MAX_MARK_SIZE: u32 = 4096;

/// URL-shaped string scanned from a badge.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VerificationPayload {
    url: String,
    id_offset: usize,
}

impl VerificationPayload {
    /// Build `{origin}/attendee/{attendee_id}`.
    ///
    /// A trailing `/` on `origin` is dropped. The id is embedded verbatim, so ids that would alter
    /// the path shape (separators, query/fragment markers, whitespace) are rejected.
    pub fn new(origin: &str, attendee_id: &str) -> BadgeResult<Self> {
        let origin = origin.trim().trim_end_matches('/');
        if origin.is_empty() {
            return Err(BadgeError::validation("verification origin must be non-empty"));
        }
        if attendee_id.is_empty() {
            return Err(BadgeError::validation("attendee id must be non-empty"));
        }
        if attendee_id
            .chars()
            .any(|c| matches!(c, '/' | '?' | '#') || c.is_whitespace() || c.is_control())
        {
            return Err(BadgeError::validation(format!(
                "attendee id '{attendee_id}' cannot be embedded in a verification URL"
            )));
        }

        let url = format!("{origin}{ATTENDEE_PATH}{attendee_id}");
        let id_offset = origin.len() + ATTENDEE_PATH.len();
        Ok(Self { url, id_offset })
    }

    /// Full payload string.
    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// Origin portion, without trailing slash.
    pub fn origin(&self) -> &str {
        &self.url[..self.id_offset - ATTENDEE_PATH.len()]
    }

    /// Attendee id portion.
    pub fn attendee_id(&self) -> &str {
        &self.url[self.id_offset..]
    }
}

impl fmt::Display for VerificationPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// QR error-correction level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EcLevel {
    /// ~7% recovery.
    L,
    /// ~15% recovery.
    M,
    /// ~25% recovery.
    Q,
    /// ~30% recovery.
    #[default]
    H,
}

impl From<EcLevel> for qrcode::EcLevel {
    fn from(level: EcLevel) -> Self {
        match level {
            EcLevel::L => qrcode::EcLevel::L,
            EcLevel::M => qrcode::EcLevel::M,
            EcLevel::Q => qrcode::EcLevel::Q,
            EcLevel::H => qrcode::EcLevel::H,
        }
    }
}

/// Fixed rendering parameters for the mark.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VerificationOpts {
    /// Output side length in pixels.
    pub size: u32,
    /// Quiet zone, in modules, on every side.
    pub margin: u32,
    /// Module color.
    pub dark: ColorDef,
    /// Background color.
    pub light: ColorDef,
    /// Error-correction level.
    pub ec_level: EcLevel,
}

impl Default for VerificationOpts {
    fn default() -> Self {
        Self {
            size: 250,
            margin: 1,
            dark: ColorDef(Rgba8::BLACK),
            light: ColorDef(Rgba8::WHITE),
            ec_level: EcLevel::H,
        }
    }
}

/// Encoded verification image.
#[derive(Clone, Debug)]
pub struct VerificationMark {
    /// What the symbol encodes.
    pub payload: VerificationPayload,
    /// Symbol width in modules, quiet zone excluded.
    pub modules: u32,
    /// Side length in pixels.
    pub size: u32,
    /// PNG bytes.
    pub png: Vec<u8>,
}

/// Encode `payload` as a QR symbol rendered to a `size x size` PNG.
pub fn encode_verification(
    payload: &VerificationPayload,
    opts: &VerificationOpts,
) -> BadgeResult<VerificationMark> {
    let code = qrcode::QrCode::with_error_correction_level(
        payload.as_str().as_bytes(),
        opts.ec_level.into(),
    )
    .map_err(|e| BadgeError::encode(format!("qr symbol for '{payload}': {e}")))?;

    let modules = code.width();
    let colors = code.to_colors();
    let img = rasterize_modules(&colors, modules, opts)?;

    let png = encode_png_rgba(opts.size, opts.size, img)?;
    Ok(VerificationMark {
        payload: payload.clone(),
        modules: modules as u32,
        size: opts.size,
        png,
    })
}

/// Nearest-neighbour sampling of the module grid into straight RGBA8 pixels.
fn rasterize_modules(
    colors: &[qrcode::Color],
    modules: usize,
    opts: &VerificationOpts,
) -> BadgeResult<Vec<u8>> {
    if opts.size > MAX_MARK_SIZE {
        return Err(BadgeError::encode(format!(
            "mark size {}px exceeds the {MAX_MARK_SIZE}px limit",
            opts.size
        )));
    }
    let margin = opts.margin as usize;
    let total = modules + 2 * margin;
    let size = opts.size as usize;
    if size < total {
        return Err(BadgeError::encode(format!(
            "mark size {size}px is smaller than the symbol ({total} modules)"
        )));
    }
    if colors.len() != modules * modules {
        return Err(BadgeError::encode("qr module grid has unexpected length"));
    }

    let dark = opts.dark.rgba8();
    let light = opts.light.rgba8();
    let mut data = Vec::with_capacity(size * size * 4);
    for py in 0..size {
        let my = py * total / size;
        for px in 0..size {
            let mx = px * total / size;
            let inside = (margin..margin + modules).contains(&mx)
                && (margin..margin + modules).contains(&my);
            let is_dark =
                inside && colors[(my - margin) * modules + (mx - margin)] == qrcode::Color::Dark;
            let c = if is_dark { dark } else { light };
            data.extend_from_slice(&[c.r, c.g, c.b, c.a]);
        }
    }
    Ok(data)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/verification.rs"]
mod tests;
