//! Badge compositor.
//!
//! A run is three stages:
//!
//! 1. resolve layers in paint order, awaiting each logo fetch before moving on (async)
//! 2. paint the layer list onto a fresh surface (sync)
//! 3. encode the surface as PNG (sync)
//!
//! Logo fetches and the verification mark are best-effort: a failure drops that one layer, is
//! logged, and is recorded in [`BadgeArtifact::skipped`].

use std::sync::Arc;

use tracing::{debug, warn};

use crate::artifact::BadgeArtifact;
use crate::assets::color::ColorDef;
use crate::assets::decode::decode_image;
use crate::assets::source::{ImageSource, fetch_image, short_ref};
use crate::encode::png::encode_pixmap_png;
use crate::encode::verification::{
    MAX_MARK_SIZE, VerificationOpts, VerificationPayload, encode_verification,
};
use crate::foundation::core::{Canvas, Point, Rect, Rgba8, centered_square, fit_contain};
use crate::foundation::error::{BadgeError, BadgeResult};
use crate::model::{Attendee, Event, Issuer};
use crate::render::raster::{DEFAULT_FONT_FAMILY, Painter};
use crate::render::scene::{Layer, Sampling, Scene, Slot, TextStyle};

/// Height of the top accent band.
pub const HEADER_HEIGHT: f64 = 120.0;
/// Height of the bottom accent band.
pub const FOOTER_HEIGHT: f64 = 80.0;
/// Side of each logo slot.
pub const LOGO_SIZE: f64 = 80.0;
/// Logo inset from the canvas edges.
pub const LOGO_INSET: f64 = 20.0;
/// Longest event title drawn, in characters.
pub const TITLE_MAX_CHARS: usize = 30;
/// Side of the verification mark.
pub const MARK_SIZE: f64 = 250.0;
/// Top edge of the verification mark.
pub const MARK_TOP: f64 = 330.0;

const TITLE_BASELINE: f64 = 70.0;
const FOOTER_BASELINE: f64 = 870.0;

const INK: Rgba8 = Rgba8::opaque(0x11, 0x18, 0x27);
const MUTED_INK: Rgba8 = Rgba8::opaque(0x4B, 0x55, 0x63);

/// Compositor configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct CompositorOpts {
    /// Serving origin embedded in the verification payload.
    pub origin: String,
    /// Color of both accent bands.
    pub brand_color: ColorDef,
    /// Label centered in the footer band.
    pub footer_label: String,
    /// Device scale factor applied to the logical canvas.
    pub scale: f32,
    /// CSS font-family list for every text layer.
    pub font_family: String,
    /// Verification mark parameters.
    pub verification: VerificationOpts,
}

impl Default for CompositorOpts {
    fn default() -> Self {
        Self {
            origin: "http://localhost:3000".to_owned(),
            brand_color: ColorDef(Rgba8::opaque(0x1E, 0x40, 0xAF)),
            footer_label: "VISITOR".to_owned(),
            scale: 1.0,
            font_family: DEFAULT_FONT_FAMILY.to_owned(),
            verification: VerificationOpts::default(),
        }
    }
}

impl CompositorOpts {
    /// Reject settings that can never produce a badge.
    pub fn validate(&self) -> BadgeResult<()> {
        if self.origin.trim().trim_end_matches('/').is_empty() {
            return Err(BadgeError::validation("origin must be non-empty"));
        }
        Canvas::BADGE.pixel_size(self.scale)?;
        if self.verification.size == 0 || self.verification.size > MAX_MARK_SIZE {
            return Err(BadgeError::validation(format!(
                "verification size must be in 1..={MAX_MARK_SIZE}"
            )));
        }
        Ok(())
    }
}

/// One optional-or-required attendee text line.
struct FieldLine {
    slot: Slot,
    value: fn(&Attendee) -> Option<String>,
    baseline: f64,
    style: TextStyle,
}

fn name_line(a: &Attendee) -> Option<String> {
    Some(a.full_name().to_uppercase())
}

fn job_title_line(a: &Attendee) -> Option<String> {
    present(a.job_title.as_deref())
}

fn company_line(a: &Attendee) -> Option<String> {
    present(a.company.as_deref())
}

fn present(v: Option<&str>) -> Option<String> {
    v.map(str::trim).filter(|s| !s.is_empty()).map(str::to_owned)
}

/// Attendee lines in draw order. Each line owns a fixed vertical slot; absent fields leave it
/// empty.
const FIELD_LINES: [FieldLine; 3] = [
    FieldLine {
        slot: Slot::Name,
        value: name_line,
        baseline: 200.0,
        style: TextStyle {
            size: 40.0,
            weight: 700,
            color: INK,
        },
    },
    FieldLine {
        slot: Slot::JobTitle,
        value: job_title_line,
        baseline: 250.0,
        style: TextStyle {
            size: 24.0,
            weight: 500,
            color: MUTED_INK,
        },
    },
    FieldLine {
        slot: Slot::Company,
        value: company_line,
        baseline: 290.0,
        style: TextStyle {
            size: 20.0,
            weight: 300,
            color: MUTED_INK,
        },
    },
];

/// Event title as drawn: upper-cased, then cut to [`TITLE_MAX_CHARS`] characters.
pub fn badge_title(title: &str) -> String {
    title
        .trim()
        .to_uppercase()
        .chars()
        .take(TITLE_MAX_CHARS)
        .collect()
}

/// Renders badges. Cheap to clone; every run gets its own surface.
#[derive(Clone)]
pub struct BadgeCompositor {
    opts: CompositorOpts,
    images: Arc<dyn ImageSource>,
    painter: Painter,
}

impl std::fmt::Debug for BadgeCompositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BadgeCompositor")
            .field("opts", &self.opts)
            .field("painter", &self.painter)
            .finish_non_exhaustive()
    }
}

impl BadgeCompositor {
    /// Build a compositor that resolves logos through `images` and draws text with `fontdb`.
    pub fn new(
        opts: CompositorOpts,
        images: Arc<dyn ImageSource>,
        fontdb: Arc<usvg::fontdb::Database>,
    ) -> BadgeResult<Self> {
        opts.validate()?;
        let painter = Painter::new(fontdb).with_font_family(opts.font_family.clone());
        Ok(Self {
            opts,
            images,
            painter,
        })
    }

    /// Active configuration.
    pub fn opts(&self) -> &CompositorOpts {
        &self.opts
    }

    /// Compose one badge.
    ///
    /// Only painting or final encoding can fail; logo and verification problems degrade the
    /// badge instead.
    #[tracing::instrument(skip_all, fields(attendee = %attendee.id, event = %event.id))]
    pub async fn compose(
        &self,
        attendee: &Attendee,
        event: &Event,
        issuer: &Issuer,
    ) -> BadgeResult<BadgeArtifact> {
        let (scene, skipped) = self.build_scene(attendee, event, issuer).await;

        let pixmap = self.painter.paint(&scene, self.opts.scale)?;
        let png = encode_pixmap_png(&pixmap)?;
        debug!(
            bytes = png.len(),
            layers = scene.layers.len(),
            skipped = skipped.len(),
            "badge composed"
        );

        Ok(BadgeArtifact::new(
            attendee.id.clone(),
            attendee.badge_file_name(),
            (pixmap.width(), pixmap.height()),
            png,
            scene.describe(),
            skipped,
        ))
    }

    /// Stage 1: the full layer list, in paint order, plus the optional slots that were dropped.
    pub async fn build_scene(
        &self,
        attendee: &Attendee,
        event: &Event,
        issuer: &Issuer,
    ) -> (Scene, Vec<Slot>) {
        let canvas = Canvas::BADGE;
        let width = f64::from(canvas.width);
        let height = f64::from(canvas.height);
        let brand = self.opts.brand_color.rgba8();

        let mut scene = Scene::new(canvas);
        let mut skipped = Vec::new();

        scene.push(Layer::Fill {
            slot: Slot::Background,
            rect: canvas.rect(),
            color: Rgba8::WHITE,
        });
        scene.push(Layer::Fill {
            slot: Slot::HeaderBand,
            rect: Rect::new(0.0, 0.0, width, HEADER_HEIGHT),
            color: brand,
        });

        let event_slot = Rect::new(
            LOGO_INSET,
            LOGO_INSET,
            LOGO_INSET + LOGO_SIZE,
            LOGO_INSET + LOGO_SIZE,
        );
        if let Some(reference) = event.logo() {
            match self.logo_layer(Slot::EventLogo, reference, event_slot).await {
                Some(layer) => scene.push(layer),
                None => skipped.push(Slot::EventLogo),
            }
        }

        let issuer_slot = Rect::new(
            width - LOGO_INSET - LOGO_SIZE,
            LOGO_INSET,
            width - LOGO_INSET,
            LOGO_INSET + LOGO_SIZE,
        );
        if let Some(reference) = issuer.logo() {
            match self.logo_layer(Slot::IssuerLogo, reference, issuer_slot).await {
                Some(layer) => scene.push(layer),
                None => skipped.push(Slot::IssuerLogo),
            }
        }

        scene.push(Layer::Text {
            slot: Slot::Title,
            text: badge_title(&event.title),
            anchor: Point::new(width / 2.0, TITLE_BASELINE),
            style: TextStyle {
                size: 28.0,
                weight: 700,
                color: Rgba8::WHITE,
            },
        });

        for line in &FIELD_LINES {
            if let Some(text) = (line.value)(attendee) {
                scene.push(Layer::Text {
                    slot: line.slot,
                    text,
                    anchor: Point::new(width / 2.0, line.baseline),
                    style: line.style,
                });
            }
        }

        match self.verification_layer(&attendee.id, canvas) {
            Ok(layer) => scene.push(layer),
            Err(e) => {
                warn!(error = %e, "verification mark skipped");
                skipped.push(Slot::Verification);
            }
        }

        scene.push(Layer::Fill {
            slot: Slot::FooterBand,
            rect: Rect::new(0.0, height - FOOTER_HEIGHT, width, height),
            color: brand,
        });
        scene.push(Layer::Text {
            slot: Slot::FooterLabel,
            text: self.opts.footer_label.clone(),
            anchor: Point::new(width / 2.0, FOOTER_BASELINE),
            style: TextStyle {
                size: 32.0,
                weight: 700,
                color: Rgba8::WHITE,
            },
        });

        (scene, skipped)
    }

    async fn logo_layer(&self, slot: Slot, reference: &str, area: Rect) -> Option<Layer> {
        match fetch_image(self.images.as_ref(), reference).await {
            Ok(image) => Some(Layer::Image {
                slot,
                rect: fit_contain(image.width, image.height, area),
                image: Arc::new(image),
                sampling: Sampling::Smooth,
            }),
            Err(e) => {
                warn!(
                    slot = ?slot,
                    reference = %short_ref(reference),
                    error = %e,
                    "logo layer skipped"
                );
                None
            }
        }
    }

    fn verification_layer(&self, attendee_id: &str, canvas: Canvas) -> BadgeResult<Layer> {
        let payload = VerificationPayload::new(&self.opts.origin, attendee_id)?;
        let mark = encode_verification(&payload, &self.opts.verification)?;
        let image = decode_image(&mark.png)?;
        Ok(Layer::Image {
            slot: Slot::Verification,
            rect: centered_square(canvas, MARK_SIZE, MARK_TOP),
            image: Arc::new(image),
            sampling: Sampling::Crisp,
        })
    }
}

#[cfg(test)]
#[path = "../tests/unit/compose.rs"]
mod tests;
