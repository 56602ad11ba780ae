use std::sync::Arc;

use resvg::tiny_skia;
use tracing::trace;

use crate::assets::fonts::svg_options;
use crate::foundation::core::{Canvas, Point, Rect, Rgba8};
use crate::foundation::error::{BadgeError, BadgeResult};
use crate::render::scene::{Layer, Sampling, Scene, TextStyle};

/// Default font stack for badge text.
pub const DEFAULT_FONT_FAMILY: &str = "Helvetica, Arial, sans-serif";

/// CPU painter: executes a [`Scene`] onto a `tiny_skia` surface.
///
/// Holds only read-only shared state, so one painter serves any number of concurrent runs.
#[derive(Clone)]
pub struct Painter {
    fontdb: Arc<usvg::fontdb::Database>,
    font_family: String,
}

impl std::fmt::Debug for Painter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Painter")
            .field("font_faces", &self.fontdb.faces().count())
            .field("font_family", &self.font_family)
            .finish()
    }
}

impl Painter {
    /// Painter using `fontdb` for text layers.
    pub fn new(fontdb: Arc<usvg::fontdb::Database>) -> Self {
        Self {
            fontdb,
            font_family: DEFAULT_FONT_FAMILY.to_owned(),
        }
    }

    /// Override the CSS font-family list used for text.
    pub fn with_font_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = family.into();
        self
    }

    /// Paint every layer in order onto a fresh surface of `canvas * scale` pixels.
    pub fn paint(&self, scene: &Scene, scale: f32) -> BadgeResult<tiny_skia::Pixmap> {
        let (w, h) = scene.canvas.pixel_size(scale)?;
        let mut pixmap = tiny_skia::Pixmap::new(w, h)
            .ok_or_else(|| BadgeError::render("failed to allocate badge surface"))?;
        let base = tiny_skia::Transform::from_scale(scale, scale);

        for layer in &scene.layers {
            trace!(slot = ?layer.slot(), "paint layer");
            match layer {
                Layer::Fill { rect, color, .. } => fill_rect(&mut pixmap, *rect, *color, base)?,
                Layer::Image {
                    rect,
                    image,
                    sampling,
                    ..
                } => {
                    let src = image.to_pixmap()?;
                    draw_image(&mut pixmap, &src, *rect, *sampling, base);
                }
                Layer::Text {
                    text,
                    anchor,
                    style,
                    ..
                } => self.draw_text(&mut pixmap, scene.canvas, text, *anchor, *style, base)?,
            }
        }

        Ok(pixmap)
    }

    fn draw_text(
        &self,
        pixmap: &mut tiny_skia::Pixmap,
        canvas: Canvas,
        text: &str,
        anchor: Point,
        style: TextStyle,
        base: tiny_skia::Transform,
    ) -> BadgeResult<()> {
        if text.trim().is_empty() {
            return Ok(());
        }
        let svg = text_svg(canvas, &self.font_family, text, anchor, style);
        let opts = svg_options(Arc::clone(&self.fontdb));
        let tree = usvg::Tree::from_str(&svg, &opts)
            .map_err(|e| BadgeError::render(format!("text layer '{text}': {e}")))?;
        resvg::render(&tree, base, &mut pixmap.as_mut());
        Ok(())
    }
}

fn fill_rect(
    pixmap: &mut tiny_skia::Pixmap,
    rect: Rect,
    color: Rgba8,
    base: tiny_skia::Transform,
) -> BadgeResult<()> {
    let Some(r) = tiny_skia::Rect::from_ltrb(
        rect.x0 as f32,
        rect.y0 as f32,
        rect.x1 as f32,
        rect.y1 as f32,
    ) else {
        return Err(BadgeError::render(format!("invalid fill rect {rect:?}")));
    };

    let mut paint = tiny_skia::Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = false;
    pixmap.fill_rect(r, &paint, base, None);
    Ok(())
}

fn draw_image(
    pixmap: &mut tiny_skia::Pixmap,
    src: &tiny_skia::Pixmap,
    dst: Rect,
    sampling: Sampling,
    base: tiny_skia::Transform,
) {
    let sx = (dst.width() / f64::from(src.width())) as f32;
    let sy = (dst.height() / f64::from(src.height())) as f32;
    let place = tiny_skia::Transform::from_row(sx, 0.0, 0.0, sy, dst.x0 as f32, dst.y0 as f32);

    let paint = tiny_skia::PixmapPaint {
        quality: match sampling {
            Sampling::Smooth => tiny_skia::FilterQuality::Bicubic,
            Sampling::Crisp => tiny_skia::FilterQuality::Nearest,
        },
        ..tiny_skia::PixmapPaint::default()
    };
    pixmap.draw_pixmap(0, 0, src.as_ref(), &paint, base.pre_concat(place), None);
}

/// Standalone SVG document holding one centered text line on the logical canvas.
pub(crate) fn text_svg(
    canvas: Canvas,
    font_family: &str,
    text: &str,
    anchor: Point,
    style: TextStyle,
) -> String {
    format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            r#"<text x="{x}" y="{y}" text-anchor="middle" font-family="{family}" "#,
            r#"font-size="{size}" font-weight="{weight}" fill="{fill}" fill-opacity="{opacity}">"#,
            "{text}</text></svg>"
        ),
        w = canvas.width,
        h = canvas.height,
        x = anchor.x,
        y = anchor.y,
        family = escape_xml(font_family),
        size = style.size,
        weight = style.weight,
        fill = style.color.to_hex_rgb(),
        opacity = style.color.opacity(),
        text = escape_xml(text),
    )
}

pub(crate) fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/raster.rs"]
mod tests;
