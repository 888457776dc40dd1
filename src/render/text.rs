use crate::foundation::core::Frame;
use crate::foundation::error::{OvermarkError, OvermarkResult};
use crate::foundation::math::mul_div255_u8;
use crate::render::blur::gaussian_blur;
use crate::render::svg::{FontSet, escape_xml, rasterize};

/// Font size as a fraction of the placement box width.
pub const FONT_SCALE: f64 = 0.4;

const SHADOW_BLUR_SCALE: f64 = 0.08;
const SHADOW_OFFSET_SCALE: f64 = 0.04;
const SHADOW_ALPHA: u16 = 153;
const STROKE_WIDTH_SCALE: f64 = 0.03;
const FILL_TOP: &str = "#ffffff";
const FILL_BOTTOM: &str = "#c8c8c8";
const STROKE_COLOR: &str = "#1e1e1e";

/// Rasterize the styled text watermark into a `width x height` premultiplied layer.
///
/// Layers, bottom to top: blurred drop shadow, gradient fill, outline stroke. Everything stays
/// inside the box. Fails with [`OvermarkError::WatermarkAsset`] when no font can draw the text.
pub fn render_text_layer(
    fonts: &FontSet,
    text: &str,
    width: u32,
    height: u32,
) -> OvermarkResult<Frame> {
    if fonts.is_empty() {
        return Err(OvermarkError::watermark_asset("no fonts available for text watermark"));
    }

    let font_size = FONT_SCALE * f64::from(width);
    let glyphs = TextMarkup::new(text, width, height, font_size);

    let mask = rasterize(&glyphs.mask(), fonts, width, height)?;
    if mask.is_blank() {
        return Err(OvermarkError::watermark_asset(format!(
            "text {text:?} rasterized to an empty mask"
        )));
    }

    let mut layer = drop_shadow(&mask, font_size)?;
    let face = rasterize(&glyphs.styled(), fonts, width, height)?;
    crate::render::composite::over_in_place(&mut layer.data, &face.data, 1.0)?;
    Ok(layer)
}

/// SVG markup for one text watermark, centered in its box.
#[derive(Debug)]
struct TextMarkup {
    text: String,
    width: u32,
    height: u32,
    font_size: f64,
}

impl TextMarkup {
    fn new(text: &str, width: u32, height: u32, font_size: f64) -> Self {
        Self {
            text: escape_xml(text),
            width,
            height,
            font_size,
        }
    }

    fn open(&self) -> String {
        format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height
        )
    }

    fn text_element(&self, paint: &str) -> String {
        format!(
            r#"<text x="{cx:.3}" y="{cy:.3}" font-family="sans-serif" font-weight="bold" font-size="{fs:.3}" text-anchor="middle" dominant-baseline="central" {paint}>{text}</text>"#,
            cx = f64::from(self.width) / 2.0,
            cy = f64::from(self.height) / 2.0,
            fs = self.font_size,
            text = self.text,
        )
    }

    /// Opaque black glyphs, used as the shadow source.
    fn mask(&self) -> String {
        format!(
            "{}{}</svg>",
            self.open(),
            self.text_element(r##"fill="#000000""##)
        )
    }

    /// Gradient fill with the stroke drawn over it.
    fn styled(&self) -> String {
        let gradient = format!(
            r#"<defs><linearGradient id="wm-fill" gradientUnits="userSpaceOnUse" x1="0" y1="0" x2="{w}" y2="{h}"><stop offset="0" stop-color="{FILL_TOP}"/><stop offset="1" stop-color="{FILL_BOTTOM}"/></linearGradient></defs>"#,
            w = self.width,
            h = self.height
        );
        let stroke = format!(
            r#"fill="none" stroke="{STROKE_COLOR}" stroke-opacity="0.8" stroke-width="{:.3}" stroke-linejoin="round""#,
            (STROKE_WIDTH_SCALE * self.font_size).max(1.0)
        );
        format!(
            "{}{}{}{}</svg>",
            self.open(),
            gradient,
            self.text_element(r#"fill="url(#wm-fill)""#),
            self.text_element(&stroke)
        )
    }
}

/// Darkened, blurred and offset copy of a glyph mask, clipped to the mask's bounds.
fn drop_shadow(mask: &Frame, font_size: f64) -> OvermarkResult<Frame> {
    let mut tinted = mask.clone();
    for px in tinted.data.chunks_exact_mut(4) {
        let a = mul_div255_u8(u16::from(px[3]), SHADOW_ALPHA);
        px.copy_from_slice(&[0, 0, 0, a]);
    }

    let radius = (SHADOW_BLUR_SCALE * font_size).round().max(1.0) as u32;
    let blurred = gaussian_blur(&tinted, radius, radius as f32 / 2.0)?;

    let offset = (SHADOW_OFFSET_SCALE * font_size).round().max(1.0) as u32;
    shift(&blurred, offset, offset)
}

fn shift(src: &Frame, dx: u32, dy: u32) -> OvermarkResult<Frame> {
    let mut out = Frame::transparent(src.width, src.height)?;
    if dx >= src.width || dy >= src.height {
        return Ok(out);
    }
    let row = src.width as usize * 4;
    let run = (src.width - dx) as usize * 4;
    for y in dy..src.height {
        let s = (y - dy) as usize * row;
        let d = y as usize * row + dx as usize * 4;
        out.data[d..d + run].copy_from_slice(&src.data[s..s + run]);
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;
