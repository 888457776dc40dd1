use crate::assets::decode::decode_watermark_asset;
use crate::foundation::core::Frame;
use crate::foundation::error::{OvermarkError, OvermarkResult};
use crate::geometry::resolver::{PixelRect, Placement};
use crate::model::watermark::{Watermark, WatermarkContent};
use crate::render::placeholder::placeholder_layer;
use crate::render::surface::Surface;
use crate::render::svg::FontSet;
use crate::render::text::render_text_layer;

/// What [`WatermarkRenderer::render`] ended up drawing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderReport {
    /// The watermark itself.
    Watermark,
    /// The placeholder box, because the watermark asset could not be drawn.
    Placeholder { reason: String },
}

impl RenderReport {
    pub fn placeholder_used(&self) -> bool {
        matches!(self, Self::Placeholder { .. })
    }
}

/// Draws a [`Watermark`] into a placement box on a [`Surface`].
#[derive(Clone, Debug, Default)]
pub struct WatermarkRenderer {
    fonts: FontSet,
}

impl WatermarkRenderer {
    pub fn new(fonts: FontSet) -> Self {
        Self { fonts }
    }

    pub fn with_system_fonts() -> Self {
        Self::new(FontSet::system())
    }

    pub fn fonts(&self) -> &FontSet {
        &self.fonts
    }

    /// Draw `watermark` into `placement` on `surface`.
    ///
    /// The surface opacity is the watermark's opacity for the duration of the call and is
    /// restored on return. Asset failures draw the placeholder instead and are reported, not
    /// returned. Errors are left for problems that would also break the placeholder.
    #[tracing::instrument(level = "debug", skip_all, fields(kind = ?watermark.kind()))]
    pub fn render(
        &self,
        surface: &mut Surface,
        placement: &Placement,
        watermark: &Watermark,
    ) -> OvermarkResult<RenderReport> {
        let rect = placement.to_pixel_rect();
        let mut scope = surface.scoped_opacity(watermark.opacity());

        match self.layer_for(watermark, rect) {
            Ok((layer, dx, dy)) => {
                scope.draw_layer(rect.x + dx, rect.y + dy, &layer)?;
                Ok(RenderReport::Watermark)
            }
            Err(err) => {
                tracing::warn!(%err, "watermark asset failed, drawing placeholder");
                let layer = placeholder_layer(rect.width, rect.height)?;
                scope.draw_layer(rect.x, rect.y, &layer)?;
                Ok(RenderReport::Placeholder {
                    reason: err.to_string(),
                })
            }
        }
    }

    /// Layer plus its offset inside the box.
    fn layer_for(&self, watermark: &Watermark, rect: PixelRect) -> OvermarkResult<(Frame, i64, i64)> {
        match watermark.content() {
            WatermarkContent::Text(text) => {
                let layer = render_text_layer(&self.fonts, text, rect.width, rect.height)?;
                Ok((layer, 0, 0))
            }
            WatermarkContent::Image(bytes) => {
                let asset = decode_watermark_asset(bytes)?;
                contain_fit(&asset, rect.width, rect.height)
            }
        }
    }
}

/// Scale `asset` to fit inside `box_w x box_h` preserving aspect ratio, centered.
fn contain_fit(asset: &Frame, box_w: u32, box_h: u32) -> OvermarkResult<(Frame, i64, i64)> {
    let scale = f64::min(
        f64::from(box_w) / f64::from(asset.width),
        f64::from(box_h) / f64::from(asset.height),
    );
    let w = ((f64::from(asset.width) * scale).round() as u32).clamp(1, box_w);
    let h = ((f64::from(asset.height) * scale).round() as u32).clamp(1, box_h);

    let scaled = if (w, h) == (asset.width, asset.height) {
        asset.clone()
    } else {
        // Premultiplied data resamples without dark fringes.
        let img = image::RgbaImage::from_raw(asset.width, asset.height, asset.data.clone())
            .ok_or_else(|| OvermarkError::watermark_asset("watermark buffer size mismatch"))?;
        let resized = image::imageops::resize(&img, w, h, image::imageops::FilterType::Triangle);
        Frame::from_premul(w, h, resized.into_raw())?
    };

    let dx = i64::from((box_w - w) / 2);
    let dy = i64::from((box_h - h) / 2);
    Ok((scaled, dx, dy))
}

#[cfg(test)]
#[path = "../../tests/unit/render/watermark.rs"]
mod tests;
