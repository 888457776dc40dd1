use std::io::Cursor;

use image::ImageEncoder as _;

use crate::assets::decode::decode_frame;
use crate::foundation::core::Frame;
use crate::foundation::error::{OvermarkError, OvermarkResult};
use crate::geometry::resolver::resolve;
use crate::model::watermark::Watermark;
use crate::render::surface::Surface;
use crate::render::watermark::{RenderReport, WatermarkRenderer};

/// Default JPEG quality in `[0, 1]`.
pub const DEFAULT_QUALITY: f32 = 0.9;

/// Output container of a composed still.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Jpeg,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }
}

/// An encoded, watermarked still.
#[derive(Clone, Debug)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
    /// True when the watermark asset failed and the placeholder was drawn instead.
    pub placeholder_used: bool,
}

/// Decode, watermark and re-encode still images.
#[derive(Clone, Debug, Default)]
pub struct ImageCompositor {
    renderer: WatermarkRenderer,
}

impl ImageCompositor {
    pub fn new(renderer: WatermarkRenderer) -> Self {
        Self { renderer }
    }

    pub fn renderer(&self) -> &WatermarkRenderer {
        &self.renderer
    }

    /// Watermark an encoded still.
    ///
    /// Undecodable sources fail with [`OvermarkError::Decode`] and produce no output.
    #[tracing::instrument(level = "debug", skip_all, fields(len = source.len()))]
    pub fn compose(
        &self,
        source: &[u8],
        watermark: &Watermark,
        quality: f32,
    ) -> OvermarkResult<EncodedImage> {
        let frame = decode_frame(source)?;
        self.compose_frame(frame, watermark, quality)
    }

    /// Watermark an already decoded frame and encode it.
    pub fn compose_frame(
        &self,
        frame: Frame,
        watermark: &Watermark,
        quality: f32,
    ) -> OvermarkResult<EncodedImage> {
        let source_translucent = frame.has_translucency();
        let (frame, report) = self.composite(frame, watermark)?;

        let format = if watermark.needs_alpha_output() || source_translucent {
            OutputFormat::Png
        } else {
            OutputFormat::Jpeg
        };
        let bytes = encode(&frame, format, quality)?;
        tracing::debug!(
            width = frame.width,
            height = frame.height,
            ?format,
            bytes = bytes.len(),
            "composed still"
        );

        Ok(EncodedImage {
            bytes,
            format,
            width: frame.width,
            height: frame.height,
            placeholder_used: report.placeholder_used(),
        })
    }

    /// Resolve the placement and draw the watermark exactly once, without encoding.
    pub fn composite(
        &self,
        frame: Frame,
        watermark: &Watermark,
    ) -> OvermarkResult<(Frame, RenderReport)> {
        let placement = resolve(frame.width, frame.height, watermark.size(), watermark.position());
        let mut surface = Surface::new(frame);
        let report = self.renderer.render(&mut surface, &placement, watermark)?;
        Ok((surface.into_frame(), report))
    }
}

/// Map a `[0, 1]` quality to the JPEG encoder's `1..=100` scale.
pub fn jpeg_quality(quality: f32) -> u8 {
    let q = if quality.is_finite() { quality } else { DEFAULT_QUALITY };
    ((q.clamp(0.0, 1.0) * 100.0).round() as u8).clamp(1, 100)
}

/// Encode a premultiplied frame. JPEG output is flattened over black.
pub fn encode(frame: &Frame, format: OutputFormat, quality: f32) -> OvermarkResult<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    match format {
        OutputFormat::Png => image::codecs::png::PngEncoder::new(&mut out)
            .write_image(
                &frame.to_straight_rgba8(),
                frame.width,
                frame.height,
                image::ExtendedColorType::Rgba8,
            )
            .map_err(|e| OvermarkError::encode(format!("png: {e}")))?,
        OutputFormat::Jpeg => {
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, jpeg_quality(quality))
                .write_image(
                    &frame.flatten_to_rgb8([0, 0, 0]),
                    frame.width,
                    frame.height,
                    image::ExtendedColorType::Rgb8,
                )
                .map_err(|e| OvermarkError::encode(format!("jpeg: {e}")))?
        }
    }
    Ok(out.into_inner())
}

#[cfg(test)]
#[path = "../../tests/unit/compose/image.rs"]
mod tests;
