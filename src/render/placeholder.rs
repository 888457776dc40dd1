use crate::foundation::core::Frame;
use crate::foundation::error::OvermarkResult;
use crate::render::svg::{FontSet, rasterize};

const BOX_PREMUL: [u8; 4] = [160, 160, 160, 255];

/// Neutral box with a small "missing image" glyph, drawn when a watermark asset fails.
///
/// The glyph is pure geometry so it never depends on fonts. Falls back to a flat box if the
/// vector raster fails.
pub fn placeholder_layer(width: u32, height: u32) -> OvermarkResult<Frame> {
    match rasterize(&markup(width, height), &FontSet::empty(), width, height) {
        Ok(frame) => Ok(frame),
        Err(err) => {
            tracing::debug!(%err, "placeholder glyph raster failed, using flat box");
            Frame::filled(width, height, BOX_PREMUL)
        }
    }
}

fn markup(width: u32, height: u32) -> String {
    // Glyph lives in a 24x24 cell centered in the box, at half the shorter side.
    let side = f64::from(width.min(height)) * 0.5;
    let scale = side / 24.0;
    let tx = (f64::from(width) - side) / 2.0;
    let ty = (f64::from(height) - side) / 2.0;
    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">
<rect x="0" y="0" width="{width}" height="{height}" fill="#a0a0a0"/>
<g transform="translate({tx:.3} {ty:.3}) scale({scale:.4})" fill="none" stroke="#e6e6e6" stroke-width="1.6" stroke-linejoin="round" stroke-linecap="round">
<rect x="2" y="4" width="20" height="16" rx="2"/>
<circle cx="8" cy="9" r="1.8"/>
<path d="M3 18 L9 12 L13 16 L16 13 L21 18"/>
<path d="M3 3 L21 21"/>
</g>
</svg>"##
    )
}

#[cfg(test)]
#[path = "../../tests/unit/render/placeholder.rs"]
mod tests;
