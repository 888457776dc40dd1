use crate::encode::ffmpeg::VideoSourceInfo;
use crate::geometry::resolver::{padding_for, resolve};
use crate::model::watermark::Watermark;

/// Label of the filtered video stream produced by [`OverlayFilter::to_filter_complex`].
pub const OUTPUT_LABEL: &str = "[outv]";

/// Parameters of the ffmpeg overlay filter graph for one video.
///
/// Input 0 is the source video, input 1 the rendered watermark asset.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayFilter {
    /// Horizontal position expression over `main_w`/`overlay_w`.
    pub x_expr: String,
    /// Vertical position expression over `main_h`/`overlay_h`.
    pub y_expr: String,
    /// Target watermark width in source pixels; height follows the asset aspect ratio.
    pub scale_width: u32,
    /// Watermark opacity in `[0, 1]`.
    pub alpha: f32,
    /// Source duration. `None` keeps the watermark enabled for the whole stream.
    pub duration_secs: Option<f64>,
}

impl OverlayFilter {
    /// Filter parameters for `watermark` on a probed source, driven by the shared tables.
    pub fn for_watermark(watermark: &Watermark, source: &VideoSourceInfo) -> Self {
        let placement = resolve(
            source.width,
            source.height,
            watermark.size(),
            watermark.position(),
        );
        let padding = padding_for(source.width, source.height);
        let (ax, ay) = watermark.position().anchors();

        Self {
            x_expr: ax.filter_expr("main_w", "overlay_w", padding),
            y_expr: ay.filter_expr("main_h", "overlay_h", padding),
            scale_width: (placement.width.round() as u32).max(2),
            alpha: watermark.opacity(),
            duration_secs: source.duration_secs.filter(|d| d.is_finite() && *d > 0.0),
        }
    }

    pub fn scale_expr(&self) -> String {
        format!("scale=w={}:h=-1", self.scale_width)
    }

    pub fn alpha_expr(&self) -> String {
        format!("colorchannelmixer=aa={:.2}", self.alpha.clamp(0.0, 1.0))
    }

    pub fn enable_expr(&self) -> Option<String> {
        self.duration_secs
            .map(|d| format!("enable='between(t,0,{d:.3})'"))
    }

    /// Complete `-filter_complex` argument.
    ///
    /// The overlaid stream is padded to even dimensions for `yuv420p` output.
    pub fn to_filter_complex(&self) -> String {
        let mut overlay = format!("overlay=x={}:y={}", self.x_expr, self.y_expr);
        if let Some(enable) = self.enable_expr() {
            overlay.push(':');
            overlay.push_str(&enable);
        }
        format!(
            "[1:v]format=rgba,{},{}[wm];[0:v][wm]{},pad=ceil(iw/2)*2:ceil(ih/2)*2{OUTPUT_LABEL}",
            self.scale_expr(),
            self.alpha_expr(),
            overlay
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/filter.rs"]
mod tests;
