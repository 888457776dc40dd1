use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::encode::ffmpeg::{CodecSettings, FfmpegFrameGrabber, FfmpegTranscoder};
use crate::foundation::error::{OvermarkError, OvermarkResult};
use crate::render::svg::FontSet;
use crate::video::clip::{DEFAULT_DURATION_SECS, DEFAULT_FPS, FfmpegClipEncoder};
use crate::video::orchestrator::VideoBackends;

const X264_PRESETS: [&str; 9] = [
    "ultrafast",
    "superfast",
    "veryfast",
    "faster",
    "fast",
    "medium",
    "slow",
    "slower",
    "veryslow",
];

/// Bounds the video watermark raster: its square side is capped by the longer side of the box.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayBox {
    pub width: u32,
    pub height: u32,
}

impl Default for OverlayBox {
    fn default() -> Self {
        Self {
            width: 200,
            height: 100,
        }
    }
}

/// Runtime settings. Every field is optional in JSON and falls back to its default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// JPEG quality in `[0, 1]`.
    pub jpeg_quality: f32,
    pub clip_duration_secs: u32,
    pub clip_fps: u32,
    pub overlay_box: OverlayBox,
    pub max_concurrent_jobs: usize,
    pub ffmpeg_bin: PathBuf,
    pub ffprobe_bin: PathBuf,
    /// x264 preset name.
    pub video_preset: String,
    /// x264 constant rate factor, `0..=51`.
    pub video_crf: u8,
    /// Parent of per-job workspaces; system temp dir when unset.
    pub scratch_dir: Option<PathBuf>,
    /// Extra fonts loaded next to the system fonts.
    pub fonts_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            jpeg_quality: crate::compose::image::DEFAULT_QUALITY,
            clip_duration_secs: DEFAULT_DURATION_SECS,
            clip_fps: DEFAULT_FPS,
            overlay_box: OverlayBox::default(),
            max_concurrent_jobs: 4,
            ffmpeg_bin: PathBuf::from("ffmpeg"),
            ffprobe_bin: PathBuf::from("ffprobe"),
            video_preset: "veryfast".to_owned(),
            video_crf: 23,
            scratch_dir: None,
            fonts_dir: None,
        }
    }
}

impl Settings {
    pub fn from_reader<R: std::io::Read>(r: R) -> OvermarkResult<Self> {
        let settings: Self = serde_json::from_reader(r)
            .map_err(|e| OvermarkError::validation(format!("parse settings JSON: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load and validate settings from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> OvermarkResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            OvermarkError::validation(format!("open settings JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn validate(&self) -> OvermarkResult<()> {
        if !self.jpeg_quality.is_finite() || !(0.0..=1.0).contains(&self.jpeg_quality) {
            return Err(OvermarkError::validation("jpeg_quality must be within [0, 1]"));
        }
        if !(1..=60).contains(&self.clip_duration_secs) {
            return Err(OvermarkError::validation("clip_duration_secs must be within 1..=60"));
        }
        if !(1..=120).contains(&self.clip_fps) {
            return Err(OvermarkError::validation("clip_fps must be within 1..=120"));
        }
        let OverlayBox { width, height } = self.overlay_box;
        if width == 0 || height == 0 || width > 4096 || height > 4096 {
            return Err(OvermarkError::validation(
                "overlay_box dimensions must be within 1..=4096",
            ));
        }
        if self.max_concurrent_jobs == 0 {
            return Err(OvermarkError::validation("max_concurrent_jobs must be at least 1"));
        }
        if self.ffmpeg_bin.as_os_str().is_empty() || self.ffprobe_bin.as_os_str().is_empty() {
            return Err(OvermarkError::validation("ffmpeg_bin/ffprobe_bin must be non-empty"));
        }
        if !X264_PRESETS.contains(&self.video_preset.as_str()) {
            return Err(OvermarkError::validation(format!(
                "unknown video_preset '{}'",
                self.video_preset
            )));
        }
        if self.video_crf > 51 {
            return Err(OvermarkError::validation("video_crf must be within 0..=51"));
        }
        Ok(())
    }

    pub fn codec(&self) -> CodecSettings {
        CodecSettings {
            preset: self.video_preset.clone(),
            crf: self.video_crf,
        }
    }

    pub fn font_set(&self) -> FontSet {
        match &self.fonts_dir {
            Some(dir) => FontSet::with_fonts_dir(dir),
            None => FontSet::system(),
        }
    }

    /// System `ffmpeg` backends configured from these settings.
    pub fn ffmpeg_backends(&self) -> VideoBackends {
        VideoBackends {
            transcoder: std::sync::Arc::new(FfmpegTranscoder::new(
                &self.ffmpeg_bin,
                &self.ffprobe_bin,
            )),
            grabber: std::sync::Arc::new(FfmpegFrameGrabber::new(&self.ffmpeg_bin)),
            clip_encoder: std::sync::Arc::new(FfmpegClipEncoder::new(
                &self.ffmpeg_bin,
                self.codec(),
            )),
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
