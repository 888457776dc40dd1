//! Overmark stamps a watermark onto batches of images and videos.
//!
//! A [`Watermark`] is either text or an uploaded image. It has a size class, an anchor position and
//! an opacity. Every input file goes through one of two pipelines:
//!
//! - **Images**: decode, resolve the [`Placement`], draw the watermark onto a [`Surface`]
//!   under a scoped opacity, then re-encode as JPEG (or PNG when alpha must survive).
//! - **Videos**: overlay the watermark across the whole clip with the system `ffmpeg`. If that
//!   fails, grab the first frame and run the image pipeline on it. That still is then encoded as
//!   a short static clip.
//!
//! [`process_batch`] runs files concurrently, reports per-file progress and never lets one
//! file's failure affect another.
#![forbid(unsafe_code)]

mod assets;
mod batch;
mod compose;
mod config;
mod encode;
mod foundation;
mod geometry;
mod model;
mod render;
mod video;

pub use crate::assets::decode::{decode_frame, decode_watermark_asset, strip_data_url};
pub use crate::assets::media::{MediaKind, classify, extension_of, output_file_name};
pub use crate::foundation::core::Frame;
pub use crate::foundation::error::{OvermarkError, OvermarkResult};
pub use crate::geometry::resolver::{PixelRect, Placement, padding_for, resolve, resolve_keys};
pub use crate::geometry::table::{
    Anchor, DEFAULT_POSITION, DEFAULT_SIZE, PADDING_FRACTION, Position, SizeClass,
};
pub use crate::model::watermark::{Watermark, WatermarkContent, WatermarkKind};

pub use crate::batch::{
    BatchContext, BatchProgress, FileOutcome, MediaInput, MediaOutput, MediaSource,
    ProgressOutcome, process_batch, process_file,
};
pub use crate::compose::image::{
    DEFAULT_QUALITY, EncodedImage, ImageCompositor, OutputFormat, encode as encode_frame,
    jpeg_quality,
};
pub use crate::config::{OverlayBox, Settings};
pub use crate::encode::ffmpeg::{
    CodecSettings, FfmpegFrameGrabber, FfmpegTranscoder, FrameGrabber, TranscodeRequest,
    Transcoder, VideoSourceInfo, is_ffmpeg_on_path, parse_probe_json, probe_video,
};
pub use crate::encode::filter::OverlayFilter;
pub use crate::render::surface::{OpacityScope, Surface};
pub use crate::render::svg::FontSet;
pub use crate::render::watermark::{RenderReport, WatermarkRenderer};
pub use crate::video::clip::{
    CaptureSurface, ClipConfig, ClipEncoder, ClipSink, ClipSynthesizer, DEFAULT_DURATION_SECS,
    DEFAULT_FPS, FfmpegClipEncoder, PrimedCapture,
};
pub use crate::video::job::{JobStage, JobState, OutputTier, OverlayJob};
pub use crate::video::orchestrator::{VideoBackends, VideoOutput, VideoOverlayOrchestrator};
pub use crate::video::workspace::JobWorkspace;
