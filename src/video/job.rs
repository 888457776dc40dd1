use std::path::PathBuf;

use crate::compose::image::EncodedImage;
use crate::encode::ffmpeg::{CodecSettings, TranscodeRequest};
use crate::encode::filter::OverlayFilter;
use crate::foundation::error::OvermarkError;

/// Stage tag of a [`JobState`], used in traces and in [`OvermarkError::Overlay`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JobStage {
    FullOverlay,
    SingleFrameFallback,
    ClipSynthesis,
    Done,
    Failed,
}

impl std::fmt::Display for JobStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::FullOverlay => "full overlay",
            Self::SingleFrameFallback => "single-frame fallback",
            Self::ClipSynthesis => "clip synthesis",
            Self::Done => "done",
            Self::Failed => "failed",
        })
    }
}

/// Which tier produced a finished video.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputTier {
    /// Every frame overlaid by the transcoder, source audio kept.
    FullOverlay,
    /// Watermarked first frame held for a fixed duration, silent.
    SynthesizedClip,
}

/// State of one video job. Each non-terminal state is consumed by exactly one step.
#[derive(Debug)]
pub enum JobState {
    FullOverlay,
    /// Entered after the full overlay failed; the cause is only logged.
    SingleFrameFallback {
        cause: OvermarkError,
    },
    ClipSynthesis {
        still: EncodedImage,
    },
    Done {
        bytes: Vec<u8>,
        tier: OutputTier,
    },
    Failed(OvermarkError),
}

impl JobState {
    pub fn stage(&self) -> JobStage {
        match self {
            Self::FullOverlay => JobStage::FullOverlay,
            Self::SingleFrameFallback { .. } => JobStage::SingleFrameFallback,
            Self::ClipSynthesis { .. } => JobStage::ClipSynthesis,
            Self::Done { .. } => JobStage::Done,
            Self::Failed(_) => JobStage::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Failed(_))
    }

    /// Terminal failure for `stage`, keeping only this stage's cause.
    ///
    /// Cancellation is passed through unwrapped.
    pub fn failed_at(stage: JobStage, cause: OvermarkError) -> Self {
        match cause {
            OvermarkError::Cancelled => Self::Failed(OvermarkError::Cancelled),
            cause => Self::Failed(OvermarkError::Overlay {
                stage,
                source: Box::new(cause),
            }),
        }
    }
}

/// Inputs of one full-overlay transcode, all inside the job workspace except the source.
#[derive(Clone, Debug)]
pub struct OverlayJob {
    pub input: PathBuf,
    /// Rendered watermark PNG.
    pub overlay_asset: PathBuf,
    pub filter: OverlayFilter,
    pub output: PathBuf,
    pub map_audio: bool,
}

impl OverlayJob {
    pub fn to_request(&self, codec: &CodecSettings) -> TranscodeRequest {
        TranscodeRequest {
            input: self.input.clone(),
            overlay: self.overlay_asset.clone(),
            filter_complex: self.filter.to_filter_complex(),
            map_audio: self.map_audio,
            output: self.output.clone(),
            codec: codec.clone(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/video/job.rs"]
mod tests;
