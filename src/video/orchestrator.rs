use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::compose::image::{ImageCompositor, OutputFormat, encode};
use crate::config::Settings;
use crate::config::OverlayBox;
use crate::encode::ffmpeg::{FrameGrabber, Transcoder, VideoSourceInfo};
use crate::encode::filter::OverlayFilter;
use crate::foundation::core::Frame;
use crate::foundation::error::{OvermarkError, OvermarkResult};
use crate::geometry::resolver::{Placement, resolve};
use crate::model::watermark::Watermark;
use crate::render::surface::Surface;
use crate::video::clip::{ClipEncoder, ClipSynthesizer};
use crate::video::job::{JobStage, JobState, OutputTier, OverlayJob};
use crate::video::workspace::JobWorkspace;

/// External collaborators of the video pipeline.
#[derive(Clone)]
pub struct VideoBackends {
    pub transcoder: Arc<dyn Transcoder>,
    pub grabber: Arc<dyn FrameGrabber>,
    pub clip_encoder: Arc<dyn ClipEncoder>,
}

impl std::fmt::Debug for VideoBackends {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoBackends").finish_non_exhaustive()
    }
}

/// A finished video job.
#[derive(Clone, Debug)]
pub struct VideoOutput {
    /// MP4 bytes.
    pub bytes: Vec<u8>,
    pub tier: OutputTier,
    /// States visited, in order, ending with [`JobStage::Done`].
    pub trace: Vec<JobStage>,
}

/// Runs one video through full overlay, then single-frame fallback, then clip synthesis.
#[derive(Clone, Debug)]
pub struct VideoOverlayOrchestrator {
    backends: VideoBackends,
    compositor: ImageCompositor,
    clips: ClipSynthesizer,
    settings: Arc<Settings>,
}

/// Per-run inputs shared by every step.
struct JobInputs<'a> {
    input: &'a Path,
    watermark: &'a Watermark,
    workspace: &'a JobWorkspace,
    cancel: &'a CancellationToken,
}

impl VideoOverlayOrchestrator {
    pub fn new(backends: VideoBackends, compositor: ImageCompositor, settings: Arc<Settings>) -> Self {
        let clips = ClipSynthesizer::new(backends.clip_encoder.clone(), settings.clip_fps);
        Self {
            backends,
            compositor,
            clips,
            settings,
        }
    }

    /// Watermark the video at `input`.
    ///
    /// The job workspace is removed before this returns, whatever the outcome. A cancelled
    /// job fails with [`OvermarkError::Cancelled`] without trying further tiers.
    #[tracing::instrument(skip_all, fields(input = %input.display()))]
    pub async fn run(
        &self,
        input: &Path,
        watermark: &Watermark,
        cancel: &CancellationToken,
    ) -> OvermarkResult<VideoOutput> {
        let workspace = JobWorkspace::create(self.settings.scratch_dir.as_deref())?;
        let job = JobInputs {
            input,
            watermark,
            workspace: &workspace,
            cancel,
        };

        let mut trace = Vec::new();
        let mut state = JobState::FullOverlay;
        loop {
            trace.push(state.stage());
            state = match state {
                JobState::Done { bytes, tier } => {
                    tracing::info!(?tier, bytes = bytes.len(), "video job done");
                    return Ok(VideoOutput { bytes, tier, trace });
                }
                JobState::Failed(err) => {
                    tracing::warn!(%err, "video job failed");
                    return Err(err);
                }
                pending => self.step(pending, &job).await,
            };
        }
    }

    async fn step(&self, state: JobState, job: &JobInputs<'_>) -> JobState {
        let stage = state.stage();
        if job.cancel.is_cancelled() {
            return JobState::failed_at(stage, OvermarkError::Cancelled);
        }
        tracing::debug!(%stage, "entering stage");

        match state {
            JobState::FullOverlay => match self.full_overlay(job).await {
                Ok(bytes) => JobState::Done {
                    bytes,
                    tier: OutputTier::FullOverlay,
                },
                Err(OvermarkError::Cancelled) => JobState::Failed(OvermarkError::Cancelled),
                Err(cause) => {
                    tracing::warn!(%cause, "full overlay failed, falling back to single frame");
                    JobState::SingleFrameFallback { cause }
                }
            },
            JobState::SingleFrameFallback { cause } => {
                tracing::debug!(%cause, "single-frame fallback");
                match self.single_frame(job).await {
                    Ok(still) => JobState::ClipSynthesis { still },
                    Err(err) => JobState::failed_at(stage, err),
                }
            }
            JobState::ClipSynthesis { still } => match self.synthesize(still.bytes, job).await {
                Ok(bytes) => JobState::Done {
                    bytes,
                    tier: OutputTier::SynthesizedClip,
                },
                Err(err) => JobState::failed_at(stage, err),
            },
            terminal => terminal,
        }
    }

    async fn full_overlay(&self, job: &JobInputs<'_>) -> OvermarkResult<Vec<u8>> {
        let transcoder = &self.backends.transcoder;
        if !transcoder.is_available().await {
            return Err(OvermarkError::transcoder_unavailable(
                "ffmpeg/ffprobe could not be executed",
            ));
        }
        let info = transcoder.probe(job.input, job.cancel).await?;
        tracing::debug!(?info, "probed source video");

        let asset = self.overlay_asset(job.watermark, &info).await?;
        let overlay_job = OverlayJob {
            input: job.input.to_path_buf(),
            overlay_asset: job.workspace.write("watermark.png", &asset).await?,
            filter: OverlayFilter::for_watermark(job.watermark, &info),
            output: job.workspace.file("overlay.mp4"),
            map_audio: info.has_audio,
        };

        transcoder
            .transcode(&overlay_job.to_request(&self.settings.codec()), job.cancel)
            .await
    }

    /// Watermark rendered at full opacity onto a transparent square, as PNG bytes.
    ///
    /// The square is the placement box for this source, so the filter's `overlay_w` and
    /// `overlay_h` are the box size and the anchors line up with the still path. Opacity is
    /// applied later by the filter graph.
    async fn overlay_asset(
        &self,
        watermark: &Watermark,
        source: &VideoSourceInfo,
    ) -> OvermarkResult<Vec<u8>> {
        let renderer = self.compositor.renderer().clone();
        let watermark = watermark.clone().with_opacity(100);
        let side = overlay_side(source, &watermark, self.settings.overlay_box);

        blocking(move || {
            let mut surface = Surface::new(Frame::transparent(side, side)?);
            let placement = Placement {
                origin_x: 0.0,
                origin_y: 0.0,
                width: f64::from(side),
                height: f64::from(side),
            };
            renderer.render(&mut surface, &placement, &watermark)?;
            encode(&surface.into_frame(), OutputFormat::Png, 1.0)
        })
        .await
    }

    async fn single_frame(
        &self,
        job: &JobInputs<'_>,
    ) -> OvermarkResult<crate::compose::image::EncodedImage> {
        let frame = self.backends.grabber.first_frame(job.input, job.cancel).await?;

        let compositor = self.compositor.clone();
        let watermark = job.watermark.clone();
        let quality = self.settings.jpeg_quality;
        blocking(move || compositor.compose_frame(frame, &watermark, quality)).await
    }

    async fn synthesize(&self, still: Vec<u8>, job: &JobInputs<'_>) -> OvermarkResult<Vec<u8>> {
        let clips = self.clips.clone();
        let duration = self.settings.clip_duration_secs;
        let output = job.workspace.file("clip.mp4");
        let cancel = job.cancel.clone();

        blocking(move || clips.synthesize(&still, duration, &output, &cancel))
            .await
            .map_err(|e| match e {
                OvermarkError::Cancelled | OvermarkError::ClipSynthesis(_) => e,
                other => OvermarkError::clip_synthesis(other.to_string()),
            })
    }
}

/// Side of the square overlay raster: the placement size on `source`, capped by the longer
/// side of `bx`. The filter scales it up to the placement width when capped.
fn overlay_side(source: &VideoSourceInfo, watermark: &Watermark, bx: OverlayBox) -> u32 {
    let placement = resolve(
        source.width,
        source.height,
        watermark.size(),
        watermark.position(),
    );
    let cap = bx.width.max(bx.height).max(1);
    placement.to_pixel_rect().width.min(cap)
}

async fn blocking<T, F>(f: F) -> OvermarkResult<T>
where
    F: FnOnce() -> OvermarkResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| OvermarkError::Other(anyhow::anyhow!("blocking task failed: {e}")))?
}

#[cfg(test)]
#[path = "../../tests/unit/video/orchestrator.rs"]
mod tests;
