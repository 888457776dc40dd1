use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tokio::io::AsyncReadExt as _;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::assets::media::{MediaKind, classify, extension_of, output_file_name};
use crate::compose::image::ImageCompositor;
use crate::config::Settings;
use crate::foundation::error::{OvermarkError, OvermarkResult};
use crate::model::watermark::Watermark;
use crate::render::watermark::WatermarkRenderer;
use crate::video::job::OutputTier;
use crate::video::orchestrator::{VideoBackends, VideoOverlayOrchestrator};

const SNIFF_LEN: u64 = 64;

/// Where an input file's bytes come from.
#[derive(Clone, Debug)]
pub enum MediaSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

/// One file submitted for watermarking.
#[derive(Clone, Debug)]
pub struct MediaInput {
    /// Original file name, used for classification fallback and the output name.
    pub name: String,
    pub source: MediaSource,
}

impl MediaInput {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name,
            source: MediaSource::Path(path),
        }
    }

    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            source: MediaSource::Bytes(bytes),
        }
    }
}

/// A watermarked file ready for download.
#[derive(Clone, Debug)]
pub struct MediaOutput {
    /// Suggested download name, `watermarked_<stem>.<ext>`.
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
    pub kind: MediaKind,
    /// Image inputs only: the watermark asset failed and a placeholder was drawn.
    pub placeholder_used: bool,
    /// Video inputs only: which tier produced the output.
    pub video_tier: Option<OutputTier>,
}

/// Final result for one input file.
#[derive(Debug)]
pub struct FileOutcome {
    pub name: String,
    pub result: OvermarkResult<MediaOutput>,
}

/// Per-file progress event, sent once per completed file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchProgress {
    pub completed: usize,
    pub total: usize,
    pub file: String,
    pub outcome: ProgressOutcome,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProgressOutcome {
    Succeeded { output_name: String },
    /// User-facing error text.
    Failed { message: String },
}

/// State shared read-only by every job of one batch.
#[derive(Debug)]
pub struct BatchContext {
    pub watermark: Watermark,
    pub settings: Arc<Settings>,
    pub cancel: CancellationToken,
    compositor: ImageCompositor,
    videos: VideoOverlayOrchestrator,
}

impl BatchContext {
    pub fn new(watermark: Watermark, settings: Settings, backends: VideoBackends) -> Self {
        let renderer = WatermarkRenderer::new(settings.font_set());
        Self::with_renderer(watermark, settings, backends, renderer)
    }

    /// Context using the system `ffmpeg` backends named in `settings`.
    pub fn from_settings(watermark: Watermark, settings: Settings) -> Self {
        let backends = settings.ffmpeg_backends();
        Self::new(watermark, settings, backends)
    }

    pub fn with_renderer(
        watermark: Watermark,
        settings: Settings,
        backends: VideoBackends,
        renderer: WatermarkRenderer,
    ) -> Self {
        let settings = Arc::new(settings);
        let compositor = ImageCompositor::new(renderer);
        let videos = VideoOverlayOrchestrator::new(backends, compositor.clone(), settings.clone());
        Self {
            watermark,
            settings,
            cancel: CancellationToken::new(),
            compositor,
            videos,
        }
    }

    /// Abort every unfinished file of the batch.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

/// Watermark every input concurrently.
///
/// Returns one outcome per input, in input order. One file's failure never affects another.
#[tracing::instrument(skip_all, fields(total = inputs.len()))]
pub async fn process_batch(
    ctx: Arc<BatchContext>,
    inputs: Vec<MediaInput>,
    progress: Option<mpsc::Sender<BatchProgress>>,
) -> Vec<FileOutcome> {
    let total = inputs.len();
    let permits = Arc::new(Semaphore::new(ctx.settings.max_concurrent_jobs));
    let mut set = JoinSet::new();
    let names: Vec<String> = inputs.iter().map(|i| i.name.clone()).collect();
    let mut task_index = HashMap::with_capacity(total);

    for (idx, input) in inputs.into_iter().enumerate() {
        let ctx = ctx.clone();
        let permits = permits.clone();
        let handle = set.spawn(async move {
            let result = tokio::select! {
                biased;
                _ = ctx.cancel.cancelled() => Err(OvermarkError::Cancelled),
                permit = permits.acquire_owned() => match permit {
                    Ok(_permit) => process_file(&ctx, input).await,
                    Err(_) => Err(OvermarkError::Cancelled),
                },
            };
            (idx, result)
        });
        task_index.insert(handle.id(), idx);
    }

    let mut slots: Vec<Option<FileOutcome>> = (0..total).map(|_| None).collect();
    let mut completed = 0usize;
    while let Some(joined) = set.join_next_with_id().await {
        let (idx, result) = match joined {
            Ok((_, (idx, result))) => (idx, result),
            Err(err) => {
                let Some(&idx) = task_index.get(&err.id()) else {
                    continue;
                };
                let cause = anyhow::anyhow!("file task aborted: {err}");
                (idx, Err(OvermarkError::Other(cause)))
            }
        };
        let name = names[idx].clone();
        completed += 1;

        let outcome = match &result {
            Ok(out) => {
                tracing::info!(file = %name, output = %out.file_name, "file done");
                ProgressOutcome::Succeeded {
                    output_name: out.file_name.clone(),
                }
            }
            Err(err) => {
                tracing::warn!(file = %name, %err, "file failed");
                ProgressOutcome::Failed {
                    message: err.to_string(),
                }
            }
        };
        if let Some(tx) = &progress {
            let event = BatchProgress {
                completed,
                total,
                file: name.clone(),
                outcome,
            };
            if tx.send(event).await.is_err() {
                tracing::debug!("progress receiver dropped");
            }
        }
        slots[idx] = Some(FileOutcome { name, result });
    }

    slots.into_iter().flatten().collect()
}

/// Watermark one file: classify it, then run the image or video pipeline.
pub async fn process_file(ctx: &Arc<BatchContext>, input: MediaInput) -> OvermarkResult<MediaOutput> {
    if ctx.cancel.is_cancelled() {
        return Err(OvermarkError::Cancelled);
    }

    let kind = match &input.source {
        MediaSource::Bytes(bytes) => classify(&input.name, bytes)?,
        MediaSource::Path(path) => classify(&input.name, &read_head(path).await?)?,
    };
    tracing::debug!(file = %input.name, ?kind, "classified input");

    match kind {
        MediaKind::Image => process_image(ctx, input).await,
        MediaKind::Video => process_video(ctx, input).await,
    }
}

async fn process_image(ctx: &Arc<BatchContext>, input: MediaInput) -> OvermarkResult<MediaOutput> {
    let bytes = match input.source {
        MediaSource::Bytes(bytes) => bytes,
        MediaSource::Path(path) => read_source(&path).await?,
    };

    let job = ctx.clone();
    let encoded = tokio::task::spawn_blocking(move || {
        job.compositor
            .compose(&bytes, &job.watermark, job.settings.jpeg_quality)
    })
    .await
    .map_err(|e| OvermarkError::Other(anyhow::anyhow!("image task failed: {e}")))??;

    if encoded.placeholder_used {
        tracing::warn!(file = %input.name, "watermark asset unusable, placeholder drawn");
    }
    Ok(MediaOutput {
        file_name: output_file_name(&input.name, encoded.format.extension()),
        content_type: encoded.format.content_type(),
        bytes: encoded.bytes,
        kind: MediaKind::Image,
        placeholder_used: encoded.placeholder_used,
        video_tier: None,
    })
}

async fn process_video(ctx: &Arc<BatchContext>, input: MediaInput) -> OvermarkResult<MediaOutput> {
    // In-memory sources are staged to disk for the transcoder; the file goes away on drop.
    let staged;
    let path: &Path = match &input.source {
        MediaSource::Path(path) => path,
        MediaSource::Bytes(bytes) => {
            staged = stage_bytes(&ctx.settings, &input.name, bytes)?;
            staged.path()
        }
    };

    let out = ctx.videos.run(path, &ctx.watermark, &ctx.cancel).await?;
    Ok(MediaOutput {
        file_name: output_file_name(&input.name, "mp4"),
        content_type: "video/mp4",
        bytes: out.bytes,
        kind: MediaKind::Video,
        placeholder_used: false,
        video_tier: Some(out.tier),
    })
}

fn stage_bytes(
    settings: &Settings,
    name: &str,
    bytes: &[u8],
) -> OvermarkResult<tempfile::NamedTempFile> {
    use std::io::Write as _;

    let suffix = extension_of(name)
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();
    let mut builder = tempfile::Builder::new();
    builder.prefix("overmark-src-").suffix(&suffix);
    let mut file = match &settings.scratch_dir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    }
    .context("stage video source")?;
    file.write_all(bytes).context("write staged video source")?;
    Ok(file)
}

async fn read_head(path: &Path) -> OvermarkResult<Vec<u8>> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|e| OvermarkError::decode(format!("open '{}': {e}", path.display())))?;
    let mut head = Vec::with_capacity(SNIFF_LEN as usize);
    file.take(SNIFF_LEN)
        .read_to_end(&mut head)
        .await
        .map_err(|e| OvermarkError::decode(format!("read '{}': {e}", path.display())))?;
    Ok(head)
}

async fn read_source(path: &Path) -> OvermarkResult<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|e| OvermarkError::decode(format!("read '{}': {e}", path.display())))
}

#[cfg(test)]
#[path = "../../tests/unit/batch/mod.rs"]
mod tests;
