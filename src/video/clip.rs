use std::io::{Read, Write as _};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::assets::decode::decode_frame;
use crate::encode::ffmpeg::{CodecSettings, spawn_error};
use crate::foundation::core::Frame;
use crate::foundation::error::{OvermarkError, OvermarkResult};

/// Default synthetic clip frame rate.
pub const DEFAULT_FPS: u32 = 25;
/// Default synthetic clip length.
pub const DEFAULT_DURATION_SECS: u32 = 3;

/// Configuration handed to a [`ClipSink`] before the first frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClipConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

/// Capture surface for a clip. Only a primed surface can be pushed to a sink.
#[derive(Debug)]
pub struct CaptureSurface {
    width: u32,
    height: u32,
}

impl CaptureSurface {
    /// Surface for `width x height` content, padded up to even dimensions.
    pub fn new(width: u32, height: u32) -> OvermarkResult<Self> {
        if width == 0 || height == 0 {
            return Err(OvermarkError::validation("capture surface must be non-empty"));
        }
        Ok(Self {
            width: width + width % 2,
            height: height + height % 2,
        })
    }

    /// Draw `still` onto the surface, flattened over black.
    ///
    /// Padding rows and columns repeat the nearest edge pixel.
    pub fn prime(self, still: &Frame) -> OvermarkResult<PrimedCapture> {
        if still.width > self.width || still.height > self.height {
            return Err(OvermarkError::validation(format!(
                "still {}x{} does not fit capture surface {}x{}",
                still.width, still.height, self.width, self.height
            )));
        }

        let rgb = still.flatten_to_rgb8([0, 0, 0]);
        let (sw, sh) = (still.width as usize, still.height as usize);
        let mut rgba = Vec::with_capacity(self.width as usize * self.height as usize * 4);
        for y in 0..self.height as usize {
            let sy = y.min(sh - 1);
            for x in 0..self.width as usize {
                let s = (sy * sw + x.min(sw - 1)) * 3;
                rgba.extend_from_slice(&[rgb[s], rgb[s + 1], rgb[s + 2], 255]);
            }
        }

        Ok(PrimedCapture {
            width: self.width,
            height: self.height,
            rgba,
        })
    }
}

/// Opaque, even-sized RGBA8 frame ready for a [`ClipSink`].
#[derive(Clone, Debug)]
pub struct PrimedCapture {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl PrimedCapture {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }
}

/// Sink contract for clip frames.
///
/// `begin` once, then `push_frame` with strictly increasing indices, then `end` once.
pub trait ClipSink: Send {
    fn begin(&mut self, cfg: ClipConfig) -> OvermarkResult<()>;
    fn push_frame(&mut self, idx: u64, frame: &PrimedCapture) -> OvermarkResult<()>;
    fn end(&mut self) -> OvermarkResult<()>;
}

/// Opens a [`ClipSink`] that writes an MP4 to a given path.
pub trait ClipEncoder: Send + Sync {
    fn open(&self, output: &Path) -> OvermarkResult<Box<dyn ClipSink>>;
}

/// [`ClipEncoder`] backed by the system `ffmpeg`.
#[derive(Clone, Debug)]
pub struct FfmpegClipEncoder {
    ffmpeg_bin: PathBuf,
    codec: CodecSettings,
}

impl FfmpegClipEncoder {
    pub fn new(ffmpeg_bin: impl Into<PathBuf>, codec: CodecSettings) -> Self {
        Self {
            ffmpeg_bin: ffmpeg_bin.into(),
            codec,
        }
    }
}

impl Default for FfmpegClipEncoder {
    fn default() -> Self {
        Self::new("ffmpeg", CodecSettings::default())
    }
}

impl ClipEncoder for FfmpegClipEncoder {
    fn open(&self, output: &Path) -> OvermarkResult<Box<dyn ClipSink>> {
        Ok(Box::new(FfmpegClipSink {
            ffmpeg_bin: self.ffmpeg_bin.clone(),
            codec: self.codec.clone(),
            out_path: output.to_path_buf(),
            child: None,
            stdin: None,
            stderr_drain: None,
            cfg: None,
            last_idx: None,
        }))
    }
}

/// Streams raw RGBA frames into `ffmpeg` and produces a silent H.264 MP4.
pub struct FfmpegClipSink {
    ffmpeg_bin: PathBuf,
    codec: CodecSettings,
    out_path: PathBuf,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,
    cfg: Option<ClipConfig>,
    last_idx: Option<u64>,
}

impl ClipSink for FfmpegClipSink {
    fn begin(&mut self, cfg: ClipConfig) -> OvermarkResult<()> {
        if cfg.fps == 0 {
            return Err(OvermarkError::validation("clip fps must be non-zero"));
        }
        if cfg.width == 0
            || cfg.height == 0
            || !cfg.width.is_multiple_of(2)
            || !cfg.height.is_multiple_of(2)
        {
            return Err(OvermarkError::validation(
                "clip width/height must be even and non-zero (yuv420p output)",
            ));
        }

        let mut cmd = Command::new(&self.ffmpeg_bin);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .args([
                "-y",
                "-loglevel",
                "error",
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgba",
                "-s",
                &format!("{}x{}", cfg.width, cfg.height),
                "-r",
                &cfg.fps.to_string(),
                "-i",
                "pipe:0",
                "-an",
                "-c:v",
                "libx264",
                "-preset",
                &self.codec.preset,
                "-crf",
                &self.codec.crf.to_string(),
                "-pix_fmt",
                "yuv420p",
                "-movflags",
                "+faststart",
            ])
            .arg(&self.out_path);
        tracing::debug!(command = ?cmd, "spawning ffmpeg clip encoder");

        let mut child = cmd.spawn().map_err(|e| spawn_error("ffmpeg clip encoder", &e))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| OvermarkError::clip_synthesis("failed to open ffmpeg stdin"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| OvermarkError::clip_synthesis("failed to open ffmpeg stderr"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut buf = Vec::new();
            stderr.read_to_end(&mut buf)?;
            Ok(buf)
        });

        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: u64, frame: &PrimedCapture) -> OvermarkResult<()> {
        let cfg = self
            .cfg
            .ok_or_else(|| OvermarkError::clip_synthesis("clip sink not started"))?;
        if self.last_idx.is_some_and(|last| idx <= last) {
            return Err(OvermarkError::clip_synthesis(
                "clip sink received out-of-order frame index",
            ));
        }
        self.last_idx = Some(idx);

        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(OvermarkError::validation(format!(
                "clip frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| OvermarkError::clip_synthesis("clip sink is already finalized"))?;
        stdin
            .write_all(&frame.rgba)
            .map_err(|e| OvermarkError::clip_synthesis(format!("write frame to ffmpeg: {e}")))
    }

    fn end(&mut self) -> OvermarkResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| OvermarkError::clip_synthesis("clip sink not started"))?;
        let status = child
            .wait()
            .map_err(|e| OvermarkError::clip_synthesis(format!("wait for ffmpeg: {e}")))?;
        let stderr = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| OvermarkError::clip_synthesis("ffmpeg stderr drain panicked"))?
                .unwrap_or_default(),
            None => Vec::new(),
        };
        self.cfg = None;

        if !status.success() {
            return Err(OvermarkError::clip_synthesis(format!(
                "ffmpeg exited with status {status}: {}",
                String::from_utf8_lossy(&stderr).trim()
            )));
        }
        Ok(())
    }
}

impl Drop for FfmpegClipSink {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Turns a watermarked still into a fixed-duration silent clip.
#[derive(Clone)]
pub struct ClipSynthesizer {
    encoder: Arc<dyn ClipEncoder>,
    fps: u32,
}

impl std::fmt::Debug for ClipSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClipSynthesizer")
            .field("fps", &self.fps)
            .finish_non_exhaustive()
    }
}

impl ClipSynthesizer {
    pub fn new(encoder: Arc<dyn ClipEncoder>, fps: u32) -> Self {
        Self { encoder, fps }
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Encode `still` (any decodable image) as an MP4 of `duration_secs` at `output`.
    ///
    /// Blocking. Returns the MP4 bytes. Every failure except cancellation is
    /// [`OvermarkError::ClipSynthesis`].
    pub fn synthesize(
        &self,
        still: &[u8],
        duration_secs: u32,
        output: &Path,
        cancel: &CancellationToken,
    ) -> OvermarkResult<Vec<u8>> {
        self.synthesize_inner(still, duration_secs, output, cancel)
            .map_err(|e| match e {
                OvermarkError::Cancelled | OvermarkError::ClipSynthesis(_) => e,
                other => OvermarkError::clip_synthesis(other.to_string()),
            })
    }

    fn synthesize_inner(
        &self,
        still: &[u8],
        duration_secs: u32,
        output: &Path,
        cancel: &CancellationToken,
    ) -> OvermarkResult<Vec<u8>> {
        let frame_count = u64::from(self.fps) * u64::from(duration_secs);
        if frame_count == 0 {
            return Err(OvermarkError::validation("clip must have at least one frame"));
        }

        let frame = decode_frame(still)?;
        let primed = CaptureSurface::new(frame.width, frame.height)?.prime(&frame)?;

        let mut sink = self.encoder.open(output)?;
        sink.begin(ClipConfig {
            width: primed.width(),
            height: primed.height(),
            fps: self.fps,
        })?;
        for idx in 0..frame_count {
            if cancel.is_cancelled() {
                return Err(OvermarkError::Cancelled);
            }
            sink.push_frame(idx, &primed)?;
        }
        sink.end()?;
        drop(sink);

        let bytes = std::fs::read(output).map_err(|e| {
            OvermarkError::clip_synthesis(format!("read clip '{}': {e}", output.display()))
        })?;
        if bytes.is_empty() {
            return Err(OvermarkError::clip_synthesis("clip encoder produced no bytes"));
        }
        tracing::debug!(frames = frame_count, bytes = bytes.len(), "synthesized clip");
        Ok(bytes)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/video/clip.rs"]
mod tests;
