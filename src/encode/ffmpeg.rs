use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::assets::decode::decode_frame;
use crate::foundation::core::Frame;
use crate::foundation::error::{OvermarkError, OvermarkResult};

/// Basic metadata about a source video.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoSourceInfo {
    pub width: u32,
    pub height: u32,
    /// Container duration, when ffprobe reports one.
    pub duration_secs: Option<f64>,
    /// Whether at least one audio stream is present.
    pub has_audio: bool,
}

/// H.264 encoder knobs shared by the overlay and clip paths.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodecSettings {
    pub preset: String,
    pub crf: u8,
}

impl Default for CodecSettings {
    fn default() -> Self {
        Self {
            preset: "veryfast".to_owned(),
            crf: 23,
        }
    }
}

/// One full-overlay transcode: source video plus watermark asset in, MP4 out.
#[derive(Clone, Debug)]
pub struct TranscodeRequest {
    pub input: PathBuf,
    pub overlay: PathBuf,
    pub filter_complex: String,
    /// Map the source audio track, re-encoded as AAC.
    pub map_audio: bool,
    pub output: PathBuf,
    pub codec: CodecSettings,
}

/// External per-frame video transcoder.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Whether the transcoder binaries can be executed at all.
    async fn is_available(&self) -> bool;

    async fn probe(&self, input: &Path, cancel: &CancellationToken)
    -> OvermarkResult<VideoSourceInfo>;

    /// Run the overlay and return the encoded MP4 bytes.
    async fn transcode(
        &self,
        request: &TranscodeRequest,
        cancel: &CancellationToken,
    ) -> OvermarkResult<Vec<u8>>;
}

/// Extracts a still from a video.
#[async_trait]
pub trait FrameGrabber: Send + Sync {
    /// First decodable frame of `input`.
    ///
    /// Failures are decode errors, except cancellation and a missing decoder binary
    /// ([`OvermarkError::TranscoderUnavailable`]), which pass through.
    async fn first_frame(&self, input: &Path, cancel: &CancellationToken) -> OvermarkResult<Frame>;
}

/// System `ffmpeg`/`ffprobe` backend.
#[derive(Clone, Debug)]
pub struct FfmpegTranscoder {
    ffmpeg_bin: PathBuf,
    ffprobe_bin: PathBuf,
}

impl FfmpegTranscoder {
    pub fn new(ffmpeg_bin: impl Into<PathBuf>, ffprobe_bin: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_bin: ffmpeg_bin.into(),
            ffprobe_bin: ffprobe_bin.into(),
        }
    }

    pub fn ffmpeg_bin(&self) -> &Path {
        &self.ffmpeg_bin
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn is_available(&self) -> bool {
        binary_runs(&self.ffmpeg_bin).await && binary_runs(&self.ffprobe_bin).await
    }

    async fn probe(
        &self,
        input: &Path,
        cancel: &CancellationToken,
    ) -> OvermarkResult<VideoSourceInfo> {
        probe_video(&self.ffprobe_bin, input, cancel).await
    }

    #[tracing::instrument(level = "debug", skip_all, fields(input = %request.input.display()))]
    async fn transcode(
        &self,
        request: &TranscodeRequest,
        cancel: &CancellationToken,
    ) -> OvermarkResult<Vec<u8>> {
        let mut cmd = tokio::process::Command::new(&self.ffmpeg_bin);
        cmd.args(["-y", "-v", "error", "-i"])
            .arg(&request.input)
            .arg("-i")
            .arg(&request.overlay)
            .args(["-filter_complex", &request.filter_complex])
            .args(["-map", crate::encode::filter::OUTPUT_LABEL]);
        if request.map_audio {
            cmd.args(["-map", "0:a?", "-c:a", "aac", "-b:a", "128k"]);
        } else {
            cmd.arg("-an");
        }
        cmd.args([
            "-c:v",
            "libx264",
            "-preset",
            &request.codec.preset,
            "-crf",
            &request.codec.crf.to_string(),
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ])
        .arg(&request.output);

        let out = run_to_completion(cmd, "ffmpeg overlay", cancel).await?;
        ensure_success(&out, "ffmpeg overlay")?;

        let bytes = tokio::fs::read(&request.output).await.map_err(|e| {
            OvermarkError::transcoder(format!(
                "read overlay output '{}': {e}",
                request.output.display()
            ))
        })?;
        if bytes.is_empty() {
            return Err(OvermarkError::transcoder("ffmpeg produced an empty output file"));
        }
        Ok(bytes)
    }
}

/// First-frame extraction through `ffmpeg` PNG output.
///
/// ffmpeg applies the stream's display rotation before encoding, so the decoded PNG carries
/// the displayed dimensions.
#[derive(Clone, Debug)]
pub struct FfmpegFrameGrabber {
    ffmpeg_bin: PathBuf,
}

impl FfmpegFrameGrabber {
    pub fn new(ffmpeg_bin: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_bin: ffmpeg_bin.into(),
        }
    }
}

impl Default for FfmpegFrameGrabber {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

#[async_trait]
impl FrameGrabber for FfmpegFrameGrabber {
    #[tracing::instrument(level = "debug", skip_all, fields(input = %input.display()))]
    async fn first_frame(&self, input: &Path, cancel: &CancellationToken) -> OvermarkResult<Frame> {
        let as_decode = |e: OvermarkError| match e {
            OvermarkError::Cancelled
            | OvermarkError::Decode(_)
            | OvermarkError::TranscoderUnavailable(_) => e,
            other => OvermarkError::decode(format!("first frame: {other}")),
        };

        let len = tokio::fs::metadata(input)
            .await
            .map_err(|e| OvermarkError::decode(format!("stat '{}': {e}", input.display())))?
            .len();
        if len == 0 {
            return Err(OvermarkError::decode("source video is empty"));
        }

        let mut cmd = tokio::process::Command::new(&self.ffmpeg_bin);
        cmd.args(["-v", "error", "-i"])
            .arg(input)
            .args(["-frames:v", "1", "-c:v", "png", "-f", "image2pipe", "pipe:1"]);
        let out = run_to_completion(cmd, "ffmpeg frame decode", cancel)
            .await
            .map_err(as_decode)?;
        ensure_success(&out, "ffmpeg frame decode").map_err(as_decode)?;

        if out.stdout.is_empty() {
            return Err(OvermarkError::decode("ffmpeg decoded no video frame"));
        }
        decode_frame(&out.stdout)
    }
}

/// Probe a video through `ffprobe` JSON output.
pub async fn probe_video(
    ffprobe_bin: &Path,
    input: &Path,
    cancel: &CancellationToken,
) -> OvermarkResult<VideoSourceInfo> {
    let mut cmd = tokio::process::Command::new(ffprobe_bin);
    cmd.args([
        "-v",
        "error",
        "-print_format",
        "json",
        "-show_streams",
        "-show_format",
    ])
    .arg(input);

    let out = run_to_completion(cmd, "ffprobe", cancel).await?;
    ensure_success(&out, "ffprobe")?;
    parse_probe_json(&out.stdout)
}

/// Parse `ffprobe -print_format json -show_streams -show_format` output.
pub fn parse_probe_json(stdout: &[u8]) -> OvermarkResult<VideoSourceInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeSideData {
        rotation: Option<f64>,
    }
    #[derive(serde::Deserialize, Default)]
    struct ProbeTags {
        rotate: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        #[serde(default)]
        side_data_list: Vec<ProbeSideData>,
        #[serde(default)]
        tags: ProbeTags,
    }
    #[derive(serde::Deserialize, Default)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        #[serde(default)]
        streams: Vec<ProbeStream>,
        #[serde(default)]
        format: ProbeFormat,
    }

    let parsed: ProbeOut = serde_json::from_slice(stdout)
        .map_err(|e| OvermarkError::transcoder(format!("ffprobe json parse failed: {e}")))?;

    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| OvermarkError::transcoder("no video stream found"))?;
    let (width, height) = match (video.width, video.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => {
            return Err(OvermarkError::transcoder(
                "ffprobe reported no usable video dimensions",
            ));
        }
    };
    // ffmpeg auto-rotates on decode; report the displayed size.
    let rotation = video
        .side_data_list
        .iter()
        .find_map(|sd| sd.rotation)
        .or_else(|| video.tags.rotate.as_deref().and_then(|r| r.trim().parse().ok()))
        .unwrap_or(0.0);
    let (width, height) = if (rotation.round() as i64).rem_euclid(180) == 90 {
        (height, width)
    } else {
        (width, height)
    };

    Ok(VideoSourceInfo {
        width,
        height,
        duration_secs: parsed
            .format
            .duration
            .as_deref()
            .and_then(|d| d.trim().parse::<f64>().ok())
            .filter(|d| d.is_finite() && *d > 0.0),
        has_audio: parsed
            .streams
            .iter()
            .any(|s| s.codec_type.as_deref() == Some("audio")),
    })
}

/// Spawn `cmd` and wait for it, killing the child if `cancel` fires first.
pub(crate) async fn run_to_completion(
    mut cmd: tokio::process::Command,
    what: &str,
    cancel: &CancellationToken,
) -> OvermarkResult<Output> {
    if cancel.is_cancelled() {
        return Err(OvermarkError::Cancelled);
    }
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    tracing::debug!(command = ?cmd.as_std(), "spawning {what}");

    let child = cmd.spawn().map_err(|e| spawn_error(what, &e))?;
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(OvermarkError::Cancelled),
        out = child.wait_with_output() => {
            out.map_err(|e| OvermarkError::transcoder(format!("wait for {what}: {e}")))
        }
    }
}

pub(crate) fn spawn_error(what: &str, err: &std::io::Error) -> OvermarkError {
    if err.kind() == std::io::ErrorKind::NotFound {
        OvermarkError::transcoder_unavailable(format!("{what}: binary not found ({err})"))
    } else {
        OvermarkError::transcoder(format!("failed to spawn {what}: {err}"))
    }
}

fn ensure_success(out: &Output, what: &str) -> OvermarkResult<()> {
    if out.status.success() {
        return Ok(());
    }
    Err(OvermarkError::transcoder(format!(
        "{what} exited with status {}: {}",
        out.status,
        String::from_utf8_lossy(&out.stderr).trim()
    )))
}

async fn binary_runs(bin: &Path) -> bool {
    tokio::process::Command::new(bin)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Blocking check that both `ffmpeg` and `ffprobe` run from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    ["ffmpeg", "ffprobe"].iter().all(|bin| {
        std::process::Command::new(bin)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    })
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
