use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

use overmark::{
    BatchContext, BatchProgress, FileOutcome, MediaInput, Position, ProgressOutcome, Settings, SizeClass,
    Watermark,
};

#[derive(Parser, Debug)]
#[command(name = "overmark", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Watermark image and video files.
    Apply(ApplyArgs),
    /// Print the watermark placement for a frame size as JSON.
    Place(PlaceArgs),
}

#[derive(Args, Debug)]
#[group(id = "source", required = true, multiple = false)]
struct SourceArgs {
    /// Watermark preset JSON (`{type, content, size, position, opacity}`).
    #[arg(long)]
    watermark: Option<PathBuf>,

    /// Text watermark.
    #[arg(long)]
    text: Option<String>,

    /// Image watermark file (PNG, JPEG, WebP).
    #[arg(long)]
    image: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct ApplyArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Size class: small, medium or large. Overrides the preset file.
    #[arg(long)]
    size: Option<String>,

    /// Position: top-left, top-right, bottom-left, bottom-right or center. Overrides the preset file.
    #[arg(long)]
    position: Option<String>,

    /// Opacity percent, clamped to 0..=100. Overrides the preset file.
    #[arg(long, allow_hyphen_values = true)]
    opacity: Option<i64>,

    /// Settings JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// JPEG quality in [0, 1]. Overrides the settings file.
    #[arg(long)]
    quality: Option<f32>,

    /// Output directory.
    #[arg(long)]
    out: PathBuf,

    /// Input files.
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[derive(Parser, Debug)]
struct PlaceArgs {
    #[arg(long)]
    width: u32,

    #[arg(long)]
    height: u32,

    #[arg(long, default_value = "medium")]
    size: String,

    #[arg(long, default_value = "bottom-right")]
    position: String,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Apply(args) => {
            let runtime = tokio::runtime::Runtime::new().context("start tokio runtime")?;
            runtime.block_on(cmd_apply(args))
        }
        Command::Place(args) => cmd_place(args),
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "overmark=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_watermark(args: &ApplyArgs) -> anyhow::Result<Watermark> {
    let src = &args.source;
    let mut wm = if let Some(path) = &src.watermark {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read preset '{}'", path.display()))?;
        Watermark::from_preset_json(&json)?
    } else if let Some(text) = &src.text {
        Watermark::text(text.as_str())?
    } else if let Some(path) = &src.image {
        let bytes =
            std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
        Watermark::image(bytes)?
    } else {
        anyhow::bail!("one of --watermark, --text or --image is required");
    };

    if let Some(size) = &args.size {
        wm = wm.with_size(SizeClass::parse_lenient(size));
    }
    if let Some(position) = &args.position {
        wm = wm.with_position(Position::parse_lenient(position));
    }
    if let Some(opacity) = args.opacity {
        wm = wm.with_opacity(opacity);
    }
    Ok(wm)
}

fn load_settings(args: &ApplyArgs) -> anyhow::Result<Settings> {
    let mut settings = match &args.config {
        Some(path) => Settings::from_json_file(path)?,
        None => Settings::default(),
    };
    if let Some(q) = args.quality {
        settings.jpeg_quality = q;
    }
    settings.validate()?;
    Ok(settings)
}

async fn cmd_apply(args: ApplyArgs) -> anyhow::Result<()> {
    let watermark = load_watermark(&args)?;
    let settings = load_settings(&args)?;
    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("create output dir '{}'", args.out.display()))?;

    let ctx = Arc::new(BatchContext::from_settings(watermark, settings));
    let cancel = ctx.cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling batch");
            cancel.cancel();
        }
    });

    let (tx, rx) = mpsc::channel(16);
    let reporter = tokio::spawn(report_progress(rx));
    let inputs = args.files.iter().map(MediaInput::from_path).collect();
    let outcomes = overmark::process_batch(ctx, inputs, Some(tx)).await;
    reporter.await.context("progress reporter")?;

    let failed = write_outputs(&args.out, outcomes);
    if failed > 0 {
        anyhow::bail!("{failed} file(s) failed");
    }
    Ok(())
}

/// Write every successful outcome into `dir` and report failures on stderr.
///
/// Returns the number of files that failed, counting write errors. A failed write does not stop
/// the remaining files.
fn write_outputs(dir: &Path, outcomes: Vec<FileOutcome>) -> usize {
    let mut failed = 0usize;
    for outcome in outcomes {
        match outcome.result {
            Ok(out) => {
                let dest = unique_path(dir, &out.file_name);
                match std::fs::write(&dest, &out.bytes) {
                    Ok(()) => println!("{}", dest.display()),
                    Err(err) => {
                        failed += 1;
                        eprintln!("{}: write '{}': {err}", outcome.name, dest.display());
                    }
                }
            }
            Err(err) => {
                failed += 1;
                eprintln!("{}: {err}", outcome.name);
            }
        }
    }
    failed
}

async fn report_progress(mut rx: mpsc::Receiver<BatchProgress>) {
    while let Some(ev) = rx.recv().await {
        match ev.outcome {
            ProgressOutcome::Succeeded { output_name } => {
                tracing::info!(
                    "[{}/{}] {} -> {}",
                    ev.completed,
                    ev.total,
                    ev.file,
                    output_name
                );
            }
            ProgressOutcome::Failed { message } => {
                tracing::warn!("[{}/{}] {} failed: {}", ev.completed, ev.total, ev.file, message);
            }
        }
    }
}

/// `dir/name`, or `dir/stem-N.ext` when that already exists.
fn unique_path(dir: &Path, name: &str) -> PathBuf {
    let first = dir.join(name);
    if !first.exists() {
        return first;
    }
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) => (stem, format!(".{ext}")),
        None => (name, String::new()),
    };
    (1..)
        .map(|n| dir.join(format!("{stem}-{n}{ext}")))
        .find(|p| !p.exists())
        .unwrap_or(first)
}

fn cmd_place(args: PlaceArgs) -> anyhow::Result<()> {
    let placement = overmark::resolve_keys(args.width, args.height, &args.size, &args.position);
    let json = serde_json::to_string_pretty(&placement).context("serialize placement")?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/bin/overmark.rs"]
mod tests;
