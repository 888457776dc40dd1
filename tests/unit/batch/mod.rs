use std::io::Cursor;

use super::*;
use crate::render::svg::FontSet;

fn png(w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba([30, 60, 90, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn context(settings: Settings) -> Arc<BatchContext> {
    let watermark = Watermark::image(png(2, 2)).unwrap();
    let backends = settings.ffmpeg_backends();
    Arc::new(BatchContext::with_renderer(
        watermark,
        settings,
        backends,
        WatermarkRenderer::new(FontSet::empty()),
    ))
}

#[tokio::test]
async fn outcomes_follow_input_order_and_isolate_failures() {
    let ctx = context(Settings {
        max_concurrent_jobs: 2,
        ..Settings::default()
    });
    let inputs = vec![
        MediaInput::from_bytes("a.png", png(20, 10)),
        MediaInput::from_bytes("broken.jpg", b"\xFF\xD8\xFFgarbage".to_vec()),
        MediaInput::from_bytes("notes.txt", b"plain text".to_vec()),
        MediaInput::from_bytes("b.png", png(8, 8)),
    ];

    let outcomes = process_batch(ctx, inputs, None).await;

    let names: Vec<_> = outcomes.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, ["a.png", "broken.jpg", "notes.txt", "b.png"]);

    let first = outcomes[0].result.as_ref().unwrap();
    assert_eq!(first.file_name, "watermarked_a.jpg");
    assert_eq!(first.content_type, "image/jpeg");
    assert_eq!(first.kind, MediaKind::Image);

    assert!(matches!(
        outcomes[1].result.as_ref().unwrap_err(),
        OvermarkError::Decode(_)
    ));
    assert!(matches!(
        outcomes[2].result.as_ref().unwrap_err(),
        OvermarkError::UnsupportedMedia(_)
    ));
    assert!(outcomes[3].result.is_ok());
}

#[tokio::test]
async fn progress_is_reported_once_per_file() {
    let ctx = context(Settings::default());
    let (tx, mut rx) = mpsc::channel(16);
    let inputs = vec![
        MediaInput::from_bytes("one.png", png(4, 4)),
        MediaInput::from_bytes("two.png", png(4, 4)),
        MediaInput::from_bytes("three.bin", Vec::new()),
    ];

    let outcomes = process_batch(ctx, inputs, Some(tx)).await;
    assert_eq!(outcomes.len(), 3);

    let mut events = Vec::new();
    while let Some(ev) = rx.recv().await {
        events.push(ev);
    }
    assert_eq!(events.len(), 3);
    assert_eq!(
        events.iter().map(|e| e.completed).collect::<Vec<_>>(),
        [1, 2, 3]
    );
    assert!(events.iter().all(|e| e.total == 3));
    let failed = events
        .iter()
        .find(|e| e.file == "three.bin")
        .unwrap();
    assert!(matches!(failed.outcome, ProgressOutcome::Failed { .. }));
}

#[tokio::test]
async fn cancelled_batch_reports_every_file() {
    let ctx = context(Settings::default());
    ctx.cancel();

    let outcomes = process_batch(
        ctx,
        vec![
            MediaInput::from_bytes("a.png", png(4, 4)),
            MediaInput::from_bytes("b.png", png(4, 4)),
        ],
        None,
    )
    .await;

    assert_eq!(outcomes.len(), 2);
    assert!(
        outcomes
            .iter()
            .all(|o| matches!(o.result, Err(OvermarkError::Cancelled)))
    );
}

#[tokio::test]
async fn path_inputs_are_read_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("photo.png");
    std::fs::write(&path, png(10, 10)).unwrap();

    let ctx = context(Settings::default());
    let out = process_file(&ctx, MediaInput::from_path(&path)).await.unwrap();
    assert_eq!(out.file_name, "watermarked_photo.jpg");

    let missing = MediaInput::from_path(dir.path().join("missing.png"));
    assert!(process_file(&ctx, missing).await.unwrap_err().is_decode());
}

#[test]
fn from_path_uses_file_name() {
    let input = MediaInput::from_path("/tmp/some/clip.mov");
    assert_eq!(input.name, "clip.mov");
}
