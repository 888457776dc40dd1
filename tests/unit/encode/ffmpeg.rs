use super::*;

const PROBE: &str = r#"{
  "streams": [
    {"index": 0, "codec_type": "video", "width": 1280, "height": 720},
    {"index": 1, "codec_type": "audio", "channels": 2}
  ],
  "format": {"duration": "12.480000", "format_name": "mov,mp4"}
}"#;

#[test]
fn parses_probe_output() {
    let info = parse_probe_json(PROBE.as_bytes()).unwrap();
    assert_eq!(
        info,
        VideoSourceInfo {
            width: 1280,
            height: 720,
            duration_secs: Some(12.48),
            has_audio: true,
        }
    );
}

#[test]
fn probe_without_video_stream_fails() {
    let json = r#"{"streams":[{"codec_type":"audio"}],"format":{}}"#;
    assert!(matches!(
        parse_probe_json(json.as_bytes()),
        Err(OvermarkError::TranscoderRuntime(_))
    ));
}

#[test]
fn probe_missing_duration_is_none() {
    let json = r#"{"streams":[{"codec_type":"video","width":2,"height":2}]}"#;
    let info = parse_probe_json(json.as_bytes()).unwrap();
    assert_eq!(info.duration_secs, None);
    assert!(!info.has_audio);
}

#[test]
fn rotated_stream_reports_displayed_size() {
    let json = r#"{
      "streams": [{
        "codec_type": "video", "width": 1920, "height": 1080,
        "side_data_list": [{"side_data_type": "Display Matrix", "rotation": -90}]
      }],
      "format": {"duration": "3.0"}
    }"#;
    let info = parse_probe_json(json.as_bytes()).unwrap();
    assert_eq!((info.width, info.height), (1080, 1920));

    let json = r#"{"streams":[{"codec_type":"video","width":640,"height":480,"tags":{"rotate":"270"}}]}"#;
    let info = parse_probe_json(json.as_bytes()).unwrap();
    assert_eq!((info.width, info.height), (480, 640));

    let json = r#"{"streams":[{"codec_type":"video","width":640,"height":480,
      "side_data_list":[{"side_data_type":"Display Matrix","rotation":180}]}]}"#;
    let info = parse_probe_json(json.as_bytes()).unwrap();
    assert_eq!((info.width, info.height), (640, 480));
}

#[test]
fn spawn_not_found_is_unavailable() {
    let err = std::io::Error::from(std::io::ErrorKind::NotFound);
    assert!(matches!(
        spawn_error("ffmpeg", &err),
        OvermarkError::TranscoderUnavailable(_)
    ));
    let err = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
    assert!(matches!(
        spawn_error("ffmpeg", &err),
        OvermarkError::TranscoderRuntime(_)
    ));
}

#[tokio::test]
async fn missing_binary_is_unavailable() {
    let t = FfmpegTranscoder::new("/nonexistent/ffmpeg-bin", "/nonexistent/ffprobe-bin");
    assert!(!t.is_available().await);

    let err = t
        .probe(Path::new("in.mp4"), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, OvermarkError::TranscoderUnavailable(_)));
}

#[tokio::test]
async fn cancelled_token_short_circuits() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let cmd = tokio::process::Command::new("/nonexistent/anything");
    let err = run_to_completion(cmd, "test", &cancel).await.unwrap_err();
    assert!(err.is_cancelled());
}

#[tokio::test]
async fn grabber_rejects_empty_input_as_decode() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let grabber = FfmpegFrameGrabber::new("/nonexistent/ffmpeg");
    let err = grabber
        .first_frame(file.path(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(err.is_decode());
}

#[tokio::test]
async fn grabber_reports_missing_ffmpeg_as_unavailable() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    std::io::Write::write_all(&mut file, b"not a video").unwrap();
    let grabber = FfmpegFrameGrabber::new("/nonexistent/ffmpeg");
    let err = grabber
        .first_frame(file.path(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, OvermarkError::TranscoderUnavailable(_)), "{err:?}");
    assert!(!err.is_decode());
}

#[test]
fn codec_defaults() {
    let c = CodecSettings::default();
    assert_eq!(c.preset, "veryfast");
    assert_eq!(c.crf, 23);
}
