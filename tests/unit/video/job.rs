use super::*;

#[test]
fn stage_tags_and_terminality() {
    assert_eq!(JobState::FullOverlay.stage(), JobStage::FullOverlay);
    assert!(!JobState::FullOverlay.is_terminal());

    let fallback = JobState::SingleFrameFallback {
        cause: OvermarkError::transcoder_unavailable("no ffmpeg"),
    };
    assert_eq!(fallback.stage(), JobStage::SingleFrameFallback);

    let done = JobState::Done {
        bytes: vec![1],
        tier: OutputTier::SynthesizedClip,
    };
    assert!(done.is_terminal());
    assert_eq!(done.stage(), JobStage::Done);
}

#[test]
fn failed_at_wraps_stage_and_cause() {
    let state = JobState::failed_at(JobStage::ClipSynthesis, OvermarkError::clip_synthesis("x"));
    match state {
        JobState::Failed(OvermarkError::Overlay { stage, source }) => {
            assert_eq!(stage, JobStage::ClipSynthesis);
            assert!(matches!(*source, OvermarkError::ClipSynthesis(_)));
        }
        other => panic!("unexpected state {other:?}"),
    }
}

#[test]
fn failed_at_keeps_cancellation_bare() {
    let state = JobState::failed_at(JobStage::FullOverlay, OvermarkError::Cancelled);
    assert!(matches!(state, JobState::Failed(OvermarkError::Cancelled)));
}

#[test]
fn stage_display_is_human_readable() {
    assert_eq!(JobStage::FullOverlay.to_string(), "full overlay");
    assert_eq!(JobStage::ClipSynthesis.to_string(), "clip synthesis");
}

#[test]
fn overlay_job_builds_request() {
    let job = OverlayJob {
        input: PathBuf::from("/in.mp4"),
        overlay_asset: PathBuf::from("/ws/wm.png"),
        filter: OverlayFilter {
            x_expr: "1.00".into(),
            y_expr: "2.00".into(),
            scale_width: 10,
            alpha: 1.0,
            duration_secs: None,
        },
        output: PathBuf::from("/ws/out.mp4"),
        map_audio: true,
    };
    let req = job.to_request(&CodecSettings::default());
    assert_eq!(req.overlay, PathBuf::from("/ws/wm.png"));
    assert!(req.filter_complex.contains("overlay=x=1.00:y=2.00"));
    assert!(req.map_audio);
}
