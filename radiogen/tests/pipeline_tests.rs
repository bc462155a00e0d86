//! End-to-end pipeline tests against an in-process storage origin.

mod helpers;

use helpers::{tone_wav, TestOrigin};
use radiogen::{
    BuildRequest, Manifest, Pipeline, PipelineConfig, PipelineEvent, Recording, Segment,
    SystemAsset,
};
use tokio::sync::mpsc;

const WORLD: &str = "spookyland";

fn config(origin: &TestOrigin) -> PipelineConfig {
    PipelineConfig {
        origin_url: origin.base_url.clone(),
        public_url: None,
        category: "radio".to_string(),
        auth_token: None,
        download_timeout_secs: 5,
        max_retries: 2,
        crossfade_ms: 200,
        background_gain: 0.1,
    }
}

fn recording(origin: &TestOrigin, name: &str) -> Recording {
    Recording {
        filename: format!("{}.wav", name),
        url: origin.url(&format!("uploads/{}.wav", name)),
        question_id: "q1".to_string(),
        uploaded_at: None,
    }
}

/// Intro, one question block with two answers, and a closing pause.
fn full_request(origin: &TestOrigin, lmid: u32) -> BuildRequest {
    let answers = vec![recording(origin, "answer-a"), recording(origin, "answer-b")];
    BuildRequest {
        world: WORLD.to_string(),
        lmid,
        language: "en".to_string(),
        title: None,
        recordings: answers.clone(),
        segments: vec![
            Segment::Single {
                name: "intro".to_string(),
                url: origin.url("assets/intro.wav"),
                asset: SystemAsset::Intro,
            },
            Segment::CombineWithBackground {
                question_id: "q1".to_string(),
                answers,
                background_url: origin.url("assets/bg.wav"),
            },
            Segment::Silence { duration_secs: 0.3 },
        ],
    }
}

async fn seed_all_assets(origin: &TestOrigin) {
    origin.seed("assets/intro.wav", tone_wav(0.6, 220.0)).await;
    origin.seed("assets/bg.wav", tone_wav(0.5, 110.0)).await;
    origin
        .seed("uploads/answer-a.wav", tone_wav(0.8, 330.0))
        .await;
    origin
        .seed("uploads/answer-b.wav", tone_wav(0.8, 440.0))
        .await;
}

async fn stored_manifest(origin: &TestOrigin, lmid: u32) -> Option<Manifest> {
    let path = format!("radio/{}/manifest-{}-{}.json", WORLD, WORLD, lmid);
    let bytes = origin.stored(&path).await?;
    serde_json::from_slice(&bytes).ok()
}

async fn program_count(origin: &TestOrigin) -> usize {
    origin
        .stored_paths()
        .await
        .iter()
        .filter(|p| p.contains("radio-program-") && p.ends_with(".mp3"))
        .count()
}

#[tokio::test]
async fn test_full_build_publishes_program_and_manifest() {
    let origin = TestOrigin::start().await;
    seed_all_assets(&origin).await;

    let pipeline = Pipeline::new(config(&origin)).unwrap();
    let result = pipeline.run(&full_request(&origin, 1)).await;

    assert!(result.success, "build failed: {:?}", result.error);
    assert!(!result.skipped);
    assert_eq!(result.segment_count, 3);
    let audio_url = result.audio_url.expect("published URL");
    assert!(audio_url.contains(&format!("radio-program-{}-1-", WORLD)));
    assert!(result.duration_secs.unwrap() > 1.0);

    let manifest = stored_manifest(&origin, 1).await.expect("manifest stored");
    assert_eq!(manifest.world, WORLD);
    assert_eq!(manifest.lmid, 1);
    assert_eq!(manifest.program_url, audio_url);
    assert_eq!(manifest.recording_count, Some(2));
    assert!(manifest.file_size > 0);

    let kinds: Vec<&str> = manifest.segments.iter().map(|s| s.kind.as_str()).collect();
    assert_eq!(kinds, vec!["single", "combine_with_background", "silence"]);
    assert_eq!(manifest.segments[1].question_id.as_deref(), Some("q1"));
    assert_eq!(manifest.segments[1].answer_count, 2);

    // The published file itself is retrievable from the origin
    let program_path = format!(
        "radio/{}/{}",
        WORLD,
        audio_url.rsplit('/').next().unwrap()
    );
    assert!(origin.stored(&program_path).await.is_some());
}

#[tokio::test]
async fn test_unchanged_recordings_skip_rebuild() {
    let origin = TestOrigin::start().await;
    seed_all_assets(&origin).await;

    let pipeline = Pipeline::new(config(&origin)).unwrap();
    let request = full_request(&origin, 2);

    let first = pipeline.run(&request).await;
    assert!(first.success && !first.skipped);

    let second = pipeline.run(&request).await;
    assert!(second.success);
    assert!(second.skipped, "identical request must not rebuild");
    assert_eq!(second.audio_url, first.audio_url);
    assert!(second.duration_secs.is_none());
    assert_eq!(program_count(&origin).await, 1);
}

#[tokio::test]
async fn test_recording_count_change_triggers_rebuild() {
    let origin = TestOrigin::start().await;
    seed_all_assets(&origin).await;
    origin
        .seed("uploads/answer-c.wav", tone_wav(0.8, 550.0))
        .await;

    let pipeline = Pipeline::new(config(&origin)).unwrap();
    let first = pipeline.run(&full_request(&origin, 3)).await;
    assert!(first.success && !first.skipped);

    let mut changed = full_request(&origin, 3);
    changed.recordings.push(recording(&origin, "answer-c"));
    let second = pipeline.run(&changed).await;

    assert!(second.success);
    assert!(!second.skipped, "count change must force a rebuild");
    assert_ne!(second.audio_url, first.audio_url);
    assert_eq!(program_count(&origin).await, 2);

    let manifest = stored_manifest(&origin, 3).await.unwrap();
    assert_eq!(manifest.recording_count, Some(3));
}

#[tokio::test]
async fn test_missing_system_asset_substitutes_silence() {
    let origin = TestOrigin::start().await;
    seed_all_assets(&origin).await;
    // intro.wav deliberately absent
    let mut request = full_request(&origin, 4);
    request.segments[0] = Segment::Single {
        name: "intro".to_string(),
        url: origin.url("assets/no-such-intro.wav"),
        asset: SystemAsset::Intro,
    };

    let (event_tx, mut event_rx) = mpsc::channel(64);
    let pipeline = Pipeline::with_events(config(&origin), event_tx).unwrap();
    let result = pipeline.run(&request).await;
    drop(pipeline);

    assert!(result.success, "missing system asset must not fail the run");

    let mut substituted = Vec::new();
    while let Some(event) = event_rx.recv().await {
        if let PipelineEvent::PlaceholderSubstituted { name, duration_secs } = event {
            substituted.push((name, duration_secs));
        }
    }
    assert_eq!(substituted, vec![("intro".to_string(), 3.0)]);

    // A 3s intro placeholder dominates the short fixture clips
    assert!(result.duration_secs.unwrap() > 3.0);
}

#[tokio::test]
async fn test_full_event_channel_does_not_stall_run() {
    let origin = TestOrigin::start().await;
    seed_all_assets(&origin).await;

    // Capacity-1 channel whose receiver never consumes; overflow events must
    // be dropped, not awaited
    let (event_tx, event_rx) = mpsc::channel(1);
    let pipeline = Pipeline::with_events(config(&origin), event_tx).unwrap();

    let result = tokio::time::timeout(
        std::time::Duration::from_secs(60),
        pipeline.run(&full_request(&origin, 8)),
    )
    .await
    .expect("run must not stall on a saturated event channel");

    assert!(result.success, "build failed: {:?}", result.error);
    drop(event_rx);
}

#[tokio::test]
async fn test_missing_background_substitutes_silence() {
    let origin = TestOrigin::start().await;
    seed_all_assets(&origin).await;

    // The background loop is a system asset even though the combine
    // segment's answers are user content
    let mut request = full_request(&origin, 9);
    if let Segment::CombineWithBackground { background_url, .. } = &mut request.segments[1] {
        *background_url = origin.url("assets/no-such-bg.wav");
    }

    let (event_tx, mut event_rx) = mpsc::channel(64);
    let pipeline = Pipeline::with_events(config(&origin), event_tx).unwrap();
    let result = pipeline.run(&request).await;
    drop(pipeline);

    assert!(result.success, "missing background must not fail the run");

    let mut substituted = Vec::new();
    while let Some(event) = event_rx.recv().await {
        if let PipelineEvent::PlaceholderSubstituted { name, duration_secs } = event {
            substituted.push((name, duration_secs));
        }
    }
    assert_eq!(substituted, vec![("background".to_string(), 30.0)]);

    // Overlay truncates the placeholder to the answers' length
    assert!(result.duration_secs.unwrap() < 5.0);
}

#[tokio::test]
async fn test_missing_user_recording_fails_and_preserves_manifest() {
    let origin = TestOrigin::start().await;
    seed_all_assets(&origin).await;

    let pipeline = Pipeline::new(config(&origin)).unwrap();
    let first = pipeline.run(&full_request(&origin, 5)).await;
    assert!(first.success);
    let manifest_before = stored_manifest(&origin, 5).await.unwrap();

    let mut broken = full_request(&origin, 5);
    broken.recordings.push(recording(&origin, "answer-c"));
    if let Segment::CombineWithBackground { answers, .. } = &mut broken.segments[1] {
        answers.push(Recording {
            filename: "ghost.wav".to_string(),
            url: origin.url("uploads/ghost.wav"),
            question_id: "q1".to_string(),
            uploaded_at: None,
        });
    }

    let second = pipeline.run(&broken).await;
    assert!(!second.success, "missing user recording must be fatal");
    let error = second.error.unwrap();
    assert!(error.contains("user recording"), "unexpected error: {}", error);
    assert!(second.audio_url.is_none());

    // Failed build leaves the last good manifest in place
    let manifest_after = stored_manifest(&origin, 5).await.unwrap();
    assert_eq!(manifest_after.program_url, manifest_before.program_url);
    assert_eq!(manifest_after.recording_count, Some(2));
}

#[tokio::test]
async fn test_transient_download_failure_is_retried() {
    let origin = TestOrigin::start().await;
    seed_all_assets(&origin).await;
    origin.fail_next("assets/intro.wav", 1).await;

    let pipeline = Pipeline::new(config(&origin)).unwrap();
    let result = pipeline.run(&full_request(&origin, 6)).await;

    assert!(result.success, "one 500 must be absorbed by retry: {:?}", result.error);
    assert!(!result.skipped);
}

#[tokio::test]
async fn test_download_failure_past_retry_budget_is_fatal() {
    let origin = TestOrigin::start().await;
    seed_all_assets(&origin).await;
    // Exhausts the 2-attempt budget
    origin.fail_next("uploads/answer-a.wav", 5).await;

    let pipeline = Pipeline::new(config(&origin)).unwrap();
    let result = pipeline.run(&full_request(&origin, 7)).await;

    assert!(!result.success);
    assert!(result.error.unwrap().contains("Download failed"));
    assert!(stored_manifest(&origin, 7).await.is_none());
}
