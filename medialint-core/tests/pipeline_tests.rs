// medialint-core/tests/pipeline_tests.rs
//
// End-to-end tests for the background pipeline: submission, sequence
// assignment, cancellation, clearing, and probe-failure isolation. A
// scripted probe stands in for ffprobe so the tests never depend on
// external binaries or real media files.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tempfile::tempdir;

use medialint_core::rules::codes;
use medialint_core::{
    CoreConfig, MediaAttributes, MediaKind, MetadataProbe, Metric, Overall, ProbeError, Session,
    Supervisor, Verdict,
};

/// Scripted probe: returns clean video attributes, optionally sleeping
/// per file, and failing for any path whose name contains "corrupt".
struct ScriptedProbe {
    delay: Duration,
}

impl ScriptedProbe {
    fn new(delay: Duration) -> Self {
        Self { delay }
    }

    fn clean_attributes() -> MediaAttributes {
        MediaAttributes {
            duration_ms: Metric::Value(30_000),
            width: Metric::Value(1280),
            height: Metric::Value(720),
            frame_rate: Metric::Value(25.0),
            video_bitrate_bps: Metric::Value(2_000_000),
            audio_bitrate_bps: Metric::Value(128_000),
            overall_bitrate_bps: Metric::Value(2_200_000),
            video_codec: Some("h264".to_string()),
            kind: MediaKind::Video,
        }
    }
}

impl MetadataProbe for ScriptedProbe {
    fn probe(&self, path: &Path) -> Result<MediaAttributes, ProbeError> {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        let name = path.file_name().map(|n| n.to_string_lossy().to_string());
        if name.as_deref().is_some_and(|n| n.contains("corrupt")) {
            return Err(ProbeError::Failed("unreadable container".to_string()));
        }
        Ok(Self::clean_attributes())
    }
}

fn make_files(dir: &Path, names: &[&str]) -> Vec<PathBuf> {
    names
        .iter()
        .map(|name| {
            let path = dir.join(name);
            File::create(&path).unwrap();
            path
        })
        .collect()
}

/// Polls until the supervisor goes idle, collecting every verdict.
fn collect_all(supervisor: &Supervisor) -> Vec<Verdict> {
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut verdicts = Vec::new();
    loop {
        verdicts.extend(supervisor.poll_results());
        if !supervisor.is_running() {
            verdicts.extend(supervisor.poll_results());
            return verdicts;
        }
        assert!(Instant::now() < deadline, "pipeline did not drain in time");
        thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn test_explicit_files_processed_in_submission_order() {
    let dir = tempdir().unwrap();
    let files = make_files(dir.path(), &["a.mp4", "b.mp4", "c.mp4", "d.mp4"]);

    let supervisor = Supervisor::new(
        CoreConfig::default(),
        Arc::new(ScriptedProbe::new(Duration::ZERO)),
    )
    .unwrap();
    supervisor.submit(files.clone());

    let mut verdicts = collect_all(&supervisor);
    assert_eq!(verdicts.len(), 4);

    // A single worker completes in queue order, so both completion
    // order and sequence numbers follow the submitted order.
    verdicts.sort_by_key(|v| v.sequence);
    let sequences: Vec<u64> = verdicts.iter().map(|v| v.sequence).collect();
    assert_eq!(sequences, vec![1, 2, 3, 4]);
    for (verdict, path) in verdicts.iter().zip(&files) {
        assert_eq!(&verdict.path, path);
        assert_eq!(verdict.overall, Overall::Clean);
    }

    let progress = supervisor.progress();
    assert_eq!(progress.processed, 4);
    assert_eq!(progress.total, 4);
}

#[test]
fn test_later_submission_continues_the_sequence() {
    let dir = tempdir().unwrap();
    let first = make_files(dir.path(), &["a.mp4", "b.mp4"]);
    let second = make_files(dir.path(), &["c.mp4"]);

    let supervisor = Supervisor::new(
        CoreConfig::default(),
        Arc::new(ScriptedProbe::new(Duration::ZERO)),
    )
    .unwrap();

    supervisor.submit(first);
    let mut verdicts = collect_all(&supervisor);
    supervisor.submit(second);
    verdicts.extend(collect_all(&supervisor));

    let mut sequences: Vec<u64> = verdicts.iter().map(|v| v.sequence).collect();
    sequences.sort_unstable();
    assert_eq!(sequences, vec![1, 2, 3]);
}

#[test]
fn test_probe_failure_becomes_error_verdict_and_run_continues() {
    let dir = tempdir().unwrap();
    let files = make_files(dir.path(), &["good.mp4", "corrupt.mp4", "fine.mp4"]);

    let supervisor = Supervisor::new(
        CoreConfig::default(),
        Arc::new(ScriptedProbe::new(Duration::ZERO)),
    )
    .unwrap();
    supervisor.submit(files);

    let verdicts = collect_all(&supervisor);
    assert_eq!(verdicts.len(), 3);

    let corrupt = verdicts
        .iter()
        .find(|v| v.file_name == "corrupt.mp4")
        .unwrap();
    assert!(corrupt.has_violation(codes::PROCESSING_ERROR));
    assert_eq!(corrupt.overall, Overall::Error);

    let clean: Vec<&Verdict> = verdicts
        .iter()
        .filter(|v| v.file_name != "corrupt.mp4")
        .collect();
    assert_eq!(clean.len(), 2);
    assert!(clean.iter().all(|v| v.overall == Overall::Clean));
}

#[test]
fn test_cancel_stops_before_the_batch_finishes() {
    let dir = tempdir().unwrap();
    let names: Vec<String> = (0..30).map(|i| format!("clip{i:02}.mp4")).collect();
    let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let files = make_files(dir.path(), &name_refs);

    let probe: Arc<dyn MetadataProbe> =
        Arc::new(ScriptedProbe::new(Duration::from_millis(20)));
    let supervisor = Supervisor::new(CoreConfig::default(), Arc::clone(&probe)).unwrap();
    supervisor.submit(files);

    // Wait for the first verdict, then request a stop.
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut seen = Vec::new();
    while seen.is_empty() {
        assert!(Instant::now() < deadline, "no verdict before cancel");
        seen.extend(supervisor.poll_results());
        thread::sleep(Duration::from_millis(5));
    }
    supervisor.cancel();

    seen.extend(collect_all(&supervisor));
    assert!(!supervisor.is_running());
    assert!(
        seen.len() < 30,
        "cancel had no effect, all {} files processed",
        seen.len()
    );

    // No further verdicts appear after the worker stopped.
    thread::sleep(Duration::from_millis(60));
    assert!(supervisor.poll_results().is_empty());
}

#[test]
fn test_clear_resets_progress_and_discards_leftovers() {
    let dir = tempdir().unwrap();
    let names: Vec<String> = (0..20).map(|i| format!("clip{i:02}.mp4")).collect();
    let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let files = make_files(dir.path(), &name_refs);

    let supervisor = Supervisor::new(
        CoreConfig::default(),
        Arc::new(ScriptedProbe::new(Duration::from_millis(10))),
    )
    .unwrap();
    supervisor.submit(files);
    supervisor.cancel();
    supervisor.clear();

    assert!(!supervisor.is_running());
    assert!(supervisor.poll_results().is_empty());
    let progress = supervisor.progress();
    assert_eq!(progress.processed, 0);
    assert_eq!(progress.total, 0);
    assert_eq!(progress.current_file, "");

    // A fresh run after clear starts the sequence over at 1.
    let more = make_files(dir.path(), &["restart.mp4"]);
    supervisor.submit(more);
    let verdicts = collect_all(&supervisor);
    assert_eq!(verdicts.len(), 1);
    assert_eq!(verdicts[0].sequence, 1);
}

#[test]
fn test_directory_submission_filters_by_extension() {
    let dir = tempdir().unwrap();
    make_files(dir.path(), &["clip.mp4", "photo.jpg", "notes.txt"]);

    let supervisor = Supervisor::new(
        CoreConfig::default(),
        Arc::new(ScriptedProbe::new(Duration::ZERO)),
    )
    .unwrap();
    supervisor.submit(vec![dir.path().to_path_buf()]);

    let verdicts = collect_all(&supervisor);
    let mut names: Vec<&str> = verdicts.iter().map(|v| v.file_name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["clip.mp4", "photo.jpg"]);
}

#[test]
fn test_session_drains_into_the_aggregate_view() {
    let dir = tempdir().unwrap();
    let files = make_files(dir.path(), &["a.mp4", "corrupt.mp4"]);

    let mut session = Session::new(
        CoreConfig::default(),
        Arc::new(ScriptedProbe::new(Duration::ZERO)),
    )
    .unwrap();
    session.submit(files);

    let deadline = Instant::now() + Duration::from_secs(10);
    let mut drained = Vec::new();
    loop {
        drained.extend(session.drain());
        if session.is_idle() {
            drained.extend(session.drain());
            break;
        }
        assert!(Instant::now() < deadline, "session did not drain in time");
        thread::sleep(Duration::from_millis(10));
    }

    assert_eq!(drained.len(), 2);
    let display_nums: Vec<u64> = drained.iter().map(|(num, _)| *num).collect();
    assert_eq!(display_nums, vec![1, 2]);

    let counts = session.counts();
    assert_eq!(counts.total, 2);
    assert_eq!(counts.problems, 1);

    session.clear();
    assert_eq!(session.counts().total, 0);
    assert!(session.rows().is_empty());
}
