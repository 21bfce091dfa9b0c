// Tests for hashing jobs: outcomes, cancellation, progress and exclusivity

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hasher::hash::{
    hex, DigestAlgorithm, HashEngine, HashOutcome, HashUtilityError, JobPhase, JobRequest,
    NoopObserver,
};

use super::common::{
    temp_file, Event, FailingAlgorithm, GatedSha256, PanickingAlgorithm, Recorder, SlowSha256,
    SHA256_ABC, SHA256_EMPTY,
};

fn slow(chunk: usize, delay_ms: u64) -> Arc<dyn DigestAlgorithm> {
    Arc::new(SlowSha256 {
        chunk,
        delay: Duration::from_millis(delay_ms),
    })
}

#[tokio::test]
async fn test_empty_file_success() {
    let (_dir, path) = temp_file("empty.bin", b"");
    let engine = HashEngine::new();

    let handle = engine
        .start(JobRequest::new(&path, "SHA-256"), Arc::new(NoopObserver))
        .unwrap();
    let canceller = handle.canceller();
    let outcome = handle.wait().await;

    assert_eq!(
        outcome,
        HashOutcome::Success {
            digest: hex::decode(SHA256_EMPTY, true).unwrap()
        }
    );
    assert_eq!(outcome.to_string(), SHA256_EMPTY);
    assert_eq!(canceller.phase(), JobPhase::Terminal);
    assert!(!canceller.stream_open());
    assert!(!canceller.cancel());
}

#[tokio::test]
async fn test_matching_compare_value() {
    let (_dir, path) = temp_file("abc.txt", b"abc");
    let engine = HashEngine::new();

    let request = JobRequest::new(&path, "sha256").compare_to(SHA256_ABC.to_uppercase());
    let handle = engine.start(request, Arc::new(NoopObserver)).unwrap();
    let canceller = handle.canceller();
    let outcome = handle.wait().await;

    assert!(matches!(outcome, HashOutcome::Match { .. }));
    assert!(outcome.to_string().contains("EQUAL: The computed hash and the Compare To values match."));
    assert!(!outcome.is_failure());
    assert!(!canceller.stream_open());
}

#[tokio::test]
async fn test_path_whitespace_is_trimmed() {
    let (_dir, path) = temp_file("abc.txt", b"abc");
    let engine = HashEngine::new();

    let padded = format!("  {}\n", path.display());
    let outcome = engine
        .start(JobRequest::new(padded, "sha256"), Arc::new(NoopObserver))
        .unwrap()
        .wait()
        .await;

    assert_eq!(
        outcome,
        HashOutcome::Success {
            digest: hex::decode(SHA256_ABC, true).unwrap()
        }
    );
}

#[tokio::test]
async fn test_all_zero_compare_value_mismatches() {
    let (_dir, path) = temp_file("abc.txt", b"abc");
    let engine = HashEngine::new();

    let zeros = "00".repeat(32);
    let request = JobRequest::new(&path, "sha256").compare_to(zeros);
    let handle = engine.start(request, Arc::new(NoopObserver)).unwrap();
    let canceller = handle.canceller();
    let outcome = handle.wait().await;
    assert!(!canceller.stream_open());

    match &outcome {
        HashOutcome::Mismatch { digest, expected } => {
            assert_eq!(hex::encode(digest), SHA256_ABC);
            assert_eq!(expected, &vec![0u8; 32]);
        }
        other => panic!("Expected Mismatch, got {:?}", other),
    }
    assert!(outcome.is_failure());
    assert!(outcome.to_string().contains("NOT EQUAL"));
}

#[tokio::test]
async fn test_wrong_length_compare_value_fails_validation() {
    let (_dir, path) = temp_file("abc.txt", b"abc");
    let engine = HashEngine::new();

    // An MD5-sized value against SHA-256
    let request = JobRequest::new(&path, "sha256").compare_to("900150983cd24fb0d6963f7d28e17f72");
    let handle = engine.start(request, Arc::new(NoopObserver)).unwrap();
    assert_eq!(handle.phase(), JobPhase::Terminal);
    assert!(!engine.is_busy());

    match handle.wait().await {
        HashOutcome::ValidationFailed { messages } => {
            assert!(messages.iter().any(|m| m == "Compare To length: 128 bits"));
            assert!(messages.iter().any(|m| m == "Required length: 256 bits"));
        }
        other => panic!("Expected ValidationFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_validation_collects_every_failure() {
    let engine = HashEngine::new();
    let request = JobRequest::new("/definitely/not/here.bin", "whirlpool").compare_to("xyz");

    match engine.start(request, Arc::new(NoopObserver)).unwrap().wait().await {
        HashOutcome::ValidationFailed { messages } => {
            assert_eq!(messages[0], "The specified file does not exist.");
            assert!(messages[1].starts_with("Unable to use the selected algorithm:"));
            assert!(messages[1].contains("whirlpool"));
            assert_eq!(
                messages[2],
                "Unable to parse the Compare To hash value as a sequence of hexadecimal digit pairs."
            );
            assert_eq!(messages.len(), 4);
        }
        other => panic!("Expected ValidationFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_directory_is_not_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let engine = HashEngine::new();

    match engine
        .start(JobRequest::new(dir.path(), "md5"), Arc::new(NoopObserver))
        .unwrap()
        .wait()
        .await
    {
        HashOutcome::ValidationFailed { messages } => {
            assert_eq!(messages, vec!["The specified file does not exist.".to_string()]);
        }
        other => panic!("Expected ValidationFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_repeated_runs_are_deterministic() {
    let content: Vec<u8> = (0..200_000u32).map(|i| (i * 7 % 256) as u8).collect();
    let (_dir, path) = temp_file("data.bin", &content);
    let engine = HashEngine::new();

    let first = engine
        .start(JobRequest::new(&path, "blake3"), Arc::new(NoopObserver))
        .unwrap()
        .wait()
        .await;
    let second = engine
        .start(JobRequest::new(&path, "blake3"), Arc::new(NoopObserver))
        .unwrap()
        .wait()
        .await;

    assert!(first.digest().is_some());
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_cancel_right_after_start() {
    let (_dir, path) = temp_file("large.bin", &vec![0x5a; 1 << 20]);
    let engine = HashEngine::new();

    let handle = engine
        .start(JobRequest::new(&path, slow(1024, 1)), Arc::new(NoopObserver))
        .unwrap();
    let canceller = handle.canceller();
    assert!(handle.cancel());

    let outcome = handle.wait().await;
    assert_eq!(outcome, HashOutcome::Canceled);
    assert_eq!(canceller.phase(), JobPhase::Terminal);
    assert!(!canceller.stream_open());
    assert!(!canceller.cancel());
    assert!(!engine.is_busy());
}

#[tokio::test]
async fn test_cancel_wins_even_when_truncated_digest_matches() {
    // After the abort the algorithm sees an empty stream, whose digest is
    // exactly the expected value. The job must still report Canceled.
    let (_dir, path) = temp_file("abc.txt", b"abc");
    let (gate_tx, gate_rx) = mpsc::channel();
    let algorithm: Arc<dyn DigestAlgorithm> = Arc::new(GatedSha256 {
        gate: Mutex::new(gate_rx),
    });
    let engine = HashEngine::new();

    let request = JobRequest::new(&path, algorithm).compare_to(SHA256_EMPTY);
    let handle = engine.start(request, Arc::new(NoopObserver)).unwrap();
    assert!(handle.cancel());
    assert!(!handle.cancel());
    gate_tx.send(()).unwrap();

    assert_eq!(handle.wait().await, HashOutcome::Canceled);
}

#[tokio::test]
async fn test_cancel_from_another_task() {
    let (_dir, path) = temp_file("large.bin", &vec![1u8; 512 * 1024]);
    let engine = HashEngine::new();

    let handle = engine
        .start(JobRequest::new(&path, slow(1024, 1)), Arc::new(NoopObserver))
        .unwrap();
    let canceller = handle.canceller();

    let cancel_task = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel()
    });

    let outcome = handle.wait().await;
    assert!(cancel_task.await.unwrap());
    assert_eq!(outcome, HashOutcome::Canceled);
}

#[tokio::test]
async fn test_second_start_is_rejected_while_running() {
    let (_dir, path) = temp_file("large.bin", &vec![2u8; 256 * 1024]);
    let engine = HashEngine::new();

    let first = engine
        .start(JobRequest::new(&path, slow(1024, 1)), Arc::new(NoopObserver))
        .unwrap();
    assert!(engine.is_busy());

    match engine.start(JobRequest::new(&path, "md5"), Arc::new(NoopObserver)) {
        Err(HashUtilityError::JobInProgress) => {}
        Err(e) => panic!("Expected JobInProgress, got {}", e),
        Ok(_) => panic!("Second job should have been rejected"),
    }

    first.cancel();
    assert_eq!(first.wait().await, HashOutcome::Canceled);

    let again = engine
        .start(JobRequest::new(&path, "md5"), Arc::new(NoopObserver))
        .unwrap()
        .wait()
        .await;
    assert!(matches!(again, HashOutcome::Success { .. }));
}

#[tokio::test]
async fn test_progress_is_monotonic_and_ends_before_outcome() {
    let (_dir, path) = temp_file("data.bin", &vec![9u8; 64 * 1024]);
    let engine = HashEngine::with_interval(Duration::from_millis(5));
    let recorder = Recorder::new();

    let outcome = engine
        .start(JobRequest::new(&path, slow(1024, 2)), recorder.clone())
        .unwrap()
        .wait()
        .await;
    assert!(matches!(outcome, HashOutcome::Success { .. }));

    let events = recorder.events();
    assert_eq!(events.first(), Some(&Event::Started(64 * 1024)));
    assert_eq!(events.last(), Some(&Event::Finished(outcome)));

    let samples: Vec<f64> = events
        .iter()
        .filter_map(|e| match e {
            Event::Progress(p) => Some(*p),
            _ => None,
        })
        .collect();
    assert!(!samples.is_empty());
    assert!(samples.windows(2).all(|w| w[0] <= w[1]));
    assert!(samples.iter().all(|p| (0.0..=100.0).contains(p)));

    // Nothing arrives once the job is done
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(recorder.events().len(), events.len());
}

#[tokio::test]
async fn test_algorithm_error_becomes_runtime_error() {
    let (_dir, path) = temp_file("abc.txt", b"abc");
    let engine = HashEngine::new();
    let algorithm: Arc<dyn DigestAlgorithm> = Arc::new(FailingAlgorithm);

    let handle = engine
        .start(JobRequest::new(&path, algorithm), Arc::new(NoopObserver))
        .unwrap();
    let canceller = handle.canceller();

    match handle.wait().await {
        HashOutcome::RuntimeError { message } => {
            assert!(message.contains("device went away"));
            assert!(message.contains("failing"));
        }
        other => panic!("Expected RuntimeError, got {:?}", other),
    }
    assert!(!canceller.stream_open());
    assert!(!engine.is_busy());
}

#[tokio::test]
async fn test_algorithm_panic_becomes_runtime_error() {
    let (_dir, path) = temp_file("abc.txt", b"abc");
    let engine = HashEngine::new();
    let algorithm: Arc<dyn DigestAlgorithm> = Arc::new(PanickingAlgorithm);

    match engine
        .start(JobRequest::new(&path, algorithm), Arc::new(NoopObserver))
        .unwrap()
        .wait()
        .await
    {
        HashOutcome::RuntimeError { message } => {
            assert!(message.contains("digest state corrupted"));
        }
        other => panic!("Expected RuntimeError, got {:?}", other),
    }
    assert!(!engine.is_busy());
}

#[test]
fn test_start_outside_runtime_is_an_error() {
    let engine = HashEngine::new();
    match engine.start(JobRequest::new("any.bin", "md5"), Arc::new(NoopObserver)) {
        Err(HashUtilityError::NoRuntime) => {}
        _ => panic!("Expected NoRuntime"),
    }
}

#[test]
fn test_outcome_json() {
    let outcome = HashOutcome::Mismatch {
        digest: vec![0xab, 0xcd],
        expected: vec![0, 0],
    };
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["outcome"], "mismatch");
    assert_eq!(json["digest"], "abcd");
    assert_eq!(json["expected"], "0000");

    let json = serde_json::to_value(&HashOutcome::Canceled).unwrap();
    assert_eq!(json["outcome"], "canceled");
}
