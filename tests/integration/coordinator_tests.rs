/*!
 * Integration tests for the processing coordinator.
 *
 * Covers admission, queueing, fault isolation, global fault recovery and
 * statistics through the public API only.
 */

use std::sync::Arc;
use std::time::Duration;

use wordweave::processing::{FixedSource, ProcessOptions, ProcessingCoordinator, ProcessingStatus};
use wordweave::providers::mock::MockTranslator;

use crate::common::{self, mock_collaborators::ExplodingSource};

#[tokio::test]
async fn test_concurrentCalls_withSameSegments_shouldProcessEachOnce() {
    common::init_logging();
    let (document, segments) = common::build_page(&["alpha beta gamma", "delta epsilon", "zeta eta theta iota"]);
    let translator = MockTranslator::slow(20);
    let coordinator = common::new_coordinator(&document, translator.clone(), &common::test_config());

    let (first, second) = tokio::join!(
        coordinator.process_segments(&segments, ProcessOptions::default()),
        coordinator.process_segments(&segments, ProcessOptions::default()),
    );

    assert_eq!(first.segment_count + second.segment_count, 3);
    assert_eq!(first.skipped_count + second.skipped_count, 3);
    assert_eq!(translator.call_count(), 3);
    for segment in &segments {
        assert!(coordinator.tracker().is_processed(segment.fingerprint()));
    }
}

#[tokio::test]
async fn test_coordinatorsSharingTracker_shouldNotDoubleProcess() {
    let (document, segments) = common::build_page(&["shared words here", "and over there"]);
    let translator = MockTranslator::slow(30);
    let config = common::test_config();
    let a = common::new_coordinator(&document, translator.clone(), &config);
    let b = common::new_coordinator(&document, translator.clone(), &config).with_tracker(Arc::clone(a.tracker()));

    let (ra, rb) = tokio::join!(
        a.process_segments(&segments, ProcessOptions::default()),
        b.process_segments(&segments, ProcessOptions::default()),
    );

    assert_eq!(ra.processed_count + rb.processed_count, 2);
    assert_eq!(translator.call_count(), 2);
}

#[tokio::test]
async fn test_secondCall_afterCompletion_shouldSkipAndLeaveDocumentUnchanged() {
    let (document, segments) = common::build_page(&["the quick brown fox"]);
    let coordinator = common::new_coordinator(&document, MockTranslator::working(), &common::test_config());

    let first = coordinator.process_segments(&segments, ProcessOptions::default()).await;
    let html = document.lock().to_html();
    let second = coordinator.process_segments(&segments, ProcessOptions::default()).await;

    assert!(first.replacement_count > 0);
    assert_eq!(second.skipped_count, 1);
    assert_eq!(second.segment_count, 0);
    assert_eq!(second.replacement_count, 0);
    assert_eq!(document.lock().to_html(), html);
}

#[tokio::test]
async fn test_batchWithOneFailingSegment_shouldCompleteTheOthers() {
    let texts: Vec<String> = (0..8)
        .map(|i| {
            if i == 3 {
                "this one is poison".to_string()
            } else {
                format!("plain segment text {}", i)
            }
        })
        .collect();
    let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
    let (document, segments) = common::build_page(&refs);
    let coordinator = common::new_coordinator(&document, MockTranslator::fail_on("poison"), &common::test_config());

    let result = coordinator.process_segments(&segments, ProcessOptions::default()).await;

    assert!(result.success);
    assert_eq!(result.segment_count, 8);
    assert_eq!(result.processed_count, 7);
    assert_eq!(result.error_count, 1);
    assert!(result.error.as_deref().unwrap().contains("poison"));
    assert!(!result.outcomes[3].success);
    assert!(matches!(
        coordinator.tracker().status(segments[3].fingerprint()),
        ProcessingStatus::Failed { .. }
    ));

    // a failed segment is retried on the next call, the others are skipped
    let retry = coordinator.process_segments(&segments, ProcessOptions::default()).await;
    assert_eq!(retry.segment_count, 1);
    assert_eq!(retry.skipped_count, 7);
}

#[tokio::test]
async fn test_batchSize_shouldBoundSegmentsPerBatch() {
    let texts: Vec<String> = (0..5).map(|i| format!("words in block {}", i)).collect();
    let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
    let (document, segments) = common::build_page(&refs);
    let mut config = common::test_config();
    config.batch_size = 2;
    let coordinator = common::new_coordinator(&document, MockTranslator::working(), &config);

    let result = coordinator.process_segments(&segments, ProcessOptions::default()).await;

    assert_eq!(result.processed_count, 5);
    let order: Vec<&str> = result.outcomes.iter().map(|o| o.dom_path.as_str()).collect();
    let expected: Vec<&str> = segments.iter().map(|s| s.dom_path()).collect();
    assert_eq!(order, expected);
}

#[tokio::test]
async fn test_globalFault_shouldRevertAdmittedSegmentsAndRecover() {
    let (document, segments) = common::build_page(&["one two three four five", "six seven eight nine"]);
    let translator = MockTranslator::working();
    let coordinator = ProcessingCoordinator::new(Arc::clone(&document), Arc::new(translator.clone()), &common::test_config())
        .with_random_source(Box::new(ExplodingSource));

    let faulted = coordinator.process_segments(&segments, ProcessOptions::default()).await;

    assert!(!faulted.success);
    assert!(faulted.error.as_deref().unwrap().contains("entropy pool unavailable"));
    assert_eq!(faulted.processed_count, 0);
    assert_eq!(translator.call_count(), 0);
    for segment in &segments {
        assert!(!coordinator.tracker().is_processing(segment.fingerprint()));
    }

    let coordinator = coordinator.with_random_source(Box::new(FixedSource(0.5)));
    let recovered = coordinator.process_segments(&segments, ProcessOptions::default()).await;
    assert!(recovered.success);
    assert_eq!(recovered.segment_count, 2);
    assert_eq!(recovered.processed_count, 2);
}

#[tokio::test]
async fn test_driftedPositions_shouldBeRelocatedBeforeWriting() {
    let (document, segments) = common::build_page(&["sunny warm day"]);
    let mut config = common::test_config();
    config.replacement_rate = 1.0;
    let translator = MockTranslator::drifting();
    let coordinator = common::new_coordinator(&document, translator.clone(), &config);

    let result = coordinator.process_segments(&segments, ProcessOptions::default()).await;

    assert!(result.success);
    assert_eq!(translator.last_target(), Some(3));
    assert_eq!(result.replacement_count, 3);
    let doc = document.lock();
    assert_eq!(doc.text_content(doc.root()), "sunny (sunny-tr) warm (warm-tr) day (day-tr)");
    let html = doc.to_html();
    for word in ["sunny", "warm", "day"] {
        assert!(html.contains(&format!(r#"data-original="{}">({}-tr)</span>"#, word, word)));
    }
}

#[tokio::test]
async fn test_replacementTotal_shouldFollowPageWideRate() {
    // 20 words at the default rate of 0.3
    let (document, segments) = common::build_page(&[
        "one two three four five six seven eight nine ten",
        "eleven twelve thirteen fourteen fifteen",
        "sixteen seventeen eighteen nineteen twenty",
    ]);
    let coordinator = common::new_coordinator(&document, MockTranslator::working(), &common::test_config());

    let result = coordinator.process_segments(&segments, ProcessOptions::default()).await;

    assert_eq!(result.replacement_count, 6);
}

#[tokio::test]
async fn test_waitForCompletion_shouldResolveAfterQueuedCalls() {
    let (document, segments) = common::build_page(&["first block", "second block"]);
    let coordinator = common::new_coordinator(&document, MockTranslator::slow(40), &common::test_config());

    let (first, second, observed) = tokio::join!(
        coordinator.process_segments(&segments[..1], ProcessOptions::default()),
        coordinator.process_segments(
            &segments[1..],
            ProcessOptions {
                lazy_loading: true,
                ..ProcessOptions::default()
            }
        ),
        async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let pending = coordinator.pending();
            coordinator.wait_for_completion().await;
            (pending, coordinator.pending())
        },
    );

    assert_eq!(observed, (2, 0));
    assert_eq!(first.processed_count, 1);
    assert_eq!(second.processed_count, 1);
    assert_eq!(coordinator.get_stats().runs, 2);
}

#[tokio::test]
async fn test_stats_shouldTrackMovingAverage() {
    let (document, segments) = common::build_page(&["alpha words", "beta words", "gamma words"]);
    let mut config = common::test_config();
    config.stats_smoothing = 0.5;
    let coordinator = common::new_coordinator(&document, MockTranslator::slow(5), &config);

    let r1 = coordinator.process_segments(&segments[..1], ProcessOptions::default()).await;
    let r2 = coordinator.process_segments(&segments, ProcessOptions::default()).await;

    let stats = coordinator.get_stats();
    assert_eq!(stats.runs, 2);
    assert_eq!(stats.total_processed, 3);
    assert_eq!(stats.total_skipped, 1);
    let expected = 0.5 * r2.duration_ms as f64 + 0.5 * r1.duration_ms as f64;
    assert!((stats.average_processing_time_ms - expected).abs() < 1e-9);

    coordinator.reset_stats();
    let r3 = coordinator.process_segments(&segments, ProcessOptions::default()).await;
    let stats = coordinator.get_stats();
    assert_eq!(stats.runs, 1);
    assert_eq!(stats.total_skipped, 3);
    assert_eq!(stats.average_processing_time_ms, r3.duration_ms as f64);
}
