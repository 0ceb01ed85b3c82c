//! Quality search integration tests.
//!
//! Tests verify:
//! - Short-circuit when the reference fits or the target is unbounded
//! - Convergence on synthetic monotonic encoders
//! - Best-effort results are flagged, encode failures are not retried
//! - The JPEG source converges on a real image

use std::sync::atomic::Ordering;

use bytefit::codec::JpegSource;
use bytefit::error::SearchError;
use bytefit::search::{search, EncodingRequest, OutcomeKind, QualitySearch, TargetSize};

use super::test_utils::{noisy_image, Curve, SyntheticSource};

// =============================================================================
// Short-Circuit
// =============================================================================

#[test]
fn test_reference_below_target_is_returned_unchanged() {
    let source = SyntheticSource::new(Curve::Linear(10_000), 4_000).with_tag(7);
    let calls = source.encode_calls();

    let outcome = search(&source, &EncodingRequest::new(5_000)).unwrap();

    assert_eq!(outcome.kind, OutcomeKind::Reference);
    assert_eq!(outcome.size(), 4_000);
    assert!(outcome.data.iter().all(|b| *b == 7));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_unbounded_target_returns_reference_size() {
    let source = SyntheticSource::new(Curve::Quadratic(2_000_000), 2_000_000);
    let calls = source.encode_calls();

    let outcome = search(&source, &EncodingRequest::new(u64::MAX)).unwrap();

    assert_eq!(outcome.size(), 2_000_000);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

// =============================================================================
// Convergence
// =============================================================================

#[test]
fn test_quadratic_scenario() {
    let source = SyntheticSource::new(Curve::Quadratic(2_000_000), 2_000_000);
    let request = EncodingRequest::new(500_000).with_tolerance(0.10);

    let outcome = QualitySearch::new(request).run(&source).unwrap();

    assert_eq!(outcome.kind, OutcomeKind::WithinTolerance);
    assert!((450_000..=550_000).contains(&outcome.size()));
    let quality = outcome.quality.unwrap();
    assert!((0.474..=0.525).contains(&quality), "quality {quality}");
    assert!(outcome.encodes <= 20);
}

#[test]
fn test_linear_targets_converge() {
    let k = 1_000_000;
    for target in [1_000, 12_345, 250_000, 499_999, 777_777, 999_000] {
        let source = SyntheticSource::new(Curve::Linear(k), k as usize);
        let request = EncodingRequest::new(target);

        let outcome = search(&source, &request).unwrap();

        assert_eq!(outcome.kind, OutcomeKind::WithinTolerance, "target {target}");
        assert!(request.window().unwrap().contains(outcome.size()));
    }
}

#[test]
fn test_tight_tolerance_needs_more_attempts() {
    let source = SyntheticSource::new(Curve::Linear(1_000_000), 1_000_000);
    let calls = source.encode_calls();
    let request = EncodingRequest::new(333_333).with_tolerance(0.0001);

    let outcome = search(&source, &request).unwrap();

    assert_eq!(outcome.kind, OutcomeKind::WithinTolerance);
    assert!(calls.load(Ordering::SeqCst) > 5);
}

// =============================================================================
// Degradation and Failure
// =============================================================================

#[test]
fn test_exhausted_attempts_return_best_under_budget() {
    // Steps: 0.5 -> 500 (over), 0.25 -> 250 (under), 0.375 -> 375 (over)
    let source = SyntheticSource::new(Curve::Linear(1_000), 10_000);
    let calls = source.encode_calls();
    let request = EncodingRequest::new(333)
        .with_tolerance(0.0)
        .with_max_attempts(3);

    let outcome = search(&source, &request).unwrap();

    assert!(outcome.is_best_effort());
    assert_eq!(outcome.quality, Some(0.25));
    assert_eq!(outcome.size(), 250);
    assert_eq!(outcome.encodes, 4);
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[test]
fn test_never_under_budget_falls_back_to_full_quality() {
    // The smallest quality tried in four steps is 1/16, still 3906 bytes.
    let source = SyntheticSource::new(Curve::Quadratic(1_000_000), 2_000_000);
    let request = EncodingRequest::for_target(TargetSize::Bytes(10))
        .with_tolerance(0.0)
        .with_max_attempts(4);

    let outcome = search(&source, &request).unwrap();

    assert!(outcome.is_best_effort());
    assert_eq!(outcome.quality, Some(1.0));
    assert_eq!(outcome.size(), 1_000_000);
    assert_eq!(outcome.encodes, 5);
}

#[test]
fn test_encode_failure_is_not_retried() {
    let source = SyntheticSource::new(Curve::Linear(1_000), 10_000).failing();
    let calls = source.encode_calls();

    let result = search(&source, &EncodingRequest::new(500));

    assert!(matches!(result, Err(SearchError::Encoding(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// =============================================================================
// Real Codec
// =============================================================================

#[test]
fn test_jpeg_source_hits_budget() {
    let source = JpegSource::from_image(noisy_image(128, 128, 1)).unwrap();
    let target = source.reference_size() / 6;
    let request = EncodingRequest::new(target);

    let outcome = search(&source, &request).unwrap();

    assert_ne!(outcome.kind, OutcomeKind::Reference);
    assert_eq!(&outcome.data[0..2], &[0xFF, 0xD8]);
    if outcome.kind == OutcomeKind::WithinTolerance {
        assert!(request.window().unwrap().contains(outcome.size()));
    }
}

#[test]
fn test_jpeg_source_small_image_skips_search() {
    let source = JpegSource::from_image(noisy_image(8, 8, 2)).unwrap();
    let request = EncodingRequest::new(source.reference_size());

    let outcome = search(&source, &request).unwrap();

    assert_eq!(outcome.kind, OutcomeKind::Reference);
    assert_eq!(&outcome.data[1..4], b"PNG");
}
