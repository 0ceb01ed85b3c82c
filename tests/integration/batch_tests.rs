//! Batch compression integration tests.
//!
//! Tests verify:
//! - Output length and order match the input in both modes
//! - A failing item leaves an empty slot without disturbing its siblings
//! - The concurrency cap bounds in-flight encodes
//! - The batch timeout surfaces as an error

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytefit::batch::{BatchCompressor, CompressionMode};
use bytefit::codec::{file_extension, JpegSource};
use bytefit::config::Config;
use bytefit::error::BatchError;
use clap::Parser;
use bytefit::search::{EncodingRequest, ImageSource};

use super::test_utils::{noisy_image, Curve, InFlightGauge, SyntheticSource};

fn tagged(count: u8) -> Vec<SyntheticSource> {
    (0..count)
        .map(|tag| SyntheticSource::new(Curve::Linear(10_000), 10_000).with_tag(tag))
        .collect()
}

fn target_mode() -> CompressionMode {
    CompressionMode::Target(EncodingRequest::new(4_000))
}

// =============================================================================
// Sequential Mode
// =============================================================================

#[test]
fn test_sequential_preserves_order() {
    let items = tagged(6);
    let output = BatchCompressor::new().compress_sequential(&items, &target_mode());

    assert_eq!(output.len(), 6);
    for (index, slot) in output.slots().iter().enumerate() {
        let data = slot.as_ref().unwrap();
        assert!(data.iter().all(|b| *b == index as u8));
        assert!((3_600..=4_400).contains(&data.len()));
    }
}

#[test]
fn test_sequential_empty_and_single() {
    let compressor = BatchCompressor::new();

    let empty: Vec<SyntheticSource> = Vec::new();
    assert!(compressor.compress_sequential(&empty, &target_mode()).is_empty());

    let single = tagged(1);
    let output = compressor.compress_sequential(&single, &CompressionMode::Fixed(0.5));
    assert_eq!(output.len(), 1);
    assert_eq!(output.get(0).map(|b| b.len()), Some(5_000));
}

#[test]
fn test_sequential_failure_isolation() {
    let mut items = tagged(5);
    items[2] = SyntheticSource::new(Curve::Linear(10_000), 10_000).failing();

    let output = BatchCompressor::new().compress_sequential(&items, &target_mode());

    assert_eq!(output.len(), 5);
    assert_eq!(output.failed_indices(), vec![2]);
    assert_eq!(output.success_count(), 4);
}

// =============================================================================
// Concurrent Mode
// =============================================================================

#[tokio::test]
async fn test_concurrent_preserves_order() {
    // Later items finish first; slots must still follow input order.
    let items: Vec<SyntheticSource> = (0..8u8)
        .map(|tag| {
            SyntheticSource::new(Curve::Linear(10_000), 10_000)
                .with_tag(tag)
                .with_delay(Duration::from_millis(u64::from(8 - tag) * 3))
        })
        .collect();

    let output = BatchCompressor::new()
        .with_concurrency(8)
        .compress_concurrent(items, CompressionMode::Fixed(0.3))
        .await
        .unwrap();

    assert_eq!(output.len(), 8);
    for (index, slot) in output.slots().iter().enumerate() {
        let data = slot.as_ref().unwrap();
        assert_eq!(data.len(), 3_000);
        assert!(data.iter().all(|b| *b == index as u8));
    }
}

#[tokio::test]
async fn test_concurrent_empty_batch() {
    let items: Vec<SyntheticSource> = Vec::new();
    let output = BatchCompressor::new()
        .compress_concurrent(items, target_mode())
        .await
        .unwrap();
    assert!(output.is_empty());
}

#[tokio::test]
async fn test_concurrent_failure_isolation() {
    let mut items = tagged(6);
    items[0] = SyntheticSource::new(Curve::Linear(10_000), 10_000).failing();
    items[4] = SyntheticSource::new(Curve::Linear(10_000), 10_000).failing();

    let output = BatchCompressor::new()
        .compress_concurrent(items, target_mode())
        .await
        .unwrap();

    assert_eq!(output.len(), 6);
    assert_eq!(output.failed_indices(), vec![0, 4]);
    for index in [1, 2, 3, 5] {
        let data = output.get(index).unwrap();
        assert!(data.iter().all(|b| *b == index as u8));
    }
}

#[tokio::test]
async fn test_concurrency_cap_is_respected() {
    let gauge = InFlightGauge::new();
    let items: Vec<SyntheticSource> = (0..12u8)
        .map(|tag| {
            SyntheticSource::new(Curve::Linear(10_000), 10_000)
                .with_tag(tag)
                .with_delay(Duration::from_millis(10))
                .with_gauge(Arc::clone(&gauge))
        })
        .collect();

    let output = BatchCompressor::new()
        .with_concurrency(3)
        .compress_concurrent(items, CompressionMode::Fixed(0.5))
        .await
        .unwrap();

    assert_eq!(output.success_count(), 12);
    assert!(gauge.peak() <= 3, "peak in-flight encodes: {}", gauge.peak());
    assert!(gauge.peak() >= 1);
}

#[tokio::test]
async fn test_timeout_fails_the_batch() {
    let items: Vec<SyntheticSource> = (0..4u8)
        .map(|tag| {
            SyntheticSource::new(Curve::Linear(10_000), 10_000)
                .with_tag(tag)
                .with_delay(Duration::from_millis(200))
        })
        .collect();

    let start = Instant::now();
    let result = BatchCompressor::new()
        .with_concurrency(1)
        .with_timeout(Duration::from_millis(50))
        .compress_concurrent(items, CompressionMode::Fixed(0.5))
        .await;

    assert!(matches!(result, Err(BatchError::Timeout { .. })));
    assert!(start.elapsed() < Duration::from_millis(700));
}

#[tokio::test]
async fn test_total_bytes_is_order_insensitive() {
    let items = tagged(5);
    let compressor = BatchCompressor::new().with_concurrency(2);

    let concurrent = compressor
        .compress_concurrent(items, CompressionMode::Fixed(0.2))
        .await
        .unwrap();
    let sequential = compressor.compress_sequential(&tagged(5), &CompressionMode::Fixed(0.2));

    assert_eq!(concurrent.total_bytes(), 10_000);
    assert_eq!(concurrent.total_bytes(), sequential.total_bytes());
    assert_eq!(concurrent, sequential);
}

#[tokio::test]
async fn test_mixed_sources_behind_arc() {
    let items: Vec<Arc<dyn ImageSource>> = vec![
        Arc::new(SyntheticSource::new(Curve::Quadratic(2_000_000), 2_000_000)),
        Arc::new(JpegSource::from_image(noisy_image(48, 48, 3)).unwrap()),
        Arc::new(SyntheticSource::new(Curve::Linear(1_000), 1_000).failing()),
    ];

    let output = BatchCompressor::new()
        .compress_concurrent(items, CompressionMode::Fixed(0.5))
        .await
        .unwrap();

    assert_eq!(output.get(0).map(|b| b.len()), Some(500_000));
    assert_eq!(&output.get(1).unwrap()[0..2], &[0xFF, 0xD8]);
    assert!(output.get(2).is_none());
}

#[tokio::test]
async fn test_compress_successes_with_real_images() {
    let items: Vec<JpegSource> = (0..4)
        .map(|seed| JpegSource::from_image(noisy_image(64, 64, seed)).unwrap())
        .collect();
    let budget = items[0].reference_size() / 5;

    let successes = BatchCompressor::new()
        .compress_successes(items, CompressionMode::Target(EncodingRequest::new(budget)))
        .await
        .unwrap();

    assert_eq!(successes.len(), 4);
    for data in &successes {
        assert_eq!(&data[0..2], &[0xFF, 0xD8]);
    }
}

#[tokio::test]
async fn test_output_extension_follows_payload() {
    let config =
        Config::try_parse_from(["bytefit", "--output-dir", "out", "in/photo.png", "raw/photo.png"])
            .unwrap();
    let stems = config.output_stems();
    let source = || JpegSource::from_image(noisy_image(48, 48, 5)).unwrap();

    // No target: the PNG reference always fits and is written as such.
    let output = BatchCompressor::new()
        .compress_concurrent(vec![source()], config.mode())
        .await
        .unwrap();
    let data = output.get(0).unwrap();
    assert_eq!(
        config.output_path(&stems[0], file_extension(data)),
        PathBuf::from("out/photo.png")
    );

    // A tight target forces a lossy encode.
    let budget = source().reference_size() / 5;
    let mode = CompressionMode::Target(EncodingRequest::new(budget));
    let output = BatchCompressor::new()
        .compress_concurrent(vec![source()], mode)
        .await
        .unwrap();
    let data = output.get(0).unwrap();
    assert_eq!(
        config.output_path(&stems[1], file_extension(data)),
        PathBuf::from("out/photo-2.jpg")
    );
}
