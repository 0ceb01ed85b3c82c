//! # bytefit
//!
//! Encode images to a target byte budget.
//!
//! Lossy codecs expose a single quality knob, but callers usually care about
//! the size of the result: an upload limit, a mail attachment cap, a page
//! weight budget. This library searches the quality parameter until the
//! encoded size lands within a tolerance of the budget, and runs that search
//! over whole batches with a bounded number of encodes in flight.
//!
//! ## Features
//!
//! - **Codec-agnostic search**: any type implementing [`Encoder`] and
//!   [`Reference`] can be searched
//! - **Short-circuit**: when the lossless reference already fits, nothing is
//!   encoded at all
//! - **Graceful degradation**: when the attempt budget runs out, the closest
//!   under-budget candidate is returned and flagged as best effort
//! - **Bounded batches**: semaphore-gated fan-out with per-item failure
//!   isolation and input-order results
//!
//! ## Architecture
//!
//! - [`search`] - Quality search engine
//! - [`batch`] - Sequential and concurrent batch compression
//! - [`codec`] - `image`-backed JPEG and AVIF sources with a PNG reference
//! - [`config`] - CLI and configuration types
//! - [`error`] - Error types for each layer
//!
//! ## Example
//!
//! ```rust,no_run
//! use bytefit::{BatchCompressor, CompressionMode, EncodingRequest, JpegSource};
//!
//! #[tokio::main]
//! async fn main() {
//!     let sources: Vec<JpegSource> = ["a.png", "b.png"]
//!         .iter()
//!         .filter_map(|path| std::fs::read(path).ok())
//!         .filter_map(|data| JpegSource::from_bytes(&data).ok())
//!         .collect();
//!
//!     let mode = CompressionMode::Target(EncodingRequest::new(250_000));
//!     let output = BatchCompressor::new()
//!         .with_concurrency(4)
//!         .compress_concurrent(sources, mode)
//!         .await
//!         .unwrap();
//!
//!     println!("{} bytes total", output.total_bytes());
//! }
//! ```

pub mod batch;
pub mod codec;
pub mod config;
pub mod error;
pub mod search;

// Re-export commonly used types
pub use batch::{
    compress_item, BatchCompressor, BatchOutput, BatchSummary, CompressionMode,
    DEFAULT_CONCURRENCY,
};
pub use codec::{codec_quality, file_extension, AvifSource, JpegSource};
pub use config::{Config, ReportFormat};
pub use error::{BatchError, EncodeError, SearchError};
pub use search::{
    clamp_quality, search, Encoder, EncodingRequest, ImageSource, OutcomeKind, QualitySearch,
    Reference, SearchOutcome, TargetSize, ToleranceWindow, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_TOLERANCE,
};
