//! Batch compression.
//!
//! This module applies the quality search (or a plain fixed-quality encode)
//! to many images at once.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    BatchCompressor                      │
//! │                                                         │
//! │  sequential:  item 0 ─► item 1 ─► ... ─► item N-1       │
//! │                                                         │
//! │  concurrent:  task per item ─► Semaphore(concurrency)   │
//! │                 └─► spawn_blocking(compress_item)       │
//! │               join all ─► slots[index] = result         │
//! └────────────────────────────┬────────────────────────────┘
//!                              │ per item
//!                              ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │        Fixed(quality)  │  QualitySearch(request)        │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`BatchCompressor`]: runs a batch in sequential or concurrent mode
//! - [`CompressionMode`]: fixed quality or size-targeted search
//! - [`BatchOutput`]: one optional payload per input item, in input order
//! - [`BatchSummary`]: serializable counts for reporting

mod compressor;
mod output;

pub use compressor::{compress_item, BatchCompressor, CompressionMode, DEFAULT_CONCURRENCY};
pub use output::{BatchOutput, BatchSummary};
