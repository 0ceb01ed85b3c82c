//! Batch compressor.
//!
//! Runs a fixed-quality encode or a size-targeted search over many sources.
//!
//! # Design Decisions
//!
//! - **Failure isolation**: an item that fails becomes an empty slot. It never
//!   fails the batch and never cancels sibling items.
//!
//! - **Bounded fan-out**: the concurrent path spawns one task per item, but a
//!   semaphore lets only `concurrency` encodes run at a time. Encodes are
//!   CPU-bound, so they run on the blocking pool.
//!
//! - **Order**: every task carries its input index and writes back into that
//!   slot, so both modes return results in input order.
//!
//! - **Timeout**: the only cancellation point is the whole batch call. When it
//!   expires, tasks still waiting for a permit are dropped; encodes already
//!   running on the blocking pool finish in the background and their output
//!   is discarded.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use crate::error::{BatchError, SearchError};
use crate::search::{clamp_quality, search, EncodingRequest, ImageSource};

use super::output::BatchOutput;

/// Default number of encodes allowed in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 4;

// =============================================================================
// Compression Mode
// =============================================================================

/// What to do with every item of a batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompressionMode {
    /// Encode once at this quality (clamped to `[0.0, 1.0]`).
    Fixed(f64),

    /// Search for a quality that meets the request's byte budget.
    Target(EncodingRequest),
}

impl From<EncodingRequest> for CompressionMode {
    fn from(request: EncodingRequest) -> Self {
        CompressionMode::Target(request)
    }
}

/// Compress a single item according to `mode`.
///
/// This is the unit of work both batch modes run per item.
pub fn compress_item<S>(item: &S, mode: &CompressionMode) -> Result<Bytes, SearchError>
where
    S: ImageSource + ?Sized,
{
    match mode {
        CompressionMode::Fixed(quality) => Ok(item.encode(clamp_quality(*quality))?),
        CompressionMode::Target(request) => Ok(search(item, request)?.into_bytes()),
    }
}

fn settle(index: usize, result: Result<Bytes, SearchError>) -> Option<Bytes> {
    match result {
        Ok(data) => Some(data),
        Err(e) => {
            warn!(index, error = %e, "Item failed, leaving its slot empty");
            None
        }
    }
}

// =============================================================================
// Batch Compressor
// =============================================================================

/// Applies one [`CompressionMode`] to a collection of sources.
///
/// # Example
///
/// ```ignore
/// use bytefit::batch::{BatchCompressor, CompressionMode};
/// use bytefit::search::EncodingRequest;
///
/// let compressor = BatchCompressor::new().with_concurrency(4);
/// let mode = CompressionMode::Target(EncodingRequest::new(500_000));
///
/// let output = compressor.compress_concurrent(sources, mode).await?;
/// println!("{} of {} images encoded", output.success_count(), output.len());
/// ```
#[derive(Debug, Clone)]
pub struct BatchCompressor {
    /// Maximum encodes in flight (concurrent mode only)
    concurrency: usize,

    /// Deadline for the whole concurrent batch call
    timeout: Option<Duration>,
}

impl Default for BatchCompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchCompressor {
    /// Create a compressor with [`DEFAULT_CONCURRENCY`] and no timeout.
    pub fn new() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            timeout: None,
        }
    }

    /// Set the concurrency cap. Zero is rejected when the batch runs.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Fail the concurrent batch call if it takes longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Compress items one after another on the calling thread.
    pub fn compress_sequential<S>(&self, items: &[S], mode: &CompressionMode) -> BatchOutput
    where
        S: ImageSource,
    {
        debug!(items = items.len(), "Starting sequential batch");

        let slots = items
            .iter()
            .enumerate()
            .map(|(index, item)| settle(index, compress_item(item, mode)))
            .collect();

        BatchOutput::new(slots)
    }

    /// Compress items in parallel, at most `concurrency` at a time.
    ///
    /// Each task owns its item. The call returns after every task has
    /// finished, with one slot per item in input order.
    ///
    /// # Errors
    ///
    /// - [`BatchError::InvalidConcurrency`] if the cap is zero
    /// - [`BatchError::Timeout`] if a timeout is set and the batch overruns it
    pub async fn compress_concurrent<I, S>(
        &self,
        items: I,
        mode: CompressionMode,
    ) -> Result<BatchOutput, BatchError>
    where
        I: IntoIterator<Item = S>,
        S: ImageSource + 'static,
    {
        if self.concurrency == 0 {
            return Err(BatchError::InvalidConcurrency);
        }

        let run = self.run_concurrent(items, mode);

        match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, run).await.map_err(|_| {
                error!(?timeout, "Batch timed out");
                BatchError::Timeout { timeout }
            }),
            None => Ok(run.await),
        }
    }

    /// Concurrent batch that keeps only the successful payloads.
    pub async fn compress_successes<I, S>(
        &self,
        items: I,
        mode: CompressionMode,
    ) -> Result<Vec<Bytes>, BatchError>
    where
        I: IntoIterator<Item = S>,
        S: ImageSource + 'static,
    {
        Ok(self.compress_concurrent(items, mode).await?.into_successes())
    }

    async fn run_concurrent<I, S>(&self, items: I, mode: CompressionMode) -> BatchOutput
    where
        I: IntoIterator<Item = S>,
        S: ImageSource + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        let mut len = 0;

        for (index, item) in items.into_iter().enumerate() {
            len += 1;
            let semaphore = Arc::clone(&semaphore);

            tasks.spawn(async move {
                // The semaphore is never closed, so acquiring cannot fail.
                let _permit = semaphore.acquire_owned().await.ok();
                let result =
                    tokio::task::spawn_blocking(move || compress_item(&item, &mode)).await;
                (index, result)
            });
        }

        debug!(
            items = len,
            concurrency = self.concurrency,
            "Started concurrent batch"
        );

        let mut slots = vec![None; len];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Ok(result))) => slots[index] = settle(index, result),
                Ok((index, Err(e))) => {
                    warn!(index, error = %e, "Encode task panicked, leaving its slot empty");
                }
                Err(e) => {
                    error!(error = %e, "Batch task failed to join");
                }
            }
        }

        let output = BatchOutput::new(slots);
        debug!(
            items = output.len(),
            succeeded = output.success_count(),
            total_bytes = output.total_bytes(),
            "Finished concurrent batch"
        );
        output
    }
}

// =============================================================================
// Tests
// =============================================================================
