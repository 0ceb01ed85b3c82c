//! Bisection over the quality parameter.
//!
//! # Algorithm
//!
//! 1. Fetch the lossless reference. If the target is unbounded or the
//!    reference already fits, return it without encoding anything.
//! 2. Bisect `[0.0, 1.0]`. Each step encodes at the midpoint:
//!    - size inside the tolerance window: done
//!    - size above the window: move the upper bound down
//!    - size below the window: move the lower bound up and remember the
//!      midpoint as the best under-budget quality
//! 3. When the attempt budget runs out, encode the best quality once more
//!    and return that payload flagged as best effort.
//!
//! # Monotonicity
//!
//! The engine assumes encoded size never decreases as quality rises. This
//! is a precondition on the [`Encoder`] and is not checked. With an encoder
//! that violates it the search still terminates after at most
//! `max_attempts + 1` encodes, but the result is unspecified.

use bytes::Bytes;
use tracing::{debug, warn};

use crate::error::{EncodeError, SearchError};

use super::request::{EncodingRequest, ToleranceWindow};

/// Lowest quality value.
pub const MIN_QUALITY: f64 = 0.0;

/// Highest quality value.
pub const MAX_QUALITY: f64 = 1.0;

// =============================================================================
// Capabilities
// =============================================================================

/// Lossy encoding of one fixed source at a given quality.
///
/// Implementations must be deterministic for a given quality and safe to
/// call from several threads at once.
pub trait Encoder: Send + Sync {
    /// Encode at `quality` in `[0.0, 1.0]`.
    fn encode(&self, quality: f64) -> Result<Bytes, EncodeError>;
}

/// Lossless baseline of the same source, used to skip needless searches.
pub trait Reference: Send + Sync {
    fn reference(&self) -> Result<Bytes, EncodeError>;
}

/// Anything the engine and the batch layer can compress.
pub trait ImageSource: Encoder + Reference {}

impl<T: Encoder + Reference + ?Sized> ImageSource for T {}

impl<T: Encoder + ?Sized> Encoder for std::sync::Arc<T> {
    fn encode(&self, quality: f64) -> Result<Bytes, EncodeError> {
        (**self).encode(quality)
    }
}

impl<T: Reference + ?Sized> Reference for std::sync::Arc<T> {
    fn reference(&self) -> Result<Bytes, EncodeError> {
        (**self).reference()
    }
}

/// Clamp a quality value into `[0.0, 1.0]`. NaN maps to the highest quality.
#[inline]
pub fn clamp_quality(quality: f64) -> f64 {
    if quality.is_nan() {
        MAX_QUALITY
    } else {
        quality.clamp(MIN_QUALITY, MAX_QUALITY)
    }
}

// =============================================================================
// Outcome
// =============================================================================

/// How a search produced its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    /// The reference already satisfied the target; nothing was encoded.
    Reference,

    /// A bisection step landed inside the tolerance window.
    WithinTolerance,

    /// Attempts ran out; the payload is the closest under-budget candidate.
    BestEffort,
}

/// Result of a successful search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Encoded payload
    pub data: Bytes,

    /// How the payload was reached
    pub kind: OutcomeKind,

    /// Quality used, `None` for the reference payload
    pub quality: Option<f64>,

    /// Number of encoder invocations, including the fallback encode
    pub encodes: u32,
}

impl SearchOutcome {
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_best_effort(&self) -> bool {
        self.kind == OutcomeKind::BestEffort
    }

    pub fn into_bytes(self) -> Bytes {
        self.data
    }
}

// =============================================================================
// Search State
// =============================================================================

struct SearchState {
    lower: f64,
    upper: f64,
    best: f64,
    attempts: u32,
}

impl SearchState {
    fn new() -> Self {
        Self {
            lower: MIN_QUALITY,
            upper: MAX_QUALITY,
            best: MAX_QUALITY,
            attempts: 0,
        }
    }

    fn midpoint(&self) -> f64 {
        (self.lower + self.upper) / 2.0
    }

    fn too_large(&mut self, mid: f64) {
        self.upper = mid;
    }

    fn too_small(&mut self, mid: f64) {
        self.lower = mid;
        self.best = mid;
    }
}

// =============================================================================
// Quality Search
// =============================================================================

/// Size-targeted search bound to one [`EncodingRequest`].
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use bytefit::error::EncodeError;
/// use bytefit::search::{Encoder, EncodingRequest, QualitySearch, Reference};
///
/// struct Linear;
///
/// impl Encoder for Linear {
///     fn encode(&self, quality: f64) -> Result<Bytes, EncodeError> {
///         Ok(Bytes::from(vec![0u8; (quality * 10_000.0).round() as usize]))
///     }
/// }
///
/// impl Reference for Linear {
///     fn reference(&self) -> Result<Bytes, EncodeError> {
///         Ok(Bytes::from(vec![0u8; 20_000]))
///     }
/// }
///
/// let outcome = QualitySearch::new(EncodingRequest::new(2_500)).run(&Linear).unwrap();
/// assert!(outcome.size() >= 2_250 && outcome.size() <= 2_750);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct QualitySearch {
    request: EncodingRequest,
}

impl QualitySearch {
    pub fn new(request: EncodingRequest) -> Self {
        Self { request }
    }

    pub fn request(&self) -> &EncodingRequest {
        &self.request
    }

    /// Run the search against `source`.
    ///
    /// # Errors
    ///
    /// - [`SearchError::Encoding`] if the reference or any bisection encode
    ///   fails; the search is not retried at another quality.
    /// - [`SearchError::NoViableResult`] if the final best-effort encode fails.
    pub fn run<S>(&self, source: &S) -> Result<SearchOutcome, SearchError>
    where
        S: ImageSource + ?Sized,
    {
        let reference = source.reference()?;
        let reference_size = reference.len() as u64;

        let target = self.request.target();
        let target = match target.bytes() {
            Some(bytes) if !target.accepts(reference_size) => bytes,
            _ => {
                debug!(
                    reference_size,
                    target_bytes = ?target.bytes(),
                    "Skipping search, reference already fits"
                );
                return Ok(SearchOutcome {
                    data: reference,
                    kind: OutcomeKind::Reference,
                    quality: None,
                    encodes: 0,
                });
            }
        };

        let window = ToleranceWindow::new(target, self.request.tolerance());
        let max_attempts = self.request.max_attempts();
        let mut state = SearchState::new();

        while state.attempts < max_attempts {
            let mid = state.midpoint();
            let data = source.encode(mid)?;
            state.attempts += 1;

            let size = data.len() as u64;
            if window.contains(size) {
                debug!(
                    target_bytes = target,
                    size,
                    quality = mid,
                    attempts = state.attempts,
                    "Search converged"
                );
                return Ok(SearchOutcome {
                    data,
                    kind: OutcomeKind::WithinTolerance,
                    quality: Some(mid),
                    encodes: state.attempts,
                });
            }

            if size > window.max {
                state.too_large(mid);
            } else {
                state.too_small(mid);
            }
        }

        let best = state.best;
        warn!(
            target_bytes = target,
            attempts = state.attempts,
            max_attempts,
            quality = best,
            "Search did not converge, using best-effort quality"
        );

        let data = source
            .encode(best)
            .map_err(|source| SearchError::NoViableResult {
                quality: best,
                source,
            })?;

        Ok(SearchOutcome {
            data,
            kind: OutcomeKind::BestEffort,
            quality: Some(best),
            encodes: state.attempts + 1,
        })
    }
}

/// Run a size-targeted search with `request` against `source`.
///
/// Shorthand for `QualitySearch::new(*request).run(source)`.
pub fn search<S>(source: &S, request: &EncodingRequest) -> Result<SearchOutcome, SearchError>
where
    S: ImageSource + ?Sized,
{
    QualitySearch::new(*request).run(source)
}

// =============================================================================
// Tests
// =============================================================================


// =============================================================================
// Property-Based Tests
// =============================================================================
