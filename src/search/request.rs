//! Search parameters.
//!
//! An [`EncodingRequest`] is built once per search and never mutated. It
//! carries the byte budget, the accepted relative deviation from it, and the
//! number of bisection steps the engine may spend.

/// Default relative tolerance around the target (±10%).
pub const DEFAULT_TOLERANCE: f64 = 0.10;

/// Default number of bisection steps before falling back to best effort.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 20;

// =============================================================================
// Target Size
// =============================================================================

/// Byte budget for an encoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetSize {
    /// No constraint; the lossless reference is always acceptable.
    #[default]
    Unbounded,

    /// Aim for this many bytes.
    Bytes(u64),
}

impl TargetSize {
    /// Returns the budget in bytes, or `None` when unbounded.
    pub fn bytes(&self) -> Option<u64> {
        match self {
            TargetSize::Unbounded => None,
            TargetSize::Bytes(n) => Some(*n),
        }
    }

    /// Whether a payload of `size` bytes already satisfies this budget.
    pub fn accepts(&self, size: u64) -> bool {
        match self {
            TargetSize::Unbounded => true,
            TargetSize::Bytes(n) => size <= *n,
        }
    }
}

impl From<u64> for TargetSize {
    /// `u64::MAX` is treated as the "no constraint" sentinel.
    fn from(bytes: u64) -> Self {
        if bytes == u64::MAX {
            TargetSize::Unbounded
        } else {
            TargetSize::Bytes(bytes)
        }
    }
}

impl From<Option<u64>> for TargetSize {
    fn from(bytes: Option<u64>) -> Self {
        bytes.map_or(TargetSize::Unbounded, TargetSize::from)
    }
}

// =============================================================================
// Tolerance Window
// =============================================================================

/// Inclusive size range accepted as a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToleranceWindow {
    /// `floor(target * (1 - tolerance))`
    pub min: u64,

    /// `ceil(target * (1 + tolerance))`
    pub max: u64,
}

impl ToleranceWindow {
    /// Compute the window around `target`.
    ///
    /// A bound that is an integer up to rounding error (`100 * 1.1`) is
    /// taken as that integer rather than floored or ceiled past it.
    pub fn new(target: u64, tolerance: f64) -> Self {
        let target = target as f64;
        let delta = target * tolerance;
        let min = snapped(target - delta, f64::floor).max(0.0);
        let max = snapped(target + delta, f64::ceil);
        Self {
            min: min as u64,
            max: max as u64,
        }
    }

    /// Both ends are inclusive.
    #[inline]
    pub fn contains(&self, size: u64) -> bool {
        size >= self.min && size <= self.max
    }
}

/// Relative slack under which a bound counts as an exact integer.
const BOUND_EPSILON: f64 = 1e-9;

fn snapped(value: f64, round: fn(f64) -> f64) -> f64 {
    let nearest = value.round();
    if (value - nearest).abs() <= BOUND_EPSILON * nearest.abs().max(1.0) {
        nearest
    } else {
        round(value)
    }
}

// =============================================================================
// Encoding Request
// =============================================================================

/// Parameters for one size-targeted search.
///
/// # Example
///
/// ```
/// use bytefit::search::{EncodingRequest, TargetSize};
///
/// let request = EncodingRequest::new(500_000)
///     .with_tolerance(0.05)
///     .with_max_attempts(12);
///
/// assert_eq!(request.target(), TargetSize::Bytes(500_000));
/// assert_eq!(request.max_attempts(), 12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodingRequest {
    target: TargetSize,
    tolerance: f64,
    max_attempts: u32,
}

impl Default for EncodingRequest {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl EncodingRequest {
    /// Create a request for `target_bytes` with default tolerance and
    /// attempts. `u64::MAX` means no constraint.
    pub fn new(target_bytes: u64) -> Self {
        Self::for_target(TargetSize::from(target_bytes))
    }

    /// Create a request for an explicit [`TargetSize`].
    pub fn for_target(target: TargetSize) -> Self {
        Self {
            target,
            tolerance: DEFAULT_TOLERANCE,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// A request with no size constraint.
    pub fn unbounded() -> Self {
        Self::for_target(TargetSize::Unbounded)
    }

    /// Set the relative tolerance. Negative values are treated as zero.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance.max(0.0);
        self
    }

    /// Set the number of bisection steps.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn target(&self) -> TargetSize {
        self.target
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Tolerance window for a bounded target, `None` when unbounded.
    pub fn window(&self) -> Option<ToleranceWindow> {
        self.target
            .bytes()
            .map(|target| ToleranceWindow::new(target, self.tolerance))
    }
}
