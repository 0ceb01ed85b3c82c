//! Size-targeted quality search.
//!
//! Given a byte budget, a tolerance and an encoder, find a quality whose
//! output lands inside `target * (1 ± tolerance)`, or the closest
//! under-budget candidate once the attempt budget is spent.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │                QualitySearch                  │
//! │                                               │
//! │   EncodingRequest ──► reference fits? ──yes──►│ Reference
//! │                            │ no               │
//! │                            ▼                  │
//! │                 bisect [0.0, 1.0] ──hit──────►│ WithinTolerance
//! │                            │ exhausted        │
//! │                            ▼                  │
//! │                 encode(best quality) ────────►│ BestEffort
//! └────────────────────────────┬──────────────────┘
//!                              │
//!                              ▼
//! ┌───────────────────────────────────────────────┐
//! │        ImageSource (Encoder + Reference)      │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`QualitySearch`]: runs the search for one [`EncodingRequest`]
//! - [`Encoder`]: `quality -> bytes` capability supplied by a codec
//! - [`Reference`]: lossless baseline used for the short-circuit
//! - [`SearchOutcome`]: payload plus how it was reached ([`OutcomeKind`])
//!
//! The engine performs no I/O; its only side effects are encoder calls and
//! `tracing` events.

mod engine;
mod request;

pub use engine::{
    clamp_quality, search, Encoder, ImageSource, OutcomeKind, QualitySearch, Reference,
    SearchOutcome, MAX_QUALITY, MIN_QUALITY,
};
pub use request::{
    EncodingRequest, TargetSize, ToleranceWindow, DEFAULT_MAX_ATTEMPTS, DEFAULT_TOLERANCE,
};
