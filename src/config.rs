//! Configuration for the `bytefit` command-line tool.
//!
//! Options come from command-line arguments via clap, with environment
//! variables (`BYTEFIT_` prefix) as fallback and defaults for everything
//! optional.
//!
//! # Environment Variables
//!
//! - `BYTEFIT_OUTPUT_DIR` - Directory for encoded files (default: `.`)
//! - `BYTEFIT_TARGET_BYTES` - Byte budget per image (default: unbounded)
//! - `BYTEFIT_QUALITY` - Fixed quality in `[0, 1]`, instead of a budget
//! - `BYTEFIT_TOLERANCE` - Relative tolerance (default: 0.10)
//! - `BYTEFIT_MAX_ATTEMPTS` - Bisection steps (default: 20)
//! - `BYTEFIT_CONCURRENCY` - Encodes in flight (default: 4)
//! - `BYTEFIT_TIMEOUT_SECS` - Deadline for the whole batch
//! - `BYTEFIT_CODEC` - Lossy codec, `jpeg` or `avif` (default: jpeg)
//! - `BYTEFIT_FORMAT` - Report format, `text` or `json` (default: text)

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::batch::{CompressionMode, DEFAULT_CONCURRENCY};
use crate::search::{EncodingRequest, TargetSize, DEFAULT_MAX_ATTEMPTS, DEFAULT_TOLERANCE};

/// Default output directory.
pub const DEFAULT_OUTPUT_DIR: &str = ".";

// =============================================================================
// CLI Arguments
// =============================================================================

/// bytefit - Encode images to a target byte budget.
///
/// Searches the JPEG quality of each input so the output lands within a
/// tolerance of the requested size, or encodes every input at one fixed
/// quality.
#[derive(Parser, Debug, Clone)]
#[command(name = "bytefit")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Input image files (JPEG or PNG).
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Directory to write outputs into, named `<stem>.<format extension>`.
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR, env = "BYTEFIT_OUTPUT_DIR")]
    pub output_dir: PathBuf,

    // =========================================================================
    // Compression Configuration
    // =========================================================================
    /// Byte budget per image. Omit for no constraint.
    #[arg(short, long, env = "BYTEFIT_TARGET_BYTES", conflicts_with = "quality")]
    pub target_bytes: Option<u64>,

    /// Fixed quality in [0, 1]. Skips the size search.
    #[arg(short, long, env = "BYTEFIT_QUALITY")]
    pub quality: Option<f64>,

    /// Lossy codec to encode with.
    #[arg(long, value_enum, default_value_t = OutputCodec::Jpeg, env = "BYTEFIT_CODEC")]
    pub codec: OutputCodec,

    /// Accepted relative deviation from the target.
    #[arg(long, default_value_t = DEFAULT_TOLERANCE, env = "BYTEFIT_TOLERANCE")]
    pub tolerance: f64,

    /// Bisection steps before falling back to best effort.
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS, env = "BYTEFIT_MAX_ATTEMPTS")]
    pub max_attempts: u32,

    // =========================================================================
    // Batch Configuration
    // =========================================================================
    /// Maximum number of images encoded at once.
    #[arg(short, long, default_value_t = DEFAULT_CONCURRENCY, env = "BYTEFIT_CONCURRENCY")]
    pub concurrency: usize,

    /// Fail the batch if it takes longer than this many seconds.
    #[arg(long, env = "BYTEFIT_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    // =========================================================================
    // Output Configuration
    // =========================================================================
    /// Report format.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text, env = "BYTEFIT_FORMAT")]
    pub format: ReportFormat,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

/// Lossy codec used for every input.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputCodec {
    #[default]
    Jpeg,
    Avif,
}

/// How the batch report is printed.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    /// One line per image plus a total
    #[default]
    Text,
    /// A single JSON document
    Json,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.inputs.is_empty() {
            return Err("At least one input file is required".to_string());
        }

        if self.quality.is_some() && self.target_bytes.is_some() {
            return Err("--quality and --target-bytes are mutually exclusive".to_string());
        }

        if let Some(quality) = self.quality {
            if !(0.0..=1.0).contains(&quality) {
                return Err("quality must be between 0 and 1".to_string());
            }
        }

        if !(0.0..1.0).contains(&self.tolerance) {
            return Err("tolerance must be in [0, 1)".to_string());
        }

        if self.max_attempts == 0 {
            return Err("max_attempts must be greater than 0".to_string());
        }

        if self.concurrency == 0 {
            return Err("concurrency must be greater than 0".to_string());
        }

        if self.timeout_secs == Some(0) {
            return Err("timeout_secs must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Build the compression mode applied to every input.
    pub fn mode(&self) -> CompressionMode {
        match self.quality {
            Some(quality) => CompressionMode::Fixed(quality),
            None => CompressionMode::Target(self.request()),
        }
    }

    /// Search request built from the target, tolerance and attempts.
    pub fn request(&self) -> EncodingRequest {
        EncodingRequest::for_target(TargetSize::from(self.target_bytes))
            .with_tolerance(self.tolerance)
            .with_max_attempts(self.max_attempts)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Output file stem for every input, in input order.
    ///
    /// Inputs sharing a stem (`a/x.png`, `b/x.png`) get `-2`, `-3`, ...
    /// suffixes so no output overwrites another.
    pub fn output_stems(&self) -> Vec<String> {
        let mut taken = HashSet::new();
        self.inputs
            .iter()
            .map(|input| {
                let stem = input
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "image".to_string());

                let mut candidate = stem.clone();
                let mut n = 2;
                while !taken.insert(candidate.clone()) {
                    candidate = format!("{}-{}", stem, n);
                    n += 1;
                }
                candidate
            })
            .collect()
    }

    /// Output path for a stem and an extension chosen from the payload.
    pub fn output_path(&self, stem: &str, extension: &str) -> PathBuf {
        self.output_dir.join(format!("{}.{}", stem, extension))
    }
}

// =============================================================================
// Tests
// =============================================================================
