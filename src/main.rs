//! bytefit - Encode images to a target byte budget.
//!
//! This binary loads the input images, runs them through the batch
//! compressor and writes one file per successful input. The extension
//! follows the payload: a lossy encode, or `.png` when the lossless
//! reference already fit.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use bytes::Bytes;
use clap::Parser;
use serde::Serialize;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bytefit::{
    batch::{BatchCompressor, BatchOutput, BatchSummary},
    codec::{file_extension, AvifSource, JpegSource},
    config::{Config, OutputCodec, ReportFormat},
    error::EncodeError,
    search::ImageSource,
};

/// Outcome for one input file, in input order.
#[derive(Serialize)]
struct Row {
    input: PathBuf,
    output: Option<PathBuf>,
    bytes: Option<u64>,
    error: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    if let Err(e) = tokio::fs::create_dir_all(&config.output_dir).await {
        error!(
            "Failed to create output directory {}: {}",
            config.output_dir.display(),
            e
        );
        return ExitCode::FAILURE;
    }

    let mut rows: Vec<Row> = config
        .inputs
        .iter()
        .map(|input| Row {
            input: input.clone(),
            output: None,
            bytes: None,
            error: None,
        })
        .collect();

    // Load and decode every input; failures are recorded and skipped.
    let mut sources = Vec::new();
    let mut source_rows = Vec::new();
    for (index, row) in rows.iter_mut().enumerate() {
        match load_source(&row.input, config.codec).await {
            Ok(source) => {
                debug!(input = %row.input.display(), codec = ?config.codec, "Loaded image");
                sources.push(source);
                source_rows.push(index);
            }
            Err(e) => {
                warn!(input = %row.input.display(), error = %e, "Skipping input");
                row.error = Some(e);
            }
        }
    }

    let mut compressor = BatchCompressor::new().with_concurrency(config.concurrency);
    if let Some(timeout) = config.timeout() {
        compressor = compressor.with_timeout(timeout);
    }

    info!(
        images = sources.len(),
        concurrency = config.concurrency,
        mode = ?config.mode(),
        "Compressing"
    );

    let output = match compressor.compress_concurrent(sources, config.mode()).await {
        Ok(output) => output,
        Err(e) => {
            error!("Batch failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let stems = config.output_stems();
    let mut written: Vec<Option<Bytes>> = vec![None; rows.len()];

    for (slot, index) in output.into_iter().zip(source_rows) {
        let row = &mut rows[index];
        let Some(data) = slot else {
            row.error = Some("encoding failed".to_string());
            continue;
        };

        let path = config.output_path(&stems[index], file_extension(&data));
        match tokio::fs::write(&path, &data).await {
            Ok(()) => {
                row.bytes = Some(data.len() as u64);
                row.output = Some(path);
                written[index] = Some(data);
            }
            Err(e) => {
                row.error = Some(format!("failed to write {}: {}", path.display(), e));
            }
        }
    }

    let summary = BatchOutput::from(written).summary();
    print_report(&rows, summary, config.format);

    if summary.failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Read and decode one input file into a source for `codec`.
async fn load_source(path: &Path, codec: OutputCodec) -> Result<Arc<dyn ImageSource>, String> {
    let data = tokio::fs::read(path)
        .await
        .map_err(|e| format!("failed to read: {}", e))?;

    tokio::task::spawn_blocking(move || -> Result<Arc<dyn ImageSource>, EncodeError> {
        let source: Arc<dyn ImageSource> = match codec {
            OutputCodec::Jpeg => Arc::new(JpegSource::from_bytes(&data)?),
            OutputCodec::Avif => Arc::new(AvifSource::from_bytes(&data)?),
        };
        Ok(source)
    })
    .await
    .map_err(|e| format!("decode task failed: {}", e))?
    .map_err(|e| e.to_string())
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "bytefit=debug"
    } else {
        "bytefit=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// JSON document printed with `--format json`.
#[derive(Serialize)]
struct Report<'a> {
    items: &'a [Row],
    #[serde(flatten)]
    summary: BatchSummary,
}

fn print_report(rows: &[Row], summary: BatchSummary, format: ReportFormat) {
    match format {
        ReportFormat::Text => {
            for row in rows {
                match (&row.output, row.bytes, &row.error) {
                    (Some(output), Some(bytes), _) => println!(
                        "✓ {} -> {} ({} bytes)",
                        row.input.display(),
                        output.display(),
                        bytes
                    ),
                    (_, _, error) => println!(
                        "✗ {}: {}",
                        row.input.display(),
                        error.as_deref().unwrap_or("unknown error")
                    ),
                }
            }
            println!();
            println!(
                "{} of {} image(s) written, {} bytes total",
                summary.succeeded, summary.items, summary.total_bytes
            );
        }
        ReportFormat::Json => {
            let report = Report {
                items: rows,
                summary,
            };

            match serde_json::to_string_pretty(&report) {
                Ok(text) => println!("{}", text),
                Err(e) => error!("Failed to render report: {}", e),
            }
        }
    }
}
