//! Concrete encoder capabilities.
//!
//! The search engine only sees the [`Encoder`](crate::search::Encoder) and
//! [`Reference`](crate::search::Reference) traits. This module provides
//! implementations on top of the `image` crate so real files can be
//! compressed:
//!
//! - [`JpegSource`]: lossy JPEG output, lossless PNG reference
//! - [`AvifSource`]: lossy AVIF output (pure-Rust rav1e), lossless PNG reference
//!
//! Both sources decode once, keep RGB8 pixels, and map search quality
//! `q` in `[0.0, 1.0]` to a codec quality `round(q * 100)` clamped to
//! `1..=100`.

mod avif;
mod jpeg;

use std::io::Cursor;

use bytes::Bytes;
use image::{DynamicImage, ImageFormat, ImageReader};

use crate::error::EncodeError;
use crate::search::clamp_quality;

pub use avif::{AvifSource, DEFAULT_AVIF_SPEED};
pub use jpeg::JpegSource;

/// Minimum quality passed to a codec.
pub const MIN_CODEC_QUALITY: u8 = 1;

/// Maximum quality passed to a codec.
pub const MAX_CODEC_QUALITY: u8 = 100;

/// Map a search quality in `[0.0, 1.0]` to a codec quality in `1..=100`.
#[inline]
pub fn codec_quality(quality: f64) -> u8 {
    let scaled = (clamp_quality(quality) * f64::from(MAX_CODEC_QUALITY)).round() as u8;
    scaled.clamp(MIN_CODEC_QUALITY, MAX_CODEC_QUALITY)
}

/// File extension matching an encoded payload, from its magic bytes.
///
/// A search that short-circuits returns the PNG reference, so the output
/// of a JPEG source is not always a JPEG. Unknown payloads get `bin`.
pub fn file_extension(data: &[u8]) -> &'static str {
    // The ftyp box length ahead of the brand varies between writers.
    if data.get(4..12) == Some(&b"ftypavif"[..]) {
        return "avif";
    }

    image::guess_format(data)
        .ok()
        .and_then(|format| format.extensions_str().first().copied())
        .unwrap_or("bin")
}

/// Decode an encoded image (JPEG or PNG).
pub fn decode(data: &[u8]) -> Result<DynamicImage, EncodeError> {
    ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| EncodeError::Decode {
            message: e.to_string(),
        })?
        .decode()
        .map_err(|e| EncodeError::Decode {
            message: e.to_string(),
        })
}

/// Lossless PNG encoding of `image`, used as the search reference.
///
/// Fails with [`EncodeError::ReferenceFailed`] for pixel formats PNG
/// cannot hold (e.g. floating point).
pub(crate) fn png_reference(image: &DynamicImage) -> Result<Bytes, EncodeError> {
    let mut reference = Cursor::new(Vec::new());
    image
        .write_to(&mut reference, ImageFormat::Png)
        .map_err(|e| EncodeError::ReferenceFailed {
            message: e.to_string(),
        })?;
    Ok(Bytes::from(reference.into_inner()))
}
