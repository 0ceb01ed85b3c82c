//! JPEG source backed by the `image` crate.
//!
//! # Design Decisions
//!
//! - **Decode once**: the source image is decoded and converted to RGB8 at
//!   construction. Every search step re-encodes from the same pixels.
//!
//! - **PNG reference**: the lossless baseline is the PNG encoding of the
//!   original image, computed once and kept for the short-circuit check.
//!
//! - **Quality mapping**: search quality `q` in `[0.0, 1.0]` maps to JPEG
//!   quality through [`codec_quality`].

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, RgbImage};

use crate::error::EncodeError;
use crate::search::{Encoder, Reference};

use super::{codec_quality, decode, png_reference};

// =============================================================================
// JPEG Source
// =============================================================================

/// An image that can be encoded to JPEG at any quality.
///
/// # Example
///
/// ```ignore
/// use bytefit::codec::JpegSource;
/// use bytefit::search::{search, EncodingRequest};
///
/// let source = JpegSource::from_bytes(&std::fs::read("photo.png")?)?;
/// let outcome = search(&source, &EncodingRequest::new(200_000))?;
/// std::fs::write("photo.jpg", &outcome.data)?;
/// ```
#[derive(Debug, Clone)]
pub struct JpegSource {
    /// Pixels fed to the JPEG encoder
    pixels: RgbImage,

    /// PNG encoding of the original image
    reference: Bytes,
}

impl JpegSource {
    /// Build a source from a decoded image.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::ReferenceFailed`] if the image cannot be
    /// written as PNG (e.g. floating-point pixel formats).
    pub fn from_image(image: DynamicImage) -> Result<Self, EncodeError> {
        Ok(Self {
            reference: png_reference(&image)?,
            pixels: image.to_rgb8(),
        })
    }

    /// Decode an encoded image (JPEG or PNG) and build a source from it.
    pub fn from_bytes(data: &[u8]) -> Result<Self, EncodeError> {
        Self::from_image(decode(data)?)
    }

    /// `(width, height)` in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// Size of the lossless reference in bytes.
    pub fn reference_size(&self) -> u64 {
        self.reference.len() as u64
    }
}

impl Encoder for JpegSource {
    fn encode(&self, quality: f64) -> Result<Bytes, EncodeError> {
        let (width, height) = self.pixels.dimensions();
        let mut output = Vec::new();

        JpegEncoder::new_with_quality(&mut output, codec_quality(quality))
            .write_image(self.pixels.as_raw(), width, height, ExtendedColorType::Rgb8)
            .map_err(|e| EncodeError::EncodingFailed {
                quality,
                message: e.to_string(),
            })?;

        Ok(Bytes::from(output))
    }
}

impl Reference for JpegSource {
    fn reference(&self) -> Result<Bytes, EncodeError> {
        Ok(self.reference.clone())
    }
}

// =============================================================================
// Tests
// =============================================================================
