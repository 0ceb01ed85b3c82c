//! AVIF source backed by the `image` crate's rav1e encoder.
//!
//! Same shape as [`JpegSource`](super::JpegSource): decoded once to RGB8,
//! PNG reference, quality through [`codec_quality`]. The extra knob is the
//! encoder speed, `1..=10`, where higher is faster and larger.

use bytes::Bytes;
use image::codecs::avif::AvifEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, RgbImage};

use crate::error::EncodeError;
use crate::search::{Encoder, Reference};

use super::{codec_quality, decode, png_reference};

/// Default rav1e speed preset.
pub const DEFAULT_AVIF_SPEED: u8 = 8;

/// An image that can be encoded to AVIF at any quality.
#[derive(Debug, Clone)]
pub struct AvifSource {
    pixels: RgbImage,
    reference: Bytes,
    speed: u8,
}

impl AvifSource {
    /// Build a source from a decoded image.
    pub fn from_image(image: DynamicImage) -> Result<Self, EncodeError> {
        Ok(Self {
            reference: png_reference(&image)?,
            pixels: image.to_rgb8(),
            speed: DEFAULT_AVIF_SPEED,
        })
    }

    /// Decode an encoded image (JPEG or PNG) and build a source from it.
    pub fn from_bytes(data: &[u8]) -> Result<Self, EncodeError> {
        Self::from_image(decode(data)?)
    }

    /// Set the encoder speed, clamped to `1..=10`.
    pub fn with_speed(mut self, speed: u8) -> Self {
        self.speed = speed.clamp(1, 10);
        self
    }

    pub fn speed(&self) -> u8 {
        self.speed
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

impl Encoder for AvifSource {
    fn encode(&self, quality: f64) -> Result<Bytes, EncodeError> {
        let (width, height) = self.pixels.dimensions();
        let mut output = Vec::new();

        AvifEncoder::new_with_speed_quality(&mut output, self.speed, codec_quality(quality))
            .write_image(self.pixels.as_raw(), width, height, ExtendedColorType::Rgb8)
            .map_err(|e| EncodeError::EncodingFailed {
                quality,
                message: e.to_string(),
            })?;

        Ok(Bytes::from(output))
    }
}

impl Reference for AvifSource {
    fn reference(&self) -> Result<Bytes, EncodeError> {
        Ok(self.reference.clone())
    }
}
