//! Bitmaps carried by image boxes, and the outbound size constraint.
//!
//! A reply must fit in a single datagram.  Two limits apply, in order:
//!
//! ```text
//!  stored image ──constrain(budget)──▶ raw RGBA ≤ budget
//!               ──encode──▶ blob ──too big?──▶ shrink ×3/4, encode again
//!                                  └─fits────▶ reply
//! ```
//!
//! `constrain` scales by `sqrt(budget / raw)` on both axes, which keeps the
//! aspect ratio.  Compressed size depends on content, so `encode_to_fit`
//! keeps shrinking until the encoded blob is at most `max_blob` bytes.

use std::borrow::Cow;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use log::debug;

use crate::app::ports::ImageCodec;
use crate::error::ImageError;

/// Bytes per RGBA pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// Size of the image a new image box starts with.
pub const DEFAULT_IMAGE_SIZE: u32 = 100;

/// Per-step shrink applied while an encoded image is still too large.
const SHRINK_STEP: f64 = 0.75;

/// Decoded RGBA8 bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pixels: RgbaImage,
}

impl Image {
    /// Wrap a row-major pixel buffer; `None` if its length does not match.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        RgbaImage::from_raw(width, height, pixels).map(Self::from)
    }

    /// Uniformly filled image.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        RgbaImage::from_pixel(width, height, Rgba(rgba)).into()
    }

    /// Placeholder shown by an image box before anything is set.
    pub fn placeholder() -> Self {
        Self::filled(DEFAULT_IMAGE_SIZE, DEFAULT_IMAGE_SIZE, [0, 0, 0, 255])
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Worst-case uncompressed size.
    pub fn raw_size(&self) -> usize {
        BYTES_PER_PIXEL * self.width() as usize * self.height() as usize
    }

    /// Resample to `width × height` (both at least 1).
    pub fn resized(&self, width: u32, height: u32) -> Self {
        imageops::resize(&self.pixels, width.max(1), height.max(1), FilterType::Triangle).into()
    }

    fn scaled(&self, scale: f64) -> Self {
        let width = (f64::from(self.width()) * scale) as u32;
        let height = (f64::from(self.height()) * scale) as u32;
        self.resized(width, height)
    }
}

impl From<RgbaImage> for Image {
    fn from(pixels: RgbaImage) -> Self {
        Self { pixels }
    }
}

/// Scale factor needed to bring `raw_bytes` under `budget`, or `None` if it
/// already fits.
pub fn downscale_factor(raw_bytes: usize, budget: usize) -> Option<f64> {
    (raw_bytes > budget).then(|| (budget as f64 / raw_bytes as f64).sqrt())
}

/// Apply the raw-size constraint.
pub fn constrain(image: &Image, budget: usize) -> Cow<'_, Image> {
    match downscale_factor(image.raw_size(), budget) {
        None => Cow::Borrowed(image),
        Some(scale) => Cow::Owned(image.scaled(scale)),
    }
}

/// Encode `image` for a reply: constrain it to `budget` raw bytes, then
/// shrink until the encoded blob is at most `max_blob` bytes.
///
/// Fails only if the codec fails, or a 1×1 image still does not fit.
pub fn encode_to_fit(
    image: &Image,
    budget: usize,
    max_blob: usize,
    codec: &dyn ImageCodec,
) -> Result<Vec<u8>, ImageError> {
    let mut current = constrain(image, budget);
    loop {
        let blob = codec.encode(&current)?;
        if blob.len() <= max_blob {
            return Ok(blob);
        }
        if current.width() <= 1 && current.height() <= 1 {
            return Err(ImageError::TooLarge);
        }
        debug!(
            "IMAGE: {}x{} encodes to {} bytes, shrinking",
            current.width(),
            current.height(),
            blob.len()
        );
        current = Cow::Owned(current.scaled(SHRINK_STEP));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Stores raw pixels, so the blob size tracks the pixel count.
    struct RawCodec;

    impl ImageCodec for RawCodec {
        fn decode(&self, _blob: &[u8]) -> Result<Image, ImageError> {
            Err(ImageError::Corrupt)
        }

        fn encode(&self, image: &Image) -> Result<Vec<u8>, ImageError> {
            Ok(image.pixels().to_vec())
        }
    }

    #[test]
    fn from_rgba_checks_length() {
        assert!(Image::from_rgba(2, 2, vec![0; 16]).is_some());
        assert!(Image::from_rgba(2, 2, vec![0; 15]).is_none());
    }

    #[test]
    fn small_image_is_borrowed() {
        let img = Image::placeholder();
        assert!(matches!(constrain(&img, 8 * 64 * 1024), Cow::Borrowed(_)));
    }

    #[test]
    fn large_image_lands_under_budget() {
        let budget = 8 * 64 * 1024;
        let img = Image::filled(2000, 1000, [1, 2, 3, 4]);
        let out = constrain(&img, budget);
        assert!(out.raw_size() <= budget);
        let ratio = f64::from(out.width()) / f64::from(out.height());
        assert!((ratio - 2.0).abs() < 0.02);
    }

    #[test]
    fn resize_keeps_uniform_colour() {
        let img = Image::filled(3, 3, [9, 8, 7, 255]);
        let big = img.resized(8, 0);
        assert_eq!((big.width(), big.height()), (8, 1));
        assert_eq!(&big.pixels()[..4], &[9, 8, 7, 255]);
    }

    #[test]
    fn encode_shrinks_until_blob_fits() {
        let img = Image::filled(400, 200, [1, 1, 1, 1]);
        let blob = encode_to_fit(&img, usize::MAX, 10_000, &RawCodec).unwrap();
        assert!(blob.len() <= 10_000);
        assert!(blob.len() > 10_000 / 4);
    }

    #[test]
    fn encode_gives_up_below_one_pixel() {
        let img = Image::filled(4, 4, [0; 4]);
        assert_eq!(encode_to_fit(&img, usize::MAX, 3, &RawCodec), Err(ImageError::TooLarge));
    }
}
