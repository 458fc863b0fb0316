//! Image codec on the `image` crate.
//!
//! Inbound blobs are standard image files (PNG or JPEG, sniffed from the
//! magic bytes).  Replies are JPEG at quality 90; alpha is dropped.
//!
//! Decoding runs under [`image::Limits`] so a small blob cannot declare a
//! bitmap larger than [`MAX_SIDE`] on either axis.

use std::io::Cursor;

use image::buffer::ConvertBuffer;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageReader, Limits, RgbImage};
use log::debug;

use crate::app::ports::ImageCodec;
use crate::error::ImageError;
use crate::rpc::image::Image;

/// Largest accepted side, in pixels.
pub const MAX_SIDE: u32 = 4096;

/// JPEG quality for outbound images.
pub const JPEG_QUALITY: u8 = 90;

#[derive(Debug, Default, Clone, Copy)]
pub struct JpegImageCodec;

fn limits() -> Limits {
    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_SIDE);
    limits.max_image_height = Some(MAX_SIDE);
    limits
}

impl ImageCodec for JpegImageCodec {
    fn decode(&self, blob: &[u8]) -> Result<Image, ImageError> {
        let mut reader = ImageReader::new(Cursor::new(blob))
            .with_guessed_format()
            .map_err(|_| ImageError::UnknownFormat)?;
        if reader.format().is_none() {
            return Err(ImageError::UnknownFormat);
        }
        reader.limits(limits());

        let decoded = reader.decode().map_err(|e| {
            debug!("IMAGE: decode failed: {e}");
            match e {
                image::ImageError::Limits(_) => ImageError::BadDimensions,
                image::ImageError::Unsupported(_) => ImageError::UnknownFormat,
                _ => ImageError::Corrupt,
            }
        })?;
        if decoded.width() == 0 || decoded.height() == 0 {
            return Err(ImageError::BadDimensions);
        }
        Ok(decoded.to_rgba8().into())
    }

    fn encode(&self, image: &Image) -> Result<Vec<u8>, ImageError> {
        let rgb: RgbImage = image.as_rgba().convert();
        let mut blob = Vec::new();
        JpegEncoder::new_with_quality(&mut blob, JPEG_QUALITY)
            .encode_image(&rgb)
            .map_err(|e| {
                debug!("IMAGE: encode failed: {e}");
                ImageError::Encode
            })?;
        Ok(blob)
    }
}
