use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ImageReader, Limits};
use pxb_core::CoreError;

/// Largest width or height accepted from a chat, in pixels.
pub const MAX_SIDE: u32 = 16_384;

/// Decode downloaded bytes into an image.
///
/// The format is guessed from the content, not from a file name.
/// Decoding is bounded by [`MAX_SIDE`] and the image crate's default
/// allocation limit.
///
/// # Errors
/// Returns `CoreError::InvalidImage` for unknown, truncated or oversized input.
///
/// # Example
/// ```
/// use pxb_source::codec::decode;
/// assert!(decode(b"definitely not an image").is_err());
/// ```
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, CoreError> {
    let mut reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| CoreError::InvalidImage(e.to_string()))?;

    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_SIDE);
    limits.max_image_height = Some(MAX_SIDE);
    reader.limits(limits);

    let img = reader
        .decode()
        .map_err(|e| CoreError::InvalidImage(e.to_string()))?;
    log::debug!("Image décodée : {}×{}", img.width(), img.height());
    Ok(img)
}

/// Encode as baseline JPEG. Alpha is dropped.
///
/// # Errors
/// Returns `CoreError::InvalidImage` if the encoder rejects the image.
pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, CoreError> {
    let mut buf = Vec::new();
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))
        .map_err(|e| CoreError::InvalidImage(format!("JPEG encode: {e}")))?;
    Ok(buf)
}

/// Encode as lossless WebP, the sticker upload format.
///
/// # Errors
/// Returns `CoreError::InvalidImage` if the encoder rejects the image.
pub fn encode_webp(img: &DynamicImage) -> Result<Vec<u8>, CoreError> {
    let mut buf = Vec::new();
    let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
    rgba.write_with_encoder(WebPEncoder::new_lossless(&mut buf))
        .map_err(|e| CoreError::InvalidImage(format!("WebP encode: {e}")))?;
    Ok(buf)
}
