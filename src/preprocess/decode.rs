// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Decoding raw image sources into frames the preprocessor can transform.
//!
//! Uploads arrive as encoded bytes (PNG, JPEG, WebP, ...); the camera
//! capability hands over raw RGB pixel buffers. Both end up as
//! [`DynamicImage`] frames.

use image::{DynamicImage, ImageFormat, RgbImage};
use thiserror::Error;

/// Maximum accepted encoded image size (10MB)
const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("image data is too large: {0} bytes (max: {1} bytes)")]
    TooLarge(usize, usize),

    #[error("unsupported image format")]
    UnsupportedFormat,

    #[error("failed to decode image: {0}")]
    DecodeFailed(String),

    #[error("image data is empty")]
    EmptyData,

    #[error("pixel buffer size {got} does not match {width}x{height} RGB frame")]
    BufferMismatch { got: usize, width: u32, height: u32 },
}

/// Metadata extracted while decoding an upload.
#[derive(Debug, Clone)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    pub size_bytes: usize,
}

/// Decodes encoded still-image bytes (uploads) into a frame.
pub fn decode_image_bytes(bytes: &[u8]) -> Result<(DynamicImage, ImageInfo), DecodeError> {
    if bytes.len() > MAX_IMAGE_SIZE {
        return Err(DecodeError::TooLarge(bytes.len(), MAX_IMAGE_SIZE));
    }
    if bytes.is_empty() {
        return Err(DecodeError::EmptyData);
    }

    let format = detect_format(bytes)?;
    let img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| DecodeError::DecodeFailed(e.to_string()))?;

    let info = ImageInfo {
        width: img.width(),
        height: img.height(),
        format,
        size_bytes: bytes.len(),
    };
    Ok((img, info))
}

/// Wraps a captured raw RGB8 pixel buffer (one camera frame) as a frame.
pub fn frame_from_rgb(pixels: Vec<u8>, width: u32, height: u32) -> Result<DynamicImage, DecodeError> {
    let expected = width as usize * height as usize * 3;
    if pixels.len() != expected || expected == 0 {
        return Err(DecodeError::BufferMismatch {
            got: pixels.len(),
            width,
            height,
        });
    }
    let buffer = RgbImage::from_raw(width, height, pixels).ok_or(DecodeError::BufferMismatch {
        got: expected,
        width,
        height,
    })?;
    Ok(DynamicImage::ImageRgb8(buffer))
}

/// Detects the encoded format from magic bytes.
pub fn detect_format(bytes: &[u8]) -> Result<ImageFormat, DecodeError> {
    if bytes.len() < 4 {
        return Err(DecodeError::UnsupportedFormat);
    }

    match bytes {
        // PNG: 89 50 4E 47 (0x89 P N G)
        [0x89, 0x50, 0x4E, 0x47, ..] => Ok(ImageFormat::Png),

        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => Ok(ImageFormat::Jpeg),

        // WebP: RIFF .... WEBP
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Ok(ImageFormat::WebP),

        // GIF: GIF87a or GIF89a
        [0x47, 0x49, 0x46, 0x38, x, ..] if *x == 0x37 || *x == 0x39 => Ok(ImageFormat::Gif),

        // BMP: BM
        [0x42, 0x4D, ..] => Ok(ImageFormat::Bmp),

        _ => Err(DecodeError::UnsupportedFormat),
    }
}
