// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image-to-tensor preprocessing for the classifier.
//!
//! A raw source (decoded upload or captured camera frame) becomes a
//! fixed-size normalized tensor of shape `[1, S, S, 3]`. Every intermediate
//! buffer drops inside [`ImagePreprocessor::transform`]; the returned
//! [`PreparedImage`] is the only thing that leaves the call, and it is
//! consumed by value by exactly one prediction.

pub mod decode;

pub use decode::{decode_image_bytes, detect_format, frame_from_rgb, DecodeError, ImageInfo};

use image::imageops::FilterType;
use image::{DynamicImage, RgbaImage};
use ndarray::Array4;
use tracing::debug;

/// Where a frame came from. Both kinds go through the same transform; the
/// distinction survives for logging and the caller's bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// A still image (upload, file).
    Still,
    /// A frame captured from a live video source.
    LiveFrame,
}

/// Normalized model input, shape `[1, S, S, 3]`, values in `(x/127) - 1`.
///
/// Owned by the caller for exactly one inference call; `predict` takes it by
/// value, so it cannot outlive the call that consumes it.
#[derive(Debug)]
pub struct PreparedImage {
    tensor: Array4<f32>,
}

impl PreparedImage {
    pub fn shape(&self) -> &[usize] {
        self.tensor.shape()
    }

    pub(crate) fn into_tensor(self) -> Array4<f32> {
        self.tensor
    }

    #[cfg(test)]
    pub(crate) fn tensor(&self) -> &Array4<f32> {
        &self.tensor
    }
}

pub struct ImagePreprocessor {
    input_size: u32,
}

impl ImagePreprocessor {
    pub fn new(input_size: u32) -> Self {
        Self { input_size }
    }

    /// Converts a source image into the model's input tensor: bilinear resize
    /// to S×S, leading batch dimension of 1, pixel range `[0,255]` mapped via
    /// `(x/127) - 1`. The source is borrowed and never mutated.
    pub fn transform(&self, source: &DynamicImage, kind: SourceKind) -> PreparedImage {
        let size = self.input_size;
        let resized = source
            .resize_exact(size, size, FilterType::Triangle)
            .to_rgb8();

        let side = size as usize;
        let mut tensor = Array4::<f32>::zeros((1, side, side, 3));
        for (x, y, pixel) in resized.enumerate_pixels() {
            for channel in 0..3 {
                tensor[[0, y as usize, x as usize, channel]] =
                    f32::from(pixel[channel]) / 127.0 - 1.0;
            }
        }

        debug!(
            ?kind,
            width = source.width(),
            height = source.height(),
            input_size = size,
            "frame transformed"
        );
        PreparedImage { tensor }
    }

    /// Draws a scaled, aspect-ratio-preserved copy of `source` into `canvas`,
    /// letterboxed against the canvas origin. Pure side effect on `canvas`.
    pub fn render_thumbnail(&self, source: &DynamicImage, canvas: &mut RgbaImage) {
        let (cw, ch) = (canvas.width(), canvas.height());
        if cw == 0 || ch == 0 || source.width() == 0 || source.height() == 0 {
            return;
        }

        let ratio_x = cw as f64 / source.width() as f64;
        let ratio_y = ch as f64 / source.height() as f64;
        let ratio = ratio_x.min(ratio_y);
        let thumb_w = ((source.width() as f64 * ratio).round() as u32).max(1);
        let thumb_h = ((source.height() as f64 * ratio).round() as u32).max(1);

        let thumb = source
            .resize_exact(thumb_w, thumb_h, FilterType::Triangle)
            .to_rgba8();

        for pixel in canvas.pixels_mut() {
            *pixel = image::Rgba([0, 0, 0, 0]);
        }
        image::imageops::overlay(canvas, &thumb, 0, 0);
    }
}
