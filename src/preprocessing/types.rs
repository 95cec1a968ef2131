//! # Shared Types for Image Preprocessing
//!
//! This module contains the value types passed between the thresholding
//! functions and the preprocessing pipeline.

use image::{DynamicImage, GrayImage};

use crate::codec::ImageFormatTag;
use crate::errors::AppError;

/// Threshold used when the caller omits one
pub const DEFAULT_THRESHOLD: u8 = 128;

/// Cut value separating black from white: samples strictly above it become white.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Threshold(u8);

impl Threshold {
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u8 {
        self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self(DEFAULT_THRESHOLD)
    }
}

impl From<u8> for Threshold {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl TryFrom<i64> for Threshold {
    type Error = AppError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value).map(Self).map_err(|_| {
            AppError::Validation(format!("threshold must be between 0 and 255, got {}", value))
        })
    }
}

/// Grayscale image whose samples are exactly 0 (black) or 255 (white)
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryImage(GrayImage);

impl BinaryImage {
    /// Wrap an image produced by thresholding; the caller upholds the 0/255 invariant
    pub(crate) fn from_thresholded(image: GrayImage) -> Self {
        debug_assert!(image.pixels().all(|p| p[0] == 0 || p[0] == 255));
        Self(image)
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.0
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn into_dynamic(self) -> DynamicImage {
        DynamicImage::ImageLuma8(self.0)
    }
}

/// Result of the preprocessing pipeline.
#[derive(Debug, Clone)]
pub struct PreprocessedImage {
    /// `data:image/<fmt>;base64,...` string of the binary image
    pub data_uri: String,
    /// Format the image arrived in and was re-encoded to
    pub format: ImageFormatTag,
    /// Image dimensions (width, height)
    pub dimensions: (u32, u32),
    /// Threshold applied
    pub threshold: Threshold,
}
