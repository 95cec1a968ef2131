//! # Image Thresholding Module
//!
//! Grayscale conversion and fixed-threshold binarization. Both functions are
//! pure per-pixel maps: every output sample depends only on the input sample
//! at the same position.

use image::{DynamicImage, GrayImage, Luma};

use super::types::{BinaryImage, Threshold};

// ITU-R BT.601 luma weights in 16.16 fixed point (0.299, 0.587, 0.114)
const LUMA_R: u64 = 19595;
const LUMA_G: u64 = 38470;
const LUMA_B: u64 = 7471;

/// Reduces an image to single-channel luminance.
///
/// Single-channel 8-bit images are copied as-is. Colour images use BT.601
/// weights on 16-bit channels with a single rounding step at the end; alpha
/// is premultiplied first, so fully transparent pixels read as black.
/// Dimensions are preserved exactly.
///
/// # Examples
///
/// ```
/// use image::{DynamicImage, Rgb, RgbImage};
/// use ocr_binarizer::preprocessing::to_grayscale;
///
/// let white = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([255, 255, 255])));
/// let gray = to_grayscale(&white);
/// assert!(gray.pixels().all(|p| p[0] == 255));
/// ```
pub fn to_grayscale(image: &DynamicImage) -> GrayImage {
    if let DynamicImage::ImageLuma8(gray) = image {
        return gray.clone();
    }

    // 8-bit sources widen as c * 0x101, so 0xff maps to 0xffff
    let rgba = image.to_rgba16();
    let mut gray = GrayImage::new(rgba.width(), rgba.height());

    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let luma = luminance(
            premultiply(r, a),
            premultiply(g, a),
            premultiply(b, a),
        );
        gray.put_pixel(x, y, Luma([luma]));
    }

    gray
}

/// Classifies every sample as black or white.
///
/// A sample strictly greater than `threshold` becomes 255, everything else
/// (including a sample equal to the threshold) becomes 0.
///
/// # Examples
///
/// ```
/// use image::GrayImage;
/// use ocr_binarizer::preprocessing::{binarize, Threshold};
///
/// let gray = GrayImage::from_raw(2, 2, vec![100, 150, 128, 200]).unwrap();
/// let binary = binarize(&gray, Threshold::new(128));
/// assert_eq!(binary.as_gray().as_raw(), &vec![0, 255, 0, 255]);
/// ```
pub fn binarize(gray: &GrayImage, threshold: Threshold) -> BinaryImage {
    let cut = threshold.value();
    let mut binary = gray.clone();

    for pixel in binary.pixels_mut() {
        pixel[0] = if pixel[0] > cut { 255 } else { 0 };
    }

    tracing::debug!(
        target: "ocr_preprocessing",
        "Binarized {}x{} image at threshold {}",
        binary.width(),
        binary.height(),
        cut
    );

    BinaryImage::from_thresholded(binary)
}

/// Premultiply a 16-bit channel by a 16-bit alpha, truncating
fn premultiply(channel: u16, alpha: u16) -> u64 {
    u64::from(channel) * u64::from(alpha) / 0xffff
}

/// Weighted sum of premultiplied 16-bit channels, rounded once to 8 bits
fn luminance(r: u64, g: u64, b: u64) -> u8 {
    ((LUMA_R * r + LUMA_G * g + LUMA_B * b + (1 << 15)) >> 24) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    fn luma8(r: u8, g: u8, b: u8) -> u8 {
        let wide = |c: u8| u64::from(c) * 0x101;
        luminance(wide(r), wide(g), wide(b))
    }

    fn gray_of(pixel: Rgba<u8>) -> u8 {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 1, pixel));
        to_grayscale(&img).get_pixel(0, 0)[0]
    }

    #[test]
    fn test_luminance_extremes() {
        assert_eq!(luma8(0, 0, 0), 0);
        assert_eq!(luma8(255, 255, 255), 255);
    }

    #[test]
    fn test_luminance_weights_green_heaviest() {
        let r = luma8(255, 0, 0);
        let g = luma8(0, 255, 0);
        let b = luma8(0, 0, 255);
        assert!(g > r && r > b);
        assert_eq!(r, 76);
        assert_eq!(g, 150);
        assert_eq!(b, 29);
    }

    #[test]
    fn test_luminance_rounds_once_from_16_bit_channels() {
        // 8-bit rounding of the weighted sum would give 101 here
        assert_eq!(gray_of(Rgba([0, 122, 254, 255])), 100);
        assert_eq!(luma8(0, 122, 254), 100);

        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(1, 1, Rgb([0, 122, 254])));
        let binary = binarize(&to_grayscale(&img), Threshold::new(100));
        assert_eq!(binary.as_gray().get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn test_partial_alpha_premultiplies_in_16_bits() {
        // 0xffff * 0x8080 / 0xffff = 0x8080, weighted sum rounds to 128
        assert_eq!(gray_of(Rgba([255, 255, 255, 128])), 128);
        assert_eq!(premultiply(0xffff, 0x8080), 0x8080);
        assert_eq!(premultiply(0x8080, 0), 0);
    }

    #[test]
    fn test_grayscale_preserves_dimensions() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(7, 3, Rgb([12, 34, 56])));
        let gray = to_grayscale(&img);
        assert_eq!(gray.dimensions(), (7, 3));
    }

    #[test]
    fn test_grayscale_of_gray_is_identity() {
        let src = GrayImage::from_raw(2, 1, vec![17, 240]).unwrap();
        let gray = to_grayscale(&DynamicImage::ImageLuma8(src.clone()));
        assert_eq!(gray, src);
    }

    #[test]
    fn test_transparent_pixels_read_as_black() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 1, Rgba([255, 255, 255, 0])));
        assert_eq!(to_grayscale(&img).get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn test_binarize_tie_goes_to_black() {
        let gray = GrayImage::from_raw(3, 1, vec![127, 128, 129]).unwrap();
        let binary = binarize(&gray, Threshold::new(128));
        assert_eq!(binary.as_gray().as_raw(), &vec![0, 0, 255]);
    }

    #[test]
    fn test_binarize_extreme_thresholds() {
        let gray = GrayImage::from_raw(3, 1, vec![0, 1, 255]).unwrap();

        let all_black = binarize(&gray, Threshold::new(255));
        assert!(all_black.as_gray().pixels().all(|p| p[0] == 0));

        let zero = binarize(&gray, Threshold::new(0));
        assert_eq!(zero.as_gray().as_raw(), &vec![0, 255, 255]);
    }
}
