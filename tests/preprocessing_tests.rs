//! # Preprocessing Tests Module
//!
//! End-to-end checks of the binarization pipeline: Base64 in, data URI out.


#[cfg(test)]
mod tests {
    use super::test_helpers::*;
    use image::{DynamicImage, ImageFormat};
    use ocr_binarizer::codec::{self, ImageFormatTag, ImagePayload};
    use ocr_binarizer::ocr_errors::OcrError;
    use ocr_binarizer::preprocessing::{binarize, preprocess_image, to_grayscale, Threshold};

    fn samples(image: &DynamicImage) -> Vec<u8> {
        image.to_luma8().into_raw()
    }

    #[test]
    fn test_all_white_png_stays_white() {
        let input = png_data_uri(&gray_2x2([255; 4]));

        let result = preprocess_image(&input, Threshold::new(128)).unwrap();
        let (prefix, output) = decode_data_uri(&result.data_uri);

        assert_eq!(prefix, "data:image/png;base64");
        assert_eq!((output.width(), output.height()), (2, 2));
        assert_eq!(samples(&output), vec![255; 4]);
    }

    #[test]
    fn test_mixed_luminance_example() {
        let input = png_data_uri(&gray_2x2([100, 150, 128, 200]));

        let result = preprocess_image(&input, Threshold::new(128)).unwrap();
        let (_, output) = decode_data_uri(&result.data_uri);

        assert_eq!(samples(&output), vec![0, 255, 0, 255]);
        assert_eq!(result.threshold, Threshold::new(128));
        assert_eq!(result.format, ImageFormatTag::Png);
    }

    #[test]
    fn test_output_is_strictly_binary_for_every_threshold() {
        let gray = to_grayscale(&gradient_rgb(16, 16));

        for t in 0..=255u8 {
            let binary = binarize(&gray, Threshold::new(t));
            for (source, out) in gray.pixels().zip(binary.as_gray().pixels()) {
                let expected = if source[0] > t { 255 } else { 0 };
                assert_eq!(out[0], expected, "threshold {} sample {}", t, source[0]);
            }
        }
    }

    #[test]
    fn test_binarizing_a_binary_image_is_idempotent() {
        let input = png_data_uri(&gradient_rgb(12, 9));
        let first = preprocess_image(&input, Threshold::new(100)).unwrap();
        let (_, once) = decode_data_uri(&first.data_uri);

        for t in 1..=254u8 {
            let again = preprocess_image(&first.data_uri, Threshold::new(t)).unwrap();
            let (_, twice) = decode_data_uri(&again.data_uri);
            assert_eq!(samples(&once), samples(&twice), "threshold {}", t);
        }
    }

    #[test]
    fn test_png_round_trip_preserves_dimensions_and_format() {
        let image = gradient_rgb(7, 5);
        let bytes = codec::encode_image(&image, ImageFormatTag::Png).unwrap();

        let payload = ImagePayload::from_bytes(bytes).unwrap();
        assert_eq!(payload.format(), ImageFormatTag::Png);

        let decoded = codec::decode_pixels(&payload).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (7, 5));
    }

    #[test]
    fn test_jpeg_stays_jpeg() {
        let input = jpeg_data_uri(&gradient_rgb(10, 6));

        let result = preprocess_image(&input, Threshold::default()).unwrap();

        assert_eq!(result.format, ImageFormatTag::Jpeg);
        assert!(result.data_uri.starts_with("data:image/jpeg;base64,"));
        assert_eq!(result.dimensions, (10, 6));
    }

    #[test]
    fn test_raw_base64_without_prefix_is_accepted() {
        let bytes = encode(&gray_2x2([0, 255, 0, 255]), ImageFormat::Png);

        let result = preprocess_image(&to_base64(&bytes), Threshold::default()).unwrap();
        let (_, output) = decode_data_uri(&result.data_uri);

        assert_eq!(samples(&output), vec![0, 255, 0, 255]);
    }

    #[test]
    fn test_format_follows_bytes_not_prefix() {
        // PNG bytes behind a JPEG prefix come back as PNG
        let bytes = encode(&gray_2x2([10, 20, 30, 40]), ImageFormat::Png);
        let input = format!("data:image/jpeg;base64,{}", to_base64(&bytes));

        let result = preprocess_image(&input, Threshold::default()).unwrap();
        assert_eq!(result.format, ImageFormatTag::Png);
    }

    #[test]
    fn test_garbage_is_decode_error() {
        assert!(matches!(
            preprocess_image("data:image/png;base64,!!!not base64!!!", Threshold::default()),
            Err(OcrError::Decode(_))
        ));

        // valid Base64, but not an image
        let input = format!("data:image/png;base64,{}", to_base64(b"hello world"));
        assert!(matches!(
            preprocess_image(&input, Threshold::default()),
            Err(OcrError::Decode(_))
        ));

        assert!(matches!(
            preprocess_image("", Threshold::default()),
            Err(OcrError::Decode(_))
        ));
    }

    #[test]
    fn test_alpha_channel_is_flattened() {
        let image = DynamicImage::ImageLumaA8(image::GrayAlphaImage::from_raw(
            2,
            1,
            vec![255, 255, 255, 0],
        )
        .unwrap());
        let input = png_data_uri(&image);

        let result = preprocess_image(&input, Threshold::new(128)).unwrap();
        let (_, output) = decode_data_uri(&result.data_uri);

        // opaque white stays white, transparent white reads as black
        assert_eq!(samples(&output), vec![255, 0]);
        assert_eq!(output.color(), image::ColorType::L8);
    }
}
