//! Decode, strip and bound uploaded images
//!
//! An image is accepted only if its bytes decode in a supported format; the format is
//! taken from the content, never from the file name. Embedded metadata (EXIF, XMP, IPTC, PNG text chunks) is removed; images
//! larger than the configured bound are downscaled, preserving aspect ratio, and
//! re-encoded, which drops metadata as a side effect.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use img_parts::jpeg::Jpeg;
use img_parts::png::Png;
use img_parts::ImageEXIF;
use std::io::Cursor;

const JPEG_APP1: u8 = 0xE1;
const JPEG_APP13: u8 = 0xED;
const PNG_TEXT_CHUNKS: [&[u8; 4]; 3] = [b"tEXt", b"iTXt", b"zTXt"];

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("Unrecognized image format")]
    UnknownFormat,

    #[error("Unsupported image format: {0:?}")]
    UnsupportedFormat(ImageFormat),

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Image task failed: {0}")]
    Task(String),
}

/// Result of sanitizing one image
#[derive(Debug, Clone)]
pub struct SanitizedImage {
    pub data: Vec<u8>,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    pub original_width: u32,
    pub original_height: u32,
}

impl SanitizedImage {
    pub fn content_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    pub fn was_resized(&self) -> bool {
        (self.width, self.height) != (self.original_width, self.original_height)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ImageSanitizer {
    max_width: u32,
    max_height: u32,
}

impl ImageSanitizer {
    pub fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width,
            max_height,
        }
    }

    pub fn bounds(&self) -> (u32, u32) {
        (self.max_width, self.max_height)
    }

    fn is_supported(format: ImageFormat) -> bool {
        matches!(
            format,
            ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::Gif | ImageFormat::Bmp
        )
    }

    /// Sanitize on the blocking pool so decoding never stalls the async runtime.
    pub async fn sanitize_blocking(self, data: Vec<u8>) -> Result<SanitizedImage, ImageError> {
        tokio::task::spawn_blocking(move || self.sanitize(&data))
            .await
            .map_err(|e| ImageError::Task(e.to_string()))?
    }

    /// Decode `data`, strip metadata and fit it within the configured bound.
    pub fn sanitize(&self, data: &[u8]) -> Result<SanitizedImage, ImageError> {
        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| ImageError::Decode(e.to_string()))?;
        let format = reader.format().ok_or(ImageError::UnknownFormat)?;

        if !Self::is_supported(format) {
            return Err(ImageError::UnsupportedFormat(format));
        }

        let img = reader
            .decode()
            .map_err(|e| ImageError::Decode(e.to_string()))?;
        let (original_width, original_height) = img.dimensions();

        if original_width > self.max_width || original_height > self.max_height {
            let resized = img.resize(self.max_width, self.max_height, FilterType::CatmullRom);
            let (width, height) = resized.dimensions();
            let data = encode(resized, format)?;

            tracing::debug!(
                original_width,
                original_height,
                width,
                height,
                format = ?format,
                "Image downscaled to fit bound"
            );

            return Ok(SanitizedImage {
                data,
                format,
                width,
                height,
                original_width,
                original_height,
            });
        }

        Ok(SanitizedImage {
            data: strip_metadata(data, format),
            format,
            width: original_width,
            height: original_height,
            original_width,
            original_height,
        })
    }
}

fn encode(img: DynamicImage, format: ImageFormat) -> Result<Vec<u8>, ImageError> {
    let img = match format {
        ImageFormat::Jpeg => match img {
            DynamicImage::ImageRgb8(_) | DynamicImage::ImageLuma8(_) => img,
            other => DynamicImage::ImageRgb8(other.to_rgb8()),
        },
        ImageFormat::Gif => DynamicImage::ImageRgba8(img.to_rgba8()),
        _ => img,
    };

    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), format)
        .map_err(|e| ImageError::Encode(e.to_string()))?;
    Ok(buffer)
}

/// Remove metadata containers without re-encoding pixels.
///
/// GIF and BMP carry no EXIF container and are returned unchanged.
fn strip_metadata(data: &[u8], format: ImageFormat) -> Vec<u8> {
    match format {
        ImageFormat::Jpeg => match Jpeg::from_bytes(data.to_vec().into()) {
            Ok(mut jpeg) => {
                jpeg.set_exif(None);
                jpeg.segments_mut()
                    .retain(|segment| !matches!(segment.marker(), JPEG_APP1 | JPEG_APP13));
                jpeg.encoder().bytes().to_vec()
            }
            Err(e) => {
                tracing::debug!(error = %e, "JPEG container not parseable, keeping decoded bytes");
                data.to_vec()
            }
        },
        ImageFormat::Png => match Png::from_bytes(data.to_vec().into()) {
            Ok(mut png) => {
                png.set_exif(None);
                png.chunks_mut()
                    .retain(|chunk| !PNG_TEXT_CHUNKS.contains(&&chunk.kind()));
                png.encoder().bytes().to_vec()
            }
            Err(e) => {
                tracing::debug!(error = %e, "PNG container not parseable, keeping decoded bytes");
                data.to_vec()
            }
        },
        _ => data.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        })
    }

    fn encode_test_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(gradient(width, height));
        let img = if format == ImageFormat::Gif {
            DynamicImage::ImageRgba8(img.to_rgba8())
        } else {
            img
        };
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), format).unwrap();
        buffer
    }

    fn dimensions_of(data: &[u8]) -> (u32, u32) {
        ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .unwrap()
            .decode()
            .unwrap()
            .dimensions()
    }

    #[test]
    fn test_small_png_passes_through_unscaled() {
        let sanitizer = ImageSanitizer::new(1920, 1080);
        let data = encode_test_image(64, 48, ImageFormat::Png);

        let result = sanitizer.sanitize(&data).unwrap();
        assert_eq!((result.width, result.height), (64, 48));
        assert!(!result.was_resized());
        assert_eq!(result.content_type(), "image/png");
        assert_eq!(dimensions_of(&result.data), (64, 48));
    }

    #[test]
    fn test_oversized_image_is_downscaled_preserving_aspect() {
        let sanitizer = ImageSanitizer::new(1920, 1080);
        let data = encode_test_image(2400, 1200, ImageFormat::Png);

        let result = sanitizer.sanitize(&data).unwrap();
        assert!(result.was_resized());
        assert_eq!((result.width, result.height), (1920, 960));
        assert_eq!(dimensions_of(&result.data), (1920, 960));
    }

    #[test]
    fn test_tall_jpeg_is_bounded_by_height() {
        let sanitizer = ImageSanitizer::new(400, 300);
        let data = encode_test_image(300, 600, ImageFormat::Jpeg);

        let result = sanitizer.sanitize(&data).unwrap();
        assert_eq!((result.width, result.height), (150, 300));
        assert_eq!(result.content_type(), "image/jpeg");
        let ratio_before = 300.0 / 600.0;
        let ratio_after = result.width as f64 / result.height as f64;
        assert!((ratio_before - ratio_after).abs() < 0.01);
    }

    #[test]
    fn test_non_image_bytes_are_rejected() {
        let sanitizer = ImageSanitizer::new(1920, 1080);
        let mut fake = b"MZ\x90\x00\x03\x00\x00\x00".to_vec();
        fake.extend(std::iter::repeat(0u8).take(512));

        let err = sanitizer.sanitize(&fake).unwrap_err();
        assert!(matches!(
            err,
            ImageError::UnknownFormat | ImageError::Decode(_)
        ));
    }

    #[test]
    fn test_truncated_png_is_rejected() {
        let sanitizer = ImageSanitizer::new(1920, 1080);
        let data = encode_test_image(200, 200, ImageFormat::Png);
        let truncated = &data[..data.len() / 2];

        assert!(sanitizer.sanitize(truncated).is_err());
    }

    #[test]
    fn test_format_is_detected_from_content() {
        let sanitizer = ImageSanitizer::new(1920, 1080);
        let data = encode_test_image(10, 10, ImageFormat::Png);

        let result = sanitizer.sanitize(&data).unwrap();
        assert_eq!(result.format, ImageFormat::Png);
        assert_eq!(result.content_type(), "image/png");
    }

    #[test]
    fn test_png_text_chunks_are_removed() {
        let data = encode_test_image(16, 16, ImageFormat::Png);
        let mut png = Png::from_bytes(data.into()).unwrap();
        let text = img_parts::png::PngChunk::new(
            *b"tEXt",
            bytes::Bytes::from_static(b"Location\x0048.85,2.35"),
        );
        let position = png.chunks().len() - 1;
        png.chunks_mut().insert(position, text);
        let tagged = png.encoder().bytes().to_vec();
        assert!(tagged.windows(4).any(|w| w == b"tEXt"));

        let result = ImageSanitizer::new(1920, 1080)
            .sanitize(&tagged)
            .unwrap();
        assert!(!result.data.windows(4).any(|w| w == b"tEXt"));
        assert_eq!(dimensions_of(&result.data), (16, 16));
    }

    #[test]
    fn test_jpeg_exif_is_removed() {
        let data = encode_test_image(32, 32, ImageFormat::Jpeg);
        let mut jpeg = Jpeg::from_bytes(data.into()).unwrap();
        let mut exif = b"MM\x00\x2a\x00\x00\x00\x08\x00\x00".to_vec();
        exif.extend_from_slice(b"GPS-MARKER");
        jpeg.set_exif(Some(exif.into()));
        let tagged = jpeg.encoder().bytes().to_vec();
        assert!(tagged.windows(10).any(|w| w == b"GPS-MARKER"));

        let result = ImageSanitizer::new(1920, 1080)
            .sanitize(&tagged)
            .unwrap();
        assert!(!result.data.windows(10).any(|w| w == b"GPS-MARKER"));
        assert_eq!(dimensions_of(&result.data), (32, 32));
    }

    #[tokio::test]
    async fn test_sanitize_blocking() {
        let data = encode_test_image(20, 10, ImageFormat::Gif);
        let result = ImageSanitizer::new(10, 10)
            .sanitize_blocking(data)
            .await
            .unwrap();
        assert_eq!((result.width, result.height), (10, 5));
        assert_eq!(result.format, ImageFormat::Gif);
    }
}
