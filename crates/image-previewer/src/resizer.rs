//! Format sniffing and fill-mode resizing

use crate::error::{PreviewerError, Result};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;

/// Bytes inspected when detecting a content type
pub const SNIFF_LEN: usize = 512;

/// Formats the previewer can re-encode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
}

impl ImageKind {
    /// Detect a supported format from the leading bytes of a file
    pub fn sniff(data: &[u8]) -> Option<Self> {
        let header = &data[..data.len().min(SNIFF_LEN)];
        match image::guess_format(header).ok()? {
            ImageFormat::Jpeg => Some(ImageKind::Jpeg),
            ImageFormat::Png => Some(ImageKind::Png),
            ImageFormat::Gif => Some(ImageKind::Gif),
            _ => None,
        }
    }

    pub fn mime_type(self) -> &'static str {
        self.format().to_mime_type()
    }

    fn format(self) -> ImageFormat {
        match self {
            ImageKind::Jpeg => ImageFormat::Jpeg,
            ImageKind::Png => ImageFormat::Png,
            ImageKind::Gif => ImageFormat::Gif,
        }
    }
}

/// Content type for serving a cached blob, from its leading bytes
pub fn content_type(header: &[u8]) -> &'static str {
    let header = &header[..header.len().min(SNIFF_LEN)];
    image::guess_format(header)
        .map(|format| format.to_mime_type())
        .unwrap_or("application/octet-stream")
}

/// Scale `data` to cover `width`x`height`, crop the centre, and re-encode it in its own format
pub fn fill(data: &[u8], width: u32, height: u32) -> Result<(Vec<u8>, ImageKind)> {
    let kind = ImageKind::sniff(data).ok_or(PreviewerError::UnsupportedFileType)?;

    let source = image::load_from_memory_with_format(data, kind.format())?;
    let (src_width, src_height) = source.dimensions();
    let (x, y, crop_width, crop_height) = centre_crop(src_width, src_height, width, height);

    // Cropping first keeps every buffer within the requested size
    let resized = source
        .crop_imm(x, y, crop_width, crop_height)
        .resize_exact(width, height, FilterType::Lanczos3);

    // JPEG has no alpha channel and the GIF encoder wants RGBA frames
    let resized = match kind {
        ImageKind::Jpeg => DynamicImage::ImageRgb8(resized.to_rgb8()),
        ImageKind::Gif => DynamicImage::ImageRgba8(resized.to_rgba8()),
        ImageKind::Png => resized,
    };

    let mut out = Cursor::new(Vec::new());
    resized.write_to(&mut out, kind.format())?;
    Ok((out.into_inner(), kind))
}

/// Largest centred region of the source with the target's aspect ratio, as `(x, y, w, h)`
fn centre_crop(
    src_width: u32,
    src_height: u32,
    width: u32,
    height: u32,
) -> (u32, u32, u32, u32) {
    let (sw, sh) = (u64::from(src_width), u64::from(src_height));
    let (w, h) = (u64::from(width.max(1)), u64::from(height.max(1)));

    let (crop_w, crop_h) = if sw * h > sh * w {
        ((sh * w / h).clamp(1, sw), sh)
    } else {
        (sw, (sw * h / w).clamp(1, sh))
    };

    let (crop_w, crop_h) = (crop_w as u32, crop_h as u32);
    (
        (src_width - crop_w) / 2,
        (src_height - crop_h) / 2,
        crop_w,
        crop_h,
    )
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    /// Encode a gradient test image in `format`
    pub(crate) fn sample_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, 128])
        });
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut out, format)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_sniff_supported_formats() {
        assert_eq!(
            ImageKind::sniff(&sample_image(8, 8, ImageFormat::Png)),
            Some(ImageKind::Png)
        );
        assert_eq!(
            ImageKind::sniff(&sample_image(8, 8, ImageFormat::Jpeg)),
            Some(ImageKind::Jpeg)
        );
        assert_eq!(
            ImageKind::sniff(&sample_image(8, 8, ImageFormat::Gif)),
            Some(ImageKind::Gif)
        );
        assert_eq!(ImageKind::sniff(b"just some text"), None);
        assert_eq!(ImageKind::sniff(b""), None);
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(ImageKind::Jpeg.mime_type(), "image/jpeg");
        assert_eq!(ImageKind::Png.mime_type(), "image/png");
        assert_eq!(ImageKind::Gif.mime_type(), "image/gif");
        assert_eq!(content_type(b"plain"), "application/octet-stream");
    }

    #[test]
    fn test_fill_png_to_exact_dimensions() {
        let source = sample_image(64, 32, ImageFormat::Png);
        let (data, kind) = fill(&source, 20, 20).unwrap();

        assert_eq!(kind, ImageKind::Png);
        assert_eq!(content_type(&data), "image/png");
        let decoded = image::load_from_memory(&data).unwrap();
        assert_eq!(decoded.dimensions(), (20, 20));
    }

    #[test]
    fn test_fill_keeps_jpeg_and_gif_formats() {
        let (data, kind) = fill(&sample_image(40, 30, ImageFormat::Jpeg), 10, 15).unwrap();
        assert_eq!(kind, ImageKind::Jpeg);
        assert_eq!(image::load_from_memory(&data).unwrap().dimensions(), (10, 15));

        let (data, kind) = fill(&sample_image(40, 30, ImageFormat::Gif), 12, 6).unwrap();
        assert_eq!(kind, ImageKind::Gif);
        assert_eq!(image::load_from_memory(&data).unwrap().dimensions(), (12, 6));
    }

    #[test]
    fn test_centre_crop() {
        // Same aspect ratio keeps the whole source
        assert_eq!(centre_crop(64, 32, 32, 16), (0, 0, 64, 32));
        // Wider source is trimmed left and right
        assert_eq!(centre_crop(64, 32, 20, 20), (16, 0, 32, 32));
        // Taller source is trimmed top and bottom
        assert_eq!(centre_crop(30, 90, 30, 30), (0, 30, 30, 30));
        // Extreme aspect ratios never collapse to an empty region
        assert_eq!(centre_crop(1, 1000, 4096, 1), (0, 499, 1, 1));
        assert_eq!(centre_crop(1000, 1, 1, 4096), (499, 0, 1, 1));
    }

    #[test]
    fn test_fill_narrow_source_stays_within_target() {
        let source = sample_image(1, 400, ImageFormat::Png);
        let (data, _) = fill(&source, 400, 2).unwrap();
        assert_eq!(image::load_from_memory(&data).unwrap().dimensions(), (400, 2));
    }

    #[test]
    fn test_fill_rejects_unsupported_data() {
        let result = fill(b"<html>not an image</html>", 10, 10);
        assert!(matches!(result, Err(PreviewerError::UnsupportedFileType)));
    }

    #[test]
    fn test_fill_reports_corrupt_image() {
        // Valid PNG signature followed by garbage
        let mut data = b"\x89PNG\r\n\x1a\n".to_vec();
        data.extend_from_slice(&[0u8; 64]);
        let result = fill(&data, 10, 10);
        assert!(matches!(result, Err(PreviewerError::Image(_))));
    }
}
