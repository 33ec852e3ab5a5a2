//! Output encoding: canvas to data URI and blob

use std::io;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use image::{ImageEncoder, RgbImage, RgbaImage};

use crate::domain::{Blob, CaptureResult, ImageFormat};
use crate::error::{CaptureError, Result};

/// Encode the final canvas in `format`.
///
/// `quality` (0-100) only affects JPEG; PNG and SVG are lossless and the WebP
/// encoder only writes lossless images.
pub fn encode(image: &RgbaImage, format: ImageFormat, quality: u8) -> Result<CaptureResult> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(CaptureError::encoding(format, "canvas has no pixels"));
    }

    let bytes = match format {
        ImageFormat::Png => png_bytes(image)?,
        ImageFormat::Jpeg => {
            let rgb = flatten(image, [255, 255, 255]);
            let mut buffer = Vec::new();
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
                .write_image(rgb.as_raw(), width, height, image::ExtendedColorType::Rgb8)
                .map_err(|e| CaptureError::encoding(format, e))?;
            buffer
        }
        ImageFormat::Webp => {
            let mut buffer = Vec::new();
            image::codecs::webp::WebPEncoder::new_lossless(&mut buffer)
                .write_image(image.as_raw(), width, height, image::ExtendedColorType::Rgba8)
                .map_err(|e| CaptureError::encoding(format, e))?;
            buffer
        }
        ImageFormat::Svg => svg_document(&png_bytes(image)?, width, height).into_bytes(),
    };

    log::debug!(
        "Encoded {}x{} canvas as {} ({} bytes)",
        width,
        height,
        format,
        bytes.len()
    );

    Ok(CaptureResult {
        data_url: data_url(format.mime_type(), &bytes),
        blob: Blob {
            mime_type: format.mime_type().to_string(),
            bytes,
        },
        width,
        height,
    })
}

/// `data:` URI carrying `bytes` as base64
pub fn data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, BASE64_STANDARD.encode(bytes))
}

fn png_bytes(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_png(&mut buffer, image).map_err(|e| CaptureError::encoding(ImageFormat::Png, e))?;
    Ok(buffer)
}

pub fn write_png<W: io::Write>(w: W, image: &RgbaImage) -> Result<(), png::EncodingError> {
    let mut encoder = png::Encoder::new(w, image.width(), image.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(image.as_raw())
}

/// Wrap a PNG raster in an SVG document of the same size
fn svg_document(png: &[u8], width: u32, height: u32) -> String {
    format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" "#,
            r#"xmlns:xlink="http://www.w3.org/1999/xlink" "#,
            r#"width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            r#"<image width="{w}" height="{h}" href="{href}" xlink:href="{href}"/>"#,
            "</svg>"
        ),
        w = width,
        h = height,
        href = data_url(ImageFormat::Png.mime_type(), png),
    )
}

/// Composite over an opaque background for formats without alpha
fn flatten(image: &RgbaImage, background: [u8; 3]) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, a] = image.get_pixel(x, y).0;
        let alpha = a as u32;
        let blend =
            |fg: u8, bg: u8| ((fg as u32 * alpha + bg as u32 * (255 - alpha) + 127) / 255) as u8;
        image::Rgb([
            blend(r, background[0]),
            blend(g, background[1]),
            blend(b, background[2]),
        ])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RgbaImage {
        RgbaImage::from_fn(32, 16, |x, y| image::Rgba([(x * 8) as u8, (y * 16) as u8, 90, 255]))
    }

    #[test]
    fn test_jpeg_output() {
        let result = encode(&sample(), ImageFormat::Jpeg, 90).unwrap();
        assert!(result.data_url.starts_with("data:image/jpeg;base64,"));
        assert_eq!(result.blob.mime_type, "image/jpeg");
        assert_eq!(&result.blob.bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_png_output_decodes_back() {
        let img = sample();
        let result = encode(&img, ImageFormat::Png, 0).unwrap();
        assert!(result.data_url.starts_with("data:image/png;base64,"));
        let decoded = image::load_from_memory(&result.blob.bytes).unwrap().to_rgba8();
        assert_eq!(decoded, img);
    }

    #[test]
    fn test_webp_output() {
        let result = encode(&sample(), ImageFormat::Webp, 50).unwrap();
        assert_eq!(result.blob.mime_type, "image/webp");
        assert_eq!(&result.blob.bytes[..4], b"RIFF");
        assert_eq!(&result.blob.bytes[8..12], b"WEBP");
    }

    #[test]
    fn test_svg_wraps_png() {
        let result = encode(&sample(), ImageFormat::Svg, 90).unwrap();
        assert!(result.data_url.starts_with("data:image/svg+xml;base64,"));
        assert_eq!(result.blob.mime_type, "image/svg+xml");
        let text = String::from_utf8(result.blob.bytes).unwrap();
        assert!(text.starts_with("<svg"));
        assert!(text.contains(r#"width="32" height="16""#));
        assert!(text.contains("<image"));
        assert!(text.contains("data:image/png;base64,"));
    }

    #[test]
    fn test_empty_canvas_fails() {
        let err = encode(&RgbaImage::new(0, 0), ImageFormat::Png, 90).unwrap_err();
        assert!(matches!(err, CaptureError::Encoding { .. }));
    }

    #[test]
    fn test_flatten_blends_over_background() {
        let img = RgbaImage::from_pixel(1, 1, image::Rgba([0, 0, 0, 0]));
        assert_eq!(flatten(&img, [255, 255, 255]).get_pixel(0, 0).0, [255, 255, 255]);
        let img = RgbaImage::from_pixel(1, 1, image::Rgba([0, 0, 0, 255]));
        assert_eq!(flatten(&img, [255, 255, 255]).get_pixel(0, 0).0, [0, 0, 0]);
    }
}
