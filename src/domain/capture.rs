//! Capture plan, frame and output types

use std::fmt;
use std::str::FromStr;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use super::geometry::{Document, PixelRect, Rect};

/// Opaque handle naming an element of the captured page
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ElementId(pub String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the caller asked to capture
#[derive(Clone, Debug, PartialEq)]
pub enum CaptureTarget {
    /// A single element, tiled if it is larger than the viewport
    Element(ElementId),
    /// A custom rectangle in document coordinates
    Region(Rect<Document>),
    /// The whole page, scrolled until the bottom is reached
    FullPage,
    /// One scrollable container, scrolled to its end
    ScrollContainer(ElementId),
    /// Whatever is on screen right now
    Visible,
}

/// One viewport-sized (or smaller, at the far edges) slice of the capture
/// region that must be scrolled to and captured
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CaptureTile {
    pub document_x: f64,
    pub document_y: f64,
    pub width: f64,
    pub height: f64,
    pub column: u32,
    pub row: u32,
}

impl CaptureTile {
    pub fn document_rect(&self) -> Rect<Document> {
        Rect::new(self.document_x, self.document_y, self.width, self.height)
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// Offset in device pixels from the top-left of the stitched content
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Placement {
    pub x: i32,
    pub y: i32,
}

/// Result of one acquisition step: a decoded frame plus where and how much of
/// it goes onto the destination canvas
#[derive(Clone, Debug)]
pub struct CapturedFrame {
    pub image: RgbaImage,
    /// Destination of `crop`'s top-left corner on the content canvas
    pub placement: Placement,
    /// Source region of `image` to draw, in device pixels
    pub crop: PixelRect,
    /// Terminal frame of the sequence
    pub is_last_frame: bool,
    /// Height of content this frame contributes, in CSS pixels
    pub last_frame_height: f64,
}

/// RGBA color with 8 bits per channel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TRANSPARENT: Color = Color {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Convert to image crate RGBA format
    pub fn to_rgba_u8(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

impl FromStr for Color {
    type Err = String;

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return Err(format!("invalid color '{s}'"));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|e| format!("invalid color '{s}': {e}"))
        };
        match hex.len() {
            3 => {
                let mut c = [0u8; 3];
                for (i, slot) in c.iter_mut().enumerate() {
                    *slot = channel(i..i + 1)? * 17;
                }
                Ok(Color::rgb(c[0], c[1], c[2]))
            }
            6 | 8 => Ok(Color {
                r: channel(0..2)?,
                g: channel(2..4)?,
                b: channel(4..6)?,
                a: if hex.len() == 8 { channel(6..8)? } else { 255 },
            }),
            _ => Err(format!("invalid color '{s}': expected #rgb, #rrggbb or #rrggbbaa")),
        }
    }
}

/// Optional ring drawn around the stitched content, in CSS pixels
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PaddingSpec {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
    pub color: Color,
    /// Leave the ring transparent when the output format has alpha
    pub transparent_padding: bool,
}

impl PaddingSpec {
    /// Same padding on every side
    pub fn uniform(amount: f64, color: Color) -> Self {
        Self {
            top: amount,
            right: amount,
            bottom: amount,
            left: amount,
            color,
            transparent_padding: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.top <= 0.0 && self.right <= 0.0 && self.bottom <= 0.0 && self.left <= 0.0
    }
}

/// Clip applied to the corners of the final canvas
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CornerStyle {
    /// Corner radius in CSS pixels; zero disables clipping
    pub radius: f64,
    pub use_squircle: bool,
    /// 0 is a circular arc, 1 the smoothest squircle
    pub smoothing: f64,
}

impl Default for CornerStyle {
    fn default() -> Self {
        Self {
            radius: 0.0,
            use_squircle: false,
            smoothing: 0.6,
        }
    }
}

/// Output image format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
    Webp,
    /// PNG raster wrapped in an SVG document
    Svg,
}

impl ImageFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Webp => "image/webp",
            ImageFormat::Svg => "image/svg+xml",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Webp => "webp",
            ImageFormat::Svg => "svg",
        }
    }

    pub fn supports_alpha(&self) -> bool {
        !matches!(self, ImageFormat::Jpeg)
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Webp => "webp",
            ImageFormat::Svg => "svg",
        })
    }
}

impl FromStr for ImageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(ImageFormat::Png),
            "jpeg" | "jpg" => Ok(ImageFormat::Jpeg),
            "webp" => Ok(ImageFormat::Webp),
            "svg" => Ok(ImageFormat::Svg),
            other => Err(format!("unknown image format '{other}'")),
        }
    }
}

/// Encoded binary payload and its MIME type
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Terminal artifact of one capture; owned by the caller
#[derive(Clone, Debug)]
pub struct CaptureResult {
    pub data_url: String,
    pub blob: Blob,
    pub width: u32,
    pub height: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_colors() {
        assert_eq!("#fff".parse::<Color>(), Ok(Color::WHITE));
        assert_eq!("#102030".parse::<Color>(), Ok(Color::rgb(16, 32, 48)));
        assert_eq!(
            "10203040".parse::<Color>(),
            Ok(Color {
                r: 16,
                g: 32,
                b: 48,
                a: 64
            })
        );
        assert!("#12".parse::<Color>().is_err());
        assert!("#zzzzzz".parse::<Color>().is_err());
    }

    #[test]
    fn test_format_properties() {
        assert_eq!("JPG".parse::<ImageFormat>(), Ok(ImageFormat::Jpeg));
        assert!(!ImageFormat::Jpeg.supports_alpha());
        assert!(ImageFormat::Webp.supports_alpha());
        assert_eq!(ImageFormat::Svg.mime_type(), "image/svg+xml");
        assert!("gif".parse::<ImageFormat>().is_err());
    }

    #[test]
    fn test_padding_empty() {
        assert!(PaddingSpec::default().is_empty());
        assert!(!PaddingSpec::uniform(4.0, Color::WHITE).is_empty());
    }
}
