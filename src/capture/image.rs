//! Decoding of captured viewport frames

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use image::RgbaImage;

use crate::domain::PixelRect;

/// A decoded viewport frame
#[derive(Clone, Debug)]
pub struct FrameImage {
    pub rgba: RgbaImage,
}

impl FrameImage {
    /// Decode a `data:<mime>;base64,<payload>` URI returned by the capture primitive
    pub fn from_data_uri(uri: &str) -> anyhow::Result<Self> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| anyhow::anyhow!("not a data URI"))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| anyhow::anyhow!("data URI has no payload"))?;
        if !header.ends_with(";base64") {
            anyhow::bail!("data URI payload is not base64 encoded ({header})");
        }

        let bytes = BASE64_STANDARD.decode(payload.trim())?;
        let rgba = image::load_from_memory(&bytes)?.to_rgba8();
        log::debug!(
            "Decoded frame: {}x{} pixels from {}",
            rgba.width(),
            rgba.height(),
            header
        );
        Ok(Self { rgba })
    }

    pub fn width(&self) -> u32 {
        self.rgba.width()
    }

    pub fn height(&self) -> u32 {
        self.rgba.height()
    }

    /// Whole image as a device-pixel rectangle
    pub fn bounds(&self) -> PixelRect {
        PixelRect::from_size(self.width(), self.height())
    }
}
