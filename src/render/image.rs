//! Image payloads for picture shapes

use crate::error::{Error, Result};
use crate::render::document::Rect;
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Raster formats accepted by slide documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG
    Png,
    /// JPEG
    Jpeg,
    /// GIF
    Gif,
    /// Windows bitmap
    Bmp,
}

impl ImageFormat {
    /// Detect the format from magic bytes
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [0x89, b'P', b'N', b'G', ..] => Some(ImageFormat::Png),
            [0xFF, 0xD8, 0xFF, ..] => Some(ImageFormat::Jpeg),
            [b'G', b'I', b'F', b'8', ..] => Some(ImageFormat::Gif),
            [b'B', b'M', ..] => Some(ImageFormat::Bmp),
            _ => None,
        }
    }

    /// File extension inside the package
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Gif => "gif",
            ImageFormat::Bmp => "bmp",
        }
    }

    /// MIME type
    pub fn content_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Bmp => "image/bmp",
        }
    }
}

/// Decoded-enough image: bytes, format and pixel size when readable
#[derive(Clone)]
pub struct ImageAsset {
    bytes: Vec<u8>,
    format: ImageFormat,
    dimensions: Option<(u32, u32)>,
}

impl fmt::Debug for ImageAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageAsset")
            .field("format", &self.format)
            .field("len", &self.bytes.len())
            .field("dimensions", &self.dimensions)
            .finish()
    }
}

impl ImageAsset {
    /// Read and validate an image file
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(bytes)
            .map_err(|e| e.context(format!("loading image {}", path.display())))
    }

    /// Validate an in-memory image
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let format = ImageFormat::sniff(&bytes)
            .ok_or_else(|| Error::render("load image", "unrecognized image format"))?;
        let dimensions = read_dimensions(format, &bytes);
        Ok(Self {
            bytes,
            format,
            dimensions,
        })
    }

    /// Raw bytes
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Detected format
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Pixel width and height, if the header was readable
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.dimensions
    }

    /// Largest frame with the image's aspect ratio that fits in `bounds`,
    /// anchored at its top-left corner. Unknown dimensions fill `bounds`.
    pub fn fit_within(&self, bounds: Rect) -> Rect {
        let Some((w, h)) = self.dimensions.filter(|(w, h)| *w > 0 && *h > 0) else {
            return bounds;
        };
        let scale_x = bounds.cx as f64 / f64::from(w);
        let scale_y = bounds.cy as f64 / f64::from(h);
        let scale = scale_x.min(scale_y);
        Rect {
            x: bounds.x,
            y: bounds.y,
            cx: (f64::from(w) * scale).round() as i64,
            cy: (f64::from(h) * scale).round() as i64,
        }
    }
}

fn be_u16(bytes: &[u8], at: usize) -> Option<u16> {
    Some(u16::from_be_bytes([*bytes.get(at)?, *bytes.get(at + 1)?]))
}

fn read_dimensions(format: ImageFormat, bytes: &[u8]) -> Option<(u32, u32)> {
    match format {
        ImageFormat::Png => {
            let w = u32::from_be_bytes(bytes.get(16..20)?.try_into().ok()?);
            let h = u32::from_be_bytes(bytes.get(20..24)?.try_into().ok()?);
            Some((w, h))
        }
        ImageFormat::Gif => {
            let w = u16::from_le_bytes(bytes.get(6..8)?.try_into().ok()?);
            let h = u16::from_le_bytes(bytes.get(8..10)?.try_into().ok()?);
            Some((u32::from(w), u32::from(h)))
        }
        ImageFormat::Bmp => {
            let w = i32::from_le_bytes(bytes.get(18..22)?.try_into().ok()?);
            let h = i32::from_le_bytes(bytes.get(22..26)?.try_into().ok()?);
            Some((w.unsigned_abs(), h.unsigned_abs()))
        }
        ImageFormat::Jpeg => jpeg_dimensions(bytes),
    }
}

// Walks marker segments until a start-of-frame marker.
fn jpeg_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    let mut pos = 2;
    while pos + 4 <= bytes.len() {
        if bytes[pos] != 0xFF {
            pos += 1;
            continue;
        }
        let marker = bytes[pos + 1];
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        let is_sof = (0xC0..=0xCF).contains(&marker) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_sof {
            let h = be_u16(bytes, pos + 5)?;
            let w = be_u16(bytes, pos + 7)?;
            return Some((u32::from(w), u32::from(h)));
        }
        let len = be_u16(bytes, pos + 2)? as usize;
        pos += 2 + len;
    }
    None
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Smallest PNG header the sniffer accepts: signature plus IHDR size
    pub(crate) fn tiny_png(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        bytes.extend_from_slice(&13u32.to_be_bytes());
        bytes.extend_from_slice(b"IHDR");
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&height.to_be_bytes());
        bytes.extend_from_slice(&[8, 2, 0, 0, 0]);
        bytes
    }

    #[test]
    fn test_png_dimensions() {
        let image = ImageAsset::from_bytes(tiny_png(640, 480)).unwrap();
        assert_eq!(image.format(), ImageFormat::Png);
        assert_eq!(image.dimensions(), Some((640, 480)));
    }

    #[test]
    fn test_jpeg_dimensions() {
        let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x04, 0x00, 0x00];
        jpeg.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x11, 0x08, 0x01, 0x2C, 0x01, 0x90]);
        let image = ImageAsset::from_bytes(jpeg).unwrap();
        assert_eq!(image.format(), ImageFormat::Jpeg);
        assert_eq!(image.dimensions(), Some((400, 300)));
    }

    #[test]
    fn test_rejects_html() {
        let err = ImageAsset::from_bytes(b"<!doctype html>".to_vec()).unwrap_err();
        assert!(matches!(err, Error::Render { .. }));
    }

    #[test]
    fn test_fit_within_keeps_aspect() {
        let image = ImageAsset::from_bytes(tiny_png(400, 200)).unwrap();
        let frame = image.fit_within(Rect::inches(6.0, 1.5, 3.5, 5.0));
        assert_eq!(frame.cx, Rect::inches(0.0, 0.0, 3.5, 0.0).cx);
        assert_eq!(frame.cy, Rect::inches(0.0, 0.0, 0.0, 1.75).cy);
    }
}
