//! Baked image hand-off.
//!
//! [`BakedImage`] is what leaves this crate: an owned snapshot of a working
//! texture's pixels plus the metadata the atlas-baking step needs to encode
//! it back into an engine texture.

use std::fmt;

use imgref::{ImgRef, ImgVec};

use crate::buffer::Color;
use crate::format::{TextureFormat, WrapMode};

/// An owned pixel snapshot with encode metadata.
///
/// Produced by [`to_baked`](crate::WorkingTexture::to_baked); detached from
/// the working-texture layer, so it can outlive every handle and cross into
/// the atlas step without touching reference counts.
#[derive(Clone)]
pub struct BakedImage {
    name: Option<String>,
    format: TextureFormat,
    linear: bool,
    wrap_mode: WrapMode,
    pixels: ImgVec<Color>,
}

impl BakedImage {
    /// Create a baked image from row-major pixels and metadata.
    pub fn new(
        name: Option<String>,
        format: TextureFormat,
        linear: bool,
        wrap_mode: WrapMode,
        pixels: ImgVec<Color>,
    ) -> Self {
        Self {
            name,
            format,
            linear,
            wrap_mode,
            pixels,
        }
    }

    /// Asset name carried over from the working texture, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Target storage format.
    #[inline]
    pub fn format(&self) -> TextureFormat {
        self.format
    }

    /// Whether the pixels are linear color space.
    #[inline]
    pub fn linear(&self) -> bool {
        self.linear
    }

    /// Coordinate wrap mode to encode.
    #[inline]
    pub fn wrap_mode(&self) -> WrapMode {
        self.wrap_mode
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.pixels.width() as u32
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.pixels.height() as u32
    }

    /// Borrow the pixel data.
    pub fn pixels(&self) -> ImgRef<'_, Color> {
        self.pixels.as_ref()
    }

    /// Take the pixel data, consuming this image.
    pub fn into_pixels(self) -> ImgVec<Color> {
        self.pixels
    }
}

impl fmt::Debug for BakedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BakedImage({}x{}, {:?})",
            self.width(),
            self.height(),
            self.format
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::TextureBuffer;
    use rgb::Rgba;

    fn red() -> Color {
        Rgba {
            r: 1.0,
            g: 0.0,
            b: 0.0,
            a: 1.0,
        }
    }

    #[test]
    fn snapshot_carries_pixels_and_metadata() {
        let mut buffer = TextureBuffer::new(TextureFormat::Rgb24, 2, 2, true).unwrap();
        buffer.set_name("bake sheet 3");
        buffer.set_wrap_mode(WrapMode::Clamp);
        buffer.set(1, 0, red()).unwrap();

        let baked = buffer.to_baked();
        assert_eq!(baked.name(), Some("bake sheet 3"));
        assert_eq!(baked.format(), TextureFormat::Rgb24);
        assert!(baked.linear());
        assert_eq!(baked.wrap_mode(), WrapMode::Clamp);
        assert_eq!(baked.width(), 2);
        assert_eq!(baked.height(), 2);
        assert_eq!(baked.pixels().buf()[1], red());
    }

    #[test]
    fn snapshot_is_detached_from_the_buffer() {
        let mut buffer = TextureBuffer::new(TextureFormat::Rgba32, 2, 2, false).unwrap();
        let baked = buffer.to_baked();
        buffer.set(0, 0, red()).unwrap();
        assert_ne!(baked.pixels().buf()[0], red());
    }

    #[test]
    fn into_pixels_keeps_dimensions() {
        let buffer = TextureBuffer::new(TextureFormat::Rgba32, 3, 2, false).unwrap();
        let pixels = buffer.to_baked().into_pixels();
        assert_eq!(pixels.width(), 3);
        assert_eq!(pixels.height(), 2);
        assert_eq!(pixels.buf().len(), 6);
    }

    #[test]
    fn debug_format() {
        let buffer = TextureBuffer::new(TextureFormat::Rgba32, 4, 4, false).unwrap();
        assert_eq!(format!("{:?}", buffer.to_baked()), "BakedImage(4x4, Rgba32)");
    }
}
