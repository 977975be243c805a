//! The inbound image boundary.
//!
//! Working textures are copied out of whatever texture representation the
//! host engine uses. [`SourceImage`] is the contract that representation
//! implements: dimensions, format metadata, a stable identity for cache
//! deduplication, and a bulk pixel read that is allowed to fail (assets can
//! be imported in a state that denies pixel access).
//!
//! [`MemoryImage`] is the bundled owned implementation, useful for adapters
//! that already hold decoded pixels and as a test double.

use std::fmt;

use crate::buffer::{Color, TextureError};
use crate::format::{TextureFormat, WrapMode};

// ---------------------------------------------------------------------------
// SourceKey
// ---------------------------------------------------------------------------

/// Stable identity of an external source asset.
///
/// Two sources with the same key are treated as the same asset by
/// [`TextureCache`](crate::TextureCache): wrapping both while one buffer is
/// live yields handles to that one buffer. Asset paths and content hashes
/// both make good keys; anything stable for the lifetime of a bake works.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SourceKey(String);

impl SourceKey {
    /// The key as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SourceKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for SourceKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// SourceImage
// ---------------------------------------------------------------------------

/// An external image a working texture can be copied from.
///
/// Implemented by the host engine's texture adapter. Metadata accessors must
/// be cheap and infallible; only [`read_pixels`](SourceImage::read_pixels)
/// may fail. Dimensions must be the dimensions `read_pixels` honors: the
/// copy rejects a pixel vector whose length is not `width * height`.
pub trait SourceImage {
    /// Stable identity used for cache deduplication.
    fn key(&self) -> SourceKey;

    /// Human-readable asset name, used for diagnostics and carried onto
    /// baked output.
    fn name(&self) -> &str;

    /// Storage format of the asset.
    fn format(&self) -> TextureFormat;

    /// Width in pixels.
    fn width(&self) -> u32;

    /// Height in pixels.
    fn height(&self) -> u32;

    /// Whether the pixel data is in linear color space (as opposed to sRGB).
    fn linear(&self) -> bool;

    /// Coordinate wrap mode of the asset.
    fn wrap_mode(&self) -> WrapMode;

    /// Bulk-read every pixel, row-major, `width * height` entries.
    ///
    /// # Errors
    ///
    /// Returns [`TextureError::SourceUnreadable`] when the asset cannot
    /// supply pixel data in its current import state. The copy recovers by
    /// substituting a placeholder pattern; see
    /// [`TextureBuffer::from_source`](crate::TextureBuffer::from_source).
    fn read_pixels(&self) -> Result<Vec<Color>, TextureError>;
}

// ---------------------------------------------------------------------------
// MemoryImage
// ---------------------------------------------------------------------------

/// An owned, in-memory [`SourceImage`].
///
/// Holds decoded pixels directly. Construct with [`new`](MemoryImage::new)
/// for a readable image or [`unreadable`](MemoryImage::unreadable) to model
/// an asset whose pixel data cannot be accessed.
#[derive(Clone, Debug)]
pub struct MemoryImage {
    key: SourceKey,
    name: String,
    format: TextureFormat,
    width: u32,
    height: u32,
    linear: bool,
    wrap_mode: WrapMode,
    pixels: Option<Vec<Color>>,
}

impl MemoryImage {
    /// Create a readable image from row-major pixels.
    ///
    /// The asset name defaults to the key; `format` defaults to
    /// [`TextureFormat::Rgba32`], `wrap_mode` to [`WrapMode::Repeat`], and
    /// the color space to sRGB. Use the `with_*` methods to override.
    pub fn new(key: impl Into<SourceKey>, width: u32, height: u32, pixels: Vec<Color>) -> Self {
        let key = key.into();
        Self {
            name: key.as_str().to_string(),
            key,
            format: TextureFormat::default(),
            width,
            height,
            linear: false,
            wrap_mode: WrapMode::default(),
            pixels: Some(pixels),
        }
    }

    /// Create an image whose pixel data cannot be read.
    ///
    /// Its metadata is still valid, so wrapping it produces a correctly
    /// sized placeholder buffer.
    pub fn unreadable(key: impl Into<SourceKey>, width: u32, height: u32) -> Self {
        let key = key.into();
        Self {
            name: key.as_str().to_string(),
            key,
            format: TextureFormat::default(),
            width,
            height,
            linear: false,
            wrap_mode: WrapMode::default(),
            pixels: None,
        }
    }

    /// Set the asset name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the storage format tag.
    pub fn with_format(mut self, format: TextureFormat) -> Self {
        self.format = format;
        self
    }

    /// Mark the pixel data as linear color space.
    pub fn with_linear(mut self, linear: bool) -> Self {
        self.linear = linear;
        self
    }

    /// Set the coordinate wrap mode.
    pub fn with_wrap_mode(mut self, wrap_mode: WrapMode) -> Self {
        self.wrap_mode = wrap_mode;
        self
    }
}

impl SourceImage for MemoryImage {
    fn key(&self) -> SourceKey {
        self.key.clone()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn format(&self) -> TextureFormat {
        self.format
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn linear(&self) -> bool {
        self.linear
    }

    fn wrap_mode(&self) -> WrapMode {
        self.wrap_mode
    }

    fn read_pixels(&self) -> Result<Vec<Color>, TextureError> {
        self.pixels
            .clone()
            .ok_or_else(|| TextureError::SourceUnreadable {
                name: self.name.clone(),
            })
    }
}
