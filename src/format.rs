//! Texture format and wrap-mode metadata.
//!
//! Working textures always store pixels as 4-component f32 internally;
//! [`TextureFormat`] records the storage format of the asset a buffer came
//! from (and the format baked output should be encoded back to). Neither tag
//! affects in-memory sampling.

/// Storage format tag carried by a working texture.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TextureFormat {
    /// 8 bits per channel, red/green/blue/alpha.
    #[default]
    Rgba32 = 0,
    /// 8 bits per channel, red/green/blue, no alpha.
    Rgb24 = 1,
    /// Single 8-bit alpha channel.
    Alpha8 = 2,
    /// 16-bit float per channel, red/green/blue/alpha.
    RgbaHalf = 3,
    /// 32-bit float per channel, red/green/blue/alpha.
    RgbaFloat = 4,
}

impl TextureFormat {
    /// Number of channels stored by this format.
    #[inline]
    pub const fn channels(self) -> usize {
        match self {
            Self::Rgba32 | Self::RgbaHalf | Self::RgbaFloat => 4,
            Self::Rgb24 => 3,
            Self::Alpha8 => 1,
        }
    }

    /// Whether this format stores an alpha channel.
    #[inline]
    pub const fn has_alpha(self) -> bool {
        matches!(
            self,
            Self::Rgba32 | Self::Alpha8 | Self::RgbaHalf | Self::RgbaFloat
        )
    }

    /// Byte size of one pixel in the source asset's storage.
    #[inline]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgba32 => 4,
            Self::Rgb24 => 3,
            Self::Alpha8 => 1,
            Self::RgbaHalf => 8,
            Self::RgbaFloat => 16,
        }
    }
}

/// Texture coordinate wrap mode.
///
/// Stored so baked output keeps the source asset's addressing behavior.
/// The buffer's own sampler never wraps; coordinates outside the texture
/// are the caller's error.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WrapMode {
    /// Tile the texture (the common default for bake sources).
    #[default]
    Repeat = 0,
    /// Clamp coordinates to the edge pixel.
    Clamp = 1,
    /// Mirror the texture on each repeat.
    Mirror = 2,
}
