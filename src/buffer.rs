//! Working-texture pixel storage.
//!
//! [`TextureBuffer`] is the leaf of the working-texture layer: an owned,
//! contiguous block of f32 RGBA pixels plus format metadata. A buffer never
//! references another buffer, and all mutation happens on a buffer with
//! exactly one owner at the time of the call; sharing and copy-on-write live
//! one layer up in [`WorkingTexture`](crate::WorkingTexture).

use std::fmt;

use imgref::ImgVec;
use rgb::Rgba;
use thiserror::Error;
use uuid::Uuid;

use crate::format::{TextureFormat, WrapMode};
use crate::output::BakedImage;
use crate::source::{SourceImage, SourceKey};

/// Working pixel color: 4-component f32.
///
/// Channels are conventionally in [0, 1] but never clamped, so HDR bake
/// intermediates pass through untouched.
pub type Color = Rgba<f32>;

pub(crate) const TRANSPARENT: Color = Rgba {
    r: 0.0,
    g: 0.0,
    b: 0.0,
    a: 0.0,
};

// Substitute pattern for unreadable sources: magenta/black checkerboard
// in 8x8 pixel tiles, a pure function of the buffer size.
const PLACEHOLDER_TILE: u32 = 8;
const PLACEHOLDER_MAGENTA: Color = Rgba {
    r: 1.0,
    g: 0.0,
    b: 1.0,
    a: 1.0,
};
const PLACEHOLDER_BLACK: Color = Rgba {
    r: 0.0,
    g: 0.0,
    b: 0.0,
    a: 1.0,
};

fn lerp(a: Color, b: Color, t: f32) -> Color {
    Rgba {
        r: a.r + (b.r - a.r) * t,
        g: a.g + (b.g - a.g) * t,
        b: a.b + (b.b - a.b) * t,
        a: a.a + (b.a - a.a) * t,
    }
}

// ---------------------------------------------------------------------------
// TextureError
// ---------------------------------------------------------------------------

/// Errors from working-texture operations.
#[derive(Clone, Debug, PartialEq, Error)]
#[non_exhaustive]
pub enum TextureError {
    /// A zero dimension was requested for allocation or resize.
    #[error("invalid texture dimensions {width}x{height}")]
    InvalidDimension { width: u32, height: u32 },
    /// A pixel coordinate fell outside the buffer bounds.
    #[error("pixel coordinate ({x}, {y}) out of range for a {width}x{height} texture")]
    OutOfRange {
        x: i64,
        y: i64,
        width: u32,
        height: u32,
    },
    /// A source asset could not supply pixel data.
    #[error("source image `{name}` has no readable pixel data")]
    SourceUnreadable { name: String },
}

// ---------------------------------------------------------------------------
// TextureBuffer
// ---------------------------------------------------------------------------

/// Owned pixel storage for one working texture.
///
/// Dimensions are fixed at construction; `pixels.len() == width * height`
/// always holds. [`resize`](TextureBuffer::resize) returns a new buffer
/// rather than growing in place.
pub struct TextureBuffer {
    format: TextureFormat,
    linear: bool,
    wrap_mode: WrapMode,
    name: Option<String>,
    source: Option<SourceKey>,
    id: Uuid,
    substituted: bool,
    pixels: ImgVec<Color>,
}

impl TextureBuffer {
    /// Create a zero-initialized buffer.
    ///
    /// # Errors
    ///
    /// Returns [`TextureError::InvalidDimension`] if either dimension is 0.
    pub fn new(
        format: TextureFormat,
        width: u32,
        height: u32,
        linear: bool,
    ) -> Result<Self, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::InvalidDimension { width, height });
        }
        Ok(Self {
            format,
            linear,
            wrap_mode: WrapMode::default(),
            name: None,
            source: None,
            id: Uuid::new_v4(),
            substituted: false,
            pixels: ImgVec::new(
                vec![TRANSPARENT; width as usize * height as usize],
                width as usize,
                height as usize,
            ),
        })
    }

    /// Copy a buffer out of an external source image.
    ///
    /// Size, format, color space, wrap mode, name and cache identity are
    /// taken from the source. If the source cannot supply pixel data (or
    /// supplies the wrong amount), the buffer is filled with the placeholder
    /// checkerboard instead, [`substituted`](TextureBuffer::substituted) is
    /// set, and a warning names the asset; one broken texture must not abort
    /// a whole batch bake.
    ///
    /// # Errors
    ///
    /// Returns [`TextureError::InvalidDimension`] if the source reports a
    /// zero dimension. Unreadable pixel data is not an error here.
    pub fn from_source<S: SourceImage + ?Sized>(source: &S) -> Result<Self, TextureError> {
        let mut buffer = Self::new(
            source.format(),
            source.width(),
            source.height(),
            source.linear(),
        )?;
        buffer.name = Some(source.name().to_string());
        buffer.wrap_mode = source.wrap_mode();
        buffer.source = Some(source.key());

        let expected = buffer.pixels.buf().len();
        match source.read_pixels() {
            Ok(pixels) if pixels.len() == expected => {
                buffer.pixels.buf_mut().copy_from_slice(&pixels);
            }
            Ok(pixels) => {
                log::warn!(
                    "source `{}` supplied {} pixels for a {}x{} texture, substituting placeholder",
                    source.name(),
                    pixels.len(),
                    source.width(),
                    source.height()
                );
                buffer.fill_placeholder();
                buffer.substituted = true;
            }
            Err(err) => {
                log::warn!(
                    "source `{}` is unreadable ({err}), substituting placeholder",
                    source.name()
                );
                buffer.fill_placeholder();
                buffer.substituted = true;
            }
        }
        Ok(buffer)
    }

    // --- Metadata ---

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

    /// Storage format tag.
    #[inline]
    pub fn format(&self) -> TextureFormat {
        self.format
    }

    /// Whether the pixel data is linear color space.
    #[inline]
    pub fn linear(&self) -> bool {
        self.linear
    }

    /// Set the linear-color-space flag.
    pub fn set_linear(&mut self, linear: bool) {
        self.linear = linear;
    }

    /// Coordinate wrap mode. Stored for downstream consumers; the sampler
    /// here never wraps.
    #[inline]
    pub fn wrap_mode(&self) -> WrapMode {
        self.wrap_mode
    }

    /// Set the coordinate wrap mode.
    pub fn set_wrap_mode(&mut self, wrap_mode: WrapMode) {
        self.wrap_mode = wrap_mode;
    }

    /// Asset name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Set the asset name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    /// Process-unique buffer identity.
    #[inline]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Cache identity of the source asset this buffer was copied from.
    /// `None` for blank allocations and copy-on-write forks.
    pub fn source(&self) -> Option<&SourceKey> {
        self.source.as_ref()
    }

    /// Whether placeholder pixels were substituted for unreadable source
    /// data.
    #[inline]
    pub fn substituted(&self) -> bool {
        self.substituted
    }

    // --- Pixel access ---

    /// Color at an integer coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`TextureError::OutOfRange`] outside
    /// `[0, width) x [0, height)`.
    pub fn get(&self, x: u32, y: u32) -> Result<Color, TextureError> {
        self.pixel_at(x as i64, y as i64)
    }

    /// Overwrite the color at an integer coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`TextureError::OutOfRange`] outside
    /// `[0, width) x [0, height)`.
    pub fn set(&mut self, x: u32, y: u32, color: Color) -> Result<(), TextureError> {
        if x >= self.width() || y >= self.height() {
            return Err(TextureError::OutOfRange {
                x: x as i64,
                y: y as i64,
                width: self.width(),
                height: self.height(),
            });
        }
        let w = self.pixels.width();
        self.pixels.buf_mut()[y as usize * w + x as usize] = color;
        Ok(())
    }

    /// Sample at a normalized coordinate with bilinear filtering.
    ///
    /// `u` and `v` address pixel centers over `[0, 1]`; the blend uses the
    /// floor and ceiling of `u * (width - 1)` and `v * (height - 1)`, so
    /// boundary coordinates clamp naturally (floor equals ceiling there).
    /// Wrap mode is not consulted.
    ///
    /// # Errors
    ///
    /// Coordinates outside `[0, 1]` propagate [`TextureError::OutOfRange`]
    /// from the underlying pixel reads.
    pub fn sample_bilinear(&self, u: f32, v: f32) -> Result<Color, TextureError> {
        let x = u * (self.width() - 1) as f32;
        let y = v * (self.height() - 1) as f32;

        let x1 = x.floor() as i64;
        let x2 = x.ceil() as i64;
        let y1 = y.floor() as i64;
        let y2 = y.ceil() as i64;

        let tx = x - x1 as f32;
        let ty = y - y1 as f32;

        let top = lerp(self.pixel_at(x1, y1)?, self.pixel_at(x2, y1)?, tx);
        let bottom = lerp(self.pixel_at(x1, y2)?, self.pixel_at(x2, y2)?, tx);
        Ok(lerp(top, bottom, ty))
    }

    /// Copy `source`'s pixels into this buffer at a signed offset.
    ///
    /// Source pixels that land outside this buffer are silently clipped;
    /// destination pixels outside the overlap are untouched. Clipping is
    /// intentional here, unlike the erroring contract of
    /// [`get`](TextureBuffer::get)/[`set`](TextureBuffer::set).
    pub fn blit(&mut self, source: &TextureBuffer, x: i32, y: i32) {
        let dest_w = self.width() as i64;
        let dest_h = self.height() as i64;
        let src_w = source.pixels.width();
        let w = self.pixels.width();

        for sy in 0..source.pixels.height() {
            let ty = y as i64 + sy as i64;
            if ty < 0 || ty >= dest_h {
                continue;
            }
            for sx in 0..src_w {
                let tx = x as i64 + sx as i64;
                if tx < 0 || tx >= dest_w {
                    continue;
                }
                let color = source.pixels.buf()[sy * src_w + sx];
                self.pixels.buf_mut()[ty as usize * w + tx as usize] = color;
            }
        }
    }

    /// Resample into a new buffer of the requested size.
    ///
    /// Destination pixel `(x, y)` samples the source at normalized
    /// coordinate `x / (new_width - 1)`, `y / (new_height - 1)` with
    /// bilinear filtering. A destination axis of 1 samples coordinate 0 in
    /// that axis. Resizing to the original size reproduces the pixels
    /// exactly.
    ///
    /// # Errors
    ///
    /// Returns [`TextureError::InvalidDimension`] if either requested
    /// dimension is 0.
    pub fn resize(&self, new_width: u32, new_height: u32) -> Result<TextureBuffer, TextureError> {
        let mut out = TextureBuffer::new(self.format, new_width, new_height, self.linear)?;
        out.wrap_mode = self.wrap_mode;
        out.name = self.name.clone();

        for y in 0..new_height {
            let v = if new_height > 1 {
                y as f32 / (new_height - 1) as f32
            } else {
                0.0
            };
            for x in 0..new_width {
                let u = if new_width > 1 {
                    x as f32 / (new_width - 1) as f32
                } else {
                    0.0
                };
                let color = self.sample_bilinear(u, v)?;
                out.set(x, y, color)?;
            }
        }
        Ok(out)
    }

    /// Deep copy: a new buffer with the same format, size and pixels.
    ///
    /// The copy gets a fresh id and no source identity; its content is
    /// about to diverge from whatever asset the original was copied from.
    pub fn duplicate(&self) -> TextureBuffer {
        let mut copy = TextureBuffer {
            format: self.format,
            linear: self.linear,
            wrap_mode: self.wrap_mode,
            name: self.name.clone(),
            source: None,
            id: Uuid::new_v4(),
            substituted: self.substituted,
            pixels: ImgVec::new(
                vec![TRANSPARENT; self.pixels.buf().len()],
                self.pixels.width(),
                self.pixels.height(),
            ),
        };
        copy.blit(self, 0, 0);
        copy
    }

    /// Snapshot this buffer into a [`BakedImage`] for the atlas step.
    pub fn to_baked(&self) -> BakedImage {
        BakedImage::new(
            self.name.clone(),
            self.format,
            self.linear,
            self.wrap_mode,
            ImgVec::new(
                self.pixels.buf().clone(),
                self.pixels.width(),
                self.pixels.height(),
            ),
        )
    }

    fn pixel_at(&self, x: i64, y: i64) -> Result<Color, TextureError> {
        let w = self.width();
        let h = self.height();
        if x < 0 || y < 0 || x >= w as i64 || y >= h as i64 {
            return Err(TextureError::OutOfRange {
                x,
                y,
                width: w,
                height: h,
            });
        }
        Ok(self.pixels.buf()[y as usize * w as usize + x as usize])
    }

    fn fill_placeholder(&mut self) {
        let (w, h) = (self.width(), self.height());
        let stride = self.pixels.width();
        for y in 0..h {
            for x in 0..w {
                let even = (x / PLACEHOLDER_TILE) % 2 == (y / PLACEHOLDER_TILE) % 2;
                let color = if even {
                    PLACEHOLDER_MAGENTA
                } else {
                    PLACEHOLDER_BLACK
                };
                self.pixels.buf_mut()[y as usize * stride + x as usize] = color;
            }
        }
    }
}

impl fmt::Debug for TextureBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TextureBuffer({}x{}, {:?}{})",
            self.width(),
            self.height(),
            self.format,
            if self.substituted { ", substituted" } else { "" }
        )
    }
}
