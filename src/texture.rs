//! Shared working-texture handles.
//!
//! [`WorkingTexture`] is the handle the baking pipeline actually works
//! with. Handles are cheap to clone: a clone shares the underlying
//! [`TextureBuffer`] and bumps its reference count. The first pixel
//! mutation through a handle whose buffer is shared forks a private copy,
//! so a mutation is never observable through any other handle.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use uuid::Uuid;

use crate::buffer::{Color, TextureBuffer, TextureError};
use crate::format::{TextureFormat, WrapMode};
use crate::output::BakedImage;
use crate::source::SourceKey;

pub(crate) type SharedBuffer = Rc<RefCell<TextureBuffer>>;

/// A shared, copy-on-write handle to a [`TextureBuffer`].
///
/// Obtained from [`TextureCache::wrap`](crate::TextureCache::wrap) or
/// [`allocate`](WorkingTexture::allocate). `Clone` aliases the same buffer
/// in O(1); the buffer's storage is freed when the last handle is disposed
/// or dropped. The reference count visible through
/// [`ref_count`](WorkingTexture::ref_count) is always the number of
/// outstanding handles (the cache holds only a weak back-reference).
///
/// Handles are not `Send`: the working-texture layer is single-threaded
/// and synchronous, and the sharing primitive enforces that contract at
/// compile time.
#[derive(Clone)]
pub struct WorkingTexture {
    buffer: SharedBuffer,
}

impl WorkingTexture {
    /// Allocate a fresh, zero-initialized texture with no source identity.
    ///
    /// Blank textures are never deduplicated; the handle starts with a
    /// reference count of 1.
    ///
    /// # Errors
    ///
    /// Returns [`TextureError::InvalidDimension`] if either dimension is 0.
    pub fn allocate(
        format: TextureFormat,
        width: u32,
        height: u32,
        linear: bool,
    ) -> Result<Self, TextureError> {
        Ok(Self::from_buffer(TextureBuffer::new(
            format, width, height, linear,
        )?))
    }

    pub(crate) fn from_buffer(buffer: TextureBuffer) -> Self {
        Self {
            buffer: Rc::new(RefCell::new(buffer)),
        }
    }

    pub(crate) fn from_shared(buffer: SharedBuffer) -> Self {
        Self { buffer }
    }

    /// Release this handle.
    ///
    /// Consuming the handle means a second release, or any use after
    /// disposal, is rejected by the compiler. The buffer's storage is freed
    /// when the last handle goes; dropping the handle is equivalent.
    pub fn dispose(self) {}

    /// Number of live handles sharing this buffer.
    #[inline]
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.buffer)
    }

    /// Whether two handles share the same underlying buffer.
    #[inline]
    pub fn aliases(&self, other: &WorkingTexture) -> bool {
        Rc::ptr_eq(&self.buffer, &other.buffer)
    }

    // --- Metadata ---

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.buffer.borrow().width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.buffer.borrow().height()
    }

    /// Storage format tag.
    pub fn format(&self) -> TextureFormat {
        self.buffer.borrow().format()
    }

    /// Whether the pixel data is linear color space.
    pub fn linear(&self) -> bool {
        self.buffer.borrow().linear()
    }

    /// Coordinate wrap mode.
    pub fn wrap_mode(&self) -> WrapMode {
        self.buffer.borrow().wrap_mode()
    }

    /// Asset name, if any.
    pub fn name(&self) -> Option<String> {
        self.buffer.borrow().name().map(str::to_string)
    }

    /// Process-unique identity of the underlying buffer.
    pub fn id(&self) -> Uuid {
        self.buffer.borrow().id()
    }

    /// Cache identity of the source asset, `None` for blank allocations
    /// and copy-on-write forks.
    pub fn source_key(&self) -> Option<SourceKey> {
        self.buffer.borrow().source().cloned()
    }

    /// Whether the buffer holds placeholder pixels substituted for an
    /// unreadable source.
    pub fn substituted(&self) -> bool {
        self.buffer.borrow().substituted()
    }

    /// Set the asset name.
    ///
    /// Metadata writes go to the shared buffer without forking; only pixel
    /// mutation triggers copy-on-write.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.buffer.borrow_mut().set_name(name);
    }

    /// Set the linear-color-space flag. Shared like
    /// [`set_name`](WorkingTexture::set_name).
    pub fn set_linear(&mut self, linear: bool) {
        self.buffer.borrow_mut().set_linear(linear);
    }

    /// Set the coordinate wrap mode. Shared like
    /// [`set_name`](WorkingTexture::set_name).
    pub fn set_wrap_mode(&mut self, wrap_mode: WrapMode) {
        self.buffer.borrow_mut().set_wrap_mode(wrap_mode);
    }

    // --- Pixel access ---

    /// Color at an integer coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`TextureError::OutOfRange`] outside the buffer bounds.
    pub fn get(&self, x: u32, y: u32) -> Result<Color, TextureError> {
        self.buffer.borrow().get(x, y)
    }

    /// Sample at a normalized coordinate with bilinear filtering.
    ///
    /// # Errors
    ///
    /// Coordinates outside `[0, 1]` propagate [`TextureError::OutOfRange`].
    pub fn sample_bilinear(&self, u: f32, v: f32) -> Result<Color, TextureError> {
        self.buffer.borrow().sample_bilinear(u, v)
    }

    /// Overwrite the color at an integer coordinate, forking first if the
    /// buffer is shared.
    ///
    /// # Errors
    ///
    /// Returns [`TextureError::OutOfRange`] outside the buffer bounds.
    pub fn set(&mut self, x: u32, y: u32, color: Color) -> Result<(), TextureError> {
        self.make_writeable();
        self.buffer.borrow_mut().set(x, y, color)
    }

    /// Blit `source`'s pixels into this texture at a signed offset,
    /// forking first if the buffer is shared. Out-of-bounds source pixels
    /// are clipped.
    pub fn blit(&mut self, source: &WorkingTexture, x: i32, y: i32) {
        self.make_writeable();
        // Distinct handles sharing a buffer always fork above, so the two
        // borrows can never hit the same cell.
        let src = source.buffer.borrow();
        self.buffer.borrow_mut().blit(&src, x, y);
    }

    /// Resample into a brand-new texture of the requested size.
    ///
    /// The result is a fresh, uncached buffer with a reference count of 1;
    /// this handle is left untouched (no copy-on-write fork).
    ///
    /// # Errors
    ///
    /// Returns [`TextureError::InvalidDimension`] if either requested
    /// dimension is 0.
    pub fn resize(&self, new_width: u32, new_height: u32) -> Result<WorkingTexture, TextureError> {
        Ok(Self::from_buffer(
            self.buffer.borrow().resize(new_width, new_height)?,
        ))
    }

    /// Snapshot the pixels into a [`BakedImage`] for the atlas step.
    pub fn to_baked(&self) -> BakedImage {
        self.buffer.borrow().to_baked()
    }

    fn make_writeable(&mut self) {
        if Rc::strong_count(&self.buffer) > 1 {
            let fork = self.buffer.borrow().duplicate();
            self.buffer = Rc::new(RefCell::new(fork));
        }
    }
}

impl fmt::Debug for WorkingTexture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "WorkingTexture({:?}, refs: {})",
            self.buffer.borrow(),
            Rc::strong_count(&self.buffer)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::TRANSPARENT;
    use rgb::Rgba;

    fn red() -> Color {
        Rgba {
            r: 1.0,
            g: 0.0,
            b: 0.0,
            a: 1.0,
        }
    }

    fn blue() -> Color {
        Rgba {
            r: 0.0,
            g: 0.0,
            b: 1.0,
            a: 1.0,
        }
    }

    fn allocate_4x4() -> WorkingTexture {
        WorkingTexture::allocate(TextureFormat::Rgba32, 4, 4, false).unwrap()
    }

    #[test]
    fn allocate_starts_exclusive_and_zeroed() {
        let texture = allocate_4x4();
        assert_eq!(texture.ref_count(), 1);
        assert_eq!(texture.get(0, 0).unwrap(), TRANSPARENT);
        assert!(texture.source_key().is_none());
        assert!(!texture.substituted());
    }

    #[test]
    fn allocate_rejects_zero_dimension() {
        assert!(matches!(
            WorkingTexture::allocate(TextureFormat::Rgba32, 0, 1, false),
            Err(TextureError::InvalidDimension { .. })
        ));
    }

    #[test]
    fn clone_and_dispose_track_ref_count() {
        let a = allocate_4x4();
        let b = a.clone();
        let c = b.clone();
        assert_eq!(a.ref_count(), 3);
        assert!(a.aliases(&b) && b.aliases(&c));

        c.dispose();
        assert_eq!(a.ref_count(), 2);
        drop(b);
        assert_eq!(a.ref_count(), 1);
    }

    #[test]
    fn exclusive_mutation_stays_in_place() {
        let mut a = allocate_4x4();
        let id = a.id();
        a.set(1, 1, red()).unwrap();
        assert_eq!(a.id(), id);
        assert_eq!(a.get(1, 1).unwrap(), red());
    }

    #[test]
    fn shared_mutation_forks() {
        let mut a = allocate_4x4();
        a.set(1, 1, red()).unwrap();
        let mut b = a.clone();

        b.set(1, 1, blue()).unwrap();
        assert_eq!(a.get(1, 1).unwrap(), red());
        assert_eq!(b.get(1, 1).unwrap(), blue());
        assert!(!a.aliases(&b));
        assert_eq!(a.ref_count(), 1);
        assert_eq!(b.ref_count(), 1);
        assert_ne!(a.id(), b.id());

        // The fork is complete: further mutation on either side stays put.
        a.set(0, 0, blue()).unwrap();
        assert_eq!(b.get(0, 0).unwrap(), TRANSPARENT);
    }

    #[test]
    fn fork_preserves_pixels() {
        let mut a = allocate_4x4();
        a.set(3, 2, red()).unwrap();
        let mut b = a.clone();
        b.set(0, 0, blue()).unwrap();
        assert_eq!(b.get(3, 2).unwrap(), red());
    }

    #[test]
    fn blit_through_shared_handle_forks() {
        let mut stamp = WorkingTexture::allocate(TextureFormat::Rgba32, 2, 2, false).unwrap();
        for y in 0..2 {
            for x in 0..2 {
                stamp.set(x, y, red()).unwrap();
            }
        }

        let a = allocate_4x4();
        let mut b = a.clone();
        b.blit(&stamp, 1, 1);

        assert!(!a.aliases(&b));
        assert_eq!(a.get(1, 1).unwrap(), TRANSPARENT);
        assert_eq!(b.get(1, 1).unwrap(), red());
        assert_eq!(b.get(2, 2).unwrap(), red());
        assert_eq!(b.get(3, 3).unwrap(), TRANSPARENT);
    }

    #[test]
    fn blit_from_aliasing_handle() {
        let mut a = allocate_4x4();
        a.set(0, 0, red()).unwrap();
        let b = a.clone();

        // Source and destination share a buffer going in; the fork makes
        // them disjoint before any pixel moves.
        a.blit(&b, 1, 0);
        assert_eq!(a.get(1, 0).unwrap(), red());
        assert_eq!(b.get(1, 0).unwrap(), TRANSPARENT);
        assert!(!a.aliases(&b));
    }

    #[test]
    fn resize_returns_fresh_handle() {
        let mut a = allocate_4x4();
        a.set(0, 0, red()).unwrap();
        let shared = a.clone();

        let resized = a.resize(2, 2).unwrap();
        assert!(!resized.aliases(&a));
        assert_eq!(resized.ref_count(), 1);
        assert_eq!(resized.width(), 2);
        assert_eq!(resized.height(), 2);
        // The original stays shared and untouched.
        assert!(a.aliases(&shared));
        assert_eq!(a.ref_count(), 2);
        assert!(resized.source_key().is_none());
    }

    #[test]
    fn metadata_setters_write_through_without_forking() {
        let mut a = allocate_4x4();
        let b = a.clone();

        a.set_name("bake sheet 0");
        a.set_wrap_mode(WrapMode::Clamp);
        a.set_linear(true);

        assert!(a.aliases(&b));
        assert_eq!(b.name().as_deref(), Some("bake sheet 0"));
        assert_eq!(b.wrap_mode(), WrapMode::Clamp);
        assert!(b.linear());
    }

    #[test]
    fn sampling_reads_through_the_handle() {
        let mut a = WorkingTexture::allocate(TextureFormat::Rgba32, 2, 1, false).unwrap();
        a.set(0, 0, red()).unwrap();
        a.set(1, 0, blue()).unwrap();
        let mid = a.sample_bilinear(0.5, 0.0).unwrap();
        assert!((mid.r - 0.5).abs() < 1e-6);
        assert!((mid.b - 0.5).abs() < 1e-6);
    }
}
