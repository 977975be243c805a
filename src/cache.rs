//! Source-keyed deduplication of live texture buffers.
//!
//! A bake pass touches the same source textures over and over as it walks
//! the meshes that reference them. [`TextureCache`] guarantees at most one
//! live [`TextureBuffer`](crate::TextureBuffer) per source asset: wrapping
//! a key that already has a live buffer aliases that buffer instead of
//! copying the asset again.
//!
//! The cache holds only weak back-references, so it never extends a
//! buffer's lifetime. When the last handle to a buffer goes, the buffer is
//! freed and its cache entry dies with it; the next wrap of that key
//! copies the source afresh.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::buffer::{TextureBuffer, TextureError};
use crate::source::{SourceImage, SourceKey};
use crate::texture::WorkingTexture;

/// Deduplicates working-texture buffers by source identity.
///
/// One instance serves one bake process; the layer is single-threaded by
/// contract (handles are not `Send`, so the compiler holds the line).
/// Lookup and insert happen as one step inside [`wrap`](TextureCache::wrap),
/// so two live buffers can never claim the same key.
#[derive(Debug, Default)]
pub struct TextureCache {
    entries: HashMap<SourceKey, Weak<RefCell<TextureBuffer>>>,
}

impl TextureCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a source image into a working texture, deduplicating by the
    /// source's key.
    ///
    /// If a live buffer already exists for the key, the returned handle
    /// aliases it (reference count + 1, no pixel copy). Otherwise the
    /// source is copied via
    /// [`TextureBuffer::from_source`](crate::TextureBuffer::from_source),
    /// registered under the key, and returned with a reference count of 1.
    /// Buffers holding substituted placeholder pixels are cached like any
    /// other, so a broken asset is copied (and warned about) once, not once
    /// per wrap.
    ///
    /// # Errors
    ///
    /// Returns [`TextureError::InvalidDimension`] if the source reports a
    /// zero dimension. An unreadable source is not an error; see
    /// [`WorkingTexture::substituted`].
    pub fn wrap<S: SourceImage + ?Sized>(
        &mut self,
        source: &S,
    ) -> Result<WorkingTexture, TextureError> {
        let key = source.key();
        if let Some(entry) = self.entries.get(&key)
            && let Some(buffer) = entry.upgrade()
        {
            return Ok(WorkingTexture::from_shared(buffer));
        }
        let buffer = Rc::new(RefCell::new(TextureBuffer::from_source(source)?));
        self.entries.insert(key, Rc::downgrade(&buffer));
        Ok(WorkingTexture::from_shared(buffer))
    }

    /// Whether a live buffer is registered for `key`.
    pub fn contains(&self, key: &SourceKey) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| entry.strong_count() > 0)
    }

    /// Number of keys with a live buffer.
    pub fn live_count(&self) -> usize {
        self.entries
            .values()
            .filter(|entry| entry.strong_count() > 0)
            .count()
    }

    /// Drop entries whose buffers have died.
    ///
    /// Purely a map-compaction aid between batches; dead entries are
    /// replaced lazily by [`wrap`](TextureCache::wrap) either way.
    pub fn prune(&mut self) {
        self.entries.retain(|_, entry| entry.strong_count() > 0);
    }
}
