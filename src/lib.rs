//! Copy-on-write working textures for LOD/HLOD texture baking.
//!
//! When a level-of-detail pipeline bakes the combined textures of merged
//! meshes, the same source textures get wrapped, sampled, stamped and
//! resized many times over. This crate is the in-memory buffer layer for
//! that work:
//!
//! - [`WorkingTexture`] — cheap-to-clone handle; mutation copies on write
//! - [`TextureCache`] — at most one live buffer per source asset
//! - [`TextureBuffer`] — owned pixel storage: get/set, blit, bilinear resize
//! - [`SourceImage`] / [`MemoryImage`] — the inbound image boundary
//! - [`BakedImage`] — the outbound snapshot for the atlas-baking step
//! - [`TextureFormat`] / [`WrapMode`] — format metadata tags
//!
//! Handles wrapped from the same [`SourceKey`] share one buffer until one
//! of them mutates; the mutating handle forks a private copy first, so a
//! mutation is never observable through any other handle. A buffer is
//! freed when its last handle is disposed or dropped; the cache holds only
//! weak back-references and cannot leak.
//!
//! Unreadable source assets do not abort a bake: the buffer is filled with
//! a deterministic magenta/black checkerboard, flagged as substituted, and
//! a `log` warning names the asset.
//!
//! The whole layer is single-threaded and synchronous. Handles are
//! reference-counted with `Rc` and are not `Send`, so that contract is a
//! compile-time guarantee rather than documentation.

#![forbid(unsafe_code)]

mod buffer;
mod cache;
mod format;
mod output;
mod source;
mod texture;

pub use buffer::{Color, TextureBuffer, TextureError};
pub use cache::TextureCache;
pub use format::{TextureFormat, WrapMode};
pub use output::BakedImage;
pub use source::{MemoryImage, SourceImage, SourceKey};
pub use texture::WorkingTexture;

// Re-exports for adapter implementors and downstream consumers.
pub use imgref::{Img, ImgRef, ImgVec};
pub use rgb::Rgba;
pub use uuid::Uuid;
