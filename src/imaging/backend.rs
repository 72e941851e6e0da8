//! Thumbnail backend trait and shared types.
//!
//! The [`ThumbnailBackend`] trait is the codec capability the worker pool
//! depends on: decode a source file, produce a resized raster and encode it.
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate.

use super::params::ThumbnailParams;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
}

/// Trait for thumbnail backends.
///
/// Implementations are called from many worker threads at once, hence the
/// `Sync` bound.
pub trait ThumbnailBackend: Sync {
    /// Produce the encoded JPEG thumbnail bytes for `params.source`.
    fn thumbnail(&self, params: &ThumbnailParams) -> Result<Vec<u8>, BackendError>;
}
