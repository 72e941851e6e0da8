//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the worker pool (which decides which thumbnails to
//! create) and the [`backend`](super::backend) (which does the pixel work),
//! so tests can swap in a mock backend without touching pool logic.

use crate::types::MimeType;
use std::path::PathBuf;

/// JPEG encoding quality (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u8);

impl Quality {
    pub fn new(value: u8) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(95)
    }
}

/// Fixed thumbnail footprint and encoding settings shared by every file of
/// a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailSpec {
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}

impl Default for ThumbnailSpec {
    fn default() -> Self {
        Self {
            width: 300,
            height: 300,
            quality: Quality::default(),
        }
    }
}

/// Parameters for a single thumbnail: decode `source` as `format`,
/// centre-crop to the aspect of `width`×`height`, scale to it, encode JPEG.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailParams {
    pub source: PathBuf,
    /// Format determined by sniffing; the backend does not guess again.
    pub format: MimeType,
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}

impl ThumbnailParams {
    pub fn new(source: PathBuf, format: MimeType, spec: &ThumbnailSpec) -> Self {
        Self {
            source,
            format,
            width: spec.width,
            height: spec.height,
            quality: spec.quality,
        }
    }
}
