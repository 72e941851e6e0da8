//! Pure Rust thumbnail backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (PNG, JPEG) | `image::ImageReader` with the sniffed format and an allocation cap |
//! | Crop | `DynamicImage::crop_imm` to the centred target-aspect window |
//! | Resize | `DynamicImage::thumbnail_exact` (area averaging) down, or up, to the footprint |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//!
//! Cropping happens before resizing, so the largest raster ever held is the
//! decoded source. A 1x20000 strip costs 60 KB, not a 300x6000000 fill.

use super::backend::{BackendError, ThumbnailBackend};
use super::calculations::calculate_crop_window;
use super::params::{Quality, ThumbnailParams};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageReader, Limits};

/// Decoder allocation cap. Sources that would need more are decode errors.
pub const DEFAULT_DECODE_LIMIT: u64 = 512 * 1024 * 1024;

/// Backend using the `image` crate's pure Rust codecs.
#[derive(Debug, Clone, Copy)]
pub struct RustBackend {
    decode_limit: u64,
}

impl RustBackend {
    pub fn new() -> Self {
        Self {
            decode_limit: DEFAULT_DECODE_LIMIT,
        }
    }

    /// Override the decoder allocation cap, in bytes.
    pub fn with_decode_limit(decode_limit: u64) -> Self {
        Self { decode_limit }
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk with a known format.
fn load_image(params: &ThumbnailParams, decode_limit: u64) -> Result<DynamicImage, BackendError> {
    let mut reader = ImageReader::open(&params.source)?;
    reader.set_format(params.format.image_format());
    let mut limits = Limits::default();
    limits.max_alloc = Some(decode_limit);
    reader.limits(limits);
    reader.decode().map_err(|e| {
        BackendError::Decode(format!("{}: {}", params.source.display(), e))
    })
}

/// Crop the centre to the target aspect ratio, then area-average to
/// exactly `width`x`height`.
fn crop_and_resize(img: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    let (x, y, w, h) = calculate_crop_window((img.width(), img.height()), (width, height));
    img.crop_imm(x, y, w, h).thumbnail_exact(width, height)
}

/// Encode as baseline JPEG. Alpha is dropped; JPEG has no alpha channel.
fn encode_jpeg(img: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality.value());
    rgb.write_with_encoder(encoder)
        .map_err(|e| BackendError::Encode(e.to_string()))?;
    Ok(buf)
}

impl ThumbnailBackend for RustBackend {
    fn thumbnail(&self, params: &ThumbnailParams) -> Result<Vec<u8>, BackendError> {
        let img = load_image(params, self.decode_limit)?;
        let thumb = crop_and_resize(&img, params.width, params.height);
        encode_jpeg(&thumb, params.quality)
    }
}
