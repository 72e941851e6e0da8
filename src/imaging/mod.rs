//! Thumbnail imaging: pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` (PNG, JPEG) |
//! | **Resize** | centre crop to the target aspect, then area-averaging `thumbnail_exact` |
//! | **Encode** | `JpegEncoder` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for crop geometry (unit testable)
//! - **Parameters**: Data structures describing a thumbnail request
//! - **Backend**: [`ThumbnailBackend`] trait + [`RustBackend`]

pub mod backend;
mod calculations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ThumbnailBackend};
pub use calculations::calculate_crop_window;
pub use params::{Quality, ThumbnailParams, ThumbnailSpec};
pub use rust_backend::RustBackend;
