//! Shared test utilities: synthetic image fixtures.
//!
//! Images are generated at test time with the `image` crate so the suite
//! needs no binary fixtures on disk.

use image::{ImageEncoder, RgbImage, RgbaImage};
use std::fs;
use std::io::BufWriter;
use std::path::Path;

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

fn create_parent(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
}

/// Write a valid RGB JPEG of the given size.
pub fn write_jpeg(path: &Path, width: u32, height: u32) {
    create_parent(path);
    let img = gradient(width, height);
    let writer = BufWriter::new(fs::File::create(path).unwrap());
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// Write a valid RGBA PNG of the given size.
pub fn write_png(path: &Path, width: u32, height: u32) {
    create_parent(path);
    let img = RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x % 256) as u8, (y % 256) as u8, 200, 180])
    });
    let writer = BufWriter::new(fs::File::create(path).unwrap());
    image::codecs::png::PngEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgba8)
        .unwrap();
}

/// Write a file that sniffs as PNG but cannot be decoded.
pub fn write_corrupt_png(path: &Path) {
    create_parent(path);
    let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
    bytes.extend_from_slice(&[0x13; 256]);
    fs::write(path, bytes).unwrap();
}
