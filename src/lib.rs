//! # Wallcache
//!
//! A thumbnail cache builder for wallpaper directories. Point it at a folder of
//! images and it keeps an SQLite database of small JPEG previews, keyed by each
//! image's absolute path, so a wallpaper picker can render a grid without
//! decoding full-size files.
//!
//! # Architecture: One Pass, One Commit
//!
//! A run is a straight pipeline. Each stage is a plain function over the
//! previous stage's output:
//!
//! ```text
//! 1. Scan       source/    →  Vec<FileRef>      (every regular file, recursive)
//! 2. Classify   FileRef    →  Candidate         (PNG / JPEG by magic bytes)
//! 3. Index      Candidate  →  cached | uncached (point lookups in the store)
//! 4. Process    uncached   →  CachedImage       (bounded worker pool)
//! 5. Commit     records    →  image table       (one transaction)
//! ```
//!
//! Per-file problems (not an image, partial download, corrupt data) only mean
//! that file gets no cache entry this run. Setup, traversal and commit
//! failures abort the run; a failed commit leaves the database as it was.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Stage 1: walks the source directory, returns files in a stable order |
//! | [`classify`] | Stage 2: content sniffing and the partial-download filter |
//! | [`index`] | Stage 3: splits candidates into cached and uncached |
//! | [`process`] | Stage 4: thumbnails uncached images on a sized rayon pool |
//! | [`store`] | Stage 5 and reads: the `ImageStore` trait and its SQLite implementation |
//! | [`pipeline`] | Wires the stages together and produces the run report |
//! | [`imaging`] | Decode, centre-crop, scale and JPEG-encode behind a swappable backend |
//! | [`config`] | `wallcache.toml` loading, validation and stock defaults |
//! | [`types`] | Shared records: `MimeType`, `CachedImage`, skip reasons |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Content, Not Extensions
//!
//! Wallpapers arrive from browsers, phones and scrapers with missing or wrong
//! extensions. Classification reads the first 512 bytes and checks the PNG and
//! JPEG signatures; the file name only matters for the `.crdownload` suffix,
//! which marks a download still in progress.
//!
//! ## Bounded Worker Pool
//!
//! Decoding a 6K wallpaper takes tens of megabytes. Thumbnails are made on a
//! dedicated pool with a fixed number of threads (CPU count by default), so at
//! most that many images are in memory at once, and a slow file never holds up
//! an idle thread.
//!
//! ## Single Writer, Single Transaction
//!
//! Workers never touch the database. They hand finished records back to the
//! coordinating thread, which inserts them all in one transaction. Concurrent
//! readers see either the previous cache or the full new one.
//!
//! ## Fixed Schema
//!
//! The `image(path, image_type, base64, date_modified)` table layout is shared
//! with existing consumers that read thumbnails straight from SQLite. The
//! thumbnail is stored as standard base64 of the JPEG bytes and the
//! modification time as decimal Unix seconds.

pub mod classify;
pub mod config;
pub mod imaging;
pub mod index;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod scan;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
