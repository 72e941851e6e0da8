//! Shared types used across the ingestion stages.
//!
//! [`CachedImage`] is the row shape of the store; [`MimeType`] and
//! [`SkipReason`] travel from classification through processing into the
//! final [`RunReport`](crate::pipeline::RunReport).

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt;
use std::path::PathBuf;

/// Content type of an accepted image, as determined by sniffing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MimeType {
    Png,
    Jpeg,
}

impl MimeType {
    pub fn as_str(self) -> &'static str {
        match self {
            MimeType::Png => "image/png",
            MimeType::Jpeg => "image/jpeg",
        }
    }

    /// Parse the string form stored in the `image_type` column.
    pub fn from_mime(s: &str) -> Option<Self> {
        match s {
            "image/png" => Some(MimeType::Png),
            "image/jpeg" => Some(MimeType::Jpeg),
            _ => None,
        }
    }

    /// The decoder to use for this type.
    pub fn image_format(self) -> image::ImageFormat {
        match self {
            MimeType::Png => image::ImageFormat::Png,
            MimeType::Jpeg => image::ImageFormat::Jpeg,
        }
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted cache record.
///
/// One row of the `image` table. Records are built in memory by the worker
/// pool and written once by the batch committer; the pipeline never updates
/// an existing row, so a record reflects the source file as it was on the
/// run that first captured it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedImage {
    /// Absolute path of the source file. Unique across the store.
    pub path: String,
    pub mime_type: MimeType,
    /// Base64 (standard alphabet, padded) of the JPEG thumbnail bytes.
    pub thumbnail_data: String,
    /// Source modification time, seconds since the Unix epoch.
    pub modified_at: String,
}

impl CachedImage {
    pub fn new(path: String, mime_type: MimeType, jpeg: &[u8], modified_at: String) -> Self {
        Self {
            path,
            mime_type,
            thumbnail_data: STANDARD.encode(jpeg),
            modified_at,
        }
    }

    /// Decode the stored payload back into JPEG bytes.
    pub fn thumbnail_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.thumbnail_data)
    }
}

/// Why a file produced no cache entry.
///
/// The first four variants come from classification, the rest from the
/// worker pool. None of them abort a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The file could not be opened or had no readable bytes.
    Unreadable(String),
    /// The name carries a browser partial-download suffix.
    PartialDownload,
    /// The path is not valid UTF-8 and has no exact cache key.
    NonUtf8Path,
    /// Leading bytes match neither the PNG nor the JPEG signature.
    NotAnImage,
    /// The image passed sniffing but failed to decode.
    Decode(String),
    /// The thumbnail could not be encoded.
    Encode(String),
    /// The modification time could not be read.
    Metadata(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Unreadable(e) => write!(f, "unreadable: {e}"),
            SkipReason::PartialDownload => f.write_str("partial download"),
            SkipReason::NonUtf8Path => f.write_str("path is not valid UTF-8"),
            SkipReason::NotAnImage => f.write_str("not a PNG or JPEG"),
            SkipReason::Decode(e) => write!(f, "decode failed: {e}"),
            SkipReason::Encode(e) => write!(f, "encode failed: {e}"),
            SkipReason::Metadata(e) => write!(f, "stat failed: {e}"),
        }
    }
}

/// A file that was dropped, paired with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    pub path: PathBuf,
    pub reason: SkipReason,
}
