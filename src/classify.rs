//! Content sniffing.
//!
//! Stage 2 of the ingestion pipeline. Decides which scanned files are
//! images by their leading bytes, never by extension: a JPEG saved as
//! `wall.dat` is accepted, a text file renamed `wall.png` is not.
//!
//! | Type | Signature |
//! |---|---|
//! | PNG | `89 50 4E 47 0D 0A 1A 0A` |
//! | JPEG | `FF D8 FF` |
//!
//! Files still being downloaded by a browser (`*.crdownload`) are rejected
//! by name before any I/O, whatever their content. So are paths that are not
//! valid UTF-8, since they cannot be stored as a distinct cache key.
//!
//! Each file is read once here. The sniffed [`MimeType`] rides along in the
//! [`Candidate`] so the worker pool can decode with a known format instead of
//! sniffing again.

use crate::scan::FileRef;
use crate::types::{MimeType, SkipReason, Skipped};
use std::fs::File;
use std::io::Read;
use tracing::debug;

/// Number of leading bytes inspected.
pub const SNIFF_LEN: u64 = 512;

/// Name suffix Chromium-based browsers use for in-progress downloads.
pub const PARTIAL_DOWNLOAD_SUFFIX: &str = ".crdownload";

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
const JPEG_SIGNATURE: &[u8] = b"\xff\xd8\xff";

/// A file that passed classification, with its verified type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub file: FileRef,
    pub mime_type: MimeType,
}

/// Result of classifying a batch of scanned files.
#[derive(Debug, Default)]
pub struct Classification {
    pub accepted: Vec<Candidate>,
    pub skipped: Vec<Skipped>,
}

/// Identify a supported image type from leading bytes.
pub fn sniff(bytes: &[u8]) -> Option<MimeType> {
    if bytes.starts_with(PNG_SIGNATURE) {
        Some(MimeType::Png)
    } else if bytes.starts_with(JPEG_SIGNATURE) {
        Some(MimeType::Jpeg)
    } else {
        None
    }
}

fn is_partial_download(file: &FileRef) -> bool {
    file.path().file_name().is_some_and(|name| {
        name.as_encoded_bytes()
            .ends_with(PARTIAL_DOWNLOAD_SUFFIX.as_bytes())
    })
}

/// Classify a single file.
pub fn classify_file(file: &FileRef) -> Result<Candidate, SkipReason> {
    if is_partial_download(file) {
        return Err(SkipReason::PartialDownload);
    }
    if file.key().is_none() {
        return Err(SkipReason::NonUtf8Path);
    }

    let handle = File::open(file.path()).map_err(|e| SkipReason::Unreadable(e.to_string()))?;
    let mut head = Vec::with_capacity(SNIFF_LEN as usize);
    handle
        .take(SNIFF_LEN)
        .read_to_end(&mut head)
        .map_err(|e| SkipReason::Unreadable(e.to_string()))?;
    if head.is_empty() {
        return Err(SkipReason::Unreadable("empty file".into()));
    }

    let mime_type = sniff(&head).ok_or(SkipReason::NotAnImage)?;
    Ok(Candidate {
        file: file.clone(),
        mime_type,
    })
}

/// Split scanned files into accepted candidates and skipped files.
///
/// Never fails: unreadable files are disqualified, not errors.
pub fn classify(files: &[FileRef]) -> Classification {
    let mut result = Classification::default();
    for file in files {
        match classify_file(file) {
            Ok(candidate) => result.accepted.push(candidate),
            Err(reason) => {
                debug!(path = %file.path().display(), %reason, "not an image");
                result.skipped.push(Skipped {
                    path: file.path().to_path_buf(),
                    reason,
                });
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{write_png, write_jpeg};
    use std::fs;
    use tempfile::TempDir;

    // =========================================================================
    // Signature sniffing
    // =========================================================================

    #[test]
    fn sniff_png_signature() {
        assert_eq!(sniff(b"\x89PNG\r\n\x1a\nrest"), Some(MimeType::Png));
    }

    #[test]
    fn sniff_jpeg_signature() {
        assert_eq!(sniff(b"\xff\xd8\xff\xe0\x00\x10JFIF"), Some(MimeType::Jpeg));
    }

    #[test]
    fn sniff_rejects_other_content() {
        assert_eq!(sniff(b"GIF89a"), None);
        assert_eq!(sniff(b"hello world"), None);
        assert_eq!(sniff(b"\x89PNG"), None);
        assert_eq!(sniff(b"\xff\xd8"), None);
        assert_eq!(sniff(b""), None);
    }

    // =========================================================================
    // File classification
    // =========================================================================

    #[test]
    fn png_with_any_extension_accepted() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("wallpaper.bin");
        write_png(&path, 8, 8);

        let candidate = classify_file(&FileRef::new(&path)).unwrap();
        assert_eq!(candidate.mime_type, MimeType::Png);
    }

    #[test]
    fn jpeg_without_extension_accepted() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("wallpaper");
        write_jpeg(&path, 8, 8);

        let candidate = classify_file(&FileRef::new(&path)).unwrap();
        assert_eq!(candidate.mime_type, MimeType::Jpeg);
    }

    #[test]
    fn partial_download_rejected_despite_valid_bytes() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("x.jpeg.crdownload");
        write_jpeg(&path, 8, 8);

        assert_eq!(
            classify_file(&FileRef::new(&path)),
            Err(SkipReason::PartialDownload)
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn partial_download_with_non_utf8_name_rejected() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(OsStr::from_bytes(b"wall\xff.jpg.crdownload"));
        write_jpeg(&path, 8, 8);

        assert_eq!(
            classify_file(&FileRef::new(&path)),
            Err(SkipReason::PartialDownload)
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn non_utf8_path_rejected() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(OsStr::from_bytes(b"\xfe.jpg"));
        write_jpeg(&path, 8, 8);

        assert_eq!(
            classify_file(&FileRef::new(&path)),
            Err(SkipReason::NonUtf8Path)
        );
    }

    #[test]
    fn text_renamed_png_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("notes.png");
        fs::write(&path, "just some text, not pixels").unwrap();

        assert_eq!(
            classify_file(&FileRef::new(&path)),
            Err(SkipReason::NotAnImage)
        );
    }

    #[test]
    fn empty_file_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("empty.png");
        fs::write(&path, "").unwrap();

        assert!(matches!(
            classify_file(&FileRef::new(&path)),
            Err(SkipReason::Unreadable(_))
        ));
    }

    #[test]
    fn missing_file_rejected_not_error() {
        let tmp = TempDir::new().unwrap();
        let result = classify(&[FileRef::new(tmp.path().join("vanished.png"))]);
        assert!(result.accepted.is_empty());
        assert!(matches!(result.skipped[0].reason, SkipReason::Unreadable(_)));
    }

    #[test]
    fn short_file_with_signature_accepted() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tiny");
        fs::write(&path, b"\xff\xd8\xff").unwrap();

        assert!(classify_file(&FileRef::new(&path)).is_ok());
    }

    #[test]
    fn classify_splits_accepted_and_skipped() {
        let tmp = TempDir::new().unwrap();
        let png = tmp.path().join("a.png");
        let txt = tmp.path().join("b.txt");
        write_png(&png, 4, 4);
        fs::write(&txt, "text").unwrap();

        let result = classify(&[FileRef::new(&png), FileRef::new(&txt)]);
        assert_eq!(result.accepted.len(), 1);
        assert_eq!(result.accepted[0].file.path(), png.as_path());
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].path, txt);
        assert_eq!(result.skipped[0].reason, SkipReason::NotAnImage);
    }
}
