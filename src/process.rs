//! Thumbnail worker pool.
//!
//! Stage 4 of the ingestion pipeline. Takes the uncached candidates and
//! produces one [`FileOutcome`] per file: either a ready-to-store
//! [`CachedImage`] or the reason the file was dropped.
//!
//! ## Bounded parallelism
//!
//! Work runs on a dedicated [rayon](https://docs.rs/rayon) pool with exactly
//! `workers` threads, so at most `workers` images are decoded (and held in
//! memory) at once. Unlike launching a fixed batch and waiting for its
//! slowest member, a free thread picks up the next file immediately. The
//! call returns only after every file has an outcome, in input order.
//!
//! ## Failure policy
//!
//! A file that fails to decode, encode or stat is skipped for this run and
//! not retried. It never aborts the pool; the only error this stage returns
//! is failing to build the thread pool itself.

use crate::classify::Candidate;
use crate::imaging::{BackendError, ThumbnailBackend, ThumbnailParams, ThumbnailSpec};
use crate::types::{CachedImage, SkipReason, Skipped};
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Configuration for the worker pool.
#[derive(Debug, Clone, Copy)]
pub struct ProcessConfig {
    pub thumbnail: ThumbnailSpec,
    /// Upper bound on concurrently running thumbnail jobs.
    pub workers: usize,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            thumbnail: ThumbnailSpec::default(),
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}

/// What happened to one uncached file.
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Generated(CachedImage),
    Skipped(Skipped),
}

impl FileOutcome {
    pub fn path(&self) -> PathBuf {
        match self {
            FileOutcome::Generated(image) => PathBuf::from(&image.path),
            FileOutcome::Skipped(skipped) => skipped.path.clone(),
        }
    }
}

/// Progress notification, sent as each file finishes.
#[derive(Debug, Clone)]
pub enum ProcessEvent {
    Generated { path: PathBuf },
    Skipped { path: PathBuf, reason: SkipReason },
}

impl From<&FileOutcome> for ProcessEvent {
    fn from(outcome: &FileOutcome) -> Self {
        match outcome {
            FileOutcome::Generated(image) => ProcessEvent::Generated {
                path: PathBuf::from(&image.path),
            },
            FileOutcome::Skipped(skipped) => ProcessEvent::Skipped {
                path: skipped.path.clone(),
                reason: skipped.reason.clone(),
            },
        }
    }
}

/// Thumbnail every candidate on a pool of `config.workers` threads.
pub fn generate_thumbnails(
    backend: &impl ThumbnailBackend,
    candidates: &[Candidate],
    config: &ProcessConfig,
    progress: Option<Sender<ProcessEvent>>,
) -> Result<Vec<FileOutcome>, ProcessError> {
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers.max(1))
        .thread_name(|i| format!("thumb-{i}"))
        .build()?;

    let outcomes = pool.install(|| {
        candidates
            .par_iter()
            .map(|candidate| {
                let outcome = thumbnail_one(backend, candidate, &config.thumbnail);
                if let Some(tx) = &progress {
                    // A dropped receiver only means nobody is watching.
                    let _ = tx.send(ProcessEvent::from(&outcome));
                }
                outcome
            })
            .collect()
    });

    Ok(outcomes)
}

/// Decode, thumbnail and package a single file.
fn thumbnail_one(
    backend: &impl ThumbnailBackend,
    candidate: &Candidate,
    spec: &ThumbnailSpec,
) -> FileOutcome {
    let path = candidate.file.path();
    let skip = |reason: SkipReason| {
        debug!(path = %path.display(), %reason, "thumbnail skipped");
        FileOutcome::Skipped(Skipped {
            path: path.to_path_buf(),
            reason,
        })
    };

    let Some(key) = candidate.file.key() else {
        return skip(SkipReason::NonUtf8Path);
    };

    let params = ThumbnailParams::new(path.to_path_buf(), candidate.mime_type, spec);
    let jpeg = match backend.thumbnail(&params) {
        Ok(bytes) => bytes,
        Err(BackendError::Encode(e)) => return skip(SkipReason::Encode(e)),
        Err(e) => return skip(SkipReason::Decode(e.to_string())),
    };

    let modified_at = match candidate.file.modified_secs() {
        Ok(secs) => secs,
        Err(e) => return skip(SkipReason::Metadata(e.to_string())),
    };

    FileOutcome::Generated(CachedImage::new(
        key.to_string(),
        candidate.mime_type,
        &jpeg,
        modified_at,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::RustBackend;
    use crate::imaging::backend::tests::MockBackend;
    use crate::scan::FileRef;
    use crate::test_helpers::{write_corrupt_png, write_jpeg, write_png};
    use crate::types::MimeType;
    use std::fs;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;

    fn candidate(path: &Path, mime_type: MimeType) -> Candidate {
        Candidate {
            file: FileRef::new(path),
            mime_type,
        }
    }

    /// Dummy files: the mock backend never reads them, but the worker stats them.
    fn dummy_candidates(dir: &Path, count: usize) -> Vec<Candidate> {
        (0..count)
            .map(|i| {
                let path = dir.join(format!("{i:03}.png"));
                fs::write(&path, "").unwrap();
                candidate(&path, MimeType::Png)
            })
            .collect()
    }

    fn config(workers: usize) -> ProcessConfig {
        ProcessConfig {
            workers,
            ..Default::default()
        }
    }

    // =========================================================================
    // Mock backend (no real decoding)
    // =========================================================================

    #[test]
    fn every_candidate_gets_an_outcome_in_order() {
        let tmp = TempDir::new().unwrap();
        let candidates = dummy_candidates(tmp.path(), 10);
        let backend = MockBackend::new();

        let outcomes = generate_thumbnails(&backend, &candidates, &config(3), None).unwrap();

        assert_eq!(outcomes.len(), 10);
        for (outcome, candidate) in outcomes.iter().zip(&candidates) {
            assert_eq!(outcome.path(), candidate.file.path());
            assert!(matches!(outcome, FileOutcome::Generated(_)));
        }
    }

    #[test]
    fn concurrency_never_exceeds_worker_count() {
        let tmp = TempDir::new().unwrap();
        let candidates = dummy_candidates(tmp.path(), 12);
        let backend = MockBackend::with_delay(Duration::from_millis(20));

        generate_thumbnails(&backend, &candidates, &config(2), None).unwrap();

        assert!(backend.max_in_flight() <= 2);
        assert_eq!(backend.get_operations().len(), 12);
    }

    #[test]
    fn single_worker_runs_sequentially() {
        let tmp = TempDir::new().unwrap();
        let candidates = dummy_candidates(tmp.path(), 4);
        let backend = MockBackend::with_delay(Duration::from_millis(5));

        generate_thumbnails(&backend, &candidates, &config(1), None).unwrap();
        assert_eq!(backend.max_in_flight(), 1);
    }

    #[test]
    fn backend_failure_skips_only_that_file() {
        let tmp = TempDir::new().unwrap();
        let candidates = dummy_candidates(tmp.path(), 3);
        let bad = candidates[1].file.path().to_path_buf();
        let backend = MockBackend::new().fail_on(&bad);

        let outcomes = generate_thumbnails(&backend, &candidates, &config(2), None).unwrap();

        assert!(matches!(outcomes[0], FileOutcome::Generated(_)));
        assert!(matches!(
            &outcomes[1],
            FileOutcome::Skipped(Skipped { path, reason: SkipReason::Decode(_) }) if *path == bad
        ));
        assert!(matches!(outcomes[2], FileOutcome::Generated(_)));
    }

    #[test]
    fn vanished_file_is_metadata_skip() {
        let tmp = TempDir::new().unwrap();
        let gone = candidate(&tmp.path().join("gone.png"), MimeType::Png);
        let backend = MockBackend::new();

        let outcomes = generate_thumbnails(&backend, &[gone], &config(1), None).unwrap();
        assert!(matches!(
            &outcomes[0],
            FileOutcome::Skipped(Skipped { reason: SkipReason::Metadata(_), .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_path_is_skipped_without_a_key() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let odd = candidate(
            &Path::new("/w").join(OsStr::from_bytes(b"\xff.png")),
            MimeType::Png,
        );
        let outcomes = generate_thumbnails(&MockBackend::new(), &[odd], &config(1), None).unwrap();
        assert!(matches!(
            &outcomes[0],
            FileOutcome::Skipped(Skipped { reason: SkipReason::NonUtf8Path, .. })
        ));
    }

    #[test]
    fn thumbnail_spec_reaches_backend() {
        let tmp = TempDir::new().unwrap();
        let candidates = dummy_candidates(tmp.path(), 1);
        let backend = MockBackend::new();
        let config = ProcessConfig {
            thumbnail: ThumbnailSpec {
                width: 160,
                height: 90,
                quality: crate::imaging::Quality::new(70),
            },
            workers: 1,
        };

        generate_thumbnails(&backend, &candidates, &config, None).unwrap();

        let ops = backend.get_operations();
        assert_eq!((ops[0].width, ops[0].height, ops[0].quality), (160, 90, 70));
    }

    #[test]
    fn progress_events_one_per_file() {
        let tmp = TempDir::new().unwrap();
        let candidates = dummy_candidates(tmp.path(), 5);
        let backend = MockBackend::new().fail_on(candidates[0].file.path());
        let (tx, rx) = std::sync::mpsc::channel();

        generate_thumbnails(&backend, &candidates, &config(2), Some(tx)).unwrap();

        let events: Vec<ProcessEvent> = rx.iter().collect();
        assert_eq!(events.len(), 5);
        let skipped = events
            .iter()
            .filter(|e| matches!(e, ProcessEvent::Skipped { .. }))
            .count();
        assert_eq!(skipped, 1);
    }

    #[test]
    fn empty_input_does_no_work() {
        let backend = MockBackend::new();
        let outcomes = generate_thumbnails(&backend, &[], &config(4), None).unwrap();
        assert!(outcomes.is_empty());
        assert!(backend.get_operations().is_empty());
    }

    // =========================================================================
    // Real backend
    // =========================================================================

    #[test]
    fn real_images_produce_records() {
        let tmp = TempDir::new().unwrap();
        let png = tmp.path().join("a.png");
        let jpg = tmp.path().join("b.jpg");
        write_png(&png, 64, 48);
        write_jpeg(&jpg, 48, 64);

        let outcomes = generate_thumbnails(
            &RustBackend::new(),
            &[candidate(&png, MimeType::Png), candidate(&jpg, MimeType::Jpeg)],
            &config(2),
            None,
        )
        .unwrap();

        let FileOutcome::Generated(first) = &outcomes[0] else {
            panic!("expected a record, got {:?}", outcomes[0]);
        };
        assert_eq!(first.path, png.to_string_lossy());
        assert_eq!(first.mime_type, MimeType::Png);
        assert!(first.thumbnail_bytes().unwrap().starts_with(b"\xff\xd8\xff"));
        assert!(first.modified_at.parse::<u64>().is_ok());
        assert!(matches!(outcomes[1], FileOutcome::Generated(_)));
    }

    #[test]
    fn corrupt_png_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let broken = tmp.path().join("broken.png");
        write_corrupt_png(&broken);

        let outcomes = generate_thumbnails(
            &RustBackend::new(),
            &[candidate(&broken, MimeType::Png)],
            &config(1),
            None,
        )
        .unwrap();
        assert!(matches!(
            &outcomes[0],
            FileOutcome::Skipped(Skipped { reason: SkipReason::Decode(_), .. })
        ));
    }
}
