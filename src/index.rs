//! Cache index: split candidates into cached and uncached.
//!
//! Stage 3 of the ingestion pipeline. Each candidate path is checked with a
//! point lookup against the store; the cache is never loaded wholesale.
//!
//! A path already in the store is never reprocessed, even if the file on
//! disk changed after it was cached. The first capture wins; refreshing
//! stale thumbnails is out of scope for this pipeline.

use crate::classify::Candidate;
use crate::config::LookupPolicy;
use crate::store::ImageStore;
use crate::types::SkipReason;
use std::path::PathBuf;
use tracing::warn;

/// Outcome of checking every candidate against the store.
#[derive(Debug, Default)]
pub struct IndexOutcome {
    /// Candidates to thumbnail this run.
    pub uncached: Vec<Candidate>,
    /// Paths already in the store.
    pub cached: Vec<PathBuf>,
    /// Paths whose lookup failed, with the error text. Under
    /// [`LookupPolicy::TreatAsMiss`] these also appear in `uncached`.
    pub lookup_failed: Vec<(PathBuf, String)>,
}

/// Check every candidate against the store.
pub fn partition(
    candidates: Vec<Candidate>,
    store: &impl ImageStore,
    policy: LookupPolicy,
) -> IndexOutcome {
    let mut outcome = IndexOutcome::default();

    for candidate in candidates {
        let Some(key) = candidate.file.key() else {
            // Classification rejects these; never guess a key for one.
            outcome.lookup_failed.push((
                candidate.file.path().to_path_buf(),
                SkipReason::NonUtf8Path.to_string(),
            ));
            continue;
        };
        match store.contains(key) {
            Ok(true) => outcome.cached.push(candidate.file.path().to_path_buf()),
            Ok(false) => outcome.uncached.push(candidate),
            Err(e) => {
                warn!(path = %candidate.file.path().display(), error = %e, "cache lookup failed");
                outcome
                    .lookup_failed
                    .push((candidate.file.path().to_path_buf(), e.to_string()));
                if policy == LookupPolicy::TreatAsMiss {
                    outcome.uncached.push(candidate);
                }
            }
        }
    }

    outcome
}
