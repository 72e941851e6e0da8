//! The ingestion run, end to end.
//!
//! ```text
//! scan_tree ─→ classify ─→ index::partition ─→ generate_thumbnails ─→ commit
//!  (files)     (images)     (cache misses)       (records)            (one tx)
//! ```
//!
//! Everything except thumbnailing runs on the calling thread, which owns the
//! store handle. Per-file problems degrade to "no cache entry for this file"
//! and are collected in the [`RunReport`]; only setup, traversal and commit
//! failures end the run with an error. After a successful run the store holds
//! a superset of what it held before; after a failed commit it is unchanged.

use crate::classify::{self, Classification};
use crate::config::LookupPolicy;
use crate::imaging::ThumbnailBackend;
use crate::index;
use crate::process::{self, FileOutcome, ProcessConfig, ProcessError, ProcessEvent};
use crate::scan::{self, ScanError};
use crate::store::{ImageStore, SqliteStore, StoreError};
use crate::types::Skipped;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum RunError {
    #[error("Cannot open cache store: {0}")]
    Setup(#[source] StoreError),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error("Commit failed, cache left unchanged: {0}")]
    Commit(#[source] StoreError),
}

/// Settings for one ingestion run.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineConfig {
    pub process: ProcessConfig,
    pub lookup_policy: LookupPolicy,
}

/// Per-run accounting of every scanned file.
#[derive(Debug, Default)]
pub struct RunReport {
    pub scanned: usize,
    /// Files the classifier turned away.
    pub rejected: Vec<Skipped>,
    /// Images already in the store; not touched.
    pub cached: Vec<PathBuf>,
    pub lookup_failed: Vec<(PathBuf, String)>,
    /// Images thumbnailed and committed this run.
    pub added: Vec<PathBuf>,
    /// Images that passed classification but could not be thumbnailed.
    pub failed: Vec<Skipped>,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} added, {} cached, {} failed, {} not images ({} files scanned)",
            self.added.len(),
            self.cached.len(),
            self.failed.len(),
            self.rejected.len(),
            self.scanned
        )?;
        if !self.lookup_failed.is_empty() {
            write!(f, ", {} lookup errors", self.lookup_failed.len())?;
        }
        Ok(())
    }
}

/// Open the SQLite store, mapping failures to a setup error.
pub fn open_store(path: &Path) -> Result<SqliteStore, RunError> {
    SqliteStore::open(path).map_err(RunError::Setup)
}

/// Scan and classify without touching the store.
pub fn preview(root: &Path) -> Result<(usize, Classification), ScanError> {
    let files = scan::scan_tree(root)?;
    Ok((files.len(), classify::classify(&files)))
}

/// Run the whole pipeline against `root`, committing new thumbnails to
/// `store` in one transaction.
pub fn run(
    root: &Path,
    store: &mut impl ImageStore,
    backend: &impl ThumbnailBackend,
    config: &PipelineConfig,
    progress: Option<Sender<ProcessEvent>>,
) -> Result<RunReport, RunError> {
    let (scanned, classification) = preview(root)?;
    info!(
        scanned,
        images = classification.accepted.len(),
        "scanned {}",
        root.display()
    );

    let indexed = index::partition(classification.accepted, store, config.lookup_policy);
    info!(
        cached = indexed.cached.len(),
        uncached = indexed.uncached.len(),
        "checked cache"
    );

    let outcomes =
        process::generate_thumbnails(backend, &indexed.uncached, &config.process, progress)?;

    let mut records = Vec::new();
    let mut added = Vec::new();
    let mut failed = Vec::new();
    for outcome in outcomes {
        match outcome {
            FileOutcome::Generated(record) => {
                added.push(PathBuf::from(&record.path));
                records.push(record);
            }
            FileOutcome::Skipped(skipped) => failed.push(skipped),
        }
    }

    let committed = store.commit(&records).map_err(RunError::Commit)?;
    info!(committed, failed = failed.len(), "committed thumbnails");

    Ok(RunReport {
        scanned,
        rejected: classification.skipped,
        cached: indexed.cached,
        lookup_failed: indexed.lookup_failed,
        added,
        failed,
    })
}
