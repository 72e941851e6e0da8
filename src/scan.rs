//! Directory tree scanning.
//!
//! Stage 1 of the ingestion pipeline. Walks the wallpaper root recursively
//! and returns every regular file as a [`FileRef`]. Directories are descended
//! into, never returned. Symlinked directories are not followed; a symlink
//! that resolves to a regular file is kept, since the classifier and decoder
//! open it through the link anyway.
//!
//! ## Failure policy
//!
//! Scanning is strict: if the root or any directory below it cannot be
//! listed, the whole scan fails. A partial tree would make the cache look
//! complete while silently missing a subtree.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Cannot read source directory {path}: {source}")]
    Root { path: PathBuf, source: io::Error },
    #[error("Source is not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("Cannot traverse {path}: {source}")]
    Traversal {
        path: PathBuf,
        source: walkdir::Error,
    },
}

/// A regular file discovered under the scan root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FileRef {
    path: PathBuf,
}

impl FileRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Absolute path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path as the string used for the cache key.
    ///
    /// `None` for paths that are not valid UTF-8: a lossy conversion would
    /// map distinct files onto the same key.
    pub fn key(&self) -> Option<&str> {
        self.path.to_str()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }

    /// Current modification time of the file, read from disk on each call.
    pub fn modified(&self) -> io::Result<SystemTime> {
        fs::metadata(&self.path)?.modified()
    }

    /// Modification time rendered as whole seconds since the Unix epoch.
    ///
    /// Times before the epoch are clamped to zero.
    pub fn modified_secs(&self) -> io::Result<String> {
        let modified = self.modified()?;
        let secs = modified
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Ok(secs.to_string())
    }
}

/// Recursively list every regular file under `root`, sorted by path.
pub fn scan_tree(root: &Path) -> Result<Vec<FileRef>, ScanError> {
    let root = fs::canonicalize(root).map_err(|source| ScanError::Root {
        path: root.to_path_buf(),
        source,
    })?;
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(&root).sort_by_file_name() {
        let entry = entry.map_err(|source| traversal_error(&root, source))?;
        let file_type = entry.file_type();
        if file_type.is_file() || (file_type.is_symlink() && entry.path().is_file()) {
            files.push(FileRef::new(entry.into_path()));
        }
    }

    debug!(root = %root.display(), files = files.len(), "scan complete");
    Ok(files)
}

/// Resolve a user-supplied path to the form [`scan_tree`] produces, so it
/// can be looked up in the cache. Symlinked directories and `..` components
/// are resolved; a path that no longer exists is only made absolute.
pub fn resolve_path(path: &Path) -> io::Result<PathBuf> {
    fs::canonicalize(path).or_else(|_| std::path::absolute(path))
}

fn traversal_error(root: &Path, source: walkdir::Error) -> ScanError {
    let path = source
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());
    ScanError::Traversal { path, source }
}
