//! Cache configuration.
//!
//! Settings come from an optional `wallcache.toml`. The file is sparse: its
//! values are merged over the stock defaults, so it only needs the keys it
//! wants to change. Command-line flags override the merged result.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! source_dir = "."          # Directory tree to scan
//! # database = "..."        # Default: <user cache dir>/wallcache/cache.db
//!
//! [thumbnails]
//! width = 300               # Thumbnail footprint in pixels (at most 4096)
//! height = 300
//! quality = 95              # JPEG quality (1-100)
//!
//! [processing]
//! max_processes = 4         # Max parallel decoders (omit for auto = CPU cores)
//! lookup_errors = "skip"    # "skip" or "treat-as-miss"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the config file looked up when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "wallcache.toml";

/// Largest allowed thumbnail width or height, in pixels.
pub const MAX_THUMBNAIL_SIDE: u32 = 4096;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Could not determine a cache directory; set `database` explicitly")]
    NoCacheDir,
}

/// Top-level configuration loaded from `wallcache.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Root of the wallpaper tree.
    pub source_dir: PathBuf,
    /// SQLite database file. `None` resolves to the user cache directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,
    pub thumbnails: ThumbnailsConfig,
    pub processing: ProcessingConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("."),
            database: None,
            thumbnails: ThumbnailsConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl CacheConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thumbnails.width == 0 || self.thumbnails.height == 0 {
            return Err(ConfigError::Validation(
                "thumbnails.width and thumbnails.height must be non-zero".into(),
            ));
        }
        if self.thumbnails.width.max(self.thumbnails.height) > MAX_THUMBNAIL_SIDE {
            return Err(ConfigError::Validation(format!(
                "thumbnails.width and thumbnails.height must be at most {MAX_THUMBNAIL_SIDE}"
            )));
        }
        if !(1..=100).contains(&self.thumbnails.quality) {
            return Err(ConfigError::Validation(
                "thumbnails.quality must be 1-100".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// The database path, falling back to `<cache dir>/wallcache/cache.db`.
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.database {
            return Ok(path.clone());
        }
        let mut path = dirs::cache_dir().ok_or(ConfigError::NoCacheDir)?;
        path.push("wallcache");
        path.push("cache.db");
        Ok(path)
    }
}

/// Thumbnail footprint and encoding settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailsConfig {
    pub width: u32,
    pub height: u32,
    /// JPEG encoder quality.
    pub quality: u8,
}

impl Default for ThumbnailsConfig {
    fn default() -> Self {
        Self {
            width: 300,
            height: 300,
            quality: 95,
        }
    }
}

/// What the cache index does when a point lookup fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LookupPolicy {
    /// Drop the path for this run: neither reprocess nor re-check it.
    #[default]
    Skip,
    /// Degrade gracefully and treat the path as not cached.
    TreatAsMiss,
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of concurrent thumbnail workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_processes: Option<usize>,
    pub lookup_errors: LookupPolicy,
}

/// Resolve the effective worker count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(CacheConfig::default()).expect("default config must serialize")
}

/// Lay a sparse `wallcache.toml` over the stock defaults.
///
/// `[thumbnails]` and `[processing]` merge key by key, so a file that only
/// sets `quality` keeps the default `width` and `height`.
pub fn merge_toml(defaults: toml::Value, file: toml::Value) -> toml::Value {
    match (defaults, file) {
        (toml::Value::Table(defaults), toml::Value::Table(file)) => {
            toml::Value::Table(merge_tables(defaults, file))
        }
        (_, file) => file,
    }
}

fn merge_tables(mut defaults: toml::Table, file: toml::Table) -> toml::Table {
    for (key, value) in file {
        let merged = match defaults.remove(&key) {
            Some(default) => merge_toml(default, value),
            None => value,
        };
        defaults.insert(key, merged);
    }
    defaults
}

/// Parse config text, merge it over the defaults and validate.
pub fn parse_config(content: &str) -> Result<CacheConfig, ConfigError> {
    let overlay: toml::Value = toml::from_str(content)?;
    let config: CacheConfig = merge_toml(stock_defaults_value(), overlay).try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a file.
///
/// A missing file is only an error when `required` is set (the user named it
/// explicitly); otherwise the stock defaults are returned.
pub fn load_config(path: &Path, required: bool) -> Result<CacheConfig, ConfigError> {
    if !required && !path.exists() {
        return Ok(CacheConfig::default());
    }
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Returns a fully-commented stock `wallcache.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# wallcache configuration
# =======================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# Directory tree to scan for wallpapers (searched recursively).
source_dir = "."

# SQLite database holding the thumbnails.
# Defaults to <user cache dir>/wallcache/cache.db when omitted.
# database = "/home/me/.cache/wallcache/cache.db"

# ---------------------------------------------------------------------------
# Thumbnails
# ---------------------------------------------------------------------------
[thumbnails]
# Footprint of every thumbnail, at most 4096 on either side. Sources are
# centre-cropped to its aspect ratio and scaled to fill it.
width = 300
height = 300

# JPEG quality of the stored thumbnails (1-100).
quality = 95

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum number of images decoded at once. Omit to use every CPU core;
# larger values are clamped to the core count.
# max_processes = 4

# What to do when checking the cache for a path fails:
#   "skip"          leave the file alone for this run (default)
#   "treat-as-miss" process it as if it were not cached
lookup_errors = "skip"
"##
}
