use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use wallcache::config::{self, CacheConfig};
use wallcache::imaging::{Quality, RustBackend, ThumbnailSpec};
use wallcache::pipeline::{self, PipelineConfig};
use wallcache::output;
use wallcache::process::ProcessConfig;
use wallcache::scan;

#[derive(Parser)]
#[command(name = "wallcache")]
#[command(about = "Build a thumbnail cache for a wallpaper directory")]
#[command(long_about = "\
Build a thumbnail cache for a wallpaper directory

Every PNG and JPEG under the source directory (found by content, not by
extension) gets a small JPEG thumbnail stored in an SQLite database, keyed by
its absolute path. Files already in the cache are skipped, so repeated runs
only process new wallpapers. Each run commits all of its thumbnails in a
single transaction: it either adds everything it produced or nothing.

Files ending in .crdownload are ignored until the download finishes.

Run 'wallcache gen-config' to generate a documented wallcache.toml.")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./wallcache.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Wallpaper directory (overrides `source_dir`)
    #[arg(long, global = true)]
    source: Option<PathBuf>,

    /// SQLite cache database (overrides `database`)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Log debug details and list every skipped file
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan the source directory and cache thumbnails for new images
    Build,
    /// List which files would be treated as images, without touching the cache
    Scan,
    /// Show the cached record for one image
    Show {
        /// Path of the source image (resolved the same way `build` stores it)
        path: PathBuf,
        /// Write the decoded JPEG thumbnail to this file
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the number of cached thumbnails
    Stats,
    /// Delete every cached thumbnail
    Clear,
    /// Print a stock wallcache.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = load_config(&cli)?;
    let source = config.source_dir.clone();

    match cli.command {
        Command::Build => {
            let database = config.database_path()?;
            let mut store = pipeline::open_store(&database)?;
            let pipeline_config = PipelineConfig {
                process: ProcessConfig {
                    thumbnail: ThumbnailSpec {
                        width: config.thumbnails.width,
                        height: config.thumbnails.height,
                        quality: Quality::new(config.thumbnails.quality),
                    },
                    workers: config::effective_threads(&config.processing),
                },
                lookup_policy: config.processing.lookup_errors,
            };

            let (tx, rx) = std::sync::mpsc::channel();
            let printer_root = source.canonicalize().unwrap_or_else(|_| source.clone());
            let printer = std::thread::spawn(move || {
                for event in rx {
                    println!("{}", output::format_process_event(&event, &printer_root));
                }
            });
            let result = pipeline::run(
                &source,
                &mut store,
                &RustBackend::new(),
                &pipeline_config,
                Some(tx),
            );
            printer.join().ok();

            let report = result?;
            let root = source.canonicalize().unwrap_or(source);
            output::print_run_report(&report, &root, cli.verbose);
        }
        Command::Scan => {
            let (scanned, classification) = pipeline::preview(&source)?;
            let root = source.canonicalize().unwrap_or(source);
            output::print_preview(&classification, &root);
            println!("{} files scanned", scanned);
        }
        Command::Show { path, output: out } => {
            let store = pipeline::open_store(&config.database_path()?)?;
            let key = scan::resolve_path(&path)?;
            match store.get(&key.to_string_lossy())? {
                Some(record) => {
                    for line in output::format_record(&record) {
                        println!("{}", line);
                    }
                    if let Some(out) = out {
                        std::fs::write(&out, record.thumbnail_bytes()?)?;
                        println!("Wrote {}", out.display());
                    }
                }
                None => {
                    println!("Not cached: {}", key.display());
                    std::process::exit(1);
                }
            }
        }
        Command::Stats => {
            let database = config.database_path()?;
            let store = pipeline::open_store(&database)?;
            println!("{} thumbnails in {}", store.count()?, database.display());
        }
        Command::Clear => {
            let database = config.database_path()?;
            let mut store = pipeline::open_store(&database)?;
            let removed = store.clear()?;
            println!("Removed {} thumbnails from {}", removed, database.display());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load the config file and apply command-line overrides.
fn load_config(cli: &Cli) -> Result<CacheConfig, config::ConfigError> {
    let (path, required) = match &cli.config {
        Some(path) => (path.clone(), true),
        None => (PathBuf::from(config::DEFAULT_CONFIG_FILE), false),
    };
    let mut config = config::load_config(&path, required)?;
    if let Some(source) = &cli.source {
        config.source_dir = source.clone();
    }
    if let Some(database) = &cli.database {
        config.database = Some(database.clone());
    }
    Ok(config)
}

fn setup_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("wallcache=debug,warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("wallcache=info,warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
