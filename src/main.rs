use clap::{Parser, Subcommand, ValueEnum};
use env_logger::Env;
use sift::cache::ThumbnailCache;
use sift::cancel::CancelToken;
use sift::config::{self, SiftConfig, SortOrder};
use sift::pipeline::Pipeline;
use sift::{output, scan};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "sift")]
#[command(about = "Browse photo folders with fast, cached thumbnails")]
#[command(long_about = "\
Browse photo folders with fast, cached thumbnails

Each folder is scanned for JPEG and PNG images. A raw file (.orf) sharing a
basename with a JPEG is paired with it rather than listed on its own.

Thumbnails come from the cheapest available source:
  1. the shared cache (<temp>/sift-thumbs/<sha256(path)>.jpg)
  2. the preview embedded in a JPEG's EXIF block
  3. decoding and resizing the full image

A sift.toml inside the folder overrides the defaults for that folder.
Run 'sift gen-config' to print a documented one.")]
#[command(version)]
struct Cli {
    /// Log cache hits, fallbacks and other detail
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List a folder's images, raw files paired with their JPEGs
    Scan {
        folder: PathBuf,
        /// Print the catalog as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate thumbnails for every image in a folder
    Thumbs(ThumbsArgs),
    /// Show where a file's thumbnail is cached and whether it exists
    Locate { file: PathBuf },
    /// Print a stock sift.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct ThumbsArgs {
    folder: PathBuf,
    /// Longer edge of resized thumbnails, in pixels
    #[arg(long)]
    max_size: Option<u32>,
    /// Catalog order
    #[arg(long, value_enum)]
    sort: Option<SortArg>,
    /// Per-image timeout in seconds (0 disables)
    #[arg(long)]
    timeout: Option<u64>,
}

// Wrapper for clap ValueEnum; SortOrder itself only speaks serde
#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Scan,
    NumericDesc,
    NumericAsc,
}

impl From<SortArg> for SortOrder {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Scan => SortOrder::Scan,
            SortArg::NumericDesc => SortOrder::NumericDesc,
            SortArg::NumericAsc => SortOrder::NumericAsc,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    match cli.command {
        Command::Scan { folder, json } => {
            let config = config::load_config(&folder)?;
            let mut catalog = scan::scan_folder(&folder)?;
            scan::sort_catalog(
                &mut catalog,
                config.catalog.sort,
                &config.catalog.numeric_prefix,
            );
            if json {
                println!("{}", serde_json::to_string_pretty(&catalog)?);
            } else {
                output::print_catalog(&catalog, &folder);
            }
        }
        Command::Thumbs(args) => {
            let config = thumbs_config(&args)?;
            let mut catalog = scan::scan_folder(&args.folder)?;
            scan::sort_catalog(
                &mut catalog,
                config.catalog.sort,
                &config.catalog.numeric_prefix,
            );
            output::print_catalog(&catalog, &args.folder);

            let pipeline = Pipeline::with_rust_backend(&config)?;
            let report = pipeline.run_with(catalog, &CancelToken::new(), output::print_outcome);
            output::print_summary(&report.stats);
        }
        Command::Locate { file } => {
            // Cache keys are built from absolute paths, as the scanner emits them.
            let file = std::path::absolute(&file)?;
            let folder = file.parent().unwrap_or(Path::new("."));
            let config = config::load_config(folder)?;
            let cache = ThumbnailCache::from_config(&config.cache);
            let entry = cache.locate(&file);
            output::print_locate(&file, &entry, cache.has_entry(&entry));
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Folder config with command-line overrides applied on top.
fn thumbs_config(args: &ThumbsArgs) -> Result<SiftConfig, config::ConfigError> {
    let mut config = config::load_config(&args.folder)?;
    if let Some(max_size) = args.max_size {
        config.thumbnails.max_size = max_size;
    }
    if let Some(sort) = args.sort {
        config.catalog.sort = sort.into();
    }
    if let Some(secs) = args.timeout {
        config.pipeline.unit_timeout_secs = secs;
    }
    config.validate()?;
    Ok(config)
}
