//! yolotile: cut large YOLO-annotated images into fixed-size tiles.
//!
//! Each source image is divided into a grid of square tiles. Every box of
//! the image is intersected with every tile it overlaps, clipped, and
//! re-normalized to the tile's local frame, so the tiles can be used as a
//! training set on their own. Tiles with boxes are finally split into
//! `train.txt` and `test.txt` lists.
//!
//! # Modules
//!
//! - [`geom`]: Rectangles, coordinate frames and the normalized <-> pixel model
//! - [`grid`]: Tile grid enumeration
//! - [`engine`]: Box/tile intersection and reprojection
//! - [`emitter`]: Writing tile crops and label files
//! - [`label`]: YOLO label text format
//! - [`split`]: Train/test splitting
//! - [`tiling`]: Whole-dataset runs and reports
//! - [`error`]: Error types for yolotile operations

pub mod emitter;
pub mod engine;
pub mod error;
pub mod geom;
pub mod grid;
pub mod label;
pub mod split;
pub mod tiling;

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

pub use error::TilerError;

use split::SplitOptions;
use tiling::TileOptions;

/// The yolotile CLI application.
#[derive(Parser)]
#[command(name = "yolotile")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides this.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Tile a dataset and split the tiles into train/test lists.
    Tile(TileArgs),
    /// Re-split an already tiled directory.
    Split(SplitArgs),
}

/// Arguments for the tile subcommand.
#[derive(clap::Args)]
struct TileArgs {
    /// Source folder with images and labels to be tiled.
    #[arg(long)]
    source: PathBuf,

    /// Target folder for the tiled dataset (must be empty or missing).
    #[arg(long)]
    target: PathBuf,

    /// Image extension in the dataset.
    #[arg(long, default_value = ".JPG")]
    ext: String,

    /// Folder for tiles without bounding boxes (must be empty or missing).
    #[arg(long)]
    negative_dir: Option<PathBuf>,

    /// Tile size in pixels.
    #[arg(long, default_value_t = 416)]
    size: u32,

    /// Probability of a tile being assigned to the training list.
    #[arg(long, default_value_t = 0.8)]
    ratio: f64,

    /// Seed for a reproducible train/test split.
    #[arg(long, env = "YOLOTILE_SEED")]
    seed: Option<u64>,

    /// Abort on the first malformed label line or unreadable image.
    #[arg(long)]
    strict: bool,

    /// Number of images to tile in parallel.
    #[arg(long, default_value_t = 1)]
    jobs: usize,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Arguments for the split subcommand.
#[derive(clap::Args)]
struct SplitArgs {
    /// Folder holding tile images.
    target: PathBuf,

    /// Image extension of the tiles.
    #[arg(long, default_value = ".JPG")]
    ext: String,

    /// Probability of a tile being assigned to the training list.
    #[arg(long, default_value_t = 0.8)]
    ratio: f64,

    /// Seed for a reproducible train/test split.
    #[arg(long, env = "YOLOTILE_SEED")]
    seed: Option<u64>,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Run the yolotile CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), TilerError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(Commands::Tile(args)) => run_tile(args),
        Some(Commands::Split(args)) => run_split(args),
        None => {
            println!("yolotile {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Tile large YOLO-annotated images into fixed-size training crops.");
            println!();
            println!("Run 'yolotile --help' for usage information.");
            Ok(())
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A subscriber may already be installed when embedded; keep that one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Execute the tile subcommand.
fn run_tile(args: TileArgs) -> Result<(), TilerError> {
    check_output_format(&args.output)?;

    let opts = TileOptions {
        source: args.source,
        target: args.target,
        extension: args.ext,
        negative_dir: args.negative_dir,
        tile_size: args.size,
        split: SplitOptions {
            ratio: args.ratio,
            seed: args.seed,
        },
        strict: args.strict,
        jobs: args.jobs,
    };

    let report = tiling::tile_dataset(&opts)?;
    print_report(&report, &args.output)
}

/// Execute the split subcommand.
fn run_split(args: SplitArgs) -> Result<(), TilerError> {
    check_output_format(&args.output)?;

    let opts = SplitOptions {
        ratio: args.ratio,
        seed: args.seed,
    };
    let report = tiling::split_tiled_dir(&args.target, &args.ext, &opts)?;
    print_report(&report, &args.output)
}

fn check_output_format(output: &str) -> Result<(), TilerError> {
    match output {
        "text" | "json" => Ok(()),
        other => Err(TilerError::UnsupportedFormat(format!(
            "'{}' (supported: text, json)",
            other
        ))),
    }
}

fn print_report<R>(report: &R, output: &str) -> Result<(), TilerError>
where
    R: Serialize + std::fmt::Display,
{
    if output == "json" {
        let json = serde_json::to_string_pretty(report)
            .map_err(|source| TilerError::ReportSerialize { source })?;
        println!("{json}");
    } else {
        print!("{report}");
    }
    Ok(())
}
