use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "where-is-waldo",
    about = "Find the hidden character in a large picture",
    version
)]
pub struct Cli {
    /// Puzzle image. Defaults to the bundled sample.
    #[arg(short = 'i', long = "image-path")]
    pub image_path: Option<PathBuf>,

    /// JSON record with the target's bounding box in image pixels.
    #[arg(short = 'w', long = "bounding-box")]
    pub bounding_box: Option<PathBuf>,

    /// Debug-level logging for the game and engine.
    #[arg(short, long)]
    pub debug: bool,

    /// Write logs to this file instead of stderr.
    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,
}
