mod app;
mod bounding_box;
mod cli;
mod config;
mod controller;
mod dialogs;
mod events;
mod markers;

use anyhow::{Context, Result};
use clap::Parser;
use waldo_engine::device::GpuInit;
use waldo_engine::logging::init_logging;
use waldo_engine::window::{Runtime, RuntimeConfig};

use crate::app::WaldoApp;
use crate::cli::Cli;
use crate::config::{GameAssets, GameConfig, WINDOW_TITLE};

fn main() -> Result<()> {
    let config = GameConfig::from_cli(Cli::parse()).context("invalid command line")?;
    init_logging(config.logging())?;

    let assets = GameAssets::load(&config).context("failed to load the puzzle")?;

    let runtime = RuntimeConfig {
        title: WINDOW_TITLE.to_string(),
        initial_size: assets.initial_window_size,
    };
    let app = WaldoApp::new(assets.image, assets.bounding_box);

    let app = Runtime::run(runtime, GpuInit::default(), app)?;
    app.finish()
}
