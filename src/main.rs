// ABOUTME: Entry point for the QuickPlay menubar video previewer
// ABOUTME: Parses command line options, sets up logging and hands control to the native runner

mod app;
mod config;
mod events;
#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
mod hotkey;
#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
mod icon;
mod logging;
mod media;
mod native_app;
mod platform;
mod player;
#[cfg(target_os = "macos")]
mod tray;

use anyhow::Result;
use clap::Parser;
use native_app::RunOptions;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "quickplay", version, about = "Preview the selected Finder video in mpv")]
struct Cli {
    /// Video files to open immediately
    files: Vec<PathBuf>,

    /// Use this configuration file instead of the default location
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.debug);

    native_app::run_native_app(RunOptions {
        config_path: cli.config,
        files: cli.files,
    })
}
