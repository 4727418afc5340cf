//! termraster: fly around small 3D scenes rendered in the terminal
//!
//! Usage:
//!   termraster                          # spinning cubes
//!   termraster --scene terrain --fps 20
//!   termraster --obj teapot.obj         # any Wavefront OBJ
//!
//! Keys: w/s/a/d move, r/f up/down, ,/. turn, z/x tilt, c redraw, q quit.
//! Drag with the mouse to look around, scroll to move forward and back.

use std::fs::File;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use termraster::app::{App, SceneKind};
use termraster::config::Config;
use termraster::rasterizer::ColorMode;
use termraster::terminal::{
    spawn_input_reader, terminal_size, AnsiTerminal, SignalFlags, TerminalSession,
};

/// Size used when stdout is not a terminal
const FALLBACK_SIZE: (usize, usize) = (80, 24);

#[derive(Parser)]
#[command(name = "termraster", version)]
#[command(about = "Software 3D rasterizer rendering to the terminal")]
struct Cli {
    /// RON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Demo scene (defaults to obj when --obj is given)
    #[arg(long, value_enum)]
    scene: Option<SceneKind>,

    /// Wavefront OBJ model for the obj scene
    #[arg(long)]
    obj: Option<PathBuf>,

    /// Seed for the plane and terrain generators
    #[arg(long, default_value_t = 123)]
    seed: u64,

    /// Frames per second
    #[arg(long)]
    fps: Option<u32>,

    /// Stop after this many frames
    #[arg(long)]
    frames: Option<u64>,

    /// Write log records to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Use the 256-color palette instead of 24-bit color
    #[arg(long)]
    ansi256: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(fps) = cli.fps {
        config.fps = fps;
    }
    if cli.log_file.is_some() {
        config.log_file = cli.log_file.clone();
    }
    if cli.ansi256 {
        config.color_mode = ColorMode::Ansi256;
    }
    config.validate().context("Invalid settings")?;

    init_logging(&config)?;
    log::info!("termraster v{}", termraster::VERSION);

    let scene = match (cli.scene, &cli.obj) {
        (Some(scene), _) => scene,
        (None, Some(_)) => SceneKind::Obj,
        (None, None) => SceneKind::Cubes,
    };

    let (width, height) = terminal_size().unwrap_or(FALLBACK_SIZE);
    let mut app = App::new(&config, scene, cli.obj.as_deref(), cli.seed, width, height)
        .context("Failed to build scene")?;

    // Before raw mode, so a quit signal never ends the process with the
    // terminal still switched
    let signals = SignalFlags::register().context("Failed to install signal handlers")?;
    let mut session = TerminalSession::enter(AnsiTerminal::new(io::stdout(), width, height))
        .context("Failed to set up terminal")?;
    // Started after raw mode is on so reads are byte by byte
    let input = spawn_input_reader(io::stdin()).context("Failed to start input thread")?;

    app.run(&mut session, &input, &signals, cli.frames)
        .context("Rendering failed")?;

    Ok(())
}

/// Log to the configured file, or stderr when there is none.
/// `RUST_LOG` takes precedence over the configured level.
fn init_logging(config: &Config) -> Result<()> {
    let env = env_logger::Env::default().default_filter_or(config.log_level.as_str());
    let mut builder = env_logger::Builder::from_env(env);

    if let Some(path) = &config.log_file {
        let file = File::create(path)
            .with_context(|| format!("Failed to create log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.try_init().context("Failed to initialize logging")?;
    Ok(())
}
