//! Termraster: software 3D rendering into a terminal
//!
//! Meshes are transformed, near-clipped, flat-lit and rasterized into a
//! grid of colored cells, which is then diffed against what the terminal
//! already shows and sent as ANSI escape sequences.

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod app;
pub mod config;
pub mod mesh;
pub mod rasterizer;
pub mod terminal;
