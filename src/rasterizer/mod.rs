//! Software rasterizer for a character-cell canvas
//!
//! - f64 linear algebra with row-major 4x4 matrices (OpenGL conventions)
//! - Flat-shaded triangles split into flat-top/flat-bottom halves
//! - Per-cell depth buffer, smaller depth wins
//! - Double-buffered canvas that only sends changed cells

mod camera;
mod canvas;
mod geometry;
mod math;
mod render;
mod transform;
mod types;

pub use camera::*;
pub use canvas::*;
pub use geometry::*;
pub use math::*;
pub use render::*;
pub use transform::*;
pub use types::*;
