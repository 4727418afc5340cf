//! Built-in meshes: cubes, a wire sphere, a random plane and noise terrain
//!
//! Screen rows grow downwards with +Y, so "up" in these meshes is -Y and
//! ground faces wind so their normal points along -Y.

use std::f64::consts::PI;

use noise::{NoiseFn, Perlin};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{LineMesh, TriangleMesh};
use crate::rasterizer::{spherical_to_cartesian, Color, Point3, Transform, Vec3};

const CUBE_CORNERS: [Point3; 8] = [
    Vec3 { x: -1.0, y: -1.0, z: 1.0 },
    Vec3 { x: 1.0, y: -1.0, z: 1.0 },
    Vec3 { x: 1.0, y: 1.0, z: 1.0 },
    Vec3 { x: -1.0, y: 1.0, z: 1.0 },
    Vec3 { x: -1.0, y: -1.0, z: -1.0 },
    Vec3 { x: 1.0, y: -1.0, z: -1.0 },
    Vec3 { x: 1.0, y: 1.0, z: -1.0 },
    Vec3 { x: -1.0, y: 1.0, z: -1.0 },
];

/// Wire cube of side 2 centered on the origin: 8 corners, 12 edges
pub fn line_cube() -> LineMesh {
    LineMesh {
        transform: Transform::new(),
        vertices: CUBE_CORNERS.to_vec(),
        lines: vec![
            // Front
            [0, 1], [1, 2], [2, 3], [3, 0],
            // Back
            [4, 5], [5, 6], [6, 7], [7, 4],
            // Sides
            [0, 4], [1, 5], [2, 6], [3, 7],
        ],
    }
}

/// Solid cube of side 2, one color per face, outward winding
pub fn triangle_cube() -> TriangleMesh {
    // Quads listed counter-clockwise seen from outside
    let faces: [([usize; 4], u32); 6] = [
        ([0, 1, 2, 3], 0xffff0000), // +Z
        ([5, 4, 7, 6], 0xff00ff00), // -Z
        ([4, 0, 3, 7], 0xff0000ff), // -X
        ([1, 5, 6, 2], 0xffffff00), // +X
        ([3, 2, 6, 7], 0xffff00ff), // +Y
        ([4, 5, 1, 0], 0xff00ffff), // -Y
    ];

    let mut triangles = Vec::with_capacity(12);
    let mut colors = Vec::with_capacity(12);
    for ([a, b, c, d], color) in faces {
        triangles.push([a, b, c]);
        triangles.push([c, d, a]);
        colors.extend([Color(color); 2]);
    }

    TriangleMesh {
        transform: Transform::new(),
        vertices: CUBE_CORNERS.to_vec(),
        triangles,
        colors,
    }
}

/// Unit latitude/longitude wire sphere.
///
/// Has `(x_segments + 1) * (y_segments + 1)` vertices; the seam and the
/// poles are duplicated rather than shared.
pub fn line_sphere(x_segments: usize, y_segments: usize) -> LineMesh {
    let (xs, ys) = (x_segments.max(1), y_segments.max(1));
    let row = xs + 1;

    let mut vertices = Vec::with_capacity(row * (ys + 1));
    let mut lines = Vec::with_capacity(xs * (ys + 1) + row * ys);

    for yi in 0..=ys {
        let lat = PI * (yi as f64 - ys as f64 / 2.0) / ys as f64;
        for xi in 0..=xs {
            let lng = 2.0 * PI * (xi as f64 - xs as f64 / 2.0) / xs as f64;
            let idx = vertices.len();
            vertices.push(spherical_to_cartesian(lng, lat));

            // Along the parallel
            if xi > 0 {
                lines.push([idx - 1, idx]);
            }
            // Along the meridian
            if yi > 0 {
                lines.push([idx - row, idx]);
            }
        }
    }

    LineMesh {
        transform: Transform::new(),
        vertices,
        lines,
    }
}

/// Append one grid cell as two triangles facing -Y.
/// `heights` gives the Y of the corners `(x, z+1)`, `(x+1, z+1)`, `(x, z)`, `(x+1, z)`.
fn push_quad(mesh: &mut TriangleMesh, x: f64, z: f64, heights: [f64; 4], color: Color) {
    let idx = mesh.vertices.len();
    mesh.vertices.extend([
        Vec3::new(x, heights[0], z + 1.0),
        Vec3::new(x + 1.0, heights[1], z + 1.0),
        Vec3::new(x, heights[2], z),
        Vec3::new(x + 1.0, heights[3], z),
    ]);
    mesh.triangles.push([idx, idx + 2, idx + 1]);
    mesh.triangles.push([idx + 2, idx + 3, idx + 1]);
    mesh.colors.extend([color; 2]);
}

fn empty_grid(w: usize, h: usize) -> TriangleMesh {
    TriangleMesh {
        transform: Transform::new(),
        vertices: Vec::with_capacity(w * h * 4),
        triangles: Vec::with_capacity(w * h * 2),
        colors: Vec::with_capacity(w * h * 2),
    }
}

const PLANE_PALETTE: [u32; 6] = [
    0xff880000, 0xff008800, 0xff000088, 0xff880088, 0xff888800, 0xff008888,
];

/// `w` x `h` grid of unit quads centered on the origin. Each lattice point
/// gets a random height in `[0, 4)` shared by all quads touching it, and
/// each quad a random palette color.
pub fn plane(w: usize, h: usize, seed: u64) -> TriangleMesh {
    let mut rng = StdRng::seed_from_u64(seed);

    let stride = w + 1;
    let lattice: Vec<f64> = (0..stride * (h + 1)).map(|_| rng.gen_range(0.0..4.0)).collect();
    let height = |x: usize, z: usize| lattice[x + z * stride];

    let mut mesh = empty_grid(w, h);
    for x in 0..w {
        for z in 0..h {
            let color = Color(PLANE_PALETTE[rng.gen_range(0..PLANE_PALETTE.len())]);
            let heights = [height(x, z + 1), height(x + 1, z + 1), height(x, z), height(x + 1, z)];
            let fx = x as f64 - w as f64 / 2.0;
            let fz = z as f64 - h as f64 / 2.0;
            push_quad(&mut mesh, fx, fz, heights, color);
        }
    }
    mesh
}

/// Deep water through sand and grass to rock, indexed from high to low noise
const TERRAIN_PALETTE: [u32; 15] = [
    0xff000044, 0xff000088, 0xff0000aa, 0xff0000ff, 0xffaaaa00,
    0xffffaa00, 0xff228800, 0xff00aa00, 0xff00aa00, 0xff00dd00,
    0xff22aa00, 0xff99aa99, 0xff999999, 0xffaaaaaa, 0xffbbbbbb,
];

const TERRAIN_HEIGHT_SCALE: f64 = 0.15;
const TERRAIN_COLOR_SCALE: f64 = 0.2;

/// `w` x `h` grid of unit quads with Perlin noise heights around `y = 10`
/// and colors picked by a second noise field
pub fn terrain(w: usize, h: usize, seed: u32) -> TriangleMesh {
    let height_noise = Perlin::new(seed);
    let color_noise = Perlin::new(seed.wrapping_add(1));

    let height = |x: f64, z: f64| {
        10.0 + height_noise.get([TERRAIN_HEIGHT_SCALE * x, TERRAIN_HEIGHT_SCALE * z]) * 25.0
    };
    let color = |x: f64, z: f64| {
        let val = (0.5 + color_noise.get([TERRAIN_COLOR_SCALE * x, TERRAIN_COLOR_SCALE * z])).clamp(0.0, 1.0);
        let last = (TERRAIN_PALETTE.len() - 1) as f64;
        Color(TERRAIN_PALETTE[(last - val * last) as usize])
    };

    let mut mesh = empty_grid(w, h);
    for x in 0..w {
        for z in 0..h {
            let fx = x as f64 - w as f64 / 2.0;
            let fz = z as f64 - h as f64 / 2.0;
            let heights = [
                height(fx, fz + 1.0),
                height(fx + 1.0, fz + 1.0),
                height(fx, fz),
                height(fx + 1.0, fz),
            ];
            push_quad(&mut mesh, fx, fz, heights, color(fx, fz));
        }
    }
    mesh
}
