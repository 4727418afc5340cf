//! Meshes the renderer can draw
//!
//! Vertices are in model space; each mesh carries its own [`Transform`].
//! Index lists are validated on construction, so drawing never has to check.

pub mod obj;
mod primitives;

pub use primitives::{line_cube, line_sphere, plane, terrain, triangle_cube};

use thiserror::Error;

use crate::rasterizer::{Color, Drawable, Point3, Polygon, Renderer, Transform, Triangle3};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeshError {
    #[error("line {line} uses vertex {index}, but there are only {count} vertices")]
    LineIndex { line: usize, index: usize, count: usize },

    #[error("triangle {triangle} uses vertex {index}, but there are only {count} vertices")]
    TriangleIndex { triangle: usize, index: usize, count: usize },

    #[error("{colors} colors given for {triangles} triangles")]
    ColorCount { colors: usize, triangles: usize },
}

/// Wireframe mesh: vertices joined by index pairs
#[derive(Debug, Clone, PartialEq)]
pub struct LineMesh {
    pub transform: Transform,
    vertices: Vec<Point3>,
    lines: Vec<[usize; 2]>,
}

impl LineMesh {
    pub fn new(vertices: Vec<Point3>, lines: Vec<[usize; 2]>) -> Result<Self, MeshError> {
        for (line, pair) in lines.iter().enumerate() {
            if let Some(&index) = pair.iter().find(|&&i| i >= vertices.len()) {
                return Err(MeshError::LineIndex { line, index, count: vertices.len() });
            }
        }

        Ok(Self {
            transform: Transform::new(),
            vertices,
            lines,
        })
    }

    pub fn vertices(&self) -> &[Point3] {
        &self.vertices
    }

    pub fn lines(&self) -> &[[usize; 2]] {
        &self.lines
    }

    /// Model space endpoints of every line
    pub fn line_points(&self) -> impl Iterator<Item = [Point3; 2]> + '_ {
        self.lines
            .iter()
            .map(|&[a, b]| [self.vertices[a], self.vertices[b]])
    }
}

impl Drawable for LineMesh {
    /// Each line as a collapsed wireframe triangle `[a, b, b]`
    fn polygons(&self) -> Box<dyn Iterator<Item = Polygon> + '_> {
        let model = self.transform.matrix();
        Box::new(self.line_points().map(move |[a, b]| {
            let (a, b) = (model.transform_point(a), model.transform_point(b));
            Polygon::wire_cell(Triangle3::new(a, b, b), Renderer::WIRE_CELL)
        }))
    }
}

/// Solid mesh with one flat color per triangle
#[derive(Debug, Clone, PartialEq)]
pub struct TriangleMesh {
    pub transform: Transform,
    vertices: Vec<Point3>,
    triangles: Vec<[usize; 3]>,
    colors: Vec<Color>,
}

impl TriangleMesh {
    /// Light gray, used when no colors are given
    pub const DEFAULT_COLOR: Color = Color(0xffaaaaaa);

    /// `colors` must be empty (all triangles get [`Self::DEFAULT_COLOR`])
    /// or hold exactly one color per triangle.
    pub fn new(
        vertices: Vec<Point3>,
        triangles: Vec<[usize; 3]>,
        colors: Vec<Color>,
    ) -> Result<Self, MeshError> {
        for (triangle, indices) in triangles.iter().enumerate() {
            if let Some(&index) = indices.iter().find(|&&i| i >= vertices.len()) {
                return Err(MeshError::TriangleIndex { triangle, index, count: vertices.len() });
            }
        }

        let colors = if colors.is_empty() {
            vec![Self::DEFAULT_COLOR; triangles.len()]
        } else if colors.len() == triangles.len() {
            colors
        } else {
            return Err(MeshError::ColorCount { colors: colors.len(), triangles: triangles.len() });
        };

        Ok(Self {
            transform: Transform::new(),
            vertices,
            triangles,
            colors,
        })
    }

    pub fn vertices(&self) -> &[Point3] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// Model space triangle by index
    pub fn triangle(&self, idx: usize) -> Option<Triangle3> {
        self.triangles
            .get(idx)
            .map(|t| Triangle3(t.map(|i| self.vertices[i])))
    }

    /// Recolor every triangle
    pub fn fill(&mut self, color: Color) {
        self.colors.fill(color);
    }
}

impl Drawable for TriangleMesh {
    /// Filled triangles moved to world space by the mesh transform
    fn polygons(&self) -> Box<dyn Iterator<Item = Polygon> + '_> {
        let model = self.transform.matrix();
        Box::new(self.triangles.iter().zip(&self.colors).map(move |(t, &color)| {
            let local = Triangle3(t.map(|i| self.vertices[i]));
            Polygon::filled(model.transform_triangle(&local), color)
        }))
    }
}

/// Ordered collection of triangle meshes drawn as one
#[derive(Debug, Clone, Default)]
pub struct Scene {
    meshes: Vec<TriangleMesh>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_meshes(meshes: Vec<TriangleMesh>) -> Self {
        Self { meshes }
    }

    /// Append a mesh, returning its index
    pub fn add(&mut self, mesh: TriangleMesh) -> usize {
        self.meshes.push(mesh);
        self.meshes.len() - 1
    }

    pub fn mesh_mut(&mut self, idx: usize) -> Option<&mut TriangleMesh> {
        self.meshes.get_mut(idx)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}

impl Drawable for Scene {
    fn polygons(&self) -> Box<dyn Iterator<Item = Polygon> + '_> {
        Box::new(self.meshes.iter().flat_map(|mesh| mesh.polygons()))
    }
}
