//! Minimal Wavefront OBJ reader
//!
//! Only `v` and `f` records are used. Faces keep their first three
//! vertices, `a/b/c` index forms are accepted, and negative indices count
//! back from the last vertex read. Coordinates are negated on load so
//! models exported Y-up appear upright on screen.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use thiserror::Error;

use super::{MeshError, TriangleMesh};
use crate::rasterizer::{Point3, Vec3};

#[derive(Debug, Error)]
pub enum ObjError {
    #[error("failed to read OBJ data: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: {message}")]
    Malformed { line: usize, message: String },

    #[error("invalid OBJ mesh: {0}")]
    Mesh(#[from] MeshError),
}

fn malformed(line: usize, message: impl Into<String>) -> ObjError {
    ObjError::Malformed { line, message: message.into() }
}

pub fn load(path: impl AsRef<Path>) -> Result<TriangleMesh, ObjError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mesh = parse(BufReader::new(file))?;
    log::debug!(
        "loaded {}: {} vertices, {} triangles",
        path.display(),
        mesh.vertices().len(),
        mesh.triangles().len()
    );
    Ok(mesh)
}

pub fn parse<R: BufRead>(reader: R) -> Result<TriangleMesh, ObjError> {
    let mut vertices = Vec::new();
    let mut triangles = Vec::new();

    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = n + 1;
        let mut tokens = line.split_whitespace();

        match tokens.next() {
            Some("v") => vertices.push(parse_vertex(tokens, line_no)?),
            Some("f") => triangles.push(parse_face(tokens, vertices.len(), line_no)?),
            // Comments, normals, texture coordinates, groups, materials
            _ => {}
        }
    }

    Ok(TriangleMesh::new(vertices, triangles, Vec::new())?)
}

fn parse_vertex<'a>(mut tokens: impl Iterator<Item = &'a str>, line: usize) -> Result<Point3, ObjError> {
    let mut coords = [0.0; 3];
    for c in &mut coords {
        let token = tokens
            .next()
            .ok_or_else(|| malformed(line, "vertex needs three coordinates"))?;
        let value: f64 = token
            .parse()
            .map_err(|_| malformed(line, format!("bad coordinate {:?}", token)))?;
        *c = -value;
    }
    Ok(Vec3::new(coords[0], coords[1], coords[2]))
}

fn parse_face<'a>(
    mut tokens: impl Iterator<Item = &'a str>,
    vertex_count: usize,
    line: usize,
) -> Result<[usize; 3], ObjError> {
    let mut tri = [0; 3];
    for idx in &mut tri {
        let token = tokens
            .next()
            .ok_or_else(|| malformed(line, "face needs at least three vertices"))?;
        let first = token.split('/').next().unwrap_or(token);
        let raw: i64 = first
            .parse()
            .map_err(|_| malformed(line, format!("bad vertex index {:?}", token)))?;

        *idx = match raw {
            0 => return Err(malformed(line, "vertex indices start at 1")),
            r if r > 0 => (r - 1) as usize,
            r => {
                let back = r.unsigned_abs() as usize;
                vertex_count
                    .checked_sub(back)
                    .ok_or_else(|| malformed(line, format!("relative index {} before first vertex", r)))?
            }
        };
    }
    Ok(tri)
}
