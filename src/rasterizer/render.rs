//! Scene rendering: world space polygons to shaded canvas cells
//!
//! Pipeline per polygon: world -> view (camera inverse) -> near-plane test ->
//! projection -> flat lighting -> rasterization.

use super::camera::Camera;
use super::canvas::Canvas;
use super::geometry::{Plane3, Triangle3};
use super::math::{Point3, Vec3};
use super::types::{Cell, Color};
use crate::mesh::{LineMesh, TriangleMesh};

/// How a polygon is rasterized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolygonStyle {
    Filled,
    /// Edges only, unlit, with `fg` over the polygon color
    Wireframe { fg: Color },
}

/// One triangle in world space with its base color
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Polygon {
    pub shape: Triangle3,
    pub color: Color,
    pub style: PolygonStyle,
}

impl Polygon {
    pub fn filled(shape: Triangle3, color: Color) -> Self {
        Self { shape, color, style: PolygonStyle::Filled }
    }

    pub fn wireframe(shape: Triangle3, color: Color) -> Self {
        Self { shape, color, style: PolygonStyle::Wireframe { fg: color } }
    }

    /// Wireframe drawn with the colors of `cell`
    pub fn wire_cell(shape: Triangle3, cell: Cell) -> Self {
        Self { shape, color: cell.bg, style: PolygonStyle::Wireframe { fg: cell.fg } }
    }
}

/// Anything that can hand out world space polygons.
///
/// Polygons are pulled one at a time, so a producer never runs ahead of
/// the rasterizer and drawing order is enumeration order.
pub trait Drawable {
    fn polygons(&self) -> Box<dyn Iterator<Item = Polygon> + '_>;
}

/// Single directional light plus ambient term
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    /// Unit vector
    pub direction: Vec3,
    pub ambient: f64,
}

impl Default for Lighting {
    fn default() -> Self {
        Self::new(Vec3::new(0.4, -0.7, -0.3), 0.1)
    }
}

impl Lighting {
    pub fn new(direction: Vec3, ambient: f64) -> Self {
        Self {
            direction: direction.normalize(),
            ambient,
        }
    }

    /// Diffuse plus ambient, never darker than ambient nor brighter than 1
    pub fn intensity(&self, normal: Vec3) -> f64 {
        let diffuse = normal.dot(self.direction).max(0.0);
        (self.ambient + diffuse).max(self.ambient).min(1.0)
    }

    /// Cell for a lit face: shaded background, darker foreground, blank glyph
    pub fn shade(&self, color: Color, normal: Vec3) -> Cell {
        let i = self.intensity(normal);
        Cell::new(color.shade(i * 0.7), color.shade(i), ' ')
    }
}

pub struct Renderer {
    pub camera: Camera,
    pub lighting: Lighting,
    /// Distance in front of the camera below which triangles are dropped
    pub near_clip: f64,
}

impl Renderer {
    /// Cell used for line meshes
    pub const WIRE_CELL: Cell = Cell {
        fg: Color(0xff00ff00),
        bg: Color(0xffaa0000),
        depth: Cell::FAR_DEPTH,
        glyph: ' ',
    };

    pub const DEFAULT_NEAR_CLIP: f64 = 0.1;

    pub fn new(camera: Camera) -> Self {
        Self {
            camera,
            lighting: Lighting::default(),
            near_clip: Self::DEFAULT_NEAR_CLIP,
        }
    }

    pub fn with_lighting(mut self, lighting: Lighting) -> Self {
        self.lighting = lighting;
        self
    }

    pub fn with_near_clip(mut self, near_clip: f64) -> Self {
        self.near_clip = near_clip;
        self
    }

    /// View space plane at `z = -near_clip`, normal towards the camera
    fn near_plane(&self) -> Plane3 {
        Plane3::new(Vec3::new(0.0, 0.0, -self.near_clip), Vec3::new(0.0, 0.0, 1.0))
    }

    /// Whole-triangle near clip: one vertex too close drops it
    fn is_clipped(&self, plane: &Plane3, points: &[Point3]) -> bool {
        points.iter().any(|&p| plane.signed_distance(p) > 0.0)
    }

    /// Draw every line of a line mesh. Returns the number of lines drawn.
    pub fn render_line_mesh(&self, canvas: &mut Canvas, mesh: &LineMesh) -> usize {
        let model_view = self.camera.view() * mesh.transform.matrix();
        let projection = self.camera.projection;
        let plane = self.near_plane();

        let mut drawn = 0;
        for [a, b] in mesh.line_points() {
            let start = model_view.transform_point(a);
            let end = model_view.transform_point(b);
            if self.is_clipped(&plane, &[start, end]) {
                continue;
            }

            canvas.draw_line_3d(
                projection.transform_point(start),
                projection.transform_point(end),
                Self::WIRE_CELL,
            );
            drawn += 1;
        }

        log::trace!("line mesh: {} of {} lines drawn", drawn, mesh.lines().len());
        drawn
    }

    pub fn render_triangle_mesh(&self, canvas: &mut Canvas, mesh: &TriangleMesh) -> usize {
        self.render_drawable(canvas, mesh)
    }

    /// Pull polygons from `drawable` and rasterize them one by one.
    /// Returns how many survived the near clip.
    pub fn render_drawable(&self, canvas: &mut Canvas, drawable: &dyn Drawable) -> usize {
        let view = self.camera.view();
        let projection = self.camera.projection;
        let plane = self.near_plane();

        let mut drawn = 0;
        let mut total = 0;
        for polygon in drawable.polygons() {
            total += 1;

            // Winding order decides the facing, computed before projection
            let normal = view.transform_vector(polygon.shape.normal()).normalize();

            let in_view = view.transform_triangle(&polygon.shape);
            if self.is_clipped(&plane, &in_view.0) {
                continue;
            }
            let projected = projection.transform_triangle(&in_view);

            match polygon.style {
                PolygonStyle::Filled => {
                    canvas.draw_triangle3(projected, self.lighting.shade(polygon.color, normal));
                }
                PolygonStyle::Wireframe { fg } => {
                    let cell = Cell::new(fg, polygon.color, ' ');
                    canvas.draw_wire_triangle3(projected, cell);
                }
            }
            drawn += 1;
        }

        log::trace!("drawable: {} of {} polygons drawn", drawn, total);
        drawn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{self, Scene};
    use crate::rasterizer::{Lens, Transform};
    use approx::assert_abs_diff_eq;

    fn renderer(width: usize, height: usize) -> Renderer {
        Renderer::new(Camera::for_surface(width, height, 45.0, 0.1, 1000.0))
    }

    fn painted(canvas: &Canvas) -> usize {
        canvas.cells().iter().filter(|c| c.depth < Cell::FAR_DEPTH || c.bg != Color::TRANSPARENT).count()
    }

    struct Triangles(Vec<Polygon>);

    impl Drawable for Triangles {
        fn polygons(&self) -> Box<dyn Iterator<Item = Polygon> + '_> {
            Box::new(self.0.iter().copied())
        }
    }

    fn facing_triangle(z: f64, color: Color) -> Polygon {
        // Counter-clockwise seen from the origin, normal +Z
        Polygon::filled(
            Triangle3::new(Vec3::new(-1.0, -1.0, z), Vec3::new(1.0, -1.0, z), Vec3::new(0.0, 1.0, z)),
            color,
        )
    }

    #[test]
    fn test_lighting_intensity_clamped() {
        let light = Lighting::default();
        assert_abs_diff_eq!(light.direction.len(), 1.0, epsilon = 1e-12);

        // Facing away: ambient only
        assert_abs_diff_eq!(light.intensity(-light.direction), 0.1, epsilon = 1e-12);
        // Facing the light: saturates at 1
        assert_abs_diff_eq!(light.intensity(light.direction), 1.0, epsilon = 1e-12);
        // Perpendicular
        let side = light.direction.cross(Vec3::UP).normalize();
        assert_abs_diff_eq!(light.intensity(side), 0.1, epsilon = 1e-9);
    }

    #[test]
    fn test_shade_cell() {
        let light = Lighting::new(Vec3::new(0.0, 0.0, 1.0), 0.0);
        let cell = light.shade(Color(0xffc86432), Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(cell.bg, Color(0xffc86432));
        assert_eq!(cell.fg, Color(0xffc86432).shade(0.7));
        assert_eq!(cell.glyph, ' ');
    }

    #[test]
    fn test_triangle_in_front_is_drawn() {
        let renderer = renderer(40, 20);
        let mut canvas = Canvas::new(40, 20);
        canvas.clear();

        let drawn = renderer.render_drawable(&mut canvas, &Triangles(vec![facing_triangle(-5.0, Color::RED)]));
        assert_eq!(drawn, 1);
        assert!(painted(&canvas) > 0);
    }

    #[test]
    fn test_near_clip_drops_triangle() {
        let renderer = renderer(40, 20);
        let mut canvas = Canvas::new(40, 20);
        canvas.clear();

        // One vertex behind the near plane is enough
        let mut straddling = facing_triangle(-5.0, Color::RED);
        straddling.shape.0[2].z = -0.05;
        let behind = facing_triangle(5.0, Color::RED);

        let drawn = renderer.render_drawable(&mut canvas, &Triangles(vec![straddling, behind]));
        assert_eq!(drawn, 0);
        assert_eq!(painted(&canvas), 0);
    }

    #[test]
    fn test_nearer_triangle_wins() {
        let renderer = renderer(40, 20);
        let mut canvas = Canvas::new(40, 20);
        canvas.clear();

        let far = facing_triangle(-8.0, Color::BLUE);
        let near = facing_triangle(-4.0, Color::RED);
        renderer.render_drawable(&mut canvas, &Triangles(vec![near, far]));

        let center = canvas.get(20, 10).copied().unwrap_or_default();
        assert_eq!(center.bg.r(), Color::RED.shade(renderer.lighting.intensity(Vec3::new(0.0, 0.0, 1.0))).r());
        assert_eq!(center.bg.b(), 0);
    }

    #[test]
    fn test_line_mesh_counts() {
        let mut renderer = renderer(80, 40);
        renderer.camera = Camera::new(Lens { aspect: 2.0, ..Lens::default() });
        let mut canvas = Canvas::new(80, 40);
        canvas.clear();

        let mut cube = mesh::line_cube();
        cube.transform = Transform::at(0.0, 0.0, -5.0);
        assert_eq!(renderer.render_line_mesh(&mut canvas, &cube), 12);

        // Behind the camera: every edge fails the near clip
        cube.transform = Transform::at(0.0, 0.0, 1.5);
        assert_eq!(renderer.render_line_mesh(&mut canvas, &cube), 0);
    }

    #[test]
    fn test_triangle_mesh_and_scene() {
        let renderer = renderer(80, 40);
        let mut canvas = Canvas::new(80, 40);
        canvas.clear();

        let mut cube = mesh::triangle_cube();
        cube.transform = Transform::at(0.0, 0.0, -6.0);
        assert_eq!(renderer.render_triangle_mesh(&mut canvas, &cube), 12);

        let mut scene = Scene::new();
        scene.add(cube.clone());
        scene.add(cube);
        if let Some(second) = scene.mesh_mut(1) {
            second.transform = Transform::at(0.0, 0.0, 3.0);
        }
        assert_eq!(renderer.render_drawable(&mut canvas, &scene), 12);
    }

    #[test]
    fn test_line_mesh_looks_the_same_on_both_paths() {
        let renderer = renderer(80, 40);
        let mut cube = mesh::line_cube();
        cube.transform = Transform::at(0.0, 0.0, -5.0);

        let mut direct = Canvas::new(80, 40);
        direct.clear();
        renderer.render_line_mesh(&mut direct, &cube);

        let mut pulled = Canvas::new(80, 40);
        pulled.clear();
        assert_eq!(renderer.render_drawable(&mut pulled, &cube), 12);

        for canvas in [&direct, &pulled] {
            let drawn: Vec<&Cell> = canvas.cells().iter().filter(|c| c.bg != Color::TRANSPARENT).collect();
            assert!(!drawn.is_empty());
            assert!(drawn.iter().all(|c| c.same_appearance(&Renderer::WIRE_CELL)));
        }
    }

    #[test]
    fn test_wireframe_polygons_unlit() {
        let renderer = renderer(40, 20);
        let mut canvas = Canvas::new(40, 20);
        canvas.clear();

        let mut tri = facing_triangle(-5.0, Color::GREEN);
        tri.style = PolygonStyle::Wireframe { fg: Color::GREEN };
        renderer.render_drawable(&mut canvas, &Triangles(vec![tri]));

        assert!(canvas.cells().iter().any(|c| c.bg == Color::GREEN));
        assert!(canvas.cells().iter().all(|c| c.bg == Color::GREEN || c.depth == Cell::FAR_DEPTH));
    }
}
