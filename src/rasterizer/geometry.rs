//! Geometry primitives: segments, triangles, planes and 2D boxes

use serde::{Serialize, Deserialize};

use super::math::{Point2, Point3, Vec2, Vec3};

/// Line segment between two points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line3 {
    pub start: Point3,
    pub end: Point3,
}

impl Line3 {
    pub fn new(start: Point3, end: Point3) -> Self {
        Self { start, end }
    }

    /// Where the segment crosses the plane, if it does.
    /// `None` for segments parallel to the plane or crossing it outside
    /// the `start..=end` range.
    pub fn intersect_plane(&self, plane: &Plane3) -> Option<Point3> {
        let dir = self.end - self.start;
        let denom = plane.normal.dot(dir);
        if denom == 0.0 {
            return None;
        }

        let t = plane.normal.dot(plane.point - self.start) / denom;
        if !(0.0..=1.0).contains(&t) {
            return None;
        }

        Some(self.start + dir * t)
    }
}

/// Triangle as three points; winding order is significant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangle3(pub [Point3; 3]);

impl Triangle3 {
    pub fn new(a: Point3, b: Point3, c: Point3) -> Self {
        Self([a, b, c])
    }

    pub fn centroid(&self) -> Point3 {
        let [a, b, c] = self.0;
        let sum = a + b + c;
        Vec3::new(sum.x / 3.0, sum.y / 3.0, sum.z / 3.0)
    }

    /// Unit face normal from the winding: `(v1 - v0) x (v2 - v0)`
    pub fn normal(&self) -> Vec3 {
        let [a, b, c] = self.0;
        (b - a).cross(c - a).normalize()
    }

    /// Vertices ordered by ascending Y, ties keep their original order
    pub fn sorted_by_y(&self) -> Triangle3 {
        let mut verts = self.0;
        verts.sort_by(|a, b| a.y.total_cmp(&b.y));
        Triangle3(verts)
    }

    /// Box enclosing the triangle, ignoring Z
    pub fn bounding_box(&self) -> Box2 {
        let first = self.0[0];
        let (mut min, mut max) = (first.xy(), first.xy());
        for v in &self.0[1..] {
            min.x = min.x.min(v.x);
            min.y = min.y.min(v.y);
            max.x = max.x.max(v.x);
            max.y = max.y.max(v.y);
        }
        Box2::new(min, max)
    }

    /// Coarse overlap test using the bounding box
    pub fn intersects_box2(&self, other: &Box2) -> bool {
        self.bounding_box().intersects(other)
    }
}

/// Plane through `point` with unit `normal`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane3 {
    pub point: Point3,
    pub normal: Vec3,
}

impl Plane3 {
    pub fn new(point: Point3, normal: Vec3) -> Self {
        Self { point, normal }
    }

    /// Positive on the side the normal points to
    pub fn signed_distance(&self, p: Point3) -> f64 {
        (p - self.point).dot(self.normal)
    }
}

/// 2D axis-aligned box given by two opposite corners (in any order)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Box2(pub Point2, pub Point2);

impl Box2 {
    /// Normalized device coordinate square
    pub const NDC: Box2 = Box2(Vec2 { x: -1.0, y: -1.0 }, Vec2 { x: 1.0, y: 1.0 });

    pub fn new(a: Point2, b: Point2) -> Self {
        Self(a, b)
    }

    pub fn min_x(&self) -> f64 {
        self.0.x.min(self.1.x)
    }

    pub fn max_x(&self) -> f64 {
        self.0.x.max(self.1.x)
    }

    pub fn min_y(&self) -> f64 {
        self.0.y.min(self.1.y)
    }

    pub fn max_y(&self) -> f64 {
        self.0.y.max(self.1.y)
    }

    /// Inclusive AABB overlap
    pub fn intersects(&self, other: &Box2) -> bool {
        self.min_x() <= other.max_x()
            && self.max_x() >= other.min_x()
            && self.min_y() <= other.max_y()
            && self.max_y() >= other.min_y()
    }
}

/// Unit sphere position for a longitude/latitude pair (radians)
pub fn spherical_to_cartesian(lon: f64, lat: f64) -> Point3 {
    Vec3::new(lat.cos() * lon.sin(), lat.sin(), lat.cos() * lon.cos())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn vertical_line() -> Line3 {
        Line3::new(Vec3::new(3.0, -10.0, -4.0), Vec3::new(3.0, 10.0, -4.0))
    }

    #[test]
    fn test_line_intersects_plane_hits() {
        let plane = Plane3::new(Vec3::new(0.0, 7.0, 0.0), Vec3::new(0.0, -1.0, 0.0));
        let hit = vertical_line().intersect_plane(&plane).expect("line should hit plane");
        assert_abs_diff_eq!(hit.x, 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(hit.y, 7.0, epsilon = 1e-9);
        assert_abs_diff_eq!(hit.z, -4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_line_intersects_plane_misses() {
        let plane = Plane3::new(Vec3::new(0.0, -20.0, 0.0), Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(vertical_line().intersect_plane(&plane), None);
    }

    #[test]
    fn test_parallel_line_misses() {
        let plane = Plane3::new(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(vertical_line().intersect_plane(&plane), None);
    }

    #[test]
    fn test_centroid() {
        let tri = Triangle3::new(
            Vec3::new(36.0, 12.0, 5.0),
            Vec3::new(46.0, 40.0, 16.0),
            Vec3::new(65.0, 20.0, 9.0),
        );
        let c = tri.centroid();
        assert_abs_diff_eq!(c.x, 49.0, epsilon = 1e-12);
        assert_abs_diff_eq!(c.y, 24.0, epsilon = 1e-12);
        assert_abs_diff_eq!(c.z, 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_normal_follows_winding() {
        let a = Vec3::new(-1.0, -1.0, 1.0);
        let b = Vec3::new(1.0, -1.0, 1.0);
        let c = Vec3::new(1.0, 1.0, 1.0);
        assert_eq!(Triangle3::new(a, b, c).normal(), Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(Triangle3::new(a, c, b).normal(), Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_sort_is_stable() {
        let a = Vec3::new(0.0, 1.0, 0.0);
        let b = Vec3::new(5.0, 1.0, 0.0);
        let c = Vec3::new(2.0, -3.0, 0.0);
        let sorted = Triangle3::new(a, b, c).sorted_by_y();
        assert_eq!(sorted.0, [c, a, b]);
    }

    #[test]
    fn test_box_overlap() {
        let inside = Triangle3::new(
            Vec3::new(0.5, 0.5, 0.0),
            Vec3::new(3.0, 0.8, 0.0),
            Vec3::new(2.0, 4.0, 0.0),
        );
        let outside = Triangle3::new(
            Vec3::new(1.5, 1.5, 0.0),
            Vec3::new(3.0, 1.8, 0.0),
            Vec3::new(2.0, 4.0, 0.0),
        );
        assert!(inside.intersects_box2(&Box2::NDC));
        assert!(!outside.intersects_box2(&Box2::NDC));

        let b = Box2::new(Vec2::new(2.0, -1.0), Vec2::new(-2.0, 3.0));
        assert_eq!((b.min_x(), b.max_x(), b.min_y(), b.max_y()), (-2.0, 2.0, -1.0, 3.0));
    }

    #[test]
    fn test_signed_distance() {
        let near = Plane3::new(Vec3::new(0.0, 0.0, -0.1), Vec3::new(0.0, 0.0, 1.0));
        assert!(near.signed_distance(Vec3::new(0.0, 0.0, -5.0)) < 0.0);
        assert!(near.signed_distance(Vec3::new(0.0, 0.0, 1.0)) > 0.0);
    }

    #[test]
    fn test_spherical_poles() {
        let north = spherical_to_cartesian(0.0, std::f64::consts::FRAC_PI_2);
        assert_abs_diff_eq!(north.y, 1.0, epsilon = 1e-12);
        let front = spherical_to_cartesian(0.0, 0.0);
        assert_abs_diff_eq!(front.z, 1.0, epsilon = 1e-12);
    }
}
