//! Vector and matrix math for the transform chain
//!
//! Everything is `f64` and `Copy`; operations return new values.
//! Matrices are row-major and compose right-to-left:
//! `(a * b).transform_point(p) == a.transform_point(b.transform_point(p))`.

use std::ops::{Add, Mul, Neg, Sub};
use serde::{Serialize, Deserialize};
use thiserror::Error;

use super::geometry::Triangle3;

/// Returned by [`Mat4::inverse`] when the determinant is exactly zero
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("matrix is singular and cannot be inverted")]
pub struct SingularMatrix;

/// 2D Vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// 3D Vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Positions share the vector representation
pub type Point2 = Vec2;
pub type Point3 = Vec3;

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };
    pub const ONE: Vec3 = Vec3 { x: 1.0, y: 1.0, z: 1.0 };
    pub const UP: Vec3 = Vec3 { x: 0.0, y: 1.0, z: 0.0 };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Vec3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn len(self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn normalize(self) -> Vec3 {
        let l = self.len();
        if l == 0.0 {
            return Vec3::ZERO;
        }
        Vec3 {
            x: self.x / l,
            y: self.y / l,
            z: self.z / l,
        }
    }

    pub fn scale(self, s: f64) -> Vec3 {
        Vec3 {
            x: self.x * s,
            y: self.y * s,
            z: self.z * s,
        }
    }

    /// Drop the Z axis
    pub fn xy(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Interpret as RGB in 0.0-1.0 and pack into `0x00RRGGBB`
    pub fn to_rgb(self) -> u32 {
        let channel = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u32;
        (channel(self.x) << 16) | (channel(self.y) << 8) | channel(self.z)
    }

    /// Unpack `0x00RRGGBB` into RGB in 0.0-1.0 (alpha byte ignored)
    pub fn from_rgb(rgb: u32) -> Vec3 {
        Vec3 {
            x: ((rgb >> 16) & 0xff) as f64 / 255.0,
            y: ((rgb >> 8) & 0xff) as f64 / 255.0,
            z: (rgb & 0xff) as f64 / 255.0,
        }
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl Mul<f64> for Vec3 {
    type Output = Vec3;
    fn mul(self, s: f64) -> Vec3 {
        self.scale(s)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

/// Homogeneous 4D vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec4 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Vec4 {
    pub fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    pub fn scale(self, s: f64) -> Vec4 {
        Vec4::new(self.x * s, self.y * s, self.z * s, self.w * s)
    }

    pub fn xyz(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

impl Add for Vec4 {
    type Output = Vec4;
    fn add(self, other: Vec4) -> Vec4 {
        Vec4::new(
            self.x + other.x,
            self.y + other.y,
            self.z + other.z,
            self.w + other.w,
        )
    }
}

/// 4x4 matrix, 16 values in row-major order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mat4(pub [f64; 16]);

impl Default for Mat4 {
    fn default() -> Self {
        Mat4::IDENTITY
    }
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4([
        1.0, 0.0, 0.0, 0.0,
        0.0, 1.0, 0.0, 0.0,
        0.0, 0.0, 1.0, 0.0,
        0.0, 0.0, 0.0, 1.0,
    ]);

    pub fn from_columns(cols: [Vec4; 4]) -> Self {
        Mat4([
            cols[0].x, cols[1].x, cols[2].x, cols[3].x,
            cols[0].y, cols[1].y, cols[2].y, cols[3].y,
            cols[0].z, cols[1].z, cols[2].z, cols[3].z,
            cols[0].w, cols[1].w, cols[2].w, cols[3].w,
        ])
    }

    /// OpenGL-style perspective frustum.
    /// `fov` is the vertical field of view in degrees. The camera looks
    /// down -Z, so the resulting `w` of a transformed point is `-z`.
    pub fn perspective(aspect: f64, fov: f64, near: f64, far: f64) -> Self {
        let f = 1.0 / (fov.to_radians() / 2.0).tan();
        let r = 1.0 / (near - far);
        Mat4([
            f / aspect, 0.0, 0.0, 0.0,
            0.0, f, 0.0, 0.0,
            0.0, 0.0, (near + far) * r, near * far * r * 2.0,
            0.0, 0.0, -1.0, 0.0,
        ])
    }

    /// Euler rotation in radians, composed as `rot_x * rot_y * rot_z`
    /// (Z is applied to points first)
    pub fn rotation(x: f64, y: f64, z: f64) -> Self {
        let (sinx, cosx) = x.sin_cos();
        let (siny, cosy) = y.sin_cos();
        let (sinz, cosz) = z.sin_cos();

        let rot_x = Mat4([
            1.0, 0.0, 0.0, 0.0,
            0.0, cosx, -sinx, 0.0,
            0.0, sinx, cosx, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ]);

        let rot_y = Mat4([
            cosy, 0.0, siny, 0.0,
            0.0, 1.0, 0.0, 0.0,
            -siny, 0.0, cosy, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ]);

        let rot_z = Mat4([
            cosz, -sinz, 0.0, 0.0,
            sinz, cosz, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ]);

        rot_x * (rot_y * rot_z)
    }

    pub fn translation(x: f64, y: f64, z: f64) -> Self {
        Mat4([
            1.0, 0.0, 0.0, x,
            0.0, 1.0, 0.0, y,
            0.0, 0.0, 1.0, z,
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    pub fn scaling(x: f64, y: f64, z: f64) -> Self {
        Mat4([
            x, 0.0, 0.0, 0.0,
            0.0, y, 0.0, 0.0,
            0.0, 0.0, z, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    pub fn column(&self, c: usize) -> Vec4 {
        Vec4::new(self.0[c], self.0[c + 4], self.0[c + 8], self.0[c + 12])
    }

    /// Matrix product `self * other`
    pub fn multiply(&self, other: &Mat4) -> Mat4 {
        Mat4::from_columns([
            self.multiply_vec4(other.column(0)),
            self.multiply_vec4(other.column(1)),
            self.multiply_vec4(other.column(2)),
            self.multiply_vec4(other.column(3)),
        ])
    }

    pub fn multiply_vec4(&self, v: Vec4) -> Vec4 {
        self.column(0).scale(v.x)
            + self.column(1).scale(v.y)
            + self.column(2).scale(v.z)
            + self.column(3).scale(v.w)
    }

    /// Transform a direction (w = 0, no translation, no divide)
    pub fn transform_vector(&self, v: Vec3) -> Vec3 {
        self.multiply_vec4(Vec4::new(v.x, v.y, v.z, 0.0)).xyz()
    }

    /// Transform a position and divide by the resulting `w`.
    /// Callers must keep `w` away from zero (see the near-plane clip).
    pub fn transform_point(&self, p: Point3) -> Point3 {
        let v = self.multiply_vec4(Vec4::new(p.x, p.y, p.z, 1.0));
        Vec3::new(v.x / v.w, v.y / v.w, v.z / v.w)
    }

    pub fn transform_triangle(&self, tri: &Triangle3) -> Triangle3 {
        Triangle3(tri.0.map(|p| self.transform_point(p)))
    }

    pub fn determinant(&self) -> f64 {
        let (inv, m) = (self.adjugate(), &self.0);
        m[0] * inv[0] + m[1] * inv[4] + m[2] * inv[8] + m[3] * inv[12]
    }

    /// Closed-form cofactor inverse. Only fails on an exactly zero determinant.
    pub fn inverse(&self) -> Result<Mat4, SingularMatrix> {
        let inv = self.adjugate();
        let m = &self.0;
        let det = m[0] * inv[0] + m[1] * inv[4] + m[2] * inv[8] + m[3] * inv[12];
        if det == 0.0 {
            return Err(SingularMatrix);
        }
        let inv_det = 1.0 / det;
        Ok(Mat4(inv.map(|v| v * inv_det)))
    }

    /// Transposed cofactor matrix
    fn adjugate(&self) -> [f64; 16] {
        let m = &self.0;
        let mut inv = [0.0; 16];

        inv[0] = m[5] * m[10] * m[15] - m[5] * m[11] * m[14] - m[9] * m[6] * m[15]
            + m[9] * m[7] * m[14] + m[13] * m[6] * m[11] - m[13] * m[7] * m[10];
        inv[4] = -m[4] * m[10] * m[15] + m[4] * m[11] * m[14] + m[8] * m[6] * m[15]
            - m[8] * m[7] * m[14] - m[12] * m[6] * m[11] + m[12] * m[7] * m[10];
        inv[8] = m[4] * m[9] * m[15] - m[4] * m[11] * m[13] - m[8] * m[5] * m[15]
            + m[8] * m[7] * m[13] + m[12] * m[5] * m[11] - m[12] * m[7] * m[9];
        inv[12] = -m[4] * m[9] * m[14] + m[4] * m[10] * m[13] + m[8] * m[5] * m[14]
            - m[8] * m[6] * m[13] - m[12] * m[5] * m[10] + m[12] * m[6] * m[9];

        inv[1] = -m[1] * m[10] * m[15] + m[1] * m[11] * m[14] + m[9] * m[2] * m[15]
            - m[9] * m[3] * m[14] - m[13] * m[2] * m[11] + m[13] * m[3] * m[10];
        inv[5] = m[0] * m[10] * m[15] - m[0] * m[11] * m[14] - m[8] * m[2] * m[15]
            + m[8] * m[3] * m[14] + m[12] * m[2] * m[11] - m[12] * m[3] * m[10];
        inv[9] = -m[0] * m[9] * m[15] + m[0] * m[11] * m[13] + m[8] * m[1] * m[15]
            - m[8] * m[3] * m[13] - m[12] * m[1] * m[11] + m[12] * m[3] * m[9];
        inv[13] = m[0] * m[9] * m[14] - m[0] * m[10] * m[13] - m[8] * m[1] * m[14]
            + m[8] * m[2] * m[13] + m[12] * m[1] * m[10] - m[12] * m[2] * m[9];

        inv[2] = m[1] * m[6] * m[15] - m[1] * m[7] * m[14] - m[5] * m[2] * m[15]
            + m[5] * m[3] * m[14] + m[13] * m[2] * m[7] - m[13] * m[3] * m[6];
        inv[6] = -m[0] * m[6] * m[15] + m[0] * m[7] * m[14] + m[4] * m[2] * m[15]
            - m[4] * m[3] * m[14] - m[12] * m[2] * m[7] + m[12] * m[3] * m[6];
        inv[10] = m[0] * m[5] * m[15] - m[0] * m[7] * m[13] - m[4] * m[1] * m[15]
            + m[4] * m[3] * m[13] + m[12] * m[1] * m[7] - m[12] * m[3] * m[5];
        inv[14] = -m[0] * m[5] * m[14] + m[0] * m[6] * m[13] + m[4] * m[1] * m[14]
            - m[4] * m[2] * m[13] - m[12] * m[1] * m[6] + m[12] * m[2] * m[5];

        inv[3] = -m[1] * m[6] * m[11] + m[1] * m[7] * m[10] + m[5] * m[2] * m[11]
            - m[5] * m[3] * m[10] - m[9] * m[2] * m[7] + m[9] * m[3] * m[6];
        inv[7] = m[0] * m[6] * m[11] - m[0] * m[7] * m[10] - m[4] * m[2] * m[11]
            + m[4] * m[3] * m[10] + m[8] * m[2] * m[7] - m[8] * m[3] * m[6];
        inv[11] = -m[0] * m[5] * m[11] + m[0] * m[7] * m[9] + m[4] * m[1] * m[11]
            - m[4] * m[3] * m[9] - m[8] * m[1] * m[7] + m[8] * m[3] * m[5];
        inv[15] = m[0] * m[5] * m[10] - m[0] * m[6] * m[9] - m[4] * m[1] * m[10]
            + m[4] * m[2] * m[9] + m[8] * m[1] * m[6] - m[8] * m[2] * m[5];

        inv
    }
}

impl Mul for Mat4 {
    type Output = Mat4;
    fn mul(self, other: Mat4) -> Mat4 {
        self.multiply(&other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const EPS: f64 = 1e-3;

    fn assert_mat_eq(actual: &Mat4, expected: &Mat4) {
        for (i, (a, e)) in actual.0.iter().zip(expected.0.iter()).enumerate() {
            assert!((a - e).abs() < EPS, "value {} differs: {:?} != {:?}", i, actual, expected);
        }
    }

    fn sample() -> Mat4 {
        Mat4([
            3.0, 7.0, 2.0, 3.0,
            3.0, 1.0, 3.0, 5.0,
            5.0, 4.0, 2.0, 0.0,
            8.0, 5.0, 1.0, 1.0,
        ])
    }

    fn skewed() -> Mat4 {
        Mat4([
            1.0, 0.0, 2.0, 0.0,
            0.0, 1.0, 0.0, 7.0,
            4.0, 0.0, 3.0, 1.0,
            0.0, 2.0, 0.0, 2.0,
        ])
    }

    #[test]
    fn test_vec3_dot() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);
        assert_abs_diff_eq!(a.dot(b), 32.0);
    }

    #[test]
    fn test_vec3_cross() {
        let c = Vec3::new(1.0, 0.0, 0.0).cross(Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(c, Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_normalize_zero_stays_zero() {
        assert_eq!(Vec3::ZERO.normalize(), Vec3::ZERO);
        assert_abs_diff_eq!(Vec3::new(3.0, 4.0, 0.0).normalize().len(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rgb_packing() {
        assert_eq!(Vec3::new(1.0, 0.0, 1.0).to_rgb(), 0x00ff00ff);
        let v = Vec3::from_rgb(0xff336699);
        assert_abs_diff_eq!(v.x, 0.2, epsilon = 1e-9);
        assert_abs_diff_eq!(v.z, 0.6, epsilon = 1e-9);
    }

    #[test]
    fn test_multiply() {
        let expected = Mat4([
            13.0, 15.0, 6.0, 3.0,
            59.0, 36.0, 10.0, 12.0,
            35.0, 45.0, 15.0, 13.0,
            22.0, 12.0, 8.0, 12.0,
        ]);
        assert_mat_eq(&(skewed() * sample()), &expected);
    }

    #[test]
    fn test_identity_multiply() {
        for m in [sample(), skewed(), Mat4::perspective(2.0, 45.0, 0.1, 100.0)] {
            assert_eq!(m * Mat4::IDENTITY, m);
            assert_eq!(Mat4::IDENTITY * m, m);
        }
    }

    #[test]
    fn test_multiply_vec4() {
        let v = skewed().multiply_vec4(Vec4::new(4.0, 5.0, 6.0, 1.0));
        assert_eq!(v, Vec4::new(16.0, 12.0, 35.0, 12.0));
    }

    #[test]
    fn test_transform_point_divides_by_w() {
        let p = skewed().transform_point(Vec3::new(4.0, 5.0, 6.0));
        assert_abs_diff_eq!(p.x, 1.333, epsilon = EPS);
        assert_abs_diff_eq!(p.y, 1.000, epsilon = EPS);
        assert_abs_diff_eq!(p.z, 2.917, epsilon = EPS);
    }

    #[test]
    fn test_composition_order() {
        let a = Mat4::translation(1.0, 2.0, 3.0);
        let b = Mat4::rotation(0.3, -0.2, 1.1);
        let p = Vec3::new(0.5, -4.0, 2.0);
        let composed = (a * b).transform_point(p);
        let stepped = a.transform_point(b.transform_point(p));
        assert_abs_diff_eq!(composed.x, stepped.x, epsilon = 1e-9);
        assert_abs_diff_eq!(composed.y, stepped.y, epsilon = 1e-9);
        assert_abs_diff_eq!(composed.z, stepped.z, epsilon = 1e-9);
    }

    #[test]
    fn test_inverse() {
        let expected = Mat4([
            -0.1124, 0.0337, -0.0225, 0.1685,
            0.1798, -0.1039, -0.0140, -0.0197,
            -0.0787, 0.1236, 0.5843, -0.3820,
            0.0787, 0.1264, -0.3343, 0.1320,
        ]);
        let inv = sample().inverse().expect("invertible");
        assert_mat_eq(&inv, &expected);
        assert_mat_eq(&(sample() * inv), &Mat4::IDENTITY);
    }

    #[test]
    fn test_inverse_round_trip() {
        for m in [sample(), skewed(), Mat4::rotation(0.4, 1.2, -0.7), Mat4::scaling(2.0, 0.5, 3.0)] {
            let back = m.inverse().and_then(|inv| inv.inverse()).expect("invertible");
            assert_mat_eq(&back, &m);
        }
    }

    #[test]
    fn test_inverse_translation() {
        let inv = Mat4::translation(5.0, 4.0, 3.0).inverse().expect("invertible");
        assert_mat_eq(&inv, &Mat4::translation(-5.0, -4.0, -3.0));
    }

    #[test]
    fn test_inverse_singular() {
        let singular = Mat4::scaling(1.0, 0.0, 1.0);
        assert_eq!(singular.determinant(), 0.0);
        assert_eq!(singular.inverse(), Err(SingularMatrix));
    }

    #[test]
    fn test_rotation() {
        let m = Mat4::rotation(0.0, std::f64::consts::FRAC_PI_4, 0.0);
        let expected = Mat4([
            0.707, 0.0, 0.707, 0.0,
            0.0, 1.0, 0.0, 0.0,
            -0.707, 0.0, 0.707, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ]);
        assert_mat_eq(&m, &expected);

        let p = m.transform_point(Vec3::new(4.0, 5.0, 6.0));
        assert_abs_diff_eq!(p.x, 7.071, epsilon = EPS);
        assert_abs_diff_eq!(p.y, 5.0, epsilon = EPS);
        assert_abs_diff_eq!(p.z, 1.414, epsilon = EPS);
    }

    #[test]
    fn test_rotation_order_x_y_z() {
        use std::f64::consts::FRAC_PI_2;

        let rot_x = Mat4::rotation(FRAC_PI_2, 0.0, 0.0);
        let rot_y = Mat4::rotation(0.0, FRAC_PI_2, 0.0);
        let rot_z = Mat4::rotation(0.0, 0.0, FRAC_PI_2);
        assert_mat_eq(&Mat4::rotation(FRAC_PI_2, FRAC_PI_2, FRAC_PI_2), &(rot_x * rot_y * rot_z));

        // +X turns to -Z under Y, then to +Y under X
        let p = Mat4::rotation(FRAC_PI_2, FRAC_PI_2, 0.0).transform_point(Vec3::new(1.0, 0.0, 0.0));
        let stepped = rot_x.transform_point(rot_y.transform_point(Vec3::new(1.0, 0.0, 0.0)));
        assert_abs_diff_eq!(p.x, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(p.y, 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(p.z, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(p.y, stepped.y, epsilon = 1e-9);

        // The reverse order leaves it on -Z
        let reversed = rot_y.transform_point(rot_x.transform_point(Vec3::new(1.0, 0.0, 0.0)));
        assert_abs_diff_eq!(reversed.z, -1.0, epsilon = 1e-9);
        assert!((p - reversed).len() > 1.0);
    }

    #[test]
    fn test_perspective() {
        let m = Mat4::perspective(16.0 / 9.0, 45.0, 0.1, 10.0);
        let expected = Mat4([
            1.3579, 0.0, 0.0, 0.0,
            0.0, 2.4142, 0.0, 0.0,
            0.0, 0.0, -1.0202, -0.2020,
            0.0, 0.0, -1.0, 0.0,
        ]);
        assert_mat_eq(&m, &expected);

        let v = m.multiply_vec4(Vec4::new(4.0, 5.0, 6.0, 1.0));
        assert_abs_diff_eq!(v.w, -6.0, epsilon = EPS);
        assert_abs_diff_eq!(v.z, -6.323, epsilon = EPS);
    }

    #[test]
    fn test_perspective_point() {
        let m = Mat4::perspective(16.0 / 9.0, 45.0, 0.01, 1000.0);
        let p = m.transform_point(Vec3::new(4.0, 5.0, -6.0));
        assert_abs_diff_eq!(p.x, 0.905, epsilon = EPS);
        assert_abs_diff_eq!(p.y, 2.011, epsilon = EPS);
        assert_abs_diff_eq!(p.z, 0.996, epsilon = EPS);
    }
}
