//! Perspective camera
//!
//! The camera is placed in the world with a [`Transform`]; the view matrix is
//! the inverse of that placement.

use serde::{Serialize, Deserialize};

use super::math::{Mat4, SingularMatrix, Vec3};
use super::transform::Transform;

/// Projection parameters, kept so the matrix can be rebuilt on resize
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lens {
    /// Vertical field of view in degrees
    pub fov: f64,
    pub near: f64,
    pub far: f64,
    pub aspect: f64,
}

impl Default for Lens {
    fn default() -> Self {
        Self {
            fov: 45.0,
            near: 0.1,
            far: 1000.0,
            aspect: 1.0,
        }
    }
}

impl Lens {
    pub fn projection(&self) -> Mat4 {
        Mat4::perspective(self.aspect, self.fov, self.near, self.far)
    }
}

#[derive(Debug, Clone)]
pub struct Camera {
    pub projection: Mat4,
    pub transform: Transform,
    lens: Lens,
}

impl Camera {
    pub fn new(lens: Lens) -> Self {
        Self {
            projection: lens.projection(),
            transform: Transform::new(),
            lens,
        }
    }

    /// Camera sized for a `width` x `height` cell surface
    pub fn for_surface(width: usize, height: usize, fov: f64, near: f64, far: f64) -> Self {
        Self::new(Lens {
            fov,
            near,
            far,
            aspect: aspect_ratio(width, height),
        })
    }

    pub fn lens(&self) -> &Lens {
        &self.lens
    }

    /// Rebuild the projection for a new surface shape
    pub fn set_aspect(&mut self, aspect: f64) {
        self.lens.aspect = aspect;
        self.projection = self.lens.projection();
    }

    /// World-to-camera matrix, or the error if the placement is degenerate
    pub fn try_view(&self) -> Result<Mat4, SingularMatrix> {
        self.transform.matrix().inverse()
    }

    /// World-to-camera matrix. A degenerate placement (e.g. zero scaling)
    /// falls back to identity.
    pub fn view(&self) -> Mat4 {
        self.try_view().unwrap_or_else(|e| {
            log::warn!("camera view unavailable ({}), using identity", e);
            Mat4::IDENTITY
        })
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view()
    }

    /// Move relative to the camera's current orientation
    pub fn translate(&mut self, x: f64, y: f64, z: f64) {
        let offset = self.transform.rotation_matrix().transform_vector(Vec3::new(x, y, z));
        self.transform.translation = self.transform.translation + offset;
    }
}

/// Width over height, guarding against an empty surface
pub fn aspect_ratio(width: usize, height: usize) -> f64 {
    if height == 0 {
        return 1.0;
    }
    width as f64 / height as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_view_is_inverse_placement() {
        let mut camera = Camera::new(Lens::default());
        camera.transform = Transform::at(1.0, 2.0, 3.0);
        let p = camera.view().transform_point(Vec3::new(1.0, 2.0, 3.0));
        assert_abs_diff_eq!(p.len(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_view_falls_back_to_identity() {
        let mut camera = Camera::new(Lens::default());
        camera.transform.scaling = Vec3::ZERO;
        assert!(camera.try_view().is_err());
        assert_eq!(camera.view(), Mat4::IDENTITY);
    }

    #[test]
    fn test_set_aspect_rebuilds_projection() {
        let mut camera = Camera::for_surface(80, 40, 45.0, 0.1, 100.0);
        assert_abs_diff_eq!(camera.lens().aspect, 2.0);
        camera.set_aspect(1.0);
        assert_eq!(camera.projection, Mat4::perspective(1.0, 45.0, 0.1, 100.0));
    }

    #[test]
    fn test_translate_follows_rotation() {
        let mut camera = Camera::new(Lens::default());
        camera.transform.rotation = Vec3::new(0.0, std::f64::consts::FRAC_PI_2, 0.0);
        camera.translate(0.0, 0.0, -1.0);
        // Facing -Z rotated a quarter turn about Y faces -X
        let t = camera.transform.translation;
        assert_abs_diff_eq!(t.x, -1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(t.z, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_aspect_ratio_empty_surface() {
        assert_eq!(aspect_ratio(10, 0), 1.0);
    }
}
