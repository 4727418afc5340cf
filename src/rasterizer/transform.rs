//! Object placement: translation, Euler rotation and scaling

use serde::{Serialize, Deserialize};

use super::math::{Mat4, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translation: Vec3,
    /// Euler angles in radians
    pub rotation: Vec3,
    pub scaling: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scaling: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(x: f64, y: f64, z: f64) -> Self {
        Self {
            translation: Vec3::new(x, y, z),
            ..Self::default()
        }
    }

    pub fn with_scaling(mut self, x: f64, y: f64, z: f64) -> Self {
        self.scaling = Vec3::new(x, y, z);
        self
    }

    pub fn with_rotation(mut self, x: f64, y: f64, z: f64) -> Self {
        self.rotation = Vec3::new(x, y, z);
        self
    }

    pub fn rotation_matrix(&self) -> Mat4 {
        Mat4::rotation(self.rotation.x, self.rotation.y, self.rotation.z)
    }

    /// Model matrix: `translation * rotation * scaling`, rebuilt on every call
    pub fn matrix(&self) -> Mat4 {
        let t = self.translation;
        let s = self.scaling;
        Mat4::translation(t.x, t.y, t.z) * self.rotation_matrix() * Mat4::scaling(s.x, s.y, s.z)
    }
}
