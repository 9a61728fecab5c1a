//! Render camera

use glam::{Mat4, Vec3};
use stlscope_core::Aabb;

/// A perspective camera looking from `position` at `target`
#[derive(Debug, Clone)]
pub struct Camera {
    /// Camera position in world space
    pub position: Vec3,
    /// Point the camera is looking at
    pub target: Vec3,
    /// Up vector (Z-up by default)
    pub up: Vec3,
    /// Vertical field of view in radians
    pub fov: f32,
    /// Aspect ratio (width / height)
    pub aspect: f32,
    /// Near clipping plane
    pub near: f32,
    /// Far clipping plane
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(100.0, -100.0, 100.0),
            target: Vec3::ZERO,
            up: Vec3::Z,
            fov: 30.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Camera {
    /// Create a camera looking at a target from a position
    pub fn look_at(position: Vec3, target: Vec3, up: Vec3) -> Self {
        Self {
            position,
            target,
            up,
            ..Default::default()
        }
    }

    /// Get the view matrix (world to camera transform)
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Get the projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    /// Get the combined view-projection matrix
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Get the forward direction (normalized)
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    /// Get distance from camera to target
    pub fn distance(&self) -> f32 {
        (self.position - self.target).length()
    }

    /// Place the clipping planes tightly around a bounding box
    ///
    /// Keeps depth precision usable for models of any size, from a 2 mm screw
    /// to a 2 m enclosure.
    pub fn fit_clip_planes(&mut self, bounds: &Aabb) {
        let radius = (bounds.diagonal() * 0.5).max(1e-3);
        let distance = (bounds.center() - self.position).length();

        self.far = distance + radius * 2.0;
        self.near = (distance - radius * 2.0).max(self.far * 1e-4);
    }
}
