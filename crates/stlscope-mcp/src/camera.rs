//! Camera state controller
//!
//! The session has exactly one camera. Its stored state is position, focal
//! point, view-up and view angle; azimuth, elevation, roll and distance are
//! derived on demand. Every update is computed on a copy and validated before
//! it is committed, so a failed call leaves the camera untouched.

use glam::{DQuat, DVec3};
use serde::Serialize;
use stlscope_render::Camera;

use crate::error::{ToolError, ToolResult};

/// World vertical axis
pub const WORLD_UP: DVec3 = DVec3::Z;

/// Minimum cross-product magnitude between view direction and view-up
pub const PARALLEL_EPSILON: f64 = 1e-6;

/// Minimum distance between position and focal point
const COINCIDENT_EPSILON: f64 = 1e-9;

/// Allowed vertical field of view in degrees
const VIEW_ANGLE_RANGE: std::ops::RangeInclusive<f64> = 0.01..=179.0;

const HOME_POSITION: DVec3 = DVec3::new(100.0, -100.0, 100.0);
const HOME_VIEW_ANGLE: f64 = 30.0;

/// A validated camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    position: DVec3,
    focal_point: DVec3,
    view_up: DVec3,
    view_angle: f64,
}

impl Default for CameraState {
    fn default() -> Self {
        Self::home()
    }
}

impl CameraState {
    /// The default view: looking at the origin from `[100, -100, 100]`, +Z up
    pub fn home() -> Self {
        let direction = (DVec3::ZERO - HOME_POSITION).normalize();
        Self {
            position: HOME_POSITION,
            focal_point: DVec3::ZERO,
            view_up: orthogonalize(WORLD_UP, direction),
            view_angle: HOME_VIEW_ANGLE,
        }
    }

    /// Build a camera, rejecting degenerate geometry
    ///
    /// `view_up` is normalized and made orthogonal to the view direction.
    pub fn new(
        position: DVec3,
        focal_point: DVec3,
        view_up: DVec3,
        view_angle: f64,
    ) -> ToolResult<Self> {
        let offset = focal_point - position;
        let distance = offset.length();
        if !distance.is_finite() {
            return Err(ToolError::state_invariant(format!(
                "Camera position {:?} is too far from the focal point {:?}",
                position.to_array(),
                focal_point.to_array()
            )));
        }
        if distance <= COINCIDENT_EPSILON {
            return Err(ToolError::state_invariant(format!(
                "Camera position {:?} coincides with the focal point",
                position.to_array()
            )));
        }
        let direction = offset / distance;

        let up = view_up.normalize_or_zero();
        if up == DVec3::ZERO || direction.cross(up).length() <= PARALLEL_EPSILON {
            return Err(ToolError::state_invariant(format!(
                "View-up {:?} is parallel to the view direction {:?}",
                view_up.to_array(),
                direction.to_array()
            )));
        }

        if !VIEW_ANGLE_RANGE.contains(&view_angle) {
            return Err(ToolError::state_invariant(format!(
                "View angle {view_angle} is outside {:?} degrees",
                VIEW_ANGLE_RANGE
            )));
        }

        Ok(Self {
            position,
            focal_point,
            view_up: orthogonalize(up, direction),
            view_angle,
        })
    }

    pub fn position(&self) -> DVec3 {
        self.position
    }

    pub fn focal_point(&self) -> DVec3 {
        self.focal_point
    }

    pub fn view_up(&self) -> DVec3 {
        self.view_up
    }

    /// Vertical field of view in degrees
    pub fn view_angle(&self) -> f64 {
        self.view_angle
    }

    pub fn distance(&self) -> f64 {
        self.position.distance(self.focal_point)
    }

    /// Unit vector from position to focal point
    pub fn direction_of_projection(&self) -> DVec3 {
        (self.focal_point - self.position).normalize()
    }

    /// Angle of the camera around the world Z axis, measured from +X
    pub fn azimuth(&self) -> f64 {
        let offset = self.position - self.focal_point;
        offset.y.atan2(offset.x).to_degrees()
    }

    /// Angle of the camera above the XY plane through the focal point
    pub fn elevation(&self) -> f64 {
        let offset = self.position - self.focal_point;
        (offset.z / offset.length()).clamp(-1.0, 1.0).asin().to_degrees()
    }

    /// Twist of view-up away from world up, about the view direction
    pub fn roll(&self) -> f64 {
        let direction = self.direction_of_projection();
        let reference = if direction.cross(WORLD_UP).length() > PARALLEL_EPSILON {
            orthogonalize(WORLD_UP, direction)
        } else {
            orthogonalize(DVec3::Y, direction)
        };
        let sin = direction.dot(reference.cross(self.view_up));
        let cos = reference.dot(self.view_up);
        sin.atan2(cos).to_degrees()
    }

    /// Convert to the renderer's camera
    pub fn to_render_camera(&self) -> Camera {
        Camera {
            position: self.position.as_vec3(),
            target: self.focal_point.as_vec3(),
            up: self.view_up.as_vec3(),
            fov: (self.view_angle as f32).to_radians(),
            ..Camera::default()
        }
    }

    pub fn summary(&self) -> CameraSummary {
        CameraSummary {
            position: self.position.to_array(),
            focal_point: self.focal_point.to_array(),
            view_up: self.view_up.to_array(),
            view_angle: self.view_angle,
            distance: self.distance(),
            azimuth: self.azimuth(),
            elevation: self.elevation(),
            roll: self.roll(),
        }
    }
}

/// Camera state as reported to clients
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CameraSummary {
    pub position: [f64; 3],
    pub focal_point: [f64; 3],
    pub view_up: [f64; 3],
    pub view_angle: f64,
    pub distance: f64,
    pub azimuth: f64,
    pub elevation: f64,
    pub roll: f64,
}

/// Absolute camera changes; `None` keeps the current value
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CameraUpdate {
    pub position: Option<DVec3>,
    pub focal_point: Option<DVec3>,
    pub view_up: Option<DVec3>,
    /// Divides the view angle (> 1 zooms in)
    pub zoom: Option<f64>,
}

/// Relative camera rotation in degrees
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rotation {
    pub azimuth: f64,
    pub elevation: f64,
    pub roll: f64,
}

/// Owns the session camera and applies updates atomically
#[derive(Debug, Clone, Default)]
pub struct CameraController {
    state: CameraState,
}

impl CameraController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &CameraState {
        &self.state
    }

    /// Apply absolute changes
    pub fn set_camera(&mut self, update: &CameraUpdate) -> ToolResult<CameraState> {
        let current = self.state;
        let view_angle = match update.zoom {
            Some(zoom) if !(zoom.is_finite() && zoom > 0.0) => {
                return Err(ToolError::validation(format!(
                    "zoom must be a positive number, got {zoom}"
                )));
            }
            Some(zoom) => current.view_angle / zoom,
            None => current.view_angle,
        };

        let next = CameraState::new(
            update.position.unwrap_or(current.position),
            update.focal_point.unwrap_or(current.focal_point),
            update.view_up.unwrap_or(current.view_up),
            view_angle,
        )?;
        self.state = next;
        Ok(next)
    }

    /// Rotate relative to the current view: azimuth, then elevation, then roll
    pub fn rotate(&mut self, rotation: &Rotation) -> ToolResult<CameraState> {
        let current = self.state;
        let focal = current.focal_point;
        let mut offset = current.position - focal;
        let mut up = current.view_up;

        if rotation.azimuth != 0.0 {
            let q = DQuat::from_axis_angle(WORLD_UP, rotation.azimuth.to_radians());
            offset = q * offset;
            up = q * up;
        }

        if rotation.elevation != 0.0 {
            let direction = (-offset).normalize();
            let right = direction.cross(up).normalize();
            // Positive elevation raises the camera
            let q = DQuat::from_axis_angle(right, -rotation.elevation.to_radians());
            offset = q * offset;
            up = q * up;
        }

        if rotation.roll != 0.0 {
            let direction = (-offset).normalize();
            up = DQuat::from_axis_angle(direction, rotation.roll.to_radians()) * up;
        }

        let next = CameraState::new(focal + offset, focal, up, current.view_angle)?;
        self.state = next;
        Ok(next)
    }

    /// Restore the home view
    pub fn reset(&mut self) -> CameraState {
        self.state = CameraState::home();
        self.state
    }
}

/// Component of `v` orthogonal to unit `axis`, normalized
fn orthogonalize(v: DVec3, axis: DVec3) -> DVec3 {
    (v - axis * v.dot(axis)).normalize()
}
