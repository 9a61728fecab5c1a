//! Camera tools

use schemars::JsonSchema;
use serde::Deserialize;

/// Request for setting the camera directly
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct SetCameraRequest {
    /// Camera position [x, y, z] (omit to keep current)
    #[serde(default)]
    pub position: Option<[f64; 3]>,

    /// Point the camera looks at [x, y, z] (omit to keep current)
    #[serde(default)]
    pub focal_point: Option<[f64; 3]>,

    /// Up direction [x, y, z]; must not be parallel to the view direction (omit to keep current)
    #[serde(default)]
    pub view_up: Option<[f64; 3]>,

    /// Zoom factor: > 1 zooms in, < 1 zooms out (omit for no zoom)
    #[serde(default)]
    pub zoom: Option<f64>,
}

/// Request for rotating the camera around the focal point
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct RotateCameraRequest {
    /// Degrees to orbit around the vertical (Z) axis (default: 0)
    #[serde(default)]
    pub azimuth: f64,

    /// Degrees to tilt up (positive) or down (negative) (default: 0)
    #[serde(default)]
    pub elevation: f64,

    /// Degrees to twist around the view direction (default: 0)
    #[serde(default)]
    pub roll: f64,
}
