//! Measurement tools

use schemars::JsonSchema;
use serde::Deserialize;

/// Request for measuring the distance between two points
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct MeasureDistanceRequest {
    /// First point [x, y, z]
    #[serde(alias = "point1")]
    pub point_a: [f64; 3],

    /// Second point [x, y, z]
    #[serde(alias = "point2")]
    pub point_b: [f64; 3],

    /// Interpret both points in this model's local coordinates (default: world)
    #[serde(default, alias = "model_name")]
    pub model: Option<String>,
}
