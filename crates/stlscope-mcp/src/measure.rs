//! Distance measurement

use glam::DVec3;
use serde::Serialize;

use crate::error::{ToolError, ToolResult};
use crate::registry::Transform;

/// Euclidean distance between two points, in native mesh units
pub fn distance(a: DVec3, b: DVec3) -> ToolResult<f64> {
    if !(a.is_finite() && b.is_finite()) {
        return Err(ToolError::validation(
            "Point coordinates must be finite numbers",
        ));
    }
    let d = a.distance(b);
    if !d.is_finite() {
        return Err(ToolError::validation(format!(
            "Distance between {:?} and {:?} is too large to represent",
            a.to_array(),
            b.to_array()
        )));
    }
    Ok(d)
}

/// Result of a `measure_distance` call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    pub point_a: [f64; 3],
    pub point_b: [f64; 3],
    /// Model whose local frame the points were given in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub world_a: [f64; 3],
    pub world_b: [f64; 3],
    pub distance: f64,
    pub units: &'static str,
}

/// Measure between two points, optionally given in a model's local frame
pub fn measure(a: DVec3, b: DVec3, frame: Option<(&str, &Transform)>) -> ToolResult<Measurement> {
    let (world_a, world_b) = match frame {
        Some((_, transform)) => (transform.apply(a), transform.apply(b)),
        None => (a, b),
    };
    let distance = distance(world_a, world_b)?;
    Ok(Measurement {
        point_a: a.to_array(),
        point_b: b.to_array(),
        model: frame.map(|(name, _)| name.to_string()),
        world_a: world_a.to_array(),
        world_b: world_b.to_array(),
        distance,
        units: "model units",
    })
}
