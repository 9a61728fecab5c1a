//! Model management tools

use schemars::JsonSchema;
use serde::Deserialize;

use crate::color::ColorSpec;

/// Request for loading an STL file into the scene
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct LoadStlRequest {
    /// Path to the STL file (binary or ASCII)
    #[serde(alias = "file_path")]
    pub path: String,

    /// Name for the model (default: file name without extension).
    /// If the name is taken, a suffix like "_1" is appended.
    #[serde(default, alias = "model_name")]
    pub name: Option<String>,
}

/// Request naming a single loaded model
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ModelNameRequest {
    /// Name of a loaded model (see list_models)
    #[serde(alias = "model_name")]
    pub name: String,
}

/// Request for changing a model's color
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SetModelColorRequest {
    /// Name of a loaded model
    #[serde(alias = "model_name")]
    pub name: String,

    /// New color: [r, g, b] with components 0.0-1.0, a hex code like "#ff8800",
    /// or a name such as "red", "blue", "lightgray"
    pub color: ColorSpec,
}

/// Request for changing a model's opacity
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SetModelOpacityRequest {
    /// Name of a loaded model
    #[serde(alias = "model_name")]
    pub name: String,

    /// Opacity from 0.0 (invisible) to 1.0 (opaque)
    pub opacity: f64,
}

/// Request for moving, rotating or scaling a model
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SetModelTransformRequest {
    /// Name of a loaded model
    #[serde(alias = "model_name")]
    pub name: String,

    /// Translation [x, y, z] in model units (omit to keep current)
    #[serde(default)]
    pub translation: Option<[f64; 3]>,

    /// Rotation [x, y, z] in degrees, applied in X, Y, Z order (omit to keep current)
    #[serde(default)]
    pub rotation: Option<[f64; 3]>,

    /// Uniform scale factor, must be > 0 (omit to keep current)
    #[serde(default)]
    pub scale: Option<f64>,
}
