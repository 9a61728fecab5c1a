//! Rendering tools

use schemars::JsonSchema;
use serde::Deserialize;

use crate::color::ColorSpec;

/// Request for rendering the scene to an image file
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TakeScreenshotRequest {
    /// Where to write the image; the extension picks the format (.png, .jpg, .bmp, .tiff)
    pub output_path: String,

    /// Models to include (default: all loaded models)
    #[serde(default)]
    pub models: Option<Vec<String>>,

    /// Image width in pixels, 1-8192 (default: 1920)
    #[serde(default)]
    pub width: Option<u32>,

    /// Image height in pixels, 1-8192 (default: 1080)
    #[serde(default)]
    pub height: Option<u32>,

    /// Background color as [r, g, b], hex code or name (default: white)
    #[serde(default)]
    pub background_color: Option<ColorSpec>,

    /// Draw X (red), Y (green) and Z (blue) axes (default: true)
    #[serde(default)]
    pub show_axes: Option<bool>,

    /// Also return the image inline as PNG (default: false)
    #[serde(default)]
    pub include_image: bool,
}
