//! Stlscope Render - headless CPU rasterizer
//!
//! Turns an immutable [`RenderScene`] (camera + meshes with color, opacity and
//! transform) into an `image::RgbaImage`. There is no window and no GPU: the
//! renderer is meant to run on a blocking worker thread of a server.
//!
//! ## Features
//!
//! - Z-buffered triangle rasterization with flat, two-sided headlight shading
//! - Translucent models blended back-to-front after the opaque pass
//! - Optional world axes (X red, Y green, Z blue)
//! - PNG encoding and saving by file extension
//!
//! ## Example
//!
//! ```rust,ignore
//! use stlscope_render::{Camera, RenderScene, SoftwareRenderer};
//!
//! let scene = RenderScene::new(Camera::default(), 1920, 1080);
//! let image = SoftwareRenderer::default().render(&scene)?;
//! image.save("empty.png")?;
//! ```

pub mod camera;
pub mod output;
pub mod rasterizer;
pub mod scene;

use thiserror::Error;

pub use camera::Camera;
pub use output::{encode_png, save_image};
pub use rasterizer::SoftwareRenderer;
pub use scene::{RenderItem, RenderScene};

/// Largest accepted image edge in pixels
pub const MAX_DIMENSION: u32 = 8192;

/// Errors produced while rendering or writing images
#[derive(Error, Debug)]
pub enum RenderError {
    /// Width or height is zero or above [`MAX_DIMENSION`]
    #[error("Invalid image size {width}x{height} (each side must be 1..={MAX_DIMENSION})")]
    InvalidSize { width: u32, height: u32 },

    /// Camera position coincides with its target
    #[error("Camera position and target coincide")]
    DegenerateCamera,

    /// Image encoding/decoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RenderError>;
