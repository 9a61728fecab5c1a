//! Pluggable geometry and rendering backends
//!
//! The session only talks to these traits, so tests (or another renderer)
//! can swap either side without touching tool logic.

use std::path::Path;

use image::RgbaImage;
use stlscope_core::Mesh;
use stlscope_render::{RenderScene, SoftwareRenderer};

use crate::error::{ToolError, ToolResult};

/// Reads a geometry source into a triangle mesh
pub trait GeometryLoader: Send + Sync {
    fn load(&self, path: &Path) -> stlscope_core::Result<Mesh>;
}

/// Run a loader, reporting any failure as a `load` error naming the source
pub fn load_mesh(loader: &dyn GeometryLoader, path: &Path) -> ToolResult<Mesh> {
    loader
        .load(path)
        .map_err(|e| ToolError::load(format!("Failed to load '{}': {e}", path.display())))
}

/// Turns a scene snapshot into pixels
pub trait RenderEngine: Send + Sync {
    fn render(&self, scene: &RenderScene) -> stlscope_render::Result<RgbaImage>;
}

/// Loads binary and ASCII STL files
#[derive(Debug, Default, Clone, Copy)]
pub struct StlLoader;

impl GeometryLoader for StlLoader {
    fn load(&self, path: &Path) -> stlscope_core::Result<Mesh> {
        stlscope_core::read_mesh(path)
    }
}

impl RenderEngine for SoftwareRenderer {
    fn render(&self, scene: &RenderScene) -> stlscope_render::Result<RgbaImage> {
        SoftwareRenderer::render(self, scene)
    }
}
