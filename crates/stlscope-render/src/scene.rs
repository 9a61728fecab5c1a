//! Immutable scene descriptions handed to the renderer

use std::sync::Arc;

use glam::Mat4;
use stlscope_core::{Aabb, Mesh};

use crate::camera::Camera;

/// One mesh to draw
#[derive(Debug, Clone)]
pub struct RenderItem {
    pub name: String,
    pub mesh: Arc<Mesh>,
    /// Linear RGB in [0, 1]
    pub color: [f32; 3],
    /// 0.0 = invisible, 1.0 = opaque
    pub opacity: f32,
    /// Model-to-world transform
    pub transform: Mat4,
}

impl RenderItem {
    /// Bounding box of the mesh in world space
    pub fn world_bounds(&self) -> Option<Aabb> {
        self.mesh.bounds().map(|b| b.transformed(&self.transform))
    }

    pub fn is_opaque(&self) -> bool {
        self.opacity >= 1.0
    }
}

/// Everything needed to produce one frame
#[derive(Debug, Clone)]
pub struct RenderScene {
    pub camera: Camera,
    pub items: Vec<RenderItem>,
    pub width: u32,
    pub height: u32,
    /// Linear RGB in [0, 1]
    pub background: [f32; 3],
    pub show_axes: bool,
}

impl RenderScene {
    pub fn new(camera: Camera, width: u32, height: u32) -> Self {
        Self {
            camera,
            items: Vec::new(),
            width,
            height,
            background: [1.0, 1.0, 1.0],
            show_axes: false,
        }
    }

    /// Union of all item bounds in world space
    pub fn bounds(&self) -> Option<Aabb> {
        self.items
            .iter()
            .filter_map(RenderItem::world_bounds)
            .reduce(|a, b| a.union(&b))
    }
}
