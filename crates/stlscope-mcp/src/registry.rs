//! Model registry
//!
//! Maps unique names to loaded meshes and their display attributes. All
//! mutation goes through [`ModelRegistry`] methods; [`Model`] only exposes
//! getters.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use glam::{DMat4, DQuat, DVec3, EulerRot, Mat4};
use serde::Serialize;
use stlscope_core::{Aabb, Mesh, MeshStats};
use tracing::info;

use crate::backend::{self, GeometryLoader};
use crate::color::Rgb;
use crate::error::{ToolError, ToolResult};

/// Shared, immutable geometry
pub type MeshHandle = Arc<Mesh>;

/// Placement of a model in the world: scale, then rotate, then translate
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transform {
    pub translation: [f64; 3],
    /// Euler XYZ rotation in degrees
    pub rotation: [f64; 3],
    /// Uniform scale factor
    pub scale: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: [0.0; 3],
            rotation: [0.0; 3],
            scale: 1.0,
        }
    }
}

impl Transform {
    /// Model-to-world matrix
    pub fn matrix(&self) -> DMat4 {
        let [rx, ry, rz] = self.rotation.map(f64::to_radians);
        DMat4::from_scale_rotation_translation(
            DVec3::splat(self.scale),
            DQuat::from_euler(EulerRot::XYZ, rx, ry, rz),
            DVec3::from_array(self.translation),
        )
    }

    /// Single-precision matrix for the renderer
    pub fn matrix_f32(&self) -> Mat4 {
        self.matrix().as_mat4()
    }

    /// Map a point from model coordinates to world coordinates
    pub fn apply(&self, point: DVec3) -> DVec3 {
        self.matrix().transform_point3(point)
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }
}

/// Partial transform change; `None` keeps the current value
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransformUpdate {
    pub translation: Option<[f64; 3]>,
    pub rotation: Option<[f64; 3]>,
    pub scale: Option<f64>,
}

/// Axis-aligned bounds as reported to clients
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundsInfo {
    pub min: [f32; 3],
    pub max: [f32; 3],
    pub size: [f32; 3],
}

impl From<Aabb> for BoundsInfo {
    fn from(aabb: Aabb) -> Self {
        Self {
            min: aabb.min.to_array(),
            max: aabb.max.to_array(),
            size: aabb.size().to_array(),
        }
    }
}

/// One loaded mesh in the scene
#[derive(Debug, Clone)]
pub struct Model {
    name: String,
    source: PathBuf,
    mesh: MeshHandle,
    color: Rgb,
    opacity: f32,
    transform: Transform,
    bounding_box: Aabb,
    stats: MeshStats,
}

impl Model {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn mesh(&self) -> &MeshHandle {
        &self.mesh
    }

    pub fn color(&self) -> Rgb {
        self.color
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Bounds in model coordinates
    pub fn bounding_box(&self) -> Aabb {
        self.bounding_box
    }

    /// Bounds after applying the transform
    pub fn world_bounds(&self) -> Aabb {
        self.bounding_box.transformed(&self.transform.matrix_f32())
    }

    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            name: self.name.clone(),
            vertices: self.mesh.vertex_count(),
            faces: self.mesh.triangle_count(),
            bounds: self.bounding_box.into(),
            color: self.color,
            opacity: self.opacity,
        }
    }

    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            name: self.name.clone(),
            source: self.source.display().to_string(),
            vertices: self.mesh.vertex_count(),
            faces: self.mesh.triangle_count(),
            volume: self.stats.volume,
            surface_area: self.stats.surface_area,
            center: self.stats.center.to_array(),
            diagonal_length: self.stats.diagonal,
            bounds: self.bounding_box.into(),
            world_bounds: self.world_bounds().into(),
            color: self.color,
            opacity: self.opacity,
            transform: self.transform,
        }
    }
}

/// Short description used by listings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSummary {
    pub name: String,
    pub vertices: usize,
    pub faces: usize,
    pub bounds: BoundsInfo,
    pub color: Rgb,
    pub opacity: f32,
}

/// Full description of one model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    pub name: String,
    pub source: String,
    pub vertices: usize,
    pub faces: usize,
    pub volume: f64,
    pub surface_area: f64,
    /// Mean of the vertex positions
    pub center: [f32; 3],
    pub diagonal_length: f32,
    pub bounds: BoundsInfo,
    pub world_bounds: BoundsInfo,
    pub color: Rgb,
    pub opacity: f32,
    pub transform: Transform,
}

/// Name-keyed collection of loaded models
#[derive(Debug)]
pub struct ModelRegistry {
    models: BTreeMap<String, Model>,
    default_color: Rgb,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new(Rgb::NEUTRAL)
    }
}

impl ModelRegistry {
    pub fn new(default_color: Rgb) -> Self {
        Self {
            models: BTreeMap::new(),
            default_color,
        }
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Model names in sorted order
    pub fn names(&self) -> Vec<String> {
        self.models.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Model> {
        self.models.values()
    }

    /// Load a geometry source and register it
    pub fn load(
        &mut self,
        loader: &dyn GeometryLoader,
        source: &Path,
        requested_name: Option<&str>,
    ) -> ToolResult<&Model> {
        let mesh = backend::load_mesh(loader, source)?;
        self.register(source, mesh, requested_name)
    }

    /// Register already-parsed geometry under a unique name
    pub fn register(
        &mut self,
        source: &Path,
        mesh: Mesh,
        requested_name: Option<&str>,
    ) -> ToolResult<&Model> {
        if mesh.triangle_count() == 0 {
            return Err(ToolError::load(format!(
                "'{}' contains no faces",
                source.display()
            )));
        }
        let Some(bounding_box) = mesh.bounds() else {
            return Err(ToolError::load(format!(
                "'{}' has no vertices",
                source.display()
            )));
        };

        let name = self.unique_name(source, requested_name)?;
        let stats = mesh.stats();
        let model = Model {
            name: name.clone(),
            source: source.to_path_buf(),
            mesh: Arc::new(mesh),
            color: self.default_color,
            opacity: 1.0,
            transform: Transform::default(),
            bounding_box,
            stats,
        };

        info!(
            name = %name,
            source = %source.display(),
            faces = model.mesh.triangle_count(),
            "Registered model"
        );
        Ok(&*self.models.entry(name).or_insert(model))
    }

    /// Pick the final name: requested or file stem, suffixed `_1`, `_2`, ... on collision
    fn unique_name(&self, source: &Path, requested_name: Option<&str>) -> ToolResult<String> {
        let base = match requested_name {
            Some(requested) => {
                let trimmed = requested.trim();
                if trimmed.is_empty() {
                    return Err(ToolError::validation("Model name must not be empty"));
                }
                trimmed.to_string()
            }
            None => source
                .file_stem()
                .and_then(|s| s.to_str())
                .filter(|s| !s.is_empty())
                .unwrap_or("model")
                .to_string(),
        };

        if !self.models.contains_key(&base) {
            return Ok(base);
        }
        let mut n = 1usize;
        loop {
            let candidate = format!("{base}_{n}");
            if !self.models.contains_key(&candidate) {
                return Ok(candidate);
            }
            n += 1;
        }
    }

    pub fn list(&self) -> Vec<ModelSummary> {
        self.models.values().map(Model::summary).collect()
    }

    pub fn get(&self, name: &str) -> ToolResult<&Model> {
        self.models.get(name).ok_or_else(|| self.not_found(name))
    }

    pub fn get_info(&self, name: &str) -> ToolResult<ModelInfo> {
        self.get(name).map(Model::info)
    }

    pub fn remove(&mut self, name: &str) -> ToolResult<Model> {
        let model = self.models.remove(name).ok_or_else(|| self.not_found(name))?;
        info!(name, "Removed model");
        Ok(model)
    }

    /// Remove every model, returning how many there were
    pub fn clear(&mut self) -> usize {
        let count = self.models.len();
        self.models.clear();
        if count > 0 {
            info!(count, "Cleared all models");
        }
        count
    }

    pub fn set_color(&mut self, name: &str, color: Rgb) -> ToolResult<&Model> {
        let model = self.get_mut(name)?;
        model.color = color;
        Ok(&*model)
    }

    pub fn set_opacity(&mut self, name: &str, opacity: f32) -> ToolResult<&Model> {
        if !(opacity.is_finite() && (0.0..=1.0).contains(&opacity)) {
            return Err(ToolError::validation(format!(
                "Opacity must be between 0.0 and 1.0, got {opacity}"
            )));
        }
        let model = self.get_mut(name)?;
        model.opacity = opacity;
        Ok(&*model)
    }

    pub fn set_transform(&mut self, name: &str, update: &TransformUpdate) -> ToolResult<&Model> {
        if let Some(scale) = update.scale {
            if !(scale.is_finite() && scale > 0.0) {
                return Err(ToolError::validation(format!(
                    "Scale must be a positive number, got {scale}"
                )));
            }
        }
        let model = self.get_mut(name)?;
        if let Some(translation) = update.translation {
            model.transform.translation = translation;
        }
        if let Some(rotation) = update.rotation {
            model.transform.rotation = rotation;
        }
        if let Some(scale) = update.scale {
            model.transform.scale = scale;
        }
        Ok(&*model)
    }

    fn get_mut(&mut self, name: &str) -> ToolResult<&mut Model> {
        let available = self.names();
        self.models
            .get_mut(name)
            .ok_or_else(|| missing_model(name, &available))
    }

    fn not_found(&self, name: &str) -> ToolError {
        missing_model(name, &self.names())
    }
}

fn missing_model(name: &str, available: &[String]) -> ToolError {
    let available = if available.is_empty() {
        "none".to_string()
    } else {
        available.join(", ")
    };
    ToolError::not_found(format!(
        "Model '{name}' not found. Available models: {available}"
    ))
}
