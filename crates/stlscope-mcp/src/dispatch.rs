//! Tool dispatch
//!
//! Every tool call goes through the same lifecycle:
//!
//! ```text
//! Received -> Validated -> Executed -> Responded
//!     \           \            \
//!      +-----------+------------+--> Errored
//! ```
//!
//! A [`ToolCall`] carries the raw typed arguments. Validation turns it into a
//! [`Command`] of domain values before the session is touched; execution routes
//! the command to exactly one component. Either way the caller gets a
//! [`ToolResponse`] with the same JSON shape.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use glam::DVec3;
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use stlscope_render::MAX_DIMENSION;
use tracing::{debug, warn};

use crate::backend;
use crate::camera::{CameraUpdate, Rotation};
use crate::color::Rgb;
use crate::config::ServerConfig;
use crate::error::{Stage, ToolError, ToolResult};
use crate::measure;
use crate::registry::{Model, TransformUpdate};
use crate::render::{self, ScreenshotOptions};
use crate::state::SessionHandle;
use crate::tools::camera::{RotateCameraRequest, SetCameraRequest};
use crate::tools::measure::MeasureDistanceRequest;
use crate::tools::model::{
    LoadStlRequest, ModelNameRequest, SetModelColorRequest, SetModelOpacityRequest,
    SetModelTransformRequest,
};
use crate::tools::render::TakeScreenshotRequest;

/// A tool invocation with its typed arguments
///
/// Serialized as `{"tool": "load_stl", "arguments": {...}}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "tool", content = "arguments", rename_all = "snake_case")]
pub enum ToolCall {
    LoadStl(LoadStlRequest),
    ListModels,
    GetModelInfo(ModelNameRequest),
    RemoveModel(ModelNameRequest),
    ClearAllModels,
    SetCamera(SetCameraRequest),
    RotateCamera(RotateCameraRequest),
    ResetView,
    TakeScreenshot(TakeScreenshotRequest),
    SetModelColor(SetModelColorRequest),
    SetModelOpacity(SetModelOpacityRequest),
    SetModelTransform(SetModelTransformRequest),
    MeasureDistance(MeasureDistanceRequest),
}

impl ToolCall {
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoadStl(_) => "load_stl",
            Self::ListModels => "list_models",
            Self::GetModelInfo(_) => "get_model_info",
            Self::RemoveModel(_) => "remove_model",
            Self::ClearAllModels => "clear_all_models",
            Self::SetCamera(_) => "set_camera",
            Self::RotateCamera(_) => "rotate_camera",
            Self::ResetView => "reset_view",
            Self::TakeScreenshot(_) => "take_screenshot",
            Self::SetModelColor(_) => "set_model_color",
            Self::SetModelOpacity(_) => "set_model_opacity",
            Self::SetModelTransform(_) => "set_model_transform",
            Self::MeasureDistance(_) => "measure_distance",
        }
    }

    /// Check arguments and resolve defaults without touching the session
    pub fn validate(self, config: &ServerConfig) -> ToolResult<Command> {
        let command = match self {
            Self::LoadStl(req) => {
                let path = req.path.trim();
                if path.is_empty() {
                    return Err(ToolError::validation("path must not be empty"));
                }
                Command::Load {
                    path: PathBuf::from(path),
                    name: req.name.map(model_name).transpose()?,
                }
            }
            Self::ListModels => Command::List,
            Self::GetModelInfo(req) => Command::Info {
                name: model_name(req.name)?,
            },
            Self::RemoveModel(req) => Command::Remove {
                name: model_name(req.name)?,
            },
            Self::ClearAllModels => Command::Clear,
            Self::SetCamera(req) => {
                let view_up = req.view_up.map(|v| point("view_up", v)).transpose()?;
                if view_up.is_some_and(|v| v.length() <= f64::EPSILON) {
                    return Err(ToolError::validation("view_up must not be a zero vector"));
                }
                if let Some(zoom) = req.zoom {
                    if !(zoom.is_finite() && zoom > 0.0) {
                        return Err(ToolError::validation(format!(
                            "zoom must be a positive number, got {zoom}"
                        )));
                    }
                }
                Command::SetCamera(CameraUpdate {
                    position: req.position.map(|v| point("position", v)).transpose()?,
                    focal_point: req
                        .focal_point
                        .map(|v| point("focal_point", v))
                        .transpose()?,
                    view_up,
                    zoom: req.zoom,
                })
            }
            Self::RotateCamera(req) => Command::Rotate(Rotation {
                azimuth: angle("azimuth", req.azimuth)?,
                elevation: angle("elevation", req.elevation)?,
                roll: angle("roll", req.roll)?,
            }),
            Self::ResetView => Command::ResetView,
            Self::TakeScreenshot(req) => Command::Screenshot(screenshot_options(req, config)?),
            Self::SetModelColor(req) => Command::SetColor {
                name: model_name(req.name)?,
                color: req.color.resolve()?,
            },
            Self::SetModelOpacity(req) => {
                if !(req.opacity.is_finite() && (0.0..=1.0).contains(&req.opacity)) {
                    return Err(ToolError::validation(format!(
                        "Opacity must be between 0.0 and 1.0, got {}",
                        req.opacity
                    )));
                }
                Command::SetOpacity {
                    name: model_name(req.name)?,
                    opacity: req.opacity as f32,
                }
            }
            Self::SetModelTransform(req) => {
                if let Some(scale) = req.scale {
                    if !(scale.is_finite() && scale > 0.0) {
                        return Err(ToolError::validation(format!(
                            "Scale must be a positive number, got {scale}"
                        )));
                    }
                }
                Command::SetTransform {
                    name: model_name(req.name)?,
                    update: TransformUpdate {
                        translation: req
                            .translation
                            .map(|v| point("translation", v).map(|_| v))
                            .transpose()?,
                        rotation: req
                            .rotation
                            .map(|v| point("rotation", v).map(|_| v))
                            .transpose()?,
                        scale: req.scale,
                    },
                }
            }
            Self::MeasureDistance(req) => Command::Measure {
                a: point("point_a", req.point_a)?,
                b: point("point_b", req.point_b)?,
                model: req.model.map(model_name).transpose()?,
            },
        };
        Ok(command)
    }
}

/// A validated operation against the session
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Load { path: PathBuf, name: Option<String> },
    List,
    Info { name: String },
    Remove { name: String },
    Clear,
    SetCamera(CameraUpdate),
    Rotate(Rotation),
    ResetView,
    Screenshot(ScreenshotOptions),
    SetColor { name: String, color: Rgb },
    SetOpacity { name: String, opacity: f32 },
    SetTransform { name: String, update: TransformUpdate },
    Measure { a: DVec3, b: DVec3, model: Option<String> },
}

/// Lifecycle phase of one tool call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Received,
    Validated,
    Executed,
    Responded,
    Errored,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::Validated => "validated",
            Self::Executed => "executed",
            Self::Responded => "responded",
            Self::Errored => "errored",
        };
        write!(f, "{name}")
    }
}

/// Successful result of executing a command
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub result: Value,
    /// PNG bytes to return as inline image content
    pub image_png: Option<Vec<u8>>,
}

impl ToolOutput {
    fn json<T: Serialize>(value: &T) -> Self {
        Self {
            result: serde_json::to_value(value).unwrap_or_default(),
            image_png: None,
        }
    }
}

/// Ok or error body of a response
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Ok { result: Value },
    Error { error: ToolError },
}

/// Uniform reply to every tool call
#[derive(Debug, Clone, Serialize)]
pub struct ToolResponse {
    pub tool: String,
    #[serde(flatten)]
    pub outcome: Outcome,
    #[serde(skip)]
    pub image_png: Option<Vec<u8>>,
}

impl ToolResponse {
    pub fn ok(tool: impl Into<String>, output: ToolOutput) -> Self {
        Self {
            tool: tool.into(),
            outcome: Outcome::Ok {
                result: output.result,
            },
            image_png: output.image_png,
        }
    }

    pub fn error(tool: impl Into<String>, error: ToolError) -> Self {
        Self {
            tool: tool.into(),
            outcome: Outcome::Error { error },
            image_png: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self.outcome, Outcome::Ok { .. })
    }

    pub fn result(&self) -> Option<&Value> {
        match &self.outcome {
            Outcome::Ok { result } => Some(result),
            Outcome::Error { .. } => None,
        }
    }

    pub fn error_info(&self) -> Option<&ToolError> {
        match &self.outcome {
            Outcome::Ok { .. } => None,
            Outcome::Error { error } => Some(error),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Routes validated commands to the session components
#[derive(Debug, Clone)]
pub struct Dispatcher {
    session: SessionHandle,
}

impl Dispatcher {
    pub fn new(session: SessionHandle) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Run one tool call to completion
    pub async fn dispatch(&self, call: ToolCall) -> ToolResponse {
        let tool = call.name();
        debug!(tool, phase = %Phase::Received, "Tool call");

        let command = match call.validate(self.session.config()) {
            Ok(command) => command,
            Err(err) => return Self::failed(tool, err.at_stage(Stage::Validation)),
        };
        debug!(tool, phase = %Phase::Validated, "Tool call");

        let output = match self.execute(command).await {
            Ok(output) => output,
            Err(err) => return Self::failed(tool, err.at_stage(Stage::Execution)),
        };
        debug!(tool, phase = %Phase::Executed, "Tool call");

        let response = ToolResponse::ok(tool, output);
        debug!(tool, phase = %Phase::Responded, "Tool call");
        response
    }

    /// Parse a `{"tool": ..., "arguments": ...}` object and dispatch it
    pub async fn dispatch_json(&self, call: Value) -> ToolResponse {
        let tool = call
            .get("tool")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        match serde_json::from_value::<ToolCall>(call) {
            Ok(call) => self.dispatch(call).await,
            Err(e) => Self::failed(
                &tool,
                ToolError::validation(format!("Invalid tool call: {e}"))
                    .at_stage(Stage::Validation),
            ),
        }
    }

    fn failed(tool: &str, error: ToolError) -> ToolResponse {
        warn!(
            tool,
            phase = %Phase::Errored,
            kind = %error.kind,
            stage = ?error.stage,
            "{}",
            error.message
        );
        ToolResponse::error(tool, error)
    }

    async fn execute(&self, command: Command) -> ToolResult<ToolOutput> {
        let session = &self.session;
        match command {
            Command::Load { path, name } => {
                let loader = Arc::clone(session.loader());
                let source = path.clone();
                let load = move || backend::load_mesh(loader.as_ref(), &source);
                let mesh = tokio::task::spawn_blocking(load)
                    .await
                    .map_err(|e| ToolError::load(format!("Load task failed: {e}")))??;
                let info = session.write(|s| {
                    s.registry_mut()
                        .register(&path, mesh, name.as_deref())
                        .map(Model::info)
                })?;
                Ok(ToolOutput::json(&info))
            }
            Command::List => {
                let models = session.read(|s| s.registry().list());
                Ok(ToolOutput::json(&json!({
                    "count": models.len(),
                    "models": models,
                })))
            }
            Command::Info { name } => {
                let info = session.read(|s| s.registry().get_info(&name))?;
                Ok(ToolOutput::json(&info))
            }
            Command::Remove { name } => {
                let remaining = session.write(|s| {
                    s.registry_mut().remove(&name)?;
                    Ok::<_, ToolError>(s.registry().names())
                })?;
                Ok(ToolOutput::json(&json!({
                    "removed": name,
                    "remaining": remaining,
                })))
            }
            Command::Clear => {
                let cleared = session.write(|s| s.registry_mut().clear());
                Ok(ToolOutput::json(&json!({ "cleared": cleared })))
            }
            Command::SetCamera(update) => {
                let state = session.write(|s| s.camera_mut().set_camera(&update))?;
                Ok(ToolOutput::json(&state.summary()))
            }
            Command::Rotate(rotation) => {
                let state = session.write(|s| s.camera_mut().rotate(&rotation))?;
                Ok(ToolOutput::json(&state.summary()))
            }
            Command::ResetView => {
                let state = session.write(|s| s.camera_mut().reset());
                Ok(ToolOutput::json(&state.summary()))
            }
            Command::Screenshot(options) => {
                let mut result = render::render(session, options).await?;
                let png = result.png.take();
                Ok(ToolOutput {
                    image_png: png,
                    ..ToolOutput::json(&result)
                })
            }
            Command::SetColor { name, color } => {
                let info = session.write(|s| {
                    s.registry_mut()
                        .set_color(&name, color)
                        .map(Model::info)
                })?;
                Ok(ToolOutput::json(&info))
            }
            Command::SetOpacity { name, opacity } => {
                let info = session.write(|s| {
                    s.registry_mut()
                        .set_opacity(&name, opacity)
                        .map(Model::info)
                })?;
                Ok(ToolOutput::json(&info))
            }
            Command::SetTransform { name, update } => {
                let info = session.write(|s| {
                    s.registry_mut()
                        .set_transform(&name, &update)
                        .map(Model::info)
                })?;
                Ok(ToolOutput::json(&info))
            }
            Command::Measure { a, b, model } => {
                let measurement = session.read(|s| match &model {
                    Some(name) => {
                        let model = s.registry().get(name)?;
                        measure::measure(a, b, Some((model.name(), model.transform())))
                    }
                    None => measure::measure(a, b, None),
                })?;
                Ok(ToolOutput::json(&measurement))
            }
        }
    }
}

fn model_name(name: String) -> ToolResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ToolError::validation("Model name must not be empty"));
    }
    Ok(trimmed.to_string())
}

fn point(label: &str, v: [f64; 3]) -> ToolResult<DVec3> {
    let p = DVec3::from_array(v);
    if p.is_finite() {
        Ok(p)
    } else {
        Err(ToolError::validation(format!(
            "{label} must contain finite numbers, got {v:?}"
        )))
    }
}

fn angle(label: &str, degrees: f64) -> ToolResult<f64> {
    if degrees.is_finite() {
        Ok(degrees)
    } else {
        Err(ToolError::validation(format!(
            "{label} must be a finite number of degrees"
        )))
    }
}

fn dimension(label: &str, value: Option<u32>, default: u32) -> ToolResult<u32> {
    let value = value.unwrap_or(default);
    if value == 0 || value > MAX_DIMENSION {
        return Err(ToolError::validation(format!(
            "{label} must be between 1 and {MAX_DIMENSION}, got {value}"
        )));
    }
    Ok(value)
}

fn screenshot_options(
    req: TakeScreenshotRequest,
    config: &ServerConfig,
) -> ToolResult<ScreenshotOptions> {
    let output_path = req.output_path.trim();
    if output_path.is_empty() {
        return Err(ToolError::validation("output_path must not be empty"));
    }
    let output_path = PathBuf::from(output_path);
    match ImageFormat::from_path(&output_path) {
        Ok(format) if format.writing_enabled() => {}
        _ => {
            return Err(ToolError::validation(format!(
                "Unsupported image format for '{}'. Use .png, .jpg, .bmp or .tiff",
                output_path.display()
            )));
        }
    }

    let models = req
        .models
        .map(|names| names.into_iter().map(model_name).collect::<ToolResult<Vec<_>>>())
        .transpose()?;

    Ok(ScreenshotOptions {
        output_path,
        models,
        width: dimension("width", req.width, config.render_width)?,
        height: dimension("height", req.height, config.render_height)?,
        background: req
            .background_color
            .map(|c| c.resolve())
            .transpose()?
            .unwrap_or(config.background()),
        show_axes: req.show_axes.unwrap_or(config.show_axes),
        include_image: req.include_image,
    })
}
