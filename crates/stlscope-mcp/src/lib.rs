//! Stlscope MCP Server - Model Context Protocol server for inspecting STL models
//!
//! This crate keeps a small in-memory scene for one client and exposes it as
//! MCP tools. Agents can:
//!
//! - Load binary or ASCII STL files as named models
//! - Style and place models (color, opacity, translation/rotation/scale)
//! - Drive a single shared camera (absolute placement, orbit, reset)
//! - Measure distances in world or model coordinates
//! - Render screenshots to disk, optionally returned inline as PNG
//!
//! ## Workflow
//!
//! 1. `load_stl` - Load one or more models
//! 2. `set_camera` / `rotate_camera` - Frame the view
//! 3. `take_screenshot` - See what the scene looks like
//! 4. `measure_distance` - Check dimensions
//!
//! Every tool replies with the same JSON envelope, see [`dispatch::ToolResponse`].

pub mod backend;
pub mod camera;
pub mod color;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod measure;
pub mod registry;
pub mod render;
pub mod state;
pub mod tools;

use base64::Engine as _;
use rmcp::{
    ErrorData as McpError,
    ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{
        CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
    },
    tool, tool_handler, tool_router,
};

use crate::dispatch::{Dispatcher, ToolCall, ToolResponse};
use crate::state::SessionHandle;
use crate::tools::{
    camera::{RotateCameraRequest, SetCameraRequest},
    measure::MeasureDistanceRequest,
    model::{
        LoadStlRequest, ModelNameRequest, SetModelColorRequest, SetModelOpacityRequest,
        SetModelTransformRequest,
    },
    render::TakeScreenshotRequest,
};

// Re-export for binary
pub use config::ServerConfig;
pub use error::{ErrorKind, Stage, ToolError};
pub use rmcp;

/// The Stlscope MCP service
///
/// Every tool builds a [`ToolCall`] and hands it to the [`Dispatcher`]. Tool
/// failures come back as `CallToolResult`s flagged as errors, never as
/// protocol errors.
#[derive(Clone)]
pub struct StlscopeMcpService {
    dispatcher: Dispatcher,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl StlscopeMcpService {
    /// Create a new MCP service over the given session
    pub fn new(session: SessionHandle) -> Self {
        Self {
            dispatcher: Dispatcher::new(session),
            tool_router: Self::tool_router(),
        }
    }

    // ========================================================================
    // Model Tools
    // ========================================================================

    #[tool(description = "Load an STL file (binary or ASCII) into the scene. The model is named after the file unless a name is given; taken names get a suffix like \"_1\". Returns the model's name, face/vertex counts, bounds, volume and center.")]
    async fn load_stl(
        &self,
        params: Parameters<LoadStlRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.call(ToolCall::LoadStl(params.0)).await
    }

    #[tool(description = "List all loaded models, sorted by name, with bounds, face/vertex counts, color and opacity.")]
    async fn list_models(&self) -> Result<CallToolResult, McpError> {
        self.call(ToolCall::ListModels).await
    }

    #[tool(description = "Get detailed information about a loaded model: source file, counts, bounds (local and world), volume, surface area, center, diagonal length, color, opacity and transform.")]
    async fn get_model_info(
        &self,
        params: Parameters<ModelNameRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.call(ToolCall::GetModelInfo(params.0)).await
    }

    #[tool(description = "Remove a model from the scene by name.")]
    async fn remove_model(
        &self,
        params: Parameters<ModelNameRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.call(ToolCall::RemoveModel(params.0)).await
    }

    #[tool(description = "Remove all models from the scene. The camera is left as it is.")]
    async fn clear_all_models(&self) -> Result<CallToolResult, McpError> {
        self.call(ToolCall::ClearAllModels).await
    }

    // ========================================================================
    // Camera Tools
    // ========================================================================

    #[tool(description = "Set the camera. Any of position, focal_point, view_up and zoom may be given; the rest keep their current values. The world up axis is +Z. Fails without changing anything if position equals focal_point or view_up is parallel to the view direction.")]
    async fn set_camera(
        &self,
        params: Parameters<SetCameraRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.call(ToolCall::SetCamera(params.0)).await
    }

    #[tool(description = "Orbit the camera around its focal point by relative angles in degrees. Applied in order: azimuth (around the world Z axis), elevation (tilt up/down), roll (twist around the view direction).")]
    async fn rotate_camera(
        &self,
        params: Parameters<RotateCameraRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.call(ToolCall::RotateCamera(params.0)).await
    }

    #[tool(description = "Reset the camera to the default view: position [100, -100, 100] looking at the origin with +Z up.")]
    async fn reset_view(&self) -> Result<CallToolResult, McpError> {
        self.call(ToolCall::ResetView).await
    }

    // ========================================================================
    // Rendering Tools
    // ========================================================================

    #[tool(description = "Render the scene (or selected models) from the current camera and save it to output_path. The file extension picks the format. Set include_image to also get the PNG back inline.")]
    async fn take_screenshot(
        &self,
        params: Parameters<TakeScreenshotRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.call(ToolCall::TakeScreenshot(params.0)).await
    }

    // ========================================================================
    // Styling Tools
    // ========================================================================

    #[tool(description = "Set a model's color as [r, g, b] (0.0-1.0), a hex code like \"#ff8800\", or a color name (red, green, blue, yellow, orange, purple, cyan, magenta, pink, brown, gold, silver, white, black, gray, lightgray).")]
    async fn set_model_color(
        &self,
        params: Parameters<SetModelColorRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.call(ToolCall::SetModelColor(params.0)).await
    }

    #[tool(description = "Set a model's opacity from 0.0 (invisible) to 1.0 (opaque).")]
    async fn set_model_opacity(
        &self,
        params: Parameters<SetModelOpacityRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.call(ToolCall::SetModelOpacity(params.0)).await
    }

    #[tool(description = "Move, rotate (Euler XYZ degrees) or uniformly scale a model. Omitted fields keep their current values.")]
    async fn set_model_transform(
        &self,
        params: Parameters<SetModelTransformRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.call(ToolCall::SetModelTransform(params.0)).await
    }

    // ========================================================================
    // Measurement Tools
    // ========================================================================

    #[tool(description = "Measure the straight-line distance between two 3D points in model units. If model is given, the points are in that model's local coordinates and are mapped through its transform first.")]
    async fn measure_distance(
        &self,
        params: Parameters<MeasureDistanceRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.call(ToolCall::MeasureDistance(params.0)).await
    }
}

impl StlscopeMcpService {
    async fn call(&self, call: ToolCall) -> Result<CallToolResult, McpError> {
        Ok(into_call_result(&self.dispatcher.dispatch(call).await))
    }
}

/// Convert a tool response into MCP content
///
/// The JSON envelope always comes first; a screenshot PNG follows as image
/// content when one was requested.
pub fn into_call_result(response: &ToolResponse) -> CallToolResult {
    let mut content = vec![Content::text(response.to_json())];
    if let Some(png) = &response.image_png {
        let b64 = base64::engine::general_purpose::STANDARD.encode(png);
        content.push(Content::image(b64, "image/png"));
    }
    if response.is_ok() {
        CallToolResult::success(content)
    } else {
        CallToolResult::error(content)
    }
}

#[tool_handler]
impl ServerHandler for StlscopeMcpService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "stlscope-mcp".to_string(),
                title: Some("Stlscope STL Viewer".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Stlscope MCP server for viewing and measuring STL models. \
                 \n\nWorkflow:\n\
                 1. load_stl() - Load one or more STL files\n\
                 2. set_camera() / rotate_camera() - Frame the view (+Z is up)\n\
                 3. take_screenshot() - Render the scene to an image\n\
                 4. measure_distance() - Check dimensions in model units\n\n\
                 Every tool returns {\"status\": \"ok\"|\"error\", \"tool\", \
                 \"result\"|\"error\"}.\n\
                 Use list_models() to see what is loaded."
                    .to_string(),
            ),
        }
    }
}
