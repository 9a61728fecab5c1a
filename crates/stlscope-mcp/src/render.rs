//! Render bridge
//!
//! Screenshots run in two steps. [`snapshot`] copies the camera and the
//! selected models (sharing their mesh handles) into an immutable
//! [`RenderScene`] while the session lock is held. [`render`] then drops the
//! lock and rasterizes on a blocking worker, so later tool calls cannot
//! change what is being drawn.

use std::path::PathBuf;

use serde::Serialize;
use stlscope_render::{RenderItem, RenderScene, encode_png, save_image};
use tracing::info;

use crate::color::Rgb;
use crate::error::{ToolError, ToolResult};
use crate::state::{Session, SessionHandle};

/// Validated screenshot request
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenshotOptions {
    pub output_path: PathBuf,
    /// `None` renders every model
    pub models: Option<Vec<String>>,
    pub width: u32,
    pub height: u32,
    pub background: Rgb,
    pub show_axes: bool,
    /// Return the PNG bytes alongside the written file
    pub include_image: bool,
}

/// Outcome of a successful screenshot
#[derive(Debug, Clone, Serialize)]
pub struct RenderResult {
    pub output_path: String,
    pub width: u32,
    pub height: u32,
    pub models: Vec<String>,
    #[serde(skip)]
    pub png: Option<Vec<u8>>,
}

/// Copy everything a render needs out of the session
pub fn snapshot(session: &Session, options: &ScreenshotOptions) -> ToolResult<RenderScene> {
    let registry = session.registry();

    let names: Vec<String> = match &options.models {
        Some(requested) if !requested.is_empty() => {
            let mut names = Vec::with_capacity(requested.len());
            for name in requested {
                registry.get(name)?;
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
            names
        }
        _ => registry.names(),
    };
    if names.is_empty() {
        return Err(ToolError::validation("No models loaded"));
    }

    let mut items = Vec::with_capacity(names.len());
    for name in &names {
        let model = registry.get(name)?;
        items.push(RenderItem {
            name: name.clone(),
            mesh: model.mesh().clone(),
            color: model.color().0,
            opacity: model.opacity(),
            transform: model.transform().matrix_f32(),
        });
    }

    let camera = session.camera().state().to_render_camera();
    let mut scene = RenderScene::new(camera, options.width, options.height);
    scene.items = items;
    scene.background = options.background.0;
    scene.show_axes = options.show_axes;
    Ok(scene)
}

/// Snapshot the session, then rasterize and write the image off the lock
pub async fn render(
    handle: &SessionHandle,
    options: ScreenshotOptions,
) -> ToolResult<RenderResult> {
    let scene = handle.read(|session| snapshot(session, &options))?;
    let renderer = handle.renderer().clone();

    tokio::task::spawn_blocking(move || -> ToolResult<RenderResult> {
        let image = renderer.render(&scene)?;
        save_image(&image, &options.output_path)?;
        let png = if options.include_image {
            Some(encode_png(&image)?)
        } else {
            None
        };

        let models: Vec<String> = scene.items.into_iter().map(|item| item.name).collect();
        info!(
            path = %options.output_path.display(),
            width = options.width,
            height = options.height,
            models = models.len(),
            "Saved screenshot"
        );
        Ok(RenderResult {
            output_path: options.output_path.display().to_string(),
            width: options.width,
            height: options.height,
            models,
            png,
        })
    })
    .await
    .map_err(|e| ToolError::render(format!("Render task failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::error::ErrorKind;
    use std::path::Path;
    use stlscope_core::mesh::primitives;

    fn options(models: Option<Vec<String>>) -> ScreenshotOptions {
        ScreenshotOptions {
            output_path: PathBuf::from("unused.png"),
            models,
            width: 64,
            height: 48,
            background: Rgb::WHITE,
            show_axes: false,
            include_image: false,
        }
    }

    fn session_with(names: &[&str]) -> Session {
        let mut session = Session::new(&ServerConfig::default());
        for name in names {
            session
                .registry_mut()
                .register(Path::new("part.stl"), primitives::cube(10.0), Some(name))
                .unwrap();
        }
        session
    }

    #[test]
    fn test_empty_session_is_validation_error() {
        let session = session_with(&[]);
        let err = snapshot(&session, &options(None)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn test_unknown_model_is_not_found() {
        let session = session_with(&["a"]);
        let err = snapshot(&session, &options(Some(vec!["b".into()]))).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[test]
    fn test_selection_deduplicated() {
        let session = session_with(&["a", "b"]);
        let scene = snapshot(&session, &options(Some(vec!["b".into(), "b".into()]))).unwrap();
        assert_eq!(scene.items.len(), 1);
        assert_eq!(scene.items[0].name, "b");
    }

    #[test]
    fn test_snapshot_outlives_removal() {
        let mut session = session_with(&["a"]);
        let scene = snapshot(&session, &options(None)).unwrap();

        session.registry_mut().remove("a").unwrap();

        assert_eq!(scene.items.len(), 1);
        assert_eq!(scene.items[0].mesh.triangle_count(), 12);
    }
}
