//! Session state
//!
//! A [`Session`] is the registry plus the camera. The MCP service owns a
//! cloneable [`SessionHandle`] that puts the session behind a
//! `parking_lot::Mutex` together with the backends and startup config.
//! Callers hold the lock only for in-memory work; parsing and rasterizing
//! happen outside it.

use std::sync::Arc;

use parking_lot::Mutex;
use stlscope_render::SoftwareRenderer;

use crate::backend::{GeometryLoader, RenderEngine, StlLoader};
use crate::camera::CameraController;
use crate::config::ServerConfig;
use crate::registry::ModelRegistry;

/// Models and camera for one client session
#[derive(Debug, Default)]
pub struct Session {
    registry: ModelRegistry,
    camera: CameraController,
}

impl Session {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            registry: ModelRegistry::new(config.model_color()),
            camera: CameraController::new(),
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ModelRegistry {
        &mut self.registry
    }

    pub fn camera(&self) -> &CameraController {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraController {
        &mut self.camera
    }
}

/// Shared handle to the session and its collaborators
#[derive(Clone)]
pub struct SessionHandle {
    session: Arc<Mutex<Session>>,
    loader: Arc<dyn GeometryLoader>,
    renderer: Arc<dyn RenderEngine>,
    config: Arc<ServerConfig>,
}

impl SessionHandle {
    /// Create a session with the STL loader and software renderer
    pub fn new(config: ServerConfig) -> Self {
        Self::with_backends(
            config,
            Arc::new(StlLoader),
            Arc::new(SoftwareRenderer::default()),
        )
    }

    pub fn with_backends(
        config: ServerConfig,
        loader: Arc<dyn GeometryLoader>,
        renderer: Arc<dyn RenderEngine>,
    ) -> Self {
        Self {
            session: Arc::new(Mutex::new(Session::new(&config))),
            loader,
            renderer,
            config: Arc::new(config),
        }
    }

    /// Run a closure with shared access to the session
    pub fn read<R>(&self, f: impl FnOnce(&Session) -> R) -> R {
        f(&self.session.lock())
    }

    /// Run a closure with exclusive access to the session
    pub fn write<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        f(&mut self.session.lock())
    }

    pub fn loader(&self) -> &Arc<dyn GeometryLoader> {
        &self.loader
    }

    pub fn renderer(&self) -> &Arc<dyn RenderEngine> {
        &self.renderer
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("session", &self.session)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
