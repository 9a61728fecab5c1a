//! Server configuration
//!
//! Defaults for rendering and styling that apply when a tool call does not
//! override them. Read once at startup from `{config_dir}/stlscope/config.json`
//! (or an explicit `--config` path) and immutable afterwards.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use stlscope_render::MAX_DIMENSION;

use crate::color::Rgb;

/// Startup defaults for the MCP session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Default screenshot width in pixels
    pub render_width: u32,
    /// Default screenshot height in pixels
    pub render_height: u32,
    /// Default screenshot background (RGB 0-1)
    pub background_color: [f32; 3],
    /// Color given to newly loaded models (RGB 0-1)
    pub default_model_color: [f32; 3],
    /// Whether screenshots draw the world axes by default
    pub show_axes: bool,
    /// tracing filter used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            render_width: 1920,
            render_height: 1080,
            background_color: Rgb::WHITE.0,
            default_model_color: Rgb::NEUTRAL.0,
            show_axes: true,
            log_filter: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Check that every default is usable
    pub fn validate(&self) -> Result<()> {
        for (label, value) in [
            ("render_width", self.render_width),
            ("render_height", self.render_height),
        ] {
            if value == 0 || value > MAX_DIMENSION {
                bail!("{label} must be between 1 and {MAX_DIMENSION}, got {value}");
            }
        }
        for (label, rgb) in [
            ("background_color", self.background_color),
            ("default_model_color", self.default_model_color),
        ] {
            if Rgb::new(rgb).is_err() {
                bail!("{label} components must be between 0.0 and 1.0, got {rgb:?}");
            }
        }
        Ok(())
    }

    pub fn background(&self) -> Rgb {
        Rgb(self.background_color)
    }

    pub fn model_color(&self) -> Rgb {
        Rgb(self.default_model_color)
    }
}

/// Get the path to the default config file
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("stlscope").join("config.json"))
}

/// Load the configuration
///
/// An explicit path must exist and parse. Without one, the default location
/// is tried and a missing or invalid file falls back to defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<ServerConfig> {
    let config = match explicit {
        Some(path) => read_config(path)?,
        None => config_path()
            .filter(|path| path.exists())
            .and_then(|path| read_config(&path).ok())
            .unwrap_or_default(),
    };
    config.validate()?;
    Ok(config)
}

fn read_config(path: &Path) -> Result<ServerConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}
