//! Tool error classification
//!
//! Every failure a tool call can produce is a [`ToolError`]: a kind, the
//! dispatch stage it was raised in, and a human-readable message. Errors are
//! local to one call and are returned to the client, never raised as
//! protocol errors.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Result alias for session operations
pub type ToolResult<T> = Result<T, ToolError>;

/// What went wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or out-of-range input
    Validation,
    /// Reference to an unknown model name
    NotFound,
    /// Geometry source missing, unreadable or unparsable
    Load,
    /// Rendering or image output failed
    Render,
    /// The operation would leave the camera or a model invalid
    StateInvariant,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validation => "ValidationError",
            Self::NotFound => "NotFoundError",
            Self::Load => "LoadError",
            Self::Render => "RenderError",
            Self::StateInvariant => "StateInvariantError",
        };
        write!(f, "{name}")
    }
}

/// Where in the request lifecycle the error was raised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Argument checks, before the session is touched
    Validation,
    /// While running against the session or a backend
    Execution,
}

/// A classified tool failure
#[derive(Debug, Clone, Error, Serialize)]
#[error("{kind}: {message}")]
pub struct ToolError {
    pub kind: ErrorKind,
    pub stage: Stage,
    pub message: String,
}

impl ToolError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            stage: Stage::Execution,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn load(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Load, message)
    }

    pub fn render(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Render, message)
    }

    pub fn state_invariant(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::StateInvariant, message)
    }

    /// Tag the error with the dispatch stage that produced it
    pub fn at_stage(mut self, stage: Stage) -> Self {
        self.stage = stage;
        self
    }
}

impl From<stlscope_render::RenderError> for ToolError {
    fn from(err: stlscope_render::RenderError) -> Self {
        Self::render(err.to_string())
    }
}
