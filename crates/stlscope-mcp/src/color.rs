//! Colors accepted by the styling and screenshot tools

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{ToolError, ToolResult};

/// Linear RGB color with components in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Rgb(pub [f32; 3]);

impl Rgb {
    pub const WHITE: Self = Self([1.0, 1.0, 1.0]);
    /// Default model color
    pub const NEUTRAL: Self = Self([0.75, 0.75, 0.78]);

    /// Build from components, rejecting anything outside [0, 1]
    pub fn new(rgb: [f32; 3]) -> ToolResult<Self> {
        if rgb.iter().all(|c| (0.0..=1.0).contains(c)) {
            Ok(Self(rgb))
        } else {
            Err(ToolError::validation(format!(
                "Color components must be between 0.0 and 1.0, got {rgb:?}"
            )))
        }
    }

    /// Parse a color name or a `#RRGGBB` hex code
    pub fn parse(s: &str) -> ToolResult<Self> {
        let s = s.trim();
        if let Some(rgb) = Self::named(s) {
            return Ok(rgb);
        }
        Self::from_hex(s).ok_or_else(|| {
            ToolError::validation(format!(
                "Unknown color '{}'. Use [r, g, b] in 0..1, a hex code like '#ff8800', \
                 or one of: {}",
                s,
                Self::names().join(", ")
            ))
        })
    }

    fn from_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self([
            f32::from(channel(0)?) / 255.0,
            f32::from(channel(2)?) / 255.0,
            f32::from(channel(4)?) / 255.0,
        ]))
    }

    fn named(s: &str) -> Option<Self> {
        let rgb = match s.to_lowercase().as_str() {
            "white" => [1.0, 1.0, 1.0],
            "black" => [0.0, 0.0, 0.0],
            "gray" | "grey" => [0.5, 0.5, 0.5],
            "lightgray" | "lightgrey" => [0.83, 0.83, 0.83],
            "red" => [1.0, 0.0, 0.0],
            "green" => [0.0, 0.5, 0.0],
            "blue" => [0.0, 0.0, 1.0],
            "yellow" => [1.0, 1.0, 0.0],
            "orange" => [1.0, 0.65, 0.0],
            "purple" => [0.5, 0.0, 0.5],
            "cyan" => [0.0, 1.0, 1.0],
            "magenta" => [1.0, 0.0, 1.0],
            "pink" => [1.0, 0.75, 0.8],
            "brown" => [0.65, 0.16, 0.16],
            "gold" => [1.0, 0.84, 0.0],
            "silver" => [0.75, 0.75, 0.75],
            _ => return None,
        };
        Some(Self(rgb))
    }

    /// Get all accepted color names
    pub fn names() -> &'static [&'static str] {
        &[
            "white", "black", "gray", "lightgray", "red", "green", "blue", "yellow", "orange",
            "purple", "cyan", "magenta", "pink", "brown", "gold", "silver",
        ]
    }
}

/// A color as sent by a client: `[r, g, b]` in 0..1, a name, or a hex code
#[derive(Debug, Clone, PartialEq, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ColorSpec {
    /// RGB components between 0.0 and 1.0
    Components([f32; 3]),
    /// Color name (e.g. "red") or hex code (e.g. "#ff8800")
    Text(String),
}

impl ColorSpec {
    pub fn resolve(&self) -> ToolResult<Rgb> {
        match self {
            Self::Components(rgb) => Rgb::new(*rgb),
            Self::Text(text) => Rgb::parse(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names_case_insensitive() {
        assert_eq!(Rgb::parse("RED").unwrap(), Rgb([1.0, 0.0, 0.0]));
        assert_eq!(Rgb::parse(" grey ").unwrap(), Rgb([0.5, 0.5, 0.5]));
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(Rgb::parse("#ff0000").unwrap(), Rgb([1.0, 0.0, 0.0]));
        assert_eq!(Rgb::parse("00ff00").unwrap(), Rgb([0.0, 1.0, 0.0]));
        assert!(Rgb::parse("#ff00").is_err());
        assert!(Rgb::parse("#gg0000").is_err());
    }

    #[test]
    fn test_signed_hex_rejected() {
        assert!(Rgb::parse("+f+f+f").is_err());
        assert!(Rgb::parse("#+f+f+f").is_err());
        assert!(Rgb::parse("#-1-1-1").is_err());
    }

    #[test]
    fn test_components_out_of_range() {
        let err = ColorSpec::Components([1.5, 0.0, 0.0]).resolve().unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Validation);
    }

    #[test]
    fn test_deserialize_either_form() {
        let spec: ColorSpec = serde_json::from_str("[0.1, 0.2, 0.3]").unwrap();
        assert_eq!(spec, ColorSpec::Components([0.1, 0.2, 0.3]));

        let spec: ColorSpec = serde_json::from_str("\"blue\"").unwrap();
        assert_eq!(spec.resolve().unwrap(), Rgb([0.0, 0.0, 1.0]));
    }
}
