//! Tunable constants for the canvas, collision resolution and auto-layout

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::geometry::BoundingBox;

/// Errors that can occur when loading a canvas configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value for '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    canvas: Option<TomlCanvas>,
    collision: Option<TomlCollision>,
    layout: Option<TomlLayout>,
    connector: Option<TomlConnector>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlCanvas {
    width: Option<f64>,
    height: Option<f64>,
    output_zone_fraction: Option<f64>,
    output_zone_aspect: Option<f64>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlCollision {
    step: Option<f64>,
    drag_bias: Option<f64>,
    relayout_bias: Option<f64>,
    max_pushes: Option<usize>,
    max_followup_depth: Option<usize>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlLayout {
    node_spacing: Option<f64>,
    layer_spacing: Option<f64>,
    margin: Option<f64>,
    preserve_aspect: Option<bool>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlConnector {
    hit_padding: Option<f64>,
}

/// Every tunable the canvas core uses
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasConfig {
    /// Canvas size in pixels
    pub width: f64,
    pub height: f64,

    /// Output zone width as a fraction of the canvas width
    pub output_zone_fraction: f64,

    /// Output zone height relative to its width
    pub output_zone_aspect: f64,

    /// Distance two colliding shapes are pushed apart per step
    pub step: f64,

    /// Share of each push taken by the obstacle while dragging
    pub drag_bias: f64,

    /// Share of each push taken by the obstacle during auto-layout cleanup
    pub relayout_bias: f64,

    /// Pushes allowed for a single shape before giving up
    pub max_pushes: usize,

    /// How deep knock-on collisions are followed
    pub max_followup_depth: usize,

    /// Gap between nodes of one auto-layout layer, along the isometric x axis
    pub node_spacing: f64,

    /// Gap between auto-layout layers, along the isometric y axis
    pub layer_spacing: f64,

    /// Border kept clear when auto-layout fits the diagram to the canvas
    pub margin: f64,

    /// Scale both axes equally when fitting
    pub preserve_aspect: bool,

    /// Extra distance around magnets and cables that still counts as a hit
    pub hit_padding: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            output_zone_fraction: 0.2,
            output_zone_aspect: 0.5,
            step: 5.0,
            drag_bias: 0.75,
            relayout_bias: 0.5,
            max_pushes: 500,
            max_followup_depth: 32,
            node_spacing: 150.0,
            layer_spacing: 120.0,
            margin: 40.0,
            preserve_aspect: true,
            hit_padding: 5.0,
        }
    }
}

impl CanvasConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string; absent keys keep their defaults
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let parsed: TomlConfig = toml::from_str(content)?;
        let mut config = Self::default();

        if let Some(canvas) = parsed.canvas {
            config.width = canvas.width.unwrap_or(config.width);
            config.height = canvas.height.unwrap_or(config.height);
            config.output_zone_fraction = canvas
                .output_zone_fraction
                .unwrap_or(config.output_zone_fraction);
            config.output_zone_aspect = canvas
                .output_zone_aspect
                .unwrap_or(config.output_zone_aspect);
        }
        if let Some(collision) = parsed.collision {
            config.step = collision.step.unwrap_or(config.step);
            config.drag_bias = collision.drag_bias.unwrap_or(config.drag_bias);
            config.relayout_bias = collision.relayout_bias.unwrap_or(config.relayout_bias);
            config.max_pushes = collision.max_pushes.unwrap_or(config.max_pushes);
            config.max_followup_depth = collision
                .max_followup_depth
                .unwrap_or(config.max_followup_depth);
        }
        if let Some(layout) = parsed.layout {
            config.node_spacing = layout.node_spacing.unwrap_or(config.node_spacing);
            config.layer_spacing = layout.layer_spacing.unwrap_or(config.layer_spacing);
            config.margin = layout.margin.unwrap_or(config.margin);
            config.preserve_aspect = layout.preserve_aspect.unwrap_or(config.preserve_aspect);
        }
        if let Some(connector) = parsed.connector {
            config.hit_padding = connector.hit_padding.unwrap_or(config.hit_padding);
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values the algorithms cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(ConfigError::invalid("canvas", "width and height must be positive"));
        }
        if !(0.0..=1.0).contains(&self.output_zone_fraction) {
            return Err(ConfigError::invalid(
                "output_zone_fraction",
                "must lie between 0 and 1",
            ));
        }
        for (key, bias) in [("drag_bias", self.drag_bias), ("relayout_bias", self.relayout_bias)] {
            if !(0.0..=1.0).contains(&bias) {
                return Err(ConfigError::invalid(key, "must lie between 0 and 1"));
            }
        }
        if !(self.step > 0.0) {
            return Err(ConfigError::invalid("step", "must be positive"));
        }
        if 2.0 * self.margin >= self.width.min(self.height) {
            return Err(ConfigError::invalid("margin", "leaves no room on the canvas"));
        }
        Ok(())
    }

    /// Set the canvas size
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the collision push distance
    pub fn with_step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    /// Set the obstacle share used while dragging
    pub fn with_drag_bias(mut self, bias: f64) -> Self {
        self.drag_bias = bias;
        self
    }

    /// Set the obstacle share used after auto-layout
    pub fn with_relayout_bias(mut self, bias: f64) -> Self {
        self.relayout_bias = bias;
        self
    }

    /// Cap the pushes of one collision pass
    pub fn with_max_pushes(mut self, max_pushes: usize) -> Self {
        self.max_pushes = max_pushes;
        self
    }

    pub fn with_max_followup_depth(mut self, depth: usize) -> Self {
        self.max_followup_depth = depth;
        self
    }

    /// Set node and layer spacing for auto-layout
    pub fn with_spacing(mut self, node_spacing: f64, layer_spacing: f64) -> Self {
        self.node_spacing = node_spacing;
        self.layer_spacing = layer_spacing;
        self
    }

    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_preserve_aspect(mut self, preserve: bool) -> Self {
        self.preserve_aspect = preserve;
        self
    }

    pub fn with_hit_padding(mut self, padding: f64) -> Self {
        self.hit_padding = padding;
        self
    }

    /// The whole drawable area
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::new(0.0, 0.0, self.width, self.height)
    }

    /// The output zone, anchored to the top-right corner
    pub fn output_zone_bounds(&self) -> BoundingBox {
        let width = self.width * self.output_zone_fraction;
        let height = width * self.output_zone_aspect;
        BoundingBox::new(self.width - width, 0.0, width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CanvasConfig::default();
        assert_eq!((config.width, config.height), (800.0, 600.0));
        assert_eq!(config.step, 5.0);
        assert_eq!(config.drag_bias, 0.75);
        assert_eq!(config.relayout_bias, 0.5);
        assert_eq!(config.hit_padding, 5.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = CanvasConfig::new()
            .with_size(1024.0, 768.0)
            .with_spacing(100.0, 80.0)
            .with_preserve_aspect(false);

        assert_eq!(config.width, 1024.0);
        assert_eq!(config.node_spacing, 100.0);
        assert_eq!(config.layer_spacing, 80.0);
        assert!(!config.preserve_aspect);
    }

    #[test]
    fn test_output_zone_top_right() {
        let zone = CanvasConfig::default().output_zone_bounds();
        assert_eq!(zone, BoundingBox::new(640.0, 0.0, 160.0, 80.0));
    }

    #[test]
    fn test_from_str_keeps_defaults() {
        let config = CanvasConfig::from_str(
            r#"
[canvas]
width = 1200

[collision]
drag_bias = 0.6
"#,
        )
        .unwrap();
        assert_eq!(config.width, 1200.0);
        assert_eq!(config.height, 600.0);
        assert_eq!(config.drag_bias, 0.6);
        assert_eq!(config.relayout_bias, 0.5);
    }

    #[test]
    fn test_from_str_empty() {
        assert_eq!(CanvasConfig::from_str("").unwrap(), CanvasConfig::default());
    }

    #[test]
    fn test_from_str_rejects_bad_values() {
        let err = CanvasConfig::from_str("[collision]\nrelayout_bias = 1.5\n").unwrap_err();
        assert!(err.to_string().contains("relayout_bias"));

        let err = CanvasConfig::from_str("[canvas]\ncolour = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
