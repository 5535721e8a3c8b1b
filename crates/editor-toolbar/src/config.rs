use std::path::Path;

use anyhow::Context as _;
use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid toolbar config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("font size bounds are inverted: min {min} > max {max}")]
    InvertedFontSizeBounds { min: u32, max: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloatingToolbarConfig {
    /// Minimum distance kept between the toolbar and the viewport edges.
    pub viewport_margin: f32,
    /// Distance between the selection rectangle and the toolbar.
    pub gap: f32,
    pub fallback_width: f32,
    pub fallback_height: f32,
}

impl Default for FloatingToolbarConfig {
    fn default() -> Self {
        Self {
            viewport_margin: 8.0,
            gap: 8.0,
            fallback_width: 420.0,
            fallback_height: 44.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolbarConfig {
    pub font_options: Vec<String>,
    pub default_font_family: String,
    pub default_font_size: u32,
    pub min_font_size: u32,
    pub max_font_size: u32,
    pub default_text_color: String,
    pub default_highlight: String,
    pub floating: FloatingToolbarConfig,
    /// Pointer travel (`|dx| + |dy|`) before a handle press becomes a drag.
    /// Zero starts the drag on press.
    pub drag_threshold: f32,
}

impl Default for ToolbarConfig {
    fn default() -> Self {
        Self {
            font_options: [
                "Arial",
                "Georgia",
                "Times New Roman",
                "Courier New",
                "Verdana",
                "Trebuchet MS",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            default_font_family: "Arial".to_string(),
            default_font_size: 15,
            min_font_size: 10,
            max_font_size: 72,
            default_text_color: "#000000".to_string(),
            default_highlight: "transparent".to_string(),
            floating: FloatingToolbarConfig::default(),
            drag_threshold: 0.0,
        }
    }
}

impl ToolbarConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: ToolbarConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read toolbar config: {}", path.display()))?;
        Self::from_json_str(&contents)
            .with_context(|| format!("failed to parse toolbar config: {}", path.display()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_font_size > self.max_font_size {
            return Err(ConfigError::InvertedFontSizeBounds {
                min: self.min_font_size,
                max: self.max_font_size,
            });
        }
        Ok(())
    }

    /// Clamps to the font size bounds. Inverted bounds from an unvalidated
    /// config resolve to `max_font_size`.
    pub fn clamp_font_size(&self, size: i64) -> u32 {
        size.max(i64::from(self.min_font_size))
            .min(i64::from(self.max_font_size)) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            ToolbarConfig::from_json_str(r#"{ "max_font_size": 96, "floating": { "gap": 4 } }"#)
                .unwrap();
        assert_eq!(config.max_font_size, 96);
        assert_eq!(config.min_font_size, 10);
        assert_eq!(config.floating.gap, 4.0);
        assert_eq!(config.floating.fallback_width, 420.0);
        assert_eq!(config.font_options.len(), 6);
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let err = ToolbarConfig::from_json_str(r#"{ "min_font_size": 80 }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvertedFontSizeBounds { min: 80, max: 72 }
        ));
    }

    #[test]
    fn clamping_with_inverted_bounds_does_not_panic() {
        let config: ToolbarConfig = serde_json::from_str(r#"{ "min_font_size": 80 }"#).unwrap();
        assert_eq!(config.clamp_font_size(16), 72);
        assert_eq!(config.clamp_font_size(100), 72);
    }

    #[test]
    fn load_reports_the_path() {
        let err = ToolbarConfig::load("/nonexistent/blockdesk-toolbar.json").unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/blockdesk-toolbar.json"));
    }
}
