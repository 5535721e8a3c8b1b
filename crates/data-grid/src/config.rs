use std::path::Path;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum GridConfigError {
    #[error("invalid grid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub page_size: usize,
    /// Number of page buttons shown at once.
    pub page_window: usize,
    pub page_size_options: Vec<usize>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            page_window: 5,
            page_size_options: vec![5, 10, 25, 50, 100],
        }
    }
}

impl GridConfig {
    pub fn from_json_str(s: &str) -> Result<Self, GridConfigError> {
        let config: GridConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read grid config: {}", path.display()))?;
        Self::from_json_str(&contents)
            .with_context(|| format!("failed to parse grid config: {}", path.display()))
    }

    pub fn validate(&self) -> Result<(), GridConfigError> {
        if self.page_size == 0 {
            return Err(GridConfigError::Zero { field: "page_size" });
        }
        if self.page_window == 0 {
            return Err(GridConfigError::Zero {
                field: "page_window",
            });
        }
        if self.page_size_options.contains(&0) {
            return Err(GridConfigError::Zero {
                field: "page_size_options",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_fill_missing_fields() {
        let config = GridConfig::from_json_str(r#"{ "page_size": 25 }"#).unwrap();
        assert_eq!(
            config,
            GridConfig {
                page_size: 25,
                ..GridConfig::default()
            }
        );
    }

    #[test]
    fn zero_sizes_are_rejected() {
        let err = GridConfig::from_json_str(r#"{ "page_window": 0 }"#).unwrap_err();
        assert!(matches!(
            err,
            GridConfigError::Zero {
                field: "page_window"
            }
        ));
        assert!(GridConfig::from_json_str(r#"{ "page_size": -1 }"#).is_err());
    }
}
