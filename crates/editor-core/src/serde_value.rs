use serde::{Deserialize, Serialize};

use crate::core::Document;

pub const VALUE_SCHEMA: &str = "blockdesk";
pub const VALUE_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ValueError {
    #[error("invalid document json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unexpected document schema {found:?}")]
    Schema { found: String },
    #[error("document version {found} is not supported")]
    Version { found: u32 },
}

fn schema() -> String {
    VALUE_SCHEMA.to_string()
}

fn version() -> u32 {
    VALUE_VERSION
}

/// Versioned JSON envelope for a persisted document. A missing schema or
/// version reads as the current one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorValue {
    #[serde(default = "schema")]
    pub schema: String,
    #[serde(default = "version")]
    pub version: u32,
    pub document: Document,
}

impl EditorValue {
    pub fn from_document(document: Document) -> Self {
        Self {
            schema: schema(),
            version: version(),
            document,
        }
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    pub fn to_json_pretty(&self) -> Result<String, ValueError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses an envelope written by this or an older version.
    pub fn from_json_str(s: &str) -> Result<Self, ValueError> {
        let value: EditorValue = serde_json::from_str(s)?;
        if value.schema != VALUE_SCHEMA {
            return Err(ValueError::Schema {
                found: value.schema,
            });
        }
        if value.version > VALUE_VERSION {
            return Err(ValueError::Version {
                found: value.version,
            });
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn foreign_or_future_envelopes_are_rejected() {
        let err = EditorValue::from_json_str(r#"{ "schema": "other", "document": {} }"#)
            .unwrap_err();
        assert!(matches!(err, ValueError::Schema { found } if found == "other"));

        let err = EditorValue::from_json_str(r#"{ "version": 2, "document": {} }"#).unwrap_err();
        assert!(matches!(err, ValueError::Version { found: 2 }));

        assert!(matches!(
            EditorValue::from_json_str("{").unwrap_err(),
            ValueError::Json(_)
        ));
    }
}
