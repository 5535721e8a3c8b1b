use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Inline CSS-like properties carried by a text run or a pending caret style.
///
/// Keys are kept sorted so two maps with the same properties compare equal and
/// render to the same `prop: value;` string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleMap(BTreeMap<String, String>);

impl StyleMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.0.get(property).map(String::as_str)
    }

    pub fn insert(
        &mut self,
        property: impl Into<String>,
        value: impl Into<String>,
    ) -> Option<String> {
        self.0.insert(property.into(), value.into())
    }

    pub fn remove(&mut self, property: &str) -> Option<String> {
        self.0.remove(property)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Merges `patch` into this map. An empty value removes the property.
    pub fn patch(&mut self, patch: &StyleMap) {
        for (property, value) in &patch.0 {
            if value.is_empty() {
                self.0.remove(property);
            } else {
                self.0.insert(property.clone(), value.clone());
            }
        }
    }

    pub fn patched(&self, patch: &StyleMap) -> StyleMap {
        let mut next = self.clone();
        next.patch(patch);
        next
    }

    /// Parses a `prop: value; prop: value` declaration list. Malformed
    /// declarations are skipped.
    pub fn parse(css: &str) -> Self {
        let mut style = Self::new();
        for declaration in css.split(';') {
            let Some((property, value)) = declaration.split_once(':') else {
                continue;
            };
            let property = property.trim().to_ascii_lowercase();
            let value = value.trim();
            if property.is_empty() || value.is_empty() {
                continue;
            }
            style.0.insert(property, value.to_string());
        }
        style
    }

    pub fn to_css(&self) -> String {
        self.0
            .iter()
            .map(|(property, value)| format!("{property}: {value};"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl<K, V> FromIterator<(K, V)> for StyleMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<const N: usize> From<[(&str, &str); N]> for StyleMap {
    fn from(entries: [(&str, &str); N]) -> Self {
        entries.into_iter().collect()
    }
}
