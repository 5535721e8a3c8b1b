use std::collections::{BTreeMap, HashSet};

use crate::record::GridRecord;

/// Per-column value checklists.
///
/// A column with nothing selected does not filter. Otherwise a row passes
/// when its value for that column is one of the selected values.
#[derive(Debug, Clone)]
pub struct ColumnFilters<F> {
    filterable: Vec<F>,
    selected: BTreeMap<F, Vec<String>>,
    search: BTreeMap<F, String>,
}

impl<F: Copy + Ord> Default for ColumnFilters<F> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<F: Copy + Ord> ColumnFilters<F> {
    pub fn new(filterable: Vec<F>) -> Self {
        Self {
            filterable,
            selected: BTreeMap::new(),
            search: BTreeMap::new(),
        }
    }

    pub fn filterable(&self) -> &[F] {
        &self.filterable
    }

    pub fn is_filterable(&self, key: F) -> bool {
        self.filterable.contains(&key)
    }

    /// Distinct non-empty values of `key` in first-seen order.
    pub fn options<R>(&self, rows: &[R], key: F) -> Vec<String>
    where
        R: GridRecord<Field = F>,
    {
        if !self.is_filterable(key) {
            return Vec::new();
        }
        let mut seen = HashSet::new();
        rows.iter()
            .map(|row| row.field_text(key).into_owned())
            .filter(|value| !value.is_empty() && seen.insert(value.clone()))
            .collect()
    }

    /// Options narrowed by the column's search box.
    pub fn visible_options<R>(&self, rows: &[R], key: F) -> Vec<String>
    where
        R: GridRecord<Field = F>,
    {
        let needle = self.search(key).to_lowercase();
        self.options(rows, key)
            .into_iter()
            .filter(|value| value.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn search(&self, key: F) -> &str {
        self.search.get(&key).map(String::as_str).unwrap_or_default()
    }

    pub fn set_search(&mut self, key: F, text: impl Into<String>) {
        self.search.insert(key, text.into());
    }

    pub fn selected(&self, key: F) -> &[String] {
        self.selected.get(&key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn set_value(&mut self, key: F, value: &str, checked: bool) {
        let values = self.selected.entry(key).or_default();
        if checked {
            if !values.iter().any(|existing| existing == value) {
                values.push(value.to_string());
            }
        } else {
            values.retain(|existing| existing != value);
        }
    }

    /// Checking "all" selects every option; unchecking clears the column.
    pub fn set_all<R>(&mut self, rows: &[R], key: F, checked: bool)
    where
        R: GridRecord<Field = F>,
    {
        let values = if checked {
            self.options(rows, key)
        } else {
            Vec::new()
        };
        self.selected.insert(key, values);
    }

    /// The "all" checkbox is checked when nothing or everything is selected.
    pub fn is_all_checked<R>(&self, rows: &[R], key: F) -> bool
    where
        R: GridRecord<Field = F>,
    {
        let count = self.selected(key).len();
        count == 0 || count == self.options(rows, key).len()
    }

    pub fn is_active(&self) -> bool {
        self.selected.values().any(|values| !values.is_empty())
    }

    pub fn clear(&mut self) {
        self.selected.clear();
        self.search.clear();
    }

    pub fn passes<R>(&self, row: &R) -> bool
    where
        R: GridRecord<Field = F>,
    {
        self.filterable.iter().all(|key| {
            let selected = self.selected(*key);
            selected.is_empty() || selected.iter().any(|value| *value == row.field_text(*key))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{GridField, GridRow};
    use pretty_assertions::assert_eq;

    fn rows() -> Vec<GridRow> {
        vec![
            GridRow::new("1", "Kim", "kim@example.com", "Admin", "Active"),
            GridRow::new("2", "Lee", "lee@example.com", "Viewer", ""),
            GridRow::new("3", "Park", "park@example.com", "Admin", "Paused"),
        ]
    }

    #[test]
    fn options_skip_empty_and_duplicates() {
        let filters = ColumnFilters::new(vec![GridField::Role, GridField::Status]);
        let rows = rows();
        assert_eq!(filters.options(&rows, GridField::Role), vec!["Admin", "Viewer"]);
        assert_eq!(filters.options(&rows, GridField::Status), vec!["Active", "Paused"]);
        assert!(filters.options(&rows, GridField::Email).is_empty());
    }

    #[test]
    fn selected_values_filter_rows() {
        let mut filters = ColumnFilters::new(vec![GridField::Role, GridField::Status]);
        let rows = rows();
        assert!(rows.iter().all(|row| filters.passes(row)));

        filters.set_value(GridField::Role, "Admin", true);
        filters.set_value(GridField::Role, "Admin", true);
        assert_eq!(filters.selected(GridField::Role), ["Admin".to_string()]);
        let ids: Vec<_> = rows
            .iter()
            .filter(|row| filters.passes(*row))
            .map(|row| row.id.as_str())
            .collect();
        assert_eq!(ids, vec!["1", "3"]);
        assert!(!filters.is_all_checked(&rows, GridField::Role));

        filters.set_all(&rows, GridField::Role, true);
        assert!(filters.is_all_checked(&rows, GridField::Role));
        filters.set_all(&rows, GridField::Role, false);
        assert!(!filters.is_active());
    }

    #[test]
    fn search_narrows_visible_options() {
        let mut filters = ColumnFilters::new(vec![GridField::Role]);
        filters.set_search(GridField::Role, "VIE");
        assert_eq!(filters.visible_options(&rows(), GridField::Role), vec!["Viewer"]);
    }
}
