use serde::{Deserialize, Serialize};

use crate::collate::compare_text;
use crate::record::GridRecord;

/// Which fields the search query matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKey<F> {
    #[default]
    All,
    Field(F),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn indicator(self) -> &'static str {
        match self {
            SortDirection::Asc => "▲",
            SortDirection::Desc => "▼",
        }
    }
}

/// Query, filter, sort and page of one grid. Changing what is shown sends
/// the grid back to page 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridQueryState<F> {
    pub query: String,
    pub filter_key: FilterKey<F>,
    pub sort_key: Option<F>,
    pub sort_direction: SortDirection,
    /// 1-based; may exceed the page count until corrected.
    pub page: usize,
}

impl<F> Default for GridQueryState<F> {
    fn default() -> Self {
        Self {
            query: String::new(),
            filter_key: FilterKey::All,
            sort_key: None,
            sort_direction: SortDirection::Asc,
            page: 1,
        }
    }
}

impl<F: Copy + PartialEq> GridQueryState<F> {
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.page = 1;
    }

    pub fn set_filter_key(&mut self, filter_key: FilterKey<F>) {
        self.filter_key = filter_key;
        self.page = 1;
    }

    /// Sorting by the current key flips the direction; a new key sorts
    /// ascending.
    pub fn set_sort(&mut self, key: F) {
        if self.sort_key == Some(key) {
            self.sort_direction = self.sort_direction.toggled();
        } else {
            self.sort_key = Some(key);
            self.sort_direction = SortDirection::Asc;
        }
        self.page = 1;
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page;
    }

    /// Direction shown next to `key`'s header, if the grid sorts by it.
    pub fn sort_indicator(&self, key: F) -> Option<&'static str> {
        (self.sort_key == Some(key)).then(|| self.sort_direction.indicator())
    }

    pub fn is_default(&self) -> bool {
        self.query.trim().is_empty()
            && self.filter_key == FilterKey::All
            && self.sort_key.is_none()
            && self.page == 1
    }
}

/// Rows matching `query`. A blank query keeps every row in order.
///
/// The "all" key joins the record's searchable fields with spaces before
/// matching, case-insensitively.
pub fn filter_rows<'a, R: GridRecord>(
    rows: impl IntoIterator<Item = &'a R>,
    query: &str,
    filter_key: FilterKey<R::Field>,
) -> Vec<&'a R>
where
    R: 'a,
{
    let rows = rows.into_iter();
    if query.trim().is_empty() {
        return rows.collect();
    }

    let needle = query.to_lowercase();
    rows.filter(|row| {
        let haystack = match filter_key {
            FilterKey::All => R::searchable_fields()
                .iter()
                .map(|field| row.field_text(*field))
                .collect::<Vec<_>>()
                .join(" "),
            FilterKey::Field(field) => row.field_text(field).into_owned(),
        };
        haystack.to_lowercase().contains(&needle)
    })
    .collect()
}

/// Sorts ascending by `key`'s text, then reverses for descending order.
pub fn sort_rows<R: GridRecord>(
    rows: &mut [&R],
    key: Option<R::Field>,
    direction: SortDirection,
    numeric: bool,
) {
    let Some(key) = key else {
        return;
    };
    rows.sort_by(|a, b| compare_text(&a.field_text(key), &b.field_text(key), numeric));
    if direction == SortDirection::Desc {
        rows.reverse();
    }
}
