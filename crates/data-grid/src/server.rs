use std::convert::Infallible;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::collate::compare_text;
use crate::config::GridConfig;
use crate::pagination::Pagination;
use crate::query::{FilterKey, GridQueryState, SortDirection};
use crate::record::GridRecord;

/// What a paged source is asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridRequest<F> {
    /// 1-based.
    pub page: usize,
    pub size: usize,
    pub query: String,
    pub filter_key: FilterKey<F>,
    pub sort_key: Option<F>,
    pub sort_direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridPage<R> {
    pub rows: Vec<R>,
    /// Rows matching the request across all pages.
    pub total: usize,
}

/// A backend that filters, sorts and pages on its side.
pub trait GridSource<R: GridRecord> {
    type Error: std::error::Error + Send + Sync + 'static;

    fn fetch(&self, request: &GridRequest<R::Field>) -> Result<GridPage<R>, Self::Error>;
}

/// Serves pages out of a row vector.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGridSource<R> {
    rows: Vec<R>,
}

impl<R> InMemoryGridSource<R> {
    pub fn new(rows: Vec<R>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }
}

impl<R: GridRecord + Clone> GridSource<R> for InMemoryGridSource<R> {
    type Error = Infallible;

    fn fetch(&self, request: &GridRequest<R::Field>) -> Result<GridPage<R>, Infallible> {
        let needle = request.query.trim().to_lowercase();
        let matches = |row: &R, field: R::Field| {
            row.field_text(field).to_lowercase().contains(&needle)
        };

        let mut rows: Vec<&R> = self
            .rows
            .iter()
            .filter(|&row| {
                needle.is_empty()
                    || match request.filter_key {
                        FilterKey::All => R::searchable_fields()
                            .iter()
                            .any(|field| matches(row, *field)),
                        FilterKey::Field(field) => matches(row, field),
                    }
            })
            .collect();

        if let Some(key) = request.sort_key {
            rows.sort_by(|a, b| {
                let ord = compare_text(&a.field_text(key), &b.field_text(key), true);
                match request.sort_direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            });
        }

        let size = request.size.max(1);
        let start = request.page.max(1).saturating_sub(1).saturating_mul(size);
        Ok(GridPage {
            total: rows.len(),
            rows: rows.into_iter().skip(start).take(size).cloned().collect(),
        })
    }
}

/// A grid whose rows are only the current page, fetched from a
/// [`GridSource`].
#[derive(Debug, Clone)]
pub struct ServerGrid<R: GridRecord> {
    config: GridConfig,
    page_size: usize,
    state: GridQueryState<R::Field>,
    rows: Vec<R>,
    total: usize,
    loading: bool,
}

impl<R: GridRecord> Default for ServerGrid<R> {
    fn default() -> Self {
        Self::new(GridConfig::default())
    }
}

impl<R: GridRecord> ServerGrid<R> {
    pub fn new(config: GridConfig) -> Self {
        Self {
            page_size: config.page_size.max(1),
            config,
            state: GridQueryState::default(),
            rows: Vec::new(),
            total: 0,
            loading: false,
        }
    }

    pub fn state(&self) -> &GridQueryState<R::Field> {
        &self.state
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn pagination(&self) -> Pagination {
        Pagination::new(
            self.total,
            self.page_size,
            self.state.page,
            self.config.page_window,
        )
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.state.set_query(query);
    }

    pub fn set_filter_key(&mut self, filter_key: FilterKey<R::Field>) {
        self.state.set_filter_key(filter_key);
    }

    pub fn set_sort(&mut self, key: R::Field) {
        self.state.set_sort(key);
    }

    pub fn set_page(&mut self, page: usize) {
        self.state.set_page(page);
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.state.set_page(1);
    }

    /// Direction shown next to `key`'s header.
    pub fn sort_indicator(&self, key: R::Field) -> Option<&'static str> {
        self.state.sort_indicator(key)
    }

    pub fn request(&self) -> GridRequest<R::Field> {
        GridRequest {
            page: self.state.page.max(1),
            size: self.page_size,
            query: self.state.query.clone(),
            filter_key: self.state.filter_key,
            sort_key: self.state.sort_key,
            sort_direction: self.state.sort_direction,
        }
    }

    /// Marks a fetch as in flight and returns its request.
    pub fn begin_load(&mut self) -> GridRequest<R::Field> {
        self.loading = true;
        self.request()
    }

    /// Stores a fetched page, then corrects the page number against the new
    /// total. Returns the corrected page if one was written.
    pub fn finish_load(&mut self, page: GridPage<R>) -> Option<usize> {
        self.rows = page.rows;
        self.total = page.total;
        self.loading = false;
        self.correct_page()
    }

    pub fn fail_load(&mut self) {
        self.loading = false;
    }

    /// Clamps the page to the known total. Skipped while loading, since the
    /// total is stale, and for empty results.
    pub fn correct_page(&mut self) -> Option<usize> {
        if self.loading || self.total == 0 {
            return None;
        }
        let correction = self.pagination().correction()?;
        debug!(
            requested = self.state.page,
            corrected = correction,
            "correcting server grid page"
        );
        self.state.set_page(correction);
        Some(correction)
    }

    /// Fetches the current page. A page past the end is corrected and
    /// fetched once more.
    pub fn refresh<S>(&mut self, source: &S) -> Result<(), S::Error>
    where
        S: GridSource<R>,
    {
        for _ in 0..2 {
            let request = self.begin_load();
            let page = match source.fetch(&request) {
                Ok(page) => page,
                Err(err) => {
                    warn!(page = request.page, "grid page fetch failed: {err}");
                    self.fail_load();
                    return Err(err);
                }
            };
            if self.finish_load(page).is_none() {
                break;
            }
        }
        Ok(())
    }
}
