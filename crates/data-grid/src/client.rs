use tracing::debug;

use crate::columns::ColumnFilters;
use crate::config::GridConfig;
use crate::pagination::Pagination;
use crate::query::{GridQueryState, filter_rows, sort_rows};
use crate::record::GridRecord;
use crate::selection::RowSelection;
use crate::store::GridStore;

/// One render of a client-side grid.
#[derive(Debug)]
pub struct GridView<'a, R> {
    /// Every row that passed the query and column filters, sorted.
    pub filtered: Vec<&'a R>,
    pub pagination: Pagination,
}

impl<'a, R> GridView<'a, R> {
    pub fn page_rows(&self) -> &[&'a R] {
        &self.filtered[self.pagination.slice_range()]
    }

    pub fn total(&self) -> usize {
        self.filtered.len()
    }
}

/// Filters, sorts and pages rows held in memory.
///
/// Query state lives with the caller (usually a [`GridStore`]); this holds
/// the per-table UI state the store does not persist.
#[derive(Debug, Clone)]
pub struct ClientGrid<R: GridRecord> {
    config: GridConfig,
    page_size: usize,
    columns: ColumnFilters<R::Field>,
    selection: RowSelection<R::Id>,
}

impl<R: GridRecord> Default for ClientGrid<R> {
    fn default() -> Self {
        Self::new(GridConfig::default())
    }
}

impl<R: GridRecord> ClientGrid<R> {
    pub fn new(config: GridConfig) -> Self {
        Self {
            page_size: config.page_size.max(1),
            config,
            columns: ColumnFilters::default(),
            selection: RowSelection::new(),
        }
    }

    pub fn with_filterable_columns(mut self, columns: Vec<R::Field>) -> Self {
        self.columns = ColumnFilters::new(columns);
        self
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Changing the page size starts again from page 1.
    pub fn set_page_size(&mut self, state: &mut GridQueryState<R::Field>, page_size: usize) {
        self.page_size = page_size.max(1);
        state.set_page(1);
    }

    pub fn columns(&self) -> &ColumnFilters<R::Field> {
        &self.columns
    }

    pub fn set_column_search(&mut self, key: R::Field, text: impl Into<String>) {
        self.columns.set_search(key, text);
    }

    pub fn set_column_value(
        &mut self,
        state: &mut GridQueryState<R::Field>,
        key: R::Field,
        value: &str,
        checked: bool,
    ) {
        self.columns.set_value(key, value, checked);
        state.set_page(1);
    }

    pub fn set_column_all(
        &mut self,
        state: &mut GridQueryState<R::Field>,
        rows: &[R],
        key: R::Field,
        checked: bool,
    ) {
        self.columns.set_all(rows, key, checked);
        state.set_page(1);
    }

    pub fn selection(&self) -> &RowSelection<R::Id> {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut RowSelection<R::Id> {
        &mut self.selection
    }

    /// Ids of every filtered row, across all pages.
    pub fn visible_ids(&self, view: &GridView<'_, R>) -> Vec<R::Id> {
        view.filtered.iter().map(|row| row.id()).collect()
    }

    pub fn view<'a>(&self, rows: &'a [R], state: &GridQueryState<R::Field>) -> GridView<'a, R> {
        let mut filtered: Vec<&R> = filter_rows(rows, &state.query, state.filter_key)
            .into_iter()
            .filter(|row| self.columns.passes(*row))
            .collect();
        sort_rows(&mut filtered, state.sort_key, state.sort_direction, false);

        let pagination = Pagination::new(
            filtered.len(),
            self.page_size,
            state.page,
            self.config.page_window,
        );
        GridView {
            filtered,
            pagination,
        }
    }

    /// Writes the clamped page back to the store when the stored page no
    /// longer exists. Returns the page written.
    pub fn correct_page(&self, store: &mut GridStore<R>) -> Option<usize> {
        let correction = self
            .view(store.data(), store.state())
            .pagination
            .correction()?;
        debug!(
            requested = store.state().page,
            corrected = correction,
            "correcting grid page"
        );
        store.set_page(correction);
        Some(correction)
    }
}
