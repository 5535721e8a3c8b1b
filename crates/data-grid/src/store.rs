use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::query::{FilterKey, GridQueryState, SortDirection};
use crate::record::GridRecord;

/// The part of a [`GridStore`] a host persists between sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedGridState<F> {
    pub query: String,
    pub filter_key: FilterKey<F>,
    pub sort_key: Option<F>,
    pub sort_direction: SortDirection,
    pub page: usize,
}

impl<F> Default for PersistedGridState<F> {
    fn default() -> Self {
        GridQueryState::default().into()
    }
}

impl<F> From<GridQueryState<F>> for PersistedGridState<F> {
    fn from(state: GridQueryState<F>) -> Self {
        Self {
            query: state.query,
            filter_key: state.filter_key,
            sort_key: state.sort_key,
            sort_direction: state.sort_direction,
            page: state.page,
        }
    }
}

/// Rows plus the query state a grid page renders from.
#[derive(Debug, Clone)]
pub struct GridStore<R: GridRecord> {
    data: Vec<R>,
    state: GridQueryState<R::Field>,
}

impl<R: GridRecord> Default for GridStore<R> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            state: GridQueryState::default(),
        }
    }
}

impl<R: GridRecord> GridStore<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(&self) -> &[R] {
        &self.data
    }

    pub fn state(&self) -> &GridQueryState<R::Field> {
        &self.state
    }

    pub fn set_data(&mut self, data: Vec<R>) {
        self.data = data;
    }

    /// Loads `data` unless rows are already present. Returns whether it did.
    pub fn seed(&mut self, data: impl FnOnce() -> Vec<R>) -> bool {
        if !self.data.is_empty() {
            return false;
        }
        self.data = data();
        true
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

    pub fn reset(&mut self) {
        self.data.clear();
        self.state = GridQueryState::default();
    }

    /// Resets only when something differs from the initial state.
    pub fn reset_if_dirty(&mut self) -> bool {
        if !self.is_dirty() {
            return false;
        }
        debug!("resetting grid store");
        self.reset();
        true
    }

    pub fn is_dirty(&self) -> bool {
        !self.data.is_empty() || !self.state.is_default()
    }
}

impl<R> GridStore<R>
where
    R: GridRecord,
    R::Field: Serialize + DeserializeOwned,
{
    pub fn persisted(&self) -> PersistedGridState<R::Field> {
        self.state.clone().into()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.persisted())
    }

    /// Restores query state saved by [`GridStore::to_json`]. Rows are kept.
    pub fn restore_json(&mut self, json: &str) -> serde_json::Result<()> {
        let persisted: PersistedGridState<R::Field> = serde_json::from_str(json)?;
        self.state = GridQueryState {
            query: persisted.query,
            filter_key: persisted.filter_key,
            sort_key: persisted.sort_key,
            sort_direction: persisted.sort_direction,
            page: persisted.page.max(1),
        };
        Ok(())
    }
}
