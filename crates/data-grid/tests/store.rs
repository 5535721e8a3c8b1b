use blockdesk_grid::{
    FilterKey, GridField, GridQueryState, GridRow, GridStore, PersistedGridState, SortDirection,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn row(id: &str) -> GridRow {
    GridRow::new(id, "Kim", "kim@example.com", "Admin", "Active")
}

#[test]
fn query_and_filter_changes_return_to_page_one() {
    let mut store: GridStore<GridRow> = GridStore::new();
    store.set_page(4);
    store.set_query("kim");
    assert_eq!(store.state().page, 1);

    store.set_page(4);
    store.set_filter_key(FilterKey::Field(GridField::Email));
    assert_eq!(store.state().page, 1);
    assert_eq!(store.state().query, "kim");
}

#[test]
fn sorting_toggles_on_same_key_and_restarts_on_new_key() {
    let mut store: GridStore<GridRow> = GridStore::new();

    store.set_sort(GridField::Customer);
    assert_eq!(store.state().sort_key, Some(GridField::Customer));
    assert_eq!(store.state().sort_direction, SortDirection::Asc);

    store.set_page(3);
    store.set_sort(GridField::Customer);
    assert_eq!(store.state().sort_direction, SortDirection::Desc);
    assert_eq!(store.state().page, 1);

    store.set_sort(GridField::Status);
    assert_eq!(store.state().sort_key, Some(GridField::Status));
    assert_eq!(store.state().sort_direction, SortDirection::Asc);
}

#[test]
fn reset_if_dirty_only_resets_changed_stores() {
    let mut store: GridStore<GridRow> = GridStore::new();
    assert!(!store.reset_if_dirty());

    assert!(store.seed(|| vec![row("1"), row("2")]));
    assert!(!store.seed(|| vec![row("3")]));
    assert_eq!(store.data().len(), 2);
    assert!(store.is_dirty());

    store.set_query("kim");
    assert!(store.reset_if_dirty());
    assert!(store.data().is_empty());
    assert_eq!(store.state(), &GridQueryState::default());

    store.set_query("   ");
    assert!(!store.is_dirty());
}

#[test]
fn persisted_state_leaves_rows_out() {
    let mut store: GridStore<GridRow> = GridStore::new();
    store.set_data(vec![row("1")]);
    store.set_filter_key(FilterKey::Field(GridField::Email));
    store.set_sort(GridField::Id);
    store.set_sort(GridField::Id);
    store.set_query("kim");
    store.set_page(2);

    let saved: serde_json::Value = serde_json::from_str(&store.to_json().unwrap()).unwrap();
    assert_eq!(
        saved,
        json!({
            "query": "kim",
            "filter_key": { "field": "email" },
            "sort_key": "id",
            "sort_direction": "desc",
            "page": 2,
        })
    );

    let mut restored: GridStore<GridRow> = GridStore::new();
    restored.set_data(vec![row("9")]);
    restored.restore_json(&saved.to_string()).unwrap();
    assert_eq!(restored.state(), store.state());
    assert_eq!(restored.data()[0].id, "9");
}

#[test]
fn partial_persisted_state_fills_defaults() {
    let mut store: GridStore<GridRow> = GridStore::new();
    store
        .restore_json(r#"{ "query": "lee", "page": 0 }"#)
        .unwrap();

    assert_eq!(
        store.persisted(),
        PersistedGridState {
            query: "lee".to_string(),
            filter_key: FilterKey::All,
            sort_key: None,
            sort_direction: SortDirection::Asc,
            page: 1,
        }
    );
    assert!(store.restore_json(r#"{ "sort_key": "nope" }"#).is_err());
}
