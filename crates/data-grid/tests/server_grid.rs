use blockdesk_grid::{
    FilterKey, GridConfig, GridField, GridPage, GridRequest, GridRow, GridSource,
    InMemoryGridSource, ServerGrid, SortDirection,
};
use pretty_assertions::assert_eq;

const NAMES: [&str; 5] = ["Kim", "Lee", "Park", "Choi", "Jung"];

fn source() -> InMemoryGridSource<GridRow> {
    InMemoryGridSource::new(
        (1..=23)
            .map(|i| {
                GridRow::new(
                    format!("DOC-{i:03}"),
                    format!("{} {i}", NAMES[i % 5]),
                    format!("user{i}@example.com"),
                    if i % 3 == 0 { "Admin" } else { "Viewer" },
                    if i % 2 == 0 { "Active" } else { "Paused" },
                )
            })
            .collect(),
    )
}

fn customers(grid: &ServerGrid<GridRow>) -> Vec<&str> {
    grid.rows().iter().map(|row| row.customer.as_str()).collect()
}

#[derive(Debug, thiserror::Error)]
#[error("backend unavailable")]
struct Unavailable;

struct FailingSource;

impl GridSource<GridRow> for FailingSource {
    type Error = Unavailable;

    fn fetch(
        &self,
        _request: &GridRequest<GridField>,
    ) -> Result<GridPage<GridRow>, Unavailable> {
        Err(Unavailable)
    }
}

#[test]
fn refresh_corrects_a_page_past_the_end_and_refetches() {
    let source = source();
    let mut grid: ServerGrid<GridRow> = ServerGrid::new(GridConfig::default());
    grid.set_page(5);

    grid.refresh(&source).unwrap();

    assert_eq!(grid.state().page, 3);
    assert_eq!(grid.total(), 23);
    assert_eq!(grid.pagination().total_pages, 3);
    assert_eq!(
        grid.rows().iter().map(|row| row.id.as_str()).collect::<Vec<_>>(),
        vec!["DOC-021", "DOC-022", "DOC-023"]
    );
    assert!(!grid.is_loading());
}

#[test]
fn correction_waits_for_loading_and_skips_empty_results() {
    let mut grid: ServerGrid<GridRow> = ServerGrid::default();
    grid.finish_load(GridPage {
        rows: Vec::new(),
        total: 23,
    });

    grid.set_page(9);
    let request = grid.begin_load();
    assert_eq!(request.page, 9);
    assert!(grid.is_loading());
    assert_eq!(grid.correct_page(), None);
    assert_eq!(grid.state().page, 9);

    assert_eq!(
        grid.finish_load(GridPage {
            rows: Vec::new(),
            total: 0,
        }),
        None
    );
    assert_eq!(grid.state().page, 9);
}

#[test]
fn in_memory_source_sorts_numerically_and_negates_for_descending() {
    let source = source();
    let mut grid: ServerGrid<GridRow> = ServerGrid::new(GridConfig::default());

    grid.set_sort(GridField::Customer);
    grid.refresh(&source).unwrap();
    assert_eq!(
        customers(&grid),
        vec![
            "Choi 3", "Choi 8", "Choi 13", "Choi 18", "Choi 23", "Jung 4", "Jung 9", "Jung 14",
            "Jung 19", "Kim 5",
        ]
    );

    grid.set_sort(GridField::Customer);
    assert_eq!(grid.state().sort_direction, SortDirection::Desc);
    assert_eq!(grid.sort_indicator(GridField::Customer), Some("▼"));
    grid.refresh(&source).unwrap();
    assert_eq!(
        &customers(&grid)[..6],
        ["Park 22", "Park 17", "Park 12", "Park 7", "Park 2", "Lee 21"]
    );
}

#[test]
fn query_filter_and_sort_changes_reset_the_page() {
    let source = source();
    let mut grid: ServerGrid<GridRow> = ServerGrid::new(GridConfig::default());
    grid.set_page(2);
    grid.set_query("  KIM ");
    assert_eq!(grid.state().page, 1);

    grid.refresh(&source).unwrap();
    assert_eq!(grid.total(), 4);
    assert_eq!(customers(&grid), vec!["Kim 5", "Kim 10", "Kim 15", "Kim 20"]);

    grid.set_page(2);
    grid.set_filter_key(FilterKey::Field(GridField::Email));
    assert_eq!(grid.state().page, 1);
    grid.refresh(&source).unwrap();
    assert_eq!(grid.total(), 0);

    grid.set_page(2);
    grid.set_sort(GridField::Id);
    assert_eq!(grid.state().page, 1);

    grid.set_page(2);
    grid.set_page_size(25);
    assert_eq!(grid.state().page, 1);
    assert_eq!(grid.request().size, 25);
}

#[test]
fn failed_fetch_clears_loading_and_keeps_rows() {
    let mut grid: ServerGrid<GridRow> = ServerGrid::new(GridConfig::default());
    grid.refresh(&source()).unwrap();
    assert_eq!(grid.rows().len(), 10);

    assert!(grid.refresh(&FailingSource).is_err());
    assert!(!grid.is_loading());
    assert_eq!(grid.rows().len(), 10);
}
