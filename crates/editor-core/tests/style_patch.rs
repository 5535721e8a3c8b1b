use blockdesk_editor_core::{Block, Editor, Point, Selection, StyleMap};
use pretty_assertions::assert_eq;
use serde_json::json;

fn select_all_of_first_run(editor: &mut Editor, from: usize, to: usize) {
    let key = editor.doc().blocks[0].children[0].key;
    editor.set_selection(Some(Selection::range(
        Point::text(key, from),
        Point::text(key, to),
    )));
}

#[test]
fn patch_on_range_splits_and_styles_only_covered_text() {
    let mut editor = Editor::with_blocks(vec![Block::paragraph("hello world")]);
    select_all_of_first_run(&mut editor, 0, 5);

    editor
        .run_command(
            "text.patch_style",
            Some(json!({ "styles": { "font-size": "18px" } })),
        )
        .unwrap();

    let children = &editor.doc().blocks[0].children;
    assert_eq!(children.len(), 2);
    assert_eq!(children[0].text, "hello");
    assert_eq!(children[0].style, StyleMap::from([("font-size", "18px")]));
    assert_eq!(children[1].text, " world");
    assert!(children[1].style.is_empty());

    assert_eq!(editor.selection_style_value("font-size", "15px"), "18px");
    assert_eq!(
        editor
            .run_query::<Option<String>>(
                "selection.style",
                Some(json!({ "property": "font-size", "default": "15px" })),
            )
            .unwrap(),
        Some("18px".to_string())
    );
}

#[test]
fn mixed_values_read_as_empty_string() {
    let mut editor = Editor::with_blocks(vec![Block::paragraph("hello world")]);
    select_all_of_first_run(&mut editor, 0, 5);
    editor
        .run_command(
            "text.patch_style",
            Some(json!({ "styles": { "font-size": "18px" } })),
        )
        .unwrap();

    let first = editor.doc().blocks[0].children[0].key;
    let second = editor.doc().blocks[0].children[1].key;
    editor.set_selection(Some(Selection::range(
        Point::text(first, 0),
        Point::text(second, 6),
    )));

    assert_eq!(editor.selection_style_value("font-size", "15px"), "");
    assert_eq!(editor.selection_style_value("color", "#000000"), "#000000");
}

#[test]
fn caret_patch_only_changes_pending_style() {
    let mut editor = Editor::with_blocks(vec![Block::paragraph("abc")]);
    let before = editor.doc().clone();

    editor
        .run_command(
            "text.patch_style",
            Some(json!({ "styles": { "color": "#ff0000" } })),
        )
        .unwrap();

    assert_eq!(editor.doc(), &before);
    assert_eq!(editor.selection_style_value("color", "#000000"), "#ff0000");
    assert!(!editor.can_undo());
}

#[test]
fn empty_value_removes_property_and_merges_runs_back() {
    let mut editor = Editor::with_blocks(vec![Block::paragraph("abcdef")]);
    select_all_of_first_run(&mut editor, 2, 4);

    editor
        .run_command("text.patch_style", Some(json!({ "styles": { "color": "red" } })))
        .unwrap();
    assert_eq!(editor.doc().blocks[0].children.len(), 3);

    editor
        .run_command("text.patch_style", Some(json!({ "styles": { "color": "" } })))
        .unwrap();

    let children = &editor.doc().blocks[0].children;
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].text, "abcdef");
    assert!(children[0].style.is_empty());
}

#[test]
fn style_query_without_selection_is_null() {
    let mut editor = Editor::with_blocks(vec![Block::paragraph("abc")]);
    editor.set_selection(None);

    assert_eq!(
        editor
            .run_query::<Option<String>>(
                "selection.style",
                Some(json!({ "property": "font-size" })),
            )
            .unwrap(),
        None
    );
}
