use blockdesk_editor_core::{
    Block, BlockKind, Editor, ElementAlign, ListKind, MAX_INDENT_LEVEL, Selection,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;

fn three_blocks() -> Editor {
    Editor::with_blocks(vec![
        Block::paragraph("a"),
        Block::paragraph("b"),
        Block::paragraph("c"),
    ])
}

fn select_blocks(editor: &mut Editor, from: usize, to: usize) {
    let anchor = editor.doc().blocks[from].start_point();
    let focus = editor.doc().blocks[to].end_point();
    editor.set_selection(Some(Selection::range(anchor, focus)));
}

#[rstest]
#[case(json!({ "type": "heading", "level": 2 }), BlockKind::Heading { level: 2 })]
#[case(json!({ "type": "quote" }), BlockKind::Quote)]
#[case(json!({ "type": "paragraph" }), BlockKind::Paragraph)]
fn set_type_converts_anchor_block(#[case] kind: serde_json::Value, #[case] expected: BlockKind) {
    let mut editor = Editor::with_blocks(vec![Block::heading(1, "title")]);

    editor
        .run_command("block.set_type", Some(json!({ "kind": kind })))
        .unwrap();

    assert_eq!(editor.doc().blocks[0].kind, expected);
    assert_eq!(
        editor
            .run_query::<Option<BlockKind>>("selection.block", None)
            .unwrap(),
        Some(expected)
    );
}

#[test]
fn set_type_keeps_alignment() {
    let mut editor =
        Editor::with_blocks(vec![Block::paragraph("x").with_align(ElementAlign::Right)]);

    editor
        .run_command(
            "block.set_type",
            Some(json!({ "kind": { "type": "quote" } })),
        )
        .unwrap();

    assert_eq!(editor.doc().blocks[0].kind, BlockKind::Quote);
    assert_eq!(editor.doc().blocks[0].align, ElementAlign::Right);
}

#[test]
fn align_applies_across_multi_block_selection() {
    let mut editor = three_blocks();
    select_blocks(&mut editor, 0, 2);

    editor
        .run_command("block.set_align", Some(json!({ "align": "center" })))
        .unwrap();

    let aligns: Vec<ElementAlign> = editor.doc().blocks.iter().map(|b| b.align).collect();
    assert_eq!(aligns, vec![ElementAlign::Center; 3]);
    assert_eq!(
        editor
            .run_query::<Option<ElementAlign>>("selection.align", None)
            .unwrap(),
        Some(ElementAlign::Center)
    );
}

#[test]
fn align_only_touches_selected_blocks() {
    let mut editor = three_blocks();
    select_blocks(&mut editor, 1, 1);

    editor
        .run_command("block.set_align", Some(json!({ "align": "justify" })))
        .unwrap();

    let aligns: Vec<ElementAlign> = editor.doc().blocks.iter().map(|b| b.align).collect();
    assert_eq!(
        aligns,
        vec![ElementAlign::Left, ElementAlign::Justify, ElementAlign::Left]
    );
}

#[test]
fn indent_is_capped_and_outdent_stops_at_zero() {
    let mut editor = Editor::with_blocks(vec![Block::paragraph("x")]);

    for _ in 0..12 {
        editor.run_command("block.indent", None).unwrap();
    }
    assert_eq!(editor.doc().blocks[0].indent, MAX_INDENT_LEVEL);

    for _ in 0..12 {
        editor.run_command("block.outdent", None).unwrap();
    }
    assert_eq!(editor.doc().blocks[0].indent, 0);
}

#[test]
fn outdent_at_zero_records_no_history() {
    let mut editor = Editor::with_blocks(vec![Block::paragraph("x")]);
    editor.run_command("block.outdent", None).unwrap();
    assert!(!editor.can_undo());
}

#[test]
fn list_insert_and_remove() {
    let mut editor = three_blocks();
    select_blocks(&mut editor, 0, 1);

    editor
        .run_command("list.insert", Some(json!({ "list": "number" })))
        .unwrap();

    let kinds: Vec<BlockKind> = editor.doc().blocks.iter().map(|b| b.kind).collect();
    assert_eq!(
        kinds,
        vec![
            BlockKind::ListItem {
                list: ListKind::Number
            },
            BlockKind::ListItem {
                list: ListKind::Number
            },
            BlockKind::Paragraph,
        ]
    );

    editor.run_command("list.remove", None).unwrap();
    let kinds: Vec<BlockKind> = editor.doc().blocks.iter().map(|b| b.kind).collect();
    assert_eq!(kinds, vec![BlockKind::Paragraph; 3]);
}

#[test]
fn heading_level_is_clamped_on_load() {
    let editor = Editor::with_blocks(vec![Block::heading(9, "deep"), Block::heading(0, "zero")]);
    assert_eq!(editor.doc().blocks[0].kind, BlockKind::Heading { level: 6 });
    assert_eq!(editor.doc().blocks[1].kind, BlockKind::Heading { level: 1 });
}

#[test]
fn empty_document_gets_a_paragraph() {
    let editor = Editor::with_blocks(Vec::new());
    assert_eq!(editor.doc().blocks.len(), 1);
    assert_eq!(editor.doc().blocks[0].kind, BlockKind::Paragraph);
    assert_eq!(editor.doc().blocks[0].children.len(), 1);
    assert!(editor.range_selection().unwrap().is_collapsed());
}

#[test]
fn node_selection_targets_listed_blocks() {
    let mut editor = three_blocks();
    let key = editor.doc().blocks[2].key;
    editor.set_selection(Some(Selection::Node { keys: vec![key] }));

    editor
        .run_command("block.set_align", Some(json!({ "align": "right" })))
        .unwrap();

    assert_eq!(editor.doc().blocks[2].align, ElementAlign::Right);
    assert_eq!(editor.doc().blocks[0].align, ElementAlign::Left);
    assert!(editor.range_selection().is_none());
}
