use blockdesk_editor_core::{Block, Editor, Point, Selection, TextFormat};
use blockdesk_toolbar::{
    FloatingPosition, FloatingToolbarConfig, LayoutSnapshot, Rect, SelectionFloatingToolbar,
};
use pretty_assertions::assert_eq;

fn selected_editor() -> Editor {
    let mut editor = Editor::with_blocks(vec![Block::paragraph("hello world")]);
    let run = editor.doc().blocks[0].children[0].key;
    editor.set_selection(Some(Selection::range(
        Point::text(run, 0),
        Point::text(run, 5),
    )));
    editor
}

fn layout_with_selection(rect: Rect, viewport_width: f32) -> LayoutSnapshot {
    LayoutSnapshot::new(Rect::new(0.0, 0.0, viewport_width, 800.0), viewport_width)
        .with_selection(rect)
}

fn position_for(rect: Rect, viewport_width: f32) -> Option<FloatingPosition> {
    let editor = selected_editor();
    let mut toolbar = SelectionFloatingToolbar::default();
    toolbar.sync(&editor, &layout_with_selection(rect, viewport_width));
    toolbar.position()
}

#[test]
fn sits_centered_above_the_selection() {
    assert_eq!(
        position_for(Rect::new(400.0, 200.0, 50.0, 20.0), 1000.0),
        Some(FloatingPosition {
            center_x: 425.0,
            top: 148.0,
        })
    );
}

#[test]
fn flips_below_when_there_is_no_room_above() {
    let position = position_for(Rect::new(300.0, 30.0, 40.0, 20.0), 1000.0).unwrap();
    assert_eq!(position.top, 58.0);
}

#[test]
fn center_is_clamped_to_the_viewport() {
    let left = position_for(Rect::new(0.0, 300.0, 10.0, 20.0), 1000.0).unwrap();
    assert_eq!(left.center_x, 218.0);
    assert_eq!(left.left(420.0), 8.0);

    let right = position_for(Rect::new(470.0, 300.0, 20.0, 20.0), 500.0).unwrap();
    assert_eq!(right.center_x, 282.0);
}

#[test]
fn measured_size_replaces_fallback() {
    let editor = selected_editor();
    let mut toolbar = SelectionFloatingToolbar::new(FloatingToolbarConfig::default());
    toolbar.set_measured_size(100.0, 30.0);

    toolbar.sync(
        &editor,
        &layout_with_selection(Rect::new(0.0, 300.0, 10.0, 20.0), 1000.0),
    );

    assert_eq!(
        toolbar.position(),
        Some(FloatingPosition {
            center_x: 58.0,
            top: 262.0,
        })
    );
}

#[test]
fn hides_for_caret_missing_or_empty_rect() {
    let mut editor = selected_editor();
    let mut toolbar = SelectionFloatingToolbar::default();
    let visible = layout_with_selection(Rect::new(100.0, 200.0, 50.0, 20.0), 1000.0);

    toolbar.sync(&editor, &visible);
    assert!(toolbar.is_visible());

    toolbar.sync(
        &editor,
        &layout_with_selection(Rect::new(100.0, 200.0, 0.0, 0.0), 1000.0),
    );
    assert!(!toolbar.is_visible());

    toolbar.sync(&editor, &LayoutSnapshot::default());
    assert!(!toolbar.is_visible());

    let run = editor.doc().blocks[0].children[0].key;
    editor.set_selection(Some(Selection::caret(Point::text(run, 2))));
    toolbar.sync(&editor, &visible);
    assert!(!toolbar.is_visible());
}

#[test]
fn format_buttons_toggle_and_resync() {
    let mut editor = selected_editor();
    let mut toolbar = SelectionFloatingToolbar::default();
    let layout = layout_with_selection(Rect::new(100.0, 200.0, 50.0, 20.0), 1000.0);
    toolbar.sync(&editor, &layout);
    assert!(!toolbar.formats().get(TextFormat::Bold));

    toolbar.format_text(&mut editor, TextFormat::Bold).unwrap();
    let events = editor.drain_events();
    toolbar.handle_events(&editor, &layout, &events);

    assert!(toolbar.formats().bold);
    assert_eq!(editor.doc().blocks[0].children[0].text, "hello");
}
