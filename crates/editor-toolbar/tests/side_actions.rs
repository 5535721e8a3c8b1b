use blockdesk_editor_core::{Block, BlockKind, DropPosition, Editor, ListKind, NodeKey};
use blockdesk_toolbar::{
    BlockSideActions, BlockType, DropOutcome, DropTarget, LayoutSnapshot, Rect,
    SelectionSuppression, SideActionsPhase, ToolbarConfig, resolve_drop_target,
};
use pretty_assertions::assert_eq;

struct Fixture {
    editor: Editor,
    layout: LayoutSnapshot,
    suppression: SelectionSuppression,
    actions: BlockSideActions,
}

/// Blocks `a`, `b`, `c` stacked 40px high in a shell whose top is at 100.
/// The toolbar occupies the first 50px of the window.
fn fixture(config: ToolbarConfig) -> Fixture {
    let editor = Editor::with_blocks(vec![
        Block::paragraph("a"),
        Block::paragraph("b"),
        Block::paragraph("c"),
    ]);
    let layout = LayoutSnapshot::new(Rect::new(0.0, 100.0, 600.0, 300.0), 1000.0)
        .with_stacked_blocks(editor.doc().blocks.iter().map(|block| block.key), 40.0)
        .with_toolbar(Rect::new(0.0, 0.0, 600.0, 50.0));
    let suppression = SelectionSuppression::new();
    let actions = BlockSideActions::new(&config, suppression.clone());
    Fixture {
        editor,
        layout,
        suppression,
        actions,
    }
}

impl Fixture {
    fn key(&self, ix: usize) -> NodeKey {
        self.editor.doc().blocks[ix].key
    }

    fn texts(&self) -> Vec<String> {
        self.editor.doc().blocks.iter().map(Block::text).collect()
    }

    fn track(&mut self, ix: usize) {
        let key = self.key(ix);
        assert!(self.editor.select_block_start(key));
        self.editor.drain_events();
        self.actions.track_current_block(&self.editor, &self.layout);
    }

    fn resync(&mut self) {
        let events = self.editor.drain_events();
        self.actions
            .handle_events(&self.editor, &self.layout, &events);
    }

    fn down(&mut self, y: f32) {
        self.actions
            .pointer_down(&self.editor, &self.layout, 0.0, y);
    }

    fn moved(&mut self, x: f32, y: f32) {
        self.actions
            .pointer_move(&self.editor, &self.layout, x, y);
    }

    fn up(&mut self, x: f32, y: f32) -> DropOutcome {
        self.actions
            .pointer_up(&mut self.editor, &self.layout, x, y)
            .unwrap()
    }
}

#[test]
fn tracks_the_anchor_block_relative_to_the_shell() {
    let mut f = fixture(ToolbarConfig::default());
    f.track(2);

    let tracked = f.actions.tracked().copied().unwrap();
    assert_eq!(tracked.key, f.key(2));
    assert_eq!(tracked.top, 80.0);
    assert_eq!(f.actions.handle_offset(), Some(100.0));
    assert_eq!(f.actions.phase(), SideActionsPhase::Tracking);
}

#[test]
fn tracking_clears_when_block_is_not_laid_out() {
    let mut f = fixture(ToolbarConfig::default());
    f.track(0);
    f.layout.blocks.clear();

    f.actions.track_current_block(&f.editor, &f.layout);
    assert_eq!(f.actions.phase(), SideActionsPhase::Idle);
    assert!(!f.actions.is_visible());
}

#[test]
fn drop_target_prefers_before_the_first_lower_midpoint() {
    let f = fixture(ToolbarConfig::default());

    assert_eq!(
        resolve_drop_target(&f.editor, &f.layout, 50.0),
        Some(DropTarget {
            key: f.key(0),
            position: DropPosition::Before,
            guide_top: 0.0,
        })
    );
    assert_eq!(
        resolve_drop_target(&f.editor, &f.layout, 170.0),
        Some(DropTarget {
            key: f.key(2),
            position: DropPosition::Before,
            guide_top: 80.0,
        })
    );
    assert_eq!(
        resolve_drop_target(&f.editor, &f.layout, 900.0),
        Some(DropTarget {
            key: f.key(2),
            position: DropPosition::After,
            guide_top: 120.0,
        })
    );
    assert_eq!(
        resolve_drop_target(&f.editor, &LayoutSnapshot::default(), 50.0),
        None
    );
}

#[test]
fn drag_moves_block_and_releases_suppression() {
    let mut f = fixture(ToolbarConfig::default());
    f.track(2);
    let (a, c) = (f.key(0), f.key(2));

    f.down(200.0);
    assert_eq!(f.actions.phase(), SideActionsPhase::Dragging);
    assert!(f.suppression.is_active());

    f.moved(0.0, 110.0);
    assert_eq!(f.actions.guide_top(), Some(0.0));
    assert_eq!(f.actions.drag().map(|drag| drag.last_pointer_y), Some(110.0));

    assert_eq!(
        f.up(300.0, 110.0),
        DropOutcome::Moved {
            source: c,
            target: a,
            position: DropPosition::Before,
        }
    );
    assert_eq!(f.texts(), vec!["c", "a", "b"]);
    assert_eq!(f.editor.anchor_block().map(|block| block.key), Some(c));
    assert!(!f.suppression.is_active());
    assert_eq!(f.actions.phase(), SideActionsPhase::Tracking);
    assert!(f.actions.drag().is_none());
}

#[test]
fn dropping_onto_itself_changes_nothing() {
    let mut f = fixture(ToolbarConfig::default());
    f.track(1);

    f.down(150.0);
    assert_eq!(f.up(300.0, 150.0), DropOutcome::Unchanged);

    assert_eq!(f.texts(), vec!["a", "b", "c"]);
    assert!(!f.editor.can_undo());
    assert!(!f.suppression.is_active());
}

#[test]
fn dropping_back_into_its_own_slot_changes_nothing() {
    let mut f = fixture(ToolbarConfig::default());
    f.track(1);

    f.down(170.0);
    assert_eq!(f.actions.drag().map(|drag| drag.target.key), Some(f.key(2)));
    assert_eq!(f.up(300.0, 170.0), DropOutcome::Unchanged);

    assert_eq!(f.texts(), vec!["a", "b", "c"]);
    assert!(!f.editor.can_undo());
    assert!(!f.suppression.is_active());
}

#[test]
fn release_over_toolbar_clears_drag_without_moving() {
    let mut f = fixture(ToolbarConfig::default());
    f.track(0);

    f.down(120.0);
    f.moved(0.0, 400.0);
    assert_eq!(f.up(20.0, 20.0), DropOutcome::ReleasedOverToolbar);

    assert_eq!(f.texts(), vec!["a", "b", "c"]);
    assert!(f.actions.drag().is_none());
    assert!(!f.suppression.is_active());
}

#[test]
fn cancel_ends_drag_without_moving() {
    let mut f = fixture(ToolbarConfig::default());
    f.track(0);

    f.down(120.0);
    f.moved(0.0, 400.0);
    f.actions.pointer_cancel();

    assert_eq!(f.actions.phase(), SideActionsPhase::Tracking);
    assert!(!f.suppression.is_active());
    assert_eq!(f.up(0.0, 400.0), DropOutcome::Ignored);
    assert_eq!(f.texts(), vec!["a", "b", "c"]);
}

#[test]
fn press_is_ignored_while_idle_or_insert_menu_is_open() {
    let mut f = fixture(ToolbarConfig::default());
    f.down(120.0);
    assert_eq!(f.actions.phase(), SideActionsPhase::Idle);

    f.track(0);
    f.actions.set_insert_menu_open(true);
    f.down(120.0);
    assert_eq!(f.actions.phase(), SideActionsPhase::Tracking);
    assert!(!f.suppression.is_active());
}

#[test]
fn threshold_separates_click_from_drag() {
    let config = ToolbarConfig {
        drag_threshold: 4.0,
        ..ToolbarConfig::default()
    };
    let mut f = fixture(config);
    f.track(0);

    f.down(120.0);
    assert_eq!(f.actions.phase(), SideActionsPhase::Tracking);
    assert_eq!(f.up(0.0, 120.0), DropOutcome::BlockMenuOpened);
    assert!(f.actions.block_menu_open());

    f.down(120.0);
    f.moved(1.0, 121.0);
    assert_eq!(f.actions.phase(), SideActionsPhase::Tracking);
    f.moved(0.0, 300.0);
    assert_eq!(f.actions.phase(), SideActionsPhase::Dragging);
    assert!(!f.actions.block_menu_open());

    let (a, c) = (f.key(0), f.key(2));
    assert_eq!(
        f.up(300.0, 300.0),
        DropOutcome::Moved {
            source: a,
            target: c,
            position: DropPosition::After,
        }
    );
    assert_eq!(f.texts(), vec!["b", "c", "a"]);
}

#[test]
fn hover_tracks_block_under_pointer_or_nearest() {
    let mut f = fixture(ToolbarConfig::default());

    f.actions.hover(&f.editor, &f.layout, 165.0);
    assert_eq!(f.actions.tracked().map(|block| block.key), Some(f.key(1)));

    f.actions.hover(&f.editor, &f.layout, 500.0);
    assert_eq!(f.actions.tracked().map(|block| block.key), Some(f.key(2)));

    f.actions.set_block_menu_open(true);
    f.actions.pointer_leave();
    assert_eq!(f.actions.phase(), SideActionsPhase::Tracking);

    f.actions.set_block_menu_open(false);
    f.actions.pointer_leave();
    assert_eq!(f.actions.phase(), SideActionsPhase::Idle);
}

#[test]
fn hover_is_ignored_while_dragging() {
    let mut f = fixture(ToolbarConfig::default());
    f.track(0);
    f.down(120.0);

    f.actions.hover(&f.editor, &f.layout, 210.0);
    assert_eq!(f.actions.tracked().map(|block| block.key), Some(f.key(0)));
    f.actions.pointer_cancel();
}

#[test]
fn insert_after_tracked_block_moves_caret_into_it() {
    let mut f = fixture(ToolbarConfig::default());
    f.actions.hover(&f.editor, &f.layout, 125.0);
    f.actions.set_insert_menu_open(true);

    assert!(
        f.actions
            .insert_block_after(&mut f.editor, BlockType::Heading1)
            .unwrap()
    );

    assert_eq!(f.texts(), vec!["a", "", "b", "c"]);
    assert_eq!(f.editor.doc().blocks[1].kind, BlockKind::Heading { level: 1 });
    assert_eq!(
        f.editor.anchor_block().map(|block| block.key),
        Some(f.key(1))
    );
    assert!(!f.actions.insert_menu_open());

    // The new block has no layout yet, so tracking falls back to the anchor.
    f.resync();
    assert_eq!(f.actions.phase(), SideActionsPhase::Idle);
    assert!(
        f.actions
            .insert_list_after(&mut f.editor, ListKind::Bullet)
            .unwrap()
    );
    assert_eq!(
        f.editor.doc().blocks[2].kind,
        BlockKind::ListItem {
            list: ListKind::Bullet
        }
    );
}

#[test]
fn insert_needs_a_range_selection() {
    let mut f = fixture(ToolbarConfig::default());
    f.track(0);
    f.editor.set_selection(None);

    assert!(
        !f.actions
            .insert_block_after(&mut f.editor, BlockType::Quote)
            .unwrap()
    );
    assert_eq!(f.editor.doc().blocks.len(), 3);
}

#[test]
fn delete_tracked_block_moves_caret_to_next() {
    let mut f = fixture(ToolbarConfig::default());
    f.track(1);
    let c = f.key(2);

    assert!(f.actions.delete_tracked_block(&mut f.editor).unwrap());

    assert_eq!(f.texts(), vec!["a", "c"]);
    assert_eq!(f.editor.anchor_block().map(|block| block.key), Some(c));
}
