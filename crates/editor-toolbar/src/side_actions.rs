//! Insert and drag handles shown beside the block under the caret.
//!
//! The controller is a three-phase machine:
//!
//! - `Idle`: no block is tracked and no handles are shown.
//! - `Tracking`: a block is tracked; handles sit at its vertical offset. A
//!   handle press may be pending here while the pointer has not yet moved
//!   past the drag threshold.
//! - `Dragging`: the tracked block is being dragged. Only this phase owns a
//!   [`DragState`], which holds the text-selection suppression guard.

use blockdesk_editor_core::{
    BlockKind, CommandError, DropPosition, Editor, EditorEvent, ListKind, NodeKey,
};
use serde_json::json;
use tracing::{debug, trace};

use crate::config::ToolbarConfig;
use crate::format::BlockType;
use crate::geometry::{EditorLayout, Rect};
use crate::suppression::{SelectionSuppression, SuppressionGuard};

/// A tracked block. `top` is relative to the shell's top edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedBlock {
    pub key: NodeKey,
    pub top: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropTarget {
    pub key: NodeKey,
    pub position: DropPosition,
    /// Guide line offset from the shell's top edge.
    pub guide_top: f32,
}

#[derive(Debug)]
pub struct DragState {
    pub source: NodeKey,
    pub last_pointer_y: f32,
    pub target: DropTarget,
    _suppression: SuppressionGuard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideActionsPhase {
    Idle,
    Tracking,
    Dragging,
}

/// Result of releasing the drag handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    /// No press or drag was active.
    Ignored,
    /// A press without movement; the block menu opened.
    BlockMenuOpened,
    /// Released over the toolbar; nothing moved.
    ReleasedOverToolbar,
    /// Dropped onto the dragged block or back into its own slot.
    Unchanged,
    Moved {
        source: NodeKey,
        target: NodeKey,
        position: DropPosition,
    },
}

#[derive(Debug, Clone, Copy)]
struct PendingPress {
    x: f32,
    y: f32,
}

#[derive(Debug)]
enum Phase {
    Idle,
    Tracking {
        block: TrackedBlock,
        press: Option<PendingPress>,
    },
    Dragging {
        block: TrackedBlock,
        drag: DragState,
    },
}

pub struct BlockSideActions {
    phase: Phase,
    insert_menu_open: bool,
    block_menu_open: bool,
    drag_threshold: f32,
    suppression: SelectionSuppression,
}

impl BlockSideActions {
    pub fn new(config: &ToolbarConfig, suppression: SelectionSuppression) -> Self {
        Self {
            phase: Phase::Idle,
            insert_menu_open: false,
            block_menu_open: false,
            drag_threshold: config.drag_threshold.max(0.0),
            suppression,
        }
    }

    pub fn phase(&self) -> SideActionsPhase {
        match self.phase {
            Phase::Idle => SideActionsPhase::Idle,
            Phase::Tracking { .. } => SideActionsPhase::Tracking,
            Phase::Dragging { .. } => SideActionsPhase::Dragging,
        }
    }

    pub fn tracked(&self) -> Option<&TrackedBlock> {
        match &self.phase {
            Phase::Idle => None,
            Phase::Tracking { block, .. } | Phase::Dragging { block, .. } => Some(block),
        }
    }

    pub fn drag(&self) -> Option<&DragState> {
        match &self.phase {
            Phase::Dragging { drag, .. } => Some(drag),
            Phase::Idle | Phase::Tracking { .. } => None,
        }
    }

    pub fn guide_top(&self) -> Option<f32> {
        self.drag().map(|drag| drag.target.guide_top)
    }

    /// Vertical center of the tracked block, where the handle column sits.
    pub fn handle_offset(&self) -> Option<f32> {
        self.tracked().map(|block| block.top + block.height / 2.0)
    }

    /// Whether the handles should render at all.
    pub fn is_visible(&self) -> bool {
        !matches!(self.phase, Phase::Idle) || self.insert_menu_open
    }

    pub fn insert_menu_open(&self) -> bool {
        self.insert_menu_open
    }

    pub fn block_menu_open(&self) -> bool {
        self.block_menu_open
    }

    pub fn set_insert_menu_open(&mut self, open: bool) {
        self.insert_menu_open = open;
    }

    pub fn set_block_menu_open(&mut self, open: bool) {
        self.block_menu_open = open;
    }

    pub fn handle_events(
        &mut self,
        editor: &Editor,
        layout: &dyn EditorLayout,
        events: &[EditorEvent],
    ) {
        if events
            .iter()
            .any(|event| matches!(event, EditorEvent::Updated | EditorEvent::SelectionChanged))
        {
            self.track_current_block(editor, layout);
        }
    }

    /// Tracks the top-level block holding the selection anchor. Clears
    /// tracking when there is no range selection or the block is not laid
    /// out. A running drag is left alone.
    pub fn track_current_block(&mut self, editor: &Editor, layout: &dyn EditorLayout) {
        if matches!(self.phase, Phase::Dragging { .. }) {
            return;
        }
        let key = editor
            .range_selection()
            .and_then(|_| editor.anchor_block())
            .map(|block| block.key);
        match key.and_then(|key| tracked_block(layout, key)) {
            Some(block) => self.track(block),
            None => self.clear_tracking(),
        }
    }

    /// Pointer movement over the shell while not dragging: tracks the block
    /// under the pointer, or the one whose vertical center is closest.
    pub fn hover(&mut self, editor: &Editor, layout: &dyn EditorLayout, pointer_y: f32) {
        if !matches!(self.phase, Phase::Idle | Phase::Tracking { press: None, .. }) {
            return;
        }
        let Some(shell) = layout.shell_bounds() else {
            return;
        };
        let layouts = block_layouts(editor, layout);
        let hovered = layouts
            .iter()
            .find(|(_, rect)| rect.contains_y(pointer_y))
            .or_else(|| {
                layouts.iter().min_by(|(_, a), (_, b)| {
                    let da = (pointer_y - a.center_y()).abs();
                    let db = (pointer_y - b.center_y()).abs();
                    da.total_cmp(&db)
                })
            });

        match hovered {
            Some((key, rect)) => self.track(TrackedBlock {
                key: *key,
                top: rect.top - shell.top,
                height: rect.height,
            }),
            None => self.clear_tracking(),
        }
    }

    /// Pointer left the shell. Tracking is kept while a menu is open or the
    /// handle is held.
    pub fn pointer_leave(&mut self) {
        if self.insert_menu_open || self.block_menu_open {
            return;
        }
        if matches!(self.phase, Phase::Tracking { press: None, .. }) {
            self.clear_tracking();
        }
    }

    /// Inserts an empty block of `block_type` after the tracked block (or the
    /// anchor block) and moves the caret into it.
    pub fn insert_block_after(
        &mut self,
        editor: &mut Editor,
        block_type: BlockType,
    ) -> Result<bool, CommandError> {
        self.insert_after(editor, block_type.to_block_kind())
    }

    pub fn insert_list_after(
        &mut self,
        editor: &mut Editor,
        list: ListKind,
    ) -> Result<bool, CommandError> {
        self.insert_after(editor, BlockKind::ListItem { list })
    }

    /// Removes the tracked block. The caret lands in the next block, else
    /// the previous one, else a fresh paragraph.
    pub fn delete_tracked_block(&mut self, editor: &mut Editor) -> Result<bool, CommandError> {
        let Some(key) = self.target_block(editor) else {
            debug!("delete ignored: no block tracked");
            return Ok(false);
        };
        editor.run_command("block.delete", Some(json!({ "key": key })))?;
        self.block_menu_open = false;
        Ok(true)
    }

    /// Pointer-down on the drag handle. Needs a tracked block and a closed
    /// insert menu. With a drag threshold the press waits for movement.
    pub fn pointer_down(&mut self, editor: &Editor, layout: &dyn EditorLayout, x: f32, y: f32) {
        if self.insert_menu_open {
            return;
        }
        let Phase::Tracking { press, .. } = &mut self.phase else {
            return;
        };
        if self.drag_threshold > 0.0 {
            *press = Some(PendingPress { x, y });
            return;
        }
        self.start_dragging(editor, layout, y);
    }

    pub fn pointer_move(&mut self, editor: &Editor, layout: &dyn EditorLayout, x: f32, y: f32) {
        match &mut self.phase {
            Phase::Tracking {
                press: Some(press), ..
            } => {
                let travel = (x - press.x).abs() + (y - press.y).abs();
                if travel >= self.drag_threshold {
                    self.start_dragging(editor, layout, y);
                }
            }
            Phase::Dragging { drag, .. } => {
                drag.last_pointer_y = y;
                if let Some(target) = resolve_drop_target(editor, layout, y) {
                    drag.target = target;
                }
            }
            Phase::Idle | Phase::Tracking { press: None, .. } => {}
        }
    }

    /// Pointer-up anywhere in the window. A drag commits its move unless the
    /// release lands on the toolbar; the drag state and suppression are
    /// released either way.
    pub fn pointer_up(
        &mut self,
        editor: &mut Editor,
        layout: &dyn EditorLayout,
        x: f32,
        y: f32,
    ) -> Result<DropOutcome, CommandError> {
        let phase = std::mem::replace(&mut self.phase, Phase::Idle);
        let (block, drag) = match phase {
            Phase::Dragging { block, drag } => (block, drag),
            Phase::Tracking {
                block,
                press: Some(_),
            } => {
                self.phase = Phase::Tracking { block, press: None };
                self.block_menu_open = true;
                return Ok(DropOutcome::BlockMenuOpened);
            }
            other => {
                self.phase = other;
                return Ok(DropOutcome::Ignored);
            }
        };
        self.phase = Phase::Tracking { block, press: None };
        trace!(source = %drag.source, "drag ended");

        if layout.toolbar_bounds().is_some_and(|toolbar| toolbar.contains(x, y)) {
            debug!("drag released over the toolbar");
            return Ok(DropOutcome::ReleasedOverToolbar);
        }

        let DropTarget { key: target, position, .. } = drag.target;
        if target == drag.source {
            return Ok(DropOutcome::Unchanged);
        }
        let order = block_order(editor);
        editor.run_command(
            "block.move",
            Some(json!({ "source": drag.source, "target": target, "position": position })),
        )?;
        if block_order(editor) == order {
            debug!(source = %drag.source, "drop kept the block in its slot");
            return Ok(DropOutcome::Unchanged);
        }
        Ok(DropOutcome::Moved {
            source: drag.source,
            target,
            position,
        })
    }

    /// Pointer-cancel: ends any press or drag without moving.
    pub fn pointer_cancel(&mut self) {
        let phase = std::mem::replace(&mut self.phase, Phase::Idle);
        self.phase = match phase {
            Phase::Dragging { block, .. } | Phase::Tracking { block, .. } => {
                Phase::Tracking { block, press: None }
            }
            Phase::Idle => Phase::Idle,
        };
    }

    fn start_dragging(&mut self, editor: &Editor, layout: &dyn EditorLayout, pointer_y: f32) {
        let phase = std::mem::replace(&mut self.phase, Phase::Idle);
        let Phase::Tracking { block, .. } = phase else {
            self.phase = phase;
            return;
        };

        self.block_menu_open = false;
        let target = resolve_drop_target(editor, layout, pointer_y).unwrap_or(DropTarget {
            key: block.key,
            position: DropPosition::Before,
            guide_top: block.top,
        });
        debug!(source = %block.key, "drag started");
        self.phase = Phase::Dragging {
            block,
            drag: DragState {
                source: block.key,
                last_pointer_y: pointer_y,
                target,
                _suppression: self.suppression.acquire("block drag"),
            },
        };
    }

    fn insert_after(&mut self, editor: &mut Editor, kind: BlockKind) -> Result<bool, CommandError> {
        if editor.range_selection().is_none() {
            debug!(?kind, "insert ignored: no range selection");
            return Ok(false);
        }
        let Some(key) = self.target_block(editor) else {
            return Ok(false);
        };
        editor.run_command(
            "block.insert_after",
            Some(json!({ "key": key, "kind": kind })),
        )?;
        self.insert_menu_open = false;
        Ok(true)
    }

    /// The tracked block if it still exists, else the anchor block.
    fn target_block(&self, editor: &Editor) -> Option<NodeKey> {
        self.tracked()
            .map(|block| block.key)
            .filter(|key| editor.contains(*key))
            .or_else(|| editor.anchor_block().map(|block| block.key))
    }

    fn track(&mut self, block: TrackedBlock) {
        let press = match &self.phase {
            Phase::Tracking { block: current, press } if current.key == block.key => *press,
            _ => None,
        };
        if self.tracked().map(|current| current.key) != Some(block.key) {
            trace!(key = %block.key, "tracking block");
        }
        self.phase = Phase::Tracking { block, press };
    }

    fn clear_tracking(&mut self) {
        if !matches!(self.phase, Phase::Idle) {
            trace!("tracking cleared");
        }
        self.phase = Phase::Idle;
    }
}

fn tracked_block(layout: &dyn EditorLayout, key: NodeKey) -> Option<TrackedBlock> {
    let shell = layout.shell_bounds()?;
    let rect = layout.block_bounds(key)?;
    Some(TrackedBlock {
        key,
        top: rect.top - shell.top,
        height: rect.height,
    })
}

/// Laid-out top-level blocks in document order.
fn block_layouts(editor: &Editor, layout: &dyn EditorLayout) -> Vec<(NodeKey, Rect)> {
    editor
        .doc()
        .blocks
        .iter()
        .filter_map(|block| layout.block_bounds(block.key).map(|rect| (block.key, rect)))
        .collect()
}

/// Drop slot for a pointer at `pointer_y`: before the first block whose
/// vertical midpoint lies below the pointer, else after the last block.
pub fn resolve_drop_target(
    editor: &Editor,
    layout: &dyn EditorLayout,
    pointer_y: f32,
) -> Option<DropTarget> {
    let shell = layout.shell_bounds()?;
    let layouts = block_layouts(editor, layout);
    let (last_key, last_rect) = layouts.last()?;

    let target = layouts
        .iter()
        .find(|(_, rect)| pointer_y < rect.center_y())
        .map(|(key, rect)| DropTarget {
            key: *key,
            position: DropPosition::Before,
            guide_top: rect.top - shell.top,
        })
        .unwrap_or(DropTarget {
            key: *last_key,
            position: DropPosition::After,
            guide_top: last_rect.bottom() - shell.top,
        });
    Some(target)
}

fn block_order(editor: &Editor) -> Vec<NodeKey> {
    editor.doc().blocks.iter().map(|block| block.key).collect()
}
