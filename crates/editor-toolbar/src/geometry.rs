use std::collections::HashMap;

use blockdesk_editor_core::NodeKey;
use serde::{Deserialize, Serialize};

/// Screen-space rectangle in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    pub fn center_x(&self) -> f32 {
        self.left + self.width / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.top + self.height / 2.0
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0.0 && self.height == 0.0
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.left && x <= self.right() && y >= self.top && y <= self.bottom()
    }

    pub fn contains_y(&self, y: f32) -> bool {
        y >= self.top && y <= self.bottom()
    }
}

/// Read access to where the host rendered the editor.
///
/// All rectangles share one coordinate space (the window). Missing
/// rectangles mean the element is not laid out.
pub trait EditorLayout {
    /// The scroll container that side actions and guides are positioned in.
    fn shell_bounds(&self) -> Option<Rect>;

    fn block_bounds(&self, key: NodeKey) -> Option<Rect>;

    /// Bounding box of the native text selection.
    fn selection_bounds(&self) -> Option<Rect>;

    /// Bounds of the toolbar region. Drag releases inside it never drop.
    fn toolbar_bounds(&self) -> Option<Rect> {
        None
    }

    fn viewport_width(&self) -> f32;
}

/// Layout captured once per frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutSnapshot {
    pub shell: Option<Rect>,
    pub blocks: HashMap<NodeKey, Rect>,
    pub selection: Option<Rect>,
    pub toolbar: Option<Rect>,
    pub viewport_width: f32,
}

impl LayoutSnapshot {
    pub fn new(shell: Rect, viewport_width: f32) -> Self {
        Self {
            shell: Some(shell),
            viewport_width,
            ..Default::default()
        }
    }

    pub fn with_block(mut self, key: NodeKey, bounds: Rect) -> Self {
        self.blocks.insert(key, bounds);
        self
    }

    /// Stacks `keys` top to bottom from the shell's top edge, `height` each.
    pub fn with_stacked_blocks(
        mut self,
        keys: impl IntoIterator<Item = NodeKey>,
        height: f32,
    ) -> Self {
        let shell = self.shell.unwrap_or_default();
        let mut top = shell.top;
        for key in keys {
            self.blocks
                .insert(key, Rect::new(shell.left, top, shell.width, height));
            top += height;
        }
        self
    }

    pub fn with_selection(mut self, bounds: Rect) -> Self {
        self.selection = Some(bounds);
        self
    }

    pub fn with_toolbar(mut self, bounds: Rect) -> Self {
        self.toolbar = Some(bounds);
        self
    }
}

impl EditorLayout for LayoutSnapshot {
    fn shell_bounds(&self) -> Option<Rect> {
        self.shell
    }

    fn block_bounds(&self, key: NodeKey) -> Option<Rect> {
        self.blocks.get(&key).copied()
    }

    fn selection_bounds(&self) -> Option<Rect> {
        self.selection
    }

    fn toolbar_bounds(&self) -> Option<Rect> {
        self.toolbar
    }

    fn viewport_width(&self) -> f32 {
        self.viewport_width
    }
}
