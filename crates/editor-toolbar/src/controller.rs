use blockdesk_editor_core::{
    CommandError, Editor, EditorEvent, ElementAlign, ListKind, StyleMap, TextFormat,
};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, trace};

use crate::config::ToolbarConfig;
use crate::format::{BlockType, FormatState, align_label, parse_int_prefix};
use crate::saved_selection::SavedSelection;

/// Which color a popover edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorTarget {
    Text,
    Highlight,
}

impl ColorTarget {
    pub fn style_property(self) -> &'static str {
        match self {
            ColorTarget::Text => "color",
            ColorTarget::Highlight => "background-color",
        }
    }

    /// Value written by the popover's clear action.
    pub fn cleared_value(self) -> &'static str {
        match self {
            ColorTarget::Text => "inherit",
            ColorTarget::Highlight => "transparent",
        }
    }
}

/// Open state of a color popover and whether its picker is mid-drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ColorPopoverState {
    pub open: bool,
    pub dragging: bool,
}

impl ColorPopoverState {
    pub fn set_open(&mut self, open: bool) {
        self.open = open;
        if !open {
            self.dragging = false;
        }
    }

    pub fn set_dragging(&mut self, dragging: bool) {
        self.dragging = dragging;
    }

    /// Clicks outside the popover close it unless the picker is dragging.
    pub fn interact_outside(&mut self) {
        if !self.dragging {
            self.set_open(false);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolbarState {
    pub formats: FormatState,
    pub block_type: BlockType,
    pub align: ElementAlign,
    pub font_family: String,
    pub font_size: u32,
    /// Text of the font size field; may hold an uncommitted edit.
    pub font_size_input: String,
    pub text_color: String,
    pub highlight: String,
    pub can_undo: bool,
    pub can_redo: bool,
}

impl ToolbarState {
    fn from_config(config: &ToolbarConfig) -> Self {
        Self {
            formats: FormatState::default(),
            block_type: BlockType::Paragraph,
            align: ElementAlign::Left,
            font_family: config.default_font_family.clone(),
            font_size: config.default_font_size,
            font_size_input: config.default_font_size.to_string(),
            text_color: config.default_text_color.clone(),
            highlight: config.default_highlight.clone(),
            can_undo: false,
            can_redo: false,
        }
    }

    pub fn block_label(&self) -> &'static str {
        self.block_type.label()
    }

    pub fn align_label(&self) -> &'static str {
        align_label(self.align)
    }

    pub fn color(&self, target: ColorTarget) -> &str {
        match target {
            ColorTarget::Text => &self.text_color,
            ColorTarget::Highlight => &self.highlight,
        }
    }
}

/// Toolbar state synced from the editor selection, plus the actions that
/// write back into the document.
pub struct ToolbarController {
    config: ToolbarConfig,
    state: ToolbarState,
    saved: SavedSelection,
    text_color_popover: ColorPopoverState,
    highlight_popover: ColorPopoverState,
}

impl Default for ToolbarController {
    fn default() -> Self {
        Self::new(ToolbarConfig::default())
    }
}

impl ToolbarController {
    pub fn new(config: ToolbarConfig) -> Self {
        Self {
            state: ToolbarState::from_config(&config),
            config,
            saved: SavedSelection::new(),
            text_color_popover: ColorPopoverState::default(),
            highlight_popover: ColorPopoverState::default(),
        }
    }

    /// Shares `saved` with other holders instead of a private cell.
    pub fn with_saved_selection(mut self, saved: SavedSelection) -> Self {
        self.saved = saved;
        self
    }

    pub fn config(&self) -> &ToolbarConfig {
        &self.config
    }

    pub fn state(&self) -> &ToolbarState {
        &self.state
    }

    pub fn saved_selection(&self) -> &SavedSelection {
        &self.saved
    }

    pub fn popover(&self, target: ColorTarget) -> &ColorPopoverState {
        match target {
            ColorTarget::Text => &self.text_color_popover,
            ColorTarget::Highlight => &self.highlight_popover,
        }
    }

    pub fn popover_mut(&mut self, target: ColorTarget) -> &mut ColorPopoverState {
        match target {
            ColorTarget::Text => &mut self.text_color_popover,
            ColorTarget::Highlight => &mut self.highlight_popover,
        }
    }

    /// Applies drained editor notifications. Content and selection changes
    /// resync once per batch.
    pub fn handle_events(&mut self, editor: &Editor, events: &[EditorEvent]) {
        let mut needs_sync = false;
        for event in events {
            match *event {
                EditorEvent::Updated | EditorEvent::SelectionChanged => needs_sync = true,
                EditorEvent::CanUndo(can_undo) => self.state.can_undo = can_undo,
                EditorEvent::CanRedo(can_redo) => self.state.can_redo = can_redo,
            }
        }
        if needs_sync {
            self.sync(editor);
        }
    }

    /// Re-reads formats, block type, alignment and inline styles from the
    /// selection. Without a range selection the state is left as is.
    pub fn sync(&mut self, editor: &Editor) -> bool {
        let Some(range) = editor.range_selection() else {
            trace!("toolbar sync skipped: no range selection");
            return false;
        };
        self.saved.record(range);

        let (block_type, align) = editor
            .anchor_block()
            .map(|block| (BlockType::from_block_kind(block.kind), block.align))
            .unwrap_or_default();

        let default_size = format!("{}px", self.config.default_font_size);
        let font_size = parse_int_prefix(&editor.selection_style_value("font-size", &default_size))
            .and_then(|size| u32::try_from(size).ok())
            .filter(|size| *size > 0)
            .unwrap_or(self.config.default_font_size);

        self.state = ToolbarState {
            formats: FormatState::from_editor(editor),
            block_type,
            align,
            font_family: editor
                .selection_style_value("font-family", &self.config.default_font_family)
                .replace('"', ""),
            font_size,
            font_size_input: font_size.to_string(),
            text_color: editor.selection_style_value("color", &self.config.default_text_color),
            highlight: editor
                .selection_style_value("background-color", &self.config.default_highlight),
            can_undo: self.state.can_undo,
            can_redo: self.state.can_redo,
        };
        true
    }

    /// Converts the selected blocks. No-op without a range selection.
    pub fn apply_block_type(
        &mut self,
        editor: &mut Editor,
        block_type: BlockType,
    ) -> Result<bool, CommandError> {
        if editor.range_selection().is_none() {
            debug!(?block_type, "block type ignored: no range selection");
            return Ok(false);
        }
        editor.run_command(
            "block.set_type",
            Some(json!({ "kind": block_type.to_block_kind() })),
        )?;
        self.state.block_type = block_type;
        Ok(true)
    }

    /// Patches inline styles onto the selection. When the editor has no
    /// range selection the last saved one is restored first; if that no
    /// longer resolves the patch is dropped.
    pub fn apply_style(
        &mut self,
        editor: &mut Editor,
        styles: &StyleMap,
    ) -> Result<bool, CommandError> {
        if editor.range_selection().is_none() && !self.saved.restore(editor) {
            debug!(styles = %styles.to_css(), "style patch dropped: no selection to restore");
            return Ok(false);
        }
        editor.run_command("text.patch_style", Some(json!({ "styles": styles })))?;
        Ok(true)
    }

    pub fn apply_align(
        &mut self,
        editor: &mut Editor,
        align: ElementAlign,
    ) -> Result<(), CommandError> {
        editor.run_command("block.set_align", Some(json!({ "align": align })))?;
        self.state.align = align;
        Ok(())
    }

    pub fn select_font_family(
        &mut self,
        editor: &mut Editor,
        family: &str,
    ) -> Result<bool, CommandError> {
        self.state.font_family = family.to_string();
        self.apply_style(editor, &StyleMap::from([("font-family", family)]))
    }

    /// Clamps `size` to the configured bounds, updates the field and patches
    /// `font-size`.
    pub fn apply_font_size(
        &mut self,
        editor: &mut Editor,
        size: i64,
    ) -> Result<bool, CommandError> {
        let size = self.config.clamp_font_size(size);
        self.state.font_size = size;
        self.state.font_size_input = size.to_string();
        let value = format!("{size}px");
        self.apply_style(editor, &StyleMap::from([("font-size", value.as_str())]))
    }

    pub fn increment_font_size(&mut self, editor: &mut Editor) -> Result<bool, CommandError> {
        self.apply_font_size(editor, i64::from(self.state.font_size) + 1)
    }

    pub fn decrement_font_size(&mut self, editor: &mut Editor) -> Result<bool, CommandError> {
        self.apply_font_size(editor, i64::from(self.state.font_size) - 1)
    }

    pub fn set_font_size_input(&mut self, input: impl Into<String>) {
        self.state.font_size_input = input.into();
    }

    /// Commits the font size field (blur or Enter). Input without a leading
    /// integer reverts the field and leaves the document alone.
    pub fn commit_font_size_input(&mut self, editor: &mut Editor) -> Result<bool, CommandError> {
        match parse_int_prefix(&self.state.font_size_input) {
            Some(size) => self.apply_font_size(editor, size),
            None => {
                debug!(input = %self.state.font_size_input, "font size input reverted");
                self.state.font_size_input = self.state.font_size.to_string();
                Ok(false)
            }
        }
    }

    pub fn apply_color(
        &mut self,
        editor: &mut Editor,
        target: ColorTarget,
        color: &str,
    ) -> Result<bool, CommandError> {
        match target {
            ColorTarget::Text => self.state.text_color = color.to_string(),
            ColorTarget::Highlight => self.state.highlight = color.to_string(),
        }
        self.apply_style(editor, &StyleMap::from([(target.style_property(), color)]))
    }

    pub fn clear_color(
        &mut self,
        editor: &mut Editor,
        target: ColorTarget,
    ) -> Result<bool, CommandError> {
        self.apply_color(editor, target, target.cleared_value())
    }

    pub fn clear_text_color(&mut self, editor: &mut Editor) -> Result<bool, CommandError> {
        self.clear_color(editor, ColorTarget::Text)
    }

    pub fn clear_highlight(&mut self, editor: &mut Editor) -> Result<bool, CommandError> {
        self.clear_color(editor, ColorTarget::Highlight)
    }

    pub fn toggle_format(
        &mut self,
        editor: &mut Editor,
        format: TextFormat,
    ) -> Result<(), CommandError> {
        editor.run_command(
            "text.toggle_format",
            Some(json!({ "format": format.as_str() })),
        )
    }

    pub fn indent(&mut self, editor: &mut Editor) -> Result<(), CommandError> {
        editor.run_command("block.indent", None)
    }

    pub fn outdent(&mut self, editor: &mut Editor) -> Result<(), CommandError> {
        editor.run_command("block.outdent", None)
    }

    pub fn insert_list(&mut self, editor: &mut Editor, list: ListKind) -> Result<(), CommandError> {
        editor.run_command("list.insert", Some(json!({ "list": list })))
    }

    pub fn remove_list(&mut self, editor: &mut Editor) -> Result<(), CommandError> {
        editor.run_command("list.remove", None)
    }

    pub fn undo(&mut self, editor: &mut Editor) -> Result<(), CommandError> {
        editor.run_command("history.undo", None)
    }

    pub fn redo(&mut self, editor: &mut Editor) -> Result<(), CommandError> {
        editor.run_command("history.redo", None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closing_a_popover_resets_dragging() {
        let mut popover = ColorPopoverState::default();
        popover.set_open(true);
        popover.set_dragging(true);

        popover.interact_outside();
        assert!(popover.open);

        popover.set_open(false);
        assert!(!popover.dragging);

        popover.set_open(true);
        popover.interact_outside();
        assert!(!popover.open);
    }
}
