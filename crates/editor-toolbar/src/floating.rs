use blockdesk_editor_core::{CommandError, Editor, EditorEvent, TextFormat};
use serde::Serialize;
use serde_json::json;
use tracing::trace;

use crate::config::FloatingToolbarConfig;
use crate::format::FormatState;
use crate::geometry::{EditorLayout, Rect};

/// Where the floating toolbar sits. `center_x` is the horizontal center;
/// `top` is the top edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FloatingPosition {
    pub center_x: f32,
    pub top: f32,
}

impl FloatingPosition {
    pub fn left(&self, width: f32) -> f32 {
        self.center_x - width / 2.0
    }
}

/// Contextual format toolbar shown over a non-collapsed text selection.
#[derive(Debug, Clone, Default)]
pub struct SelectionFloatingToolbar {
    config: FloatingToolbarConfig,
    measured: Option<(f32, f32)>,
    position: Option<FloatingPosition>,
    formats: FormatState,
}

impl SelectionFloatingToolbar {
    pub fn new(config: FloatingToolbarConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn position(&self) -> Option<FloatingPosition> {
        self.position
    }

    pub fn is_visible(&self) -> bool {
        self.position.is_some()
    }

    pub fn formats(&self) -> &FormatState {
        &self.formats
    }

    /// Rendered size of the toolbar; the configured fallback is used until
    /// this is known.
    pub fn set_measured_size(&mut self, width: f32, height: f32) {
        self.measured = Some((width, height));
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
            self.sync(editor, layout);
        }
    }

    /// Also call on scroll and resize.
    pub fn sync(&mut self, editor: &Editor, layout: &dyn EditorLayout) {
        let visible_range = editor
            .range_selection()
            .is_some_and(|range| !range.is_collapsed());
        let rect = layout.selection_bounds().filter(|rect| !rect.is_empty());

        let (true, Some(rect)) = (visible_range, rect) else {
            if self.position.take().is_some() {
                trace!("floating toolbar hidden");
            }
            return;
        };

        self.formats = FormatState::from_editor(editor);
        self.position = Some(self.place(rect, layout.viewport_width()));
    }

    pub fn format_text(
        &mut self,
        editor: &mut Editor,
        format: TextFormat,
    ) -> Result<(), CommandError> {
        editor.run_command(
            "text.toggle_format",
            Some(json!({ "format": format.as_str() })),
        )
    }

    fn place(&self, rect: Rect, viewport_width: f32) -> FloatingPosition {
        let FloatingToolbarConfig {
            viewport_margin: margin,
            gap,
            fallback_width,
            fallback_height,
        } = self.config;
        let (width, height) = self.measured.unwrap_or((fallback_width, fallback_height));

        let min_center = margin + width / 2.0;
        let max_center = viewport_width - margin - width / 2.0;
        let center_x = min_center.max(max_center.min(rect.center_x()));

        let above = rect.top - height - gap;
        let top = if above < margin {
            rect.bottom() + gap
        } else {
            above
        };
        FloatingPosition { center_x, top }
    }
}
