use std::rc::Rc;

use blockdesk_editor_core::{ElementAlign, ListKind, TextFormat};
use blockdesk_toolbar::{
    ALIGN_OPTIONS, BlockType, ColorTarget, FormatState, ToolbarConfig, ToolbarController,
    align_label,
};
use gpui::InteractiveElement as _;
use gpui::prelude::FluentBuilder as _;
use gpui::{
    App, ClickEvent, Entity, IntoElement, MouseButton, ParentElement, RenderOnce,
    SharedString, Styled, Window, div, px,
};
use gpui_component::ActiveTheme as _;
use gpui_component::Disableable as _;
use gpui_component::Selectable as _;
use gpui_component::input::InputState;
use gpui_component::popover::Popover;

use crate::buttons::{
    ClickHandler, ColorSwatchButton, ToolbarDropdownButton, ToolbarIconButton, ToolbarStepper,
};
use crate::icon::ToolbarIconName;

pub type SelectHandler<T> = Rc<dyn Fn(T, &mut Window, &mut App)>;

fn click_handler(
    on_click: impl Fn(&ClickEvent, &mut Window, &mut App) + 'static,
) -> Option<ClickHandler> {
    Some(Rc::new(on_click))
}

fn select_click<T: Copy + 'static>(
    handler: &Option<SelectHandler<T>>,
    value: T,
) -> Option<ClickHandler> {
    let handler = handler.clone()?;
    click_handler(move |_, window, cx| handler(value, window, cx))
}

fn format_label(format: TextFormat) -> &'static str {
    match format {
        TextFormat::Bold => "Bold",
        TextFormat::Italic => "Italic",
        TextFormat::Underline => "Underline",
        TextFormat::Strikethrough => "Strikethrough",
        TextFormat::Code => "Code",
    }
}

/// A dropdown whose popover lists `options` and marks `active`.
fn option_menu<T>(
    id: &'static str,
    trigger: ToolbarDropdownButton,
    options: Vec<(T, SharedString)>,
    active: T,
    on_select: Option<SelectHandler<T>>,
) -> impl IntoElement
where
    T: Clone + PartialEq + 'static,
{
    Popover::new(id)
        .appearance(false)
        .trigger(trigger)
        .content(move |_, _window, cx| {
            let theme = cx.theme();
            let popover = cx.entity();

            div()
                .p(px(4.))
                .min_w(px(160.))
                .bg(theme.popover)
                .border_1()
                .border_color(theme.border)
                .rounded(theme.radius)
                .shadow_md()
                .flex()
                .flex_col()
                .gap(px(2.))
                .children(options.iter().enumerate().map(|(ix, (value, label))| {
                    let is_active = *value == active;
                    let value = value.clone();
                    let popover = popover.clone();
                    let on_select = on_select.clone();

                    div()
                        .id(ix)
                        .flex()
                        .items_center()
                        .h(px(28.))
                        .px(px(8.))
                        .rounded(px(4.))
                        .text_sm()
                        .text_color(theme.popover_foreground)
                        .cursor_pointer()
                        .hover(|this| this.bg(theme.accent.alpha(0.4)))
                        .when(is_active, |this| {
                            this.bg(theme.accent).text_color(theme.accent_foreground)
                        })
                        .on_mouse_down(MouseButton::Left, move |_, window, cx| {
                            window.prevent_default();
                            if let Some(on_select) = &on_select {
                                on_select(value.clone(), window, cx);
                            }
                            popover.update(cx, |state, cx| state.dismiss(window, cx));
                        })
                        .child(label.clone())
                }))
        })
}

#[derive(IntoElement)]
pub struct HistoryGroup {
    can_undo: bool,
    can_redo: bool,
    on_undo: Option<ClickHandler>,
    on_redo: Option<ClickHandler>,
}

impl HistoryGroup {
    pub fn new(controller: &ToolbarController) -> Self {
        let state = controller.state();
        Self {
            can_undo: state.can_undo,
            can_redo: state.can_redo,
            on_undo: None,
            on_redo: None,
        }
    }

    pub fn on_undo(mut self, f: impl Fn(&ClickEvent, &mut Window, &mut App) + 'static) -> Self {
        self.on_undo = click_handler(f);
        self
    }

    pub fn on_redo(mut self, f: impl Fn(&ClickEvent, &mut Window, &mut App) + 'static) -> Self {
        self.on_redo = click_handler(f);
        self
    }
}

impl RenderOnce for HistoryGroup {
    fn render(self, _: &mut Window, _: &mut App) -> impl IntoElement {
        div()
            .flex()
            .items_center()
            .gap(px(2.))
            .child(
                ToolbarIconButton::new("toolbar-undo", ToolbarIconName::Undo2)
                    .tooltip("Undo")
                    .disabled(!self.can_undo)
                    .on_click_handler(self.on_undo),
            )
            .child(
                ToolbarIconButton::new("toolbar-redo", ToolbarIconName::Redo2)
                    .tooltip("Redo")
                    .disabled(!self.can_redo)
                    .on_click_handler(self.on_redo),
            )
    }
}

/// Block type dropdown, font family dropdown and font size stepper.
#[derive(IntoElement)]
pub struct BlockFontGroup {
    block_type: BlockType,
    font_family: SharedString,
    font_options: Vec<SharedString>,
    font_size_input: Entity<InputState>,
    on_block_type: Option<SelectHandler<BlockType>>,
    on_font_family: Option<SelectHandler<SharedString>>,
    on_decrement: Option<ClickHandler>,
    on_increment: Option<ClickHandler>,
}

impl BlockFontGroup {
    /// `font_size_input` is the host's text field for the size; the host
    /// mirrors `ToolbarState::font_size_input` into it and commits on blur.
    pub fn new(controller: &ToolbarController, font_size_input: &Entity<InputState>) -> Self {
        let state = controller.state();
        let config: &ToolbarConfig = controller.config();
        Self {
            block_type: state.block_type,
            font_family: state.font_family.clone().into(),
            font_options: config
                .font_options
                .iter()
                .cloned()
                .map(SharedString::from)
                .collect(),
            font_size_input: font_size_input.clone(),
            on_block_type: None,
            on_font_family: None,
            on_decrement: None,
            on_increment: None,
        }
    }

    pub fn on_block_type(
        mut self,
        f: impl Fn(BlockType, &mut Window, &mut App) + 'static,
    ) -> Self {
        self.on_block_type = Some(Rc::new(f));
        self
    }

    pub fn on_font_family(
        mut self,
        f: impl Fn(SharedString, &mut Window, &mut App) + 'static,
    ) -> Self {
        self.on_font_family = Some(Rc::new(f));
        self
    }

    pub fn on_decrement(
        mut self,
        f: impl Fn(&ClickEvent, &mut Window, &mut App) + 'static,
    ) -> Self {
        self.on_decrement = click_handler(f);
        self
    }

    pub fn on_increment(
        mut self,
        f: impl Fn(&ClickEvent, &mut Window, &mut App) + 'static,
    ) -> Self {
        self.on_increment = click_handler(f);
        self
    }
}

impl RenderOnce for BlockFontGroup {
    fn render(self, _: &mut Window, _: &mut App) -> impl IntoElement {
        let block_options = BlockType::ALL
            .into_iter()
            .map(|block_type| (block_type, SharedString::from(block_type.label())))
            .collect();
        let font_options = self
            .font_options
            .iter()
            .map(|family| (family.clone(), family.clone()))
            .collect();

        div()
            .flex()
            .items_center()
            .gap(px(4.))
            .child(option_menu(
                "toolbar-block-type",
                ToolbarDropdownButton::new("toolbar-block-type-trigger")
                    .tooltip("Block type")
                    .min_width(px(110.))
                    .child(self.block_type.label()),
                block_options,
                self.block_type,
                self.on_block_type,
            ))
            .child(option_menu(
                "toolbar-font-family",
                ToolbarDropdownButton::new("toolbar-font-family-trigger")
                    .tooltip("Font")
                    .min_width(px(120.))
                    .child(self.font_family.clone()),
                font_options,
                self.font_family,
                self.on_font_family,
            ))
            .child(
                ToolbarStepper::new("toolbar-font-size", &self.font_size_input)
                    .on_decrement(self.on_decrement)
                    .on_increment(self.on_increment),
            )
    }
}

/// Alignment dropdown plus outdent and indent.
#[derive(IntoElement)]
pub struct AlignmentGroup {
    align: ElementAlign,
    on_align: Option<SelectHandler<ElementAlign>>,
    on_outdent: Option<ClickHandler>,
    on_indent: Option<ClickHandler>,
}

impl AlignmentGroup {
    pub fn new(controller: &ToolbarController) -> Self {
        Self {
            align: controller.state().align,
            on_align: None,
            on_outdent: None,
            on_indent: None,
        }
    }

    pub fn on_align(mut self, f: impl Fn(ElementAlign, &mut Window, &mut App) + 'static) -> Self {
        self.on_align = Some(Rc::new(f));
        self
    }

    pub fn on_outdent(
        mut self,
        f: impl Fn(&ClickEvent, &mut Window, &mut App) + 'static,
    ) -> Self {
        self.on_outdent = click_handler(f);
        self
    }

    pub fn on_indent(mut self, f: impl Fn(&ClickEvent, &mut Window, &mut App) + 'static) -> Self {
        self.on_indent = click_handler(f);
        self
    }
}

impl RenderOnce for AlignmentGroup {
    fn render(self, _: &mut Window, _: &mut App) -> impl IntoElement {
        let options = ALIGN_OPTIONS
            .into_iter()
            .map(|align| (align, SharedString::from(align_label(align))))
            .collect();

        div()
            .flex()
            .items_center()
            .gap(px(2.))
            .child(option_menu(
                "toolbar-align",
                ToolbarDropdownButton::new("toolbar-align-trigger")
                    .tooltip(align_label(self.align))
                    .child(ToolbarIconName::for_align(self.align)),
                options,
                self.align,
                self.on_align,
            ))
            .child(
                ToolbarIconButton::new("toolbar-outdent", ToolbarIconName::IndentDecrease)
                    .tooltip("Outdent")
                    .on_click_handler(self.on_outdent),
            )
            .child(
                ToolbarIconButton::new("toolbar-indent", ToolbarIconName::IndentIncrease)
                    .tooltip("Indent")
                    .on_click_handler(self.on_indent),
            )
    }
}

/// Inline format toggles, highlighted while active in the selection.
#[derive(IntoElement)]
pub struct TextFormatGroup {
    formats: FormatState,
    on_toggle: Option<SelectHandler<TextFormat>>,
}

impl TextFormatGroup {
    pub fn new(formats: FormatState) -> Self {
        Self {
            formats,
            on_toggle: None,
        }
    }

    pub fn from_controller(controller: &ToolbarController) -> Self {
        Self::new(controller.state().formats)
    }

    pub fn on_toggle(mut self, f: impl Fn(TextFormat, &mut Window, &mut App) + 'static) -> Self {
        self.on_toggle = Some(Rc::new(f));
        self
    }
}

impl RenderOnce for TextFormatGroup {
    fn render(self, _: &mut Window, _: &mut App) -> impl IntoElement {
        div()
            .flex()
            .items_center()
            .gap(px(2.))
            .children(TextFormat::ALL.into_iter().map(|format| {
                ToolbarIconButton::new(
                    SharedString::from(format!("toolbar-format-{}", format.as_str())),
                    ToolbarIconName::for_format(format),
                )
                .tooltip(format_label(format))
                .selected(self.formats.get(format))
                .on_click_handler(select_click(&self.on_toggle, format))
            }))
    }
}

/// List buttons and the two color triggers. The color popovers themselves
/// belong to the host.
#[derive(IntoElement)]
pub struct ListColorGroup {
    text_color: String,
    highlight: String,
    text_color_open: bool,
    highlight_open: bool,
    on_list: Option<SelectHandler<ListKind>>,
    on_clear_list: Option<ClickHandler>,
    on_text_color: Option<ClickHandler>,
    on_highlight: Option<ClickHandler>,
}

impl ListColorGroup {
    pub fn new(controller: &ToolbarController) -> Self {
        let state = controller.state();
        Self {
            text_color: state.color(ColorTarget::Text).to_string(),
            highlight: state.color(ColorTarget::Highlight).to_string(),
            text_color_open: controller.popover(ColorTarget::Text).open,
            highlight_open: controller.popover(ColorTarget::Highlight).open,
            on_list: None,
            on_clear_list: None,
            on_text_color: None,
            on_highlight: None,
        }
    }

    pub fn on_list(mut self, f: impl Fn(ListKind, &mut Window, &mut App) + 'static) -> Self {
        self.on_list = Some(Rc::new(f));
        self
    }

    pub fn on_clear_list(
        mut self,
        f: impl Fn(&ClickEvent, &mut Window, &mut App) + 'static,
    ) -> Self {
        self.on_clear_list = click_handler(f);
        self
    }

    pub fn on_text_color(
        mut self,
        f: impl Fn(&ClickEvent, &mut Window, &mut App) + 'static,
    ) -> Self {
        self.on_text_color = click_handler(f);
        self
    }

    pub fn on_highlight(
        mut self,
        f: impl Fn(&ClickEvent, &mut Window, &mut App) + 'static,
    ) -> Self {
        self.on_highlight = click_handler(f);
        self
    }
}

impl RenderOnce for ListColorGroup {
    fn render(self, _: &mut Window, _: &mut App) -> impl IntoElement {
        div()
            .flex()
            .items_center()
            .gap(px(2.))
            .child(
                ToolbarIconButton::new("toolbar-list-bullet", ToolbarIconName::List)
                    .tooltip("Bulleted list")
                    .on_click_handler(select_click(&self.on_list, ListKind::Bullet)),
            )
            .child(
                ToolbarIconButton::new("toolbar-list-number", ToolbarIconName::ListOrdered)
                    .tooltip("Numbered list")
                    .on_click_handler(select_click(&self.on_list, ListKind::Number)),
            )
            .child(
                ToolbarIconButton::new("toolbar-list-clear", ToolbarIconName::ListX)
                    .tooltip("Remove list")
                    .on_click_handler(self.on_clear_list),
            )
            .child(
                ColorSwatchButton::new(
                    "toolbar-text-color",
                    ToolbarIconName::Baseline,
                    &self.text_color,
                )
                .tooltip("Text color")
                .selected(self.text_color_open)
                .on_click_handler(self.on_text_color),
            )
            .child(
                ColorSwatchButton::new(
                    "toolbar-highlight",
                    ToolbarIconName::Highlighter,
                    &self.highlight,
                )
                .tooltip("Highlight")
                .selected(self.highlight_open)
                .on_click_handler(self.on_highlight),
            )
    }
}
