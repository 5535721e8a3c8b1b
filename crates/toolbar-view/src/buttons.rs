use std::rc::Rc;

use blockdesk_toolbar::{ParsedColor, parse_color};
use gpui::InteractiveElement as _;
use gpui::StatefulInteractiveElement as _;
use gpui::prelude::FluentBuilder as _;
use gpui::{
    AnyElement, App, ClickEvent, ElementId, Entity, Hsla, IntoElement, MouseButton,
    ParentElement, Pixels, RenderOnce, SharedString, StyleRefinement, Styled, Window, div, px,
    rgb,
};
use gpui_component::ActiveTheme as _;
use gpui_component::Disableable;
use gpui_component::Selectable;
use gpui_component::StyledExt as _;
use gpui_component::input::{Input, InputState};
use gpui_component::tooltip::Tooltip;
use gpui_component::{Icon, IconNamed};

use crate::icon::ToolbarIconName;

pub type ClickHandler = Rc<dyn Fn(&ClickEvent, &mut Window, &mut App)>;

/// Swatch color for a CSS color value; `None` for transparent or
/// unparseable values.
pub fn swatch_color(value: &str) -> Option<Hsla> {
    match parse_color(value)? {
        ParsedColor::Transparent => None,
        ParsedColor::Rgb(c) => {
            Some(rgb((u32::from(c.r) << 16) | (u32::from(c.g) << 8) | u32::from(c.b)).into())
        }
    }
}

/// Base toolbar button. Pressing it never takes focus from the editor.
#[derive(IntoElement)]
pub struct ToolbarButton {
    id: ElementId,
    style: StyleRefinement,
    tooltip: Option<SharedString>,
    disabled: bool,
    selected: bool,
    spread: bool,
    min_width: Pixels,
    padding_x: Pixels,
    children: Vec<AnyElement>,
    on_click: Option<ClickHandler>,
}

impl ToolbarButton {
    pub fn new(id: impl Into<ElementId>) -> Self {
        Self {
            id: id.into(),
            style: StyleRefinement::default(),
            tooltip: None,
            disabled: false,
            selected: false,
            spread: false,
            min_width: px(32.),
            padding_x: px(6.),
            children: Vec::new(),
            on_click: None,
        }
    }

    pub fn tooltip(mut self, tooltip: impl Into<SharedString>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }

    pub fn on_click(
        mut self,
        on_click: impl Fn(&ClickEvent, &mut Window, &mut App) + 'static,
    ) -> Self {
        self.on_click = Some(Rc::new(on_click));
        self
    }

    pub fn on_click_handler(mut self, on_click: Option<ClickHandler>) -> Self {
        self.on_click = on_click;
        self
    }

    /// Pushes the first child left and the last right.
    pub fn spread(mut self) -> Self {
        self.spread = true;
        self
    }

    pub fn min_width(mut self, min_width: Pixels) -> Self {
        self.min_width = min_width;
        self
    }

    pub fn padding_x(mut self, padding_x: Pixels) -> Self {
        self.padding_x = padding_x;
        self
    }
}

impl ParentElement for ToolbarButton {
    fn extend(&mut self, elements: impl IntoIterator<Item = AnyElement>) {
        self.children.extend(elements);
    }
}

impl Styled for ToolbarButton {
    fn style(&mut self) -> &mut StyleRefinement {
        &mut self.style
    }
}

impl Selectable for ToolbarButton {
    fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    fn is_selected(&self) -> bool {
        self.selected
    }
}

impl Disableable for ToolbarButton {
    fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}

impl RenderOnce for ToolbarButton {
    fn render(self, _window: &mut Window, cx: &mut App) -> impl IntoElement {
        let theme = cx.theme();
        let disabled = self.disabled;
        let clickable = self.on_click.is_some() && !disabled;

        let mut disabled_fg = theme.muted_foreground;
        disabled_fg.a *= 0.6;

        div()
            .id(self.id)
            .flex()
            .items_center()
            .gap(px(6.))
            .h(px(32.))
            .min_w(self.min_width)
            .px(self.padding_x)
            .rounded(px(6.))
            .text_size(px(12.))
            .font_weight(gpui::FontWeight::MEDIUM)
            .bg(theme.transparent)
            .text_color(if disabled {
                disabled_fg
            } else {
                theme.foreground
            })
            .map(|this| {
                if self.spread {
                    this.justify_between()
                } else {
                    this.justify_center()
                }
            })
            .when(!disabled, |this| {
                this.cursor_pointer()
                    .hover(|this| this.bg(theme.muted).text_color(theme.muted_foreground))
                    .active(|this| this.bg(theme.accent).text_color(theme.accent_foreground))
            })
            .when(self.selected, |this| {
                this.bg(theme.accent).text_color(theme.accent_foreground)
            })
            .refine_style(&self.style)
            .on_mouse_down(MouseButton::Left, move |_, window, cx| {
                if !clickable {
                    cx.stop_propagation();
                    return;
                }
                // Keep the editor's selection alive.
                window.prevent_default();
            })
            .when_some(self.on_click, |this, on_click| {
                this.on_click(move |event, window, cx| {
                    if !clickable {
                        cx.stop_propagation();
                        return;
                    }
                    on_click(event, window, cx);
                })
            })
            .children(self.children)
            .when_some(self.tooltip, |this, tooltip| {
                this.tooltip(move |window, cx| Tooltip::new(tooltip.clone()).build(window, cx))
            })
    }
}

#[derive(IntoElement)]
pub struct ToolbarIconButton {
    base: ToolbarButton,
}

impl ToolbarIconButton {
    pub fn new(id: impl Into<ElementId>, icon: impl IconNamed) -> Self {
        Self {
            base: ToolbarButton::new(id).child(Icon::new(icon)),
        }
    }

    pub fn tooltip(mut self, tooltip: impl Into<SharedString>) -> Self {
        self.base = self.base.tooltip(tooltip);
        self
    }

    pub fn on_click_handler(mut self, on_click: Option<ClickHandler>) -> Self {
        self.base = self.base.on_click_handler(on_click);
        self
    }
}

impl Selectable for ToolbarIconButton {
    fn selected(mut self, selected: bool) -> Self {
        self.base = self.base.selected(selected);
        self
    }

    fn is_selected(&self) -> bool {
        self.base.is_selected()
    }
}

impl Disableable for ToolbarIconButton {
    fn disabled(mut self, disabled: bool) -> Self {
        self.base = self.base.disabled(disabled);
        self
    }
}

impl RenderOnce for ToolbarIconButton {
    fn render(self, window: &mut Window, cx: &mut App) -> impl IntoElement {
        self.base.render(window, cx)
    }
}

/// Popover trigger showing the current value and a chevron.
#[derive(IntoElement)]
pub struct ToolbarDropdownButton {
    id: ElementId,
    tooltip: Option<SharedString>,
    selected: bool,
    min_width: Pixels,
    label: Vec<AnyElement>,
}

impl ToolbarDropdownButton {
    pub fn new(id: impl Into<ElementId>) -> Self {
        Self {
            id: id.into(),
            tooltip: None,
            selected: false,
            min_width: px(32.),
            label: Vec::new(),
        }
    }

    pub fn tooltip(mut self, tooltip: impl Into<SharedString>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }

    pub fn min_width(mut self, min_width: Pixels) -> Self {
        self.min_width = min_width;
        self
    }
}

impl ParentElement for ToolbarDropdownButton {
    fn extend(&mut self, elements: impl IntoIterator<Item = AnyElement>) {
        self.label.extend(elements);
    }
}

impl Selectable for ToolbarDropdownButton {
    fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    fn is_selected(&self) -> bool {
        self.selected
    }
}

impl RenderOnce for ToolbarDropdownButton {
    fn render(self, window: &mut Window, cx: &mut App) -> impl IntoElement {
        let chevron = Icon::new(ToolbarIconName::ChevronDown)
            .size_3p5()
            .text_color(cx.theme().muted_foreground);

        let mut button = ToolbarButton::new(self.id)
            .spread()
            .min_width(self.min_width)
            .selected(self.selected)
            // The popover opens on its own; a handler keeps the button live.
            .on_click(|_, _, _| {})
            .child(
                div()
                    .flex_1()
                    .flex()
                    .items_center()
                    .gap(px(6.))
                    .overflow_hidden()
                    .children(self.label),
            )
            .child(chevron);
        if let Some(tooltip) = self.tooltip {
            button = button.tooltip(tooltip);
        }
        button.render(window, cx)
    }
}

#[derive(IntoElement)]
pub struct ToolbarSeparator;

impl RenderOnce for ToolbarSeparator {
    fn render(self, _: &mut Window, cx: &mut App) -> impl IntoElement {
        div()
            .mx(px(6.))
            .py(px(2.))
            .child(div().h(px(18.)).w(px(1.)).bg(cx.theme().border))
    }
}

/// Font size stepper: `-`, an editable value, `+`.
#[derive(IntoElement)]
pub struct ToolbarStepper {
    id: ElementId,
    input: Entity<InputState>,
    on_decrement: Option<ClickHandler>,
    on_increment: Option<ClickHandler>,
}

impl ToolbarStepper {
    pub fn new(id: impl Into<ElementId>, input: &Entity<InputState>) -> Self {
        Self {
            id: id.into(),
            input: input.clone(),
            on_decrement: None,
            on_increment: None,
        }
    }

    pub fn on_decrement(mut self, on_click: Option<ClickHandler>) -> Self {
        self.on_decrement = on_click;
        self
    }

    pub fn on_increment(mut self, on_click: Option<ClickHandler>) -> Self {
        self.on_increment = on_click;
        self
    }
}

impl RenderOnce for ToolbarStepper {
    fn render(self, _window: &mut Window, cx: &mut App) -> impl IntoElement {
        let theme = cx.theme();
        let mut bg = theme.muted;
        bg.a *= 0.6;

        let minus_id = ElementId::NamedChild(Box::new(self.id.clone()), "minus".into());
        let plus_id = ElementId::NamedChild(Box::new(self.id.clone()), "plus".into());

        div()
            .id(self.id)
            .flex()
            .items_center()
            .gap(px(4.))
            .rounded(px(6.))
            .bg(bg)
            .child(
                ToolbarIconButton::new(minus_id, ToolbarIconName::Minus)
                    .tooltip("Decrease font size")
                    .on_click_handler(self.on_decrement),
            )
            .child(
                div()
                    .h(px(32.))
                    .w(px(40.))
                    .rounded(px(4.))
                    .hover(|this| this.bg(theme.muted))
                    .child(
                        Input::new(&self.input)
                            .appearance(false)
                            .bordered(false)
                            .focus_bordered(false)
                            .w_full()
                            .h(px(32.))
                            .text_center()
                            .text_size(px(12.)),
                    ),
            )
            .child(
                ToolbarIconButton::new(plus_id, ToolbarIconName::Plus)
                    .tooltip("Increase font size")
                    .on_click_handler(self.on_increment),
            )
    }
}

/// Color trigger: an icon over a bar painted with the current color.
#[derive(IntoElement)]
pub struct ColorSwatchButton {
    base: ToolbarButton,
    icon: ToolbarIconName,
    color: Option<Hsla>,
}

impl ColorSwatchButton {
    pub fn new(id: impl Into<ElementId>, icon: ToolbarIconName, value: &str) -> Self {
        Self {
            base: ToolbarButton::new(id),
            icon,
            color: swatch_color(value),
        }
    }

    pub fn tooltip(mut self, tooltip: impl Into<SharedString>) -> Self {
        self.base = self.base.tooltip(tooltip);
        self
    }

    pub fn on_click_handler(mut self, on_click: Option<ClickHandler>) -> Self {
        self.base = self.base.on_click_handler(on_click);
        self
    }
}

impl Selectable for ColorSwatchButton {
    fn selected(mut self, selected: bool) -> Self {
        self.base = self.base.selected(selected);
        self
    }

    fn is_selected(&self) -> bool {
        self.base.is_selected()
    }
}

impl RenderOnce for ColorSwatchButton {
    fn render(self, window: &mut Window, cx: &mut App) -> impl IntoElement {
        let theme = cx.theme();
        let bar = div()
            .h(px(3.))
            .w(px(16.))
            .rounded(px(1.))
            .map(|this| match self.color {
                Some(color) => this.bg(color),
                None => this.border_1().border_color(theme.border),
            });

        self.base
            .child(
                div()
                    .flex()
                    .flex_col()
                    .items_center()
                    .gap(px(1.))
                    .child(Icon::new(self.icon).size_3p5())
                    .child(bar),
            )
            .render(window, cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swatch_skips_transparent_and_invalid_values() {
        assert_eq!(swatch_color("transparent"), None);
        assert_eq!(swatch_color("not a color"), None);

        let red = swatch_color("#ff0000").unwrap();
        assert!(red.h.abs() < 1e-6);
        assert!((red.s - 1.0).abs() < 1e-6);
        assert!((red.l - 0.5).abs() < 1e-6);
        assert!((red.a - 1.0).abs() < 1e-6);
    }
}
