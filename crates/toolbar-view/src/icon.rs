use blockdesk_editor_core::{ElementAlign, ListKind, TextFormat};
use gpui::{App, IntoElement, RenderOnce, SharedString, Window};
use gpui_component::{Icon, IconNamed};

/// Icons drawn by the toolbar. Paths resolve through the host's asset
/// source.
#[derive(IntoElement, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolbarIconName {
    AlignCenter,
    AlignJustify,
    AlignLeft,
    AlignRight,
    Baseline,
    Bold,
    ChevronDown,
    CodeXml,
    GripVertical,
    Highlighter,
    IndentDecrease,
    IndentIncrease,
    Italic,
    List,
    ListOrdered,
    ListX,
    Minus,
    Plus,
    Redo2,
    Strikethrough,
    Trash2,
    Underline,
    Undo2,
}

impl ToolbarIconName {
    pub fn for_align(align: ElementAlign) -> Self {
        match align {
            ElementAlign::Left => Self::AlignLeft,
            ElementAlign::Center => Self::AlignCenter,
            ElementAlign::Right => Self::AlignRight,
            ElementAlign::Justify => Self::AlignJustify,
        }
    }

    pub fn for_format(format: TextFormat) -> Self {
        match format {
            TextFormat::Bold => Self::Bold,
            TextFormat::Italic => Self::Italic,
            TextFormat::Underline => Self::Underline,
            TextFormat::Strikethrough => Self::Strikethrough,
            TextFormat::Code => Self::CodeXml,
        }
    }

    pub fn for_list(list: ListKind) -> Self {
        match list {
            ListKind::Bullet => Self::List,
            ListKind::Number => Self::ListOrdered,
        }
    }
}

impl IconNamed for ToolbarIconName {
    fn path(self) -> SharedString {
        match self {
            Self::AlignCenter => "icons/align-center.svg",
            Self::AlignJustify => "icons/align-justify.svg",
            Self::AlignLeft => "icons/align-left.svg",
            Self::AlignRight => "icons/align-right.svg",
            Self::Baseline => "icons/baseline.svg",
            Self::Bold => "icons/bold.svg",
            Self::ChevronDown => "icons/chevron-down.svg",
            Self::CodeXml => "icons/code-xml.svg",
            Self::GripVertical => "icons/grip-vertical.svg",
            Self::Highlighter => "icons/highlighter.svg",
            Self::IndentDecrease => "icons/indent-decrease.svg",
            Self::IndentIncrease => "icons/indent-increase.svg",
            Self::Italic => "icons/italic.svg",
            Self::List => "icons/list.svg",
            Self::ListOrdered => "icons/list-ordered.svg",
            Self::ListX => "icons/list-x.svg",
            Self::Minus => "icons/minus.svg",
            Self::Plus => "icons/plus.svg",
            Self::Redo2 => "icons/redo-2.svg",
            Self::Strikethrough => "icons/strikethrough.svg",
            Self::Trash2 => "icons/trash-2.svg",
            Self::Underline => "icons/underline.svg",
            Self::Undo2 => "icons/undo-2.svg",
        }
        .into()
    }
}

impl RenderOnce for ToolbarIconName {
    fn render(self, _: &mut Window, _: &mut App) -> impl IntoElement {
        Icon::new(self)
    }
}
