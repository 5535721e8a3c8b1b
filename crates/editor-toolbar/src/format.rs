use blockdesk_editor_core::{BlockKind, Editor, ElementAlign, TextFormat};
use serde::{Deserialize, Serialize};

/// Block types offered by the toolbar dropdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BlockType {
    #[default]
    #[serde(rename = "paragraph")]
    Paragraph,
    #[serde(rename = "h1")]
    Heading1,
    #[serde(rename = "h2")]
    Heading2,
    #[serde(rename = "h3")]
    Heading3,
    #[serde(rename = "quote")]
    Quote,
}

impl BlockType {
    pub const ALL: [BlockType; 5] = [
        BlockType::Paragraph,
        BlockType::Heading1,
        BlockType::Heading2,
        BlockType::Heading3,
        BlockType::Quote,
    ];

    pub fn label(self) -> &'static str {
        match self {
            BlockType::Paragraph => "Normal",
            BlockType::Heading1 => "Heading 1",
            BlockType::Heading2 => "Heading 2",
            BlockType::Heading3 => "Heading 3",
            BlockType::Quote => "Quote",
        }
    }

    /// List items and headings deeper than 3 read as paragraphs.
    pub fn from_block_kind(kind: BlockKind) -> Self {
        match kind {
            BlockKind::Heading { level: 1 } => BlockType::Heading1,
            BlockKind::Heading { level: 2 } => BlockType::Heading2,
            BlockKind::Heading { level: 3 } => BlockType::Heading3,
            BlockKind::Quote => BlockType::Quote,
            BlockKind::Heading { .. } | BlockKind::Paragraph | BlockKind::ListItem { .. } => {
                BlockType::Paragraph
            }
        }
    }

    pub fn to_block_kind(self) -> BlockKind {
        match self {
            BlockType::Paragraph => BlockKind::Paragraph,
            BlockType::Heading1 => BlockKind::Heading { level: 1 },
            BlockType::Heading2 => BlockKind::Heading { level: 2 },
            BlockType::Heading3 => BlockKind::Heading { level: 3 },
            BlockType::Quote => BlockKind::Quote,
        }
    }
}

pub const ALIGN_OPTIONS: [ElementAlign; 4] = [
    ElementAlign::Left,
    ElementAlign::Center,
    ElementAlign::Right,
    ElementAlign::Justify,
];

pub fn align_label(align: ElementAlign) -> &'static str {
    match align {
        ElementAlign::Left => "Left Align",
        ElementAlign::Center => "Center Align",
        ElementAlign::Right => "Right Align",
        ElementAlign::Justify => "Justify Align",
    }
}

/// Inline format flags of the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FormatState {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub code: bool,
}

impl FormatState {
    pub fn from_editor(editor: &Editor) -> Self {
        let mut state = Self::default();
        for format in TextFormat::ALL {
            state.set(format, editor.has_format(format));
        }
        state
    }

    pub fn get(&self, format: TextFormat) -> bool {
        match format {
            TextFormat::Bold => self.bold,
            TextFormat::Italic => self.italic,
            TextFormat::Underline => self.underline,
            TextFormat::Strikethrough => self.strikethrough,
            TextFormat::Code => self.code,
        }
    }

    pub fn set(&mut self, format: TextFormat, on: bool) {
        let flag = match format {
            TextFormat::Bold => &mut self.bold,
            TextFormat::Italic => &mut self.italic,
            TextFormat::Underline => &mut self.underline,
            TextFormat::Strikethrough => &mut self.strikethrough,
            TextFormat::Code => &mut self.code,
        };
        *flag = on;
    }
}

/// Integer prefix of `input`: leading whitespace and one sign are accepted,
/// digits are read up to the first non-digit. `"18px"` reads as 18.
pub fn parse_int_prefix(input: &str) -> Option<i64> {
    let trimmed = input.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }

    let mut value: i64 = 0;
    for digit in rest[..digits_len].bytes() {
        value = value
            .saturating_mul(10)
            .saturating_add(i64::from(digit - b'0'));
    }
    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("18", Some(18))]
    #[case("18px", Some(18))]
    #[case("  -7.5", Some(-7))]
    #[case("+3", Some(3))]
    #[case("px18", None)]
    #[case("", None)]
    #[case("-", None)]
    fn int_prefix(#[case] input: &str, #[case] expected: Option<i64>) {
        assert_eq!(parse_int_prefix(input), expected);
    }

    #[test]
    fn block_type_reads_deep_headings_and_lists_as_paragraph() {
        assert_eq!(
            BlockType::from_block_kind(BlockKind::Heading { level: 5 }),
            BlockType::Paragraph
        );
        for ty in BlockType::ALL {
            assert_eq!(BlockType::from_block_kind(ty.to_block_kind()), ty);
        }
    }
}
