use std::collections::HashSet;
use std::fmt;
use std::ops::Range;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::ops::{Op, Transaction};
use crate::plugin::{CommandError, CommandSpec, NormalizePass, PluginRegistry, QueryError};
use crate::style::StyleMap;

pub const MAX_INDENT_LEVEL: u8 = 8;
pub const MAX_HEADING_LEVEL: u8 = 6;

/// Stable identifier of a block or text run. `0` means "not assigned yet";
/// the editor hands out real keys when nodes enter the document.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeKey(pub u64);

impl NodeKey {
    pub const UNASSIGNED: NodeKey = NodeKey(0);

    pub fn is_assigned(self) -> bool {
        self != Self::UNASSIGNED
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextFormat {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Code,
}

impl TextFormat {
    pub const ALL: [TextFormat; 5] = [
        TextFormat::Bold,
        TextFormat::Italic,
        TextFormat::Underline,
        TextFormat::Strikethrough,
        TextFormat::Code,
    ];

    fn bit(self) -> u8 {
        1 << (self as u8)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TextFormat::Bold => "bold",
            TextFormat::Italic => "italic",
            TextFormat::Underline => "underline",
            TextFormat::Strikethrough => "strikethrough",
            TextFormat::Code => "code",
        }
    }
}

/// Set of inline formats. Serialized as a list of format names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<TextFormat>", into = "Vec<TextFormat>")]
pub struct FormatSet(u8);

impl FormatSet {
    pub const EMPTY: FormatSet = FormatSet(0);

    pub fn contains(self, format: TextFormat) -> bool {
        self.0 & format.bit() != 0
    }

    pub fn with(self, format: TextFormat) -> Self {
        Self(self.0 | format.bit())
    }

    pub fn without(self, format: TextFormat) -> Self {
        Self(self.0 & !format.bit())
    }

    pub fn toggled(self, format: TextFormat) -> Self {
        Self(self.0 ^ format.bit())
    }

    pub fn set(&mut self, format: TextFormat, on: bool) {
        *self = if on {
            self.with(format)
        } else {
            self.without(format)
        };
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = TextFormat> {
        TextFormat::ALL
            .into_iter()
            .filter(move |format| self.contains(*format))
    }
}

impl FromIterator<TextFormat> for FormatSet {
    fn from_iter<I: IntoIterator<Item = TextFormat>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, FormatSet::with)
    }
}

impl From<Vec<TextFormat>> for FormatSet {
    fn from(formats: Vec<TextFormat>) -> Self {
        formats.into_iter().collect()
    }
}

impl From<FormatSet> for Vec<TextFormat> {
    fn from(set: FormatSet) -> Self {
        set.iter().collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    Bullet,
    Number,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockKind {
    #[default]
    Paragraph,
    Heading {
        level: u8,
    },
    Quote,
    ListItem {
        list: ListKind,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropPosition {
    Before,
    After,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    #[serde(default)]
    pub key: NodeKey,
    pub text: String,
    #[serde(default)]
    pub format: FormatSet,
    #[serde(default)]
    pub style: StyleMap,
}

impl TextRun {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            key: NodeKey::UNASSIGNED,
            text: text.into(),
            format: FormatSet::EMPTY,
            style: StyleMap::new(),
        }
    }

    pub fn with_format(mut self, format: FormatSet) -> Self {
        self.format = format;
        self
    }

    pub fn with_style(mut self, style: StyleMap) -> Self {
        self.style = style;
        self
    }

    /// Same inline formatting, so the two runs could be merged.
    pub fn same_marks(&self, other: &TextRun) -> bool {
        self.format == other.format && self.style == other.style
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub key: NodeKey,
    #[serde(default)]
    pub kind: BlockKind,
    #[serde(default)]
    pub align: ElementAlign,
    #[serde(default)]
    pub indent: u8,
    #[serde(default)]
    pub children: Vec<TextRun>,
}

impl Block {
    pub fn new(kind: BlockKind, children: Vec<TextRun>) -> Self {
        Self {
            key: NodeKey::UNASSIGNED,
            kind,
            align: ElementAlign::Left,
            indent: 0,
            children,
        }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::new(BlockKind::Paragraph, vec![TextRun::new(text)])
    }

    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Self::new(BlockKind::Heading { level }, vec![TextRun::new(text)])
    }

    pub fn quote(text: impl Into<String>) -> Self {
        Self::new(BlockKind::Quote, vec![TextRun::new(text)])
    }

    pub fn list_item(list: ListKind, text: impl Into<String>) -> Self {
        Self::new(BlockKind::ListItem { list }, vec![TextRun::new(text)])
    }

    pub fn with_align(mut self, align: ElementAlign) -> Self {
        self.align = align;
        self
    }

    pub fn text(&self) -> String {
        self.children.iter().map(|run| run.text.as_str()).collect()
    }

    pub fn props(&self) -> BlockProps {
        BlockProps {
            kind: self.kind,
            align: self.align,
            indent: self.indent,
        }
    }

    /// True when `key` names this block or one of its runs.
    pub fn owns(&self, key: NodeKey) -> bool {
        self.key == key || self.children.iter().any(|run| run.key == key)
    }

    pub fn start_point(&self) -> Point {
        match self.children.first() {
            Some(run) => Point::text(run.key, 0),
            None => Point::element(self.key, 0),
        }
    }

    pub fn end_point(&self) -> Point {
        match self.children.last() {
            Some(run) => Point::text(run.key, run.text.len()),
            None => Point::element(self.key, 0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockProps {
    pub kind: BlockKind,
    pub align: ElementAlign,
    pub indent: u8,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeLocation {
    Block { block: usize },
    Run { block: usize, run: usize },
}

impl NodeLocation {
    pub fn block(self) -> usize {
        match self {
            NodeLocation::Block { block } | NodeLocation::Run { block, .. } => block,
        }
    }
}

/// Resolved position of a point: block index, run index and byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DocPosition {
    pub block: usize,
    pub run: usize,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoveredRun {
    pub block: usize,
    pub run: usize,
    pub range: Range<usize>,
}

impl Document {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    pub fn locate(&self, key: NodeKey) -> Option<NodeLocation> {
        if !key.is_assigned() {
            return None;
        }
        for (block_ix, block) in self.blocks.iter().enumerate() {
            if block.key == key {
                return Some(NodeLocation::Block { block: block_ix });
            }
            if let Some(run_ix) = block.children.iter().position(|run| run.key == key) {
                return Some(NodeLocation::Run {
                    block: block_ix,
                    run: run_ix,
                });
            }
        }
        None
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.locate(key).is_some()
    }

    pub fn block_index(&self, key: NodeKey) -> Option<usize> {
        self.locate(key).map(NodeLocation::block)
    }

    pub fn block(&self, key: NodeKey) -> Option<&Block> {
        self.blocks.iter().find(|block| block.key == key)
    }

    pub fn run(&self, key: NodeKey) -> Option<&TextRun> {
        match self.locate(key)? {
            NodeLocation::Run { block, run } => self.blocks.get(block)?.children.get(run),
            NodeLocation::Block { .. } => None,
        }
    }

    pub fn resolve_point(&self, point: &Point) -> Option<DocPosition> {
        match self.locate(point.key)? {
            NodeLocation::Run { block, run } => {
                let text = &self.blocks[block].children[run].text;
                Some(DocPosition {
                    block,
                    run,
                    offset: clamp_to_char_boundary(text, point.offset),
                })
            }
            NodeLocation::Block { block } => {
                let children = &self.blocks[block].children;
                match children.get(point.offset) {
                    Some(_) => Some(DocPosition {
                        block,
                        run: point.offset,
                        offset: 0,
                    }),
                    None => Some(DocPosition {
                        block,
                        run: children.len().saturating_sub(1),
                        offset: children.last().map(|run| run.text.len()).unwrap_or(0),
                    }),
                }
            }
        }
    }

    /// Runs intersecting the range, with the covered byte range of each.
    /// Zero-width intersections are skipped.
    pub fn covered_runs(&self, range: &RangeSelection) -> Vec<CoveredRun> {
        let (Some(anchor), Some(focus)) = (
            self.resolve_point(&range.anchor),
            self.resolve_point(&range.focus),
        ) else {
            return Vec::new();
        };
        let (start, end) = if anchor <= focus {
            (anchor, focus)
        } else {
            (focus, anchor)
        };

        let mut covered = Vec::new();
        for block_ix in start.block..=end.block {
            let Some(block) = self.blocks.get(block_ix) else {
                break;
            };
            for (run_ix, run) in block.children.iter().enumerate() {
                let here = (block_ix, run_ix);
                if here < (start.block, start.run) || here > (end.block, end.run) {
                    continue;
                }
                let lo = if here == (start.block, start.run) {
                    start.offset
                } else {
                    0
                };
                let hi = if here == (end.block, end.run) {
                    end.offset
                } else {
                    run.text.len()
                };
                if lo < hi {
                    covered.push(CoveredRun {
                        block: block_ix,
                        run: run_ix,
                        range: lo..hi,
                    });
                }
            }
        }
        covered
    }

    pub fn to_plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(Block::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointKind {
    #[default]
    Text,
    Element,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub key: NodeKey,
    pub offset: usize,
    #[serde(default)]
    pub kind: PointKind,
}

impl Point {
    pub fn text(key: NodeKey, offset: usize) -> Self {
        Self {
            key,
            offset,
            kind: PointKind::Text,
        }
    }

    pub fn element(key: NodeKey, offset: usize) -> Self {
        Self {
            key,
            offset,
            kind: PointKind::Element,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeSelection {
    pub anchor: Point,
    pub focus: Point,
    /// Formats of the anchor run, or the pending formats of a caret.
    #[serde(default)]
    pub format: FormatSet,
    #[serde(default)]
    pub style: StyleMap,
}

impl RangeSelection {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self {
            anchor,
            focus,
            format: FormatSet::EMPTY,
            style: StyleMap::new(),
        }
    }

    pub fn collapsed(point: Point) -> Self {
        Self::new(point.clone(), point)
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Selection {
    Range(RangeSelection),
    Node { keys: Vec<NodeKey> },
}

impl Selection {
    pub fn range(anchor: Point, focus: Point) -> Self {
        Selection::Range(RangeSelection::new(anchor, focus))
    }

    pub fn caret(point: Point) -> Self {
        Selection::Range(RangeSelection::collapsed(point))
    }

    pub fn as_range(&self) -> Option<&RangeSelection> {
        match self {
            Selection::Range(range) => Some(range),
            Selection::Node { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "value", rename_all = "snake_case")]
pub enum EditorEvent {
    Updated,
    SelectionChanged,
    CanUndo(bool),
    CanRedo(bool),
}

#[derive(Debug, Clone)]
pub struct UndoRecord {
    pub inverse_ops: Vec<Op>,
    pub selection_before: Option<Selection>,
    pub selection_after: Option<Selection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub max_undo: usize,
    pub max_normalize_iterations: usize,
}

impl EditorConfig {
    pub fn with_defaults(mut self) -> Self {
        if self.max_undo == 0 {
            self.max_undo = 200;
        }
        if self.max_normalize_iterations == 0 {
            self.max_normalize_iterations = 100;
        }
        self
    }
}

#[derive(Debug, Clone)]
struct KeyAllocator {
    next: u64,
}

impl KeyAllocator {
    fn alloc(&mut self) -> NodeKey {
        let key = NodeKey(self.next);
        self.next += 1;
        key
    }

    fn assign(&mut self, key: &mut NodeKey) {
        if !key.is_assigned() {
            *key = self.alloc();
        }
    }

    fn assign_block(&mut self, block: &mut Block) {
        self.assign(&mut block.key);
        for run in &mut block.children {
            self.assign(&mut run.key);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApplyError {
    #[error("block index {index} out of bounds (len {len})")]
    BlockOutOfBounds { index: usize, len: usize },
    #[error("normalization did not converge after {0} iterations")]
    NormalizeDidNotConverge(usize),
}

pub struct Editor {
    doc: Document,
    selection: Option<Selection>,
    registry: PluginRegistry,
    config: EditorConfig,
    undo_stack: Vec<UndoRecord>,
    redo_stack: Vec<UndoRecord>,
    keys: KeyAllocator,
    events: Vec<EditorEvent>,
    reported_can_undo: bool,
    reported_can_redo: bool,
}

impl Editor {
    pub fn new(doc: Document, selection: Option<Selection>, registry: PluginRegistry) -> Self {
        let mut editor = Self {
            doc,
            selection,
            registry,
            config: EditorConfig::default().with_defaults(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            keys: KeyAllocator { next: 1 },
            events: Vec::new(),
            reported_can_undo: false,
            reported_can_redo: false,
        };
        editor.assign_missing_keys();
        editor.normalize_in_place();
        editor.sync_selection_marks();
        editor
    }

    pub fn with_core_plugins() -> Self {
        Self::new(
            Document::new(vec![Block::paragraph("")]),
            None,
            PluginRegistry::core(),
        )
    }

    pub fn with_richtext_plugins() -> Self {
        Self::with_blocks(vec![Block::paragraph("")])
    }

    /// Rich-text editor over `blocks`, caret at the start of the first block.
    pub fn with_blocks(blocks: Vec<Block>) -> Self {
        let mut editor = Self::new(Document::new(blocks), None, PluginRegistry::richtext());
        if let Some(point) = editor.doc.blocks.first().map(Block::start_point) {
            editor.selection = Some(Selection::caret(point));
            editor.sync_selection_marks();
        }
        editor
    }

    pub fn with_editor_config(mut self, config: EditorConfig) -> Self {
        self.config = config.with_defaults();
        self
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn range_selection(&self) -> Option<&RangeSelection> {
        self.selection.as_ref().and_then(Selection::as_range)
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.doc.contains(key)
    }

    pub fn block(&self, key: NodeKey) -> Option<&Block> {
        self.doc.block(key)
    }

    /// The top-level block that is, or contains, `key`.
    pub fn top_level_block_of(&self, key: NodeKey) -> Option<&Block> {
        let ix = self.doc.block_index(key)?;
        self.doc.blocks.get(ix)
    }

    pub fn anchor_block(&self) -> Option<&Block> {
        match self.selection.as_ref()? {
            Selection::Range(range) => self.top_level_block_of(range.anchor.key),
            Selection::Node { keys } => self.top_level_block_of(*keys.first()?),
        }
    }

    pub fn covered_runs(&self) -> Vec<CoveredRun> {
        self.range_selection()
            .map(|range| self.doc.covered_runs(range))
            .unwrap_or_default()
    }

    pub fn has_format(&self, format: TextFormat) -> bool {
        self.range_selection()
            .is_some_and(|range| range.format.contains(format))
    }

    /// Value of a style property across the selection. A caret reports its
    /// pending style; a range reports the shared value of all covered runs,
    /// or an empty string when they disagree. Missing values read as
    /// `default`.
    pub fn selection_style_value(&self, property: &str, default: &str) -> String {
        let Some(range) = self.range_selection() else {
            return default.to_string();
        };
        let covered = self.doc.covered_runs(range);
        if range.is_collapsed() || covered.is_empty() {
            return range.style.get(property).unwrap_or(default).to_string();
        }

        let mut value: Option<&str> = None;
        for CoveredRun { block, run, .. } in &covered {
            let run_value = self.doc.blocks[*block].children[*run]
                .style
                .get(property)
                .unwrap_or(default);
            match value {
                None => value = Some(run_value),
                Some(existing) if existing != run_value => return String::new(),
                Some(_) => {}
            }
        }
        value.unwrap_or(default).to_string()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn alloc_key(&mut self) -> NodeKey {
        self.keys.alloc()
    }

    pub fn drain_events(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.events)
    }

    /// Replaces the selection. Range formats and styles are re-read from the
    /// document.
    pub fn set_selection(&mut self, selection: Option<Selection>) {
        let previous = self.selection.take();
        self.selection = selection;
        self.normalize_selection_in_place();
        self.sync_selection_marks();
        if self.selection != previous {
            self.events.push(EditorEvent::SelectionChanged);
        }
    }

    pub fn select_block_start(&mut self, key: NodeKey) -> bool {
        let Some(point) = self.top_level_block_of(key).map(Block::start_point) else {
            return false;
        };
        self.set_selection(Some(Selection::caret(point)));
        true
    }

    pub fn apply(&mut self, tx: Transaction) -> Result<(), ApplyError> {
        let selection_before = self.selection.clone();

        if tx.ops.is_empty() {
            // Selection-only transactions keep pending caret marks verbatim.
            if let Some(selection) = tx.selection_after {
                self.selection = Some(selection);
                self.normalize_selection_in_place();
                if self.selection != selection_before {
                    self.events.push(EditorEvent::SelectionChanged);
                }
            }
            return Ok(());
        }

        let doc_before = self.doc.clone();
        let source = tx.meta.source.clone();
        let op_count = tx.ops.len();

        let inverse_ops = match self.apply_ops(tx) {
            Ok(inverse_ops) => inverse_ops,
            Err(err) => {
                warn!(?source, %err, "rolling back failed transaction");
                self.doc = doc_before;
                self.selection = selection_before;
                return Err(err);
            }
        };

        self.normalize_selection_in_place();
        self.sync_selection_marks();
        trace!(?source, ops = op_count, "applied transaction");

        self.undo_stack.push(UndoRecord {
            inverse_ops,
            selection_before: selection_before.clone(),
            selection_after: self.selection.clone(),
        });
        self.redo_stack.clear();
        if self.undo_stack.len() > self.config.max_undo {
            self.undo_stack.remove(0);
        }

        self.finish_change(&selection_before);
        Ok(())
    }

    pub fn undo(&mut self) -> bool {
        let Some(record) = self.undo_stack.pop() else {
            return false;
        };

        let UndoRecord {
            inverse_ops,
            selection_before,
            selection_after,
        } = record;
        let previous = self.selection.clone();

        let mut redo_ops: Vec<Op> = Vec::new();
        for op in inverse_ops {
            match self.apply_op(op) {
                Ok(inv) => redo_ops.push(inv),
                Err(err) => {
                    warn!(%err, "undo stopped on an inapplicable op");
                    break;
                }
            }
        }
        redo_ops.reverse();

        self.selection = selection_before.clone();
        self.normalize_in_place();

        self.redo_stack.push(UndoRecord {
            inverse_ops: redo_ops,
            selection_before,
            selection_after,
        });
        self.finish_change(&previous);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(record) = self.redo_stack.pop() else {
            return false;
        };

        let UndoRecord {
            inverse_ops,
            selection_before,
            selection_after,
        } = record;
        let previous = self.selection.clone();

        let mut undo_ops: Vec<Op> = Vec::new();
        for op in inverse_ops {
            match self.apply_op(op) {
                Ok(inv) => undo_ops.push(inv),
                Err(err) => {
                    warn!(%err, "redo stopped on an inapplicable op");
                    break;
                }
            }
        }
        undo_ops.reverse();

        self.selection = selection_after.clone();
        self.normalize_in_place();

        self.undo_stack.push(UndoRecord {
            inverse_ops: undo_ops,
            selection_before,
            selection_after,
        });
        self.finish_change(&previous);
        true
    }

    /// Inserts `text` at a collapsed caret using the caret's pending marks.
    /// Returns `false` when there is no caret.
    pub fn insert_text(&mut self, text: &str) -> Result<bool, ApplyError> {
        let Some(range) = self
            .range_selection()
            .filter(|range| range.is_collapsed())
            .cloned()
        else {
            return Ok(false);
        };
        if text.is_empty() {
            return Ok(false);
        }
        let Some(pos) = self.doc.resolve_point(&range.anchor) else {
            return Ok(false);
        };
        let mut runs = self.doc.blocks[pos.block].children.clone();
        let Some(run) = runs.get_mut(pos.run) else {
            return Ok(false);
        };

        let caret = if run.format == range.format && run.style == range.style {
            run.text.insert_str(pos.offset, text);
            Point::text(run.key, pos.offset + text.len())
        } else {
            let tail = run.text.split_off(pos.offset);
            let tail_run = TextRun {
                key: NodeKey::UNASSIGNED,
                text: tail,
                format: run.format,
                style: run.style.clone(),
            };
            let inserted = TextRun {
                key: self.keys.alloc(),
                text: text.to_string(),
                format: range.format,
                style: range.style.clone(),
            };
            let caret = Point::text(inserted.key, text.len());
            runs.insert(pos.run + 1, inserted);
            if !tail_run.text.is_empty() {
                runs.insert(pos.run + 2, tail_run);
            }
            caret
        };

        let tx = Transaction::new(vec![Op::ReplaceRuns {
            index: pos.block,
            runs,
        }])
        .selection_after(Selection::caret(caret))
        .source("editor.insert_text");
        self.apply(tx)?;
        Ok(true)
    }

    pub fn run_command(&mut self, id: &str, args: Option<Value>) -> Result<(), CommandError> {
        let Some(command) = self.registry.command(id) else {
            return Err(CommandError::new(format!("Unknown command: {id}")));
        };
        debug!(command = id, "running command");
        (command.handler)(self, args).inspect_err(|err| {
            debug!(command = id, error = %err, "command failed");
        })
    }

    pub fn run_query_json(&self, id: &str, args: Option<Value>) -> Result<Value, QueryError> {
        let Some(query) = self.registry.query(id) else {
            return Err(QueryError::new(format!("Unknown query: {id}")));
        };
        (query.handler)(self, args)
    }

    pub fn run_query<T>(&self, id: &str, args: Option<Value>) -> Result<T, QueryError>
    where
        T: DeserializeOwned,
    {
        let value = self.run_query_json(id, args)?;
        serde_json::from_value(value)
            .map_err(|err| QueryError::new(format!("Failed to decode query result: {err}")))
    }

    pub fn commands(&self) -> impl Iterator<Item = &CommandSpec> {
        self.registry.commands().values()
    }

    pub fn normalize_passes(&self) -> &[Box<dyn NormalizePass>] {
        self.registry.normalize_passes()
    }

    fn finish_change(&mut self, selection_before: &Option<Selection>) {
        self.events.push(EditorEvent::Updated);
        if &self.selection != selection_before {
            self.events.push(EditorEvent::SelectionChanged);
        }
        let can_undo = self.can_undo();
        if can_undo != self.reported_can_undo {
            self.reported_can_undo = can_undo;
            self.events.push(EditorEvent::CanUndo(can_undo));
        }
        let can_redo = self.can_redo();
        if can_redo != self.reported_can_redo {
            self.reported_can_redo = can_redo;
            self.events.push(EditorEvent::CanRedo(can_redo));
        }
    }

    fn assign_missing_keys(&mut self) {
        let max = self
            .doc
            .blocks
            .iter()
            .flat_map(|block| {
                std::iter::once(block.key).chain(block.children.iter().map(|run| run.key))
            })
            .map(|key| key.0)
            .max()
            .unwrap_or(0);
        self.keys.next = self.keys.next.max(max + 1);

        let mut seen: HashSet<NodeKey> = HashSet::new();
        for block in &mut self.doc.blocks {
            for key in std::iter::once(&mut block.key)
                .chain(block.children.iter_mut().map(|run| &mut run.key))
            {
                if !key.is_assigned() || !seen.insert(*key) {
                    *key = self.keys.alloc();
                    seen.insert(*key);
                }
            }
        }
    }

    fn apply_ops(&mut self, tx: Transaction) -> Result<Vec<Op>, ApplyError> {
        let mut inverse_ops: Vec<Op> = Vec::new();
        for op in tx.ops {
            inverse_ops.push(self.apply_op(op)?);
        }

        if let Some(selection) = tx.selection_after {
            self.selection = Some(selection);
        }

        let mut inverse_normalize = self.normalize_with_inverse_ops()?;
        inverse_ops.append(&mut inverse_normalize);
        inverse_ops.reverse();
        Ok(inverse_ops)
    }

    fn normalize_in_place(&mut self) {
        if let Err(err) = self.normalize_with_inverse_ops() {
            warn!(%err, "document left partially normalized");
        }
        self.normalize_selection_in_place();
    }

    fn normalize_with_inverse_ops(&mut self) -> Result<Vec<Op>, ApplyError> {
        let mut inverse_ops: Vec<Op> = Vec::new();
        for _ in 0..self.config.max_normalize_iterations {
            let ops = self.registry.normalize(&self.doc);
            if ops.is_empty() {
                return Ok(inverse_ops);
            }
            for op in ops {
                inverse_ops.push(self.apply_op(op)?);
            }
        }
        Err(ApplyError::NormalizeDidNotConverge(
            self.config.max_normalize_iterations,
        ))
    }

    /// Drops selection points and node keys that no longer resolve.
    fn normalize_selection_in_place(&mut self) {
        let fallback = self.doc.blocks.first().map(Block::start_point);
        let mut clear = false;
        match &mut self.selection {
            Some(Selection::Range(range)) => {
                for point in [&mut range.anchor, &mut range.focus] {
                    if let Some(pos) = self.doc.resolve_point(point) {
                        if point.kind == PointKind::Text {
                            point.offset = pos.offset;
                        }
                    } else if let Some(fallback) = &fallback {
                        *point = fallback.clone();
                    }
                }
            }
            Some(Selection::Node { keys }) => {
                keys.retain(|key| self.doc.contains(*key));
                clear = keys.is_empty();
            }
            None => {}
        }
        if clear {
            self.selection = None;
        }
    }

    /// Re-reads the cached range format and style: the first covered run of
    /// a non-collapsed range, else the run under the anchor.
    fn sync_selection_marks(&mut self) {
        let Some(Selection::Range(range)) = &self.selection else {
            return;
        };
        let source = match self.doc.covered_runs(range).first() {
            Some(covered) if !range.is_collapsed() => {
                self.doc.blocks[covered.block].children.get(covered.run)
            }
            _ => self
                .doc
                .resolve_point(&range.anchor)
                .and_then(|pos| self.doc.blocks[pos.block].children.get(pos.run)),
        };
        let Some(run) = source else {
            return;
        };
        let (format, style) = (run.format, run.style.clone());
        if let Some(Selection::Range(range)) = &mut self.selection {
            range.format = format;
            range.style = style;
        }
    }

    fn apply_op(&mut self, op: Op) -> Result<Op, ApplyError> {
        apply_op_to(&mut self.doc, &mut self.selection, &mut self.keys, op)
    }
}

fn apply_op_to(
    doc: &mut Document,
    selection: &mut Option<Selection>,
    keys: &mut KeyAllocator,
    op: Op,
) -> Result<Op, ApplyError> {
    let len = doc.blocks.len();
    match op {
        Op::InsertBlock { index, mut block } => {
            if index > len {
                return Err(ApplyError::BlockOutOfBounds { index, len });
            }
            keys.assign_block(&mut block);
            doc.blocks.insert(index, block);
            Ok(Op::RemoveBlock { index })
        }
        Op::RemoveBlock { index } => {
            if index >= len {
                return Err(ApplyError::BlockOutOfBounds { index, len });
            }
            let removed = doc.blocks.remove(index);
            remap_selection_after_remove(selection, &removed, index, doc);
            Ok(Op::InsertBlock {
                index,
                block: removed,
            })
        }
        Op::SetBlockProps { index, props } => {
            let block = doc
                .blocks
                .get_mut(index)
                .ok_or(ApplyError::BlockOutOfBounds { index, len })?;
            let old = block.props();
            block.kind = props.kind;
            block.align = props.align;
            block.indent = props.indent;
            Ok(Op::SetBlockProps { index, props: old })
        }
        Op::ReplaceRuns { index, mut runs } => {
            let block = doc
                .blocks
                .get_mut(index)
                .ok_or(ApplyError::BlockOutOfBounds { index, len })?;
            for run in &mut runs {
                keys.assign(&mut run.key);
            }
            let old = std::mem::replace(&mut block.children, runs);
            remap_selection_after_replace(selection, &old, block);
            Ok(Op::ReplaceRuns { index, runs: old })
        }
    }
}

fn remap_selection_after_remove(
    selection: &mut Option<Selection>,
    removed: &Block,
    index: usize,
    doc_after_remove: &Document,
) {
    let fallback = doc_after_remove
        .blocks
        .get(index)
        .map(Block::start_point)
        .or_else(|| {
            index
                .checked_sub(1)
                .and_then(|prev| doc_after_remove.blocks.get(prev))
                .map(Block::end_point)
        })
        .unwrap_or_else(|| Point::text(NodeKey::UNASSIGNED, 0));

    let mut clear = false;
    match selection {
        Some(Selection::Range(range)) => {
            for point in [&mut range.anchor, &mut range.focus] {
                if removed.owns(point.key) {
                    *point = fallback.clone();
                }
            }
        }
        Some(Selection::Node { keys }) => {
            keys.retain(|key| !removed.owns(*key));
            clear = keys.is_empty();
        }
        None => {}
    }
    if clear {
        *selection = None;
    }
}

fn remap_selection_after_replace(
    selection: &mut Option<Selection>,
    old: &[TextRun],
    block: &Block,
) {
    let mut clear = false;
    match selection {
        Some(Selection::Range(range)) => {
            for point in [&mut range.anchor, &mut range.focus] {
                let Some(abs) = absolute_offset(old, point) else {
                    continue;
                };
                *point = point_at_offset(&block.children, point.key, abs)
                    .unwrap_or_else(|| block.start_point());
            }
        }
        Some(Selection::Node { keys }) => {
            keys.retain(|key| block.owns(*key) || !old.iter().any(|run| run.key == *key));
            clear = keys.is_empty();
        }
        None => {}
    }
    if clear {
        *selection = None;
    }
}

fn absolute_offset(runs: &[TextRun], point: &Point) -> Option<usize> {
    let mut prefix = 0;
    for run in runs {
        if run.key == point.key {
            return Some(prefix + point.offset.min(run.text.len()));
        }
        prefix += run.text.len();
    }
    None
}

/// Maps a block-absolute byte offset onto `runs`, keeping `preferred` when it
/// still spans the offset. Run boundaries resolve to the earlier run.
fn point_at_offset(runs: &[TextRun], preferred: NodeKey, abs: usize) -> Option<Point> {
    let mut start = 0;
    for run in runs {
        let end = start + run.text.len();
        if run.key == preferred && (start..=end).contains(&abs) {
            return Some(Point::text(run.key, abs - start));
        }
        start = end;
    }

    let mut start = 0;
    for run in runs {
        let end = start + run.text.len();
        if abs <= end {
            return Some(Point::text(
                run.key,
                clamp_to_char_boundary(&run.text, abs - start),
            ));
        }
        start = end;
    }
    runs.last()
        .map(|run| Point::text(run.key, run.text.len()))
}

pub(crate) fn clamp_to_char_boundary(s: &str, mut ix: usize) -> usize {
    ix = ix.min(s.len());
    while ix > 0 && !s.is_char_boundary(ix) {
        ix -= 1;
    }
    ix
}
