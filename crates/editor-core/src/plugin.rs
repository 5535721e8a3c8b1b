use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::core::{
    Block, BlockKind, Document, DropPosition, Editor, ElementAlign, ListKind, MAX_HEADING_LEVEL,
    MAX_INDENT_LEVEL, NodeKey, TextFormat, TextRun,
};
use crate::ops::{Op, Transaction};
use crate::style::StyleMap;
use crate::transforms;

#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct CommandError {
    message: String,
}

impl CommandError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct QueryError {
    message: String,
}

impl QueryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

type CommandHandler = dyn Fn(&mut Editor, Option<Value>) -> Result<(), CommandError> + Send + Sync;
type QueryHandler = dyn Fn(&Editor, Option<Value>) -> Result<Value, QueryError> + Send + Sync;

#[derive(Clone)]
pub struct CommandSpec {
    pub id: String,
    pub label: String,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    pub args_example: Option<Value>,
    pub handler: Arc<CommandHandler>,
}

impl CommandSpec {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        handler: impl Fn(&mut Editor, Option<Value>) -> Result<(), CommandError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: None,
            keywords: Vec::new(),
            args_example: None,
            handler: Arc::new(handler),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn args_example(mut self, args_example: Value) -> Self {
        self.args_example = Some(args_example);
        self
    }
}

#[derive(Clone)]
pub struct QuerySpec {
    pub id: String,
    pub handler: Arc<QueryHandler>,
}

impl QuerySpec {
    pub fn new(
        id: impl Into<String>,
        handler: impl Fn(&Editor, Option<Value>) -> Result<Value, QueryError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            handler: Arc::new(handler),
        }
    }
}

pub trait NormalizePass: Send + Sync {
    fn id(&self) -> &'static str;
    fn run(&self, doc: &Document, registry: &PluginRegistry) -> Vec<Op>;
}

pub trait EditorPlugin: Send + Sync {
    fn id(&self) -> &'static str;
    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        Vec::new()
    }
    fn commands(&self) -> Vec<CommandSpec> {
        Vec::new()
    }
    fn queries(&self) -> Vec<QuerySpec> {
        Vec::new()
    }
}

#[derive(Default)]
pub struct PluginRegistry {
    plugin_ids: Vec<&'static str>,
    normalize_passes: Vec<Box<dyn NormalizePass>>,
    commands: HashMap<String, CommandSpec>,
    queries: HashMap<String, QuerySpec>,
}

impl PluginRegistry {
    pub fn new(plugins: impl IntoIterator<Item = Box<dyn EditorPlugin>>) -> Result<Self, String> {
        let mut registry = Self::default();
        for plugin in plugins {
            registry.register_plugin(plugin)?;
        }
        Ok(registry)
    }

    /// Normalization and history only.
    pub fn core() -> Self {
        let plugins: Vec<Box<dyn EditorPlugin>> =
            vec![Box::new(CoreNormalizePlugin), Box::new(HistoryPlugin)];
        Self::new(plugins).expect("core registry must be valid")
    }

    pub fn richtext() -> Self {
        let plugins: Vec<Box<dyn EditorPlugin>> = vec![
            Box::new(CoreNormalizePlugin),
            Box::new(HistoryPlugin),
            Box::new(FormatPlugin),
            Box::new(StylePlugin),
            Box::new(BlockTypePlugin),
            Box::new(AlignPlugin),
            Box::new(IndentPlugin),
            Box::new(ListPlugin),
            Box::new(StructurePlugin),
        ];
        Self::new(plugins).expect("richtext registry must be valid")
    }

    pub fn register_plugin(&mut self, plugin: Box<dyn EditorPlugin>) -> Result<(), String> {
        if self.plugin_ids.contains(&plugin.id()) {
            return Err(format!("Duplicate plugin id: {}", plugin.id()));
        }
        self.plugin_ids.push(plugin.id());

        self.normalize_passes.extend(plugin.normalize_passes());

        for cmd in plugin.commands() {
            if self.commands.contains_key(&cmd.id) {
                return Err(format!("Duplicate command id: {}", cmd.id));
            }
            self.commands.insert(cmd.id.clone(), cmd);
        }

        for query in plugin.queries() {
            if self.queries.contains_key(&query.id) {
                return Err(format!("Duplicate query id: {}", query.id));
            }
            self.queries.insert(query.id.clone(), query);
        }

        Ok(())
    }

    pub fn plugin_ids(&self) -> &[&'static str] {
        &self.plugin_ids
    }

    pub fn normalize_passes(&self) -> &[Box<dyn NormalizePass>] {
        &self.normalize_passes
    }

    pub fn commands(&self) -> &HashMap<String, CommandSpec> {
        &self.commands
    }

    pub fn command(&self, id: &str) -> Option<CommandSpec> {
        self.commands.get(id).cloned()
    }

    pub fn queries(&self) -> &HashMap<String, QuerySpec> {
        &self.queries
    }

    pub fn query(&self, id: &str) -> Option<QuerySpec> {
        self.queries.get(id).cloned()
    }

    pub fn normalize(&self, doc: &Document) -> Vec<Op> {
        let mut ops: Vec<Op> = Vec::new();
        for pass in &self.normalize_passes {
            ops.extend(pass.run(doc, self));
        }
        ops
    }
}

fn parse_args<T: DeserializeOwned>(args: Option<Value>) -> Result<T, CommandError> {
    let value = args.ok_or_else(|| CommandError::new("Missing args"))?;
    serde_json::from_value(value).map_err(|err| CommandError::new(format!("Invalid args: {err}")))
}

fn apply_built(
    editor: &mut Editor,
    built: Result<Transaction, String>,
    what: &str,
) -> Result<(), CommandError> {
    built.map_err(CommandError::new).and_then(|tx| {
        if tx.is_empty() {
            return Ok(());
        }
        editor
            .apply(tx)
            .map_err(|e| CommandError::new(format!("Failed to {what}: {e}")))
    })
}

struct CoreNormalizePlugin;

impl EditorPlugin for CoreNormalizePlugin {
    fn id(&self) -> &'static str {
        "core.normalize"
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![
            Box::new(EnsureNonEmptyDocument),
            Box::new(EnsureBlockHasRun),
            Box::new(MergeAdjacentRuns),
            Box::new(ClampBlockProps),
        ]
    }
}

struct EnsureNonEmptyDocument;

impl NormalizePass for EnsureNonEmptyDocument {
    fn id(&self) -> &'static str {
        "core.ensure_non_empty_document"
    }

    fn run(&self, doc: &Document, _registry: &PluginRegistry) -> Vec<Op> {
        if doc.blocks.is_empty() {
            return vec![Op::InsertBlock {
                index: 0,
                block: Block::paragraph(""),
            }];
        }
        Vec::new()
    }
}

struct EnsureBlockHasRun;

impl NormalizePass for EnsureBlockHasRun {
    fn id(&self) -> &'static str {
        "core.ensure_block_has_run"
    }

    fn run(&self, doc: &Document, _registry: &PluginRegistry) -> Vec<Op> {
        doc.blocks
            .iter()
            .enumerate()
            .filter(|(_, block)| block.children.is_empty())
            .map(|(index, _)| Op::ReplaceRuns {
                index,
                runs: vec![TextRun::new("")],
            })
            .collect()
    }
}

struct MergeAdjacentRuns;

impl NormalizePass for MergeAdjacentRuns {
    fn id(&self) -> &'static str {
        "core.merge_adjacent_runs"
    }

    fn run(&self, doc: &Document, _registry: &PluginRegistry) -> Vec<Op> {
        let mut ops = Vec::new();
        for (index, block) in doc.blocks.iter().enumerate() {
            if block.children.len() < 2 {
                continue;
            }

            let mut merged: Vec<TextRun> = Vec::with_capacity(block.children.len());
            for run in &block.children {
                if run.text.is_empty() {
                    continue;
                }
                match merged.last_mut() {
                    Some(prev) if prev.same_marks(run) => prev.text.push_str(&run.text),
                    _ => merged.push(run.clone()),
                }
            }
            if merged.is_empty() {
                merged.push(block.children[0].clone());
            }

            if merged != block.children {
                ops.push(Op::ReplaceRuns {
                    index,
                    runs: merged,
                });
            }
        }
        ops
    }
}

struct ClampBlockProps;

impl NormalizePass for ClampBlockProps {
    fn id(&self) -> &'static str {
        "core.clamp_block_props"
    }

    fn run(&self, doc: &Document, _registry: &PluginRegistry) -> Vec<Op> {
        let mut ops = Vec::new();
        for (index, block) in doc.blocks.iter().enumerate() {
            let mut props = block.props();
            if let BlockKind::Heading { level } = &mut props.kind {
                *level = (*level).clamp(1, MAX_HEADING_LEVEL);
            }
            props.indent = props.indent.min(MAX_INDENT_LEVEL);
            if props != block.props() {
                ops.push(Op::SetBlockProps { index, props });
            }
        }
        ops
    }
}

struct HistoryPlugin;

impl EditorPlugin for HistoryPlugin {
    fn id(&self) -> &'static str {
        "history"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("history.undo", "Undo", |editor, _args| {
                editor.undo();
                Ok(())
            })
            .keywords(["undo", "history"]),
            CommandSpec::new("history.redo", "Redo", |editor, _args| {
                editor.redo();
                Ok(())
            })
            .keywords(["redo", "history"]),
        ]
    }
}

#[derive(Deserialize)]
struct ToggleFormatArgs {
    format: TextFormat,
}

struct FormatPlugin;

impl EditorPlugin for FormatPlugin {
    fn id(&self) -> &'static str {
        "text.format"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("text.toggle_format", "Toggle text format", |editor, args| {
                let ToggleFormatArgs { format } = parse_args(args)?;
                let built = transforms::toggle_format(editor, format);
                apply_built(editor, built, "toggle format")
            })
            .description("Toggle an inline format on the selection or the caret.")
            .keywords(["bold", "italic", "underline", "strikethrough", "code"])
            .args_example(serde_json::json!({ "format": "bold" })),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![QuerySpec::new("selection.formats", |editor, _args| {
            let formats = editor
                .range_selection()
                .map(|range| range.format)
                .unwrap_or_default();
            serde_json::to_value(formats)
                .map_err(|err| QueryError::new(format!("Failed to encode formats: {err}")))
        })]
    }
}

#[derive(Deserialize)]
struct PatchStyleArgs {
    styles: StyleMap,
}

#[derive(Deserialize)]
struct StyleQueryArgs {
    property: String,
    #[serde(default)]
    default: String,
}

struct StylePlugin;

impl EditorPlugin for StylePlugin {
    fn id(&self) -> &'static str {
        "text.style"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("text.patch_style", "Patch text style", |editor, args| {
                let PatchStyleArgs { styles } = parse_args(args)?;
                let built = transforms::patch_style(editor, &styles);
                apply_built(editor, built, "patch style")
            })
            .description("Merge inline CSS properties into the selection. Empty values remove.")
            .keywords(["font", "size", "color", "highlight", "style"])
            .args_example(serde_json::json!({ "styles": { "font-size": "18px" } })),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![QuerySpec::new("selection.style", |editor, args| {
            let args = args.ok_or_else(|| QueryError::new("Missing args"))?;
            let StyleQueryArgs { property, default } = serde_json::from_value(args)
                .map_err(|err| QueryError::new(format!("Invalid args: {err}")))?;
            if editor.range_selection().is_none() {
                return Ok(Value::Null);
            }
            Ok(Value::String(
                editor.selection_style_value(&property, &default),
            ))
        })]
    }
}

#[derive(Deserialize)]
struct SetKindArgs {
    kind: BlockKind,
}

struct BlockTypePlugin;

impl EditorPlugin for BlockTypePlugin {
    fn id(&self) -> &'static str {
        "block.type"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("block.set_type", "Set block type", |editor, args| {
                let SetKindArgs { kind } = parse_args(args)?;
                let built = transforms::set_block_kind(editor, kind);
                apply_built(editor, built, "set block type")
            })
            .description("Convert the selected blocks, keeping alignment and indent.")
            .keywords(["paragraph", "heading", "quote", "block"])
            .args_example(serde_json::json!({ "kind": { "type": "heading", "level": 1 } })),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![QuerySpec::new("selection.block", |editor, _args| {
            serde_json::to_value(editor.anchor_block().map(|block| block.kind))
                .map_err(|err| QueryError::new(format!("Failed to encode block kind: {err}")))
        })]
    }
}

#[derive(Deserialize)]
struct SetAlignArgs {
    align: ElementAlign,
}

struct AlignPlugin;

impl EditorPlugin for AlignPlugin {
    fn id(&self) -> &'static str {
        "block.align"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("block.set_align", "Set block alignment", |editor, args| {
                let SetAlignArgs { align } = parse_args(args)?;
                let built = transforms::set_align(editor, align);
                apply_built(editor, built, "set alignment")
            })
            .description("Set text alignment for the selected blocks.")
            .keywords(["align", "alignment", "left", "center", "right", "justify"])
            .args_example(serde_json::json!({ "align": "center" })),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![QuerySpec::new("selection.align", |editor, _args| {
            serde_json::to_value(editor.anchor_block().map(|block| block.align))
                .map_err(|err| QueryError::new(format!("Failed to encode alignment: {err}")))
        })]
    }
}

struct IndentPlugin;

impl EditorPlugin for IndentPlugin {
    fn id(&self) -> &'static str {
        "block.indent"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("block.indent", "Indent", |editor, _args| {
                let built = transforms::indent(editor);
                apply_built(editor, built, "indent")
            })
            .keywords(["indent", "tab"]),
            CommandSpec::new("block.outdent", "Outdent", |editor, _args| {
                let built = transforms::outdent(editor);
                apply_built(editor, built, "outdent")
            })
            .keywords(["outdent", "dedent"]),
        ]
    }
}

#[derive(Deserialize)]
struct InsertListArgs {
    list: ListKind,
}

struct ListPlugin;

impl EditorPlugin for ListPlugin {
    fn id(&self) -> &'static str {
        "list"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("list.insert", "Insert list", |editor, args| {
                let InsertListArgs { list } = parse_args(args)?;
                let built = transforms::insert_list(editor, list);
                apply_built(editor, built, "insert list")
            })
            .keywords(["list", "bullet", "number", "ordered"])
            .args_example(serde_json::json!({ "list": "bullet" })),
            CommandSpec::new("list.remove", "Remove list", |editor, _args| {
                let built = transforms::remove_list(editor);
                apply_built(editor, built, "remove list")
            })
            .keywords(["list", "clear"]),
        ]
    }
}

#[derive(Deserialize)]
struct InsertAfterArgs {
    key: NodeKey,
    #[serde(default)]
    kind: BlockKind,
}

#[derive(Deserialize)]
struct MoveArgs {
    source: NodeKey,
    target: NodeKey,
    position: DropPosition,
}

#[derive(Deserialize)]
struct DeleteArgs {
    key: NodeKey,
}

struct StructurePlugin;

impl EditorPlugin for StructurePlugin {
    fn id(&self) -> &'static str {
        "block.structure"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("block.insert_after", "Insert block after", |editor, args| {
                let InsertAfterArgs { key, kind } = parse_args(args)?;
                let built = transforms::insert_block_after(editor, key, kind);
                apply_built(editor, built, "insert block")
            })
            .description("Insert an empty block after the given block and move the caret into it.")
            .args_example(serde_json::json!({ "key": 1, "kind": { "type": "paragraph" } })),
            CommandSpec::new("block.move", "Move block", |editor, args| {
                let MoveArgs {
                    source,
                    target,
                    position,
                } = parse_args(args)?;
                let built = transforms::move_block(editor, source, target, position);
                apply_built(editor, built, "move block")
            })
            .description("Move a top-level block before or after another one.")
            .args_example(serde_json::json!({ "source": 1, "target": 3, "position": "after" })),
            CommandSpec::new("block.delete", "Delete block", |editor, args| {
                let DeleteArgs { key } = parse_args(args)?;
                let built = transforms::delete_block(editor, key);
                apply_built(editor, built, "delete block")
            })
            .args_example(serde_json::json!({ "key": 1 })),
        ]
    }
}
