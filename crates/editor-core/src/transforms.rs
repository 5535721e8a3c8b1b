use crate::core::{
    Block, BlockKind, BlockProps, CoveredRun, DropPosition, Editor, ElementAlign, ListKind,
    MAX_INDENT_LEVEL, NodeKey, Point, RangeSelection, Selection, TextFormat, TextRun,
};
use crate::ops::{Op, Transaction};
use crate::style::StyleMap;

/// Indices of the top-level blocks the selection touches, in document order.
pub fn selected_block_indices(editor: &Editor) -> Vec<usize> {
    let doc = editor.doc();
    match editor.selection() {
        Some(Selection::Range(range)) => {
            let (Some(anchor), Some(focus)) = (
                doc.resolve_point(&range.anchor),
                doc.resolve_point(&range.focus),
            ) else {
                return Vec::new();
            };
            let (start, end) = if anchor <= focus {
                (anchor.block, focus.block)
            } else {
                (focus.block, anchor.block)
            };
            (start..=end).collect()
        }
        Some(Selection::Node { keys }) => {
            let mut indices: Vec<usize> = keys.iter().filter_map(|k| doc.block_index(*k)).collect();
            indices.sort_unstable();
            indices.dedup();
            indices
        }
        None => Vec::new(),
    }
}

/// Splits the runs at the range boundaries and applies `f` to each covered
/// fragment. The first fragment of a split run keeps the run's key. The
/// resulting selection spans exactly the mapped fragments.
pub fn split_and_map(
    editor: &mut Editor,
    f: impl Fn(&mut TextRun),
) -> Result<Transaction, String> {
    let Some(range) = editor.range_selection().cloned() else {
        return Err("No range selection".to_string());
    };
    let covered = editor.covered_runs();
    if covered.is_empty() {
        return Ok(Transaction::default());
    }

    let backward = match (
        editor.doc().resolve_point(&range.anchor),
        editor.doc().resolve_point(&range.focus),
    ) {
        (Some(anchor), Some(focus)) => focus < anchor,
        _ => false,
    };

    let mut ops = Vec::new();
    let mut first_mapped: Option<Point> = None;
    let mut last_mapped: Option<Point> = None;

    let mut block_indices: Vec<usize> = covered.iter().map(|c| c.block).collect();
    block_indices.dedup();

    for block_ix in block_indices {
        let old_runs = editor.doc().blocks[block_ix].children.clone();
        let mut runs: Vec<TextRun> = Vec::with_capacity(old_runs.len() + 2);

        for (run_ix, run) in old_runs.into_iter().enumerate() {
            let Some(CoveredRun { range: span, .. }) = covered
                .iter()
                .find(|c| c.block == block_ix && c.run == run_ix)
            else {
                runs.push(run);
                continue;
            };

            let mut key = Some(run.key);
            let mut next_key =
                |editor: &mut Editor| key.take().unwrap_or_else(|| editor.alloc_key());

            if span.start > 0 {
                runs.push(TextRun {
                    key: next_key(editor),
                    text: run.text[..span.start].to_string(),
                    format: run.format,
                    style: run.style.clone(),
                });
            }

            let mut mapped = TextRun {
                key: next_key(editor),
                text: run.text[span.clone()].to_string(),
                format: run.format,
                style: run.style.clone(),
            };
            f(&mut mapped);
            if first_mapped.is_none() {
                first_mapped = Some(Point::text(mapped.key, 0));
            }
            last_mapped = Some(Point::text(mapped.key, mapped.text.len()));
            runs.push(mapped);

            if span.end < run.text.len() {
                runs.push(TextRun {
                    key: next_key(editor),
                    text: run.text[span.end..].to_string(),
                    format: run.format,
                    style: run.style.clone(),
                });
            }
        }

        ops.push(Op::ReplaceRuns {
            index: block_ix,
            runs,
        });
    }

    let mut tx = Transaction::new(ops);
    if let (Some(start), Some(end)) = (first_mapped, last_mapped) {
        let (anchor, focus) = if backward { (end, start) } else { (start, end) };
        tx = tx.selection_after(Selection::Range(RangeSelection::new(anchor, focus)));
    }
    Ok(tx)
}

/// Toggles `format`. A caret flips its pending format; a range sets every
/// covered run to the negation of the first covered run's flag.
pub fn toggle_format(editor: &mut Editor, format: TextFormat) -> Result<Transaction, String> {
    let Some(range) = editor.range_selection().cloned() else {
        return Ok(Transaction::default());
    };

    if range.is_collapsed() {
        let mut next = range;
        next.format = next.format.toggled(format);
        return Ok(Transaction::new(Vec::new()).selection_after(Selection::Range(next)));
    }

    let covered = editor.covered_runs();
    let Some(first) = covered.first() else {
        return Ok(Transaction::default());
    };
    let target = !editor.doc().blocks[first.block].children[first.run]
        .format
        .contains(format);

    split_and_map(editor, |run| run.format.set(format, target))
}

/// Merges `patch` into the style of the selected text. An empty value
/// removes the property.
pub fn patch_style(editor: &mut Editor, patch: &StyleMap) -> Result<Transaction, String> {
    let Some(range) = editor.range_selection().cloned() else {
        return Ok(Transaction::default());
    };

    if range.is_collapsed() {
        let mut next = range;
        next.style.patch(patch);
        return Ok(Transaction::new(Vec::new()).selection_after(Selection::Range(next)));
    }

    split_and_map(editor, |run| run.style.patch(patch))
}

fn map_selected_blocks(editor: &Editor, f: impl Fn(BlockProps) -> BlockProps) -> Transaction {
    let ops = selected_block_indices(editor)
        .into_iter()
        .filter_map(|index| {
            let props = editor.doc().blocks.get(index)?.props();
            let next = f(props);
            (next != props).then_some(Op::SetBlockProps { index, props: next })
        })
        .collect();
    Transaction::new(ops)
}

pub fn set_block_kind(editor: &Editor, kind: BlockKind) -> Result<Transaction, String> {
    Ok(map_selected_blocks(editor, |props| BlockProps { kind, ..props }))
}

pub fn set_align(editor: &Editor, align: ElementAlign) -> Result<Transaction, String> {
    Ok(map_selected_blocks(editor, |props| BlockProps { align, ..props }))
}

pub fn indent(editor: &Editor) -> Result<Transaction, String> {
    Ok(map_selected_blocks(editor, |props| BlockProps {
        indent: (props.indent + 1).min(MAX_INDENT_LEVEL),
        ..props
    }))
}

pub fn outdent(editor: &Editor) -> Result<Transaction, String> {
    Ok(map_selected_blocks(editor, |props| BlockProps {
        indent: props.indent.saturating_sub(1),
        ..props
    }))
}

pub fn insert_list(editor: &Editor, list: ListKind) -> Result<Transaction, String> {
    set_block_kind(editor, BlockKind::ListItem { list })
}

pub fn remove_list(editor: &Editor) -> Result<Transaction, String> {
    Ok(map_selected_blocks(editor, |props| match props.kind {
        BlockKind::ListItem { .. } => BlockProps {
            kind: BlockKind::Paragraph,
            ..props
        },
        _ => props,
    }))
}

fn fresh_block(editor: &mut Editor, kind: BlockKind) -> Block {
    let mut block = Block::new(kind, vec![TextRun::new("")]);
    block.key = editor.alloc_key();
    block.children[0].key = editor.alloc_key();
    block
}

/// Inserts an empty block of `kind` after the top-level block of `key` and
/// puts the caret in it.
pub fn insert_block_after(
    editor: &mut Editor,
    key: NodeKey,
    kind: BlockKind,
) -> Result<Transaction, String> {
    let Some(index) = editor.doc().block_index(key) else {
        return Err(format!("Block not found: {key}"));
    };
    let block = fresh_block(editor, kind);
    let caret = block.start_point();
    Ok(Transaction::new(vec![Op::InsertBlock {
        index: index + 1,
        block,
    }])
    .selection_after(Selection::caret(caret)))
}

/// Moves the top-level block `source` before or after `target`. Empty when
/// the move would not change the order.
pub fn move_block(
    editor: &Editor,
    source: NodeKey,
    target: NodeKey,
    position: DropPosition,
) -> Result<Transaction, String> {
    let doc = editor.doc();
    let Some(from) = doc.block_index(source) else {
        return Err(format!("Block not found: {source}"));
    };
    let Some(target_ix) = doc.block_index(target) else {
        return Err(format!("Block not found: {target}"));
    };
    if from == target_ix {
        return Ok(Transaction::default());
    }

    let gap = match position {
        DropPosition::Before => target_ix,
        DropPosition::After => target_ix + 1,
    };
    let to = if gap > from { gap - 1 } else { gap };
    if to == from {
        return Ok(Transaction::default());
    }

    let block = doc.blocks[from].clone();
    let caret = block.start_point();
    Ok(Transaction::new(vec![
        Op::RemoveBlock { index: from },
        Op::InsertBlock { index: to, block },
    ])
    .selection_after(Selection::caret(caret)))
}

/// Removes the top-level block of `key`. The caret moves to the next block,
/// else the previous one, else a fresh empty paragraph.
pub fn delete_block(editor: &mut Editor, key: NodeKey) -> Result<Transaction, String> {
    let Some(index) = editor.doc().block_index(key) else {
        return Err(format!("Block not found: {key}"));
    };
    let blocks = &editor.doc().blocks;
    let caret = blocks
        .get(index + 1)
        .map(Block::start_point)
        .or_else(|| index.checked_sub(1).map(|prev| blocks[prev].end_point()));

    let mut ops = vec![Op::RemoveBlock { index }];
    let caret = match caret {
        Some(caret) => caret,
        None => {
            let block = fresh_block(editor, BlockKind::Paragraph);
            let caret = block.start_point();
            ops.push(Op::InsertBlock { index: 0, block });
            caret
        }
    };
    Ok(Transaction::new(ops).selection_after(Selection::caret(caret)))
}
