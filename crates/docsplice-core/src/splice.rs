//! Splice planner: rendered comments → ordered, non-overlapping insertions.

use crate::model::*;

/// A rendered comment waiting for a position in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedComment {
    /// Index into `Catalog::records`.
    pub target: usize,
    /// Block text with `\n` separators and no indentation.
    pub text: String,
}

/// Insertions for one file plus the comments that could not be placed.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Plan {
    /// Strictly increasing offsets.
    pub operations: Vec<SpliceOperation>,
    pub conflicts: Vec<PlanConflict>,
}

/// Two targets resolved to the same insertion point; the later one is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanConflict {
    pub dropped: usize,
    pub kept: usize,
}

/// Build the insertion plan for one file.
pub fn plan(catalog: &Catalog, source: &str, rendered: &[RenderedComment]) -> Plan {
    let mut operations: Vec<SpliceOperation> = rendered
        .iter()
        .filter_map(|comment| {
            let record = catalog.get(comment.target)?;
            Some(operation_for(source, record, comment, catalog.line_terminator))
        })
        .collect();
    operations.sort_by_key(|op| (op.offset, op.target));

    let mut result = Plan::default();
    for op in operations {
        match result.operations.last() {
            Some(last) if last.offset == op.offset => {
                log::warn!(
                    "declarations #{} and #{} share insertion offset {}",
                    last.target,
                    op.target,
                    op.offset
                );
                result.conflicts.push(PlanConflict {
                    dropped: op.target,
                    kept: last.target,
                });
            }
            _ => result.operations.push(op),
        }
    }
    result
}

/// Place the block on its own lines above the declaration, indented to the
/// declaration's column.
fn operation_for(
    source: &str,
    record: &DeclarationRecord,
    comment: &RenderedComment,
    terminator: &str,
) -> SpliceOperation {
    let anchor = record.anchor;
    let line_start = source[..anchor].rfind('\n').map_or(0, |p| p + 1);
    let prefix = &source[line_start..anchor];

    if prefix.chars().all(|c| c == ' ' || c == '\t') {
        let mut text = String::new();
        push_block(&mut text, &comment.text, prefix, terminator);
        SpliceOperation {
            offset: line_start,
            removed: 0,
            text,
            target: comment.target,
        }
    } else {
        // Code precedes the declaration on this line: break the line at the
        // end of that code, dropping the whitespace gap.
        let indent: String = prefix
            .chars()
            .take_while(|c| *c == ' ' || *c == '\t')
            .collect();
        let code_end = line_start + prefix.trim_end().len();
        let mut text = String::from(terminator);
        push_block(&mut text, &comment.text, &indent, terminator);
        text.push_str(&indent);
        SpliceOperation {
            offset: code_end,
            removed: anchor - code_end,
            text,
            target: comment.target,
        }
    }
}

fn push_block(out: &mut String, block: &str, indent: &str, terminator: &str) {
    for line in block.lines() {
        out.push_str(indent);
        out.push_str(line);
        out.push_str(terminator);
    }
}
