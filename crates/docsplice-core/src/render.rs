//! Comment renderer: structured payload → JSDoc block.
//!
//! Body order is fixed: summary, then `@param` lines in the declaration's
//! parameter order, then `@returns`, then `@throws`. The block is produced with
//! `\n` separators and no indentation; the splice planner adapts both to the
//! target file.

use crate::error::RenderError;
use crate::model::*;

/// Formatting knobs for rendered comments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Wrap summary lines to at most this many characters.
    pub wrap_width: Option<usize>,
}

/// Trait for turning a resolved comment into comment text.
pub trait Renderer {
    fn render(
        &self,
        resolved: &ResolvedComment,
        record: &DeclarationRecord,
    ) -> Result<String, RenderError>;
}

/// Renders `/** ... */` blocks with ` * ` line prefixes.
#[derive(Debug, Clone, Default)]
pub struct JsDocRenderer {
    pub options: RenderOptions,
}

impl JsDocRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }
}

/// Render with default options.
pub fn render(resolved: &ResolvedComment, record: &DeclarationRecord) -> Result<String, RenderError> {
    JsDocRenderer::default().render(resolved, record)
}

impl Renderer for JsDocRenderer {
    fn render(
        &self,
        resolved: &ResolvedComment,
        record: &DeclarationRecord,
    ) -> Result<String, RenderError> {
        let proposal = &resolved.proposal;

        let summary = clean_text(&proposal.summary);
        if summary.trim().is_empty() {
            return Err(RenderError::EmptySummary);
        }

        let returns = proposal
            .returns
            .as_deref()
            .map(clean_text)
            .filter(|r| !r.trim().is_empty());
        // Constructors, setters and void members must never carry @returns.
        if returns.is_some() && record.callable && !record.may_return_value() {
            return Err(RenderError::ReturnsNotAllowed {
                target: record.key.to_string(),
            });
        }

        let mut body: Vec<String> = Vec::new();
        for line in summary.trim().lines() {
            match self.options.wrap_width {
                Some(width) => body.extend(wrap_line(line, width)),
                None => body.push(line.trim_end().to_string()),
            }
        }

        let mut tags: Vec<String> = Vec::new();
        for param in &record.params {
            if !is_identifier(&param.name) {
                log::debug!("{}: no @param for pattern {}", record.key, param.name);
                continue;
            }
            if let Some(doc) = proposal.params.iter().find(|d| d.name == param.name) {
                let description = clean_text(&doc.description);
                tags.push(format!("@param {} {}", param.name, description.trim()));
            }
        }
        for doc in &proposal.params {
            if !record.params.iter().any(|p| p.name == doc.name) {
                log::debug!("{} has no parameter {}, dropping its description", record.key, doc.name);
            }
        }
        if let Some(returns) = returns {
            if record.may_return_value() {
                tags.push(format!("@returns {}", returns.trim()));
            } else {
                log::debug!("{} cannot return a value, omitting @returns", record.key);
            }
        }
        if proposal.throws && record.callable {
            tags.push("@throws {Error} Not implemented.".to_string());
        }

        if tags.is_empty() && body.len() == 1 && is_compact_shape(record) {
            return Ok(format!("/** {} */", body[0]));
        }

        let mut out = String::from("/**\n");
        for line in &body {
            push_comment_line(&mut out, line);
        }
        if !tags.is_empty() {
            out.push_str(" *\n");
            for tag in &tags {
                for line in tag.lines() {
                    push_comment_line(&mut out, line);
                }
            }
        }
        out.push_str(" */");
        Ok(out)
    }
}

/// Plain fields and constants get a one-line comment.
fn is_compact_shape(record: &DeclarationRecord) -> bool {
    !record.callable
        && matches!(
            record.key.kind,
            DeclarationKind::PropertyMember | DeclarationKind::VariableDeclaration
        )
}

/// Destructuring patterns have no name a `@param` tag could refer to.
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

fn push_comment_line(out: &mut String, line: &str) {
    let line = line.trim_end();
    if line.is_empty() {
        out.push_str(" *\n");
    } else {
        out.push_str(" * ");
        out.push_str(line);
        out.push('\n');
    }
}

/// Normalize line endings and keep the text from closing the comment early.
fn clean_text(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace("*/", "*\\/")
}

/// Greedy word wrap counting characters, not bytes. Over-long words keep
/// their own line.
fn wrap_line(line: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in line.split_whitespace() {
        let word_len = word.chars().count();
        if current_len > 0 && current_len + 1 + word_len > width {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}
