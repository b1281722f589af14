//! Syntax indexer: TypeScript source → flat catalog of documentable declarations.
//!
//! Parses with tree-sitter's TypeScript grammar and walks statements, namespaces,
//! class bodies and interface bodies (function bodies are never entered).
//! Each declaration becomes a [`DeclarationRecord`] carrying the byte offset a
//! doc comment should be spliced at and whether one is already attached.
//!
//! The tree is only read; records are plain data stored in source order.

use crate::error::ParseError;
use crate::model::*;
use std::path::Path;
use tree_sitter::{Language, Node, Parser, Tree};

/// Grammar flavour used for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    #[default]
    TypeScript,
    Tsx,
}

impl Dialect {
    /// `.tsx` files use the TSX grammar, everything else plain TypeScript.
    pub fn from_path(path: &Path) -> Dialect {
        match path.extension().and_then(|e| e.to_str()) {
            Some("tsx") => Dialect::Tsx,
            _ => Dialect::TypeScript,
        }
    }

    fn language(self) -> Language {
        match self {
            Dialect::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Dialect::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

/// Index a TypeScript file.
pub fn index(source: &str) -> Result<Catalog, ParseError> {
    index_with(source, Dialect::TypeScript)
}

/// Index a file with an explicit grammar flavour.
pub fn index_with(source: &str, dialect: Dialect) -> Result<Catalog, ParseError> {
    let tree = parse_tree(source, dialect)?;
    let root = tree.root_node();
    if root.has_error() {
        return Err(first_error(root));
    }

    let mut indexer = Indexer {
        source,
        records: Vec::new(),
    };
    indexer.visit_statements(root, &[]);

    // Members are pushed after their class; restore source order.
    let mut records = indexer.records;
    records.sort_by_key(|r| (r.anchor, r.decl_start));

    log::debug!("indexed {} declarations", records.len());
    Ok(Catalog {
        records,
        line_terminator: detect_line_terminator(source),
    })
}

/// `"\r\n"` if the first line break in the text is CRLF, else `"\n"`.
pub fn detect_line_terminator(source: &str) -> &'static str {
    match source.find('\n') {
        Some(pos) if pos > 0 && source.as_bytes()[pos - 1] == b'\r' => "\r\n",
        _ => "\n",
    }
}

/// A `/** ... */` block. `/**/` is an empty plain comment, not a doc comment.
pub fn is_doc_comment(text: &str) -> bool {
    text.starts_with("/**") && !text.starts_with("/**/")
}

fn parse_tree(source: &str, dialect: Dialect) -> Result<Tree, ParseError> {
    let mut parser = Parser::new();
    parser
        .set_language(&dialect.language())
        .map_err(|e| ParseError::Grammar(e.to_string()))?;
    parser.parse(source, None).ok_or(ParseError::NoTree)
}

/// Locate the first ERROR or MISSING node in document order.
fn first_error(node: Node) -> ParseError {
    if node.is_missing() {
        let pos = node.start_position();
        return ParseError::Missing {
            expected: node.kind().to_string(),
            line: pos.row + 1,
            column: pos.column + 1,
        };
    }
    if node.is_error() {
        let pos = node.start_position();
        return ParseError::Syntax {
            line: pos.row + 1,
            column: pos.column + 1,
        };
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.is_error() || child.is_missing() || child.has_error() {
            return first_error(child);
        }
    }
    // has_error() was true but no child carries it; report the node itself.
    let pos = node.start_position();
    ParseError::Syntax {
        line: pos.row + 1,
        column: pos.column + 1,
    }
}

// -- Tree walk ----------------------------------------------------------------

struct Indexer<'a> {
    source: &'a str,
    records: Vec<DeclarationRecord>,
}

/// Parameters, return type and callability of a declaration.
#[derive(Default)]
struct Signature {
    params: Vec<Param>,
    return_type: Option<String>,
    callable: bool,
}

impl<'a> Indexer<'a> {
    fn text(&self, node: Node) -> &'a str {
        &self.source[node.start_byte()..node.end_byte()]
    }

    fn field_text(&self, node: Node, field: &str) -> Option<String> {
        node.child_by_field_name(field)
            .map(|n| self.text(n).to_string())
    }

    fn visit_statements(&mut self, container: Node, scope: &[String]) {
        let mut cursor = container.walk();
        let children: Vec<Node> = container.named_children(&mut cursor).collect();
        for stmt in children {
            self.visit_statement(stmt, scope);
        }
    }

    fn visit_statement(&mut self, stmt: Node, scope: &[String]) {
        match stmt.kind() {
            "export_statement" => {
                if let Some(decl) = stmt.child_by_field_name("declaration") {
                    self.visit_declaration(decl, stmt, scope, Visibility::Exported);
                } else if let Some(value) = stmt.child_by_field_name("value") {
                    self.visit_default_export(value, stmt, scope);
                }
            }
            "expression_statement" => {
                // `namespace Foo {}` parses as an expression statement
                if let Some(inner) = first_named_child(stmt) {
                    if matches!(inner.kind(), "internal_module" | "module") {
                        self.visit_namespace(inner, scope);
                    }
                }
            }
            _ => self.visit_declaration(stmt, stmt, scope, Visibility::Local),
        }
    }

    /// `decl` is the declaration node; `outer` is the statement that owns the
    /// leading trivia (the export statement for exported declarations).
    fn visit_declaration(&mut self, decl: Node, outer: Node, scope: &[String], vis: Visibility) {
        match decl.kind() {
            "function_declaration" | "generator_function_declaration" | "function_signature" => {
                let Some(name) = self.field_text(decl, "name") else {
                    return;
                };
                let sig = self.callable_signature(decl);
                self.push(decl, outer, name, DeclarationKind::Function, scope, vis, sig, None);
            }
            "class_declaration" | "abstract_class_declaration" | "class" => {
                let name = self
                    .field_text(decl, "name")
                    .unwrap_or_else(|| "default".to_string());
                self.push(
                    decl,
                    outer,
                    name.clone(),
                    DeclarationKind::ClassDeclaration,
                    scope,
                    vis,
                    Signature::default(),
                    None,
                );
                if let Some(body) = decl.child_by_field_name("body") {
                    self.visit_members(body, &child_scope(scope, name));
                }
            }
            "interface_declaration" => {
                let Some(name) = self.field_text(decl, "name") else {
                    return;
                };
                self.push(
                    decl,
                    outer,
                    name.clone(),
                    DeclarationKind::InterfaceDeclaration,
                    scope,
                    vis,
                    Signature::default(),
                    None,
                );
                if let Some(body) = decl.child_by_field_name("body") {
                    self.visit_members(body, &child_scope(scope, name));
                }
            }
            "type_alias_declaration" => {
                let Some(name) = self.field_text(decl, "name") else {
                    return;
                };
                let sig = match decl.child_by_field_name("value") {
                    Some(value) if value.kind() == "function_type" => self.callable_signature(value),
                    _ => Signature::default(),
                };
                // An alias of a function type still never returns a value itself.
                let sig = Signature {
                    callable: false,
                    ..sig
                };
                self.push(decl, outer, name, DeclarationKind::TypeAlias, scope, vis, sig, None);
            }
            "lexical_declaration" | "variable_declaration" => {
                let mut cursor = decl.walk();
                let declarators: Vec<Node> = decl
                    .named_children(&mut cursor)
                    .filter(|n| n.kind() == "variable_declarator")
                    .collect();
                for declarator in declarators {
                    let Some(name_node) = declarator.child_by_field_name("name") else {
                        continue;
                    };
                    // Destructuring patterns have no single name to document.
                    if name_node.kind() != "identifier" {
                        continue;
                    }
                    let name = self.text(name_node).to_string();
                    let sig = match declarator.child_by_field_name("value") {
                        Some(value) if is_function_value(value) => self.callable_signature(value),
                        _ => Signature::default(),
                    };
                    self.push(
                        declarator,
                        outer,
                        name,
                        DeclarationKind::VariableDeclaration,
                        scope,
                        vis,
                        sig,
                        None,
                    );
                }
            }
            "internal_module" | "module" => self.visit_namespace(decl, scope),
            "ambient_declaration" => {
                let mut cursor = decl.walk();
                let inner: Vec<Node> = decl.named_children(&mut cursor).collect();
                for child in inner {
                    if child.kind() == "statement_block" {
                        // declare global { ... }
                        self.visit_statements(child, scope);
                    } else {
                        self.visit_declaration(child, outer, scope, vis);
                    }
                }
            }
            _ => {}
        }
    }

    /// `export default function () {}` / `export default class {}`.
    fn visit_default_export(&mut self, value: Node, outer: Node, scope: &[String]) {
        match value.kind() {
            "function_expression" | "function" | "generator_function" | "arrow_function" => {
                let name = self
                    .field_text(value, "name")
                    .unwrap_or_else(|| "default".to_string());
                let sig = self.callable_signature(value);
                self.push(
                    value,
                    outer,
                    name,
                    DeclarationKind::Function,
                    scope,
                    Visibility::Exported,
                    sig,
                    None,
                );
            }
            "class" => self.visit_declaration(value, outer, scope, Visibility::Exported),
            _ => {}
        }
    }

    fn visit_namespace(&mut self, module: Node, scope: &[String]) {
        let Some(name) = self.field_text(module, "name") else {
            return;
        };
        let name = name.trim_matches(|c| c == '"' || c == '\'').to_string();
        if let Some(body) = module.child_by_field_name("body") {
            self.visit_statements(body, &child_scope(scope, name));
        }
    }

    fn visit_members(&mut self, body: Node, scope: &[String]) {
        let mut cursor = body.walk();
        let members: Vec<Node> = body.named_children(&mut cursor).collect();
        for member in members {
            match member.kind() {
                "method_definition" | "method_signature" | "abstract_method_signature" => {
                    let Some(name) = self.field_text(member, "name") else {
                        continue;
                    };
                    let sig = self.callable_signature(member);
                    let accessor = member_accessor(member);
                    let vis = self.member_visibility(member, &name);
                    self.push(
                        member,
                        member,
                        name,
                        DeclarationKind::MethodMember,
                        scope,
                        vis,
                        sig,
                        accessor,
                    );
                }
                "public_field_definition" | "property_signature" => {
                    let Some(name) = self.field_text(member, "name") else {
                        continue;
                    };
                    let sig = self.property_signature(member);
                    let vis = self.member_visibility(member, &name);
                    self.push(
                        member,
                        member,
                        name,
                        DeclarationKind::PropertyMember,
                        scope,
                        vis,
                        sig,
                        None,
                    );
                }
                _ => {}
            }
        }
    }

    /// Fields initialized with a function, or typed with a function type, are callable.
    fn property_signature(&self, member: Node) -> Signature {
        if let Some(value) = member.child_by_field_name("value") {
            if is_function_value(value) {
                return self.callable_signature(value);
            }
        }
        let function_type = member
            .child_by_field_name("type")
            .and_then(first_named_child)
            .filter(|ty| ty.kind() == "function_type");
        match function_type {
            Some(ty) => self.callable_signature(ty),
            None => Signature::default(),
        }
    }

    fn member_visibility(&self, member: Node, name: &str) -> Visibility {
        let mut cursor = member.walk();
        let modifier = member
            .children(&mut cursor)
            .find(|c| c.kind() == "accessibility_modifier")
            .map(|c| self.text(c));
        match modifier {
            Some("private") => Visibility::Private,
            Some("protected") => Visibility::Protected,
            _ if name.starts_with('#') => Visibility::Private,
            _ => Visibility::Public,
        }
    }

    fn callable_signature(&self, node: Node) -> Signature {
        let params = match node.child_by_field_name("parameters") {
            Some(list) => self.formal_parameters(list),
            // `x => x` has a bare `parameter` field
            None => node
                .child_by_field_name("parameter")
                .map(|p| {
                    vec![Param {
                        name: self.text(p).to_string(),
                        type_hint: None,
                    }]
                })
                .unwrap_or_default(),
        };
        let return_type = node
            .child_by_field_name("return_type")
            .map(|t| type_text(self.text(t)));
        Signature {
            params,
            return_type,
            callable: true,
        }
    }

    fn formal_parameters(&self, list: Node) -> Vec<Param> {
        let mut params = Vec::new();
        let mut cursor = list.walk();
        for param in list.named_children(&mut cursor) {
            match param.kind() {
                "required_parameter" | "optional_parameter" => {
                    let Some(pattern) = param.child_by_field_name("pattern") else {
                        continue;
                    };
                    if pattern.kind() == "this" {
                        continue;
                    }
                    let name = self.text(pattern).trim_start_matches("...").to_string();
                    let type_hint = param
                        .child_by_field_name("type")
                        .map(|t| type_text(self.text(t)));
                    params.push(Param { name, type_hint });
                }
                "identifier" => params.push(Param {
                    name: self.text(param).to_string(),
                    type_hint: None,
                }),
                _ => {}
            }
        }
        params
    }

    #[allow(clippy::too_many_arguments)]
    fn push(
        &mut self,
        decl: Node,
        outer: Node,
        name: String,
        kind: DeclarationKind,
        scope: &[String],
        visibility: Visibility,
        sig: Signature,
        accessor: Option<Accessor>,
    ) {
        let (anchor, doc_above) = self.leading_trivia(outer);
        let has_doc = doc_above || self.doc_among_decorators(decl, outer);
        let pos = decl.start_position();
        self.records.push(DeclarationRecord {
            key: DeclarationKey {
                name,
                kind,
                scope: scope.to_vec(),
            },
            anchor,
            decl_start: decl.start_byte(),
            line: pos.row,
            column: pos.column,
            has_doc,
            visibility,
            params: sig.params,
            return_type: sig.return_type,
            accessor,
            callable: sig.callable,
        });
    }

    /// Walk back over the comments and decorators directly above `outer`.
    ///
    /// The anchor moves over trivia separated by whitespace without a blank
    /// line; decorators always belong to the declaration. A doc comment
    /// anywhere in the comment-only region above counts as existing docs.
    fn leading_trivia(&self, outer: Node) -> (usize, bool) {
        let mut anchor = outer.start_byte();
        let mut has_doc = false;
        let mut attached = true;
        let mut next_start = outer.start_byte();
        let mut current = outer;

        while let Some(prev) = current.prev_sibling() {
            let kind = prev.kind();
            if kind != "comment" && kind != "decorator" {
                break;
            }
            if kind == "comment" && self.trails_code(prev) {
                break;
            }
            let gap = &self.source[prev.end_byte()..next_start];
            if !gap.trim().is_empty() {
                break;
            }
            if gap.matches('\n').count() > 1 {
                attached = false;
            }
            if kind == "decorator" {
                attached = true;
            }
            if kind == "comment" && is_doc_comment(self.text(prev)) {
                has_doc = true;
            }
            if attached {
                anchor = prev.start_byte();
            }
            next_start = prev.start_byte();
            current = prev;
        }

        (anchor, has_doc)
    }

    /// Decorators parse as children of the declaration, so a doc comment
    /// written between `@Decorator()` and the name sits inside it.
    fn doc_among_decorators(&self, decl: Node, outer: Node) -> bool {
        let nodes = if decl.id() == outer.id() {
            vec![outer]
        } else {
            vec![outer, decl]
        };
        nodes.into_iter().any(|node| {
            let mut cursor = node.walk();
            let mut found = false;
            for child in node.children(&mut cursor) {
                match child.kind() {
                    "decorator" => {}
                    "comment" => found |= is_doc_comment(self.text(child)),
                    _ => break,
                }
            }
            found
        })
    }

    /// A comment that follows code on its own line belongs to that code.
    fn trails_code(&self, comment: Node) -> bool {
        let start = comment.start_byte();
        let line_start = self.source[..start].rfind('\n').map_or(0, |p| p + 1);
        !self.source[line_start..start].trim().is_empty()
    }
}

fn child_scope(scope: &[String], name: String) -> Vec<String> {
    let mut inner = scope.to_vec();
    inner.push(name);
    inner
}

fn first_named_child(node: Node) -> Option<Node> {
    let mut cursor = node.walk();
    let first = node.named_children(&mut cursor).next();
    first
}

fn is_function_value(node: Node) -> bool {
    matches!(
        node.kind(),
        "arrow_function" | "function_expression" | "function" | "generator_function"
    )
}

fn member_accessor(member: Node) -> Option<Accessor> {
    let name = member.child_by_field_name("name");
    let mut cursor = member.walk();
    let found = member
        .children(&mut cursor)
        .take_while(|c| Some(*c) != name)
        .find_map(|c| match c.kind() {
            "get" if !c.is_named() => Some(Accessor::Getter),
            "set" if !c.is_named() => Some(Accessor::Setter),
            _ => None,
        });
    found
}

/// `": number"` → `"number"`.
fn type_text(annotation: &str) -> String {
    annotation.trim_start_matches(':').trim().to_string()
}
