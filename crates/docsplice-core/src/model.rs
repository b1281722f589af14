//! Data model shared by every pipeline stage, one file at a time.

use crate::error::RenderError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of a documentable declaration. Determines comment shape rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum DeclarationKind {
    Function,
    ClassDeclaration,
    InterfaceDeclaration,
    TypeAlias,
    MethodMember,
    PropertyMember,
    VariableDeclaration,
}

impl DeclarationKind {
    /// Short lowercase label used in reports ("function", "method", ...).
    pub fn label(self) -> &'static str {
        match self {
            DeclarationKind::Function => "function",
            DeclarationKind::ClassDeclaration => "class",
            DeclarationKind::InterfaceDeclaration => "interface",
            DeclarationKind::TypeAlias => "type",
            DeclarationKind::MethodMember => "method",
            DeclarationKind::PropertyMember => "property",
            DeclarationKind::VariableDeclaration => "variable",
        }
    }
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKind(pub String);

impl fmt::Display for UnknownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown declaration kind: {}", self.0)
    }
}

impl std::error::Error for UnknownKind {}

impl FromStr for DeclarationKind {
    type Err = UnknownKind;

    /// Normalize a proposal label: case-insensitive, ignoring `_`, `-` and spaces.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        let kind = match normalized.as_str() {
            "function" | "fn" => DeclarationKind::Function,
            "class" | "classdeclaration" => DeclarationKind::ClassDeclaration,
            "interface" | "interfacedeclaration" => DeclarationKind::InterfaceDeclaration,
            "type" | "typealias" => DeclarationKind::TypeAlias,
            "method" | "methodmember" => DeclarationKind::MethodMember,
            "property" | "field" | "propertymember" => DeclarationKind::PropertyMember,
            "variable" | "const" | "let" | "var" | "variabledeclaration" => {
                DeclarationKind::VariableDeclaration
            }
            _ => return Err(UnknownKind(s.to_string())),
        };
        Ok(kind)
    }
}

impl TryFrom<String> for DeclarationKind {
    type Error = UnknownKind;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Identity of a declaration. Not unique within a file (overloads, same-named
/// members of different classes).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DeclarationKey {
    pub name: String,
    pub kind: DeclarationKind,
    /// Enclosing namespace/class/interface names, outermost first.
    pub scope: Vec<String>,
}

impl fmt::Display for DeclarationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.kind)?;
        for segment in &self.scope {
            write!(f, "{}.", segment)?;
        }
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Visibility {
    /// Top-level declaration under `export`.
    Exported,
    /// Module-private top-level declaration.
    Local,
    Public,
    Protected,
    Private,
}

/// `get`/`set` accessor members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Accessor {
    Getter,
    Setter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Param {
    pub name: String,
    pub type_hint: Option<String>,
}

/// One documentable declaration found by the indexer.
#[derive(Debug, Clone, Serialize)]
pub struct DeclarationRecord {
    pub key: DeclarationKey,
    /// Byte offset where a doc comment for this declaration is inserted:
    /// before attached leading comments/decorators, else the first token.
    pub anchor: usize,
    /// Byte offset of the declaration node itself.
    pub decl_start: usize,
    /// Zero-based line and column (bytes) of `decl_start`.
    pub line: usize,
    pub column: usize,
    pub has_doc: bool,
    pub visibility: Visibility,
    pub params: Vec<Param>,
    pub return_type: Option<String>,
    pub accessor: Option<Accessor>,
    /// Function, method, or a binding initialized with a function value.
    pub callable: bool,
}

impl DeclarationRecord {
    pub fn is_constructor(&self) -> bool {
        self.key.kind == DeclarationKind::MethodMember && self.key.name == "constructor"
    }

    /// True when a `@returns` line is meaningful for this declaration.
    pub fn may_return_value(&self) -> bool {
        if !self.callable || self.is_constructor() || self.accessor == Some(Accessor::Setter) {
            return false;
        }
        !matches!(self.return_type.as_deref(), Some("void" | "never"))
    }
}

/// Flat, source-ordered catalog of declarations for one file.
#[derive(Debug, Default)]
pub struct Catalog {
    pub records: Vec<DeclarationRecord>,
    /// `"\r\n"` when the file uses CRLF line endings, else `"\n"`.
    pub line_terminator: &'static str,
}

impl Catalog {
    pub fn get(&self, index: usize) -> Option<&DeclarationRecord> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Optional signature used to pick between same-named candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureHint {
    #[serde(default)]
    pub params: Vec<HintParam>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintParam {
    pub name: String,
    #[serde(default, rename = "type")]
    pub type_hint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDoc {
    pub name: String,
    pub description: String,
}

/// Externally generated documentation entry awaiting placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedComment {
    pub name: String,
    pub kind: DeclarationKind,
    #[serde(default)]
    pub signature: Option<SignatureHint>,
    /// Name of the enclosing class/interface/namespace, when known.
    #[serde(default)]
    pub owner: Option<String>,
    pub summary: String,
    #[serde(default)]
    pub params: Vec<ParamDoc>,
    #[serde(default)]
    pub returns: Option<String>,
    /// Marks a stub that throws "not implemented".
    #[serde(default)]
    pub throws: bool,
}

impl ProposedComment {
    pub fn key(&self) -> ProposalKey {
        ProposalKey {
            name: self.name.clone(),
            kind: self.kind,
            owner: self.owner.clone(),
        }
    }
}

/// Identity of a proposal as shown in reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProposalKey {
    pub name: String,
    pub kind: DeclarationKind,
    pub owner: Option<String>,
}

impl fmt::Display for ProposalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.owner {
            Some(ref owner) => write!(f, "{} {}.{}", self.kind, owner, self.name),
            None => write!(f, "{} {}", self.kind, self.name),
        }
    }
}

/// How a proposal found its declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Resolution {
    Unique,
    /// Several candidates shared (name, kind); the signature hint picked one.
    AmbiguousResolvedBySignature { candidates: usize, score: usize },
}

/// A proposal bound to exactly one catalog entry.
#[derive(Debug, Clone)]
pub struct ResolvedComment {
    pub proposal: ProposedComment,
    /// Index into `Catalog::records`.
    pub target: usize,
    pub resolution: Resolution,
}

/// Why a proposal produced no comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum UnresolvedReason {
    /// No declaration with this (name, kind).
    NotFound,
    /// Declarations exist, but none inside the named owner.
    OwnerMismatch,
    /// Another proposal won the same declaration.
    Superseded { target: DeclarationKey },
    /// The comment failed validation.
    Rejected { error: RenderError },
    /// Another declaration already claimed the same insertion point.
    Conflict { target: DeclarationKey },
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvedReason::NotFound => f.write_str("no matching declaration"),
            UnresolvedReason::OwnerMismatch => f.write_str("no matching declaration in owner"),
            UnresolvedReason::Superseded { target } => {
                write!(f, "another proposal won {}", target)
            }
            UnresolvedReason::Rejected { error } => write!(f, "rejected: {}", error),
            UnresolvedReason::Conflict { target } => {
                write!(f, "insertion point shared with {}", target)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unresolved {
    pub proposal: ProposalKey,
    #[serde(flatten)]
    pub reason: UnresolvedReason,
}

/// A planned insertion. Offsets refer to the original text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpliceOperation {
    pub offset: usize,
    /// Bytes of original text replaced by `text` (whitespace only, and only
    /// when a line is broken in two).
    pub removed: usize,
    pub text: String,
    pub target: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_labels_normalize() {
        assert_eq!("method".parse(), Ok(DeclarationKind::MethodMember));
        assert_eq!("MethodMember".parse(), Ok(DeclarationKind::MethodMember));
        assert_eq!("type_alias".parse(), Ok(DeclarationKind::TypeAlias));
        assert_eq!("Class Declaration".parse(), Ok(DeclarationKind::ClassDeclaration));
        assert_eq!("const".parse(), Ok(DeclarationKind::VariableDeclaration));
        assert!("enum".parse::<DeclarationKind>().is_err());
    }

    #[test]
    fn proposal_deserializes_with_defaults() {
        let json = r#"{"name": "add", "kind": "function", "summary": "Adds."}"#;
        let proposal: ProposedComment = serde_json::from_str(json).unwrap();
        assert_eq!(proposal.kind, DeclarationKind::Function);
        assert!(proposal.params.is_empty());
        assert!(proposal.signature.is_none());
        assert!(!proposal.throws);
    }

    #[test]
    fn proposal_rejects_unknown_kind() {
        let json = r#"{"name": "x", "kind": "enum", "summary": "X."}"#;
        assert!(serde_json::from_str::<ProposedComment>(json).is_err());
    }

    #[test]
    fn key_display_includes_scope() {
        let key = DeclarationKey {
            name: "area".to_string(),
            kind: DeclarationKind::MethodMember,
            scope: vec!["Shapes".to_string(), "Circle".to_string()],
        };
        assert_eq!(key.to_string(), "method Shapes.Circle.area");
    }
}
