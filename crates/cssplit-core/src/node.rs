//! Node payloads stored in a [`SyntaxTree`](crate::SyntaxTree).
//!
//! A stylesheet is made of five kinds of nodes:
//!
//! - [`Node::Root`] - the single root of every tree
//! - [`Node::Block`] - an at-rule with a body (`@media`, `@keyframes`, `@font-face`, ...)
//! - [`Node::Rule`] - a style rule; its declarations are owned by value
//! - [`Node::Declaration`] - a declaration placed directly inside a block (`@font-face` bodies)
//! - [`Node::Directive`] - an at-rule without a body (`@charset`, `@import`)
//!
//! Only the root and blocks have children.

use std::fmt;

use slotmap::new_key_type;

new_key_type! {
    /// A handle to a node inside one [`SyntaxTree`](crate::SyntaxTree).
    ///
    /// IDs are stable while the tree is mutated and become invalid once the
    /// node is removed or moved into another tree.
    pub struct NodeId;
}

/// Location of a node in the text it was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourcePosition {
    /// 0-based line.
    pub line: u32,
    /// 1-based column.
    pub column: u32,
}

impl SourcePosition {
    /// Create a new source position.
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.column)
    }
}

/// A single `property: value` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Property name as written.
    pub property: String,
    /// Raw value text without the `!important` marker.
    pub value: String,
    /// Whether the declaration carried `!important`.
    pub important: bool,
}

impl Declaration {
    /// Create a normal declaration.
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
            important: false,
        }
    }

    /// Mark the declaration as `!important`.
    pub fn important(mut self) -> Self {
        self.important = true;
        self
    }
}

/// A style rule: comma separated selectors and a declaration list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRule {
    /// Selectors in source order. The selector count of the rule is the length of this list.
    pub selectors: Vec<String>,
    /// Declarations in source order.
    pub declarations: Vec<Declaration>,
}

impl StyleRule {
    /// Create a rule with the given selectors and no declarations.
    pub fn new<I, S>(selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            selectors: selectors.into_iter().map(Into::into).collect(),
            declarations: Vec::new(),
        }
    }

    /// Add a declaration (builder style).
    pub fn with_declaration(mut self, declaration: Declaration) -> Self {
        self.declarations.push(declaration);
        self
    }

    /// Number of selectors in this rule.
    pub fn selector_count(&self) -> usize {
        self.selectors.len()
    }
}

/// Classification of at-rule names.
///
/// Vendor prefixes are ignored and matching is ASCII case-insensitive, so
/// `@-webkit-keyframes` and `@KEYFRAMES` both classify as [`AtRuleKind::Keyframes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtRuleKind {
    Media,
    Supports,
    Container,
    Layer,
    Document,
    Scope,
    StartingStyle,
    Keyframes,
    FontFace,
    Page,
    CounterStyle,
    Property,
    FontPaletteValues,
    Charset,
    Import,
    Namespace,
    /// Any at-rule this crate has no special knowledge of.
    Other,
}

impl AtRuleKind {
    /// Classify an at-rule by name (without the leading `@`).
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        let unprefixed = ["-webkit-", "-moz-", "-o-", "-ms-"]
            .iter()
            .find_map(|prefix| lower.strip_prefix(prefix))
            .unwrap_or(lower.as_str());

        match unprefixed {
            "media" => Self::Media,
            "supports" => Self::Supports,
            "container" => Self::Container,
            "layer" => Self::Layer,
            "document" => Self::Document,
            "scope" => Self::Scope,
            "starting-style" => Self::StartingStyle,
            "keyframes" => Self::Keyframes,
            "font-face" => Self::FontFace,
            "page" => Self::Page,
            "counter-style" => Self::CounterStyle,
            "property" => Self::Property,
            "font-palette-values" => Self::FontPaletteValues,
            "charset" => Self::Charset,
            "import" => Self::Import,
            "namespace" => Self::Namespace,
            _ => Self::Other,
        }
    }

    /// Whether the body of this at-rule is a declaration list rather than a rule list.
    pub fn holds_declarations(self) -> bool {
        matches!(
            self,
            Self::FontFace | Self::Page | Self::CounterStyle | Self::Property | Self::FontPaletteValues
        )
    }

    /// Whether this at-rule must stay at the very start of a stylesheet.
    pub fn is_preamble(self) -> bool {
        matches!(self, Self::Charset)
    }
}

/// An at-rule with a body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtBlock {
    /// Name without the leading `@`, as written.
    pub name: String,
    /// Raw prelude text between the name and the opening brace (trimmed).
    pub prelude: String,
    /// Classification of `name`.
    pub kind: AtRuleKind,
}

impl AtBlock {
    /// Create a block, classifying its name.
    pub fn new(name: impl Into<String>, prelude: impl Into<String>) -> Self {
        let name = name.into();
        let kind = AtRuleKind::from_name(&name);
        Self {
            name,
            prelude: prelude.into(),
            kind,
        }
    }
}

/// An at-rule without a body, terminated by `;`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Name without the leading `@`, as written.
    pub name: String,
    /// Raw parameter text (trimmed).
    pub params: String,
    /// Classification of `name`.
    pub kind: AtRuleKind,
}

impl Directive {
    /// Create a directive, classifying its name.
    pub fn new(name: impl Into<String>, params: impl Into<String>) -> Self {
        let name = name.into();
        let kind = AtRuleKind::from_name(&name);
        Self {
            name,
            params: params.into(),
            kind,
        }
    }

    /// An `@import url(<target>)` directive.
    pub fn import_url(target: &str) -> Self {
        Self::new("import", format!("url({target})"))
    }
}

/// The payload of a tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Root,
    Block(AtBlock),
    Rule(StyleRule),
    Declaration(Declaration),
    Directive(Directive),
}

impl Node {
    /// Whether nodes of this kind may own children.
    pub fn is_container(&self) -> bool {
        matches!(self, Node::Root | Node::Block(_))
    }

    /// The style rule payload, if this is a rule.
    pub fn as_rule(&self) -> Option<&StyleRule> {
        match self {
            Node::Rule(rule) => Some(rule),
            _ => None,
        }
    }

    /// The block payload, if this is a block.
    pub fn as_block(&self) -> Option<&AtBlock> {
        match self {
            Node::Block(block) => Some(block),
            _ => None,
        }
    }

    /// The directive payload, if this is a directive.
    pub fn as_directive(&self) -> Option<&Directive> {
        match self {
            Node::Directive(directive) => Some(directive),
            _ => None,
        }
    }

    /// Short label used in debug output.
    pub fn label(&self) -> String {
        match self {
            Node::Root => "root".to_string(),
            Node::Block(block) if block.prelude.is_empty() => format!("@{}", block.name),
            Node::Block(block) => format!("@{} {}", block.name, block.prelude),
            Node::Rule(rule) => rule.selectors.join(","),
            Node::Declaration(decl) => format!("{}: {}", decl.property, decl.value),
            Node::Directive(directive) => format!("@{} {}", directive.name, directive.params),
        }
    }
}
