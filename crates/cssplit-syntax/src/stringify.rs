//! Turning a syntax tree back into CSS text.
//!
//! [`Stringifier`] writes nodes in document order in one of two
//! [`OutputStyle`]s. When asked, it also records a source map that points every
//! parsed node back at its original position.

use serde::{Deserialize, Serialize};
use sourcemap::SourceMapBuilder;

use cssplit_core::{Declaration, Node, NodeId, SourcePosition, SyntaxTree};

use crate::{Error, Result};

/// Formatting of stringified CSS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStyle {
    /// One declaration per line, two space indentation.
    #[default]
    Pretty,
    /// No optional whitespace.
    Compact,
}

/// Source map settings for [`Stringifier::stringify_with_map`].
#[derive(Debug, Clone, Copy)]
pub struct MapOptions<'a> {
    /// Name of the generated file, recorded as the map's `file`.
    pub file: &'a str,
    /// Name of the original stylesheet.
    pub source: &'a str,
    /// Original stylesheet text to embed in the map.
    pub source_contents: Option<&'a str>,
}

/// Stringified CSS and its optional source map (JSON).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stringified {
    pub css: String,
    pub map: Option<String>,
}

/// Writes syntax trees as CSS text.
#[derive(Debug, Clone, Copy, Default)]
pub struct Stringifier {
    style: OutputStyle,
}

impl Stringifier {
    /// Create a stringifier with the given style.
    pub fn new(style: OutputStyle) -> Self {
        Self { style }
    }

    /// The output style in use.
    pub fn style(&self) -> OutputStyle {
        self.style
    }

    /// Stringify a whole tree.
    pub fn stringify(&self, tree: &SyntaxTree) -> Result<String> {
        let mut output = Output::new(None);
        self.write_children(tree, tree.root(), 0, &mut output)?;
        Ok(output.css)
    }

    /// Stringify a whole tree and build a source map for it.
    pub fn stringify_with_map(
        &self,
        tree: &SyntaxTree,
        options: &MapOptions<'_>,
    ) -> Result<Stringified> {
        let mut builder = SourceMapBuilder::new(Some(options.file));
        let source_id = builder.add_source(options.source);
        if let Some(contents) = options.source_contents {
            builder.set_source_contents(source_id, Some(contents));
        }

        let mut output = Output::new(Some((builder, source_id)));
        self.write_children(tree, tree.root(), 0, &mut output)?;

        let Output { css, map, .. } = output;
        let map = match map {
            Some((builder, _)) => Some(encode_map(builder)?),
            None => None,
        };
        Ok(Stringified { css, map })
    }

    fn write_children(
        &self,
        tree: &SyntaxTree,
        parent: NodeId,
        depth: usize,
        output: &mut Output,
    ) -> Result<()> {
        let mut after_declaration = false;
        for &child in tree.children(parent)? {
            let is_declaration = matches!(tree.get(child)?, Node::Declaration(_));
            // A declaration followed by anything needs its terminator.
            if self.style == OutputStyle::Compact && after_declaration {
                output.push(";");
            }
            self.write_node(tree, child, depth, output)?;
            after_declaration = is_declaration;
        }
        Ok(())
    }

    fn write_node(
        &self,
        tree: &SyntaxTree,
        id: NodeId,
        depth: usize,
        output: &mut Output,
    ) -> Result<()> {
        let compact = self.style == OutputStyle::Compact;
        let indent = if compact { String::new() } else { "  ".repeat(depth) };

        output.push(&indent);
        output.mark(tree.source(id)?);

        match tree.get(id)? {
            Node::Root => self.write_children(tree, id, depth, output)?,

            Node::Rule(rule) if compact => {
                output.push(&rule.selectors.join(","));
                output.push("{");
                let body: Vec<String> = rule
                    .declarations
                    .iter()
                    .map(|decl| declaration_text(decl, true))
                    .collect();
                output.push(&body.join(";"));
                output.push("}");
            }
            Node::Rule(rule) => {
                output.push(&rule.selectors.join(", "));
                if rule.declarations.is_empty() {
                    output.push(" {}\n");
                } else {
                    output.push(" {\n");
                    for decl in &rule.declarations {
                        output.push(&indent);
                        output.push("  ");
                        output.push(&declaration_text(decl, false));
                        output.push(";\n");
                    }
                    output.push(&indent);
                    output.push("}\n");
                }
            }

            Node::Block(block) => {
                output.push("@");
                output.push(&block.name);
                if !block.prelude.is_empty() {
                    output.push(" ");
                    output.push(&block.prelude);
                }
                if compact {
                    output.push("{");
                    self.write_children(tree, id, depth + 1, output)?;
                    output.push("}");
                } else if tree.children(id)?.is_empty() {
                    output.push(" {}\n");
                } else {
                    output.push(" {\n");
                    self.write_children(tree, id, depth + 1, output)?;
                    output.push(&indent);
                    output.push("}\n");
                }
            }

            Node::Declaration(decl) => {
                output.push(&declaration_text(decl, compact));
                if !compact {
                    output.push(";\n");
                }
            }

            Node::Directive(directive) => {
                output.push("@");
                output.push(&directive.name);
                if !directive.params.is_empty() {
                    output.push(" ");
                    output.push(&directive.params);
                }
                output.push(if compact { ";" } else { ";\n" });
            }
        }

        Ok(())
    }
}

fn declaration_text(decl: &Declaration, compact: bool) -> String {
    let separator = if compact { ":" } else { ": " };
    let important = match (decl.important, compact) {
        (false, _) => "",
        (true, true) => "!important",
        (true, false) => " !important",
    };
    format!("{}{separator}{}{important}", decl.property, decl.value)
}

fn encode_map(builder: SourceMapBuilder) -> Result<String> {
    let map = builder.into_sourcemap();
    let mut bytes = Vec::new();
    map.to_writer(&mut bytes)
        .map_err(|e| Error::SourceMap(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| Error::SourceMap(e.to_string()))
}

/// Generated text plus the position the next byte will land on.
struct Output {
    css: String,
    line: u32,
    column: u32,
    map: Option<(SourceMapBuilder, u32)>,
}

impl Output {
    fn new(map: Option<(SourceMapBuilder, u32)>) -> Self {
        Self {
            css: String::new(),
            line: 0,
            column: 0,
            map,
        }
    }

    fn push(&mut self, text: &str) {
        for ch in text.chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 0;
            } else {
                self.column += ch.len_utf16() as u32;
            }
        }
        self.css.push_str(text);
    }

    /// Map the current generated position to `source`.
    fn mark(&mut self, source: Option<SourcePosition>) {
        if let (Some((builder, source_id)), Some(source)) = (self.map.as_mut(), source) {
            builder.add_raw(
                self.line,
                self.column,
                source.line,
                source.column.saturating_sub(1),
                Some(*source_id),
                None,
                false,
            );
        }
    }
}
