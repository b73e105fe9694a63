//! CSS syntax parser using the `cssparser` crate.
//!
//! The parser tokenizes CSS input and builds a [`SyntaxTree`]. It keeps
//! selectors, preludes and values as raw text: nothing is validated beyond
//! what is needed to find the structure of the stylesheet.

use std::path::Path;

use cssparser::{Delimiter, ParseError as CssParseError, Parser, ParserInput, SourceLocation, Token};
use cssplit_core::logging::targets;
use cssplit_core::{
    AtBlock, AtRuleKind, Declaration, Directive, Node, NodeId, SourcePosition, StyleRule,
    SyntaxTree,
};

use crate::{Error, Result};

type CssResult<'i, T> = std::result::Result<T, CssParseError<'i, ()>>;

/// Parse a CSS stylesheet string into a syntax tree.
///
/// Rules that fail to parse are skipped with a warning logged. Every node
/// records the position it was parsed from.
///
/// Returns `Err` only for catastrophic errors (currently always returns Ok
/// due to error recovery).
///
/// # Error Recovery
///
/// Parse errors in individual rules do not cause the entire parse to fail.
/// Instead, the parser:
/// 1. Logs the error via `tracing::warn!`
/// 2. Drops the offending rule or declaration
/// 3. Continues parsing after it
///
/// # Example
///
/// ```
/// use cssplit_syntax::parse_stylesheet;
///
/// let tree = parse_stylesheet("a, b { color: red } @media print { c {} }").unwrap();
/// assert_eq!(tree.selector_count(), 3);
/// ```
pub fn parse_stylesheet(css: &str) -> Result<SyntaxTree> {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let mut tree = SyntaxTree::new();
    let root = tree.root();

    parse_rule_list(&mut parser, &mut tree, root);

    tracing::debug!(
        target: targets::PARSE,
        nodes = tree.node_count(),
        selectors = tree.selector_count(),
        "parsed stylesheet"
    );
    Ok(tree)
}

/// Read and parse a stylesheet from disk.
pub fn parse_file(path: impl AsRef<Path>) -> Result<SyntaxTree> {
    let path = path.as_ref();
    let css = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    parse_stylesheet(&css)
}

/// Parse a list of rules and at-rules into `parent`.
fn parse_rule_list(parser: &mut Parser<'_, '_>, tree: &mut SyntaxTree, parent: NodeId) {
    loop {
        parser.skip_whitespace();

        if parser.is_exhausted() {
            break;
        }

        let location = parser.current_source_location();
        let state = parser.state();
        let token = match parser.next() {
            Ok(t) => t.clone(),
            Err(_) => break,
        };

        let result = match token {
            Token::AtKeyword(name) => parse_at_rule(parser, tree, parent, &name, location),
            Token::CDO | Token::CDC | Token::Semicolon => continue,
            Token::CloseCurlyBracket => Err(error_at("Unexpected '}'", location)),
            _ => {
                parser.reset(&state);
                parse_style_rule(parser, tree, parent, location)
            }
        };

        if let Err(e) = result {
            tracing::warn!(target: targets::PARSE, "skipping rule at {}: {}", position(location), e);
        }
    }
}

/// Parse an at-rule after its `@name` token.
fn parse_at_rule<'i>(
    parser: &mut Parser<'i, '_>,
    tree: &mut SyntaxTree,
    parent: NodeId,
    name: &str,
    location: SourceLocation,
) -> Result<()> {
    let start = parser.position();
    parser
        .parse_until_before(Delimiter::Semicolon | Delimiter::CurlyBracketBlock, |p| {
            while p.next().is_ok() {}
            Ok::<_, CssParseError<'i, ()>>(())
        })
        .map_err(|e| parse_error("Failed to parse at-rule prelude", e))?;
    let prelude = parser.slice_from(start).trim().to_string();
    let source = Some(position(location));

    match parser.next() {
        Ok(Token::CurlyBracketBlock) => {
            let block = AtBlock::new(name, prelude);
            let kind = block.kind;
            let id = tree.append_at(parent, Node::Block(block), source)?;

            parser
                .parse_nested_block(|p| {
                    if body_holds_declarations(kind, p) {
                        parse_block_declarations(p, tree, id);
                    } else {
                        parse_rule_list(p, tree, id);
                    }
                    Ok::<_, CssParseError<'i, ()>>(())
                })
                .map_err(|e| parse_error("Failed to parse at-rule body", e))?;
        }
        // `;` or end of input
        _ => {
            tree.append_at(parent, Node::Directive(Directive::new(name, prelude)), source)?;
        }
    }

    Ok(())
}

/// Parse a style rule: selectors { declarations }
fn parse_style_rule<'i>(
    parser: &mut Parser<'i, '_>,
    tree: &mut SyntaxTree,
    parent: NodeId,
    location: SourceLocation,
) -> Result<()> {
    let selectors = parser
        .parse_until_before(Delimiter::CurlyBracketBlock, |p| split_selectors(p))
        .map_err(|e| parse_error("Failed to parse selector", e))?;

    // The block is consumed even when the selectors are rejected below, so the
    // next rule starts cleanly.
    let declarations = match parser.next() {
        Ok(Token::CurlyBracketBlock) => parser
            .parse_nested_block(|p| Ok::<_, CssParseError<'i, ()>>(parse_declarations(p)))
            .map_err(|e| parse_error("Failed to parse declaration block", e))?,
        _ => return Err(error_at("Expected '{' after selector", location)),
    };

    if selectors.iter().any(|selector| selector.is_empty()) {
        return Err(Error::invalid_selector(
            selectors.join(","),
            "Empty selector in list",
        ));
    }

    let rule = StyleRule {
        selectors,
        declarations: declarations.into_iter().map(|(decl, _)| decl).collect(),
    };
    tree.append_at(parent, Node::Rule(rule), Some(position(location)))?;
    Ok(())
}

/// Split a selector list on its top-level commas.
///
/// Each selector is consumed up to the next comma, so commas nested in
/// functions or brackets (`:is(a, b)`, `[title="a,b"]`) never split.
fn split_selectors<'i>(parser: &mut Parser<'i, '_>) -> CssResult<'i, Vec<String>> {
    let mut selectors = Vec::new();

    loop {
        let start = parser.position();
        parser.parse_until_before(Delimiter::Comma, |p| {
            while p.next_including_whitespace_and_comments().is_ok() {}
            Ok::<_, CssParseError<'i, ()>>(())
        })?;
        selectors.push(parser.slice_from(start).trim().to_string());

        if parser.next().is_err() {
            break;
        }
    }

    Ok(selectors)
}

/// Parse a style rule's declaration list, dropping malformed declarations.
fn parse_declarations(parser: &mut Parser<'_, '_>) -> Vec<(Declaration, SourcePosition)> {
    let mut declarations = Vec::new();

    loop {
        parser.skip_whitespace();

        if parser.is_exhausted() {
            break;
        }

        // Stray semicolons
        if parser.try_parse(|p| p.expect_semicolon()).is_ok() {
            continue;
        }

        let location = parser.current_source_location();
        if let Some(declaration) = parse_declaration_item(parser, location) {
            declarations.push((declaration, position(location)));
        }
    }

    declarations
}

/// Parse the body of a declaration-holding at-rule into `block`.
///
/// Unlike style rules these bodies may mix declarations with nested at-rules
/// (`@page { margin: 1in; @top-left { ... } }`); both are kept in order.
fn parse_block_declarations(
    parser: &mut Parser<'_, '_>,
    tree: &mut SyntaxTree,
    block: NodeId,
) {
    loop {
        parser.skip_whitespace();

        if parser.is_exhausted() {
            break;
        }

        if parser.try_parse(|p| p.expect_semicolon()).is_ok() {
            continue;
        }

        let location = parser.current_source_location();
        let state = parser.state();
        let token = parser.next().cloned();
        if let Ok(Token::AtKeyword(name)) = token {
            if let Err(e) = parse_at_rule(parser, tree, block, &name, location) {
                tracing::warn!(
                    target: targets::PARSE,
                    "skipping rule at {}: {}",
                    position(location),
                    e
                );
            }
            continue;
        }
        parser.reset(&state);

        let Some(declaration) = parse_declaration_item(parser, location) else {
            continue;
        };
        let source = Some(position(location));
        if let Err(e) = tree.append_at(block, Node::Declaration(declaration), source) {
            tracing::warn!(target: targets::PARSE, "dropping declaration at {}: {}", position(location), e);
        }
    }
}

/// Parse one declaration up to and including its `;`, logging failures.
fn parse_declaration_item(
    parser: &mut Parser<'_, '_>,
    location: SourceLocation,
) -> Option<Declaration> {
    match parser.parse_until_after(Delimiter::Semicolon, |p| parse_declaration(p)) {
        Ok(declaration) => Some(declaration),
        Err(e) => {
            tracing::warn!(
                target: targets::PARSE,
                "skipping declaration at {}: {:?}",
                position(location),
                e.kind
            );
            None
        }
    }
}

/// Parse a single `property: value [!important]` declaration.
fn parse_declaration<'i>(parser: &mut Parser<'i, '_>) -> CssResult<'i, Declaration> {
    let property = parser.expect_ident()?.to_string();
    parser.expect_colon()?;
    parser.skip_whitespace();

    let start = parser.position();
    while parser.next_including_whitespace_and_comments().is_ok() {}
    let raw = parser.slice_from(start).trim();
    if raw.is_empty() {
        return Err(parser.new_custom_error(()));
    }

    let (value, important) = split_important(raw);
    Ok(Declaration {
        property,
        value,
        important,
    })
}

/// Strip a trailing `!important` marker from a raw value.
fn split_important(raw: &str) -> (String, bool) {
    if let Some(bang) = raw.rfind('!') {
        let flag = raw[bang + 1..].trim();
        if flag.eq_ignore_ascii_case("important") {
            return (raw[..bang].trim_end().to_string(), true);
        }
    }
    (raw.to_string(), false)
}

/// Decide whether an at-rule body is a declaration list.
///
/// Known kinds answer directly. For unknown at-rules the body is scanned: a
/// body without any `{}` block is treated as declarations.
fn body_holds_declarations(kind: AtRuleKind, parser: &mut Parser<'_, '_>) -> bool {
    if kind.holds_declarations() {
        return true;
    }
    if kind != AtRuleKind::Other {
        return false;
    }

    let state = parser.state();
    let mut has_blocks = false;
    while let Ok(token) = parser.next() {
        if matches!(token, Token::CurlyBracketBlock) {
            has_blocks = true;
            break;
        }
    }
    parser.reset(&state);
    !has_blocks
}

fn position(location: SourceLocation) -> SourcePosition {
    SourcePosition::new(location.line, location.column)
}

fn error_at(message: &str, location: SourceLocation) -> Error {
    Error::parse(message, location.line + 1, location.column)
}

fn parse_error(context: &str, error: CssParseError<'_, ()>) -> Error {
    Error::parse(
        format!("{context}: {:?}", error.kind),
        error.location.line + 1,
        error.location.column,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn children(tree: &SyntaxTree, id: NodeId) -> Vec<Node> {
        tree.children(id)
            .unwrap()
            .iter()
            .map(|&child| tree.get(child).unwrap().clone())
            .collect()
    }

    #[test]
    fn parse_simple_rule() {
        let tree = parse_stylesheet("a { color: red; }").unwrap();
        let nodes = children(&tree, tree.root());

        assert_eq!(nodes.len(), 1);
        let rule = nodes[0].as_rule().unwrap();
        assert_eq!(rule.selectors, vec!["a"]);
        assert_eq!(rule.declarations, vec![Declaration::new("color", "red")]);
    }

    #[test]
    fn parse_selector_list() {
        let tree = parse_stylesheet("h1 > a, .nav:is(.x, .y), #main {}").unwrap();
        let nodes = children(&tree, tree.root());
        let rule = nodes[0].as_rule().unwrap();

        assert_eq!(rule.selectors, vec!["h1 > a", ".nav:is(.x, .y)", "#main"]);
        assert!(rule.declarations.is_empty());
    }

    #[test]
    fn selectors_with_brackets_and_functions() {
        let tree =
            parse_stylesheet("a[href], li:nth-child(2), [title=\"x,y\"] b, :not(.p, .q) {}")
                .unwrap();
        let nodes = children(&tree, tree.root());

        assert_eq!(
            nodes[0].as_rule().unwrap().selectors,
            vec!["a[href]", "li:nth-child(2)", "[title=\"x,y\"] b", ":not(.p, .q)"]
        );
    }

    #[test]
    fn page_keeps_margin_boxes() {
        let tree =
            parse_stylesheet("@page { margin: 1in; @top-left { content: \"x\" } size: A4 } a{}")
                .unwrap();
        let top = tree.children(tree.root()).unwrap().to_vec();
        assert_eq!(top.len(), 2);

        let body = children(&tree, top[0]);
        assert_eq!(body.len(), 3);
        assert_eq!(body[0], Node::Declaration(Declaration::new("margin", "1in")));
        assert_eq!(body[1].as_block().unwrap().name, "top-left");
        assert_eq!(body[2], Node::Declaration(Declaration::new("size", "A4")));

        let margin_box = tree.children(top[0]).unwrap()[1];
        assert_eq!(
            children(&tree, margin_box),
            vec![Node::Declaration(Declaration::new("content", "\"x\""))]
        );
    }

    #[test]
    fn parse_nested_blocks() {
        let css = r#"
            a { margin: 0 }
            @media (max-width: 0px) {
                b { color: blue }
                @supports (display: grid) { c {} }
            }
        "#;
        let tree = parse_stylesheet(css).unwrap();
        let top = tree.children(tree.root()).unwrap().to_vec();
        assert_eq!(top.len(), 2);

        let media = tree.get(top[1]).unwrap().as_block().unwrap();
        assert_eq!(media.kind, AtRuleKind::Media);
        assert_eq!(media.prelude, "(max-width: 0px)");

        let inner = tree.children(top[1]).unwrap().to_vec();
        assert_eq!(inner.len(), 2);
        assert_eq!(
            tree.get(inner[1]).unwrap().as_block().unwrap().kind,
            AtRuleKind::Supports
        );
        assert_eq!(tree.selector_count(), 3);
    }

    #[test]
    fn parse_font_face_declarations() {
        let tree =
            parse_stylesheet("@font-face { font-family: Foo; src: url(foo.woff2) }").unwrap();
        let face = tree.children(tree.root()).unwrap()[0];
        let nodes = children(&tree, face);

        assert_eq!(
            nodes,
            vec![
                Node::Declaration(Declaration::new("font-family", "Foo")),
                Node::Declaration(Declaration::new("src", "url(foo.woff2)")),
            ]
        );
    }

    #[test]
    fn parse_keyframes_rules() {
        let tree = parse_stylesheet("@-webkit-keyframes spin { from { x: 0 } to { x: 1 } }")
            .unwrap();
        let frames = tree.children(tree.root()).unwrap()[0];

        assert_eq!(
            tree.get(frames).unwrap().as_block().unwrap().kind,
            AtRuleKind::Keyframes
        );
        assert_eq!(tree.children(frames).unwrap().len(), 2);
    }

    #[test]
    fn parse_directives() {
        let tree = parse_stylesheet("@charset \"UTF-8\";\n@import url(base.css);\na {}").unwrap();
        let nodes = children(&tree, tree.root());

        let charset = nodes[0].as_directive().unwrap();
        assert_eq!(charset.kind, AtRuleKind::Charset);
        assert_eq!(charset.params, "\"UTF-8\"");
        assert_eq!(nodes[1].as_directive().unwrap().params, "url(base.css)");
        assert!(nodes[2].as_rule().is_some());
    }

    #[test]
    fn parse_important() {
        let tree = parse_stylesheet("a { color: red !important; margin: 0 ! IMPORTANT }").unwrap();
        let nodes = children(&tree, tree.root());
        let rule = nodes[0].as_rule().unwrap();

        assert_eq!(
            rule.declarations,
            vec![
                Declaration::new("color", "red").important(),
                Declaration::new("margin", "0").important(),
            ]
        );
    }

    #[test]
    fn parse_unknown_at_rule_body() {
        let tree = parse_stylesheet("@viewport { width: device-width }").unwrap();
        let viewport = tree.children(tree.root()).unwrap()[0];

        assert_eq!(
            children(&tree, viewport),
            vec![Node::Declaration(Declaration::new("width", "device-width"))]
        );
    }

    #[test]
    fn skip_empty_selector() {
        let tree = parse_stylesheet("a,,b { color: red } c { color: blue }").unwrap();
        let nodes = children(&tree, tree.root());

        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].as_rule().unwrap().selectors, vec!["c"]);
    }

    #[test]
    fn skip_invalid_declaration() {
        let tree = parse_stylesheet("a { : red; color: blue;; margin: }").unwrap();
        let nodes = children(&tree, tree.root());

        assert_eq!(
            nodes[0].as_rule().unwrap().declarations,
            vec![Declaration::new("color", "blue")]
        );
    }

    #[test]
    fn record_source_positions() {
        let tree = parse_stylesheet("a {}\n  b {}").unwrap();
        let top = tree.children(tree.root()).unwrap().to_vec();

        assert_eq!(tree.source(top[0]).unwrap(), Some(SourcePosition::new(0, 1)));
        assert_eq!(tree.source(top[1]).unwrap(), Some(SourcePosition::new(1, 3)));
    }

    #[test]
    fn parse_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "a {{}} b {{}}").unwrap();

        let tree = parse_file(file.path()).unwrap();
        assert_eq!(tree.selector_count(), 2);

        let missing = parse_file(file.path().with_extension("missing"));
        assert!(matches!(missing, Err(Error::Io { .. })));
    }
}
