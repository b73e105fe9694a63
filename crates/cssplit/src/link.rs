//! Linking the remainder back to its fragments with `@import`.

use serde::{Deserialize, Serialize};

use cssplit_core::logging::targets;
use cssplit_core::{Directive, Node, NodeId, SyntaxTree, TreeResult};

/// Treatment of `@charset` directives when imports are inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreamblePolicy {
    /// Move the first top-level `@charset` to the top and drop later ones.
    #[default]
    Hoist,
    /// Only a `@charset` that is already the first node is honoured; later
    /// ones stay where they are.
    Preserve,
}

/// How many fragments were linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LinkReport {
    /// Imports inserted.
    pub linked: usize,
    /// Fragments without a name, left unlinked.
    pub missing: usize,
}

/// Inserts `@import` directives for fragments at the top of a tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportLinker {
    policy: PreamblePolicy,
}

impl ImportLinker {
    /// Create a linker with the given preamble policy.
    pub fn new(policy: PreamblePolicy) -> Self {
        Self { policy }
    }

    /// Insert one `@import url(<name>)` per named fragment, in fragment order,
    /// directly after the preamble (or at the very top without one).
    ///
    /// `name_for` returns `None` for fragments that cannot be referenced; they
    /// are counted in [`LinkReport::missing`].
    pub fn link<T, F>(&self, tree: &mut SyntaxTree, fragments: &[T], name_for: F) -> TreeResult<LinkReport>
    where
        F: Fn(&T) -> Option<String>,
    {
        let anchor = match self.policy {
            PreamblePolicy::Hoist => hoist_charset(tree)?,
            PreamblePolicy::Preserve => leading_charset(tree)?,
        };
        let root = tree.root();
        let mut report = LinkReport::default();

        for fragment in fragments.iter().rev() {
            let Some(name) = name_for(fragment) else {
                report.missing += 1;
                continue;
            };

            let import = tree.create(Node::Directive(Directive::import_url(&name)));
            match anchor {
                Some(anchor) => tree.insert_after(anchor, import)?,
                None => tree.prepend_child(root, import)?,
            }
            report.linked += 1;
            tracing::trace!(target: targets::LINK, %name, "inserted import");
        }

        tracing::debug!(
            target: targets::LINK,
            linked = report.linked,
            missing = report.missing,
            "linked fragments"
        );
        Ok(report)
    }
}

fn is_preamble(tree: &SyntaxTree, id: NodeId) -> TreeResult<bool> {
    Ok(tree
        .get(id)?
        .as_directive()
        .is_some_and(|directive| directive.kind.is_preamble()))
}

fn leading_charset(tree: &SyntaxTree) -> TreeResult<Option<NodeId>> {
    match tree.children(tree.root())?.first().copied() {
        Some(first) if is_preamble(tree, first)? => Ok(Some(first)),
        _ => Ok(None),
    }
}

fn hoist_charset(tree: &mut SyntaxTree) -> TreeResult<Option<NodeId>> {
    let root = tree.root();
    let mut charsets = Vec::new();
    for &child in tree.children(root)? {
        if is_preamble(tree, child)? {
            charsets.push(child);
        }
    }

    let Some((&first, duplicates)) = charsets.split_first() else {
        return Ok(None);
    };
    for &duplicate in duplicates {
        tree.remove(duplicate)?;
        tracing::trace!(target: targets::LINK, "dropped duplicate @charset");
    }
    tree.detach(first)?;
    tree.prepend_child(root, first)?;
    Ok(Some(first))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cssplit_core::StyleRule;

    fn outline(tree: &SyntaxTree) -> Vec<String> {
        tree.children(tree.root())
            .unwrap()
            .iter()
            .map(|&id| tree.get(id).unwrap().label())
            .collect()
    }

    fn tree_with(nodes: Vec<Node>) -> SyntaxTree {
        let mut tree = SyntaxTree::new();
        let root = tree.root();
        for node in nodes {
            tree.append(root, node).unwrap();
        }
        tree
    }

    fn charset(name: &str) -> Node {
        Node::Directive(Directive::new("charset", format!("\"{name}\"")))
    }

    fn rule(selector: &str) -> Node {
        Node::Rule(StyleRule::new([selector]))
    }

    fn names(tree: &mut SyntaxTree, policy: PreamblePolicy) -> LinkReport {
        ImportLinker::new(policy)
            .link(tree, &["a-0.css", "a-1.css"], |name| Some(name.to_string()))
            .unwrap()
    }

    #[test]
    fn imports_at_top_in_fragment_order() {
        let mut tree = tree_with(vec![rule("c")]);
        let report = names(&mut tree, PreamblePolicy::Hoist);

        assert_eq!(report, LinkReport { linked: 2, missing: 0 });
        assert_eq!(
            outline(&tree),
            vec!["@import url(a-0.css)", "@import url(a-1.css)", "c"]
        );
    }

    #[test]
    fn preserve_keeps_later_charsets() {
        let mut tree = tree_with(vec![charset("UTF-8"), rule("c"), charset("KOI8-R"), rule("d")]);
        names(&mut tree, PreamblePolicy::Preserve);

        assert_eq!(
            outline(&tree),
            vec![
                "@charset \"UTF-8\"",
                "@import url(a-0.css)",
                "@import url(a-1.css)",
                "c",
                "@charset \"KOI8-R\"",
                "d",
            ]
        );
    }

    #[test]
    fn preserve_ignores_charset_that_is_not_first() {
        let mut tree = tree_with(vec![rule("c"), charset("UTF-8")]);
        names(&mut tree, PreamblePolicy::Preserve);

        assert_eq!(
            outline(&tree),
            vec!["@import url(a-0.css)", "@import url(a-1.css)", "c", "@charset \"UTF-8\""]
        );
    }

    #[test]
    fn hoist_moves_first_charset_and_drops_the_rest() {
        let mut tree = tree_with(vec![rule("c"), charset("UTF-8"), rule("d"), charset("KOI8-R")]);
        names(&mut tree, PreamblePolicy::Hoist);

        assert_eq!(
            outline(&tree),
            vec![
                "@charset \"UTF-8\"",
                "@import url(a-0.css)",
                "@import url(a-1.css)",
                "c",
                "d",
            ]
        );
    }

    #[test]
    fn unnamed_fragments_are_reported() {
        let mut tree = tree_with(vec![rule("c")]);
        let report = ImportLinker::default()
            .link(&mut tree, &[Some("a-0.css"), None, Some("a-2.css")], |name| {
                name.map(str::to_string)
            })
            .unwrap();

        assert_eq!(report, LinkReport { linked: 2, missing: 1 });
        assert_eq!(
            outline(&tree),
            vec!["@import url(a-0.css)", "@import url(a-2.css)", "c"]
        );
    }
}
